//! The engine object and its frame pump
//!
//! `Engine` owns both machines and every table they share. There is one
//! thread and one call stack: the pump in `delay` fires the VGA tick at a
//! fixed cadence, and the script machine only ever runs from the main loop,
//! a time event, or a verb click. A script blocked in `wait_for_sync` keeps
//! calling `delay` so animation and input carry on underneath it.

use crate::config::{EngineConfig, GameVariant};
use crate::error::EngineResult;
use crate::gamepc::{load_game_database, DATABASE_FILE};
use crate::hitarea::HitAreaTable;
use crate::host::{Host, InputState};
use crate::item::{ItemArena, NULL_ITEM};
use crate::opcode_tables::OpcodeTable;
use crate::opcodes_display::TextWindows;
use crate::random::GameRand;
use crate::resources::ResourceSource;
use crate::script::ScriptState;
use crate::sound::SoundDriver;
use crate::subroutine::{ScriptCursor, KEY_NONE};
use crate::tables::Pager;
use crate::text::{TokenTable, TOKEN_FILE};
use crate::timers::{TimeEvent, TimeEventQueue};
use crate::vga::VgaState;
use log::{debug, info, warn};
use std::rc::Rc;

/// Subroutine run after every verb click
pub const POST_VERB_SUBROUTINE: u16 = 100;

const KEY_PAUSE: u16 = b'p' as u16;
const KEY_ESCAPE: u16 = 27;

pub struct Engine {
    pub config: EngineConfig,
    pub game: GameVariant,
    pub(crate) opcodes: &'static OpcodeTable,
    pub items: ItemArena,
    pub pager: Pager,
    pub(crate) res: Box<dyn ResourceSource>,
    pub(crate) host: Box<dyn Host>,
    pub(crate) sound: Box<dyn SoundDriver>,
    pub(crate) rng: GameRand,
    pub vm: ScriptState,
    pub vga: VgaState,
    pub hit_areas: HitAreaTable,
    pub text_windows: TextWindows,
    pub time_events: TimeEventQueue,
    /// Seconds the clock stood still; due times are shifted by this much
    pub clock_base: u32,
    pub input: InputState,
    pub skip_speech: bool,
    pub exit_cutscene: bool,
    /// Set by the halt-animation opcode; sprites still draw
    pub animation_halted: bool,
    pub paused: bool,
    pub quit: bool,
    /// Frames handed to the host so far
    pub frames: u64,
    last_vga_tick: u64,
    in_callback: bool,
    sync_ticks: u32,
    sync_flag_2: bool,
    cepe: bool,
    last_time: u32,
    pub(crate) last_click: u16,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        mut res: Box<dyn ResourceSource>,
        host: Box<dyn Host>,
        sound: Box<dyn SoundDriver>,
    ) -> EngineResult<Engine> {
        let game = config.game;
        info!("Starting {} engine", game);
        let opcodes = OpcodeTable::for_game(game);

        let mut pager = Pager::new(&config);
        pager.load_lists(res.as_mut())?;
        if game.compressed_text() && res.exists(TOKEN_FILE) {
            pager.set_tokens(TokenTable::from_bytes(&res.read_file(TOKEN_FILE)?));
        }
        let data = res.read_file(DATABASE_FILE)?;
        let items = load_game_database(&data, &config, &mut pager)?;

        let now = host.millis();
        Ok(Engine {
            game,
            opcodes,
            items,
            pager,
            res,
            sound,
            rng: GameRand::from_seed(config.seed),
            vm: ScriptState::default(),
            vga: VgaState::new(&config),
            hit_areas: HitAreaTable::new(),
            text_windows: TextWindows::default(),
            time_events: TimeEventQueue::new(),
            clock_base: 0,
            input: InputState::default(),
            skip_speech: false,
            exit_cutscene: false,
            animation_halted: false,
            paused: false,
            quit: false,
            frames: 0,
            last_vga_tick: now,
            in_callback: false,
            sync_ticks: 0,
            sync_flag_2: false,
            cepe: false,
            last_time: (now / 1000) as u32,
            last_click: 0,
            host,
            config,
        })
    }

    /// Wall-clock seconds since the host started
    pub fn now_secs(&self) -> u32 {
        (self.host.millis() / 1000) as u32
    }

    pub fn add_time_event(&mut self, timeout: u32, subroutine: u16) {
        let now = self.now_secs();
        self.time_events
            .add(now, self.clock_base, timeout, subroutine);
    }

    /// Fire every due time event, including ones added while firing
    ///
    /// Returns whether any event ran.
    pub fn kickoff_time_events(&mut self) -> EngineResult<bool> {
        let mut fired = false;
        while let Some(event) = self.time_events.pop_due(self.now_secs(), self.clock_base) {
            fired = true;
            self.invoke_time_event(event)?;
        }
        Ok(fired)
    }

    fn invoke_time_event(&mut self, event: TimeEvent) -> EngineResult<()> {
        debug!("time event: subroutine {}", event.subroutine);
        self.vm.verb = 0;
        if !self.vm.return_1 {
            self.start_subroutine_by_id(event.subroutine)?;
        }
        self.vm.return_1 = false;
        Ok(())
    }

    /// Pump frames for at least `amount` milliseconds
    ///
    /// With `amount == 0` the pump fires any tick that is due and polls
    /// input once.
    pub fn delay(&mut self, amount: u32) -> EngineResult<()> {
        let fast = self.config.fast_mode;
        let period = self.game.frame_period_ms(fast) as u64;
        let start = self.host.millis();
        let mut cur = start;
        loop {
            while !self.in_callback && cur >= self.last_vga_tick + period {
                self.last_vga_tick += period;
                if cur >= self.last_vga_tick + 2 * period {
                    self.last_vga_tick = cur;
                }
                self.in_callback = true;
                let result = self.timer_callback();
                self.in_callback = false;
                result?;
            }

            while let Some(event) = self.host.poll_event() {
                if self.input.apply(event) {
                    if self.game == GameVariant::Simon2 {
                        self.skip_speech = true;
                    } else {
                        self.exit_cutscene = true;
                    }
                }
                if self.input.quit {
                    self.quit = true;
                }
            }

            if amount == 0 || self.quit {
                break;
            }
            let slice = if fast { 1 } else { 20 };
            self.host.sleep(slice.min(amount as u64));
            cur = self.host.millis();
            if cur >= start + amount as u64 {
                break;
            }
        }
        Ok(())
    }

    /// One VGA tick: expire timers and redraw
    fn timer_callback(&mut self) -> EngineResult<()> {
        self.sync_ticks += 1;
        if !self.animation_halted {
            if self.game.vga_passes_per_tick() > 1 {
                self.expire_vga_timers()?;
                self.expire_vga_timers()?;
                self.sync_flag_2 = !self.sync_flag_2;
                self.cepe = !self.cepe;
                if !self.cepe {
                    self.expire_vga_timers()?;
                }
            } else {
                self.sync_flag_2 = !self.sync_flag_2;
                if !self.sync_flag_2 {
                    self.expire_vga_timers()?;
                }
            }
        }
        self.draw_all_sprites()?;
        self.present()
    }

    /// One pass over the VGA timers
    pub fn expire_vga_timers(&mut self) -> EngineResult<()> {
        let base = self.game.vga_base_delay();
        let mut last = None;
        while let Some(entry) = self.vga.timers.next_expired(&mut last, base) {
            match entry.cursor {
                Some(cursor) => self.resume_vga(cursor, entry.sprite_id, entry.zone)?,
                None => self.scroll_timeout(),
            }
        }
        Ok(())
    }

    /// Upload the palette if it changed and hand the frame to the host
    pub fn present(&mut self) -> EngineResult<()> {
        if self.vga.palette_dirty {
            let palette: Vec<[u8; 3]> = if self.vga.faded {
                vec![[0; 3]; 256]
            } else {
                self.vga.palette.to_vec()
            };
            self.host.set_palette(&palette)?;
            self.vga.palette_dirty = false;
        }
        self.host.present(&self.vga.back)?;
        self.frames += 1;
        Ok(())
    }

    /// Act on a latched pause or escape key; any other key is dropped
    fn process_special_keys(&mut self) {
        match self.input.take_key() {
            Some(KEY_PAUSE) => {
                self.paused = !self.paused;
                info!("{}", if self.paused { "paused" } else { "resumed" });
            }
            Some(KEY_ESCAPE) => self.exit_cutscene = true,
            Some(key) => debug!("key {} ignored", key),
            None => {}
        }
    }

    /// Block the script machine until sync id `id` is broadcast
    ///
    /// A wait that outlives the variant's tick budget is abandoned, and
    /// escape ends it early.
    pub fn wait_for_sync(&mut self, id: u16) -> EngineResult<()> {
        self.vga.wait_for = id;
        self.sync_ticks = 0;
        self.exit_cutscene = false;
        self.skip_speech = false;
        let timeout = self.game.sync_timeout_ticks();
        while self.vga.wait_for != 0 && !self.quit {
            self.delay(10)?;
            self.process_special_keys();
            if self.exit_cutscene {
                debug!("wait for sync {} skipped", id);
                self.vga.wait_for = 0;
                break;
            }
            if self.sync_ticks >= timeout {
                warn!("wait for sync {} timed out", id);
                self.vga.wait_for = 0;
                break;
            }
        }
        Ok(())
    }

    fn noun_of(&self, id: u16) -> i16 {
        if id == NULL_ITEM {
            return KEY_NONE;
        }
        self.items.deref(id).map_or(KEY_NONE, |i| i.noun)
    }

    /// Dispatch a verb against the current subject and object items
    pub fn handle_verb_clicked(&mut self, verb: u16) -> EngineResult<()> {
        self.vm.verb = verb as i16;
        self.vm.noun1 = self.noun_of(self.vm.subject_item);
        self.vm.noun2 = self.noun_of(self.vm.object_item);
        debug!(
            "verb {} nouns {} {}",
            self.vm.verb, self.vm.noun1, self.vm.noun2
        );

        let sub = match self.pager.get_subroutine(0, self.res.as_mut())? {
            Some(sub) => sub,
            None => return Ok(()),
        };
        if self.start_subroutine(sub)? == -1 {
            self.host.print_text("I don't understand")?;
        }
        self.vm.return_1 = false;

        if let Some(sub) = self
            .pager
            .get_subroutine(POST_VERB_SUBROUTINE, self.res.as_mut())?
        {
            self.start_subroutine(sub)?;
        }
        Ok(())
    }

    fn handle_click(&mut self) -> EngineResult<()> {
        if self.vga.mouse_hide != 0 {
            return Ok(());
        }
        let (x, y) = (self.input.mouse_x, self.input.mouse_y);
        let area = match self.hit_areas.area_at(x, y) {
            Some(area) => *area,
            None => return Ok(()),
        };
        debug!("click on box {} at {},{}", area.id, x, y);
        self.vm.subject_item = area.item;
        self.vm.object_item = NULL_ITEM;
        self.handle_verb_clicked(area.verb)
    }

    /// Run one script line outside any subroutine
    pub fn run_line(&mut self, code: &[u8]) -> EngineResult<i16> {
        let mut cursor = ScriptCursor::new(Rc::from(code));
        self.run_script(&mut cursor)
    }

    /// One turn of the main loop: time events, clicks, then a frame's worth
    /// of pumping
    pub fn step(&mut self) -> EngineResult<()> {
        self.process_special_keys();
        let now = self.now_secs();
        if now != self.last_time {
            self.last_time = now;
            if self.paused {
                self.clock_base += 1;
            } else {
                self.kickoff_time_events()?;
            }
        }
        if self.input.left_button_down != self.last_click {
            self.last_click = self.input.left_button_down;
            self.handle_click()?;
        }
        let period = self.game.frame_period_ms(self.config.fast_mode);
        self.delay(period)
    }

    /// Start the game and pump until quit, or for `frames` frames
    pub fn run(&mut self, frames: Option<u64>) -> EngineResult<()> {
        let start = self.config.start_subroutine;
        info!("running subroutine {}", start);
        self.start_subroutine_by_id(start)?;
        while !self.quit {
            if let Some(limit) = frames {
                if self.frames >= limit {
                    break;
                }
            }
            self.step()?;
        }
        info!("stopped after {} frames", self.frames);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::{GameBuilder, ZoneBuilder};
    use crate::config::GameVariant;
    use crate::host::{Host, HostEvent};
    use test_log::test;

    fn words(ws: &[u16]) -> Vec<u8> {
        ws.iter().flat_map(|w| w.to_be_bytes()).collect()
    }

    #[test]
    fn test_delay_runs_ticks_at_frame_period() {
        let (mut engine, host, _) = GameBuilder::new(GameVariant::Simon1).engine_with_handles();
        engine.delay(200).unwrap();
        // ticks due at 50, 100 and 150 ms
        assert_eq!(host.frames_presented(), 3);
        assert_eq!(engine.frames, 3);
    }

    #[test]
    fn test_right_click_maps_per_variant() {
        let (mut engine, host, _) = GameBuilder::new(GameVariant::Simon2).engine_with_handles();
        host.schedule(0, HostEvent::RightButtonDown);
        engine.delay(0).unwrap();
        assert!(engine.skip_speech);
        assert!(!engine.exit_cutscene);

        let (mut engine, host, _) = GameBuilder::new(GameVariant::Simon1).engine_with_handles();
        host.schedule(0, HostEvent::RightButtonDown);
        engine.delay(0).unwrap();
        assert!(engine.exit_cutscene);
    }

    #[test]
    fn test_quit_event_stops_run() {
        let (mut engine, host, _) = GameBuilder::new(GameVariant::Simon1).engine_with_handles();
        host.schedule(120, HostEvent::Quit);
        engine.run(Some(1000)).unwrap();
        assert!(engine.quit);
        assert!(engine.frames < 10);
    }

    #[test]
    fn test_wait_for_sync_times_out() {
        let (mut engine, _, _) = GameBuilder::new(GameVariant::Simon1).engine_with_handles();
        engine.wait_for_sync(7).unwrap();
        assert_eq!(engine.vga.wait_for, 0);
        assert!(engine.sync_ticks >= GameVariant::Simon1.sync_timeout_ticks());
    }

    #[test]
    fn test_vga_broadcast_wakes_sync_wait() {
        let mut zone = ZoneBuilder::new(1, false);
        // wait five ticks, then broadcast sync 7
        zone.animation(101, &words(&[12, 5, 15, 7, 0]));
        let mut b = GameBuilder::new(GameVariant::Simon1);
        b.zone(zone);
        let mut engine = b.engine();
        engine.start_vga_code(0, 1, 101, 0, 0, 0).unwrap();
        engine.wait_for_sync(7).unwrap();
        assert_eq!(engine.vga.wait_for, 0);
        assert!(engine.sync_ticks > 0);
        assert!(engine.sync_ticks < GameVariant::Simon1.sync_timeout_ticks());
    }

    #[test]
    fn test_escape_ends_sync_wait() {
        let (mut engine, host, _) = GameBuilder::new(GameVariant::Simon1).engine_with_handles();
        host.schedule(100, HostEvent::KeyDown(27));
        engine.wait_for_sync(7).unwrap();
        assert_eq!(engine.vga.wait_for, 0);
        assert!(engine.exit_cutscene);
        assert!(engine.sync_ticks < GameVariant::Simon1.sync_timeout_ticks());
    }

    #[test]
    fn test_pause_key_toggles_pause() {
        let (mut engine, host, _) = GameBuilder::new(GameVariant::Simon1).engine_with_handles();
        host.schedule(0, HostEvent::KeyDown(b'p' as u16));
        host.schedule(0, HostEvent::KeyUp(b'p' as u16));
        // the first step latches the key, the next acts on it
        engine.step().unwrap();
        engine.step().unwrap();
        assert!(engine.paused);

        host.schedule(host.millis(), HostEvent::KeyDown(b'p' as u16));
        engine.step().unwrap();
        engine.step().unwrap();
        assert!(!engine.paused);

        host.schedule(host.millis(), HostEvent::KeyDown(b'x' as u16));
        engine.step().unwrap();
        engine.step().unwrap();
        assert!(!engine.paused);
        assert_eq!(engine.input.key_pressed, None);
    }
}
