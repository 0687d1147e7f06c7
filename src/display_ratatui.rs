//! Terminal host built on ratatui
//!
//! The frame is drawn with upper-half-block cells, two pixel rows per
//! terminal row, in true colour from the current palette. Printed game text
//! scrolls in a pane underneath. Rendering and input live on a display
//! thread; the engine talks to it over channels.

use crate::draw::Surface;
use crate::error::{EngineError, EngineResult};
use crate::host::{Host, HostEvent};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{debug, error};
use ratatui::{
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::Color,
    text::Line,
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
    Terminal,
};
use std::io::{self, Stdout};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

/// Rows kept in the text pane
const TEXT_LINES: u16 = 4;
const MAX_TEXT_HISTORY: usize = 200;

/// Commands sent to the display thread
#[derive(Debug)]
enum RenderCommand {
    Palette(Vec<[u8; 3]>),
    Frame(Surface),
    Text(String),
    Quit,
}

pub struct TerminalHost {
    tx: Sender<RenderCommand>,
    events: Receiver<HostEvent>,
    display_thread: Option<thread::JoinHandle<()>>,
    start: Instant,
}

impl TerminalHost {
    /// Take over the terminal and start the display thread
    pub fn new() -> EngineResult<TerminalHost> {
        enable_raw_mode().map_err(|e| EngineError::Display(e.to_string()))?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen, EnableMouseCapture) {
            let _ = disable_raw_mode();
            return Err(EngineError::Display(e.to_string()));
        }
        let terminal = match Terminal::new(CrosstermBackend::new(stdout)) {
            Ok(terminal) => terminal,
            Err(e) => {
                restore_terminal();
                return Err(EngineError::Display(e.to_string()));
            }
        };

        let (tx, rx) = mpsc::channel();
        let (event_tx, events) = mpsc::channel();
        let display_thread = thread::spawn(move || {
            let mut state = RenderState::new(terminal);
            if let Err(e) = state.run(rx, event_tx) {
                error!("Display thread error: {}", e);
            }
            restore_terminal();
        });

        Ok(TerminalHost {
            tx,
            events,
            display_thread: Some(display_thread),
            start: Instant::now(),
        })
    }

    fn send(&self, cmd: RenderCommand) -> EngineResult<()> {
        self.tx
            .send(cmd)
            .map_err(|e| EngineError::Display(format!("display thread gone: {}", e)))
    }
}

impl Drop for TerminalHost {
    fn drop(&mut self) {
        let _ = self.send(RenderCommand::Quit);
        if let Some(thread) = self.display_thread.take() {
            let _ = thread.join();
        }
    }
}

impl Host for TerminalHost {
    fn millis(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn sleep(&mut self, ms: u64) {
        thread::sleep(Duration::from_millis(ms));
    }

    fn poll_event(&mut self) -> Option<HostEvent> {
        match self.events.try_recv() {
            Ok(event) => Some(event),
            // the display thread only hangs up when the terminal is gone
            Err(mpsc::TryRecvError::Disconnected) => Some(HostEvent::Quit),
            Err(mpsc::TryRecvError::Empty) => None,
        }
    }

    fn set_palette(&mut self, palette: &[[u8; 3]]) -> EngineResult<()> {
        self.send(RenderCommand::Palette(palette.to_vec()))
    }

    fn present(&mut self, frame: &Surface) -> EngineResult<()> {
        self.send(RenderCommand::Frame(frame.clone()))
    }

    fn print_text(&mut self, text: &str) -> EngineResult<()> {
        self.send(RenderCommand::Text(text.to_string()))
    }
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen);
}

/// State owned by the display thread
struct RenderState {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    palette: Vec<[u8; 3]>,
    frame: Option<Surface>,
    text: Vec<String>,
    /// Where the frame landed on the last draw
    frame_area: Rect,
}

impl RenderState {
    fn new(terminal: Terminal<CrosstermBackend<Stdout>>) -> RenderState {
        RenderState {
            terminal,
            palette: vec![[0; 3]; 256],
            frame: None,
            text: Vec::new(),
            frame_area: Rect::default(),
        }
    }

    fn run(
        &mut self,
        rx: Receiver<RenderCommand>,
        events: Sender<HostEvent>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.render()?;
        loop {
            match rx.recv_timeout(Duration::from_millis(10)) {
                Ok(RenderCommand::Quit) => break,
                Ok(cmd) => {
                    let mut dirty = self.handle(cmd);
                    // drain a backlog so only the newest frame is drawn
                    while let Ok(cmd) = rx.try_recv() {
                        if let RenderCommand::Quit = cmd {
                            return Ok(());
                        }
                        dirty |= self.handle(cmd);
                    }
                    if dirty {
                        self.render()?;
                    }
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }

            while event::poll(Duration::from_millis(0))? {
                let host_events = match event::read()? {
                    Event::Key(key) => map_key(key).into_iter().collect(),
                    Event::Mouse(mouse) => self.map_mouse(mouse),
                    Event::Resize(width, height) => {
                        debug!("terminal resized to {}x{}", width, height);
                        self.render()?;
                        Vec::new()
                    }
                    _ => Vec::new(),
                };
                for e in host_events {
                    if events.send(e).is_err() {
                        return Ok(());
                    }
                }
            }
        }
        Ok(())
    }

    /// Apply one command; returns whether a redraw is needed
    fn handle(&mut self, cmd: RenderCommand) -> bool {
        match cmd {
            RenderCommand::Palette(palette) => self.palette = palette,
            RenderCommand::Frame(frame) => self.frame = Some(frame),
            RenderCommand::Text(text) => {
                self.text.push(text);
                if self.text.len() > MAX_TEXT_HISTORY {
                    self.text.drain(0..MAX_TEXT_HISTORY / 2);
                }
            }
            RenderCommand::Quit => return false,
        }
        true
    }

    fn map_mouse(&self, mouse: MouseEvent) -> Vec<HostEvent> {
        let (width, height) = match &self.frame {
            Some(frame) => (frame.width, frame.height),
            None => return Vec::new(),
        };
        let (x, y) = match cell_to_pixel(self.frame_area, width, height, mouse.column, mouse.row) {
            Some(pos) => pos,
            None => return Vec::new(),
        };
        let moved = HostEvent::MouseMove { x, y };
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => vec![moved, HostEvent::LeftButtonDown],
            MouseEventKind::Up(MouseButton::Left) => vec![moved, HostEvent::LeftButtonUp],
            MouseEventKind::Down(MouseButton::Right) => vec![moved, HostEvent::RightButtonDown],
            MouseEventKind::Moved | MouseEventKind::Drag(_) => vec![moved],
            _ => Vec::new(),
        }
    }

    fn render(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let mut frame_area = Rect::default();
        let frame = self.frame.as_ref();
        let palette = &self.palette;
        let text = &self.text;
        self.terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(4), Constraint::Length(TEXT_LINES + 1)])
                .split(f.size());
            frame_area = chunks[0];
            if let Some(frame) = frame {
                f.render_widget(FrameView { frame, palette }, chunks[0]);
            }

            let lines: Vec<Line> = text.iter().map(|s| Line::from(s.as_str())).collect();
            let scroll = text.len().saturating_sub(TEXT_LINES as usize) as u16;
            let pane = Paragraph::new(lines)
                .block(Block::default().borders(Borders::TOP))
                .wrap(Wrap { trim: true })
                .scroll((scroll, 0));
            f.render_widget(pane, chunks[1]);
        })?;
        self.frame_area = frame_area;
        Ok(())
    }
}

/// Scales an indexed frame into a terminal area
struct FrameView<'a> {
    frame: &'a Surface,
    palette: &'a [[u8; 3]],
}

impl FrameView<'_> {
    fn color_at(&self, x: usize, y: usize) -> Color {
        let index = self.frame.pixel(x, y).unwrap_or(0) as usize;
        let [r, g, b] = self.palette.get(index).copied().unwrap_or([0; 3]);
        Color::Rgb(r, g, b)
    }
}

impl Widget for FrameView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let (w, h) = (self.frame.width, self.frame.height);
        let rows = area.height as usize * 2;
        for cy in 0..area.height {
            for cx in 0..area.width {
                let x = cx as usize * w / area.width as usize;
                let top = cy as usize * 2 * h / rows;
                let bottom = (cy as usize * 2 + 1) * h / rows;
                let fg = self.color_at(x, top);
                let bg = self.color_at(x, bottom);
                buf.get_mut(area.x + cx, area.y + cy)
                    .set_char('▀')
                    .set_fg(fg)
                    .set_bg(bg);
            }
        }
    }
}

/// Map a terminal cell inside `area` onto frame coordinates
fn cell_to_pixel(area: Rect, width: usize, height: usize, col: u16, row: u16) -> Option<(u16, u16)> {
    if col < area.x || row < area.y || col >= area.x + area.width || row >= area.y + area.height {
        return None;
    }
    let x = (col - area.x) as usize * width / area.width as usize;
    let y = (row - area.y) as usize * height / area.height as usize;
    Some((x as u16, y as u16))
}

/// Translate a key event into an engine key code
///
/// Function keys use the DOS scan code numbering the scripts test for.
/// Escape goes to the game, which uses it to skip; Ctrl-C quits.
fn map_key(key: KeyEvent) -> Option<HostEvent> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return (key.kind != KeyEventKind::Release).then_some(HostEvent::Quit);
    }
    let code = match key.code {
        KeyCode::Esc => 27,
        KeyCode::Char(c) if c.is_ascii() => c as u16,
        KeyCode::Enter => 13,
        KeyCode::Backspace => 8,
        KeyCode::Tab => 9,
        KeyCode::F(n) if (1..=10).contains(&n) => 314 + n as u16,
        _ => return None,
    };
    match key.kind {
        KeyEventKind::Release => Some(HostEvent::KeyUp(code)),
        _ => Some(HostEvent::KeyDown(code)),
    }
}
