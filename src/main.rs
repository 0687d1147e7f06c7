use agos::builder::{GameBuilder, ScriptBuilder, ZoneBuilder};
use agos::config::{EngineConfig, GameVariant};
use agos::disasm::{dump_subroutine, dump_zone};
use agos::display_manager::{create_host, DisplayMode};
use agos::engine::Engine;
use agos::error::EngineResult;
use agos::host::Host;
use agos::item::ObjectFlags;
use agos::opcode_tables::ScriptOp;
use agos::resources::GameFiles;
use agos::sound::NullSound;
use log::{debug, info};
use std::env;
use std::path::PathBuf;

/// Frame limit for a headless run that names none
const HEADLESS_FRAMES: u64 = 2000;

#[derive(Debug, Default)]
struct Options {
    data_dir: Option<PathBuf>,
    headless: bool,
    frames: Option<u64>,
    demo: bool,
    dump_subroutines: bool,
    dump_vga: Option<u16>,
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut opts = Options::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--headless" => opts.headless = true,
            "--demo" => opts.demo = true,
            "--dump-subroutines" => opts.dump_subroutines = true,
            "--frames" => {
                let n = iter.next().ok_or("--frames needs a count")?;
                opts.frames = Some(n.parse().map_err(|_| format!("Invalid frame count: {}", n))?);
            }
            "--dump-vga" => {
                let n = iter.next().ok_or("--dump-vga needs a zone number")?;
                opts.dump_vga = Some(n.parse().map_err(|_| format!("Invalid zone: {}", n))?);
            }
            flag if flag.starts_with("--") => return Err(format!("Unknown option {}", flag)),
            dir => {
                if opts.data_dir.is_some() {
                    return Err(format!("Unexpected argument {}", dir));
                }
                opts.data_dir = Some(PathBuf::from(dir));
            }
        }
    }
    if opts.data_dir.is_none() && !opts.demo {
        return Err("no game directory given".to_string());
    }
    Ok(opts)
}

fn print_usage(program: &str) {
    println!("agos - engine for the AGOS adventure games");
    println!();
    println!("Usage: {} <game_dir> [options]", program);
    println!("       {} --demo [options]", program);
    println!();
    println!("Options:");
    println!("  --headless           run without a terminal display");
    println!("  --frames N           stop after N frames");
    println!("  --demo               run a small built-in game");
    println!("  --dump-subroutines   list the resident subroutines and exit");
    println!("  --dump-vga ZONE      list the scripts of a VGA zone and exit");
    println!();
    println!("The game directory may hold an agos.toml; AGOS_GAME, AGOS_FAST and");
    println!("AGOS_SEED override it. DISPLAY_MODE picks terminal, headless or auto.");
}

/// A one-room Simon 1 game: a bouncing lamp that answers a click
fn demo_game() -> GameBuilder {
    let game = GameVariant::Simon1;
    let line = || ScriptBuilder::new(game);
    let mut b = GameBuilder::new(game);

    let room = b.room(0);
    let lamp = b.object(room, 10, -1, ObjectFlags::empty());
    b.player_in(room);
    let welcome = b.string("Welcome to the AGOS demo. Click the lamp; p pauses, Ctrl-C quits.");
    let looked = b.string("A small brass lamp, bouncing happily.");
    let tick = b.string("The lamp keeps bouncing.");

    b.subroutine(
        1,
        &[line()
            .op(ScriptOp::DefWindow, &[0, 0, 0, 40, 4, 0, 15])
            .op(ScriptOp::Window, &[0])
            .op(ScriptOp::Message, &[welcome as i16])
            .op(ScriptOp::Animate, &[0, 101, 5, 80, 0])
            .op(ScriptOp::AddBox, &[4001, 0, 0, 320, 200, lamp as i16, 1])
            .op(ScriptOp::When, &[5, 2])
            .build()],
    );
    b.subroutine(
        2,
        &[line()
            .op(ScriptOp::Message, &[tick as i16])
            .op(ScriptOp::When, &[5, 2])
            .build()],
    );
    b.verb_line(1, 10, -1, line().op(ScriptOp::Message, &[looked as i16]).build());

    let mut zone = ZoneBuilder::new(1, false);
    let mut colors = vec![[0u8; 3]; 32];
    for (i, c) in colors.iter_mut().enumerate().take(16).skip(1) {
        *c = [63, 63 - i as u8 * 3, i as u8 * 2];
    }
    zone.palette(&colors);
    zone.image(2, 1, &[0, 0], false);
    let mut lamp_pixels = Vec::with_capacity(256);
    for y in 0..16i32 {
        for x in 0..16i32 {
            let d = (x - 8) * (x - 8) + (y - 8) * (y - 8);
            lamp_pixels.push(if d < 64 { 1 + (d / 5) as u8 } else { 0 });
        }
    }
    zone.image(16, 16, &lamp_pixels, false);

    // load the palette, then bounce right and back twenty steps each way
    let code: Vec<u8> = [
        22, 0, 0, //
        20, 19, 0, 24, 1, 1, 0, 0, 12, 2, 21, -24, //
        20, 19, 0, 24, 1, -1, 0, 0, 12, 2, 21, -24, //
        18, -52,
    ]
    .iter()
    .flat_map(|w: &i16| w.to_be_bytes())
    .collect();
    zone.animation(101, &code);
    b.zone(zone);
    b
}

fn boot(opts: &Options, host: Box<dyn Host>) -> EngineResult<Engine> {
    if opts.demo {
        info!("Booting the demo game");
        return demo_game().boot(host, Box::new(NullSound));
    }
    let dir = opts.data_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let config = EngineConfig::load(&dir)?;
    info!("Loading {} from {}", config.game, dir.display());
    let files = GameFiles::open(&config)?;
    Engine::new(config, Box::new(files), host, Box::new(NullSound))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage(&args[0]);
        return Ok(());
    }
    let opts = match parse_args(&args[1..]) {
        Ok(opts) => opts,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            eprintln!();
            print_usage(&args[0]);
            std::process::exit(2);
        }
    };
    debug!("{:?}", opts);

    let dumping = opts.dump_subroutines || opts.dump_vga.is_some();
    let requested = if opts.headless || dumping {
        DisplayMode::Headless
    } else {
        match env::var("DISPLAY_MODE") {
            Ok(name) => DisplayMode::from_name(&name)
                .ok_or_else(|| format!("Unknown DISPLAY_MODE '{}'", name))?,
            Err(_) => DisplayMode::Auto,
        }
    };
    let (host, mode) = create_host(requested)?;

    // the host is restored when the engine drops, before anything is printed
    let mut engine = match boot(&opts, host) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error: cannot start the game: {}", e);
            std::process::exit(1);
        }
    };

    if opts.dump_subroutines {
        for sub in engine.pager.subroutines() {
            print!("{}", dump_subroutine(&sub, engine.game)?);
        }
        return Ok(());
    }
    if let Some(zone) = opts.dump_vga {
        engine.load_zone(zone)?;
        print!("{}", dump_zone(engine.vga.zones.get(zone)?, engine.game)?);
        return Ok(());
    }

    let frames = match (opts.frames, mode) {
        (Some(n), _) => Some(n),
        (None, DisplayMode::Headless) => Some(HEADLESS_FRAMES),
        (None, _) => None,
    };
    let result = engine.run(frames);
    let frames_run = engine.frames;
    drop(engine);

    match result {
        Ok(()) => {
            debug!("Game ended after {} frames", frames_run);
            Ok(())
        }
        Err(e) => {
            eprintln!("\nError during execution: {}", e);
            Err(Box::new(e))
        }
    }
}
