use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};

use gb_sound::config::Config;
use gb_sound::{savestate, script, AudioBackend, ChannelId, LogBackend, SoundIo};

struct Args {
    config: Option<PathBuf>,
    load: Option<PathBuf>,
    save: Option<PathBuf>,
    trace: PathBuf,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut config = None;
    let mut load = None;
    let mut save = None;
    let mut trace = None;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .map(PathBuf::from)
                .ok_or_else(|| anyhow!("{} needs a file argument", flag))
        };
        match arg.as_str() {
            "--config" => config = Some(value("--config")?),
            "--load" => load = Some(value("--load")?),
            "--save" => save = Some(value("--save")?),
            _ if trace.is_none() => trace = Some(PathBuf::from(arg)),
            _ => bail!("unexpected argument '{}'", arg),
        }
    }

    let program = args.first().map(String::as_str).unwrap_or("gb_sound");
    let trace = trace.ok_or_else(|| {
        anyhow!("Usage: {} [--config FILE] [--load FILE] [--save FILE] <trace>", program)
    })?;
    Ok(Args { config, load, save, trace })
}

fn main() {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    if let Err(e) = run(&args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: &[String]) -> Result<()> {
    let args = parse_args(args)?;
    let config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    let source = std::fs::read_to_string(&args.trace)
        .with_context(|| format!("reading {}", args.trace.display()))?;
    let commands = script::parse(&source).map_err(|e| anyhow!("{}: {}", args.trace.display(), e))?;

    let mut io = SoundIo::new(config.clock.cycles_per_second);
    let mut backend = LogBackend::default();
    backend.set_muted(config.audio.muted);

    if let Some(path) = &args.load {
        savestate::load_from_file(&mut io, path, &mut backend)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("restoring {}", path.display()))?;
        println!("Restored snapshot {}", path.display());
    }

    script::play(&commands, &mut io, config.clock.double_speed, &mut backend);

    let engine = io.engine();
    println!(
        "{} commands, {} channel events, master {}, volume L{} R{}",
        commands.len(),
        backend.events,
        if engine.master_enabled() { "on" } else { "off" },
        engine.left_volume(),
        engine.right_volume(),
    );
    for channel in ChannelId::ALL {
        let control = engine.control(channel);
        println!(
            "  {}: {:<3} freq {:#05X} vol {:>2} {}{}",
            channel,
            if control.enabled { "on" } else { "off" },
            control.frequency,
            control.volume,
            if control.to_left { "L" } else { "-" },
            if control.to_right { "R" } else { "-" },
        );
    }

    if let Some(path) = &args.save {
        savestate::save_to_file(&io, config.snapshot.include_cache, path)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("saving {}", path.display()))?;
        println!("Saved snapshot to {}", path.display());
    }

    Ok(())
}
