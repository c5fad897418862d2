// src/main.rs

//! `termgfx [FILE]`: renders a drawing-command stream read from FILE, or from
//! stdin when no file is given.

use termgfx::{
    config::{Backend, Config, CONFIG},
    session::Session,
    signal,
    sink::{ConsoleSink, HeadlessSink},
    StreamEnd,
};

use anyhow::{bail, Context};
use log::{info, warn};
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::atomic::AtomicBool;

fn main() -> anyhow::Result<()> {
    let config: &Config = &CONFIG;
    init_logging(config)?;
    info!("Starting termgfx...");
    info!("Configuration: {:?}", config);

    let mut input = open_input(std::env::args_os().nth(1))?;
    if input
        .fill_buf()
        .context("failed to read input stream")?
        .is_empty()
    {
        bail!("no input: the command stream is empty");
    }

    let interrupt = signal::install_interrupt_handler()?;

    let end = match config.display.backend {
        Backend::Console => run_console(config, input, interrupt)?,
        Backend::Headless => run_headless(config, input, interrupt)?,
    };

    match end {
        StreamEnd::EndOfStream => info!("termgfx: end of stream"),
        StreamEnd::Exhausted { trailing: 0 } => info!("termgfx: input exhausted"),
        StreamEnd::Exhausted { trailing } => {
            warn!("termgfx: input ended inside a record ({} bytes dropped)", trailing)
        }
        StreamEnd::Interrupted => info!("termgfx: interrupted"),
    }
    Ok(())
}

fn init_logging(config: &Config) -> anyhow::Result<()> {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.default_filter.as_str()),
    );
    builder.format_timestamp_micros();
    if let Some(path) = &config.logging.file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn open_input(path: Option<OsString>) -> anyhow::Result<Box<dyn BufRead>> {
    match path {
        Some(path) => {
            let path = Path::new(&path);
            let file = File::open(path)
                .with_context(|| format!("failed to open input file {}", path.display()))?;
            info!("Reading commands from {}", path.display());
            Ok(Box::new(BufReader::new(file)))
        }
        None => {
            info!("Reading commands from stdin");
            Ok(Box::new(BufReader::new(io::stdin())))
        }
    }
}

fn run_console(
    config: &Config,
    input: Box<dyn BufRead>,
    interrupt: &'static AtomicBool,
) -> anyhow::Result<StreamEnd> {
    let mut sink = ConsoleSink::acquire(config).context("failed to set up the terminal")?;

    let end = Session::new(&mut sink, config.display.repaint)
        .with_chunk_size(config.display.read_chunk_size)
        .with_interrupt(interrupt)
        .run(input)?;

    if config.display.wait_for_key && end != StreamEnd::Interrupted {
        if let Err(e) = sink.show_prompt(&config.display.exit_prompt) {
            warn!("termgfx: {:#}", e);
        }
        sink.wait_for_key()?;
    }
    Ok(end)
}

fn run_headless(
    config: &Config,
    input: Box<dyn BufRead>,
    interrupt: &'static AtomicBool,
) -> anyhow::Result<StreamEnd> {
    let mut sink = HeadlessSink::new(config.display.placeholder);

    let end = Session::new(&mut sink, config.display.repaint)
        .with_chunk_size(config.display.read_chunk_size)
        .with_interrupt(interrupt)
        .run(input)?;

    println!("{}", sink.to_text());
    Ok(end)
}
