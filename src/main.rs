use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use crossbeam_channel::unbounded;

use greenkeys::audio::{AudioSink, AudioSource, WavFileSink, WavFileSource};
use greenkeys::config::{GuardPolicy, ModemConfig};
use greenkeys::modem::{Modem, ModemEvent};
use greenkeys::modulator::Modulator;
use greenkeys::pipeline::ReceivePipeline;
use greenkeys::turnaround::Turnaround;

#[derive(Parser, Debug)]
#[command(name = "greenkeys")]
#[command(about = "Software Baudot/ITU-2 RTTY modem (1400/1800 Hz, 45 baud)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the modem live against the sound devices (default)
    Live {
        /// Suppression release policy after transmit
        #[arg(long, value_enum, default_value = "guarded")]
        guard: GuardPolicy,
    },
    /// Encode text into a WAV file of tone bursts
    Encode {
        /// Text to encode
        text: String,

        /// Output WAV file
        #[arg(short, long, default_value = "rtty.wav")]
        output: PathBuf,
    },
    /// Decode an RTTY recording back into text
    Decode {
        /// Mono WAV file to decode
        input: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Live {
        guard: GuardPolicy::Guarded,
    }) {
        Command::Live { guard } => run_live(guard),
        Command::Encode { text, output } => run_encode(&text, &output),
        Command::Decode { input } => run_decode(&input),
    }
}

fn run_live(guard: GuardPolicy) -> anyhow::Result<()> {
    let mut config = ModemConfig::default();
    config.turnaround.policy = guard;

    println!("=== greenkeys - Baudot RTTY modem ===");
    println!("Sample rate: {} Hz", config.audio.sample_rate);
    println!(
        "Mark/space: {}/{} Hz at {} baud",
        config.line.mark_hz, config.line.space_hz, config.line.baud_rate
    );
    println!("Guard policy: {:?}", config.turnaround.policy);
    println!();

    let (event_tx, event_rx) = unbounded();
    let handle = Modem::start(config, event_tx).context("starting modem")?;

    println!("Modem running. Type a line and press enter to transmit; EOF quits.\n");

    let printer = thread::spawn(move || {
        let mut stdout = std::io::stdout();
        for event in event_rx {
            match event {
                ModemEvent::CharacterReceived(c) => {
                    print!("{}", c);
                    let _ = stdout.flush();
                }
                ModemEvent::Sending(true) => log::info!("transmitting"),
                ModemEvent::Sending(false) => log::info!("transmit drained, receiver re-arming"),
                ModemEvent::TransmitFailed(reason) => {
                    eprintln!("transmit failed, queued text dropped: {}", reason);
                }
            }
        }
    });

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        handle.enqueue(&format!("{}\n", line));
    }

    println!("\nShutting down...");
    handle.shutdown();
    let _ = printer.join();
    Ok(())
}

fn run_encode(text: &str, output: &PathBuf) -> anyhow::Result<()> {
    let config = ModemConfig::default();
    let sample_rate = config.audio.sample_rate;

    let mut sink = WavFileSink::new(output, sample_rate).context("creating output WAV")?;
    let mut modulator = Modulator::new(&config.line, sample_rate);

    // A short mark leader lets a receiver's envelopes settle before the
    // first start bit, as live operators do.
    modulator.send_idle(&mut sink, 8)?;
    modulator.send_str(&mut sink, text)?;
    modulator.send_idle(&mut sink, 4)?;
    sink.drain()?;
    sink.finalize()?;

    println!("Wrote {}", output.display());
    Ok(())
}

fn run_decode(input: &PathBuf) -> anyhow::Result<()> {
    let config = ModemConfig::default();
    let mut source =
        WavFileSource::new(input, config.audio.buffer_size).context("opening input WAV")?;

    if source.sample_rate() != config.audio.sample_rate {
        anyhow::bail!(
            "WAV sample rate {} Hz, expected {} Hz",
            source.sample_rate(),
            config.audio.sample_rate
        );
    }

    // Offline decode never transmits, so suppression stays released.
    let turnaround = Turnaround::new(Duration::ZERO);
    let mut pipeline = ReceivePipeline::new(&config, turnaround);

    let mut stdout = std::io::stdout();
    while let Some(block) = source.next_block()? {
        for c in pipeline.process_block(&block) {
            print!("{}", c);
        }
        stdout.flush()?;
    }
    println!();
    Ok(())
}
