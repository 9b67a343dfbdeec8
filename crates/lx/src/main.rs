use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use lx_core::{
    ConfigManager, ConsoleCommand, ConsoleEvent, EngineSnapshot, LightingConsole, WriterSink,
};
use tokio::io::{AsyncBufReadExt, BufReader};

mod command_line;

use command_line::parse_command;

/// Headless theatrical lighting console driving a serial DMX transmitter.
#[derive(Parser, Debug)]
#[command(name = "lx")]
#[command(about = "LX cue console")]
struct Args {
    /// Configuration file (created with defaults when missing)
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Serial device of the DMX transmitter, overrides the config file
    #[arg(short, long)]
    device: Option<PathBuf>,

    /// Number of DMX channels, overrides the config file
    #[arg(long)]
    channels: Option<usize>,

    /// Milliseconds between frames, overrides the config file
    #[arg(long)]
    frame_period_ms: Option<u64>,

    /// Show file to load at startup
    #[arg(short, long)]
    show: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config_manager = ConfigManager::new(Some(args.config.clone()));
    let mut settings = config_manager
        .load()
        .with_context(|| format!("loading configuration from {}", args.config.display()))?;
    if let Some(device) = args.device {
        settings.device_path = device;
    }
    if let Some(channels) = args.channels {
        settings.channel_count = channels;
    }
    if let Some(period) = args.frame_period_ms {
        settings.frame_period_ms = period;
    }

    let mut console = LightingConsole::new(settings.clone())?;
    if let Some(path) = &args.show {
        console.load_show(path)?;
    }

    // Failing to open the transport is the one fatal error.
    let sink = WriterSink::open_device(&settings.device_path)
        .await
        .with_context(|| format!("opening DMX device {}", settings.device_path.display()))?;
    console.start(Box::new(sink))?;

    println!(
        "{}: {} channels on {}. Type 'show' for status, 'quit' to exit.",
        console.show_name(),
        settings.channel_count,
        settings.device_path.display()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading operator input")? else {
                    break;
                };
                let command = match parse_command(&line) {
                    Ok(Some(ConsoleCommand::Shutdown)) => break,
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(e) => {
                        println!("{}", e);
                        continue;
                    }
                };
                match console.process_command(command).await {
                    Ok(event) => print_event(&event),
                    Err(e) => println!("{}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("Interrupted");
                break;
            }
        }
    }

    let stats = console.shutdown().await?;
    println!(
        "Sent {} frames ({} write failures, {} missed deadlines)",
        stats.frames_sent, stats.write_failures, stats.missed_deadlines
    );
    Ok(())
}

fn print_event(event: &ConsoleEvent) {
    match event {
        ConsoleEvent::TransitionStarted { number, .. } => println!("Fading to cue {}", number),
        ConsoleEvent::NoChange => println!("No cue in that direction"),
        ConsoleEvent::CueRecorded { number, .. } => println!("Recorded cue {}", number),
        ConsoleEvent::ChannelsCaptured { channels, level } => {
            println!("{} channels at {}", channels.len(), level)
        }
        ConsoleEvent::ChannelsReleased { channels } => {
            println!("Released {} channels", channels.len())
        }
        ConsoleEvent::CueDeleted { number, .. } => println!("Deleted cue {}", number),
        ConsoleEvent::ShowCreated { name } => println!("New show '{}'", name),
        ConsoleEvent::ShowLoaded { name, cue_count } => {
            println!("Loaded '{}' ({} cues)", name, cue_count)
        }
        ConsoleEvent::ShowSaved { path } => println!("Saved to {}", path.display()),
        ConsoleEvent::Snapshot { snapshot } => print_snapshot(snapshot),
        ConsoleEvent::ShutdownComplete { .. } => {}
    }
}

fn print_snapshot(snapshot: &EngineSnapshot) {
    println!(
        "State: {:?} ({:.0}%)",
        snapshot.state,
        snapshot.transition_progress * 100.0
    );
    for row in &snapshot.cue_window {
        println!(
            "{} {:>6} {:>5.1} {:>5.1}  {}",
            if row.is_current { ">" } else { " " },
            row.number.to_string(),
            row.up_time,
            row.down_time,
            row.description
        );
    }
    if let Some(next) = snapshot.suggested_next_number {
        println!("Next free cue: {}", next);
    }

    for (row, levels) in snapshot.output.chunks(10).enumerate() {
        let cells: Vec<String> = levels
            .iter()
            .enumerate()
            .map(|(offset, level)| {
                let captured = snapshot.channel_states[row * 10 + offset].is_captured();
                format!("{:>3}{}", level, if captured { "*" } else { " " })
            })
            .collect();
        println!("{:>3}: {}", row * 10 + 1, cells.join(" "));
    }
}
