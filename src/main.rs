//! metronomnom - command-line metronome

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use metronomnom::audio::{
    list_output_devices, CpalSoundBank, SampleId, SamplePaths, SampleSet, SoundBank,
    SoundBankConfig,
};
use metronomnom::config::AppConfig;
use metronomnom::metronome::{MetronomeConfig, MetronomeEngine, MetronomeError};
use metronomnom::shell::{failure_status, Language, Messages, Session, Status};

#[derive(Parser)]
#[command(name = "metronomnom")]
#[command(about = "Command-line metronome with subdivisions and time signatures")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file (JSON)
    #[arg(short, long, global = true, env = "METRONOMNOM_CONFIG")]
    config: Option<PathBuf>,

    /// Message language (en, fr)
    #[arg(long, global = true)]
    lang: Option<Language>,

    /// Output device name (use 'devices' to see available devices)
    #[arg(long, global = true)]
    output_device: Option<String>,

    /// Directory containing 4c.wav, 4d.wav and tripl.wav
    #[arg(long, global = true)]
    sounds_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive metronome (default)
    Run {
        /// Start immediately at this tempo
        #[arg(short, long)]
        bpm: Option<u32>,

        /// Beats per measure (1-9)
        #[arg(long)]
        beats: Option<u32>,

        /// Print each beat number
        #[arg(long)]
        show_beats: bool,
    },

    /// List available output devices
    Devices,

    /// Check that the output device opens and all samples load
    Check,
}

fn setup_logging(verbose: bool) -> Result<()> {
    let builder = FmtSubscriber::builder().with_target(false);

    // Quiet by default so log lines do not interleave with the prompt
    if verbose {
        let subscriber = builder.with_max_level(Level::DEBUG).finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let subscriber = builder.with_env_filter(filter).finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(())
}

/// Merge the configuration file with command-line overrides
fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => AppConfig::default(),
    };

    if let Some(lang) = cli.lang {
        config.language = lang;
    }
    if let Some(device) = &cli.output_device {
        config.output_device = Some(device.clone());
    }
    if let Some(dir) = &cli.sounds_dir {
        config.samples = SamplePaths::in_dir(dir);
    }
    if let Some(Commands::Run { bpm, beats, .. }) = &cli.command {
        if bpm.is_some() {
            config.bpm = *bpm;
        }
        if let Some(beats) = beats {
            config.beats_per_measure = *beats;
        }
    }

    config.validate()?;
    debug!("Effective config: {:?}", config);
    Ok(config)
}

fn list_devices() -> Result<()> {
    println!("Output devices:");
    for device in list_output_devices()? {
        let default_marker = if device.is_default { " (default)" } else { "" };
        println!("  - {}{}", device.name, default_marker);
        if !device.supported_sample_rates.is_empty() {
            println!("      sample rates: {:?}", device.supported_sample_rates);
        }
    }
    Ok(())
}

/// Verify the audio output and the three samples without starting a metronome
fn run_check(config: &AppConfig) -> Result<()> {
    let messages = Messages::new(config.language);
    let bank_config = config.sound_bank_config();

    for id in SampleId::ALL {
        println!("  {:<12} {}", id.name(), bank_config.samples.path(id).display());
    }

    let mut bank = CpalSoundBank::new(bank_config.clone());
    let result = bank
        .open()
        .and_then(|()| SampleSet::load(&bank_config.samples).map(|_| ()));
    bank.close();

    match result {
        Ok(()) => {
            println!("OK");
            Ok(())
        }
        Err(e) => {
            println!("{}", messages.render(&failure_status(&MetronomeError::from(e))));
            anyhow::bail!("check failed")
        }
    }
}

fn print_prompt(messages: &Messages) {
    print!("{}", messages.prompt());
    let _ = std::io::stdout().flush();
}

fn print_statuses(messages: &Messages, statuses: &[Status]) {
    for status in statuses {
        println!("{}", messages.render(status));
    }
}

async fn run_interactive(config: AppConfig, show_beats: bool) -> Result<()> {
    let messages = Messages::new(config.language);
    let bank_config: SoundBankConfig = config.sound_bank_config();

    let factory = move |metronome_config: MetronomeConfig| -> Result<
        MetronomeEngine<CpalSoundBank>,
        MetronomeError,
    > {
        let engine = MetronomeEngine::with_cpal(metronome_config, bank_config.clone())?;
        Ok(if show_beats {
            engine.with_beat_callback(|beat| {
                print!("\r[{}] ", beat);
                let _ = std::io::stdout().flush();
            })
        } else {
            engine
        })
    };
    let mut session = Session::new(factory, config.beats_per_measure);

    println!("{}", messages.welcome());

    if let Some(bpm) = config.bpm {
        let reply = session.handle_line(&bpm.to_string());
        print_statuses(&messages, &reply.statuses);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print_prompt(&messages);

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    // stdin closed
                    session.stop();
                    println!();
                    break;
                };
                let reply = session.handle_line(&line);
                print_statuses(&messages, &reply.statuses);
                if reply.quit {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                session.stop();
                println!("\n{}", messages.render(&Status::Goodbye));
                break;
            }
        }
    }

    info!("Shutting down");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    let config = load_config(&cli)?;

    match cli.command {
        None => run_interactive(config, false).await?,
        Some(Commands::Run { show_beats, .. }) => run_interactive(config, show_beats).await?,
        Some(Commands::Devices) => list_devices()?,
        Some(Commands::Check) => run_check(&config)?,
    }

    Ok(())
}
