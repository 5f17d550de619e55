use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use vocalcoach::analysis::{GenderHint, PitchExtractor};
use vocalcoach::audio::synth::{SyntheticPattern, SyntheticSpec};
use vocalcoach::audio::{FfmpegConverter, FormatConverter, HoundDecoder, PassthroughConverter};
use vocalcoach::status::ServiceStatus;
use vocalcoach::{classify, http, startup, AppConfig, RequestOrchestrator, UploadedAudio};

#[derive(Parser, Debug)]
#[command(
    name = "vocalcoach_cli",
    about = "Offline voice range analysis and service control for VocalCoach"
)]
struct Cli {
    /// JSON configuration file (defaults to $VOCALCOACH_CONFIG, then built-in defaults)
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze one recording and print the outcome as JSON
    Analyze {
        #[arg(long)]
        file: PathBuf,
        /// female/kadın, male/erkek; anything else uses the combined table
        #[arg(long)]
        gender: Option<String>,
        /// Treat the input as canonical WAV and skip the external converter
        #[arg(long)]
        no_convert: bool,
    },
    /// Classify a frequency without any audio
    Classify {
        #[arg(long)]
        pitch: f64,
        #[arg(long)]
        gender: Option<String>,
    },
    /// Write a 16-bit mono reference sine tone
    Tone {
        #[arg(long)]
        frequency: f32,
        #[arg(long, default_value_t = 1.0)]
        duration: f32,
        #[arg(long, default_value_t = 44_100)]
        sample_rate: u32,
        #[arg(long, default_value_t = 0.5)]
        amplitude: f32,
        #[arg(long)]
        output: PathBuf,
    },
    /// Print converter and storage status as JSON
    Status,
    /// Run the HTTP service
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
}

fn main() -> ExitCode {
    startup::init_logging();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = AppConfig::load_from_file(path);
            config.apply_env_overrides(|key| std::env::var(key).ok());
            config
        }
        None => AppConfig::load(),
    };

    match cli.command {
        Commands::Analyze {
            file,
            gender,
            no_convert,
        } => run_analyze(&config, file, gender, no_convert),
        Commands::Classify { pitch, gender } => run_classify(pitch, gender),
        Commands::Tone {
            frequency,
            duration,
            sample_rate,
            amplitude,
            output,
        } => run_tone(frequency, duration, sample_rate, amplitude, output),
        Commands::Status => run_status(&config),
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            run_serve(config)
        }
    }
}

fn run_analyze(
    config: &AppConfig,
    file: PathBuf,
    gender: Option<String>,
    no_convert: bool,
) -> Result<ExitCode> {
    startup::prepare_directories(&config.storage)?;

    let bytes = fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
    let filename = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let converter: Arc<dyn FormatConverter> = if no_convert {
        Arc::new(PassthroughConverter)
    } else {
        Arc::new(FfmpegConverter::new(&config.converter))
    };
    let orchestrator = RequestOrchestrator::new(
        config,
        converter,
        Arc::new(HoundDecoder),
        PitchExtractor::new(config.analysis.clone()),
    );

    let outcome = orchestrator.submit(UploadedAudio {
        bytes,
        filename,
        gender,
    });
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    Ok(if outcome.is_success() {
        ExitCode::from(0)
    } else {
        ExitCode::from(2)
    })
}

fn run_classify(pitch: f64, gender: Option<String>) -> Result<ExitCode> {
    let hint = GenderHint::parse(gender.as_deref());
    println!("{}", classify(pitch, hint));
    Ok(ExitCode::from(0))
}

fn run_tone(
    frequency: f32,
    duration: f32,
    sample_rate: u32,
    amplitude: f32,
    output: PathBuf,
) -> Result<ExitCode> {
    if !(frequency > 0.0) || sample_rate == 0 || !(duration > 0.0) {
        bail!("frequency, duration and sample rate must be positive");
    }
    let spec = SyntheticSpec {
        pattern: SyntheticPattern::Sine {
            frequency_hz: frequency,
        },
        sample_rate,
        duration_secs: duration,
        amplitude: amplitude.clamp(0.0, 1.0),
    };
    spec.write_wav(&output)
        .with_context(|| format!("writing {}", output.display()))?;
    log::info!(
        "[Tone] Wrote {:.1} Hz for {}s @ {} Hz to {}",
        frequency,
        duration,
        sample_rate,
        output.display()
    );
    Ok(ExitCode::from(0))
}

fn run_status(config: &AppConfig) -> Result<ExitCode> {
    let converter = FfmpegConverter::new(&config.converter);
    let status = ServiceStatus::probe(&converter, &config.storage);
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(ExitCode::from(0))
}

fn run_serve(config: AppConfig) -> Result<ExitCode> {
    let runtime = tokio::runtime::Runtime::new().context("building tokio runtime")?;
    runtime.block_on(http::run_server(config))?;
    Ok(ExitCode::from(0))
}
