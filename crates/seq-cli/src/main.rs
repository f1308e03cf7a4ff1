//! SimpleEQ command-line host
//!
//! Usage:
//!   seq run                       - Play a 1 kHz sine through the EQ and report the analyzer
//!   seq run --input in.wav        - Same with a WAV file (optionally --output out.wav)
//!   seq response --peak-gain 6    - Print the filter response at the grid frequencies
//!   seq config                    - Print the default analyzer config as JSON

mod host;
mod input;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use seq_core::{
    AnalyzerConfig, BufferSize, ChainSettings, Decibels, ParamId, ParameterStore, SampleRate,
    Slope,
};
use seq_dsp::FilterChain;
use seq_viz::grid::{GRID_FREQUENCIES, frequency_label};
use seq_viz::{chain_magnitude, format_param_value, param_display_string};

use crate::host::HostOptions;

#[derive(Parser)]
#[command(name = "seq", about = "SimpleEQ analysis core demo host")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the audio and display threads over a signal
    Run {
        /// WAV file to play (defaults to a generated sine)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Write the processed audio here
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Sine frequency in Hz
        #[arg(long, default_value_t = 1000.0)]
        freq: f64,
        /// Sine amplitude (linear)
        #[arg(long, default_value_t = 0.5)]
        amplitude: f64,
        /// Sine length in seconds
        #[arg(long, default_value_t = 2.0)]
        seconds: f64,
        /// Sample rate for the generated sine
        #[arg(long, default_value_t = 48000)]
        sample_rate: u32,
        /// Host block size
        #[arg(short, long, default_value_t = 512)]
        block_size: usize,
        /// Process as fast as possible instead of in real time
        #[arg(long)]
        fast: bool,
        /// Sweep the peak frequency while playing
        #[arg(long)]
        sweep: bool,
        /// Analyzer config (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
        #[command(flatten)]
        eq: EqArgs,
    },
    /// Print the chain's response at the grid frequencies
    Response {
        #[arg(long, default_value_t = 48000)]
        sample_rate: u32,
        #[command(flatten)]
        eq: EqArgs,
    },
    /// Print the default analyzer config
    Config,
}

/// EQ settings; flags override the settings file
#[derive(Args)]
struct EqArgs {
    /// Chain settings (JSON)
    #[arg(long)]
    settings: Option<PathBuf>,
    #[arg(long)]
    peak_freq: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    peak_gain: Option<f64>,
    #[arg(long)]
    peak_q: Option<f64>,
    #[arg(long)]
    low_cut: Option<f64>,
    #[arg(long)]
    high_cut: Option<f64>,
    /// Low-cut slope in dB/oct (12, 24, 36, 48)
    #[arg(long, value_parser = parse_slope)]
    low_slope: Option<Slope>,
    /// High-cut slope in dB/oct (12, 24, 36, 48)
    #[arg(long, value_parser = parse_slope)]
    high_slope: Option<Slope>,
}

fn parse_slope(s: &str) -> Result<Slope, String> {
    let db: f64 = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    Slope::ALL
        .into_iter()
        .find(|slope| slope.db_per_octave() == db)
        .ok_or_else(|| format!("slope must be 12, 24, 36 or 48, got {s}"))
}

impl EqArgs {
    fn chain_settings(&self) -> Result<ChainSettings> {
        let mut settings = match &self.settings {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                serde_json::from_str(&json)
                    .with_context(|| format!("Invalid settings in {}", path.display()))?
            }
            None => ChainSettings::default(),
        };

        if let Some(v) = self.peak_freq {
            settings.peak_freq = v;
        }
        if let Some(v) = self.peak_gain {
            settings.peak_gain_db = v;
        }
        if let Some(v) = self.peak_q {
            settings.peak_quality = v;
        }
        if let Some(v) = self.low_cut {
            settings.low_cut_freq = v;
        }
        if let Some(v) = self.high_cut {
            settings.high_cut_freq = v;
        }
        if let Some(v) = self.low_slope {
            settings.low_cut_slope = v;
        }
        if let Some(v) = self.high_slope {
            settings.high_cut_slope = v;
        }
        Ok(settings)
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input: wav_path,
            output,
            freq,
            amplitude,
            seconds,
            sample_rate,
            block_size,
            fast,
            sweep,
            config,
            eq,
        } => {
            let signal = match &wav_path {
                Some(path) => input::read_wav(path)?,
                None => input::sine(freq, amplitude, sample_rate, seconds),
            };
            let analyzer = load_analyzer_config(config.as_deref())?;
            let opts = HostOptions {
                block_size,
                realtime: !fast,
                sweep,
                analyzer,
            };
            run(signal, &eq, &opts, output.as_deref())
        }
        Commands::Response { sample_rate, eq } => print_response(sample_rate, &eq),
        Commands::Config => {
            println!("{}", AnalyzerConfig::default().to_json_pretty()?);
            Ok(())
        }
    }
}

fn load_analyzer_config(path: Option<&Path>) -> Result<AnalyzerConfig> {
    match path {
        Some(path) => AnalyzerConfig::from_file(path)
            .with_context(|| format!("Failed to load analyzer config {}", path.display())),
        None => Ok(AnalyzerConfig::default()),
    }
}

fn run(
    signal: input::StereoSignal,
    eq: &EqArgs,
    opts: &HostOptions,
    output: Option<&Path>,
) -> Result<()> {
    let rate = SampleRate::from_hz(signal.sample_rate)?;
    let buffer = BufferSize::from_samples(opts.block_size)?;
    let settings = eq.chain_settings()?;
    log::info!(
        "Starting SimpleEQ host: {} Hz, {} samples/block ({:.2} ms), {:.2} s",
        rate.as_u32(),
        buffer.as_usize(),
        buffer.latency_ms(rate),
        signal.duration_secs()
    );

    let params = Arc::new(ParameterStore::from_settings(&settings));
    let (processed, report) = host::run(signal, params, opts)?;

    println!(
        "display frames: {}  paths: {}  response updates: {}  dropped blocks: {}",
        report.frames, report.paths, report.response_updates, report.dropped_blocks
    );
    for (name, peak) in [("left", report.left_peak), ("right", report.right_peak)] {
        match peak {
            Some((freq, db)) => println!(
                "{name:>5} peak: {} at {:.1} dB",
                format_param_value(freq, "Hz"),
                db
            ),
            None => println!("{name:>5} peak: none"),
        }
    }
    for (freq, db) in &report.response_db {
        println!("{:>8} {:+7.2} dB", frequency_label(*freq), db);
    }

    if let Some(path) = output {
        input::write_wav(path, &processed)?;
        log::info!("Wrote {}", path.display());
    }
    Ok(())
}

fn print_response(sample_rate: u32, eq: &EqArgs) -> Result<()> {
    let rate = SampleRate::from_hz(sample_rate)?;
    let settings = eq.chain_settings()?;
    let chain = FilterChain::from_settings(&settings, rate.as_f64());

    for id in ParamId::ALL {
        println!("{:>16}: {}", id.name(), param_display_string(id, settings.value(id)));
    }
    for (freq, db) in grid_response(&chain, rate.as_f64()) {
        println!("{:>8} {:+7.2} dB", frequency_label(freq), db);
    }
    Ok(())
}

/// Chain response in dB at each grid frequency
fn grid_response(chain: &FilterChain, sample_rate: f64) -> Vec<(f64, f64)> {
    GRID_FREQUENCIES
        .iter()
        .map(|&freq| (freq, Decibels::from_gain(chain_magnitude(chain, freq, sample_rate)).0))
        .collect()
}
