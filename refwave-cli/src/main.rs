use clap::Parser;
use refwave::{
    AnalysisConfig, FitConfig, OwnedWaveform, ReferenceAnalysis, ReferenceAnalyzer,
    ReferenceParameters, SolverConfig,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "Reference waveform analysis (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for the analysis stages.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
struct TimebaseJson {
    #[serde(default)]
    t0: f64,
    dt: f64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct FitConfigJson {
    amplitude_lower_factor: f64,
    amplitude_upper_factor: f64,
    max_frequency_shift: f64,
    phase_half_range: f64,
    max_iterations: usize,
}

impl Default for FitConfigJson {
    fn default() -> Self {
        let cfg = FitConfig::default();
        Self {
            amplitude_lower_factor: cfg.amplitude_lower_factor,
            amplitude_upper_factor: cfg.amplitude_upper_factor,
            max_frequency_shift: cfg.max_frequency_shift,
            phase_half_range: cfg.phase_half_range,
            max_iterations: cfg.solver.max_iterations,
        }
    }
}

impl From<FitConfigJson> for FitConfig {
    fn from(value: FitConfigJson) -> Self {
        Self {
            amplitude_lower_factor: value.amplitude_lower_factor,
            amplitude_upper_factor: value.amplitude_upper_factor,
            max_frequency_shift: value.max_frequency_shift,
            phase_half_range: value.phase_half_range,
            solver: SolverConfig {
                max_iterations: value.max_iterations,
                ..SolverConfig::default()
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    waveform_path: String,
    timebase: Option<TimebaseJson>,
    pad_factor: usize,
    fit: FitConfigJson,
    output_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            waveform_path: String::new(),
            timebase: None,
            pad_factor: AnalysisConfig::default().pad_factor,
            fit: FitConfigJson::default(),
            output_path: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WaveformFile {
    #[serde(default)]
    time: Option<Vec<f64>>,
    values: Vec<f64>,
}

#[derive(Debug, Serialize)]
struct ParamsRecord {
    frequency_hz: f64,
    amplitude: f64,
    phase_offset: f64,
}

impl From<&ReferenceParameters> for ParamsRecord {
    fn from(value: &ReferenceParameters) -> Self {
        Self {
            frequency_hz: value.frequency,
            amplitude: value.amplitude,
            phase_offset: value.phase_offset,
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    initial: ParamsRecord,
    refined: ParamsRecord,
    dc_component: f64,
    peak_refined: bool,
    fit_iterations: usize,
    fit_cost: f64,
}

impl From<&ReferenceAnalysis> for Output {
    fn from(value: &ReferenceAnalysis) -> Self {
        Self {
            initial: value.initial().into(),
            refined: value.refined().into(),
            dc_component: value.dc_component,
            peak_refined: value.spectral.component.peak.is_refined(),
            fit_iterations: value.fit.report.iterations,
            fit_cost: value.fit.report.cost,
        }
    }
}

fn load_waveform(config: &Config) -> Result<OwnedWaveform, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(&config.waveform_path)?;
    let file: WaveformFile = serde_json::from_str(&text)?;
    let waveform = match (file.time, &config.timebase) {
        (Some(time), _) => OwnedWaveform::new(time, file.values)?,
        (None, Some(tb)) => OwnedWaveform::from_timebase(tb.t0, tb.dt, file.values)?,
        (None, None) => {
            return Err("waveform file has no `time` array and no timebase is configured".into())
        }
    };
    Ok(waveform)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("refwave=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.waveform_path.is_empty() {
        return Err("waveform_path must be set in the config".into());
    }
    if config.pad_factor == 0 {
        return Err("pad_factor must be at least 1".into());
    }

    let waveform = load_waveform(&config)?;
    let analyzer = ReferenceAnalyzer::new().with_config(AnalysisConfig {
        pad_factor: config.pad_factor,
        fit: config.fit.into(),
        parallel: false,
    });
    let analysis = analyzer.analyze(&waveform.view())?;
    tracing::info!(
        frequency_hz = analysis.refined().frequency,
        amplitude = analysis.refined().amplitude,
        "reference analysed"
    );

    let output = Output::from(&analysis);
    let json = serde_json::to_string_pretty(&output)?;
    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
