//! fuzzy-anemia
//!
//! Command-line interface for fuzzy anemia classification.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fuzzy_anemia::{
    AnemiaConfig, DefuzzificationMethod, Diagnoser, DiagnosisInput, ErrorResponse, Implication,
    LogLevel, OutputFormat,
};

#[derive(Parser)]
#[command(name = "fuzzy-anemia")]
#[command(version = env!("ANEMIA_VERSION"))]
#[command(long_version = concat!(env!("ANEMIA_VERSION"), " (", env!("ANEMIA_TARGET"), ")"))]
#[command(about = "Fuzzy-logic anemia classification from HGB, MCV and MCHC", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the standard search paths)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum)]
    format: Option<Format>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify one set of blood indices
    Diagnose {
        /// Hemoglobin in g/dL
        #[arg(long, allow_hyphen_values = true)]
        hgb: Option<String>,

        /// Mean corpuscular volume in fL
        #[arg(long, allow_hyphen_values = true)]
        mcv: Option<String>,

        /// Mean corpuscular hemoglobin concentration in g/dL
        #[arg(long, allow_hyphen_values = true)]
        mchc: Option<String>,

        /// Include fuzzified inputs, rule strengths and the aggregate curve
        #[arg(long)]
        detailed: bool,

        /// Defuzzification method (centroid, bisector, mom, som, lom)
        #[arg(long, value_name = "METHOD")]
        defuzz: Option<String>,

        /// Implication operator (minimum, product)
        #[arg(long, value_name = "OP")]
        implication: Option<String>,
    },

    /// Export membership curves as JSON
    Curves {
        /// Variable name (hgb, mcv, mchc, anemia) or "all" for the inputs
        #[arg(default_value = "all")]
        variable: String,

        /// Points per curve
        #[arg(long, value_name = "N")]
        downsample: Option<usize>,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a commented default configuration file
    Init {
        /// Target path
        #[arg(default_value = "fuzzy-anemia.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
    /// List the configuration search paths
    Paths,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Human-readable text
    Text,
    /// JSON
    Json,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = load_config(cli.config.as_deref())?;

    if cli.verbose {
        config.general.log_level = LogLevel::Verbose;
    } else if cli.quiet {
        config.general.log_level = LogLevel::Quiet;
    }
    if let Some(format) = cli.format {
        config.general.format = format.into();
    }

    init_logging(config.general.log_level);

    match cli.command {
        Command::Diagnose { hgb, mcv, mchc, detailed, defuzz, implication } => {
            if let Some(method) = defuzz {
                config.inference.defuzzification = DefuzzificationMethod::from_str(&method)
                    .with_context(|| format!("Unknown defuzzification method: {}", method))?;
            }
            if let Some(op) = implication {
                config.inference.implication = Implication::from_str(&op)
                    .with_context(|| format!("Unknown implication operator: {}", op))?;
            }
            diagnose(&config, hgb.as_deref(), mcv.as_deref(), mchc.as_deref(), detailed)
        }
        Command::Curves { variable, downsample } => {
            let downsample = downsample.or(config.curves.downsample);
            curves(&config, &variable, downsample)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Config { action } => {
            config_command(&config, action)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<AnemiaConfig> {
    let mut config = match path {
        Some(path) => AnemiaConfig::load_from_file(path)?,
        None => return Ok(AnemiaConfig::load()?),
    };
    config.apply_env_overrides()?;
    Ok(config)
}

fn init_logging(level: LogLevel) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.filter_directive()));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn diagnose(
    config: &AnemiaConfig,
    hgb: Option<&str>,
    mcv: Option<&str>,
    mchc: Option<&str>,
    detailed: bool,
) -> Result<ExitCode> {
    let json = config.general.format == OutputFormat::Json;

    let input = match DiagnosisInput::parse(hgb, mcv, mchc) {
        Ok(input) => input,
        Err(e) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&ErrorResponse::from(&e))?);
            } else {
                eprintln!("Invalid input: {}", e.message);
                if let Some(hint) = &e.hint {
                    eprintln!("  hint: {}", hint);
                }
            }
            return Ok(ExitCode::from(2));
        }
    };

    let diagnoser = Diagnoser::with_config(&config.inference)?;
    let report = diagnoser.report(&input)?;

    if json {
        if detailed {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            let summary = serde_json::json!({
                "category": report.category,
                "result_index": report.result_index,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        return Ok(ExitCode::SUCCESS);
    }

    println!("{}", report);
    if detailed {
        if let Some(reason) = &report.reason {
            println!("Reason: {}", reason);
        }
        println!();
        println!("Fuzzified inputs:");
        for (variable, degrees) in &report.fuzzified {
            let terms: Vec<String> = degrees
                .iter()
                .map(|(term, mu)| format!("{}={:.3}", term, mu))
                .collect();
            println!("  {:<5} {}", variable, terms.join("  "));
        }
        println!("Rules:");
        for firing in &report.rules {
            println!("  {:<6} {:.3}  -> {}", firing.rule, firing.strength, firing.consequent);
        }
        println!("Active output terms:");
        for (term, strength) in report.term_strengths.iter().filter(|(_, s)| **s > 0.0) {
            println!("  {:<26} {:.3}", term, strength);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn curves(config: &AnemiaConfig, variable: &str, downsample: Option<usize>) -> Result<()> {
    if let Some(n) = downsample {
        if n < 2 {
            bail!("--downsample needs at least 2 points, got {}", n);
        }
    }

    let diagnoser = Diagnoser::with_config(&config.inference)?;
    let output = if variable.eq_ignore_ascii_case("all") {
        serde_json::to_string_pretty(&diagnoser.input_curves(downsample))?
    } else {
        let curves = diagnoser
            .membership_curves(&variable.to_lowercase(), downsample)
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        serde_json::to_string_pretty(&curves)?
    };
    println!("{}", output);
    Ok(())
}

fn config_command(config: &AnemiaConfig, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Init { path, force } => {
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            fs::write(&path, AnemiaConfig::default_config_content())
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        ConfigAction::Show => {
            print!("{}", config.to_toml()?);
        }
        ConfigAction::Paths => {
            for path in AnemiaConfig::config_paths() {
                let marker = if path.exists() { "*" } else { " " };
                println!("{} {}", marker, path.display());
            }
        }
    }
    Ok(())
}
