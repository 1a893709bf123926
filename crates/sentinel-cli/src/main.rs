mod display;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use sentinel_ai::{Analyzer, Composer, GeminiGenerator, Generator, Mode};
use sentinel_core::SentinelConfig;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "sentinel",
    version,
    about = "Contract risk, HR compliance and salary checks for Indian employment contracts"
)]
struct Cli {
    /// Configuration file (TOML). Defaults apply when absent.
    #[arg(long, global = true, env = "SENTINEL_CONFIG")]
    config: Option<PathBuf>,

    /// Language model API keys, comma-separated. Without keys, answers are
    /// built from the retrieved text only.
    #[arg(
        long = "api-key",
        global = true,
        env = "SENTINEL_API_KEYS",
        value_delimiter = ',',
        hide_env_values = true
    )]
    api_keys: Vec<String>,

    #[arg(long, global = true, value_enum, default_value_t = Format::Json)]
    format: Format,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Table,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    General,
    Hr,
    Salary,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::General => Mode::General,
            ModeArg::Hr => Mode::Hr,
            ModeArg::Salary => Mode::Salary,
        }
    }
}

#[derive(Subcommand)]
enum Cmd {
    /// Classify every clause and score the contract's overall risk
    Analyze {
        /// Plain-text contract
        file: PathBuf,
        /// Ask the language model to rephrase risk explanations
        #[arg(long)]
        simplify: bool,
    },
    /// Check an employment contract for required clauses
    Hr { file: PathBuf },
    /// Check a salary annexure's PF, deductions and in-hand share
    Salary { file: PathBuf },
    /// Analyze a document, then answer a question about it
    Ask {
        file: PathBuf,
        question: String,
        #[arg(long, value_enum, default_value_t = ModeArg::General)]
        mode: ModeArg,
    },
    /// List the rule catalog in evaluation order
    Rules,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();
    info!("sentinel v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let config = SentinelConfig::load(cli.config.as_deref()).context("loading configuration")?;
    let analyzer = Analyzer::new(config)?;
    let composer = build_composer(&analyzer, &cli.api_keys)?;

    match cli.cmd {
        Cmd::Analyze { file, simplify } => {
            let mut result = analyzer.analyze(&read_document(&file)?)?;
            if simplify {
                composer.simplify_all(&mut result.all_clauses).await;
                result.risky_clauses = result
                    .all_clauses
                    .iter()
                    .filter(|c| c.is_risky())
                    .cloned()
                    .collect();
            }
            match cli.format {
                Format::Json => print_json(&result)?,
                Format::Table => display::print_analysis(&result)?,
            }
        }
        Cmd::Hr { file } => {
            let result = analyzer.validate(&read_document(&file)?)?;
            match cli.format {
                Format::Json => print_json(&result)?,
                Format::Table => display::print_compliance(&result)?,
            }
        }
        Cmd::Salary { file } => {
            let report = analyzer.salary(&read_document(&file)?)?;
            match cli.format {
                Format::Json => print_json(&report)?,
                Format::Table => display::print_salary(&report),
            }
        }
        Cmd::Ask {
            file,
            question,
            mode,
        } => {
            let text = read_document(&file)?;
            let mut session = analyzer.session(composer);
            match Mode::from(mode) {
                Mode::General => session.load_analysis(&analyzer.analyze(&text)?),
                Mode::Hr => session.load_compliance(&analyzer.validate(&text)?),
                Mode::Salary => session.load_salary(&analyzer.salary(&text)?),
            }
            let record = session.ask(&question).await?;
            match cli.format {
                Format::Json => print_json(&record)?,
                Format::Table => display::print_answer(&record),
            }
        }
        Cmd::Rules => match cli.format {
            Format::Json => {
                let specs: Vec<_> = analyzer.catalog().rules().iter().map(|r| &r.spec).collect();
                print_json(&specs)?;
            }
            Format::Table => display::print_rules(analyzer.catalog())?,
        },
    }

    Ok(())
}

fn build_composer(analyzer: &Analyzer, api_keys: &[String]) -> anyhow::Result<Composer> {
    let config = &analyzer.config().generator;
    if api_keys.iter().all(|k| k.trim().is_empty()) {
        info!("no API keys given, answers will be built from retrieved text");
        return Ok(Composer::new(None, config));
    }
    let generator: Arc<dyn Generator> = Arc::new(
        GeminiGenerator::new(config, api_keys.to_vec()).context("creating language model client")?,
    );
    Ok(Composer::new(Some(generator), config))
}

fn read_document(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
