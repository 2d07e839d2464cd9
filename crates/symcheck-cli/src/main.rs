mod interactive;
mod render;

use std::path::{Path, PathBuf};

use anyhow::{Context, ensure};
use clap::{Args, Parser, Subcommand, ValueEnum};
use symcheck_ai::{ConfidenceBands, ModelArtifact, Predictor, RankingPolicy, evaluate_csv};
use symcheck_server::{AppState, ServiceConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "symcheck", version, about = "Symptom checker over a boosted-tree model")]
struct Cli {
    /// Artifact prefix: `{prefix}.json`, `{prefix}.labels.txt`, `{prefix}.features.txt`.
    #[arg(
        long,
        global = true,
        env = "SYMCHECK_ARTIFACTS",
        default_value = "models/symptom_model"
    )]
    artifacts: PathBuf,

    #[command(flatten)]
    ranking: RankingArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service
    Serve {
        #[arg(long, env = "SYMCHECK_HOST", default_value = "0.0.0.0")]
        host: String,
        #[arg(long, env = "SYMCHECK_PORT", default_value_t = 8002)]
        port: u16,
    },
    /// Predict conditions for a list of symptoms
    Predict {
        #[arg(long, num_args = 1.., required = true)]
        symptoms: Vec<String>,
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
    /// Print the recognised symptom vocabulary
    Symptoms,
    /// Prompt for symptoms line by line
    Interactive,
    /// Measure accuracy on a labelled CSV
    Eval {
        /// Target disease in column 0, one column per symptom.
        #[arg(long)]
        csv: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Csv,
    Simple,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// Top 5, each above 1%
    Full,
    /// Top 3, no floor
    Lightweight,
}

#[derive(Args)]
struct RankingArgs {
    #[arg(long, global = true, value_enum, env = "SYMCHECK_MODE", default_value_t = Mode::Full)]
    mode: Mode,

    /// Override the number of conditions returned.
    #[arg(long, global = true, env = "SYMCHECK_TOP_K")]
    top_k: Option<usize>,

    /// Override the confidence floor (strictly greater than).
    #[arg(long, global = true, env = "SYMCHECK_MIN_CONFIDENCE")]
    min_confidence: Option<f64>,

    #[arg(long, global = true, env = "SYMCHECK_HIGH_THRESHOLD")]
    high_threshold: Option<f64>,

    #[arg(long, global = true, env = "SYMCHECK_MEDIUM_THRESHOLD")]
    medium_threshold: Option<f64>,
}

impl RankingArgs {
    /// Preset for `mode`, then explicit overrides.
    fn policy(&self) -> anyhow::Result<RankingPolicy> {
        let mut policy = match self.mode {
            Mode::Full => RankingPolicy::full(),
            Mode::Lightweight => RankingPolicy::lightweight(),
        };
        if let Some(k) = self.top_k {
            ensure!(k >= 1, "--top-k must be at least 1");
            policy = policy.with_top_k(k);
        }
        if let Some(floor) = self.min_confidence {
            ensure!((0.0..1.0).contains(&floor), "--min-confidence must be in [0, 1)");
            policy = policy.with_min_confidence(Some(floor));
        }
        let defaults = ConfidenceBands::default();
        let bands = ConfidenceBands {
            high: self.high_threshold.unwrap_or(defaults.high),
            medium: self.medium_threshold.unwrap_or(defaults.medium),
        };
        ensure!(
            (0.0..=1.0).contains(&bands.medium)
                && (0.0..=1.0).contains(&bands.high)
                && bands.medium <= bands.high,
            "band thresholds must satisfy 0 <= medium <= high <= 1"
        );
        Ok(policy.with_bands(bands))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let policy = cli.ranking.policy()?;

    match cli.command {
        Command::Serve { host, port } => {
            tracing::info!("symcheck v{}", env!("CARGO_PKG_VERSION"));
            let state = AppState::load(&cli.artifacts, policy);
            symcheck_server::serve(&ServiceConfig { host, port }, state).await?;
        }
        Command::Predict { symptoms, format } => {
            let predictor = load_predictor(&cli.artifacts, policy)?;
            let output = match format {
                Format::Json => render::json(&predictor.respond(symptoms))?,
                Format::Csv => render::csv(&predictor.predict(symptoms.as_slice())?),
                Format::Simple => render::simple(&predictor.predict(symptoms.as_slice())?),
            };
            println!("{output}");
        }
        Command::Symptoms => {
            let artifact = load_artifact(&cli.artifacts)?;
            println!("{}", render::symptom_list(artifact.vocabulary()));
        }
        Command::Interactive => {
            let predictor = load_predictor(&cli.artifacts, policy)?;
            interactive::run(&predictor, std::io::stdin().lock(), std::io::stdout())?;
        }
        Command::Eval { csv } => {
            let artifact = load_artifact(&cli.artifacts)?;
            let eval = evaluate_csv(&artifact, &csv)?;
            print!("{}", render::evaluation(&eval, artifact.labels()));
        }
    }

    Ok(())
}

fn load_artifact(prefix: &Path) -> anyhow::Result<ModelArtifact> {
    ModelArtifact::load(prefix)
        .with_context(|| format!("loading artifacts from {}", prefix.display()))
}

fn load_predictor(prefix: &Path, policy: RankingPolicy) -> anyhow::Result<Predictor> {
    Ok(Predictor::new(load_artifact(prefix)?, policy))
}
