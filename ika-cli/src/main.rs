// Ika Command Line Interface
// Translation, text generation, lexicon lookup and cached audio synthesis

mod console;

use clap::{Parser, Subcommand};
use ika_core::{
    Error as CoreError, ErrorClass, GenerationKind, GenerationRequest, IkaConfig, Length, Tense, Tone,
    TranslateRequest,
};
use ika_gen::Generator;
use ika_spk::{AudioRef, VoiceParams};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ika")]
#[command(about = "Ika rule-based translation, generation and audio cache", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (JSON, TOML or YAML)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the lexicon export and catalog files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace). RUST_LOG takes precedence.
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate an English sentence
    Translate {
        /// Source text
        #[arg(required = true)]
        text: Vec<String>,

        #[arg(long, short, default_value = "present")]
        tense: Tense,

        #[arg(long, short)]
        negate: bool,

        /// Mark as a yes/no question (also implied by a trailing '?')
        #[arg(long, short)]
        question: bool,
    },

    /// Compose a poem, story or lecture about a topic
    Generate {
        #[arg(long, short, default_value = "poem")]
        kind: GenerationKind,

        /// Topic words
        #[arg(required = true)]
        topic: Vec<String>,

        #[arg(long, default_value = "neutral")]
        tone: Tone,

        #[arg(long, short, default_value = "medium")]
        length: Length,

        #[arg(long, short, default_value = "present")]
        tense: Tense,

        #[arg(long, short)]
        negate: bool,

        /// Phrase verb slots as yes/no questions
        #[arg(long, short)]
        question: bool,
    },

    /// Look up an English word or phrase, with suggestions on a miss
    Lookup {
        text: Vec<String>,
    },

    /// Find entries whose Ika text matches
    Reverse {
        text: Vec<String>,
    },

    /// List lexicon entries
    Dictionary {
        /// Only entries with this domain tag
        #[arg(long, short)]
        domain: Option<String>,

        #[arg(long, short, default_value = "50")]
        limit: usize,
    },

    /// Prerecorded audio URL of a lexicon entry
    EntryAudio {
        /// Lexicon entry id
        id: String,
    },

    /// Fetch or synthesize spoken audio for Ika text
    Audio {
        #[arg(required = true)]
        text: Vec<String>,

        /// Voice alias
        #[arg(long, short, default_value = "default")]
        voice: String,

        #[arg(long, default_value = "1.0")]
        rate: f64,

        #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
        pitch: f64,

        /// Synthesis timeout; defaults to the configured value
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Validate configuration and catalog, then exit
    Validate,

    /// Interactive console (REPL)
    Console,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.json_logs);

    if let Err(e) = run(cli).await {
        eprintln!("error: {:#}", e);
        let code = e.downcast_ref::<CoreError>().map(exit_code).unwrap_or(1);
        std::process::exit(code);
    }
}

fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Exit status per failure class, so scripts can tell "fix your input" from
/// "fix your credentials" from "try again"
fn exit_code(err: &CoreError) -> i32 {
    match err.class() {
        ErrorClass::Validation => 2,
        ErrorClass::Configuration => 3,
        ErrorClass::FixCredentials => 4,
        ErrorClass::TryAgain => 5,
        ErrorClass::Unavailable => 6,
    }
}

fn load_config(path: Option<&PathBuf>, data_dir: Option<PathBuf>) -> anyhow::Result<IkaConfig> {
    let mut config = match path {
        Some(path) => IkaConfig::from_file(path).map_err(CoreError::from)?,
        None => IkaConfig::default(),
    };
    config.apply_env();
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    config.validate().map_err(CoreError::from)?;
    Ok(config)
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_ref(), cli.data_dir)?;
    debug!("Using data directory {}", config.data_dir.display());

    // the catalog is validated before any command runs
    let generator = Arc::new(ika_gen::open(&config).map_err(CoreError::from)?);
    let catalog = generator.catalog().snapshot();
    info!(
        "Catalog {} loaded: {} patterns",
        catalog.version(),
        catalog.patterns().len()
    );

    match cli.command {
        Commands::Translate { text, tense, negate, question } => {
            let request = TranslateRequest {
                text: text.join(" "),
                tense,
                negate,
                question,
            };
            let result = generator.translate(&request).await.map_err(CoreError::from)?;
            print_json(&result)?;
        }
        Commands::Generate {
            kind,
            topic,
            tone,
            length,
            tense,
            negate,
            question,
        } => {
            let request = GenerationRequest {
                kind,
                topic: topic.join(" "),
                tone,
                length,
                tense,
                negate,
                question,
            };
            let result = generator.generate(&request).await.map_err(CoreError::from)?;
            print_json(&result)?;
        }
        Commands::Lookup { text } => {
            let result = generator
                .lexicon()
                .lookup(&text.join(" "))
                .await
                .map_err(CoreError::from)?;
            print_json(&json!({
                "query": result.query,
                "found": result.found(),
                "exact_matches": result.exact_matches,
                "suggestions": result.suggestions,
            }))?;
        }
        Commands::Reverse { text } => {
            let entries = generator
                .lexicon()
                .reverse_lookup(&text.join(" "))
                .await
                .map_err(CoreError::from)?;
            print_json(&entries)?;
        }
        Commands::Dictionary { domain, limit } => {
            let entries = generator
                .lexicon()
                .dictionary(domain.as_deref(), limit)
                .await
                .map_err(CoreError::from)?;
            print_json(&entries)?;
        }
        Commands::EntryAudio { id } => {
            let audio_url = generator
                .lexicon()
                .entry_audio_url(&id)
                .await
                .map_err(CoreError::from)?;
            print_json(&json!({
                "id": id.trim(),
                "found": audio_url.is_some(),
                "audio_url": audio_url,
            }))?;
        }
        Commands::Audio { text, voice, rate, pitch, timeout_ms } => {
            synthesize_audio(&config, &text.join(" "), VoiceParams::new(voice, rate, pitch), timeout_ms).await?;
        }
        Commands::Validate => {
            print_json(&json!({
                "status": "ok",
                "catalog_version": catalog.version(),
                "patterns": catalog.patterns().len(),
                "templates": GenerationKind::ALL
                    .iter()
                    .filter_map(|kind| catalog.get_template(*kind).map(|t| t.template_id.clone()))
                    .collect::<Vec<_>>(),
            }))?;
        }
        Commands::Console => {
            let mut console = console::InteractiveConsole::new(generator.clone());
            console.run().await?;
        }
    }

    Ok(())
}

async fn synthesize_audio(
    config: &IkaConfig,
    text: &str,
    voice: VoiceParams,
    timeout_ms: Option<u64>,
) -> anyhow::Result<()> {
    let manager = ika_spk::open(config).map_err(CoreError::from)?;
    let timeout = Duration::from_millis(timeout_ms.unwrap_or(config.audio.synthesis_timeout_ms));
    let outcome = manager
        .get_or_synthesize_with_timeout(text, &voice, timeout)
        .await
        .map_err(CoreError::from)?;

    let audio_ref = match &outcome.audio_ref {
        AudioRef::Stored(reference) => json!({ "stored": reference }),
        AudioRef::Unpersisted(bytes) => json!({ "unpersisted_bytes": bytes.len() }),
    };
    print_json(&json!({
        "key": outcome.key,
        "audio_ref": audio_ref,
        "cache_hit": outcome.cache_hit,
        "cache_persisted": outcome.cache_persisted,
    }))
}
