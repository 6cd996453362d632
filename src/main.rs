use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use flashcards_llm::flashcards::render::{render_alternatives_markdown, render_json};
use flashcards_llm::flashcards::FlashcardGenerator;
use flashcards_llm::media::{ContentStore, FsContentStore};
use flashcards_llm::models::{ChoiceResult, Config, InvocationDefaults};
use std::io::Read;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "flashcards-llm")]
#[command(about = "Generate flashcards from markdown notes with an LLM")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,

    /// Number of cards per alternative.
    #[arg(long, global = true, value_parser = parse_count_arg)]
    questions: Option<usize>,

    /// Number of alternative card sets to sample.
    #[arg(long, global = true, value_parser = parse_count_arg)]
    alternatives: Option<usize>,

    /// Text model for this run; media requests still use the vision model.
    #[arg(long, global = true)]
    model: Option<String>,

    /// Vault root; overrides FLASHCARDS_VAULT.
    #[arg(long, global = true)]
    vault: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Markdown)]
    format: OutputFormat,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate from text read on stdin.
    Selection,
    /// Generate from a whole note in the vault.
    Note {
        /// Vault-relative note path; defaults to FLASHCARDS_ACTIVE_FILE.
        path: Option<String>,
    },
    /// Generate from a standalone image or PDF in the vault.
    File {
        /// Vault-relative file path; defaults to FLASHCARDS_ACTIVE_FILE.
        path: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Markdown,
}

fn parse_count_arg(input: &str) -> std::result::Result<usize, String> {
    match input.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(format!(
            "Invalid count '{}'. Expected a whole number of at least 1",
            input
        )),
    }
}

impl CliArgs {
    fn counts(&self, defaults: InvocationDefaults) -> (usize, usize) {
        (
            self.questions.unwrap_or(defaults.question_count),
            self.alternatives.unwrap_or(defaults.alternatives),
        )
    }
}

async fn target_path(store: &dyn ContentStore, path: Option<String>) -> Result<String> {
    if let Some(path) = path {
        return Ok(path);
    }
    match store.active_file().await? {
        Some(path) => Ok(path),
        None => bail!("No path given and FLASHCARDS_ACTIVE_FILE is not set"),
    }
}

async fn run(args: CliArgs) -> Result<Vec<ChoiceResult>> {
    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(vault) = &args.vault {
        config.vault_root = vault.clone();
    }
    config.options.model_override = args.model.clone();

    let store = FsContentStore::new(&config.vault_root).with_active_file(config.active_file.clone());
    let generator = FlashcardGenerator::new(Box::new(store))?;

    let results = match &args.command {
        Command::Selection => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read selection from stdin")?;
            if text.trim().is_empty() {
                bail!("Selection is empty");
            }
            let (questions, alternatives) = args.counts(config.selection);
            generator
                .generate(
                    &config.provider,
                    &text,
                    questions,
                    alternatives,
                    &config.options,
                    Some(&config.media),
                )
                .await
        }
        Command::Note { path } => {
            let path = target_path(generator.store(), path.clone()).await?;
            let bytes = generator.store().read_file(&path).await?;
            let text = String::from_utf8(bytes)
                .with_context(|| format!("{} is not valid UTF-8 text", path))?;
            info!("Generating flashcards from note {}", path);
            let (questions, alternatives) = args.counts(config.file);
            generator
                .generate(
                    &config.provider,
                    &text,
                    questions,
                    alternatives,
                    &config.options,
                    Some(&config.media),
                )
                .await
        }
        Command::File { path } => {
            let path = target_path(generator.store(), path.clone()).await?;
            info!("Generating flashcards from file {}", path);
            let (questions, alternatives) = args.counts(config.file);
            generator
                .generate_from_file(
                    &config.provider,
                    &path,
                    questions,
                    alternatives,
                    &config.options,
                    &config.media,
                )
                .await
        }
    };

    Ok(results)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flashcards_llm=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();
    let format = args.format;

    match run(args).await {
        Ok(results) if results.is_empty() => {
            error!("No flashcards were generated");
            std::process::exit(1);
        }
        Ok(results) => {
            let output = match format {
                OutputFormat::Json => render_json(&results)?,
                OutputFormat::Markdown => render_alternatives_markdown(&results),
            };
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            error!("Generation failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_count_arg_valid() {
        assert_eq!(parse_count_arg("5").unwrap(), 5);
    }

    #[test]
    fn test_parse_count_arg_invalid() {
        assert!(parse_count_arg("0").unwrap_err().contains("at least 1"));
        assert!(parse_count_arg("many").is_err());
    }

    #[test]
    fn test_cli_counts_fall_back_to_defaults() {
        let args = CliArgs::parse_from(["flashcards-llm", "note", "a.md", "--questions", "4"]);
        let defaults = InvocationDefaults {
            question_count: 10,
            alternatives: 1,
        };
        assert_eq!(args.counts(defaults), (4, 1));
        assert!(matches!(args.command, Command::Note { path: Some(ref p) } if p == "a.md"));
        assert_eq!(args.format, OutputFormat::Markdown);
    }

    #[test]
    fn test_cli_parses_format() {
        let args = CliArgs::parse_from(["flashcards-llm", "--format", "json", "selection"]);
        assert_eq!(args.format, OutputFormat::Json);
        assert!(matches!(args.command, Command::Selection));
    }
}
