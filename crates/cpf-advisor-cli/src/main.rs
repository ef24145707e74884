//! CPF Advisor CLI
//!
//! The `cpf-advisor` command answers CPF housing questions from official CPF
//! sources.
//!
//! ## Commands
//!
//! - `ask`: answer one question
//! - `chat`: interactive session with history
//! - `sources`: show which reference pages a question would use
//! - `fetch`: print the cleaned text of one page
//! - `catalog`: list the reference catalog

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use cpf_advisor_core::{AdvisorConfig, Orchestrator, Session};
use cpf_evidence::{HttpFetcher, PageFetcher};
use cpf_llm::{OpenAiClient, OpenAiConfig};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, Level};

const DISCLAIMER: &str = "IMPORTANT NOTICE
This application is a prototype developed for educational purposes only.
The information provided here is NOT intended for real-world usage and should not
be relied upon for making any decisions, especially those related to financial,
legal, or healthcare matters.

The language model may generate inaccurate or incorrect information.
You assume full responsibility for how you use any generated output.

Always consult with qualified professionals for accurate and personalized advice.";

#[derive(Parser)]
#[command(name = "cpf-advisor")]
#[command(version = cpf_advisor_core::VERSION)]
#[command(about = "Answer CPF housing questions from official CPF sources", long_about = None)]
struct Cli {
    /// Path to an advisor TOML configuration file
    #[arg(short, long, global = true, env = "CPF_ADVISOR_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single question
    Ask {
        /// The question, e.g. "how does cpf housing loan interest work"
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,

        /// Print the rendered answer or the structured outcome
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Interactive question-and-answer session
    Chat,

    /// Show the reference pages selected for a question (no network)
    Sources {
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },

    /// Fetch one page and print its cleaned main text
    Fetch {
        url: String,

        /// Print the full extraction without the content cap
        #[arg(long)]
        raw: bool,
    },

    /// List reference catalog categories
    Catalog {
        /// Also list every URL
        #[arg(long)]
        urls: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; the environment may already carry the key.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    cpf_advisor_core::init_tracing(cli.json, level);

    let config = AdvisorConfig::load_or_default(cli.config.as_deref()).with_context(|| {
        format!(
            "Failed to load configuration from {}",
            cli.config
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "defaults".to_string())
        )
    })?;

    match cli.command {
        Commands::Ask { question, format } => {
            let advisor = build_orchestrator(&config)?;
            cmd_ask(&advisor, &question.join(" "), format).await
        }
        Commands::Chat => {
            let advisor = build_orchestrator(&config)?;
            let stdin = BufReader::new(tokio::io::stdin());
            cmd_chat(&advisor, stdin, &mut std::io::stdout()).await
        }
        Commands::Sources { question } => cmd_sources(&config, &question.join(" ")),
        Commands::Fetch { url, raw } => cmd_fetch(&config, &url, raw).await,
        Commands::Catalog { urls } => cmd_catalog(&config, urls),
    }
}

fn build_orchestrator(config: &AdvisorConfig) -> Result<Orchestrator> {
    let fetcher = HttpFetcher::new(&config.fetcher_config()).context("Failed to build HTTP fetcher")?;

    let llm_config = OpenAiConfig::from_env(&config.model.name)
        .context("Failed to configure the text-generation backend")?
        .with_timeout(Duration::from_secs(config.model.timeout_secs));
    let client = OpenAiClient::new(llm_config).context("Failed to build OpenAI client")?;
    debug!(model = %client.model(), "text-generation backend ready");

    Orchestrator::from_config(config, Arc::new(fetcher), Arc::new(client))
        .context("Failed to assemble advisor")
}

/// Answer one question
async fn cmd_ask(advisor: &Orchestrator, question: &str, format: OutputFormat) -> Result<()> {
    let answer = advisor.answer(question).await;
    match format {
        OutputFormat::Text => println!("{}", answer.render()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&answer)?),
    }
    Ok(())
}

/// Interactive loop over one session. `:history` lists previous exchanges,
/// `:quit` (or end of input) leaves.
async fn cmd_chat<R, W>(advisor: &Orchestrator, input: R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut session = Session::new();
    writeln!(out, "{DISCLAIMER}\n")?;
    writeln!(
        out,
        "Ask your CPF question (e.g. How does CPF housing loan interest work?)."
    )?;
    writeln!(out, "Commands: :history, :quit\n")?;

    let mut lines = input.lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };
        let line = line.trim();
        match line {
            "" => continue,
            ":quit" | ":q" => break,
            ":history" => print_history(&session, out)?,
            question => {
                let text = advisor.handle_in_session(&mut session, question).await;
                writeln!(out, "\n{text}\n")?;
            }
        }
    }

    debug!(session_id = %session.id, exchanges = session.len(), "chat session ended");
    Ok(())
}

fn print_history<W: Write>(session: &Session, out: &mut W) -> Result<()> {
    if session.is_empty() {
        writeln!(out, "No previous questions.")?;
        return Ok(());
    }
    writeln!(out, "### Previous Questions and Answers")?;
    for entry in session.newest_first() {
        writeln!(out, "\nQ: {}", entry.preview())?;
        writeln!(out, "Asked: {}", entry.asked_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        writeln!(out, "{}", entry.answer)?;
    }
    writeln!(out)?;
    Ok(())
}

/// Show which reference pages a question selects
fn cmd_sources(config: &AdvisorConfig, question: &str) -> Result<()> {
    let gate = config.domain_gate()?;
    let catalog = config.reference_catalog()?;

    if !gate.is_in_domain(question) {
        println!("Out of domain: the advisor would refuse this question.");
    }
    let urls = catalog.select_urls(question);
    if urls.is_fallback() {
        println!("No page matched; using general information pages:");
    }
    for url in urls.iter() {
        println!("- {url}");
    }
    Ok(())
}

/// Fetch one page and print its cleaned text
async fn cmd_fetch(config: &AdvisorConfig, url: &str, raw: bool) -> Result<()> {
    let fetcher = HttpFetcher::new(&config.fetcher_config()).context("Failed to build HTTP fetcher")?;
    let timeout = Duration::from_secs(config.fetch.timeout_secs);

    let text = fetcher
        .fetch_page(url, timeout)
        .await
        .with_context(|| format!("Failed to fetch {url}"))?;
    if raw {
        println!("{text}");
    } else {
        let cleaned = cpf_evidence::clean_content(&text, config.fetch.max_content_chars)
            .unwrap_or_default();
        println!("{cleaned}");
    }
    Ok(())
}

/// List catalog categories
fn cmd_catalog(config: &AdvisorConfig, show_urls: bool) -> Result<()> {
    let catalog = config.reference_catalog()?;
    for category in catalog.categories() {
        println!("{} ({} urls)", category.name, category.urls.len());
        if show_urls {
            for url in &category.urls {
                println!("  {url}");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpf_evidence::fakes::StaticFetcher;
    use cpf_llm::fakes::ScriptedGenerator;

    fn advisor() -> Orchestrator {
        let fetcher = Arc::new(StaticFetcher::new().with_page(
            "https://www.cpf.gov.sg/member/home-ownership",
            "Use CPF savings to buy a home.",
        ));
        let generator = Arc::new(ScriptedGenerator::always("Use your OA savings."));
        Orchestrator::from_config(&AdvisorConfig::default(), fetcher, generator).unwrap()
    }

    #[test]
    fn test_cli_parses_multi_word_question() {
        let cli = Cli::try_parse_from(["cpf-advisor", "ask", "how", "does", "cpf", "work"]).unwrap();
        match cli.command {
            Commands::Ask { question, format } => {
                assert_eq!(question.join(" "), "how does cpf work");
                assert_eq!(format, OutputFormat::Text);
            }
            _ => panic!("Expected ask"),
        }
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["cpf-advisor", "catalog", "--verbose", "--config", "a.toml"])
                .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("a.toml")));
    }

    #[test]
    fn test_ask_requires_a_question() {
        assert!(Cli::try_parse_from(["cpf-advisor", "ask"]).is_err());
    }

    #[tokio::test]
    async fn test_chat_answers_lists_history_and_quits() {
        let input: &[u8] = b"tell me about hdb grant\nwhat's the weather today\n:history\n:quit\nnever read\n";
        let mut out = Vec::new();

        cmd_chat(&advisor(), input, &mut out).await.unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.starts_with("IMPORTANT NOTICE"));
        assert!(printed.contains("### AI Analysis\nUse your OA savings."));
        assert!(printed.contains(cpf_advisor_core::REFUSAL_MESSAGE));

        let history = printed.split("### Previous Questions and Answers").nth(1).unwrap();
        let weather = history.find("Q: what's the weather today...").unwrap();
        let grant = history.find("Q: tell me about hdb grant...").unwrap();
        assert!(weather < grant, "history is newest first");
        assert!(!printed.contains("never read"));
    }

    #[tokio::test]
    async fn test_chat_history_when_empty() {
        let input: &[u8] = b":history\n";
        let mut out = Vec::new();
        cmd_chat(&advisor(), input, &mut out).await.unwrap();
        assert!(String::from_utf8(out)
            .unwrap()
            .contains("No previous questions."));
    }
}
