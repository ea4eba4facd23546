//! Pagechat CLI
//!
//! Scrape a web page, summarize it and ask questions about it from the terminal.

mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use config::Config;
use pagechat_core::{fetch::Fetcher, Assistant, Model, PageRecord, Scrape, Session};
use std::io::{self, BufRead, Read, Write};
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pagechat")]
#[command(author, version, about = "Scrape a web page, then summarize it or chat about it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Model to use: llama3-8b-8192, mixtral-8x7b-32768, gemma-7b-it
    #[arg(short, long, global = true)]
    model: Option<Model>,

    /// Page fetch timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a URL and print everything extracted from it
    Scrape {
        /// URL to scrape
        url: String,

        /// Output format: markdown, plain, json
        #[arg(short, long, default_value = "markdown")]
        format: OutputFormat,
    },

    /// Extract HTML from stdin
    Render {
        /// Base URL for resolving relative links
        #[arg(short, long)]
        base_url: Option<String>,

        /// Output format: markdown, plain, json
        #[arg(short, long, default_value = "markdown")]
        format: OutputFormat,
    },

    /// Scrape a URL and print a summary of it
    Summarize {
        /// URL to summarize
        url: String,
    },

    /// Scrape a URL and answer questions about it from stdin
    Chat {
        /// URL to chat about
        url: String,
    },

    /// Show the effective configuration, or change a setting
    Config {
        /// Setting to change: model, endpoint, timeout, llm.timeout, user_agent
        key: Option<String>,

        /// New value
        value: Option<String>,
    },
}

#[derive(Clone, Debug, Default)]
enum OutputFormat {
    #[default]
    Markdown,
    Plain,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "plain" | "text" | "txt" => Ok(OutputFormat::Plain),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// Replies are wrapped to this width
const WRAP_WIDTH: usize = 100;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    if cli.verbose {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(tracing_subscriber::EnvFilter::new("debug"))
            .init();
    }

    let mut config = Config::load()?;
    if let Some(model) = cli.model {
        config.llm.model = model;
    }
    if let Some(timeout) = cli.timeout {
        config.fetch.timeout_secs = timeout;
    }

    match cli.command {
        Commands::Scrape { url, format } => run_scrape(&config, &url, format).await?,
        Commands::Render { base_url, format } => run_render(&config, base_url, format)?,
        Commands::Summarize { url } => run_summarize(&config, &url).await?,
        Commands::Chat { url } => run_chat(&config, &url).await?,
        Commands::Config { key, value } => run_config(config, key, value)?,
    }

    Ok(())
}

async fn run_scrape(config: &Config, url: &str, format: OutputFormat) -> Result<()> {
    let fetcher = Fetcher::with_config(config.fetch_config())?;
    let page = fetcher.fetch(url).await?;
    print_page(&page, format)
}

fn run_render(config: &Config, base_url: Option<String>, format: OutputFormat) -> Result<()> {
    let mut html = String::new();
    io::stdin().read_to_string(&mut html)?;

    let fetcher = Fetcher::with_config(config.fetch_config())?;
    let page = fetcher.render_html(&html, base_url.as_deref())?;
    print_page(&page, format)
}

fn print_page(page: &PageRecord, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Markdown => {
            println!("{}", page.to_markdown());
        }
        OutputFormat::Plain => {
            println!("{}", page.to_plain_text());
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(page)?);
        }
    }
    Ok(())
}

fn new_session(config: &Config) -> Result<Session> {
    let fetcher = Fetcher::with_config(config.fetch_config())?;
    let assistant = Assistant::groq(&config.llm_config())?;
    if !assistant.is_configured() {
        warn!("No GROQ_API_KEY found in environment variables. LLM features will not work.");
        eprintln!("warning: No GROQ_API_KEY found in environment variables. LLM features will not work.");
    }
    Ok(Session::new(fetcher, assistant))
}

async fn run_summarize(config: &Config, url: &str) -> Result<()> {
    let mut session = new_session(config)?;
    if let Scrape::Failed(error) = session.scrape(url).await {
        anyhow::bail!("Error: {}", error);
    }

    if let Some(page) = session.page() {
        println!("# {}\n", page.title);
    }
    if let Some(summary) = session.summary() {
        println!("{}", wrap(summary));
    }
    Ok(())
}

async fn run_chat(config: &Config, url: &str) -> Result<()> {
    let mut session = new_session(config)?;
    if let Scrape::Failed(error) = session.scrape(url).await {
        anyhow::bail!("Error: {}", error);
    }

    if let Some(page) = session.page() {
        println!("Chat about: {}", page.title);
    }
    println!("Ask a question about this content (:history to review, :model <name> to switch, :q to quit).\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("You: ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();
        match question {
            "" => continue,
            ":q" | ":quit" | "quit" | "exit" => break,
            ":history" => {
                println!("{}\n", session.history().transcript());
                continue;
            }
            ":summary" => {
                println!("{}\n", wrap(session.summary().unwrap_or_default()));
                continue;
            }
            ":model" => {
                println!("Model: {}\n", session.assistant().model());
                continue;
            }
            _ => {}
        }

        if let Some(name) = question.strip_prefix(":model ") {
            match name.trim().parse::<Model>() {
                Ok(model) => {
                    session.assistant_mut().set_model(model);
                    println!("Model: {}\n", session.assistant().model());
                }
                Err(e) => println!("{}\n", e),
            }
            continue;
        }

        let answer = session.ask(question).await;
        println!("\nAssistant: {}\n", wrap(&answer));
    }

    Ok(())
}

fn run_config(mut config: Config, key: Option<String>, value: Option<String>) -> Result<()> {
    match (key, value) {
        (Some(key), Some(value)) => {
            config.set(&key, &value)?;
            config.save()?;
            println!("{} = {}", key, value);
        }
        (Some(key), None) => anyhow::bail!("Missing value for {}", key),
        _ => println!("{}", config.describe()),
    }
    Ok(())
}

fn wrap(text: &str) -> String {
    text.lines()
        .map(|line| textwrap::fill(line, WRAP_WIDTH))
        .collect::<Vec<_>>()
        .join("\n")
}
