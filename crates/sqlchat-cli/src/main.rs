use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use sqlchat_agent::{AgentConfig, RetryAgent};
use sqlchat_core::sql::{classify, SqlClassification};
use sqlchat_core::{AgentEvent, Session};
use sqlchat_db::{format_table, QueryExecutor, SchemaProvider, SqliteDatabase};
use sqlchat_llm::{ModelClient, OllamaClient, OpenAiClient};

#[derive(Parser)]
#[command(name = "sqlchat")]
#[command(about = "Ask questions about a SQLite database in plain language")]
#[command(version)]
struct Cli {
    /// Path to the SQLite database file
    #[arg(long, global = true, default_value = "data.db")]
    db: PathBuf,

    /// Model to use; names starting with "gpt" go to OpenAI, everything
    /// else to a local Ollama server
    #[arg(long, global = true, default_value = "gpt-4o-mini")]
    model: String,

    /// Override the API base URL of the selected backend
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// OpenAI API key, required for gpt models
    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Stream answer tokens as they arrive
    #[arg(long, global = true)]
    stream: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive question/answer session
    Chat,
    /// Ask a single question and exit
    Ask {
        /// Question in plain language
        question: String,
    },
    /// Run a SQL statement directly, with confirmation for mutating ones
    Exec {
        /// SQL statement
        sql: String,
    },
    /// Print the schema as CREATE TABLE statements
    Schema,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let db = Arc::new(SqliteDatabase::open(&cli.db)?);

    match cli.command {
        Commands::Chat => run_chat(&cli, db).await,
        Commands::Ask { ref question } => run_ask(&cli, db, question).await,
        Commands::Exec { ref sql } => run_exec(db, sql),
        Commands::Schema => {
            println!("{}", db.schema_text()?);
            Ok(())
        }
    }
}

fn build_client(cli: &Cli) -> anyhow::Result<Arc<dyn ModelClient>> {
    if cli.model.starts_with("gpt") {
        let api_key = cli.api_key.clone().ok_or_else(|| {
            anyhow::anyhow!("model {} needs an OpenAI API key (--api-key or OPENAI_API_KEY)", cli.model)
        })?;
        let mut client = OpenAiClient::new(api_key).with_model(&cli.model);
        if let Some(ref url) = cli.base_url {
            client = client.with_base_url(url);
        }
        Ok(Arc::new(client))
    } else {
        let mut client = OllamaClient::new(&cli.model);
        if let Some(ref url) = cli.base_url {
            client = client.with_base_url(url);
        }
        Ok(Arc::new(client))
    }
}

fn build_agent(cli: &Cli, db: Arc<SqliteDatabase>) -> anyhow::Result<RetryAgent> {
    let client = build_client(cli)?;
    let mut config = AgentConfig::for_model(&cli.model);
    config.stream_answer = cli.stream;
    Ok(RetryAgent::new(client, db, config))
}

/// Forward agent events to the terminal. Runs as its own task so output
/// keeps up with streamed tokens.
fn spawn_event_printer(mut event_rx: mpsc::Receiver<AgentEvent>, stream: bool) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                AgentEvent::Token { content } => {
                    if stream {
                        print!("{}", content.green());
                        let _ = io::stdout().flush();
                    }
                }
                AgentEvent::SqlExtracted { sql } => {
                    println!("{}", "SQL:".yellow().bold());
                    println!("{}", sql.yellow());
                }
                AgentEvent::QueryExecuted { row_count } => {
                    println!("{}", format!("({row_count} rows)").dimmed());
                }
                AgentEvent::Retrying { attempt, feedback } => {
                    println!("{}", format!("Retrying (attempt {attempt}): {feedback}").red());
                }
                AgentEvent::ContextSummarized { turns_summarized } => {
                    println!(
                        "{}",
                        format!("(summarized {turns_summarized} earlier turns to stay in budget)").dimmed()
                    );
                }
                AgentEvent::Complete { .. } => {
                    if stream {
                        println!();
                    }
                }
                AgentEvent::Error { message } => {
                    eprintln!("{}", format!("Error: {message}").red());
                }
            }
        }
    })
}

/// Cancellation token that trips on Ctrl-C.
fn interrupt_token() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trip = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trip.cancel();
        }
    });
    cancel
}

async fn run_ask(cli: &Cli, db: Arc<SqliteDatabase>, question: &str) -> anyhow::Result<()> {
    let schema = db.schema_text()?;
    let agent = build_agent(cli, db)?;
    let mut session = Session::new(schema);

    let (event_tx, event_rx) = mpsc::channel(64);
    let printer = spawn_event_printer(event_rx, cli.stream);

    let outcome = agent
        .ask(&mut session, question, event_tx, interrupt_token())
        .await?;
    printer.await?;

    if !cli.stream {
        println!("{}", outcome.answer);
    }
    Ok(())
}

async fn run_chat(cli: &Cli, db: Arc<SqliteDatabase>) -> anyhow::Result<()> {
    let schema = db.schema_text()?;
    let agent = build_agent(cli, db)?;
    let mut session = Session::new(schema);

    println!("{}", "sqlchat interactive session".cyan().bold());
    println!("{}", format!("database: {}", cli.db.display()).dimmed());
    println!("{}", format!("model: {}", cli.model).dimmed());
    println!("{}", "Type 'exit' or 'quit' to leave".dimmed());
    println!();

    loop {
        print!("{} ", "You:".cyan().bold());
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            break;
        }
        if input.is_empty() {
            continue;
        }

        println!("{}", "Assistant:".green().bold());

        let (event_tx, event_rx) = mpsc::channel(64);
        let printer = spawn_event_printer(event_rx, cli.stream);

        match agent.ask(&mut session, input, event_tx, interrupt_token()).await {
            Ok(outcome) => {
                printer.await?;
                if !cli.stream {
                    println!("{}", outcome.answer);
                }
            }
            Err(error) => {
                printer.await?;
                println!("{}", format!("Error: {error}").red());
            }
        }
        println!();
    }

    Ok(())
}

fn run_exec(db: Arc<SqliteDatabase>, sql: &str) -> anyhow::Result<()> {
    if let SqlClassification::Mutating(keyword) = classify(sql) {
        print!(
            "{} ",
            format!("This statement contains `{keyword}` and will modify the database. Proceed? [y/N]")
                .yellow()
        );
        io::stdout().flush()?;

        let mut answer = String::new();
        io::stdin().read_line(&mut answer)?;
        if !answer.trim().eq_ignore_ascii_case("y") {
            println!("{}", "Aborted.".dimmed());
            return Ok(());
        }
    }

    let result = db.execute(sql)?;
    println!("{}", format_table(&result));
    println!("{}", format!("({} rows)", result.rows.len()).dimmed());
    Ok(())
}
