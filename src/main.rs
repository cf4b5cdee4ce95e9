use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use dotenv::dotenv;
use log::info;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;

use gasgridbot::commands::{BotMode, CommandHandler};
use gasgridbot::config::AppConfig;
use gasgridbot::database::search_index::SearchIndexClient;
use gasgridbot::llm::orchestrator::{RagOrchestrator, DEFAULT_TOP_K};
use gasgridbot::providers::azure::AzureOpenAiProvider;

#[derive(Parser, Debug)]
#[command(author, version, about = "GasGridBot: RAG assistant for gas pipeline hydrotest/compliance reports", long_about = None)]
struct Args {
    /// How many passages to retrieve per question
    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    top_k: usize,

    /// Start in open-domain chat mode instead of grounded RAG mode
    #[arg(long)]
    general: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    colored::control::set_override(true);

    // Load environment variables
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", format!("❌ {err}").red());
            eprintln!("Set the keys above in the environment or a .env file.");
            std::process::exit(1);
        }
    };

    let provider = Arc::new(AzureOpenAiProvider::new(&config));
    let search_client = SearchIndexClient::new(&config)?;

    let orchestrator = RagOrchestrator::new(
        provider.clone(),
        Arc::new(search_client.clone()),
        provider.clone(),
    );

    let mode = if args.general {
        BotMode::General
    } else {
        BotMode::Rag
    };

    info!("starting session in {mode} mode, top_k {}", args.top_k);

    let mut handler = CommandHandler::new(orchestrator, provider, search_client, mode, args.top_k);

    println!("{}", "💡 GasGridBot".bold());
    println!("AI assistant for midstream natural gas utilities (RAG POC)");
    println!("Type {} for commands and sample questions.", "help".bold());

    let mut rl = Editor::<(), DefaultHistory>::new()?;

    loop {
        match rl.readline("👤 ") {
            Ok(line) => {
                let input = line.trim();
                let _ = rl.add_history_entry(input);

                if !handler.handle_command(input).await {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                println!("Error: {err:?}");
                break;
            }
        }
    }

    Ok(())
}
