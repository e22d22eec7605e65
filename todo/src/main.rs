//! Terminal todo list.
//!
//! Reads commands from stdin, one per line, and prints the list after every
//! change. Type `help` for the command list.

use pocket_todo::cli::{self, Command, Outcome};
use pocket_todo::{Config, bootstrap, logging};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file (if present)
    let _ = dotenvy::dotenv();

    let config = Config::from_env();
    logging::init(&config.log_level)?;
    tracing::debug!(?config, "Loaded configuration");

    let env = bootstrap::environment(&config)?;
    let (store, _seeding) = bootstrap::start(env, config.seed.on_start).await?;

    // Seed results arrive asynchronously; report them as they land
    let mut feedback = store.subscribe_actions();
    let observer = store.clone();
    let notifier = tokio::spawn(async move {
        while let Ok(action) = feedback.recv().await {
            if let Some(report) = observer.state(|s| cli::seed_report(&action, s)).await {
                println!("{report}");
            }
        }
    });

    println!("{}", store.state(cli::render).await);
    println!("Type 'help' for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(cli::CommandError::Empty) => continue,
            Err(error) => {
                println!("{error}");
                continue;
            },
        };

        match cli::dispatch(&store, command).await? {
            Outcome::Quit => break,
            Outcome::Help => println!("{}", cli::HELP),
            Outcome::List | Outcome::Sent(_) => println!("{}", store.state(cli::render).await),
        }
    }

    notifier.abort();
    store.shutdown(config.shutdown_timeout()).await?;
    Ok(())
}
