use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "studylog", version, about = "Study progress tracker for question banks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Question bank and hierarchy management
    Bank {
        #[command(subcommand)]
        action: commands::bank::BankAction,
    },
    /// Save a study session for a path
    Mark(commands::mark::MarkArgs),
    /// Cycle a saved question state or bookmark
    Toggle(commands::toggle::ToggleArgs),
    /// Query study history
    History(commands::history::HistoryArgs),
    /// Progress statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("STUDYLOG_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Bank { action } => commands::bank::run(action),
        Commands::Mark(args) => commands::mark::run(args),
        Commands::Toggle(args) => commands::toggle::run(args),
        Commands::History(args) => commands::history::run(args),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
