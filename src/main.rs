use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use stocksuggest::cli::allocate::AllocateArgs;
use stocksuggest::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for stocksuggest::AppCommand {
    fn from(cmd: Commands) -> stocksuggest::AppCommand {
        match cmd {
            Commands::Allocate {
                amount,
                strategy,
                history,
            } => stocksuggest::AppCommand::Allocate(AllocateArgs {
                amount,
                strategies: strategy,
                history,
            }),
            Commands::Strategies => stocksuggest::AppCommand::Strategies,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// List the available investment strategies
    Strategies,
    /// Split an investment evenly across the stocks of one or two strategies
    Allocate {
        /// Investment amount in USD
        #[arg(short, long)]
        amount: f64,

        /// Strategy to invest in, e.g. "Quality Investing" or "quality"; repeat for two
        #[arg(short, long)]
        strategy: Vec<String>,

        /// Also show the portfolio value over the last days
        #[arg(long)]
        history: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => stocksuggest::cli::setup::setup(),
        Some(cmd) => stocksuggest::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
