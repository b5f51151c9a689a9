mod api;
mod backend;
mod cli;
mod commands;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, TokenCommand, UsersCommand};
use crate::output::OutputFormat;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // The server logs progress; one-shot commands keep stderr quiet unless asked
    let default_level = match cli.command {
        Commands::Serve(_) => "info",
        _ => "warn",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("userbase={default_level}").parse()?)
                .add_directive(format!("userbase_bin={default_level}").parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let format = OutputFormat::from_json_flag(cli.json);

    match &cli.command {
        Commands::Serve(args) => commands::serve::run(args).await,
        Commands::Health(args) => commands::health::run(args, format).await,
        Commands::Info(args) => commands::info::run(args, format).await,
        Commands::Users { command } => match command {
            UsersCommand::List(args) => commands::users::list(args, format).await,
            UsersCommand::Create(args) => commands::users::create(args, format).await,
        },
        Commands::Token { command } => match command {
            TokenCommand::Inspect(args) => commands::token::inspect(args, format),
        },
    }
}
