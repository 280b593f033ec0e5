use clap::{CommandFactory, Parser};

use notifex::cli::{self, Cli, Command, ConfigCommand};
use notifex::logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let explicit_config = cli.config.as_deref();

    match cli.command {
        None => {
            Cli::command().print_help()?;
            println!();
        }
        Some(Command::Enrich(args)) => {
            let mut config = cli::resolve_config(explicit_config)?;
            args.apply(&mut config);
            logging::init_logging(&config.logging)?;
            cli::handle_enrich(&config, args.payload.as_deref()).await?;
        }
        Some(Command::Config(ConfigCommand::Show)) => {
            let config = cli::resolve_config(explicit_config)?;
            cli::handle_config_show(&config)?;
        }
        Some(Command::Config(ConfigCommand::Path)) => cli::handle_config_path(explicit_config),
        Some(Command::Config(ConfigCommand::Schema)) => cli::handle_config_schema()?,
        Some(Command::Version) => cli::handle_version(),
    }
    Ok(())
}
