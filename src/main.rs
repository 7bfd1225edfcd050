use clap::Parser;
use log::error;

use mathtutor_web::cli::{self, Cli, Commands};
use mathtutor_web::config::Config;
use mathtutor_web::error::AppResult;
use mathtutor_web::server;

fn main() {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::new();

    let result: AppResult<()> = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => actix_web::rt::System::new()
            .block_on(server::run(config))
            .map_err(Into::into),
        Commands::Normalize { text } => {
            cli::handle_normalize(&text);
            Ok(())
        }
        Commands::Parse { file, problem } => cli::handle_parse(&file, &problem),
        Commands::Analyze { problem } => {
            actix_web::rt::System::new().block_on(cli::handle_analyze(&config, &problem))
        }
        Commands::Hints { problem, max } => {
            actix_web::rt::System::new().block_on(cli::handle_hints(&config, &problem, max))
        }
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}
