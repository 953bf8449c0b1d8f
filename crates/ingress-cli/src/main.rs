mod alert;
mod cli;
mod config;
mod health;
mod progress;
mod prompt;

use clap::Parser;
use eyre::Result;

use crate::cli::{Cli, Commands};
use crate::config::{health_runtime, load_test_runtime, read_config, PASSWORD_ENV};
use crate::prompt::{NoPrompt, Prompter, StdinPrompter};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let raw = read_config(cli.config.as_deref())?;
    let env_password = std::env::var(PASSWORD_ENV).ok().filter(|p| !p.is_empty());
    let mut prompter: Box<dyn Prompter> = if cli.no_input {
        Box::new(NoPrompt)
    } else {
        Box::new(StdinPrompter)
    };

    match &cli.command {
        Commands::LoadTest(args) => {
            let runtime = load_test_runtime(args, &raw, env_password, prompter.as_mut())?;
            load_test::run_load_test(args, runtime).await?;
        }
        Commands::Health(args) => {
            let runtime = health_runtime(args, &raw, env_password, prompter.as_mut())?;
            health::run_health(runtime).await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp_secs()
        .try_init();
}
