use stashbook_client::commands;
use stashbook_client::commands::import::{ImportListOptions, ImportRunOptions};
use stashbook_client::commands::insights::InsightsRunOptions;
use stashbook_client::{ClientResult, SuccessEnvelope};

use crate::cli::{Cli, Commands, ImportCommand};

pub fn dispatch(cli: &Cli) -> ClientResult<SuccessEnvelope> {
    let home_override = cli.home.as_deref();

    match &cli.command {
        Commands::Banks { .. } => commands::banks::run(),
        Commands::Import { command } => match command {
            ImportCommand::Create {
                path,
                bank,
                dry_run,
                json: _,
            } => commands::import::run_with_options(ImportRunOptions {
                path: path.clone(),
                bank: bank.clone(),
                dry_run: *dry_run,
                home_override,
            }),
            ImportCommand::List { .. } => {
                commands::import::list_with_options(ImportListOptions { home_override })
            }
        },
        Commands::Insights { bank, from, to, .. } => {
            commands::insights::run_with_options(InsightsRunOptions {
                bank: bank.clone(),
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
                home_override,
            })
        }
    }
}
