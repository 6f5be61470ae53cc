use std::process::ExitCode;

use clap::Parser;
use dutyme::{
    cli::{Cli, Command},
    coordinator::{EndOptions, OverrideCoordinator, StartOptions},
    prompt::LinePrompter,
    settings::Settings,
    DutymeError,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::from_cli(&cli) {
        Ok(settings) => settings,
        Err(e) => return report(e),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(settings.log_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run(cli.command, &settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(e),
    }
}

async fn run(command: Command, settings: &Settings) -> Result<(), DutymeError> {
    let mut coordinator = OverrideCoordinator::new(
        settings.config_path.clone(),
        LinePrompter::stdio(),
        settings.connector(),
    )
    .pretty(settings.pretty);

    match command {
        Command::Start {
            working,
            update,
            force,
        } => {
            let outcome = coordinator
                .start(StartOptions {
                    token: settings.token.clone(),
                    force,
                    update,
                    working,
                })
                .await?;

            println!(
                "Override started: {} is on call for {} ({})",
                outcome.identity, outcome.schedule.name, outcome.record
            );
            if !outcome.saved {
                println!(
                    "Configuration was not saved. Remove override {} on schedule {} in PagerDuty when you are done.",
                    outcome.record.id, outcome.record.schedule_id
                );
            }
        }
        Command::End { lookup } => {
            let outcome = coordinator
                .end(EndOptions {
                    token: settings.token.clone(),
                    lookup,
                })
                .await?;

            println!(
                "Override {} on schedule {} ended",
                outcome.override_id, outcome.schedule_id
            );
        }
        Command::Status { remote } => {
            let report = coordinator.status(remote, settings.token.clone()).await?;
            print!("{}", report);
        }
    }

    Ok(())
}

fn report(e: DutymeError) -> ExitCode {
    if e.is_cancelled() {
        eprintln!("canceled");
    } else {
        eprintln!("error: {:#}", anyhow::Error::new(e));
    }
    ExitCode::FAILURE
}
