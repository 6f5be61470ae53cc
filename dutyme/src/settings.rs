use std::path::PathBuf;

use crate::{
    cli::Cli,
    config::PersistedConfig,
    directory::{Connector, PagerDutyDirectory, RemoteDirectory},
    DutymeError,
};

/// Resolved command-line and environment settings for one invocation.
#[derive(Clone)]
pub struct Settings {
    pub config_path: PathBuf,
    pub api_url: String,
    /// Token from the environment. Never logged.
    pub token: Option<String>,
    pub pretty: bool,
    pub log_level: tracing::Level,
}

impl Settings {
    pub fn from_cli(cli: &Cli) -> Result<Self, DutymeError> {
        let config_path = match &cli.config {
            Some(path) => path.clone(),
            None => PersistedConfig::default_path()?,
        };

        Ok(Self {
            config_path,
            api_url: cli.api_url.trim_end_matches('/').to_string(),
            token: cli.token.clone().filter(|t| !t.trim().is_empty()),
            pretty: !cli.compact,
            log_level: if cli.debug {
                tracing::Level::DEBUG
            } else {
                tracing::Level::WARN
            },
        })
    }

    /// Builds a PagerDuty-backed directory once the token is known.
    pub fn connector(&self) -> Connector {
        let api_url = self.api_url.clone();
        Box::new(move |token: &str| {
            let directory = PagerDutyDirectory::new(token, &api_url)?;
            Ok(Box::new(directory) as Box<dyn RemoteDirectory>)
        })
    }
}
