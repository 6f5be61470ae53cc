use std::path::PathBuf;

use clap::{Parser, Subcommand};
use time::Duration;

use crate::duration::parse_working_duration;

#[derive(Debug, Parser)]
#[command(
    name = "dutyme",
    about = "Assign yourself as the on-call person of a PagerDuty schedule for a while",
    version,
    propagate_version = true
)]
pub struct Cli {
    /// Config file (default: ~/.dutyme.json)
    #[arg(long, global = true, env = "DUTYME_CONFIG")]
    pub config: Option<PathBuf>,

    /// PagerDuty REST API base URL
    #[arg(
        long,
        global = true,
        env = "DUTYME_API_URL",
        default_value = pagerduty::DEFAULT_API_URL
    )]
    pub api_url: String,

    /// Log requests and lifecycle events to stderr
    #[arg(long, global = true, env = "DUTYME_DEBUG")]
    pub debug: bool,

    /// Write the config file without indentation
    #[arg(long, global = true)]
    pub compact: bool,

    /// PagerDuty API token
    #[arg(
        long = "service-key",
        env = "PD_SERVICE_KEY",
        hide = true,
        hide_env_values = true
    )]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start overriding a schedule with yourself
    Start {
        /// How long the override lasts, e.g. 30m, 2h, 1h30m
        #[arg(
            short,
            long,
            default_value = "1h",
            value_parser = parse_working_duration
        )]
        working: Duration,

        /// Ask for the account email and schedule again
        #[arg(long)]
        update: bool,

        /// Do not ask for confirmation
        #[arg(short, long)]
        force: bool,
    },

    /// End the override started by `start`
    End {
        /// Search the stored schedule when no override is tracked locally
        #[arg(long)]
        lookup: bool,
    },

    /// Show what is stored locally
    Status {
        /// Also list your overrides on the stored schedule for the next 24 hours
        #[arg(long)]
        remote: bool,
    },
}
