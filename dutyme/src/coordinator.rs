//! The override lifecycle: what to ask, what to reuse, what to call remotely
//! and what to write back, for `start`, `end` and `status`.

use std::{fmt, path::PathBuf};

use time::{Duration, OffsetDateTime};

use crate::{
    config::PersistedConfig,
    directory::{Connector, RemoteDirectory},
    domain::{Identity, OverrideRecord, OverrideWindow, ScheduleRef},
    git,
    prompt::{AskOptions, Prompter},
    DutymeError, ErrorKind,
};

/// How far ahead `end --lookup` and `status --remote` search for overrides.
pub const LOOKUP_WINDOW: Duration = Duration::hours(24);

#[derive(Debug, Clone)]
pub struct StartOptions {
    /// Token from the environment; wins over the stored one.
    pub token: Option<String>,
    /// Skip the confirmation question.
    pub force: bool,
    /// Ask for identity and schedule again even if they are stored.
    pub update: bool,
    pub working: Duration,
}

impl Default for StartOptions {
    fn default() -> Self {
        Self {
            token: None,
            force: false,
            update: false,
            working: Duration::hours(1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StartOutcome {
    pub identity: Identity,
    pub schedule: ScheduleRef,
    pub record: OverrideRecord,
    /// Whether the override was written to the config file.
    pub saved: bool,
}

#[derive(Debug, Clone, Default)]
pub struct EndOptions {
    pub token: Option<String>,
    /// Search the stored schedule when no override is tracked locally.
    pub lookup: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndOutcome {
    pub schedule_id: String,
    pub override_id: String,
}

#[derive(Debug, Clone)]
pub struct StatusReport {
    pub config_path: PathBuf,
    pub config: Option<PersistedConfig>,
    /// The user's overrides in the lookup window, when asked for.
    pub live: Option<Vec<OverrideRecord>>,
}

pub struct OverrideCoordinator<P> {
    config_path: PathBuf,
    pretty: bool,
    prompter: P,
    connect: Connector,
    email_hint: fn() -> Option<String>,
}

impl<P: Prompter> OverrideCoordinator<P> {
    pub fn new(config_path: impl Into<PathBuf>, prompter: P, connect: Connector) -> Self {
        Self {
            config_path: config_path.into(),
            pretty: true,
            prompter,
            connect,
            email_hint: git::default_email,
        }
    }

    /// Write the config file indented (the default) or compact.
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Where the default answer for the email question comes from.
    pub fn with_email_hint(mut self, email_hint: fn() -> Option<String>) -> Self {
        self.email_hint = email_hint;
        self
    }

    pub fn into_prompter(self) -> P {
        self.prompter
    }

    pub async fn start(&mut self, options: StartOptions) -> Result<StartOutcome, DutymeError> {
        if !options.working.is_positive() {
            return Err(DutymeError::validation(format!(
                "working duration must be positive, got {}",
                options.working
            )));
        }

        let (mut config, existed) = PersistedConfig::load_or_default(&self.config_path)?;
        if config.has_active_override() {
            return Err(DutymeError::OverrideAlreadyExists {
                schedule_id: config.override_schedule_id.clone(),
            });
        }
        warn_partial_override(&config);

        let token = self.resolve_token(options.token.as_deref(), &config)?;
        let directory = (self.connect)(&token)?;

        let identity = match (&config.user, options.update) {
            (Some(user), false) => user.clone(),
            (previous, _) => {
                self.resolve_identity(directory.as_ref(), previous.as_ref())
                    .await?
            }
        };
        let schedule = match (config.schedule(), options.update) {
            (Some(schedule), false) => schedule,
            (previous, _) => {
                self.resolve_schedule(directory.as_ref(), previous.as_ref())
                    .await?
            }
        };

        let window = OverrideWindow::starting_now(options.working)?;
        tracing::info!(
            "override {} on schedule {} ({}) from {}",
            identity,
            schedule.name,
            schedule.id,
            window
        );

        if !options.force {
            let query = format!(
                "Override {} on schedule {:?} from {}. OK to override?",
                identity, schedule.name, window
            );
            if !self.prompter.confirm(&query, true)? {
                return Err(DutymeError::Cancelled);
            }
        }

        let record = directory
            .create_override(&schedule.id, &identity, &window)
            .await?;
        tracing::info!("created override {} on {}", record.id, record.schedule_id);

        config.user = Some(identity.clone());
        config.set_schedule(&schedule);
        config.track_override(&record);

        // A reused config is written back without asking; its stored token stays.
        let saved = if existed && !options.update {
            true
        } else if self.prompter.confirm(
            "Want to save configuration? (you can skip input from next time)",
            true,
        )? {
            config.token = token;
            true
        } else {
            false
        };

        if saved {
            if let Err(e) = config.save(&self.config_path, self.pretty) {
                tracing::error!(
                    "override {} on schedule {} is active but could not be saved; remove it manually",
                    record.id,
                    record.schedule_id
                );
                return Err(e);
            }
        }

        Ok(StartOutcome {
            identity,
            schedule,
            record,
            saved,
        })
    }

    pub async fn end(&mut self, options: EndOptions) -> Result<EndOutcome, DutymeError> {
        if !self.config_path.exists() {
            return Err(DutymeError::not_found(format!(
                "config file {} does not exist. Nothing to end",
                self.config_path.display()
            )));
        }

        let mut config = PersistedConfig::load(&self.config_path)?;
        warn_partial_override(&config);
        if !config.has_active_override() && !options.lookup {
            return Err(DutymeError::NoActiveOverride);
        }

        let token = self.resolve_token(options.token.as_deref(), &config)?;
        let directory = (self.connect)(&token)?;

        let (schedule_id, override_id) = if config.has_active_override() {
            (
                config.override_schedule_id.clone(),
                config.override_id.clone(),
            )
        } else {
            let (Some(identity), Some(schedule)) = (config.user.clone(), config.schedule()) else {
                return Err(DutymeError::validation(
                    "identity and schedule must be stored to look up overrides. Run 'dutyme start' first",
                ));
            };
            let since = OffsetDateTime::now_utc();
            let record = self
                .select_override(
                    directory.as_ref(),
                    &schedule.id,
                    &identity,
                    since,
                    since + LOOKUP_WINDOW,
                )
                .await?;
            (record.schedule_id, record.id)
        };

        directory
            .delete_override(&schedule_id, &override_id)
            .await?;
        tracing::info!("deleted override {} on {}", override_id, schedule_id);

        config.clear_override();
        config.save(&self.config_path, self.pretty)?;

        Ok(EndOutcome {
            schedule_id,
            override_id,
        })
    }

    pub async fn status(
        &mut self,
        remote: bool,
        token: Option<String>,
    ) -> Result<StatusReport, DutymeError> {
        let config = if self.config_path.exists() {
            Some(PersistedConfig::load(&self.config_path)?)
        } else {
            None
        };

        let mut live = None;
        if remote {
            let Some((identity, schedule)) = config
                .as_ref()
                .and_then(|c| Some((c.user.clone()?, c.schedule()?)))
            else {
                return Err(DutymeError::validation(
                    "identity and schedule must be stored to query overrides. Run 'dutyme start' first",
                ));
            };

            let stored = config.clone().unwrap_or_default();
            let token = self.resolve_token(token.as_deref(), &stored)?;
            let directory = (self.connect)(&token)?;

            let since = OffsetDateTime::now_utc();
            let records = match directory
                .list_overrides(&schedule.id, since, since + LOOKUP_WINDOW)
                .await
            {
                Ok(records) => records,
                Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
                Err(e) => return Err(e),
            };
            live = Some(
                records
                    .into_iter()
                    .filter(|r| r.user_id == identity.id)
                    .collect(),
            );
        }

        Ok(StatusReport {
            config_path: self.config_path.clone(),
            config,
            live,
        })
    }

    fn resolve_token(
        &mut self,
        env_token: Option<&str>,
        config: &PersistedConfig,
    ) -> Result<String, DutymeError> {
        if let Some(token) = env_token.map(str::trim).filter(|t| !t.is_empty()) {
            tracing::debug!("using API token from environment");
            return Ok(token.to_string());
        }
        if !config.token.is_empty() {
            return Ok(config.token.clone());
        }

        self.prompter
            .ask("Input PagerDuty API token", &AskOptions::required().masked())
    }

    async fn resolve_identity(
        &mut self,
        directory: &dyn RemoteDirectory,
        previous: Option<&Identity>,
    ) -> Result<Identity, DutymeError> {
        // The PagerDuty address is often the same one git knows about.
        let default = (self.email_hint)().or_else(|| {
            previous
                .map(|p| p.email.clone())
                .filter(|email| !email.is_empty())
        });

        let email = self.prompter.ask(
            "Input PagerDuty account email address",
            &AskOptions::required().with_default(default),
        )?;

        directory.find_user(&email).await
    }

    async fn resolve_schedule(
        &mut self,
        directory: &dyn RemoteDirectory,
        previous: Option<&ScheduleRef>,
    ) -> Result<ScheduleRef, DutymeError> {
        let query = self.prompter.ask(
            "Input PagerDuty schedule name which you want to override",
            &AskOptions::required().with_default(previous.map(|s| s.name.clone())),
        )?;

        let schedules = directory.find_schedules(&query).await?;
        if schedules.len() > 1 {
            // Names are not unique; the id tells the user which is which.
            let labels: Vec<String> = schedules
                .iter()
                .map(|s| format!("{} ({})", s.name, s.id))
                .collect();
            let index = self
                .prompter
                .select("Found multiple schedules. Select one.", &labels, 0)?;
            return schedules
                .into_iter()
                .nth(index)
                .ok_or_else(|| DutymeError::validation("selection out of range"));
        }

        schedules
            .into_iter()
            .next()
            .ok_or_else(|| DutymeError::not_found(format!("no such schedule: {}", query)))
    }

    /// The user's override on `schedule_id` overlapping `[since, until)`,
    /// asking which one when there are several.
    async fn select_override(
        &mut self,
        directory: &dyn RemoteDirectory,
        schedule_id: &str,
        identity: &Identity,
        since: OffsetDateTime,
        until: OffsetDateTime,
    ) -> Result<OverrideRecord, DutymeError> {
        let mut mine: Vec<OverrideRecord> = directory
            .list_overrides(schedule_id, since, until)
            .await?
            .into_iter()
            .filter(|o| o.user_id == identity.id)
            .collect();

        if mine.len() > 1 {
            let labels: Vec<String> = mine.iter().map(|o| o.to_string()).collect();
            let index = self
                .prompter
                .select("Found multiple overrides. Select one.", &labels, 0)?;
            return mine
                .into_iter()
                .nth(index)
                .ok_or_else(|| DutymeError::validation("selection out of range"));
        }

        mine.pop().ok_or_else(|| {
            DutymeError::not_found(format!(
                "no override for {} on schedule {}",
                identity, schedule_id
            ))
        })
    }
}

fn warn_partial_override(config: &PersistedConfig) {
    if config.has_partial_override() {
        tracing::warn!(
            override_id = %config.override_id,
            override_schedule_id = %config.override_schedule_id,
            "config file has an incomplete override reference; treating it as no override"
        );
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Config file: {}", self.config_path.display())?;

        let Some(config) = &self.config else {
            return writeln!(f, "Nothing stored yet. Run 'dutyme start'.");
        };

        let token = if config.token.is_empty() {
            "not stored"
        } else {
            "stored"
        };
        writeln!(f, "API token:   {}", token)?;
        match &config.user {
            Some(user) => writeln!(f, "User:        {}", user)?,
            None => writeln!(f, "User:        -")?,
        }
        match config.schedule() {
            Some(schedule) => writeln!(f, "Schedule:    {} ({})", schedule.name, schedule.id)?,
            None => writeln!(f, "Schedule:    -")?,
        }
        if config.has_active_override() {
            writeln!(
                f,
                "Override:    {} on {}",
                config.override_id, config.override_schedule_id
            )?;
        } else {
            writeln!(f, "Override:    none")?;
        }

        if let Some(live) = &self.live {
            if live.is_empty() {
                writeln!(f, "No overrides in the next {} hours.", LOOKUP_WINDOW.whole_hours())?;
            } else {
                writeln!(f, "Overrides in the next {} hours:", LOOKUP_WINDOW.whole_hours())?;
                for record in live {
                    writeln!(f, "  {}", record)?;
                }
            }
        }

        Ok(())
    }
}
