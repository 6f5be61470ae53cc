//! The seam between the override lifecycle and the on-call vendor.

#[cfg(test)]
mod mock;
mod pagerduty;

#[cfg(test)]
pub use self::mock::MockDirectory;
pub use self::pagerduty::PagerDutyDirectory;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    domain::{Identity, OverrideRecord, OverrideWindow, ScheduleRef},
    DutymeError,
};

/// Outbound port for the remote on-call directory.
///
/// Each method is one request to the vendor. Nothing is retried.
#[async_trait]
pub trait RemoteDirectory: Send + Sync {
    /// Exactly one user must match `email`.
    async fn find_user(&self, email: &str) -> Result<Identity, DutymeError>;

    /// All schedules matching `name_query`; never empty on success.
    async fn find_schedules(&self, name_query: &str) -> Result<Vec<ScheduleRef>, DutymeError>;

    /// Put `identity` on call for `schedule_id` during `window`.
    ///
    /// Existing overlapping overrides are not checked.
    async fn create_override(
        &self,
        schedule_id: &str,
        identity: &Identity,
        window: &OverrideWindow,
    ) -> Result<OverrideRecord, DutymeError>;

    /// Overrides overlapping `[since, until)`; `NotFound` when there are none.
    async fn list_overrides(
        &self,
        schedule_id: &str,
        since: OffsetDateTime,
        until: OffsetDateTime,
    ) -> Result<Vec<OverrideRecord>, DutymeError>;

    async fn delete_override(&self, schedule_id: &str, override_id: &str)
        -> Result<(), DutymeError>;
}

/// Builds a directory once the API token is known.
pub type Connector =
    Box<dyn Fn(&str) -> Result<Box<dyn RemoteDirectory>, DutymeError> + Send + Sync>;

fn require(value: &str, what: &str) -> Result<(), DutymeError> {
    if value.trim().is_empty() {
        return Err(DutymeError::validation(format!("missing {}", what)));
    }
    Ok(())
}
