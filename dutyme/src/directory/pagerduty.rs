use async_trait::async_trait;
use pagerduty::{NewOverride, PagerDutyClient, PagerDutyError};
use time::OffsetDateTime;

use super::{require, RemoteDirectory};
use crate::{
    domain::{Identity, OverrideRecord, OverrideWindow, ScheduleRef},
    DutymeError,
};

/// Adapter that wraps the PagerDuty client to implement [`RemoteDirectory`].
pub struct PagerDutyDirectory {
    client: PagerDutyClient,
}

impl PagerDutyDirectory {
    pub fn new(token: &str, api_url: &str) -> Result<Self, DutymeError> {
        let client = PagerDutyClient::with_base_url(token, api_url).map_err(|e| match e {
            PagerDutyError::MissingToken => DutymeError::validation("missing PagerDuty API token"),
            e => DutymeError::remote("NewClient")(e),
        })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl RemoteDirectory for PagerDutyDirectory {
    async fn find_user(&self, email: &str) -> Result<Identity, DutymeError> {
        require(email, "PagerDuty account email")?;

        let mut users = self
            .client
            .list_users(email)
            .await
            .map_err(DutymeError::remote("ListUsers"))?;

        // One email is assumed to belong to exactly one user.
        if users.len() > 1 {
            return Err(DutymeError::Ambiguous {
                what: "user",
                candidates: users.into_iter().map(|u| u.name).collect(),
            });
        }
        let Some(user) = users.pop() else {
            return Err(DutymeError::not_found(format!(
                "no such user: {} (correct email?)",
                email
            )));
        };

        let mut identity = Identity::from(user);
        if identity.email.is_empty() {
            identity.email = email.to_string();
        }
        Ok(identity)
    }

    async fn find_schedules(&self, name_query: &str) -> Result<Vec<ScheduleRef>, DutymeError> {
        require(name_query, "schedule name")?;

        let schedules = self
            .client
            .list_schedules(name_query)
            .await
            .map_err(DutymeError::remote("ListSchedules"))?;

        if schedules.is_empty() {
            return Err(DutymeError::not_found(format!(
                "no such schedule: {}",
                name_query
            )));
        }

        Ok(schedules.into_iter().map(ScheduleRef::from).collect())
    }

    async fn create_override(
        &self,
        schedule_id: &str,
        identity: &Identity,
        window: &OverrideWindow,
    ) -> Result<OverrideRecord, DutymeError> {
        require(schedule_id, "schedule ID")?;
        require(&identity.id, "user ID")?;

        let created = self
            .client
            .create_override(
                schedule_id,
                &NewOverride::new(identity.id.clone(), window.start(), window.end()),
            )
            .await
            .map_err(DutymeError::remote("CreateOverride"))?;

        Ok(OverrideRecord::from_remote(schedule_id, created))
    }

    async fn list_overrides(
        &self,
        schedule_id: &str,
        since: OffsetDateTime,
        until: OffsetDateTime,
    ) -> Result<Vec<OverrideRecord>, DutymeError> {
        require(schedule_id, "schedule ID")?;

        let overrides = self
            .client
            .list_overrides(schedule_id, since, until)
            .await
            .map_err(DutymeError::remote("ListOverrides"))?;

        if overrides.is_empty() {
            return Err(DutymeError::not_found(format!(
                "no override found on schedule {}",
                schedule_id
            )));
        }

        Ok(overrides
            .into_iter()
            .map(|o| OverrideRecord::from_remote(schedule_id, o))
            .collect())
    }

    async fn delete_override(
        &self,
        schedule_id: &str,
        override_id: &str,
    ) -> Result<(), DutymeError> {
        require(schedule_id, "schedule ID")?;
        require(override_id, "override ID")?;

        self.client
            .delete_override(schedule_id, override_id)
            .await
            .map_err(DutymeError::remote("DeleteOverride"))
    }
}
