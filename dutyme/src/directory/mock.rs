//! In-memory directory for tests.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use time::OffsetDateTime;

use super::{require, Connector, RemoteDirectory};
use crate::{
    domain::{Identity, OverrideRecord, OverrideWindow, ScheduleRef},
    DutymeError,
};

/// Mock directory holding users, schedules and overrides in memory.
///
/// Clones share state, so a test can hand one clone to the coordinator and
/// inspect the other afterwards.
#[derive(Clone, Default)]
pub struct MockDirectory {
    state: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    users: Vec<Identity>,
    schedules: Vec<ScheduleRef>,
    overrides: Vec<OverrideRecord>,
    calls: Vec<String>,
    tokens: Vec<String>,
    next_id: usize,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, email: &str, id: &str, summary: &str) -> Self {
        self.lock().users.push(Identity {
            email: email.to_string(),
            id: id.to_string(),
            summary: summary.to_string(),
        });
        self
    }

    pub fn with_schedule(self, name: &str, id: &str) -> Self {
        self.lock().schedules.push(ScheduleRef {
            name: name.to_string(),
            id: id.to_string(),
        });
        self
    }

    pub fn with_override(self, record: OverrideRecord) -> Self {
        self.lock().overrides.push(record);
        self
    }

    /// Every call made so far, as `"<operation> <args>"`.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Tokens the connector was invoked with.
    pub fn tokens(&self) -> Vec<String> {
        self.lock().tokens.clone()
    }

    pub fn overrides(&self) -> Vec<OverrideRecord> {
        self.lock().overrides.clone()
    }

    /// A connector that hands out clones of this directory.
    pub fn connector(&self) -> Connector {
        let directory = self.clone();
        Box::new(move |token: &str| {
            directory.lock().tokens.push(token.to_string());
            Ok(Box::new(directory.clone()) as Box<dyn RemoteDirectory>)
        })
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, call: String) {
        self.lock().calls.push(call);
    }
}

#[async_trait]
impl RemoteDirectory for MockDirectory {
    async fn find_user(&self, email: &str) -> Result<Identity, DutymeError> {
        require(email, "PagerDuty account email")?;
        self.record(format!("find_user {}", email));

        let matches: Vec<Identity> = self
            .lock()
            .users
            .iter()
            .filter(|u| u.email.contains(email))
            .cloned()
            .collect();

        match matches.len() {
            0 => Err(DutymeError::not_found(format!("no such user: {}", email))),
            1 => Ok(matches[0].clone()),
            _ => Err(DutymeError::Ambiguous {
                what: "user",
                candidates: matches.into_iter().map(|u| u.summary).collect(),
            }),
        }
    }

    async fn find_schedules(&self, name_query: &str) -> Result<Vec<ScheduleRef>, DutymeError> {
        require(name_query, "schedule name")?;
        self.record(format!("find_schedules {}", name_query));

        let query = name_query.to_lowercase();
        let matches: Vec<ScheduleRef> = self
            .lock()
            .schedules
            .iter()
            .filter(|s| s.name.to_lowercase().contains(&query))
            .cloned()
            .collect();

        if matches.is_empty() {
            return Err(DutymeError::not_found(format!(
                "no such schedule: {}",
                name_query
            )));
        }
        Ok(matches)
    }

    async fn create_override(
        &self,
        schedule_id: &str,
        identity: &Identity,
        window: &OverrideWindow,
    ) -> Result<OverrideRecord, DutymeError> {
        require(schedule_id, "schedule ID")?;
        require(&identity.id, "user ID")?;
        self.record(format!("create_override {} {}", schedule_id, identity.id));

        let mut state = self.lock();
        state.next_id += 1;
        let record = OverrideRecord {
            id: format!("PO{}", state.next_id),
            schedule_id: schedule_id.to_string(),
            user_id: identity.id.clone(),
            start: window.start(),
            end: window.end(),
        };
        state.overrides.push(record.clone());

        Ok(record)
    }

    async fn list_overrides(
        &self,
        schedule_id: &str,
        since: OffsetDateTime,
        until: OffsetDateTime,
    ) -> Result<Vec<OverrideRecord>, DutymeError> {
        require(schedule_id, "schedule ID")?;
        self.record(format!("list_overrides {}", schedule_id));

        let found: Vec<OverrideRecord> = self
            .lock()
            .overrides
            .iter()
            .filter(|o| o.schedule_id == schedule_id && o.start < until && o.end > since)
            .cloned()
            .collect();

        if found.is_empty() {
            return Err(DutymeError::not_found(format!(
                "no override found on schedule {}",
                schedule_id
            )));
        }
        Ok(found)
    }

    async fn delete_override(
        &self,
        schedule_id: &str,
        override_id: &str,
    ) -> Result<(), DutymeError> {
        require(schedule_id, "schedule ID")?;
        require(override_id, "override ID")?;
        self.record(format!("delete_override {} {}", schedule_id, override_id));

        let mut state = self.lock();
        let before = state.overrides.len();
        state
            .overrides
            .retain(|o| !(o.schedule_id == schedule_id && o.id == override_id));

        if state.overrides.len() == before {
            return Err(DutymeError::remote("DeleteOverride")(
                pagerduty::PagerDutyError::Status {
                    status: 404,
                    body: "Not Found".to_string(),
                },
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use time::Duration;

    fn identity() -> Identity {
        Identity {
            email: "taichi@dutyme.com".to_string(),
            id: "PXPGF42".to_string(),
            summary: "Taichi Nakashima".to_string(),
        }
    }

    #[tokio::test]
    async fn created_override_is_listed_in_containing_window() {
        let directory = MockDirectory::new();
        let window = OverrideWindow::starting_now(Duration::hours(1)).unwrap();

        let created = directory
            .create_override("PS1", &identity(), &window)
            .await
            .unwrap();

        let listed = directory
            .list_overrides(
                "PS1",
                window.start() - Duration::minutes(5),
                window.end() + Duration::minutes(5),
            )
            .await
            .unwrap();
        assert!(listed.iter().any(|o| o.id == created.id));
    }

    #[tokio::test]
    async fn deleted_override_is_no_longer_listed() {
        let directory = MockDirectory::new();
        let window = OverrideWindow::starting_now(Duration::hours(1)).unwrap();
        let created = directory
            .create_override("PS1", &identity(), &window)
            .await
            .unwrap();

        directory.delete_override("PS1", &created.id).await.unwrap();

        let err = directory
            .list_overrides("PS1", window.start(), window.end())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn deleting_twice_surfaces_remote_error() {
        let directory = MockDirectory::new();
        let window = OverrideWindow::starting_now(Duration::hours(1)).unwrap();
        let created = directory
            .create_override("PS1", &identity(), &window)
            .await
            .unwrap();

        directory.delete_override("PS1", &created.id).await.unwrap();
        let err = directory
            .delete_override("PS1", &created.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Remote);
    }

    #[tokio::test]
    async fn connector_records_token_and_shares_state() {
        let directory = MockDirectory::new().with_schedule("Ops Primary", "PS1");
        let connect = directory.connector();

        let connected = connect("env-token").unwrap();
        connected.find_schedules("ops").await.unwrap();

        assert_eq!(directory.tokens(), vec!["env-token".to_string()]);
        assert_eq!(directory.calls(), vec!["find_schedules ops".to_string()]);
    }
}
