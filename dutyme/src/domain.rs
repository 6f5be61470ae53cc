use std::fmt;

use serde::{Deserialize, Serialize};
use time::{format_description::well_known::Rfc3339, Duration, OffsetDateTime};

use crate::DutymeError;

/// A PagerDuty user resolved from an email address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub summary: String,
}

impl Identity {
    pub fn is_resolved(&self) -> bool {
        !self.id.is_empty()
    }
}

impl From<pagerduty::User> for Identity {
    fn from(user: pagerduty::User) -> Self {
        let summary = if user.object.summary.is_empty() {
            user.name
        } else {
            user.object.summary
        };

        Self {
            email: user.email,
            id: user.object.id,
            summary,
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.summary.is_empty(), self.email.is_empty()) {
            (false, false) => write!(f, "{} <{}>", self.summary, self.email),
            (false, true) => write!(f, "{}", self.summary),
            (true, false) => write!(f, "{}", self.email),
            (true, true) => write!(f, "{}", self.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRef {
    pub name: String,
    pub id: String,
}

impl From<pagerduty::Schedule> for ScheduleRef {
    fn from(schedule: pagerduty::Schedule) -> Self {
        Self {
            name: schedule.name,
            id: schedule.object.id,
        }
    }
}

/// Half-open interval `[start, end)` with `end` strictly after `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverrideWindow {
    start: OffsetDateTime,
    end: OffsetDateTime,
}

impl OverrideWindow {
    pub fn starting_at(start: OffsetDateTime, working: Duration) -> Result<Self, DutymeError> {
        if !working.is_positive() {
            return Err(DutymeError::validation(format!(
                "working duration must be positive, got {}",
                working
            )));
        }

        Ok(Self {
            start,
            end: start + working,
        })
    }

    pub fn starting_now(working: Duration) -> Result<Self, DutymeError> {
        Self::starting_at(OffsetDateTime::now_utc(), working)
    }

    pub fn start(&self) -> OffsetDateTime {
        self.start
    }

    pub fn end(&self) -> OffsetDateTime {
        self.end
    }

    pub fn contains(&self, at: OffsetDateTime) -> bool {
        at >= self.start && at < self.end
    }
}

impl fmt::Display for OverrideWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", format_instant(self.start), format_instant(self.end))
    }
}

/// An override the remote side holds for one schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideRecord {
    pub id: String,
    pub schedule_id: String,
    pub user_id: String,
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

impl OverrideRecord {
    pub fn from_remote(schedule_id: &str, remote: pagerduty::Override) -> Self {
        Self {
            id: remote.id,
            schedule_id: schedule_id.to_string(),
            user_id: remote.user.id,
            start: remote.start,
            end: remote.end,
        }
    }
}

impl fmt::Display for OverrideRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} - {}",
            self.id,
            format_instant(self.start),
            format_instant(self.end)
        )
    }
}

/// RFC 3339 in the local offset when it can be determined.
pub fn format_instant(at: OffsetDateTime) -> String {
    let at = match time::UtcOffset::current_local_offset() {
        Ok(offset) => at.to_offset(offset),
        Err(_) => at,
    };
    at.format(&Rfc3339).unwrap_or_else(|_| at.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn window_is_half_open() {
        let window =
            OverrideWindow::starting_at(datetime!(2024-03-01 09:00 UTC), Duration::hours(1))
                .unwrap();

        assert!(window.contains(datetime!(2024-03-01 09:00 UTC)));
        assert!(window.contains(datetime!(2024-03-01 09:59 UTC)));
        assert!(!window.contains(datetime!(2024-03-01 10:00 UTC)));
        assert_eq!(window.end(), datetime!(2024-03-01 10:00 UTC));
    }

    #[test]
    fn window_rejects_non_positive_durations() {
        let start = datetime!(2024-03-01 09:00 UTC);
        assert!(OverrideWindow::starting_at(start, Duration::ZERO).is_err());
        assert!(OverrideWindow::starting_at(start, Duration::minutes(-5)).is_err());
    }

    #[test]
    fn formatted_instant_keeps_the_same_moment() {
        let at = datetime!(2024-03-01 09:00 UTC);
        let formatted = format_instant(at);
        assert_eq!(OffsetDateTime::parse(&formatted, &Rfc3339).unwrap(), at);
    }

    #[test]
    fn identity_prefers_summary_then_name() {
        let user = pagerduty::User {
            object: pagerduty::ApiObject {
                id: "PXPGF42".to_string(),
                ..Default::default()
            },
            name: "Taichi Nakashima".to_string(),
            email: "taichi@dutyme.com".to_string(),
        };
        let identity = Identity::from(user);

        assert_eq!(identity.summary, "Taichi Nakashima");
        assert_eq!(identity.to_string(), "Taichi Nakashima <taichi@dutyme.com>");
    }
}
