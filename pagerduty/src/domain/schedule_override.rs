use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::ApiObject;

/// An override as PagerDuty reports it back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Override {
    pub id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end: OffsetDateTime,
    #[serde(default)]
    pub user: ApiObject,
}

/// Request body for a new override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOverride {
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end: OffsetDateTime,
    pub user: ApiObject,
}

impl NewOverride {
    pub fn new(user_id: impl Into<String>, start: OffsetDateTime, end: OffsetDateTime) -> Self {
        Self {
            start,
            end,
            user: ApiObject::user_reference(user_id),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct OverrideEnvelope<'a> {
    #[serde(rename = "override")]
    pub schedule_override: &'a NewOverride,
}

#[derive(Debug, Deserialize)]
pub struct OverrideResponse {
    #[serde(rename = "override")]
    pub schedule_override: Override,
}

#[derive(Debug, Deserialize)]
pub struct OverridesResponse {
    #[serde(default)]
    pub overrides: Vec<Override>,
}
