use serde::{Deserialize, Serialize};

use super::ApiObject;

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(flatten)]
    pub object: ApiObject,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub time_zone: String,
}

#[derive(Debug, Deserialize)]
pub struct SchedulesResponse {
    #[serde(default)]
    pub schedules: Vec<Schedule>,
    #[serde(default)]
    pub more: bool,
}
