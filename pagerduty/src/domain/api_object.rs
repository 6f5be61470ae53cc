use serde::{Deserialize, Serialize};

/// The reference shape PagerDuty embeds wherever one resource points at another.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiObject {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub summary: String,
    #[serde(rename = "self", default, skip_serializing_if = "String::is_empty")]
    pub self_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub html_url: String,
}

impl ApiObject {
    /// A bare `user_reference`, which is all the override endpoint needs.
    pub fn user_reference(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: "user_reference".to_string(),
            ..Self::default()
        }
    }
}
