use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    domain::{Identity, OverrideRecord, ScheduleRef},
    DutymeError,
};

const CONFIG_FILE_NAME: &str = ".dutyme.json";

/// Everything dutyme remembers between runs.
///
/// Empty fields are left out of the file. The override reference is either
/// fully present (`override_id` and `override_schedule_id`) or fully absent
/// after a clean `start`/`end`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedConfig {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Identity>,

    /// Older files kept the email next to the user object.
    #[serde(default, skip_serializing)]
    email: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub schedule_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub schedule_id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub override_id: String,
    #[serde(
        default,
        alias = "override_schedule_Id",
        skip_serializing_if = "String::is_empty"
    )]
    pub override_schedule_id: String,
}

impl PersistedConfig {
    /// `<home>/.dutyme.json`
    pub fn default_path() -> Result<PathBuf, DutymeError> {
        dirs::home_dir()
            .map(|home| home.join(CONFIG_FILE_NAME))
            .ok_or_else(|| DutymeError::validation("cannot determine home directory"))
    }

    /// Load the config at `path`. A missing file is a `NotFound` error.
    pub fn load(path: &Path) -> Result<Self, DutymeError> {
        let raw = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                DutymeError::not_found(format!("config file {} does not exist", path.display()))
            } else {
                DutymeError::Persistence {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let mut config: Self =
            serde_json::from_str(&raw).map_err(|source| DutymeError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.normalize();

        Ok(config)
    }

    /// Load the config at `path`, or start from an empty one if there is none.
    /// The flag tells whether a file was found.
    pub fn load_or_default(path: &Path) -> Result<(Self, bool), DutymeError> {
        if !path.exists() {
            return Ok((Self::default(), false));
        }
        Self::load(path).map(|config| (config, true))
    }

    /// Replace the file at `path` with this config.
    ///
    /// The content goes to a temporary file next to `path` first and is then
    /// renamed over it, so a failed write leaves the previous file in place.
    pub fn save(&self, path: &Path, pretty: bool) -> Result<(), DutymeError> {
        let persistence = |source: io::Error| DutymeError::Persistence {
            path: path.to_path_buf(),
            source,
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(persistence)?;

        // NamedTempFile is created with owner-only permissions on unix.
        let mut file = tempfile::NamedTempFile::new_in(dir).map_err(persistence)?;
        if pretty {
            serde_json::to_writer_pretty(&mut file, self)
        } else {
            serde_json::to_writer(&mut file, self)
        }
        .map_err(|e| persistence(e.into()))?;
        file.write_all(b"\n").map_err(persistence)?;
        file.as_file().sync_all().map_err(persistence)?;

        file.persist(path).map_err(|e| persistence(e.error))?;

        tracing::debug!("saved config to {}", path.display());
        Ok(())
    }

    pub fn has_active_override(&self) -> bool {
        !self.override_id.is_empty() && !self.override_schedule_id.is_empty()
    }

    /// Exactly one of the two override fields is set.
    pub fn has_partial_override(&self) -> bool {
        self.override_id.is_empty() != self.override_schedule_id.is_empty()
    }

    /// Neither identity nor schedule has been resolved yet.
    pub fn is_empty(&self) -> bool {
        self.user.is_none() && self.schedule_id.is_empty()
    }

    pub fn schedule(&self) -> Option<ScheduleRef> {
        if self.schedule_id.is_empty() {
            return None;
        }
        Some(ScheduleRef {
            name: self.schedule_name.clone(),
            id: self.schedule_id.clone(),
        })
    }

    pub fn set_schedule(&mut self, schedule: &ScheduleRef) {
        self.schedule_name = schedule.name.clone();
        self.schedule_id = schedule.id.clone();
    }

    pub fn track_override(&mut self, record: &OverrideRecord) {
        self.override_id = record.id.clone();
        self.override_schedule_id = record.schedule_id.clone();
    }

    pub fn clear_override(&mut self) {
        self.override_id.clear();
        self.override_schedule_id.clear();
    }

    fn normalize(&mut self) {
        // Older versions always wrote the user object, even before it was resolved.
        if self.user.as_ref().is_some_and(|user| !user.is_resolved()) {
            self.user = None;
        }

        let legacy_email = std::mem::take(&mut self.email);
        if let Some(user) = self.user.as_mut() {
            if user.email.is_empty() {
                user.email = legacy_email;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn identity() -> Identity {
        Identity {
            email: "taichi@dutyme.com".to_string(),
            id: "PXPGF42".to_string(),
            summary: "Taichi Nakashima".to_string(),
        }
    }

    fn full_config() -> PersistedConfig {
        let mut config = PersistedConfig {
            token: "secret".to_string(),
            user: Some(identity()),
            ..Default::default()
        };
        config.set_schedule(&ScheduleRef {
            name: "Dutyme primary".to_string(),
            id: "PI7DH85".to_string(),
        });
        config.track_override(&OverrideRecord {
            id: "PEYSGVF".to_string(),
            schedule_id: "PI7DH85".to_string(),
            user_id: "PXPGF42".to_string(),
            start: datetime!(2024-03-01 09:00 UTC),
            end: datetime!(2024-03-01 10:00 UTC),
        });
        config
    }

    #[test]
    fn empty_config_has_no_override() {
        let config = PersistedConfig::default();
        assert!(!config.has_active_override());
        assert!(!config.has_partial_override());
        assert!(config.is_empty());
    }

    #[test]
    fn active_override_needs_both_fields() {
        let mut config = PersistedConfig {
            override_id: "PEYSGVF".to_string(),
            ..Default::default()
        };
        assert!(!config.has_active_override());
        assert!(config.has_partial_override());

        config.override_schedule_id = "PI7DH85".to_string();
        assert!(config.has_active_override());
        assert!(!config.has_partial_override());

        config.clear_override();
        assert!(!config.has_active_override());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".dutyme.json");

        for (config, pretty) in [
            (PersistedConfig::default(), true),
            (full_config(), true),
            (full_config(), false),
            (
                PersistedConfig {
                    token: "only-token".to_string(),
                    ..Default::default()
                },
                false,
            ),
        ] {
            config.save(&path, pretty).unwrap();
            assert_eq!(PersistedConfig::load(&path).unwrap(), config);
        }
    }

    #[test]
    fn empty_fields_are_omitted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        PersistedConfig {
            token: "secret".to_string(),
            ..Default::default()
        }
        .save(&path, false)
        .unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw.trim(), r#"{"token":"secret"}"#);
    }

    #[test]
    fn pretty_output_is_indented() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        full_config().save(&path, true).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\n  \"token\": \"secret\""));
    }

    #[test]
    fn historical_field_names_are_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".dutyme.json");
        std::fs::write(
            &path,
            r#"{
                "token": "secret",
                "email": "taichi@dutyme.com",
                "user": {"id": "PXPGF42", "type": "user", "summary": "Taichi Nakashima", "self": "", "html_url": ""},
                "schedule_name": "Dutyme primary",
                "schedule_id": "PI7DH85",
                "override_id": "PEYSGVF",
                "override_schedule_Id": "PI7DH85"
            }"#,
        )
        .unwrap();

        let config = PersistedConfig::load(&path).unwrap();
        assert_eq!(config.user, Some(identity()));
        assert_eq!(config.override_schedule_id, "PI7DH85");
        assert!(config.has_active_override());

        config.save(&path, false).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains(r#""override_schedule_id":"PI7DH85""#));
        assert!(!raw.contains("override_schedule_Id"));
    }

    #[test]
    fn unresolved_user_object_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".dutyme.json");
        std::fs::write(&path, r#"{"user": {"id": "", "type": ""}}"#).unwrap();

        let config = PersistedConfig::load(&path).unwrap();
        assert!(config.user.is_none());
        assert!(config.is_empty());
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = PersistedConfig::load(&dir.path().join("nope.json")).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::NotFound);

        let (config, existed) =
            PersistedConfig::load_or_default(&dir.path().join("nope.json")).unwrap();
        assert!(!existed);
        assert_eq!(config, PersistedConfig::default());
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".dutyme.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = PersistedConfig::load(&path).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Parse);
    }

    #[test]
    fn save_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("dutyme.json");

        full_config().save(&path, true).unwrap();
        assert!(path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".dutyme.json");
        full_config().save(&path, true).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0);
    }
}
