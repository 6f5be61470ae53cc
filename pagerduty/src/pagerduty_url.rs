use reqwest::Url;

use crate::PagerDutyError;

pub const DEFAULT_API_URL: &str = "https://api.pagerduty.com";

#[derive(Debug, Clone)]
pub struct PagerDutyURL(String);

impl AsRef<str> for PagerDutyURL {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Default for PagerDutyURL {
    fn default() -> Self {
        Self(DEFAULT_API_URL.to_string())
    }
}

impl PagerDutyURL {
    pub fn new(base: impl Into<String>) -> Self {
        Self(base.into())
    }

    /// Append the given path to the URL.
    pub fn append_path(&self, path: &str) -> Self {
        let trimmed_url = self.0.trim_end_matches('/');
        let trimmed_path = path.trim_start_matches('/');
        Self(format!("{}/{}", trimmed_url, trimmed_path))
    }

    pub fn to_url(&self) -> Result<Url, PagerDutyError> {
        Url::parse(&self.0).map_err(|e| PagerDutyError::InvalidUrl(format!("{}: {}", self.0, e)))
    }

    /// Parse the URL and push `segments` onto its path, escaping each one.
    pub fn with_segments(&self, segments: &[&str]) -> Result<Url, PagerDutyError> {
        let mut url = self.to_url()?;
        url.path_segments_mut()
            .map_err(|_| PagerDutyError::InvalidUrl(format!("{}: cannot be a base", self.0)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}
