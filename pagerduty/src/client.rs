use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION},
    Client, RequestBuilder, Response, StatusCode, Url,
};
use serde::de::DeserializeOwned;
use thiserror::Error;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::{
    domain::{
        NewOverride, Override, OverrideEnvelope, OverrideResponse, OverridesResponse, Schedule,
        SchedulesResponse, User, UsersResponse,
    },
    PagerDutyURL, DEFAULT_API_URL,
};

const ACCEPT_V2: &str = "application/vnd.pagerduty+json;version=2";

/// Client for the handful of PagerDuty REST endpoints dutyme needs.
///
/// Every method maps to exactly one request. Nothing is retried and list
/// endpoints only ever read the first page.
#[derive(Debug, Clone)]
pub struct PagerDutyClient {
    http: Client,
    base_url: PagerDutyURL,
}

impl PagerDutyClient {
    pub fn new(token: &str) -> Result<Self, PagerDutyError> {
        Self::with_base_url(token, DEFAULT_API_URL)
    }

    pub fn with_base_url(token: &str, base_url: &str) -> Result<Self, PagerDutyError> {
        if token.trim().is_empty() {
            return Err(PagerDutyError::MissingToken);
        }

        let base_url = PagerDutyURL::new(base_url);
        base_url.to_url()?;

        let mut auth = HeaderValue::from_str(&format!("Token token={}", token.trim()))
            .map_err(|_| PagerDutyError::InvalidToken)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_V2));
        headers.insert(AUTHORIZATION, auth);

        let http = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| PagerDutyError::ResponseError(e.to_string()))?;

        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> PagerDutyURL {
        self.base_url.append_path(path)
    }

    fn overrides_endpoint(&self, schedule_id: &str) -> Result<Url, PagerDutyError> {
        self.base_url
            .with_segments(&["schedules", schedule_id, "overrides"])
    }

    async fn send(
        &self,
        request: RequestBuilder,
        call_name: &str,
    ) -> Result<Response, PagerDutyError> {
        tracing::debug!("calling {}", call_name);

        let resp = request
            .send()
            .await
            .map_err(|e| PagerDutyError::ResponseError(format!("{}: {}", call_name, e)))?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(PagerDutyError::Unauthorized);
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::debug!("{} returned {}: {}", call_name, status, body);
            return Err(PagerDutyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(resp)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        call_name: &str,
    ) -> Result<T, PagerDutyError> {
        let resp = self.send(request, call_name).await?;

        resp.json::<T>().await.map_err(|e| {
            PagerDutyError::ParsingError(format!(
                "Failed to parse {} response as JSON: {}",
                call_name, e
            ))
        })
    }

    /// Search users by name or email.
    pub async fn list_users(&self, query: &str) -> Result<Vec<User>, PagerDutyError> {
        let url = self.endpoint("/users").to_url()?;

        let response: UsersResponse = self
            .fetch(self.http.get(url).query(&[("query", query)]), "GET /users")
            .await?;
        if response.more {
            tracing::debug!("GET /users has more pages; only the first one is used");
        }

        Ok(response.users)
    }

    /// Search schedules by name.
    pub async fn list_schedules(&self, query: &str) -> Result<Vec<Schedule>, PagerDutyError> {
        let url = self.endpoint("/schedules").to_url()?;

        let response: SchedulesResponse = self
            .fetch(
                self.http.get(url).query(&[("query", query)]),
                "GET /schedules",
            )
            .await?;
        if response.more {
            tracing::debug!("GET /schedules has more pages; only the first one is used");
        }

        Ok(response.schedules)
    }

    pub async fn create_override(
        &self,
        schedule_id: &str,
        new_override: &NewOverride,
    ) -> Result<Override, PagerDutyError> {
        let url = self.overrides_endpoint(schedule_id)?;

        let response: OverrideResponse = self
            .fetch(
                self.http.post(url).json(&OverrideEnvelope {
                    schedule_override: new_override,
                }),
                "POST /schedules/:id/overrides",
            )
            .await?;

        Ok(response.schedule_override)
    }

    /// Overrides on a schedule that overlap `[since, until)`.
    pub async fn list_overrides(
        &self,
        schedule_id: &str,
        since: OffsetDateTime,
        until: OffsetDateTime,
    ) -> Result<Vec<Override>, PagerDutyError> {
        let url = self.overrides_endpoint(schedule_id)?;
        let since = since
            .format(&Rfc3339)
            .map_err(|e| PagerDutyError::Other(format!("Failed to format since: {}", e)))?;
        let until = until
            .format(&Rfc3339)
            .map_err(|e| PagerDutyError::Other(format!("Failed to format until: {}", e)))?;

        let response: OverridesResponse = self
            .fetch(
                self.http
                    .get(url)
                    .query(&[("since", since.as_str()), ("until", until.as_str())]),
                "GET /schedules/:id/overrides",
            )
            .await?;

        Ok(response.overrides)
    }

    pub async fn delete_override(
        &self,
        schedule_id: &str,
        override_id: &str,
    ) -> Result<(), PagerDutyError> {
        let url = self
            .base_url
            .with_segments(&["schedules", schedule_id, "overrides", override_id])?;

        self.send(self.http.delete(url), "DELETE /schedules/:id/overrides/:id")
            .await?;

        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum PagerDutyError {
    #[error("missing PagerDuty API token")]
    MissingToken,
    #[error("PagerDuty API token contains characters not allowed in a header")]
    InvalidToken,
    #[error("Unauthorized (check the API token)")]
    Unauthorized,
    #[error("PagerDuty returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("ResponseError: {0}")]
    ResponseError(String),
    #[error("ParsingError: {0}")]
    ParsingError(String),
    #[error("InvalidUrl: {0}")]
    InvalidUrl(String),
    #[error("Other: {0}")]
    Other(String),
}
