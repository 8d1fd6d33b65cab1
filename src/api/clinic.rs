//! Clinic server backend.
//!
//! Implements the three service ports over the clinic's JSON API. Every
//! request carries the configured bearer token. Status handling:
//!
//! - `404` on a lookup ("active break", "settings of employee") means "none"
//! - `404` on an operation targeting an id becomes [`ServiceError::NotFound`]
//! - `409` becomes [`ServiceError::Conflict`]
//! - any other non-2xx becomes [`ServiceError::Status`]

use crate::libs::config::ServerConfig;
use crate::libs::error::ServiceError;
use crate::libs::services::{BreakRequest, BreakService, BreakSession, SettingsService, WorkSession, WorkSessionService};
use crate::libs::settings::{IdleSettings, IdleSettingsPatch};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
struct CreatedId {
    id: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewIdleSettings {
    idle_threshold_minutes: f64,
    warning_time_minutes: f64,
    show_idle_warning: bool,
    enabled: bool,
    auto_end_idle_on_activity: bool,
}

impl From<&IdleSettings> for NewIdleSettings {
    fn from(settings: &IdleSettings) -> Self {
        NewIdleSettings {
            idle_threshold_minutes: settings.idle_threshold_minutes,
            warning_time_minutes: settings.warning_time_minutes,
            show_idle_warning: settings.show_idle_warning,
            enabled: settings.enabled,
            auto_end_idle_on_activity: settings.auto_end_idle_on_activity,
        }
    }
}

#[derive(Clone)]
pub struct ClinicApi {
    client: Client,
    base_url: String,
    auth_token: String,
}

impl ClinicApi {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.api_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.base_url, path))
            .bearer_auth(&self.auth_token)
    }

    /// Maps error statuses of a call that targets `entity` `id`.
    async fn expect_success(res: Response, entity: &'static str, id: i64) -> Result<Response, ServiceError> {
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        let body = res.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::NOT_FOUND => ServiceError::NotFound { entity, id },
            StatusCode::CONFLICT => ServiceError::Conflict(body),
            _ => ServiceError::Status {
                status: status.as_u16(),
                body,
            },
        })
    }

    /// Body of a lookup; `404`, `204`, an empty body or `null` are all "none".
    async fn optional<T: DeserializeOwned>(res: Response) -> Result<Option<T>, ServiceError> {
        let status = res.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body: res.text().await.unwrap_or_default(),
            });
        }
        let body = res.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        decode(&body)
    }

    async fn json<T: DeserializeOwned>(res: Response) -> Result<T, ServiceError> {
        let body = res.text().await?;
        decode(&body)
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ServiceError> {
    serde_json::from_str(body).map_err(|e| ServiceError::Invalid(e.to_string()))
}

#[async_trait]
impl SettingsService for ClinicApi {
    async fn get_idle_settings(&self, employee_id: i64) -> Result<Option<IdleSettings>, ServiceError> {
        let res = self
            .request(Method::GET, &format!("employees/{}/idle-settings", employee_id))
            .send()
            .await?;
        Self::optional(res).await
    }

    async fn create_idle_settings(&self, employee_id: i64, defaults: &IdleSettings) -> Result<IdleSettings, ServiceError> {
        let res = self
            .request(Method::POST, &format!("employees/{}/idle-settings", employee_id))
            .json(&NewIdleSettings::from(defaults))
            .send()
            .await?;
        let res = Self::expect_success(res, "employee", employee_id).await?;
        Self::json(res).await
    }

    async fn update_idle_settings(&self, settings_id: i64, patch: &IdleSettingsPatch) -> Result<(), ServiceError> {
        let res = self
            .request(Method::PATCH, &format!("idle-settings/{}", settings_id))
            .json(patch)
            .send()
            .await?;
        Self::expect_success(res, "idle settings", settings_id).await?;
        Ok(())
    }
}

#[async_trait]
impl BreakService for ClinicApi {
    async fn start_break(&self, work_session_id: i64, request: &BreakRequest) -> Result<i64, ServiceError> {
        let res = self
            .request(Method::POST, &format!("work-sessions/{}/breaks", work_session_id))
            .json(request)
            .send()
            .await?;
        let res = Self::expect_success(res, "work session", work_session_id).await?;
        let created: CreatedId = Self::json(res).await?;
        Ok(created.id)
    }

    async fn end_break(&self, break_session_id: i64) -> Result<(), ServiceError> {
        let res = self
            .request(Method::POST, &format!("breaks/{}/end", break_session_id))
            .send()
            .await?;
        Self::expect_success(res, "break", break_session_id).await?;
        Ok(())
    }

    async fn get_active_break(&self, work_session_id: i64) -> Result<Option<BreakSession>, ServiceError> {
        let res = self
            .request(Method::GET, &format!("work-sessions/{}/breaks/active", work_session_id))
            .send()
            .await?;
        Self::optional(res).await
    }

    async fn list_breaks(&self, work_session_id: i64) -> Result<Vec<BreakSession>, ServiceError> {
        let res = self
            .request(Method::GET, &format!("work-sessions/{}/breaks", work_session_id))
            .send()
            .await?;
        let res = Self::expect_success(res, "work session", work_session_id).await?;
        Self::json(res).await
    }
}

#[async_trait]
impl WorkSessionService for ClinicApi {
    async fn get_active_work_session(&self, employee_id: i64) -> Result<Option<WorkSession>, ServiceError> {
        let res = self
            .request(Method::GET, &format!("employees/{}/work-sessions/active", employee_id))
            .send()
            .await?;
        Self::optional(res).await
    }

    async fn clock_in(&self, employee_id: i64) -> Result<WorkSession, ServiceError> {
        let res = self
            .request(Method::POST, &format!("employees/{}/work-sessions", employee_id))
            .send()
            .await?;
        let res = Self::expect_success(res, "employee", employee_id).await?;
        Self::json(res).await
    }

    async fn clock_out(&self, work_session_id: i64) -> Result<(), ServiceError> {
        let res = self
            .request(Method::POST, &format!("work-sessions/{}/end", work_session_id))
            .send()
            .await?;
        Self::expect_success(res, "work session", work_session_id).await?;
        Ok(())
    }
}
