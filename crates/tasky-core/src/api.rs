//! Client-side contract of the remote task service.
//!
//! Every front end talks to the service through [`TaskApi`]. Failures are
//! reported as [`ApiError`] but callers treat all variants alike: the request
//! failed, nothing is retried, and the board keeps whatever it last rendered.

use std::time::Duration;

use tasky_shared::{Lane, LanePage, StatusCode, Task, TaskFields, TaskId};
use thiserror::Error;
use url::Url;

use crate::query::LaneQuery;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/";
pub const DEFAULT_CSRF_COOKIE: &str = "csrftoken";
pub const DEFAULT_CSRF_HEADER: &str = "X-CSRFToken";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("{method} {path} failed: {message}")]
    Transport {
        method: String,
        path: String,
        message: String,
    },

    #[error("{method} {path} returned HTTP {status}: {body}")]
    Status {
        method: String,
        path: String,
        status: u16,
        body: String,
    },

    #[error("failed decoding response from {path}: {message}")]
    Decode { path: String, message: String },

    #[error("invalid request URL {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Short text for a failure banner. Validation bodies returned by the
    /// service (`["message"]` or `{"detail": "message"}`) are unwrapped.
    pub fn banner_text(&self) -> String {
        if let Self::Status { body, .. } = self
            && let Some(message) = first_message(body)
        {
            return message;
        }
        self.to_string()
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn first_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    find_string(&value)
}

fn find_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(text) => Some(text.clone()),
        serde_json::Value::Array(items) => items.iter().find_map(find_string),
        serde_json::Value::Object(map) => map
            .get("detail")
            .and_then(find_string)
            .or_else(|| map.values().find_map(find_string)),
        _ => None,
    }
}

/// Connection settings handed to an API client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: Url,
    pub csrf_cookie: String,
    pub csrf_header: String,
    /// Raw `Cookie` header value (session and CSRF cookies).
    pub cookie: Option<String>,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: &str) -> ApiResult<Self> {
        let trimmed = base_url.trim();
        let with_slash = if trimmed.ends_with('/') {
            trimmed.to_string()
        } else {
            format!("{trimmed}/")
        };
        let base_url =
            Url::parse(&with_slash).map_err(|err| ApiError::InvalidUrl(format!("{trimmed}: {err}")))?;

        Ok(Self {
            base_url,
            csrf_cookie: DEFAULT_CSRF_COOKIE.to_string(),
            csrf_header: DEFAULT_CSRF_HEADER.to_string(),
            cookie: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        let cookie = cookie.into();
        self.cookie = if cookie.trim().is_empty() {
            None
        } else {
            Some(cookie)
        };
        self
    }

    /// Resolves a path relative to the base URL and appends the lane query.
    pub fn endpoint(&self, path: &str, query: Option<&LaneQuery>) -> ApiResult<Url> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|err| ApiError::InvalidUrl(format!("{path}: {err}")))?;
        if let Some(query) = query {
            query.append_to(&mut url);
        }
        Ok(url)
    }

    /// Anti-forgery token taken from the configured cookie string.
    pub fn csrf_token(&self) -> Option<String> {
        self.cookie
            .as_deref()
            .and_then(|cookies| csrf_token_from_cookies(cookies, &self.csrf_cookie))
    }
}

/// Reads `name` out of a `k=v; k2=v2` cookie string.
pub fn csrf_token_from_cookies(cookies: &str, name: &str) -> Option<String> {
    cookies
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn task_path(id: TaskId) -> String {
    format!("tasks/{id}/")
}

pub fn update_path(id: TaskId) -> String {
    format!("tasks/{id}/update/")
}

pub fn delete_path(id: TaskId) -> String {
    format!("tasks/{id}/delete/")
}

pub fn lane_path(lane: Lane) -> String {
    format!("tasks/{}/", lane.path_segment())
}

pub const TASKS_PATH: &str = "tasks/";
pub const SEARCH_PATH: &str = "search/";

/// Operations of the remote task collection.
///
/// Implementations are driven from a single thread of cooperative tasks; the
/// returned futures need not be `Send`.
#[allow(async_fn_in_trait)]
pub trait TaskApi {
    /// `GET tasks/<lane>/[?query]`
    async fn list_by_status(&self, lane: Lane, query: &LaneQuery) -> ApiResult<LanePage>;

    /// `GET tasks/`, the unfiltered list used for client-side search.
    async fn list_all(&self) -> ApiResult<Vec<Task>>;

    async fn get_one(&self, id: TaskId) -> ApiResult<Task>;

    async fn create(&self, fields: &TaskFields) -> ApiResult<Task>;

    /// Full-field edit (`PUT`).
    async fn replace(&self, id: TaskId, fields: &TaskFields) -> ApiResult<Task>;

    /// Status-only edit (`PATCH`).
    async fn patch_status(&self, id: TaskId, status: &StatusCode) -> ApiResult<Task>;

    async fn remove(&self, id: TaskId) -> ApiResult<()>;

    /// Server-side title search (`GET search/?q=`).
    async fn search(&self, query: &str) -> ApiResult<Vec<Task>>;
}
