use anyhow::Context;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tasky_shared::{Lane, LanePage, LaneResponse, StatusCode, StatusPatch, Task, TaskFields, TaskId};
use tracing::{debug, warn};

use crate::api::{
    ApiConfig, ApiError, ApiResult, SEARCH_PATH, TASKS_PATH, TaskApi, delete_path, lane_path,
    task_path, update_path,
};
use crate::query::LaneQuery;

/// `TaskApi` over HTTP with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    client: reqwest::Client,
    config: ApiConfig,
}

impl HttpTaskApi {
    pub fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed building HTTP client for the task service")?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    #[tracing::instrument(skip(self, method, query, body), fields(method = %method))]
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: Option<&LaneQuery>,
        body: Option<Vec<u8>>,
    ) -> ApiResult<String> {
        let url = self.config.endpoint(path, query)?;
        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .header(reqwest::header::ACCEPT, "application/json");

        if let Some(cookie) = &self.config.cookie {
            request = request.header(reqwest::header::COOKIE, cookie.as_str());
        }

        if method != Method::GET {
            match self.config.csrf_token() {
                Some(token) => {
                    request = request.header(self.config.csrf_header.as_str(), token);
                }
                None => {
                    debug!(cookie = %self.config.csrf_cookie, "no anti-forgery token in cookie string");
                }
            }
        }

        if let Some(body) = body {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = request.send().await.map_err(|err| {
            warn!(url = %url, error = %err, "task service request failed");
            ApiError::Transport {
                method: method.to_string(),
                path: path.to_string(),
                message: err.to_string(),
            }
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|err| ApiError::Transport {
            method: method.to_string(),
            path: path.to_string(),
            message: format!("failed reading response body: {err}"),
        })?;

        if !status.is_success() {
            warn!(url = %url, status = %status, "task service returned non-success status");
            return Err(ApiError::Status {
                method: method.to_string(),
                path: path.to_string(),
                status: status.as_u16(),
                body: text,
            });
        }

        debug!(url = %url, status = %status, bytes = text.len(), "task service responded");
        Ok(text)
    }

    async fn send_json<T, B>(&self, method: Method, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let encoded = serde_json::to_vec(body).map_err(|err| ApiError::Decode {
            path: path.to_string(),
            message: format!("failed encoding request body: {err}"),
        })?;
        let text = self.send(method, path, None, Some(encoded)).await?;
        decode(path, &text)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: Option<&LaneQuery>) -> ApiResult<T> {
        let text = self.send(Method::GET, path, query, None).await?;
        decode(path, &text)
    }
}

fn decode<T: DeserializeOwned>(path: &str, text: &str) -> ApiResult<T> {
    serde_json::from_str(text).map_err(|err| ApiError::Decode {
        path: path.to_string(),
        message: err.to_string(),
    })
}

impl TaskApi for HttpTaskApi {
    async fn list_by_status(&self, lane: Lane, query: &LaneQuery) -> ApiResult<LanePage> {
        let response: LaneResponse = self.get_json(&lane_path(lane), Some(query)).await?;
        Ok(response.into_page(lane))
    }

    async fn list_all(&self) -> ApiResult<Vec<Task>> {
        self.get_json(TASKS_PATH, None).await
    }

    async fn get_one(&self, id: TaskId) -> ApiResult<Task> {
        self.get_json(&task_path(id), None).await
    }

    async fn create(&self, fields: &TaskFields) -> ApiResult<Task> {
        self.send_json(Method::POST, TASKS_PATH, fields).await
    }

    async fn replace(&self, id: TaskId, fields: &TaskFields) -> ApiResult<Task> {
        self.send_json(Method::PUT, &update_path(id), fields).await
    }

    async fn patch_status(&self, id: TaskId, status: &StatusCode) -> ApiResult<Task> {
        let body = StatusPatch {
            status: status.clone(),
        };
        self.send_json(Method::PATCH, &update_path(id), &body).await
    }

    async fn remove(&self, id: TaskId) -> ApiResult<()> {
        self.send(Method::DELETE, &delete_path(id), None, None)
            .await
            .map(|_| ())
    }

    async fn search(&self, query: &str) -> ApiResult<Vec<Task>> {
        let mut url = self.config.endpoint(SEARCH_PATH, None)?;
        url.query_pairs_mut().append_pair("q", query);
        let path = match url.query() {
            Some(encoded) => format!("{SEARCH_PATH}?{encoded}"),
            None => SEARCH_PATH.to_string(),
        };
        self.get_json(&path, None).await
    }
}
