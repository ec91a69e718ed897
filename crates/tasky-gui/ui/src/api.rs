use gloo::net::http::{
  Request,
  RequestBuilder
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tasky_core::api::{
  ApiConfig,
  ApiError,
  ApiResult,
  SEARCH_PATH,
  TASKS_PATH,
  TaskApi,
  csrf_token_from_cookies,
  delete_path,
  lane_path,
  task_path,
  update_path
};
use tasky_core::query::LaneQuery;
use tasky_shared::{
  Lane,
  LanePage,
  LaneResponse,
  StatusCode,
  StatusPatch,
  Task,
  TaskFields,
  TaskId
};
use wasm_bindgen::JsCast;
use web_sys::HtmlDocument;

#[derive(Clone, Copy)]
enum Verb {
  Get,
  Post,
  Put,
  Patch,
  Delete
}

impl Verb {
  fn as_str(self) -> &'static str {
    match self {
      | Verb::Get => "GET",
      | Verb::Post => "POST",
      | Verb::Put => "PUT",
      | Verb::Patch => "PATCH",
      | Verb::Delete => "DELETE"
    }
  }
}

/// `TaskApi` over the browser's fetch.
/// The session cookie travels with
/// same-origin requests; the CSRF token
/// is re-read from `document.cookie` for
/// every mutation.
#[derive(Clone, PartialEq)]
pub struct GlooTaskApi {
  config: ApiConfig
}

impl GlooTaskApi {
  pub fn new(config: ApiConfig) -> Self {
    Self {
      config
    }
  }

  /// Talks to the page's own origin.
  pub fn same_origin() -> ApiResult<Self>
  {
    let origin = web_sys::window()
      .and_then(|window| {
        window.location().origin().ok()
      })
      .ok_or_else(|| {
        ApiError::InvalidUrl(
          "page has no origin".to_string()
        )
      })?;
    Ok(Self::new(ApiConfig::new(&origin)?))
  }

  fn csrf_token(&self) -> Option<String> {
    let cookies = web_sys::window()
      .and_then(|window| window.document())
      .and_then(|document| {
        document
          .dyn_into::<HtmlDocument>()
          .ok()
      })
      .and_then(|document| {
        document.cookie().ok()
      })?;
    csrf_token_from_cookies(
      &cookies,
      &self.config.csrf_cookie
    )
  }

  fn builder(
    &self,
    verb: Verb,
    url: &str
  ) -> RequestBuilder {
    let builder = match verb {
      | Verb::Get => Request::get(url),
      | Verb::Post => Request::post(url),
      | Verb::Put => Request::put(url),
      | Verb::Patch => Request::patch(url),
      | Verb::Delete => Request::delete(url)
    };
    let builder = builder
      .header("Accept", "application/json");
    if matches!(verb, Verb::Get) {
      return builder;
    }
    match self.csrf_token() {
      | Some(token) => builder.header(
        &self.config.csrf_header,
        &token
      ),
      | None => {
        tracing::debug!(
          cookie = %self.config.csrf_cookie,
          "no anti-forgery token in \
           document cookies"
        );
        builder
      }
    }
  }

  async fn send(
    &self,
    verb: Verb,
    path: &str,
    query: Option<&LaneQuery>,
    body: Option<String>
  ) -> ApiResult<String> {
    let url =
      self.config.endpoint(path, query)?;
    let transport = |message: String| {
      ApiError::Transport {
        method: verb.as_str().to_string(),
        path: path.to_string(),
        message
      }
    };

    let builder =
      self.builder(verb, url.as_str());
    let response = match body {
      | Some(body) => {
        builder
          .header(
            "Content-Type",
            "application/json"
          )
          .body(body)
          .map_err(|err| {
            transport(err.to_string())
          })?
          .send()
          .await
      }
      | None => builder.send().await
    }
    .map_err(|err| {
      tracing::warn!(url = %url, error = %err, "task service request failed");
      transport(err.to_string())
    })?;

    let status = response.status();
    let text =
      response.text().await.map_err(
        |err| {
          transport(format!(
            "failed reading response \
             body: {err}"
          ))
        }
      )?;

    if !response.ok() {
      tracing::warn!(url = %url, status, "task service returned non-success status");
      return Err(ApiError::Status {
        method: verb.as_str().to_string(),
        path: path.to_string(),
        status,
        body: text
      });
    }
    Ok(text)
  }

  async fn send_json<T, B>(
    &self,
    verb: Verb,
    path: &str,
    body: &B
  ) -> ApiResult<T>
  where
    T: DeserializeOwned,
    B: Serialize + ?Sized
  {
    let encoded = serde_json::to_string(
      body
    )
    .map_err(|err| {
      ApiError::Decode {
        path:    path.to_string(),
        message: format!(
          "failed encoding request \
           body: {err}"
        )
      }
    })?;
    let text = self
      .send(verb, path, None, Some(encoded))
      .await?;
    decode(path, &text)
  }

  async fn get_json<T: DeserializeOwned>(
    &self,
    path: &str,
    query: Option<&LaneQuery>
  ) -> ApiResult<T> {
    let text = self
      .send(Verb::Get, path, query, None)
      .await?;
    decode(path, &text)
  }
}

fn decode<T: DeserializeOwned>(
  path: &str,
  text: &str
) -> ApiResult<T> {
  serde_json::from_str(text).map_err(
    |err| {
      ApiError::Decode {
        path:    path.to_string(),
        message: err.to_string()
      }
    }
  )
}

impl TaskApi for GlooTaskApi {
  async fn list_by_status(
    &self,
    lane: Lane,
    query: &LaneQuery
  ) -> ApiResult<LanePage> {
    let response: LaneResponse = self
      .get_json(
        &lane_path(lane),
        Some(query)
      )
      .await?;
    Ok(response.into_page(lane))
  }

  async fn list_all(
    &self
  ) -> ApiResult<Vec<Task>> {
    self.get_json(TASKS_PATH, None).await
  }

  async fn get_one(
    &self,
    id: TaskId
  ) -> ApiResult<Task> {
    self
      .get_json(&task_path(id), None)
      .await
  }

  async fn create(
    &self,
    fields: &TaskFields
  ) -> ApiResult<Task> {
    self
      .send_json(
        Verb::Post,
        TASKS_PATH,
        fields
      )
      .await
  }

  async fn replace(
    &self,
    id: TaskId,
    fields: &TaskFields
  ) -> ApiResult<Task> {
    self
      .send_json(
        Verb::Put,
        &update_path(id),
        fields
      )
      .await
  }

  async fn patch_status(
    &self,
    id: TaskId,
    status: &StatusCode
  ) -> ApiResult<Task> {
    let body = StatusPatch {
      status: status.clone()
    };
    self
      .send_json(
        Verb::Patch,
        &update_path(id),
        &body
      )
      .await
  }

  async fn remove(
    &self,
    id: TaskId
  ) -> ApiResult<()> {
    self
      .send(
        Verb::Delete,
        &delete_path(id),
        None,
        None
      )
      .await
      .map(|_| ())
  }

  async fn search(
    &self,
    query: &str
  ) -> ApiResult<Vec<Task>> {
    let mut url = self
      .config
      .endpoint(SEARCH_PATH, None)?;
    url
      .query_pairs_mut()
      .append_pair("q", query);
    let path = match url.query() {
      | Some(encoded) => {
        format!("{SEARCH_PATH}?{encoded}")
      }
      | None => SEARCH_PATH.to_string()
    };
    self.get_json(&path, None).await
  }
}
