use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};
use std::time::Duration;

use anyhow::{
  Context,
  anyhow
};
use chrono_tz::Tz;
use tasky_shared::PriorityCode;
use tracing::{
  debug,
  info,
  trace,
  warn
};

use crate::api::{
  ApiConfig,
  DEFAULT_BASE_URL,
  DEFAULT_CSRF_COOKIE,
  DEFAULT_CSRF_HEADER,
  DEFAULT_TIMEOUT_SECS
};
use crate::query::LaneQuery;

const RC_ENV_VAR: &str = "TASKYRC";
const RC_FILE_NAME: &str = ".taskyrc";

#[derive(Debug, Clone)]
pub struct Config {
  map: HashMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

impl Config {
  pub fn defaults() -> Self {
    let mut cfg = Config {
      map:          HashMap::new(),
      loaded_files: vec![]
    };

    let defaults = [
      ("api.base_url", DEFAULT_BASE_URL),
      (
        "api.csrf_cookie",
        DEFAULT_CSRF_COOKIE
      ),
      (
        "api.csrf_header",
        DEFAULT_CSRF_HEADER
      ),
      ("display.timezone", "UTC"),
      ("color", "on")
    ];
    for (key, value) in defaults {
      cfg
        .map
        .insert(key.to_string(), value.to_string());
    }
    cfg.map.insert(
      "api.timeout".to_string(),
      DEFAULT_TIMEOUT_SECS.to_string()
    );
    cfg
  }

  #[tracing::instrument(skip(
    rc_override
  ))]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Self::defaults();

    let rc = resolve_rc_path(rc_override)?;
    if let Some(path) = rc {
      info!(rc = %path.display(), "loading taskyrc");
      cfg.load_file(&path)?;
    } else {
      warn!(
        "no taskyrc found; using \
         defaults"
      );
    }

    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.map.insert(key, v);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self
      .map
      .get(key)
      .map(|v| v.trim().to_string())
      .filter(|v| !v.is_empty())
  }

  pub fn get_bool(
    &self,
    key: &str
  ) -> Option<bool> {
    self
      .map
      .get(key)
      .map(|v| parse_bool(v))
  }

  pub fn get_u64(
    &self,
    key: &str
  ) -> anyhow::Result<Option<u64>> {
    self
      .get(key)
      .map(|v| {
        v.parse::<u64>().with_context(
          || {
            format!(
              "{key} must be a whole \
               number, got {v}"
            )
          }
        )
      })
      .transpose()
  }

  /// Connection settings for the task
  /// service.
  pub fn api_config(
    &self
  ) -> anyhow::Result<ApiConfig> {
    let base = self
      .get("api.base_url")
      .unwrap_or_else(|| {
        DEFAULT_BASE_URL.to_string()
      });
    let mut api = ApiConfig::new(&base)
      .context("invalid api.base_url")?;

    if let Some(cookie) =
      self.get("api.csrf_cookie")
    {
      api.csrf_cookie = cookie;
    }
    if let Some(header) =
      self.get("api.csrf_header")
    {
      api.csrf_header = header;
    }
    if let Some(cookie) =
      self.get("api.cookie")
    {
      api = api.with_cookie(cookie);
    }
    if let Some(secs) =
      self.get_u64("api.timeout")?
    {
      api.timeout =
        Duration::from_secs(secs);
    }

    Ok(api)
  }

  /// Filter and sort controls from
  /// `filter.*` keys.
  pub fn lane_query(&self) -> LaneQuery {
    LaneQuery {
      priority: self
        .get("filter.priority")
        .map(PriorityCode::from),
      due_date: self.get("filter.due_date"),
      category: self.get("filter.category"),
      ordering: self.get("filter.ordering")
    }
  }

  pub fn display_timezone(
    &self
  ) -> anyhow::Result<Tz> {
    let raw = self
      .get("display.timezone")
      .unwrap_or_else(|| "UTC".to_string());
    raw.parse::<Tz>().map_err(|err| {
      anyhow!(
        "invalid display.timezone \
         {raw}: {err}"
      )
    })
  }

  pub fn color(&self) -> bool {
    self.get_bool("color").unwrap_or(true)
  }

  #[tracing::instrument(skip(self))]
  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let path = fs::canonicalize(&path)
      .unwrap_or(path);
    if self.loaded_files.contains(&path) {
      warn!(file = %path.display(), "file already loaded; skipping include cycle");
      return Ok(());
    }
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;

    self
      .loaded_files
      .push(path.clone());

    let base_dir = path
      .parent()
      .map(|p| p.to_path_buf())
      .unwrap_or_else(|| {
        PathBuf::from(".")
      });

    for (line_num, raw_line) in
      text.lines().enumerate()
    {
      let mut line = raw_line.trim();
      if line.is_empty()
        || line.starts_with('#')
      {
        continue;
      }

      if let Some((before, _)) =
        line.split_once(" #")
      {
        line = before.trim();
      }

      if line.is_empty() {
        continue;
      }

      if let Some(include_rest) =
        line.strip_prefix("include ")
      {
        let include_path =
          resolve_include_path(
            &base_dir,
            include_rest.trim()
          )?;
        debug!(
            file = %path.display(),
            include = %include_path.display(),
            line = line_num + 1,
            "processing include"
        );

        if include_path.exists() {
          self
            .load_file(&include_path)?;
        } else {
          warn!(include = %include_path.display(), "include file does not exist; skipping");
        }
        continue;
      }

      let (k, v) = line
        .split_once('=')
        .ok_or_else(|| {
          anyhow!(
            "invalid config line \
             {}:{}: {}",
            path.display(),
            line_num + 1,
            raw_line
          )
        })?;

      let key = k.trim().to_string();
      let value = v.trim().to_string();
      trace!(key = %key, "loaded config key");
      self.map.insert(key, value);
    }

    Ok(())
  }
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_rc_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(rc_env) =
    std::env::var(RC_ENV_VAR)
  {
    if rc_env == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      rc_env
    )));
  }

  let Some(home) = dirs::home_dir()
  else {
    debug!(
      "cannot determine home \
       directory; skipping taskyrc"
    );
    return Ok(None);
  };
  let candidate = home.join(RC_FILE_NAME);
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn resolve_include_path(
  base_dir: &Path,
  include: &str
) -> anyhow::Result<PathBuf> {
  if include.trim().is_empty() {
    return Err(anyhow!(
      "include path cannot be empty"
    ));
  }

  let raw = PathBuf::from(include);
  let expanded = expand_tilde(&raw);
  if expanded.is_absolute() {
    Ok(expanded)
  } else {
    Ok(base_dir.join(expanded))
  }
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(s: &str) -> bool {
  matches!(
    s.trim()
      .to_ascii_lowercase()
      .as_str(),
    "1" | "y" | "yes" | "on" | "true"
  )
}
