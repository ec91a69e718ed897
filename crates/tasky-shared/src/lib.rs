use std::collections::BTreeMap;
use std::fmt;

use chrono::{
  DateTime,
  NaiveDateTime,
  TimeZone,
  Utc
};
use serde::{
  Deserialize,
  Serialize
};

pub type TaskId = u64;

/// Status code as stored by the task
/// service. Codes outside the known set
/// are kept verbatim.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Hash,
)]
#[serde(from = "String", into = "String")]
pub enum StatusCode {
  InProgress,
  Completed,
  Overdue,
  Other(String)
}

impl StatusCode {
  pub fn code(&self) -> &str {
    match self {
      | Self::InProgress => "IP",
      | Self::Completed => "CO",
      | Self::Overdue => "OV",
      | Self::Other(raw) => raw.as_str()
    }
  }

  pub fn label(&self) -> &str {
    match self {
      | Self::InProgress => "In Progress",
      | Self::Completed => "Completed",
      | Self::Overdue => "Overdue",
      | Self::Other(raw) => raw.as_str()
    }
  }

  pub fn is_known(&self) -> bool {
    !matches!(self, Self::Other(_))
  }
}

impl From<String> for StatusCode {
  fn from(raw: String) -> Self {
    match raw.as_str() {
      | "IP" => Self::InProgress,
      | "CO" => Self::Completed,
      | "OV" => Self::Overdue,
      | _ => Self::Other(raw)
    }
  }
}

impl From<&str> for StatusCode {
  fn from(raw: &str) -> Self {
    Self::from(raw.to_string())
  }
}

impl From<StatusCode> for String {
  fn from(value: StatusCode) -> Self {
    value.code().to_string()
  }
}

impl fmt::Display for StatusCode {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.code())
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Hash,
)]
#[serde(from = "String", into = "String")]
pub enum PriorityCode {
  High,
  Medium,
  Low,
  Other(String)
}

impl PriorityCode {
  pub fn code(&self) -> &str {
    match self {
      | Self::High => "HI",
      | Self::Medium => "ME",
      | Self::Low => "LO",
      | Self::Other(raw) => raw.as_str()
    }
  }

  pub fn label(&self) -> &str {
    match self {
      | Self::High => "High",
      | Self::Medium => "Medium",
      | Self::Low => "Low",
      | Self::Other(raw) => raw.as_str()
    }
  }
}

impl From<String> for PriorityCode {
  fn from(raw: String) -> Self {
    match raw.as_str() {
      | "HI" => Self::High,
      | "ME" => Self::Medium,
      | "LO" => Self::Low,
      | _ => Self::Other(raw)
    }
  }
}

impl From<&str> for PriorityCode {
  fn from(raw: &str) -> Self {
    Self::from(raw.to_string())
  }
}

impl From<PriorityCode> for String {
  fn from(value: PriorityCode) -> Self {
    value.code().to_string()
  }
}

impl fmt::Display for PriorityCode {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.code())
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct Task {
  pub id:          TaskId,
  #[serde(default)]
  pub title:       String,
  #[serde(default)]
  pub description: String,
  pub status:      StatusCode,
  pub priority:    PriorityCode,
  pub due_date:    DateTime<Utc>,
  #[serde(default)]
  pub category:    String,
  #[serde(default)]
  pub assigned_to: Option<u64>
}

impl Task {
  /// An in-progress task whose due date
  /// is strictly before `now`.
  pub fn is_stale(
    &self,
    now: DateTime<Utc>
  ) -> bool {
    self.status == StatusCode::InProgress
      && self.due_date < now
  }

  pub fn fields(&self) -> TaskFields {
    TaskFields {
      title:       self.title.clone(),
      description: self
        .description
        .clone(),
      status:      self.status.clone(),
      priority:    self.priority.clone(),
      due_date:    self.due_date,
      category:    self.category.clone()
    }
  }

  pub fn lane(&self) -> Option<Lane> {
    Lane::for_status(&self.status)
  }
}

impl fmt::Display for Task {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(
      f,
      "{} with {} priority",
      self.title, self.priority
    )
  }
}

/// Body of create (POST) and full
/// replace (PUT) requests.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct TaskFields {
  pub title:       String,
  pub description: String,
  pub status:      StatusCode,
  pub priority:    PriorityCode,
  pub due_date:    DateTime<Utc>,
  pub category:    String
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct StatusPatch {
  pub status: StatusCode
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
)]
pub enum Lane {
  InProgress,
  Completed,
  Overdue
}

impl Lane {
  pub const ALL: [Lane; 3] = [
    Lane::InProgress,
    Lane::Completed,
    Lane::Overdue
  ];

  /// Path segment under `tasks/`.
  pub fn path_segment(
    self
  ) -> &'static str {
    match self {
      | Self::InProgress => {
        "in_progress"
      }
      | Self::Completed => "completed",
      | Self::Overdue => "overdue"
    }
  }

  /// Key carrying the lane total in the
  /// lane listing response.
  pub fn count_key(self) -> &'static str {
    match self {
      | Self::InProgress => {
        "inprogress_count"
      }
      | Self::Completed => {
        "completed_count"
      }
      | Self::Overdue => "overdue_count"
    }
  }

  pub fn status(self) -> StatusCode {
    match self {
      | Self::InProgress => {
        StatusCode::InProgress
      }
      | Self::Completed => {
        StatusCode::Completed
      }
      | Self::Overdue => StatusCode::Overdue
    }
  }

  /// Identifier of the lane as a drop
  /// target; it doubles as the status
  /// code a dropped task moves to.
  pub fn drop_id(self) -> &'static str {
    match self {
      | Self::InProgress => "IP",
      | Self::Completed => "CO",
      | Self::Overdue => "OV"
    }
  }

  pub fn title(self) -> &'static str {
    match self {
      | Self::InProgress => "In Progress",
      | Self::Completed => "Completed",
      | Self::Overdue => "Overdue"
    }
  }

  pub fn for_status(
    status: &StatusCode
  ) -> Option<Self> {
    match status {
      | StatusCode::InProgress => {
        Some(Self::InProgress)
      }
      | StatusCode::Completed => {
        Some(Self::Completed)
      }
      | StatusCode::Overdue => {
        Some(Self::Overdue)
      }
      | StatusCode::Other(_) => None
    }
  }

  /// Accepts drop ids (`IP`), path
  /// segments (`in_progress`) and a few
  /// spelled-out forms.
  pub fn parse(raw: &str) -> Option<Self> {
    let normalized = raw
      .trim()
      .to_ascii_lowercase()
      .replace(['-', ' '], "_");
    match normalized.as_str() {
      | "ip" | "in_progress"
      | "inprogress" | "progress" => {
        Some(Self::InProgress)
      }
      | "co" | "completed" | "done" => {
        Some(Self::Completed)
      }
      | "ov" | "overdue" => {
        Some(Self::Overdue)
      }
      | _ => None
    }
  }
}

impl fmt::Display for Lane {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.path_segment())
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LanePage {
  pub count: u64,
  pub tasks: Vec<Task>
}

/// Raw lane listing body:
/// `{ "<lane>_count": n, "tasks": [...] }`.
#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
pub struct LaneResponse {
  #[serde(default)]
  pub tasks:  Vec<Task>,
  #[serde(flatten)]
  pub extra:
    BTreeMap<String, serde_json::Value>
}

impl LaneResponse {
  pub fn new(
    lane: Lane,
    tasks: Vec<Task>
  ) -> Self {
    let mut extra = BTreeMap::new();
    extra.insert(
      lane.count_key().to_string(),
      serde_json::Value::from(
        tasks.len() as u64
      )
    );
    Self { tasks, extra }
  }

  /// Falls back to the number of tasks
  /// when the count key is missing.
  pub fn into_page(
    self,
    lane: Lane
  ) -> LanePage {
    let count = self
      .extra
      .get(lane.count_key())
      .and_then(serde_json::Value::as_u64)
      .unwrap_or(self.tasks.len() as u64);
    LanePage {
      count,
      tasks: self.tasks
    }
  }
}

/// Edit-form value for a due date as
/// wall-clock time in `zone`, truncated
/// to minutes.
pub fn due_input_value<Z>(
  due: DateTime<Utc>,
  zone: &Z
) -> String
where
  Z: TimeZone,
  Z::Offset: fmt::Display
{
  due
    .with_timezone(zone)
    .format("%Y-%m-%dT%H:%M")
    .to_string()
}

/// Parses either the edit-form format
/// (wall-clock time in `zone`) or a full
/// RFC 3339 timestamp. A wall-clock time
/// skipped by a DST change is rejected.
pub fn parse_due_input<Z: TimeZone>(
  raw: &str,
  zone: &Z
) -> Option<DateTime<Utc>> {
  let trimmed = raw.trim();
  if let Ok(parsed) =
    DateTime::parse_from_rfc3339(trimmed)
  {
    return Some(
      parsed.with_timezone(&Utc)
    );
  }
  ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
    .into_iter()
    .find_map(|format| {
      NaiveDateTime::parse_from_str(
        trimmed, format
      )
      .ok()
    })
    .and_then(|naive| {
      zone
        .from_local_datetime(&naive)
        .earliest()
    })
    .map(|local| local.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
  use chrono::FixedOffset;
  use serde_json::json;

  use super::*;

  #[test]
  fn unknown_codes_keep_raw_value() {
    let task: Task =
      serde_json::from_value(json!({
        "id": 7,
        "title": "Odd",
        "description": "",
        "status": "ZZ",
        "priority": "XX",
        "due_date": "2024-01-05T15:30:00Z",
        "category": "misc",
        "assigned_to": 1
      }))
      .expect("decode task");

    assert_eq!(task.status.label(), "ZZ");
    assert_eq!(task.priority.label(), "XX");
    assert!(!task.status.is_known());
    assert_eq!(task.lane(), None);

    let encoded =
      serde_json::to_value(&task)
        .expect("encode task");
    assert_eq!(encoded["status"], "ZZ");
    assert_eq!(encoded["priority"], "XX");
  }

  #[test]
  fn known_codes_map_to_labels() {
    assert_eq!(
      StatusCode::from("IP").label(),
      "In Progress"
    );
    assert_eq!(
      StatusCode::from("OV").label(),
      "Overdue"
    );
    assert_eq!(
      PriorityCode::from("ME").label(),
      "Medium"
    );
    assert_eq!(
      PriorityCode::from("HI").label(),
      "High"
    );
  }

  #[test]
  fn lane_page_reads_lane_specific_count_key()
  {
    let body = json!({
      "tasks": [],
      "completed_count": 4
    });
    let response: LaneResponse =
      serde_json::from_value(body)
        .expect("decode lane");
    let page =
      response.into_page(Lane::Completed);
    assert_eq!(page.count, 4);
    assert!(page.tasks.is_empty());
  }

  #[test]
  fn stale_requires_in_progress_and_past_due()
  {
    let due = Utc
      .with_ymd_and_hms(
        2024, 1, 5, 15, 30, 0
      )
      .single()
      .expect("valid due");
    let mut task = Task {
      id:          1,
      title:       "Pay rent".to_string(),
      description: String::new(),
      status:      StatusCode::InProgress,
      priority:    PriorityCode::High,
      due_date:    due,
      category:    "home".to_string(),
      assigned_to: None
    };

    assert!(!task.is_stale(due));
    assert!(task.is_stale(
      due + chrono::Duration::seconds(1)
    ));

    task.status = StatusCode::Completed;
    assert!(!task.is_stale(
      due + chrono::Duration::days(1)
    ));
    assert_eq!(
      task.to_string(),
      "Pay rent with HI priority"
    );
  }

  #[test]
  fn due_input_truncates_to_minutes() {
    let due = Utc
      .with_ymd_and_hms(
        2024, 1, 5, 15, 30, 59
      )
      .single()
      .expect("valid due");
    let text = due_input_value(due, &Utc);
    assert_eq!(text, "2024-01-05T15:30");
    assert_eq!(
      parse_due_input(&text, &Utc),
      Utc
        .with_ymd_and_hms(
          2024, 1, 5, 15, 30, 0
        )
        .single()
    );
  }

  #[test]
  fn due_input_uses_wall_clock_of_zone() {
    let tokyo = FixedOffset::east_opt(
      9 * 3600
    )
    .expect("valid offset");
    let due = Utc
      .with_ymd_and_hms(
        2024, 1, 5, 15, 30, 0
      )
      .single()
      .expect("valid due");

    let text = due_input_value(due, &tokyo);
    assert_eq!(text, "2024-01-06T00:30");
    assert_eq!(
      parse_due_input(&text, &tokyo),
      Some(due)
    );
    assert_eq!(
      parse_due_input(
        "2024-01-05T15:30:00Z",
        &tokyo
      ),
      Some(due)
    );
  }

  #[test]
  fn lane_parse_accepts_drop_ids_and_segments()
  {
    assert_eq!(
      Lane::parse("CO"),
      Some(Lane::Completed)
    );
    assert_eq!(
      Lane::parse("in-progress"),
      Some(Lane::InProgress)
    );
    assert_eq!(
      Lane::parse("overdue"),
      Some(Lane::Overdue)
    );
    assert_eq!(Lane::parse("later"), None);
  }
}
