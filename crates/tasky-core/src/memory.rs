//! In-process stand-in for the remote task service.
//!
//! Mirrors the service's observable behaviour closely enough to drive the
//! board end to end: identifiers are assigned here, lane listings are filtered
//! by status and carry their count key, titles are unique, and unknown
//! identifiers answer 404. Every call is recorded.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::Mutex;
use tasky_shared::{Lane, LanePage, StatusCode, Task, TaskFields, TaskId};
use tracing::debug;

use crate::api::{
    ApiError, ApiResult, SEARCH_PATH, TASKS_PATH, TaskApi, delete_path, lane_path, task_path,
    update_path,
};
use crate::query::LaneQuery;

const DUPLICATE_TITLE: &str = "You already have a task with this title.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub method: &'static str,
    pub path: String,
    /// Status sent by a PATCH.
    pub status: Option<String>,
}

#[derive(Debug, Default)]
struct State {
    tasks: BTreeMap<TaskId, Task>,
    next_id: TaskId,
    calls: Vec<RecordedCall>,
    failing_lanes: BTreeSet<Lane>,
    failing_patches: BTreeSet<TaskId>,
    owner: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskApi {
    state: Arc<Mutex<State>>,
}

impl InMemoryTaskApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `fields` as if created by the service and returns the record.
    pub fn seed(&self, fields: TaskFields) -> Task {
        let mut state = self.state.lock();
        insert(&mut state, fields)
    }

    /// Every record created from now on is assigned to `owner`.
    pub fn with_owner(self, owner: u64) -> Self {
        self.state.lock().owner = Some(owner);
        self
    }

    pub fn task(&self, id: TaskId) -> Option<Task> {
        self.state.lock().tasks.get(&id).cloned()
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.state.lock().tasks.values().cloned().collect()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().calls.clone()
    }

    pub fn calls_with_method(&self, method: &str) -> Vec<RecordedCall> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.method == method)
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Makes listings of `lane` answer HTTP 500 until cleared.
    pub fn fail_lane(&self, lane: Lane, failing: bool) {
        let mut state = self.state.lock();
        if failing {
            state.failing_lanes.insert(lane);
        } else {
            state.failing_lanes.remove(&lane);
        }
    }

    /// Makes status patches of `id` answer HTTP 500 until cleared.
    pub fn fail_patch(&self, id: TaskId, failing: bool) {
        let mut state = self.state.lock();
        if failing {
            state.failing_patches.insert(id);
        } else {
            state.failing_patches.remove(&id);
        }
    }
}

fn insert(state: &mut State, fields: TaskFields) -> Task {
    state.next_id += 1;
    let task = Task {
        id: state.next_id,
        title: fields.title,
        description: fields.description,
        status: fields.status,
        priority: fields.priority,
        due_date: fields.due_date,
        category: fields.category,
        assigned_to: state.owner,
    };
    state.tasks.insert(task.id, task.clone());
    task
}

fn record(state: &mut State, method: &'static str, path: String, status: Option<String>) {
    debug!(method, path = %path, "in-memory task service call");
    state.calls.push(RecordedCall {
        method,
        path,
        status,
    });
}

fn status_error(method: &str, path: &str, status: u16, body: &str) -> ApiError {
    ApiError::Status {
        method: method.to_string(),
        path: path.to_string(),
        status,
        body: body.to_string(),
    }
}

fn not_found(method: &str, path: &str) -> ApiError {
    status_error(method, path, 404, r#"{"detail":"Not found."}"#)
}

fn duplicate_title(method: &str, path: &str) -> ApiError {
    status_error(method, path, 400, &format!(r#"["{DUPLICATE_TITLE}"]"#))
}

fn title_taken(state: &State, title: &str, except: Option<TaskId>) -> bool {
    state
        .tasks
        .values()
        .any(|task| task.title == title && Some(task.id) != except)
}

fn matches_query(task: &Task, query: &LaneQuery) -> bool {
    if let Some(priority) = &query.priority
        && task.priority != *priority
    {
        return false;
    }
    if let Some(category) = query.category.as_deref().map(str::trim)
        && !category.is_empty()
        && task.category != category
    {
        return false;
    }
    if let Some(due) = query.due_date.as_deref().map(str::trim)
        && !due.is_empty()
        && task.due_date.date_naive().to_string() != due
    {
        return false;
    }
    true
}

fn sort_tasks(tasks: &mut [Task], query: &LaneQuery) {
    let Some((field, descending)) = query.sort_key() else {
        return;
    };
    match field {
        "title" => tasks.sort_by(|a, b| a.title.cmp(&b.title)),
        "due_date" => tasks.sort_by_key(|task| task.due_date),
        "priority" => tasks.sort_by(|a, b| a.priority.code().cmp(b.priority.code())),
        "category" => tasks.sort_by(|a, b| a.category.cmp(&b.category)),
        "id" => tasks.sort_by_key(|task| task.id),
        other => {
            debug!(field = other, "ignoring unknown ordering field");
            return;
        }
    }
    if descending {
        tasks.reverse();
    }
}

impl TaskApi for InMemoryTaskApi {
    async fn list_by_status(&self, lane: Lane, query: &LaneQuery) -> ApiResult<LanePage> {
        let mut state = self.state.lock();
        let path = lane_path(lane);
        let logged = if query.is_empty() {
            path.clone()
        } else {
            format!("{path}?{}", query.to_query_string())
        };
        record(&mut state, "GET", logged, None);

        if state.failing_lanes.contains(&lane) {
            return Err(status_error("GET", &path, 500, "lane unavailable"));
        }

        let status = lane.status();
        let in_lane: Vec<&Task> = state
            .tasks
            .values()
            .filter(|task| task.status == status)
            .collect();
        let count = in_lane.len() as u64;
        let mut tasks: Vec<Task> = in_lane
            .into_iter()
            .filter(|task| matches_query(task, query))
            .cloned()
            .collect();
        sort_tasks(&mut tasks, query);

        Ok(LanePage { count, tasks })
    }

    async fn list_all(&self) -> ApiResult<Vec<Task>> {
        let mut state = self.state.lock();
        record(&mut state, "GET", TASKS_PATH.to_string(), None);
        Ok(state.tasks.values().cloned().collect())
    }

    async fn get_one(&self, id: TaskId) -> ApiResult<Task> {
        let mut state = self.state.lock();
        let path = task_path(id);
        record(&mut state, "GET", path.clone(), None);
        state
            .tasks
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("GET", &path))
    }

    async fn create(&self, fields: &TaskFields) -> ApiResult<Task> {
        let mut state = self.state.lock();
        record(&mut state, "POST", TASKS_PATH.to_string(), None);
        if title_taken(&state, &fields.title, None) {
            return Err(duplicate_title("POST", TASKS_PATH));
        }
        Ok(insert(&mut state, fields.clone()))
    }

    async fn replace(&self, id: TaskId, fields: &TaskFields) -> ApiResult<Task> {
        let mut state = self.state.lock();
        let path = update_path(id);
        record(&mut state, "PUT", path.clone(), None);
        if !state.tasks.contains_key(&id) {
            return Err(not_found("PUT", &path));
        }
        if title_taken(&state, &fields.title, Some(id)) {
            return Err(duplicate_title("PUT", &path));
        }
        let owner = state.owner;
        let task = Task {
            id,
            title: fields.title.clone(),
            description: fields.description.clone(),
            status: fields.status.clone(),
            priority: fields.priority.clone(),
            due_date: fields.due_date,
            category: fields.category.clone(),
            assigned_to: owner,
        };
        state.tasks.insert(id, task.clone());
        Ok(task)
    }

    async fn patch_status(&self, id: TaskId, status: &StatusCode) -> ApiResult<Task> {
        let mut state = self.state.lock();
        let path = update_path(id);
        record(&mut state, "PATCH", path.clone(), Some(status.code().to_string()));
        if state.failing_patches.contains(&id) {
            return Err(status_error("PATCH", &path, 500, "patch rejected"));
        }
        let task = state
            .tasks
            .get_mut(&id)
            .ok_or_else(|| not_found("PATCH", &path))?;
        task.status = status.clone();
        Ok(task.clone())
    }

    async fn remove(&self, id: TaskId) -> ApiResult<()> {
        let mut state = self.state.lock();
        let path = delete_path(id);
        record(&mut state, "DELETE", path.clone(), None);
        state
            .tasks
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found("DELETE", &path))
    }

    async fn search(&self, query: &str) -> ApiResult<Vec<Task>> {
        let mut state = self.state.lock();
        record(&mut state, "GET", format!("{SEARCH_PATH}?q={query}"), None);
        let needle = query.to_lowercase();
        Ok(state
            .tasks
            .values()
            .filter(|task| task.title.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use tasky_shared::PriorityCode;

    use super::*;

    fn fields(title: &str, status: StatusCode) -> TaskFields {
        TaskFields {
            title: title.to_string(),
            description: String::new(),
            status,
            priority: PriorityCode::Medium,
            due_date: Utc
                .with_ymd_and_hms(2024, 1, 5, 15, 30, 0)
                .single()
                .expect("valid due"),
            category: "home".to_string(),
        }
    }

    #[tokio::test]
    async fn duplicate_titles_are_rejected() {
        let api = InMemoryTaskApi::new();
        api.create(&fields("Pay rent", StatusCode::InProgress))
            .await
            .expect("first create");
        let err = api
            .create(&fields("Pay rent", StatusCode::Completed))
            .await
            .expect_err("duplicate create");
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.banner_text(), DUPLICATE_TITLE);
    }

    #[tokio::test]
    async fn lane_count_ignores_filters() {
        let api = InMemoryTaskApi::new();
        api.seed(fields("a", StatusCode::InProgress));
        let mut other = fields("b", StatusCode::InProgress);
        other.category = "work".to_string();
        api.seed(other);

        let query = LaneQuery {
            category: Some("work".to_string()),
            ..LaneQuery::default()
        };
        let page = api
            .list_by_status(Lane::InProgress, &query)
            .await
            .expect("list lane");
        assert_eq!(page.count, 2);
        assert_eq!(page.tasks.len(), 1);
        assert_eq!(page.tasks[0].title, "b");
        assert_eq!(
            api.calls()[0].path,
            "tasks/in_progress/?category=work"
        );
    }

    #[tokio::test]
    async fn records_carry_the_owner_and_keep_it_on_replace() {
        let api = InMemoryTaskApi::new().with_owner(42);
        let created = api
            .create(&fields("Pay rent", StatusCode::InProgress))
            .await
            .expect("create");
        assert_eq!(created.assigned_to, Some(42));

        let mut changed = created.fields();
        changed.title = "Pay rent early".to_string();
        let replaced = api.replace(created.id, &changed).await.expect("replace");
        assert_eq!(replaced.assigned_to, Some(42));
        assert_eq!(api.task(created.id).map(|task| task.title), Some(changed.title));
    }
}
