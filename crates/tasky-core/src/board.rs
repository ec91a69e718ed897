//! The board: the one place where task state changes.
//!
//! Every user action is a [`Mutation`] sent through [`mutate`]. [`Board`]
//! follows each successful mutation with a full reload of the three lanes;
//! the browser front end, which cannot hold a `Board` across awaits, calls
//! [`mutate`] itself and reloads the same way. Nothing is updated locally in
//! anticipation of the service's answer.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tasky_shared::{Lane, PriorityCode, StatusCode, Task, TaskFields, TaskId, due_input_value};
use tracing::{info, warn};

use crate::api::{ApiResult, TaskApi};
use crate::drag::{self, DragController, MoveIntent};
use crate::query::LaneQuery;
use crate::render::{CardView, LaneView, Renderer};
use crate::search::filter_tasks;
use crate::store::{RefreshReport, TaskStore};
use crate::sync::{SyncOutcome, correct_overdue};

/// Transient banner text after a user-initiated mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Failure(String),
}

impl Notice {
    pub fn is_success(&self) -> bool {
        matches!(self, Notice::Success(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Notice::Success(message) | Notice::Failure(message) => message,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardReport {
    pub refresh: RefreshReport,
    pub sync: SyncOutcome,
    /// Set when overdue corrections triggered a second reload.
    pub resynced: bool,
}

/// Values used to populate the edit form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditForm {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub status: StatusCode,
    pub priority: PriorityCode,
    /// Minute precision, `YYYY-MM-DDTHH:MM`, in the renderer's timezone.
    pub due_date: String,
    pub category: String,
}

impl EditForm {
    /// Form values with the due date as wall-clock time in `zone`, the zone
    /// cards are rendered in.
    pub fn in_zone(task: &Task, zone: Tz) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status.clone(),
            priority: task.priority.clone(),
            due_date: due_input_value(task.due_date, &zone),
            category: task.category.clone(),
        }
    }
}

/// A user-initiated change sent to the task service.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Create(TaskFields),
    Replace(TaskId, TaskFields),
    Delete(TaskId),
    Move(MoveIntent),
}

/// Sends one mutation and turns the answer into banner text. Nothing is
/// reloaded here: front ends reload after a success notice, and a failure
/// leaves the board as rendered.
#[tracing::instrument(skip(api))]
pub async fn mutate<A: TaskApi>(api: &A, mutation: &Mutation) -> Notice {
    let result = match mutation {
        Mutation::Create(draft) => api
            .create(draft)
            .await
            .map(|task| format!("Created task {}", task.title)),
        Mutation::Replace(id, draft) => api
            .replace(*id, draft)
            .await
            .map(|task| format!("Updated task {}", task.title)),
        Mutation::Delete(id) => api.remove(*id).await.map(|()| format!("Deleted task {id}")),
        Mutation::Move(intent) => drag::commit(api, intent)
            .await
            .map(|task| format!("Moved {} to {}", task.title, intent.new_status.label())),
    };
    match result {
        Ok(message) => {
            info!(%message, "mutation accepted");
            Notice::Success(message)
        }
        Err(err) => {
            warn!(error = %err, "mutation failed");
            Notice::Failure(err.banner_text())
        }
    }
}

pub struct Board<A> {
    api: A,
    store: TaskStore,
    query: LaneQuery,
    renderer: Renderer,
    drag: DragController,
}

impl<A: TaskApi> Board<A> {
    pub fn new(api: A, renderer: Renderer) -> Self {
        Self {
            api,
            store: TaskStore::new(),
            query: LaneQuery::default(),
            renderer,
            drag: DragController::new(),
        }
    }

    pub fn with_query(mut self, query: LaneQuery) -> Self {
        self.query = query;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn query(&self) -> &LaneQuery {
        &self.query
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub fn drag_mut(&mut self) -> &mut DragController {
        &mut self.drag
    }

    /// Replaces the filter/sort controls. Takes effect on the next reload.
    pub fn set_filter(&mut self, query: LaneQuery) {
        info!(query = %query.to_query_string(), "lane filter changed");
        self.query = query;
    }

    /// Full reload followed by one overdue pass over the in-progress lane.
    /// Corrections trigger exactly one further reload. The pass is skipped
    /// when this reload did not refresh the in-progress lane, since the
    /// previous snapshot may list tasks that have since moved on.
    #[tracing::instrument(skip(self))]
    pub async fn reload(&mut self, now: DateTime<Utc>) -> BoardReport {
        let refresh = self.store.refresh_all(&self.api, &self.query).await;
        let sync = if refresh.is_fresh(Lane::InProgress) {
            self.sync(now).await
        } else {
            warn!("in-progress lane not refreshed; skipping overdue pass");
            SyncOutcome::default()
        };
        let mut report = BoardReport {
            refresh,
            sync,
            resynced: false,
        };
        if report.sync.needs_reload() {
            report.refresh = self.store.refresh_all(&self.api, &self.query).await;
            report.resynced = true;
        }
        report
    }

    /// One synchronizer pass over the tasks currently in the in-progress
    /// lane. Does not reload.
    pub async fn sync(&self, now: DateTime<Utc>) -> SyncOutcome {
        correct_overdue(&self.api, self.store.lane_tasks(Lane::InProgress), now).await
    }

    /// Sends `mutation` and reloads the board when the service accepted it.
    pub async fn apply(&mut self, mutation: &Mutation, now: DateTime<Utc>) -> Notice {
        let notice = mutate(&self.api, mutation).await;
        if notice.is_success() {
            self.reload(now).await;
        }
        notice
    }

    pub async fn create(&mut self, draft: &TaskFields, now: DateTime<Utc>) -> Notice {
        self.apply(&Mutation::Create(draft.clone()), now).await
    }

    pub async fn replace(&mut self, id: TaskId, draft: &TaskFields, now: DateTime<Utc>) -> Notice {
        self.apply(&Mutation::Replace(id, draft.clone()), now).await
    }

    pub async fn delete(&mut self, id: TaskId, now: DateTime<Utc>) -> Notice {
        self.apply(&Mutation::Delete(id), now).await
    }

    /// Moves a task to `lane` the same way a drop does.
    pub async fn move_task(&mut self, id: TaskId, lane: Lane, now: DateTime<Utc>) -> Notice {
        self.apply(&Mutation::Move(MoveIntent::to_lane(id, lane)), now)
            .await
    }

    /// Completes a drag gesture ending over `lane`.
    pub async fn drop_task(&mut self, lane: Lane, payload: &str, now: DateTime<Utc>) -> Option<Notice> {
        let intent = self.drag.drop_on(lane, payload)?;
        Some(self.apply(&Mutation::Move(intent), now).await)
    }

    pub async fn show(&self, id: TaskId) -> ApiResult<Task> {
        self.api.get_one(id).await
    }

    pub async fn edit_form(&self, id: TaskId) -> ApiResult<EditForm> {
        let task = self.api.get_one(id).await?;
        Ok(EditForm::in_zone(&task, self.renderer.timezone()))
    }

    /// Client-side search over the last fetched full list.
    pub fn search(&self, query: &str) -> Vec<&Task> {
        filter_tasks(self.store.all_tasks(), query)
    }

    pub async fn search_remote(&self, query: &str) -> ApiResult<Vec<Task>> {
        self.api.search(query).await
    }

    pub fn lane_views(&self) -> Vec<LaneView> {
        Lane::ALL
            .iter()
            .map(|lane| self.renderer.lane_view(*lane, self.store.lane(*lane)))
            .collect()
    }

    pub fn search_views(&self, query: &str) -> Vec<CardView> {
        self.renderer.search_view(&self.search(query))
    }
}
