//! Drag-and-drop between lanes.
//!
//! Cards are drag sources carrying a `task:<id>` payload; lanes are drop
//! targets that accept nothing else. A drop becomes a [`MoveIntent`] whose new
//! status is the target lane's drop identifier. Nothing moves locally: the
//! intent is committed with one status patch and the board reloads.

use tasky_shared::{Lane, StatusCode, Task, TaskId};
use tracing::{debug, info, warn};

use crate::api::{ApiResult, TaskApi};

const PAYLOAD_PREFIX: &str = "task:";

/// MIME type the payload travels under in a browser `DataTransfer`.
pub const PAYLOAD_MIME: &str = "text/plain";

pub fn payload_for(id: TaskId) -> String {
    format!("{PAYLOAD_PREFIX}{id}")
}

/// `None` for anything that is not a task card payload.
pub fn parse_payload(raw: &str) -> Option<TaskId> {
    raw.trim()
        .strip_prefix(PAYLOAD_PREFIX)
        .and_then(|id| id.parse().ok())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveIntent {
    pub task_id: TaskId,
    pub new_status: StatusCode,
}

impl MoveIntent {
    /// The intent a drop of `task_id` on `lane` would produce.
    pub fn to_lane(task_id: TaskId, lane: Lane) -> Self {
        Self {
            task_id,
            new_status: StatusCode::from(lane.drop_id()),
        }
    }
}

/// Visual drag state; carries no data the drop depends on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DragController {
    dragging: Option<TaskId>,
    over_lane: Option<Lane>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dragging(&self) -> Option<TaskId> {
        self.dragging
    }

    pub fn over_lane(&self) -> Option<Lane> {
        self.over_lane
    }

    pub fn is_dragging(&self, id: TaskId) -> bool {
        self.dragging == Some(id)
    }

    pub fn drag_start(&mut self, id: TaskId) {
        debug!(task_id = id, "drag started");
        self.dragging = Some(id);
    }

    pub fn drag_over(&mut self, lane: Lane) {
        self.over_lane = Some(lane);
    }

    pub fn drag_end(&mut self) {
        self.dragging = None;
        self.over_lane = None;
    }

    /// Interprets a drop on `lane`. Clears the drag state either way.
    pub fn drop_on(&mut self, lane: Lane, payload: &str) -> Option<MoveIntent> {
        self.drag_end();
        let Some(task_id) = parse_payload(payload) else {
            warn!(lane = %lane, payload, "rejecting drop without a task payload");
            return None;
        };
        debug!(task_id, lane = %lane, "drop accepted");
        Some(MoveIntent::to_lane(task_id, lane))
    }
}

/// Sends the status change for a drop.
#[tracing::instrument(skip(api), fields(task_id = intent.task_id, status = %intent.new_status))]
pub async fn commit<A: TaskApi>(api: &A, intent: &MoveIntent) -> ApiResult<Task> {
    let task = api.patch_status(intent.task_id, &intent.new_status).await?;
    info!(task_id = task.id, status = %task.status, "task moved");
    Ok(task)
}
