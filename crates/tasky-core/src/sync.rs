use chrono::{DateTime, Utc};
use tasky_shared::{StatusCode, Task, TaskId};
use tracing::{info, warn};

use crate::api::TaskApi;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    pub corrected: Vec<TaskId>,
    pub failed: Vec<(TaskId, String)>,
}

impl SyncOutcome {
    /// A reload is due once any task changed lanes.
    pub fn needs_reload(&self) -> bool {
        !self.corrected.is_empty()
    }
}

/// In-progress tasks whose due date is already behind `now`.
pub fn stale_tasks(tasks: &[Task], now: DateTime<Utc>) -> Vec<&Task> {
    tasks.iter().filter(|task| task.is_stale(now)).collect()
}

/// Patches every stale task in `tasks` to overdue. Failures are logged and
/// left for the next pass.
#[tracing::instrument(skip(api, tasks), fields(candidates = tasks.len()))]
pub async fn correct_overdue<A: TaskApi>(api: &A, tasks: &[Task], now: DateTime<Utc>) -> SyncOutcome {
    let mut outcome = SyncOutcome::default();
    for task in stale_tasks(tasks, now) {
        match api.patch_status(task.id, &StatusCode::Overdue).await {
            Ok(_) => {
                info!(task_id = task.id, due = %task.due_date, "marked overdue");
                outcome.corrected.push(task.id);
            }
            Err(err) => {
                warn!(task_id = task.id, error = %err, "failed marking task overdue");
                outcome.failed.push((task.id, err.to_string()));
            }
        }
    }
    outcome
}
