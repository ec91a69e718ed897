use std::cell::RefCell;
use std::rc::Rc;

use chrono::Utc;
use tasky_core::query::LaneQuery;
use tasky_core::render::{
  LaneView,
  Renderer
};
use tasky_core::store::{
  RefreshReport,
  ReloadGate,
  TaskStore,
  fetch_board
};
use tasky_core::sync::correct_overdue;
use tasky_shared::{
  Lane,
  Task
};

use crate::api::GlooTaskApi;

/// What the board shows after one
/// completed reload.
pub(crate) struct Loaded {
  pub lanes:     Vec<LaneView>,
  pub all_tasks: Vec<Task>
}

/// Reloads every lane, runs one overdue
/// pass over the in-progress lane and,
/// when it corrected anything, reloads
/// once more. The pass only runs when the
/// in-progress lane was just refreshed.
/// `None` when a newer reload took over.
pub(crate) async fn reload_board(
  api: &GlooTaskApi,
  store: &Rc<RefCell<TaskStore>>,
  query: &LaneQuery,
  renderer: &Renderer
) -> Option<Loaded> {
  let gate = store.borrow().gate();
  let report =
    fetch_and_apply(api, store, &gate, query)
      .await?;

  if report.is_fresh(Lane::InProgress) {
    let in_progress = store
      .borrow()
      .lane_tasks(Lane::InProgress)
      .to_vec();
    let outcome = correct_overdue(
      api,
      &in_progress,
      Utc::now()
    )
    .await;
    if outcome.needs_reload() {
      fetch_and_apply(api, store, &gate, query)
        .await?;
    }
  } else {
    tracing::warn!(
      "in-progress lane not refreshed; \
       skipping overdue pass"
    );
  }

  let store = store.borrow();
  Some(Loaded {
    lanes:     Lane::ALL
      .into_iter()
      .map(|lane| {
        renderer
          .lane_view(lane, store.lane(lane))
      })
      .collect(),
    all_tasks: store.all_tasks().to_vec()
  })
}

/// `None` when a newer reload superseded
/// this one.
async fn fetch_and_apply(
  api: &GlooTaskApi,
  store: &Rc<RefCell<TaskStore>>,
  gate: &ReloadGate,
  query: &LaneQuery
) -> Option<RefreshReport> {
  let token = gate.begin();
  let fetch = fetch_board(api, query).await;
  let report = store
    .borrow_mut()
    .apply_fetch(&token, fetch);
  for (lane, reason) in &report.failed {
    tracing::error!(%lane, reason = %reason, "lane request failed");
  }
  if report.cancelled {
    tracing::debug!(
      "reload superseded by a newer one"
    );
    return None;
  }
  Some(report)
}
