use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::LocalBoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use parking_lot::Mutex;
use tasky_shared::{Lane, LanePage, Task};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::{ApiError, ApiResult, TaskApi};
use crate::query::LaneQuery;

/// Hands out one cancellation token per reload; issuing a new one cancels the
/// previous, so responses of a superseded reload are dropped.
#[derive(Debug, Clone, Default)]
pub struct ReloadGate {
    current: Arc<Mutex<Option<CancellationToken>>>,
}

impl ReloadGate {
    pub fn begin(&self) -> CancellationToken {
        let mut current = self.current.lock();
        if let Some(previous) = current.take() {
            previous.cancel();
        }
        let token = CancellationToken::new();
        *current = Some(token.clone());
        token
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaneSnapshot {
    pub count: u64,
    pub tasks: Vec<Task>,
}

impl From<LanePage> for LaneSnapshot {
    fn from(page: LanePage) -> Self {
        Self {
            count: page.count,
            tasks: page.tasks,
        }
    }
}

/// Result of one reload of the board.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshReport {
    pub applied: Vec<Lane>,
    pub failed: Vec<(Lane, String)>,
    pub search_list_failed: Option<String>,
    /// Set when a newer reload superseded this one.
    pub cancelled: bool,
}

impl RefreshReport {
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.failed.is_empty() && self.search_list_failed.is_none()
    }

    /// True when this reload overwrote `lane` and was not superseded, so the
    /// lane holds what the service answered just now.
    pub fn is_fresh(&self, lane: Lane) -> bool {
        !self.cancelled && self.applied.contains(&lane)
    }
}

/// Everything one reload fetched, before it is applied.
#[derive(Debug, Clone)]
pub struct BoardFetch {
    pub lanes: Vec<(Lane, ApiResult<LanePage>)>,
    pub all: ApiResult<Vec<Task>>,
}

enum Fetched {
    Lane(Lane, ApiResult<LanePage>),
    All(ApiResult<Vec<Task>>),
}

fn fetch_futures<'a, A: TaskApi>(
    api: &'a A,
    query: &'a LaneQuery,
) -> FuturesUnordered<LocalBoxFuture<'a, Fetched>> {
    let pending = FuturesUnordered::new();
    for lane in Lane::ALL {
        pending.push(
            async move { Fetched::Lane(lane, api.list_by_status(lane, query).await) }.boxed_local(),
        );
    }
    pending.push(async move { Fetched::All(api.list_all().await) }.boxed_local());
    pending
}

/// Issues the three lane listings and the full listing without awaiting each
/// other and collects the responses.
pub async fn fetch_board<A: TaskApi>(api: &A, query: &LaneQuery) -> BoardFetch {
    let mut pending = fetch_futures(api, query);
    let mut lanes = Vec::with_capacity(Lane::ALL.len());
    let mut all = None;
    while let Some(fetched) = pending.next().await {
        match fetched {
            Fetched::Lane(lane, result) => lanes.push((lane, result)),
            Fetched::All(result) => all = Some(result),
        }
    }
    BoardFetch {
        lanes,
        all: all.unwrap_or_else(|| Ok(Vec::new())),
    }
}

/// Most recently fetched contents of each lane plus the unfiltered list used
/// by client-side search. Every refresh overwrites; nothing is merged.
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    lanes: BTreeMap<Lane, LaneSnapshot>,
    all: Vec<Task>,
    gate: ReloadGate,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gate(&self) -> ReloadGate {
        self.gate.clone()
    }

    pub fn lane(&self, lane: Lane) -> Option<&LaneSnapshot> {
        self.lanes.get(&lane)
    }

    pub fn lane_tasks(&self, lane: Lane) -> &[Task] {
        self.lanes
            .get(&lane)
            .map(|snapshot| snapshot.tasks.as_slice())
            .unwrap_or_default()
    }

    pub fn all_tasks(&self) -> &[Task] {
        &self.all
    }

    pub fn replace_lane(&mut self, lane: Lane, page: LanePage) {
        debug!(lane = %lane, count = page.count, shown = page.tasks.len(), "replacing lane");
        self.lanes.insert(lane, page.into());
    }

    pub fn replace_all_tasks(&mut self, tasks: Vec<Task>) {
        debug!(count = tasks.len(), "replacing search list");
        self.all = tasks;
    }

    /// Applies one lane response unless `token` was cancelled. A failed
    /// response leaves the lane's previous contents in place.
    pub fn apply_lane(
        &mut self,
        token: &CancellationToken,
        lane: Lane,
        result: ApiResult<LanePage>,
        report: &mut RefreshReport,
    ) {
        if token.is_cancelled() {
            debug!(lane = %lane, "dropping lane response from superseded reload");
            report.cancelled = true;
            return;
        }
        match result {
            Ok(page) => {
                self.replace_lane(lane, page);
                report.applied.push(lane);
            }
            Err(err) => {
                warn!(lane = %lane, error = %err, "lane refresh failed; keeping previous contents");
                report.failed.push((lane, err.to_string()));
            }
        }
    }

    pub fn apply_all_tasks(
        &mut self,
        token: &CancellationToken,
        result: ApiResult<Vec<Task>>,
        report: &mut RefreshReport,
    ) {
        if token.is_cancelled() {
            report.cancelled = true;
            return;
        }
        match result {
            Ok(tasks) => self.replace_all_tasks(tasks),
            Err(err) => {
                warn!(error = %err, "search list refresh failed");
                report.search_list_failed = Some(err.to_string());
            }
        }
    }

    pub fn apply_fetch(&mut self, token: &CancellationToken, fetch: BoardFetch) -> RefreshReport {
        let mut report = RefreshReport::default();
        for (lane, result) in fetch.lanes {
            self.apply_lane(token, lane, result, &mut report);
        }
        self.apply_all_tasks(token, fetch.all, &mut report);
        report
    }

    #[tracing::instrument(skip(self, api, query), fields(lane = %lane))]
    pub async fn refresh_lane<A: TaskApi>(
        &mut self,
        api: &A,
        lane: Lane,
        query: &LaneQuery,
    ) -> Result<(), ApiError> {
        let page = api.list_by_status(lane, query).await?;
        self.replace_lane(lane, page);
        Ok(())
    }

    /// Reloads all three lanes and the search list. Each response is applied
    /// as it arrives; none is applied once a newer reload has begun.
    #[tracing::instrument(skip_all)]
    pub async fn refresh_all<A: TaskApi>(&mut self, api: &A, query: &LaneQuery) -> RefreshReport {
        let token = self.gate.begin();
        let mut report = RefreshReport::default();
        let mut pending = fetch_futures(api, query);
        while let Some(fetched) = pending.next().await {
            match fetched {
                Fetched::Lane(lane, result) => self.apply_lane(&token, lane, result, &mut report),
                Fetched::All(result) => self.apply_all_tasks(&token, result, &mut report),
            }
        }
        info!(
            applied = report.applied.len(),
            failed = report.failed.len(),
            cancelled = report.cancelled,
            "board reloaded"
        );
        report
    }
}
