use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;
use tasky_core::board::{Board, Mutation, Notice, mutate};
use tasky_core::drag::MoveIntent;
use tasky_core::memory::InMemoryTaskApi;
use tasky_core::query::LaneQuery;
use tasky_core::render::Renderer;
use tasky_shared::{Lane, PriorityCode, StatusCode, TaskFields};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
        .single()
        .expect("valid now")
}

fn draft(title: &str, status: StatusCode, due: DateTime<Utc>) -> TaskFields {
    TaskFields {
        title: title.to_string(),
        description: format!("{title} notes"),
        status,
        priority: PriorityCode::Medium,
        due_date: due,
        category: "home".to_string(),
    }
}

fn board(api: &InMemoryTaskApi) -> Board<InMemoryTaskApi> {
    Board::new(api.clone(), Renderer::new(Tz::UTC).with_color(false))
}

fn lane_gets(api: &InMemoryTaskApi) -> Vec<String> {
    let mut paths: Vec<String> = api
        .calls_with_method("GET")
        .into_iter()
        .map(|call| call.path)
        .filter(|path| path != "tasks/")
        .collect();
    paths.sort();
    paths
}

#[tokio::test]
async fn reload_moves_past_due_work_to_overdue() {
    let api = InMemoryTaskApi::new();
    let late = api.seed(draft("Pay rent", StatusCode::InProgress, now() - Duration::hours(2)));
    let fresh = api.seed(draft("Water plants", StatusCode::InProgress, now() + Duration::days(1)));
    let done = api.seed(draft("File taxes", StatusCode::Completed, now() - Duration::days(9)));

    let mut board = board(&api);
    let report = board.reload(now()).await;

    assert_eq!(report.sync.corrected, vec![late.id]);
    assert!(report.resynced);
    assert!(report.refresh.is_complete());

    let in_progress: Vec<u64> = board
        .store()
        .lane_tasks(Lane::InProgress)
        .iter()
        .map(|task| task.id)
        .collect();
    assert_eq!(in_progress, vec![fresh.id]);
    assert_eq!(board.store().lane_tasks(Lane::Overdue)[0].id, late.id);
    assert_eq!(board.store().lane_tasks(Lane::Completed)[0].id, done.id);
    assert!(
        board
            .store()
            .lane_tasks(Lane::InProgress)
            .iter()
            .all(|task| task.due_date >= now())
    );
}

#[tokio::test]
async fn up_to_date_board_reloads_once() {
    let api = InMemoryTaskApi::new();
    api.seed(draft("Water plants", StatusCode::InProgress, now() + Duration::days(1)));

    let mut board = board(&api);
    let report = board.reload(now()).await;

    assert!(!report.resynced);
    assert!(api.calls_with_method("PATCH").is_empty());
    assert_eq!(
        lane_gets(&api),
        vec!["tasks/completed/", "tasks/in_progress/", "tasks/overdue/"]
    );
}

#[tokio::test]
async fn drop_on_completed_lane_patches_once_then_reloads() {
    let api = InMemoryTaskApi::new();
    let task = api.seed(draft("Pay rent", StatusCode::InProgress, now() + Duration::days(3)));
    let mut board = board(&api);
    board.reload(now()).await;
    api.clear_calls();

    board.drag_mut().drag_start(task.id);
    board.drag_mut().drag_over(Lane::Completed);
    let notice = board
        .drop_task(Lane::Completed, &format!("task:{}", task.id), now())
        .await
        .expect("drop accepted");

    assert!(notice.is_success(), "{notice:?}");
    let patches = api.calls_with_method("PATCH");
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].path, format!("tasks/{}/update/", task.id));
    assert_eq!(patches[0].status.as_deref(), Some("CO"));
    assert_eq!(
        lane_gets(&api),
        vec!["tasks/completed/", "tasks/in_progress/", "tasks/overdue/"]
    );
    assert_eq!(board.drag().dragging(), None);
    assert_eq!(board.store().lane_tasks(Lane::Completed)[0].id, task.id);
    assert!(board.store().lane_tasks(Lane::InProgress).is_empty());
}

#[tokio::test]
async fn foreign_payload_is_ignored() {
    let api = InMemoryTaskApi::new();
    let mut board = board(&api);

    let notice = board
        .drop_task(Lane::Overdue, "https://example.test/page", now())
        .await;

    assert_eq!(notice, None);
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn completing_twice_leaves_the_task_completed() {
    let api = InMemoryTaskApi::new();
    let task = api.seed(draft("Pay rent", StatusCode::InProgress, now() + Duration::days(3)));
    let mut board = board(&api);

    let first = board.move_task(task.id, Lane::Completed, now()).await;
    let second = board.move_task(task.id, Lane::Completed, now()).await;

    assert!(first.is_success());
    assert!(second.is_success());
    assert_eq!(api.task(task.id).map(|t| t.status), Some(StatusCode::Completed));
    assert_eq!(board.store().lane(Lane::Completed).map(|l| l.count), Some(1));
}

#[tokio::test]
async fn created_task_reads_back_with_same_fields() {
    let api = InMemoryTaskApi::new();
    let mut board = board(&api);
    let fields = draft("Book dentist", StatusCode::InProgress, now() + Duration::days(2));

    let notice = board.create(&fields, now()).await;
    assert!(notice.is_success());

    let created = board.store().lane_tasks(Lane::InProgress)[0].clone();
    let fetched = board.show(created.id).await.expect("fetch created");
    assert_eq!(fetched.fields(), fields);

    let form = board.edit_form(created.id).await.expect("edit form");
    assert_eq!(form.due_date, "2024-06-03T12:00");
}

#[tokio::test]
async fn duplicate_title_fails_without_reloading() {
    let api = InMemoryTaskApi::new();
    api.seed(draft("Pay rent", StatusCode::InProgress, now() + Duration::days(1)));
    let mut board = board(&api);
    api.clear_calls();

    let notice = board
        .create(&draft("Pay rent", StatusCode::InProgress, now() + Duration::days(5)), now())
        .await;

    assert_eq!(
        notice,
        Notice::Failure("You already have a task with this title.".to_string())
    );
    assert!(api.calls_with_method("GET").is_empty());
    assert_eq!(api.tasks().len(), 1);
}

#[tokio::test]
async fn editing_and_deleting_reload_the_board() {
    let api = InMemoryTaskApi::new();
    let task = api.seed(draft("Pay rent", StatusCode::InProgress, now() + Duration::days(1)));
    let mut board = board(&api);

    let mut changed = task.fields();
    changed.title = "Pay rent early".to_string();
    changed.priority = PriorityCode::High;
    assert!(board.replace(task.id, &changed, now()).await.is_success());
    assert_eq!(board.store().lane_tasks(Lane::InProgress)[0].title, "Pay rent early");

    assert!(board.delete(task.id, now()).await.is_success());
    assert_eq!(board.store().lane(Lane::InProgress).map(|l| l.count), Some(0));

    let missing = board.delete(task.id, now()).await;
    assert_eq!(missing, Notice::Failure("Not found.".to_string()));
}

#[tokio::test]
async fn failed_lane_keeps_previous_cards_while_others_refresh() {
    let api = InMemoryTaskApi::new();
    let ip = api.seed(draft("Pay rent", StatusCode::InProgress, now() + Duration::days(1)));
    let mut board = board(&api);
    board.reload(now()).await;

    api.seed(draft("Wash car", StatusCode::InProgress, now() + Duration::days(1)));
    api.seed(draft("Old chore", StatusCode::Completed, now() - Duration::days(1)));
    api.fail_lane(Lane::InProgress, true);
    let report = board.reload(now()).await;

    assert_eq!(report.refresh.failed.len(), 1);
    assert_eq!(report.refresh.failed[0].0, Lane::InProgress);
    let kept: Vec<u64> = board
        .store()
        .lane_tasks(Lane::InProgress)
        .iter()
        .map(|task| task.id)
        .collect();
    assert_eq!(kept, vec![ip.id]);
    assert_eq!(board.store().lane(Lane::Completed).map(|l| l.count), Some(1));
}

#[tokio::test]
async fn filters_narrow_cards_but_not_counts() {
    let api = InMemoryTaskApi::new();
    api.seed(draft("Pay rent", StatusCode::InProgress, now() + Duration::days(1)));
    let mut urgent = draft("Fix leak", StatusCode::InProgress, now() + Duration::days(2));
    urgent.priority = PriorityCode::High;
    let urgent = api.seed(urgent);

    let mut board = board(&api).with_query(LaneQuery {
        priority: Some(PriorityCode::High),
        ..LaneQuery::default()
    });
    board.reload(now()).await;

    let lane = board.store().lane(Lane::InProgress).expect("lane loaded");
    assert_eq!(lane.count, 2);
    assert_eq!(lane.tasks.len(), 1);
    assert_eq!(lane.tasks[0].id, urgent.id);
    assert!(
        api.calls_with_method("GET")
            .iter()
            .any(|call| call.path == "tasks/in_progress/?priority=HI")
    );

    let views = board.lane_views();
    assert_eq!(views[0].heading, "In Progress");
    assert_eq!(views[0].count_label, "(2)");
}

#[tokio::test]
async fn search_matches_loaded_tasks_case_insensitively() {
    let api = InMemoryTaskApi::new();
    let rent = api.seed(draft("Pay rent", StatusCode::InProgress, now() + Duration::days(1)));
    api.seed(draft("Buy milk", StatusCode::Completed, now() - Duration::days(1)));
    let mut board = board(&api);
    board.reload(now()).await;

    let hits = board.search("RENT");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, rent.id);

    let cards = board.search_views("rent");
    assert_eq!(cards[0].lane, Some(Lane::InProgress));
    assert_eq!(board.search("").len(), 2);

    let remote = board.search_remote("milk").await.expect("remote search");
    assert_eq!(remote.len(), 1);
}

#[tokio::test]
async fn overdue_pass_skips_an_in_progress_lane_that_failed_to_refresh() {
    let api = InMemoryTaskApi::new();
    let task = api.seed(draft("Pay rent", StatusCode::InProgress, now()));
    let mut board = board(&api);
    board.reload(now() - Duration::minutes(1)).await;
    assert_eq!(board.store().lane_tasks(Lane::InProgress)[0].id, task.id);

    api.fail_lane(Lane::InProgress, true);
    api.clear_calls();
    let notice = board
        .move_task(task.id, Lane::Completed, now() + Duration::minutes(1))
        .await;

    assert!(notice.is_success(), "{notice:?}");
    let patched: Vec<Option<String>> = api
        .calls_with_method("PATCH")
        .into_iter()
        .map(|call| call.status)
        .collect();
    assert_eq!(patched, vec![Some("CO".to_string())]);
    assert_eq!(api.task(task.id).map(|t| t.status), Some(StatusCode::Completed));

    let report = board.reload(now() + Duration::minutes(2)).await;
    assert!(!report.refresh.is_fresh(Lane::InProgress));
    assert!(report.sync.corrected.is_empty());
    assert!(!report.resynced);
}

#[tokio::test]
async fn edit_form_shows_due_time_in_the_display_timezone() {
    let api = InMemoryTaskApi::new();
    let due = Utc
        .with_ymd_and_hms(2024, 1, 5, 15, 30, 0)
        .single()
        .expect("valid due");
    let task = api.seed(draft("Pay rent", StatusCode::InProgress, due));
    let board = Board::new(
        api.clone(),
        Renderer::new(chrono_tz::Asia::Tokyo).with_color(false),
    );

    let (date, time) = board.renderer().format_due(due);
    assert_eq!((date.as_str(), time.as_str()), ("6 Jan", "12:30 AM"));

    let form = board.edit_form(task.id).await.expect("edit form");
    assert_eq!(form.due_date, "2024-01-06T00:30");
    assert_eq!(
        tasky_shared::parse_due_input(&form.due_date, &board.renderer().timezone()),
        Some(due)
    );
}

#[tokio::test]
async fn mutate_reports_without_touching_the_board() {
    let api = InMemoryTaskApi::new();
    let task = api.seed(draft("Pay rent", StatusCode::InProgress, now() + Duration::days(1)));
    api.clear_calls();

    let moved = mutate(&api, &Mutation::Move(MoveIntent::to_lane(task.id, Lane::Overdue))).await;
    assert_eq!(moved, Notice::Success("Moved Pay rent to Overdue".to_string()));

    let deleted = mutate(&api, &Mutation::Delete(task.id)).await;
    assert_eq!(deleted, Notice::Success(format!("Deleted task {}", task.id)));

    let missing = mutate(&api, &Mutation::Delete(task.id)).await;
    assert_eq!(missing, Notice::Failure("Not found.".to_string()));
    assert!(api.calls_with_method("GET").is_empty());
}
