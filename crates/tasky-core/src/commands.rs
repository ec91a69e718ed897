use std::io::{self, Write};

use anyhow::{Context, anyhow, bail};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tasky_shared::{Lane, PriorityCode, StatusCode, TaskFields, parse_due_input};
use tracing::{debug, info, instrument, warn};

use crate::api::TaskApi;
use crate::board::{Board, BoardReport, Notice};
use crate::cli::{Command, EditArgs, TaskArgs};

#[instrument(skip(board, command, now))]
pub async fn dispatch<A: TaskApi>(
    board: &mut Board<A>,
    command: Command,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    debug!(?command, "dispatching");
    match command {
        Command::Board => cmd_board(board, now).await,
        Command::Search { query, remote } => cmd_search(board, &query, remote, now).await,
        Command::Show { id } => {
            let task = board
                .show(id)
                .await
                .map_err(|err| anyhow!(err.banner_text()))?;
            board.renderer().print_task_info(&task)
        }
        Command::Add(args) => {
            let draft = draft_from_args(&args, board.renderer().timezone())?;
            let notice = board.create(&draft, now).await;
            finish(board, notice)
        }
        Command::Edit { id, changes } => {
            let current = board
                .show(id)
                .await
                .map_err(|err| anyhow!(err.banner_text()))?;
            let draft = apply_edits(current.fields(), &changes, board.renderer().timezone())?;
            let notice = board.replace(id, &draft, now).await;
            finish(board, notice)
        }
        Command::Move { id, lane } => {
            let target = Lane::parse(&lane).ok_or_else(|| {
                anyhow!("unknown lane '{lane}', expected one of IP, CO, OV")
            })?;
            let notice = board.move_task(id, target, now).await;
            finish(board, notice)
        }
        Command::Delete { id } => {
            let notice = board.delete(id, now).await;
            finish(board, notice)
        }
        Command::Sync => cmd_sync(board, now).await,
    }
}

async fn cmd_board<A: TaskApi>(board: &mut Board<A>, now: DateTime<Utc>) -> anyhow::Result<()> {
    let report = board.reload(now).await;
    warn_incomplete(&report);
    board.renderer().print_board(&board.lane_views())
}

async fn cmd_search<A: TaskApi>(
    board: &mut Board<A>,
    query: &str,
    remote: bool,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    if remote {
        let found = board
            .search_remote(query)
            .await
            .map_err(|err| anyhow!(err.banner_text()))?;
        let refs: Vec<_> = found.iter().collect();
        let cards = board.renderer().search_view(&refs);
        return board.renderer().print_cards(&cards);
    }

    let report = board.reload(now).await;
    if let Some(reason) = &report.refresh.search_list_failed {
        bail!("could not load the task list for searching: {reason}");
    }
    board.renderer().print_cards(&board.search_views(query))
}

async fn cmd_sync<A: TaskApi>(board: &mut Board<A>, now: DateTime<Utc>) -> anyhow::Result<()> {
    let report = board.reload(now).await;
    warn_incomplete(&report);

    let mut out = io::stdout().lock();
    if report.sync.corrected.is_empty() {
        writeln!(out, "No overdue tasks to correct")?;
    }
    for id in &report.sync.corrected {
        writeln!(out, "Marked task {id} overdue")?;
    }
    for (id, reason) in &report.sync.failed {
        writeln!(out, "Could not mark task {id} overdue: {reason}")?;
    }
    Ok(())
}

fn finish<A: TaskApi>(board: &Board<A>, notice: Notice) -> anyhow::Result<()> {
    if !notice.is_success() {
        return Err(anyhow!(notice.message().to_string()));
    }
    info!(message = notice.message(), "mutation succeeded");
    writeln!(io::stdout().lock(), "{}", notice.message())?;
    board.renderer().print_board(&board.lane_views())
}

fn warn_incomplete(report: &BoardReport) {
    for (lane, reason) in &report.refresh.failed {
        warn!(%lane, reason = %reason, "lane kept its previous contents");
    }
}

/// `raw` is wall-clock time in the display timezone unless it carries an offset.
fn parse_due(raw: &str, zone: Tz) -> anyhow::Result<DateTime<Utc>> {
    parse_due_input(raw, &zone)
        .with_context(|| format!("invalid due date '{raw}', expected YYYY-MM-DDTHH:MM in {zone}"))
}

fn draft_from_args(args: &TaskArgs, zone: Tz) -> anyhow::Result<TaskFields> {
    if args.title.trim().is_empty() {
        bail!("title cannot be empty");
    }
    Ok(TaskFields {
        title: args.title.clone(),
        description: args.description.clone(),
        status: status_arg(&args.status),
        priority: PriorityCode::from(args.priority.trim().to_ascii_uppercase()),
        due_date: parse_due(&args.due, zone)?,
        category: args.category.clone(),
    })
}

fn apply_edits(mut draft: TaskFields, changes: &EditArgs, zone: Tz) -> anyhow::Result<TaskFields> {
    if let Some(title) = &changes.title {
        draft.title = title.clone();
    }
    if let Some(description) = &changes.description {
        draft.description = description.clone();
    }
    if let Some(priority) = &changes.priority {
        draft.priority = PriorityCode::from(priority.trim().to_ascii_uppercase());
    }
    if let Some(due) = &changes.due {
        draft.due_date = parse_due(due, zone)?;
    }
    if let Some(category) = &changes.category {
        draft.category = category.clone();
    }
    if let Some(status) = &changes.status {
        draft.status = status_arg(status);
    }
    Ok(draft)
}

fn status_arg(raw: &str) -> StatusCode {
    Lane::parse(raw)
        .map(Lane::status)
        .unwrap_or_else(|| StatusCode::from(raw.trim()))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn args() -> TaskArgs {
        TaskArgs {
            title: "Pay rent".to_string(),
            description: String::new(),
            priority: "hi".to_string(),
            due: "2024-02-01T09:15".to_string(),
            category: "home".to_string(),
            status: "in_progress".to_string(),
        }
    }

    #[test]
    fn add_arguments_become_a_draft() {
        let draft = draft_from_args(&args(), Tz::UTC).expect("draft");
        assert_eq!(draft.priority, PriorityCode::High);
        assert_eq!(draft.status, StatusCode::InProgress);
        assert_eq!(
            draft.due_date,
            Utc.with_ymd_and_hms(2024, 2, 1, 9, 15, 0)
                .single()
                .expect("valid due")
        );
    }

    #[test]
    fn edits_only_touch_given_fields() {
        let draft = draft_from_args(&args(), Tz::UTC).expect("draft");
        let changes = EditArgs {
            category: Some("bills".to_string()),
            status: Some("done".to_string()),
            ..EditArgs::default()
        };
        let edited = apply_edits(draft.clone(), &changes, Tz::UTC).expect("edit");
        assert_eq!(edited.title, draft.title);
        assert_eq!(edited.category, "bills");
        assert_eq!(edited.status, StatusCode::Completed);
    }

    #[test]
    fn due_argument_is_read_in_the_display_timezone() {
        let draft = draft_from_args(&args(), chrono_tz::Asia::Tokyo).expect("draft");
        assert_eq!(
            draft.due_date,
            Utc.with_ymd_and_hms(2024, 2, 1, 0, 15, 0)
                .single()
                .expect("valid due")
        );
    }

    #[test]
    fn bad_due_date_and_blank_title_are_rejected() {
        let mut bad = args();
        bad.due = "next tuesday".to_string();
        assert!(draft_from_args(&bad, Tz::UTC).is_err());

        let mut blank = args();
        blank.title = "  ".to_string();
        assert!(draft_from_args(&blank, Tz::UTC).is_err());
    }
}
