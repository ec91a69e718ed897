use std::io::{self, IsTerminal, Write};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tasky_shared::{Lane, PriorityCode, StatusCode, Task, TaskId};
use unicode_width::UnicodeWidthStr;

use crate::drag::payload_for;
use crate::store::LaneSnapshot;

/// Colour family applied to a status or priority badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Blue,
    Green,
    Red,
    Yellow,
}

impl Tone {
    pub fn css_class(self) -> &'static str {
        match self {
            Tone::Blue => "bg-blue-200 text-blue-900",
            Tone::Green => "bg-green-200 text-green-900",
            Tone::Red => "bg-red-200 text-red-900",
            Tone::Yellow => "bg-yellow-200 text-yellow-900",
        }
    }

    fn ansi_code(self) -> &'static str {
        match self {
            Tone::Blue => "34",
            Tone::Green => "32",
            Tone::Red => "31",
            Tone::Yellow => "33",
        }
    }
}

pub fn status_tone(status: &StatusCode) -> Option<Tone> {
    match status {
        StatusCode::InProgress => Some(Tone::Blue),
        StatusCode::Completed => Some(Tone::Green),
        StatusCode::Overdue => Some(Tone::Red),
        StatusCode::Other(_) => None,
    }
}

pub fn priority_tone(priority: &PriorityCode) -> Option<Tone> {
    match priority {
        PriorityCode::High => Some(Tone::Red),
        PriorityCode::Medium => Some(Tone::Yellow),
        PriorityCode::Low => Some(Tone::Green),
        PriorityCode::Other(_) => None,
    }
}

/// Display projection of one task card.
#[derive(Debug, Clone, PartialEq)]
pub struct CardView {
    pub id: TaskId,
    pub lane: Option<Lane>,
    pub title: String,
    pub description: String,
    pub category: String,
    pub status_code: String,
    pub status_label: String,
    pub priority_label: String,
    pub due_date_label: String,
    pub due_time_label: String,
    pub status_tone: Option<Tone>,
    pub priority_tone: Option<Tone>,
    /// Drag payload identifying this card (`task:<id>`).
    pub drag_payload: String,
}

impl CardView {
    /// `data-*` attributes carried by the rendered element.
    pub fn data_attributes(&self) -> [(&'static str, String); 2] {
        [
            ("data-id", self.id.to_string()),
            ("data-status", self.status_code.clone()),
        ]
    }
}

/// One fully redrawn lane.
#[derive(Debug, Clone, PartialEq)]
pub struct LaneView {
    pub lane: Lane,
    pub heading: &'static str,
    pub count_label: String,
    pub cards: Vec<CardView>,
}

#[derive(Debug, Clone)]
pub struct Renderer {
    timezone: Tz,
    color: bool,
}

impl Renderer {
    pub fn new(timezone: Tz) -> Self {
        Self {
            timezone,
            color: true,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Short date (`5 Jan`) and 12-hour time (`3:30 PM`) in the display
    /// timezone.
    pub fn format_due(&self, due: DateTime<Utc>) -> (String, String) {
        let local = due.with_timezone(&self.timezone);
        (
            local.format("%-d %b").to_string(),
            local.format("%-I:%M %p").to_string(),
        )
    }

    pub fn card(&self, task: &Task, lane: Option<Lane>) -> CardView {
        let (due_date_label, due_time_label) = self.format_due(task.due_date);
        CardView {
            id: task.id,
            lane,
            title: task.title.clone(),
            description: task.description.clone(),
            category: task.category.clone(),
            status_code: task.status.code().to_string(),
            status_label: task.status.label().to_string(),
            priority_label: task.priority.label().to_string(),
            due_date_label,
            due_time_label,
            status_tone: status_tone(&task.status),
            priority_tone: priority_tone(&task.priority),
            drag_payload: payload_for(task.id),
        }
    }

    pub fn lane_view(&self, lane: Lane, snapshot: Option<&LaneSnapshot>) -> LaneView {
        let (count, cards) = match snapshot {
            Some(snapshot) => (
                snapshot.count,
                snapshot
                    .tasks
                    .iter()
                    .map(|task| self.card(task, Some(lane)))
                    .collect(),
            ),
            None => (0, Vec::new()),
        };
        LaneView {
            lane,
            heading: lane.title(),
            count_label: format!("({count})"),
            cards,
        }
    }

    pub fn search_view(&self, tasks: &[&Task]) -> Vec<CardView> {
        tasks.iter().map(|task| self.card(task, task.lane())).collect()
    }

    #[tracing::instrument(skip(self, lanes, writer))]
    pub fn write_board<W: Write>(&self, mut writer: W, lanes: &[LaneView]) -> anyhow::Result<()> {
        for (idx, lane) in lanes.iter().enumerate() {
            if idx > 0 {
                writeln!(writer)?;
            }
            writeln!(writer, "{} {}", lane.heading, lane.count_label)?;
            if lane.cards.is_empty() {
                writeln!(writer, "  No tasks")?;
                continue;
            }
            self.write_cards(&mut writer, &lane.cards)?;
        }
        Ok(())
    }

    pub fn write_cards<W: Write>(&self, writer: W, cards: &[CardView]) -> anyhow::Result<()> {
        let headers = vec![
            "ID".to_string(),
            "Priority".to_string(),
            "Due".to_string(),
            "Category".to_string(),
            "Status".to_string(),
            "Title".to_string(),
        ];

        let rows = cards
            .iter()
            .map(|card| {
                vec![
                    card.id.to_string(),
                    self.paint(&card.priority_label, card.priority_tone),
                    format!("{} {}", card.due_date_label, card.due_time_label),
                    card.category.clone(),
                    self.paint(&card.status_label, card.status_tone),
                    card.title.clone(),
                ]
            })
            .collect();

        write_table(writer, headers, rows)
    }

    pub fn print_board(&self, lanes: &[LaneView]) -> anyhow::Result<()> {
        self.write_board(io::stdout().lock(), lanes)
    }

    pub fn print_cards(&self, cards: &[CardView]) -> anyhow::Result<()> {
        if cards.is_empty() {
            writeln!(io::stdout().lock(), "No matching tasks")?;
            return Ok(());
        }
        self.write_cards(io::stdout().lock(), cards)
    }

    #[tracing::instrument(skip(self, task, writer), fields(task_id = task.id))]
    pub fn write_task_info<W: Write>(&self, mut writer: W, task: &Task) -> anyhow::Result<()> {
        let (date, time) = self.format_due(task.due_date);
        writeln!(writer, "id        {}", task.id)?;
        writeln!(writer, "title     {}", task.title)?;
        writeln!(writer, "desc      {}", task.description)?;
        writeln!(
            writer,
            "status    {}",
            self.paint(task.status.label(), status_tone(&task.status))
        )?;
        writeln!(
            writer,
            "priority  {}",
            self.paint(task.priority.label(), priority_tone(&task.priority))
        )?;
        writeln!(writer, "category  {}", task.category)?;
        writeln!(writer, "due       {date} {time}")?;
        writeln!(writer, "due (utc) {}", task.due_date.format("%Y-%m-%dT%H:%M:%SZ"))?;
        if let Some(owner) = task.assigned_to {
            writeln!(writer, "assignee  {owner}")?;
        }
        Ok(())
    }

    pub fn print_task_info(&self, task: &Task) -> anyhow::Result<()> {
        self.write_task_info(io::stdout().lock(), task)
    }

    fn paint(&self, text: &str, tone: Option<Tone>) -> String {
        let Some(tone) = tone else {
            return text.to_string();
        };
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{}m{text}\x1b[0m", tone.ansi_code())
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for (idx, header) in headers.iter().enumerate() {
        write!(writer, "  {:width$}", header, width = widths[idx])?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "  {:-<width$}", "", width = *width)?;
    }
    writeln!(writer)?;

    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "  {}{}", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn task(status: &str, priority: &str) -> Task {
        Task {
            id: 3,
            title: "Pay rent".to_string(),
            description: "before the 5th".to_string(),
            status: StatusCode::from(status),
            priority: PriorityCode::from(priority),
            due_date: Utc
                .with_ymd_and_hms(2024, 1, 5, 15, 30, 0)
                .single()
                .expect("valid due"),
            category: "home".to_string(),
            assigned_to: Some(1),
        }
    }

    #[test]
    fn due_date_formats_as_short_date_and_twelve_hour_time() {
        let renderer = Renderer::new(Tz::UTC);
        let (date, time) = renderer.format_due(task("IP", "HI").due_date);
        assert_eq!(date, "5 Jan");
        assert_eq!(time, "3:30 PM");
        assert!(time.ends_with("PM"));
    }

    #[test]
    fn display_timezone_shifts_clock_and_meridiem() {
        let renderer = Renderer::new(chrono_tz::Asia::Tokyo);
        let (date, time) = renderer.format_due(task("IP", "HI").due_date);
        assert_eq!(date, "6 Jan");
        assert_eq!(time, "12:30 AM");
    }

    #[test]
    fn card_carries_labels_classes_and_identity() {
        let renderer = Renderer::new(Tz::UTC);
        let card = renderer.card(&task("CO", "ME"), Some(Lane::Completed));
        assert_eq!(card.status_label, "Completed");
        assert_eq!(card.priority_label, "Medium");
        assert_eq!(card.status_tone, Some(Tone::Green));
        assert_eq!(card.priority_tone, Some(Tone::Yellow));
        assert_eq!(card.drag_payload, "task:3");
        assert_eq!(
            card.data_attributes(),
            [
                ("data-id", "3".to_string()),
                ("data-status", "CO".to_string())
            ]
        );
    }

    #[test]
    fn unknown_codes_render_raw_without_tone() {
        let renderer = Renderer::new(Tz::UTC);
        let card = renderer.card(&task("ZZ", "QQ"), None);
        assert_eq!(card.status_label, "ZZ");
        assert_eq!(card.priority_label, "QQ");
        assert_eq!(card.status_tone, None);
        assert_eq!(card.priority_tone, None);
    }

    #[test]
    fn board_output_lists_each_lane_with_count() {
        let renderer = Renderer::new(Tz::UTC).with_color(false);
        let snapshot = LaneSnapshot {
            count: 1,
            tasks: vec![task("IP", "LO")],
        };
        let lanes = vec![
            renderer.lane_view(Lane::InProgress, Some(&snapshot)),
            renderer.lane_view(Lane::Completed, None),
        ];

        let mut out = Vec::new();
        renderer.write_board(&mut out, &lanes).expect("write board");
        let text = String::from_utf8(out).expect("utf8");

        assert!(text.contains("In Progress (1)"));
        assert!(text.contains("Pay rent"));
        assert!(text.contains("5 Jan 3:30 PM"));
        assert!(text.contains("Completed (0)"));
        assert!(text.contains("No tasks"));
    }
}
