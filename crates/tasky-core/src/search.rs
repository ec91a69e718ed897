use tasky_shared::Task;

/// Case-insensitive substring match over title, description and category.
/// An empty query matches everything.
pub fn filter_tasks<'a>(tasks: &'a [Task], query: &str) -> Vec<&'a Task> {
    let needle = query.trim().to_lowercase();
    tasks
        .iter()
        .filter(|task| {
            needle.is_empty()
                || task.title.to_lowercase().contains(&needle)
                || task.description.to_lowercase().contains(&needle)
                || task.category.to_lowercase().contains(&needle)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tasky_shared::{PriorityCode, StatusCode};

    use super::*;

    fn task(id: u64, title: &str, category: &str) -> Task {
        Task {
            id,
            title: title.to_string(),
            description: String::new(),
            status: StatusCode::InProgress,
            priority: PriorityCode::Low,
            due_date: Utc::now(),
            category: category.to_string(),
            assigned_to: None,
        }
    }

    #[test]
    fn query_matches_title_case_insensitively() {
        let tasks = vec![task(1, "Buy milk", "errands"), task(2, "Pay rent", "home")];
        let found = filter_tasks(&tasks, "RENT");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 2);
    }

    #[test]
    fn query_matches_category_and_blank_query_keeps_all() {
        let tasks = vec![task(1, "Buy milk", "Errands"), task(2, "Pay rent", "home")];
        assert_eq!(filter_tasks(&tasks, "errand")[0].id, 1);
        assert_eq!(filter_tasks(&tasks, "  ").len(), 2);
        assert!(filter_tasks(&tasks, "gym").is_empty());
    }
}
