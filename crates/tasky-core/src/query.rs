use serde::{Deserialize, Serialize};
use tasky_shared::PriorityCode;
use url::Url;
use url::form_urlencoded;

/// Filter and sort controls applied to every lane listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneQuery {
    pub priority: Option<PriorityCode>,
    /// Calendar date (`YYYY-MM-DD`) the due date must fall on.
    pub due_date: Option<String>,
    pub category: Option<String>,
    /// Field name, `-` prefixed for descending order.
    pub ordering: Option<String>,
}

impl LaneQuery {
    pub fn is_empty(&self) -> bool {
        self.pairs().is_empty()
    }

    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(priority) = &self.priority {
            pairs.push(("priority", priority.code().to_string()));
        }
        let text_fields = [
            ("due_date", &self.due_date),
            ("category", &self.category),
            ("ordering", &self.ordering),
        ];
        for (key, value) in text_fields {
            if let Some(value) = value.as_deref().map(str::trim)
                && !value.is_empty()
            {
                pairs.push((key, value.to_string()));
            }
        }
        pairs
    }

    /// Encoded query string without the leading `?`; empty when no control is
    /// set.
    pub fn to_query_string(&self) -> String {
        let pairs = self.pairs();
        if pairs.is_empty() {
            return String::new();
        }
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in pairs {
            serializer.append_pair(key, &value);
        }
        serializer.finish()
    }

    pub fn append_to(&self, url: &mut Url) {
        let pairs = self.pairs();
        if pairs.is_empty() {
            return;
        }
        let mut query = url.query_pairs_mut();
        for (key, value) in pairs {
            query.append_pair(key, &value);
        }
    }

    /// Sort key and direction parsed from `ordering`.
    pub fn sort_key(&self) -> Option<(&str, bool)> {
        let raw = self.ordering.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        match raw.strip_prefix('-') {
            Some(field) => Some((field, true)),
            None => Some((raw, false)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_adds_nothing() {
        let query = LaneQuery::default();
        assert!(query.is_empty());
        assert_eq!(query.to_query_string(), "");

        let mut url = Url::parse("http://localhost:8000/tasks/completed/").expect("url");
        query.append_to(&mut url);
        assert_eq!(url.as_str(), "http://localhost:8000/tasks/completed/");
    }

    #[test]
    fn query_string_keeps_control_order() {
        let query = LaneQuery {
            priority: Some(PriorityCode::High),
            due_date: Some("2024-01-05".to_string()),
            category: Some("  ".to_string()),
            ordering: Some("-due_date".to_string()),
        };
        assert_eq!(
            query.to_query_string(),
            "priority=HI&due_date=2024-01-05&ordering=-due_date"
        );
        assert_eq!(query.sort_key(), Some(("due_date", true)));
    }
}
