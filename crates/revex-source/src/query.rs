use chrono::{DateTime, Duration, Utc};

/// The caller's item selection: a project plus an optional base predicate
/// in the remote system's query language. The default selects every item
/// in the project.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemQuery {
    pub project: String,
    pub base: Option<String>,
}

impl ItemQuery {
    pub fn for_project(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            base: None,
        }
    }

    pub fn with_base(project: impl Into<String>, base: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            base: Some(base.into()),
        }
    }

    /// The literal query text. Doubles as the count-cache key: no
    /// normalization, so any textual variation is a different cache entry.
    pub fn text(&self) -> String {
        match &self.base {
            Some(base) => base.clone(),
            None => format!(
                "SELECT * FROM WorkItems WHERE [System.TeamProject] = '{}'",
                self.project
            ),
        }
    }

    /// Restrict the base query to a creation-date window `[from, until)`.
    pub fn windowed(&self, from: DateTime<Utc>, until: DateTime<Utc>) -> WindowedQuery {
        let text = format!(
            "{} AND [System.CreatedDate] >= '{}' AND [System.CreatedDate] < '{}'",
            self.text(),
            from.to_rfc3339(),
            until.to_rfc3339()
        );
        WindowedQuery {
            text,
            created_from: from,
            created_until: until,
        }
    }
}

/// A base query bounded to one creation-date window. Sources that speak the
/// remote query language use `text`; in-process sources filter on the
/// structured bounds directly.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowedQuery {
    pub text: String,
    pub created_from: DateTime<Utc>,
    pub created_until: DateTime<Utc>,
}

impl WindowedQuery {
    pub fn window_size(&self) -> Duration {
        self.created_until - self.created_from
    }

    pub fn contains(&self, created: DateTime<Utc>) -> bool {
        self.created_from <= created && created < self.created_until
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_query_selects_whole_project() {
        let query = ItemQuery::for_project("Phoenix");
        assert_eq!(
            query.text(),
            "SELECT * FROM WorkItems WHERE [System.TeamProject] = 'Phoenix'"
        );
    }

    #[test]
    fn test_windowed_query_bounds_are_half_open() {
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let until = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let windowed = ItemQuery::for_project("Phoenix").windowed(from, until);

        assert!(windowed.contains(from));
        assert!(!windowed.contains(until));
        assert_eq!(windowed.window_size(), Duration::days(31));
    }

    #[test]
    fn test_base_predicate_is_kept_verbatim() {
        let query = ItemQuery::with_base(
            "Phoenix",
            "SELECT * FROM WorkItems WHERE [System.WorkItemType] = 'Bug'",
        );
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let until = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();

        assert!(
            query
                .windowed(from, until)
                .text
                .starts_with("SELECT * FROM WorkItems WHERE [System.WorkItemType] = 'Bug' AND")
        );
    }
}
