use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SubsecRound, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{ValidationErrors, char_len};

pub const TITLE_MIN_LEN: usize = 3;
pub const TITLE_MAX_LEN: usize = 100;
pub const DESCRIPTION_MAX_LEN: usize = 500;

const PRIORITY_MESSAGE: &str = "Priority must be 1 (High), 2 (Medium) or 3 (Low).";

/// Todo priority. Stored and serialized as its integer value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "i16", try_from = "i16")]
pub enum Priority {
    High = 1,
    Medium = 2,
    #[default]
    Low = 3,
}

impl Priority {
    pub fn value(self) -> i16 {
        self as i16
    }

    fn from_value(value: i64) -> Option<Self> {
        match value {
            1 => Some(Self::High),
            2 => Some(Self::Medium),
            3 => Some(Self::Low),
            _ => None,
        }
    }
}

/// Raised when a value is outside {1, 2, 3}.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid priority '{0}': expected 1 (High), 2 (Medium) or 3 (Low)")]
pub struct InvalidPriority(pub String);

impl TryFrom<i64> for Priority {
    type Error = InvalidPriority;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::from_value(value).ok_or_else(|| InvalidPriority(value.to_string()))
    }
}

impl TryFrom<i16> for Priority {
    type Error = InvalidPriority;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        Self::try_from(i64::from(value))
    }
}

impl From<Priority> for i16 {
    fn from(priority: Priority) -> Self {
        priority.value()
    }
}

/// Strict: the trimmed text must be exactly one of `1`, `2` or `3`.
/// `"2abc"` and `"1.5"` are rejected rather than truncated.
impl FromStr for Priority {
    type Err = InvalidPriority;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .ok()
            .and_then(Self::from_value)
            .ok_or_else(|| InvalidPriority(s.to_string()))
    }
}

/// Todo entity - a task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
}

impl Todo {
    /// Create a todo from validated fields with a generated ID.
    ///
    /// `created_at` is truncated to milliseconds so it is stable across a
    /// storage round-trip.
    pub fn new(fields: NewTodo) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: fields.title,
            description: fields.description,
            completed: false,
            due_date: fields.due_date,
            priority: fields.priority,
            created_at: Utc::now().trunc_subsecs(3),
        }
    }

    /// Replace every field present in `update`.
    pub fn apply(&mut self, update: TodoUpdate) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(completed) = update.completed {
            self.completed = completed;
        }
        if let Some(due_date) = update.due_date {
            self.due_date = due_date;
        }
        if let Some(priority) = update.priority {
            self.priority = priority;
        }
    }

    /// Whether this todo satisfies every constraint set on `filter`.
    pub fn matches(&self, filter: &TodoFilter) -> bool {
        if filter.completed.is_some_and(|c| c != self.completed) {
            return false;
        }
        if filter.priority.is_some_and(|p| p != self.priority) {
            return false;
        }
        match filter.search_term() {
            Some(term) => {
                let term = term.to_lowercase();
                self.title.to_lowercase().contains(&term)
                    || self.description.to_lowercase().contains(&term)
            }
            None => true,
        }
    }
}

/// Validated fields for a new todo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    pub title: String,
    pub description: String,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Priority,
}

/// Validated replacement values. `None` leaves the stored field untouched;
/// `due_date: Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub priority: Option<Priority>,
}

/// Raw todo fields as received from a client, before validation.
#[derive(Debug, Clone, Default)]
pub struct TodoFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub due_date: Option<Option<String>>,
    /// Raw value as sent: `2`, `2.0` and `"2"` are all accepted.
    pub priority: Option<String>,
}

impl TodoFields {
    /// Validate fields for creation. `title` is required; `completed` is
    /// ignored because new todos always start open.
    pub fn validate_new(self, today: NaiveDate) -> Result<NewTodo, ValidationErrors> {
        let update = self.check(today, true)?;
        match update.title {
            Some(title) => Ok(NewTodo {
                title,
                description: update.description.unwrap_or_default(),
                due_date: update.due_date.flatten(),
                priority: update.priority.unwrap_or_default(),
            }),
            None => Err(ValidationErrors::single("title", "Title is required.")),
        }
    }

    /// Validate only the fields that are present.
    pub fn validate_update(self, today: NaiveDate) -> Result<TodoUpdate, ValidationErrors> {
        self.check(today, false)
    }

    fn check(self, today: NaiveDate, require_title: bool) -> Result<TodoUpdate, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let title = match self.title.as_deref().map(str::trim) {
            Some("") => {
                errors.add("title", "Title is required.");
                None
            }
            Some(title) if char_len(title) < TITLE_MIN_LEN => {
                errors.add(
                    "title",
                    format!("Title must be at least {TITLE_MIN_LEN} characters."),
                );
                None
            }
            Some(title) if char_len(title) > TITLE_MAX_LEN => {
                errors.add(
                    "title",
                    format!("Title must be at most {TITLE_MAX_LEN} characters."),
                );
                None
            }
            Some(title) => Some(title.to_string()),
            None => {
                if require_title {
                    errors.add("title", "Title is required.");
                }
                None
            }
        };

        let description = self.description.map(|d| d.trim().to_string());
        if description
            .as_deref()
            .is_some_and(|d| char_len(d) > DESCRIPTION_MAX_LEN)
        {
            errors.add(
                "description",
                format!("Description must be at most {DESCRIPTION_MAX_LEN} characters."),
            );
        }

        let due_date = match self.due_date {
            Some(Some(raw)) => match parse_due_date(&raw) {
                Some(date) if date >= start_of_day(today) => Some(Some(date)),
                Some(_) => {
                    errors.add(
                        "dueDate",
                        format!(
                            "{} is not a valid due date. It must be today or a future date.",
                            raw.trim()
                        ),
                    );
                    None
                }
                None => {
                    errors.add("dueDate", format!("{} is not a valid date.", raw.trim()));
                    None
                }
            },
            Some(None) => Some(None),
            None => None,
        };

        let priority = match self.priority.as_deref().map(priority_from_raw) {
            Some(Some(priority)) => Some(priority),
            Some(None) => {
                errors.add("priority", PRIORITY_MESSAGE);
                None
            }
            None => None,
        };

        errors.into_result(TodoUpdate {
            title,
            description,
            completed: self.completed,
            due_date,
            priority,
        })
    }
}

/// Composable listing constraints. `None` means no constraint on that field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoFilter {
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub search: Option<String>,
}

impl TodoFilter {
    /// Search term, if one is set and non-empty.
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.is_empty())
    }
}

/// Any integer-valued number in range, however it was spelled.
fn priority_from_raw(raw: &str) -> Option<Priority> {
    let value: f64 = raw.trim().parse().ok()?;
    if value.fract() != 0.0 {
        return None;
    }
    Priority::from_value(value as i64)
}

/// Accepts `YYYY-MM-DD` (midnight UTC), RFC 3339, or a zoneless
/// `YYYY-MM-DDTHH:MM:SS[.fff]` taken as UTC.
fn parse_due_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(start_of_day(date));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    fn titled(title: &str) -> TodoFields {
        TodoFields {
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_todo_defaults() {
        let fields = titled("  Buy milk  ").validate_new(today()).unwrap();
        let todo = Todo::new(fields);

        assert_eq!(todo.title, "Buy milk");
        assert_eq!(todo.description, "");
        assert!(!todo.completed);
        assert_eq!(todo.priority, Priority::Low);
        assert_eq!(todo.due_date, None);
    }

    #[test]
    fn test_title_rules() {
        let errors = titled("ab").validate_new(today()).unwrap_err();
        assert_eq!(
            errors.message_for("title"),
            Some("Title must be at least 3 characters.")
        );

        let errors = titled("   ").validate_new(today()).unwrap_err();
        assert_eq!(errors.message_for("title"), Some("Title is required."));

        let errors = TodoFields::default().validate_new(today()).unwrap_err();
        assert_eq!(errors.message_for("title"), Some("Title is required."));

        let errors = titled(&"x".repeat(101)).validate_new(today()).unwrap_err();
        assert!(errors.message_for("title").is_some());

        assert!(titled(&"x".repeat(100)).validate_new(today()).is_ok());
    }

    #[test]
    fn test_description_limit() {
        let mut fields = titled("Write report");
        fields.description = Some("d".repeat(501));
        let errors = fields.validate_new(today()).unwrap_err();
        assert!(errors.message_for("description").is_some());
    }

    #[test]
    fn test_priority_rules() {
        let mut fields = titled("Write report");
        fields.priority = Some("4".into());
        let errors = fields.validate_new(today()).unwrap_err();
        assert_eq!(errors.message_for("priority"), Some(PRIORITY_MESSAGE));

        for accepted in ["1", " 1 ", "1.0"] {
            let mut fields = titled("Write report");
            fields.priority = Some(accepted.into());
            assert_eq!(
                fields.validate_new(today()).unwrap().priority,
                Priority::High
            );
        }

        for rejected in ["high", "1.5", "true", "{}", "NaN"] {
            let mut fields = titled("Write report");
            fields.priority = Some(rejected.into());
            let errors = fields.validate_new(today()).unwrap_err();
            assert!(errors.message_for("priority").is_some(), "{rejected}");
        }
    }

    #[test]
    fn test_due_date_today_or_later() {
        let mut fields = titled("Pay rent");
        fields.due_date = Some(Some("2026-03-10".to_string()));
        let new = fields.validate_new(today()).unwrap();
        assert_eq!(new.due_date, Some(start_of_day(today())));

        let mut fields = titled("Pay rent");
        fields.due_date = Some(Some("2026-03-09T23:59:59Z".to_string()));
        let errors = fields.validate_new(today()).unwrap_err();
        assert!(errors.message_for("dueDate").unwrap().contains("future"));

        let mut fields = titled("Pay rent");
        fields.due_date = Some(Some("next tuesday".to_string()));
        let errors = fields.validate_new(today()).unwrap_err();
        assert_eq!(
            errors.message_for("dueDate"),
            Some("next tuesday is not a valid date.")
        );
    }

    #[test]
    fn test_collects_every_failing_field() {
        let fields = TodoFields {
            title: Some("a".into()),
            priority: Some("0".into()),
            due_date: Some(Some("2000-01-01".into())),
            ..Default::default()
        };
        let errors = fields.validate_new(today()).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_update_only_touches_present_fields() {
        let mut todo = Todo::new(titled("Original").validate_new(today()).unwrap());
        todo.due_date = Some(start_of_day(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()));

        let update = TodoFields {
            completed: Some(true),
            ..Default::default()
        }
        .validate_update(today())
        .unwrap();
        todo.apply(update);

        assert!(todo.completed);
        assert_eq!(todo.title, "Original");
        assert!(todo.due_date.is_some());

        let clear = TodoFields {
            due_date: Some(None),
            ..Default::default()
        }
        .validate_update(today())
        .unwrap();
        todo.apply(clear);
        assert_eq!(todo.due_date, None);
    }

    #[test]
    fn test_update_rejects_empty_title() {
        let errors = titled("").validate_update(today()).unwrap_err();
        assert_eq!(errors.message_for("title"), Some("Title is required."));
    }

    #[test]
    fn test_filter_matching() {
        let mut todo = Todo::new(titled("Call ABC Corp").validate_new(today()).unwrap());
        todo.description = "quarterly review".into();

        let search = |s: &str| TodoFilter {
            search: Some(s.into()),
            ..Default::default()
        };
        assert!(todo.matches(&search("abc")));
        assert!(todo.matches(&search("REVIEW")));
        assert!(!todo.matches(&search("xyz")));
        assert!(todo.matches(&search("")));

        let completed = TodoFilter {
            completed: Some(true),
            ..Default::default()
        };
        assert!(!todo.matches(&completed));

        let priority = TodoFilter {
            priority: Some(Priority::Low),
            search: Some("call".into()),
            ..Default::default()
        };
        assert!(todo.matches(&priority));
    }

    #[test]
    fn test_priority_from_str() {
        assert_eq!(" 2 ".parse::<Priority>(), Ok(Priority::Medium));
        assert!("4".parse::<Priority>().is_err());
        assert!("high".parse::<Priority>().is_err());
        assert!("2abc".parse::<Priority>().is_err());
        assert!("1.5".parse::<Priority>().is_err());
    }
}
