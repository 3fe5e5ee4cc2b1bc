//! Data Transfer Objects - request/response types for the API.

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A scalar rendered as text. Numbers and booleans keep their JSON spelling,
/// so `"title": 123` validates as the title `"123"`.
fn scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(D::Error::custom(format!(
            "invalid type: {other}, expected a string"
        ))),
    }
}

/// Like [`scalar_text`], but an explicit `null` is `Some(None)` while an
/// absent field stays `None`.
fn scalar_text_or_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    scalar_text(deserializer).map(Some)
}

/// Any JSON value kept as raw text; range and type checks happen during
/// validation so they report against the field.
fn raw_value<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

/// Request to register a new user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Request to login.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Identity plus a freshly issued bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub email: String,
    pub token: String,
}

/// A user's public information.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/todos`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoRequest {
    #[serde(default, deserialize_with = "scalar_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub due_date: Option<String>,
    #[serde(default, deserialize_with = "raw_value")]
    pub priority: Option<String>,
}

/// Body of `PUT /api/todos/{id}`. Absent fields are left unchanged;
/// `"dueDate": null` clears the due date and `"title": null` is rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoRequest {
    #[serde(
        default,
        deserialize_with = "scalar_text_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub description: Option<String>,
    pub completed: Option<bool>,
    #[serde(
        default,
        deserialize_with = "scalar_text_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "raw_value")]
    pub priority: Option<String>,
}

/// Query string of `GET /api/todos`. Values are kept raw; the server
/// decides how to interpret them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TodoQuery {
    pub completed: Option<String>,
    pub priority: Option<String>,
    pub search: Option<String>,
}

/// A todo as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: i16,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_distinguishes_null_from_absent() {
        let absent: UpdateTodoRequest = serde_json::from_str(r#"{"completed": true}"#).unwrap();
        assert_eq!(absent.due_date, None);
        assert_eq!(absent.completed, Some(true));

        let cleared: UpdateTodoRequest = serde_json::from_str(r#"{"dueDate": null}"#).unwrap();
        assert_eq!(cleared.due_date, Some(None));

        let set: UpdateTodoRequest =
            serde_json::from_str(r#"{"dueDate": "2030-01-01"}"#).unwrap();
        assert_eq!(set.due_date, Some(Some("2030-01-01".to_string())));
    }

    #[test]
    fn test_loose_scalars_reach_validation() {
        let req: CreateTodoRequest =
            serde_json::from_str(r#"{"title": 123, "priority": 2.0}"#).unwrap();
        assert_eq!(req.title.as_deref(), Some("123"));
        assert_eq!(req.priority.as_deref(), Some("2.0"));

        let req: CreateTodoRequest =
            serde_json::from_str(r#"{"title": "Shop", "priority": ["high"]}"#).unwrap();
        assert_eq!(req.priority.as_deref(), Some(r#"["high"]"#));

        let nested: Result<CreateTodoRequest, _> =
            serde_json::from_str(r#"{"title": {"text": "Shop"}}"#);
        assert!(nested.is_err());
    }

    #[test]
    fn test_update_title_null_is_kept() {
        let req: UpdateTodoRequest = serde_json::from_str(r#"{"title": null}"#).unwrap();
        assert_eq!(req.title, Some(None));

        let req: UpdateTodoRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.title, None);
    }

    #[test]
    fn test_todo_response_uses_wire_names() {
        let todo = TodoResponse {
            id: "abc".into(),
            title: "Title".into(),
            description: String::new(),
            completed: false,
            due_date: None,
            priority: 3,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&todo).unwrap();
        assert!(value.get("_id").is_some());
        assert!(value.get("createdAt").is_some());
        assert!(value.get("dueDate").is_some());
    }
}
