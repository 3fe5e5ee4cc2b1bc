//! Todo handlers.

use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use todo_core::domain::{Priority, Todo, TodoFields, TodoFilter};
use todo_core::error::RepoError;
use todo_core::ports::BaseRepository;
use todo_shared::MessageResponse;
use todo_shared::dto::{CreateTodoRequest, TodoQuery, TodoResponse, UpdateTodoRequest};

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const TODO_NOT_FOUND: &str = "Todo not found.";
const INVALID_TODO_ID: &str = "Invalid todo ID.";
const INVALID_PRIORITY: &str = "Invalid priority. Use 1 (High), 2 (Medium) or 3 (Low).";

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn parse_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidId(INVALID_TODO_ID.to_string()))
}

fn repo_error(err: RepoError, context: &str) -> AppError {
    match err {
        RepoError::NotFound => AppError::NotFound(TODO_NOT_FOUND.to_string()),
        other => AppError::internal(context, other),
    }
}

fn todo_response(todo: Todo) -> TodoResponse {
    TodoResponse {
        id: todo.id.to_string(),
        title: todo.title,
        description: todo.description,
        completed: todo.completed,
        due_date: todo.due_date,
        priority: todo.priority.value(),
        created_at: todo.created_at,
    }
}

/// Interpret the raw query string. An unparseable priority is rejected here,
/// before any query runs.
fn todo_filter(query: TodoQuery) -> AppResult<TodoFilter> {
    let priority = query
        .priority
        .map(|raw| raw.parse::<Priority>())
        .transpose()
        .map_err(|_| AppError::BadRequest(INVALID_PRIORITY.to_string()))?;

    Ok(TodoFilter {
        completed: query.completed.map(|c| c == "true"),
        priority,
        search: query.search.filter(|s| !s.is_empty()),
    })
}

/// POST /api/todos
pub async fn create(
    state: web::Data<AppState>,
    body: web::Json<CreateTodoRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let fields = TodoFields {
        title: req.title,
        description: req.description,
        completed: None,
        due_date: req.due_date.map(Some),
        priority: req.priority,
    }
    .validate_new(today())?;

    let todo = state
        .todos
        .insert(Todo::new(fields))
        .await
        .map_err(|e| AppError::internal("Internal server error while creating todo.", e))?;

    tracing::debug!(todo_id = %todo.id, "Todo created");

    Ok(HttpResponse::Created().json(todo_response(todo)))
}

/// GET /api/todos?completed=&priority=&search=
pub async fn list(
    state: web::Data<AppState>,
    query: web::Query<TodoQuery>,
) -> AppResult<HttpResponse> {
    let filter = todo_filter(query.into_inner())?;

    let todos = state
        .todos
        .find_all(&filter)
        .await
        .map_err(|e| AppError::internal("Internal server error while listing todos.", e))?;

    let body: Vec<TodoResponse> = todos.into_iter().map(todo_response).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /api/todos/{id}
pub async fn get_by_id(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path)?;

    let todo = state
        .todos
        .find_by_id(id)
        .await
        .map_err(|e| repo_error(e, "Internal server error while fetching todo."))?
        .ok_or_else(|| AppError::NotFound(TODO_NOT_FOUND.to_string()))?;

    Ok(HttpResponse::Ok().json(todo_response(todo)))
}

/// PUT /api/todos/{id}
pub async fn update(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateTodoRequest>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path)?;
    let req = body.into_inner();

    tracing::debug!(todo_id = %id, "Updating todo");

    // `"title": null` reads as an empty title so it fails the required rule.
    let changes = TodoFields {
        title: req.title.map(Option::unwrap_or_default),
        description: req.description,
        completed: req.completed,
        due_date: req.due_date,
        priority: req.priority,
    }
    .validate_update(today())?;

    let mut todo = state
        .todos
        .find_by_id(id)
        .await
        .map_err(|e| repo_error(e, "Internal server error while updating todo."))?
        .ok_or_else(|| AppError::NotFound(TODO_NOT_FOUND.to_string()))?;

    todo.apply(changes);

    let todo = state
        .todos
        .update(todo)
        .await
        .map_err(|e| repo_error(e, "Internal server error while updating todo."))?;

    tracing::debug!(todo_id = %todo.id, completed = todo.completed, "Todo updated");

    Ok(HttpResponse::Ok().json(todo_response(todo)))
}

/// DELETE /api/todos/{id}
pub async fn delete(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path)?;

    state
        .todos
        .delete(id)
        .await
        .map_err(|e| repo_error(e, "Internal server error while deleting todo."))?;

    tracing::debug!(todo_id = %id, "Todo deleted");

    Ok(HttpResponse::Ok().json(MessageResponse::new("Todo deleted successfully.")))
}
