//! Todo JSON API.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use bytes::Bytes;
use todo_store::{NewTodo, Todo};

use crate::error::ServerError;
use crate::state::AppState;

/// Handle GET /todos.
pub(crate) async fn list_todos(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Todo>>, ServerError> {
    Ok(Json(state.db.get_todos()?))
}

/// Handle POST /todos.
pub(crate) async fn create_todo(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Todo>, ServerError> {
    let fields = parse_fields(&body)?;
    let todo = state.db.add_todo(fields)?;
    tracing::debug!(id = todo.id, "Todo created");
    Ok(Json(todo))
}

/// Handle PATCH /todos/{id}.
pub(crate) async fn update_todo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Todo>, ServerError> {
    let id = parse_id(&id)?;
    let NewTodo { label, complete } = parse_fields(&body)?;
    let todo = state.db.update_todo(Todo {
        id,
        label,
        complete,
    })?;
    Ok(Json(todo))
}

/// Handle DELETE /todos/{id}.
///
/// Succeeds whether or not the todo exists.
pub(crate) async fn delete_todo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    let id = parse_id(&id)?;
    state.db.remove_todo(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Parse `{label, complete}` from a request body.
///
/// An empty body or a JSON `null` counts as missing.
fn parse_fields(body: &[u8]) -> Result<NewTodo, ServerError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ServerError::MissingBody);
    }
    serde_json::from_slice::<Option<NewTodo>>(body)
        .map_err(|e| ServerError::InvalidBody(e.to_string()))?
        .ok_or(ServerError::MissingBody)
}

fn parse_id(raw: &str) -> Result<u64, ServerError> {
    raw.parse()
        .map_err(|_| ServerError::InvalidId(raw.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_fields() {
        let fields = parse_fields(br#"{"label":"Buy milk","complete":true}"#).unwrap();
        assert_eq!(
            fields,
            NewTodo {
                label: "Buy milk".to_owned(),
                complete: true,
            }
        );
    }

    #[test]
    fn test_parse_fields_missing() {
        assert!(matches!(parse_fields(b""), Err(ServerError::MissingBody)));
        assert!(matches!(parse_fields(b"  \n"), Err(ServerError::MissingBody)));
        assert!(matches!(parse_fields(b"null"), Err(ServerError::MissingBody)));
    }

    #[test]
    fn test_parse_fields_invalid() {
        assert!(matches!(
            parse_fields(br#"{"label":1}"#),
            Err(ServerError::InvalidBody(_))
        ));
        assert!(matches!(
            parse_fields(b"not json"),
            Err(ServerError::InvalidBody(_))
        ));
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert!(matches!(parse_id("abc"), Err(ServerError::InvalidId(id)) if id == "abc"));
        assert!(matches!(parse_id("-1"), Err(ServerError::InvalidId(_))));
    }
}
