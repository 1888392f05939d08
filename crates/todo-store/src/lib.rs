//! Todo storage abstraction.
//!
//! This crate provides a [`Database`] trait that decouples the HTTP layer from
//! the underlying todo store, plus an in-memory [`MemoryDatabase`]
//! implementation.
//!
//! # Example
//!
//! ```
//! use todo_store::{Database, MemoryDatabase, NewTodo};
//!
//! let db = MemoryDatabase::new();
//! let todo = db.add_todo(NewTodo { label: "Buy milk".to_owned(), complete: false })?;
//! assert_eq!(todo.id, 1);
//! assert_eq!(db.get_todos()?.len(), 1);
//! # Ok::<(), todo_store::StoreError>(())
//! ```

mod memory;

pub use memory::MemoryDatabase;

use serde::{Deserialize, Serialize};

/// A stored todo item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Store-assigned identifier.
    pub id: u64,
    /// Display text.
    pub label: String,
    /// Whether the item is done.
    pub complete: bool,
}

/// Fields for a todo that has not been stored yet.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct NewTodo {
    pub label: String,
    pub complete: bool,
}

/// Storage error.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No todo with the given id.
    #[error("Todo not found: {0}")]
    NotFound(u64),
    /// Backend failure.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Todo store.
///
/// Calls are synchronous and expected to be cheap; handlers call them directly
/// from async context.
pub trait Database: Send + Sync {
    /// Return all todos ordered by id.
    fn get_todos(&self) -> Result<Vec<Todo>, StoreError>;

    /// Store a new todo and return it with its assigned id.
    fn add_todo(&self, todo: NewTodo) -> Result<Todo, StoreError>;

    /// Replace the fields of an existing todo.
    ///
    /// Returns `StoreError::NotFound` if `todo.id` is unknown.
    fn update_todo(&self, todo: Todo) -> Result<Todo, StoreError>;

    /// Remove a todo. Removing an unknown id is not an error.
    fn remove_todo(&self, id: u64) -> Result<(), StoreError>;
}
