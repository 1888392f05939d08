//! In-memory todo store.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::{Database, NewTodo, StoreError, Todo};

#[derive(Debug, Default)]
struct Inner {
    todos: BTreeMap<u64, Todo>,
    last_id: u64,
}

/// In-memory [`Database`].
///
/// Ids are assigned sequentially starting at 1 and are never reused.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    inner: RwLock<Inner>,
}

impl MemoryDatabase {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `todos`, assigning ids in order.
    #[must_use]
    pub fn with_todos(todos: impl IntoIterator<Item = NewTodo>) -> Self {
        let mut inner = Inner::default();
        for todo in todos {
            inner.insert(todo);
        }
        Self {
            inner: RwLock::new(inner),
        }
    }
}

impl Inner {
    fn insert(&mut self, todo: NewTodo) -> Todo {
        self.last_id += 1;
        let todo = Todo {
            id: self.last_id,
            label: todo.label,
            complete: todo.complete,
        };
        self.todos.insert(todo.id, todo.clone());
        todo
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("lock poisoned".to_owned())
}

impl Database for MemoryDatabase {
    fn get_todos(&self) -> Result<Vec<Todo>, StoreError> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.todos.values().cloned().collect())
    }

    fn add_todo(&self, todo: NewTodo) -> Result<Todo, StoreError> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        Ok(inner.insert(todo))
    }

    fn update_todo(&self, todo: Todo) -> Result<Todo, StoreError> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        let slot = inner
            .todos
            .get_mut(&todo.id)
            .ok_or(StoreError::NotFound(todo.id))?;
        *slot = todo.clone();
        Ok(todo)
    }

    fn remove_todo(&self, id: u64) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        inner.todos.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn new_todo(label: &str) -> NewTodo {
        NewTodo {
            label: label.to_owned(),
            complete: false,
        }
    }

    #[test]
    fn test_add_assigns_sequential_ids() {
        let db = MemoryDatabase::new();

        let first = db.add_todo(new_todo("a")).unwrap();
        let second = db.add_todo(new_todo("b")).unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[test]
    fn test_get_todos_ordered_by_id() {
        let db = MemoryDatabase::with_todos([new_todo("a"), new_todo("b"), new_todo("c")]);

        let labels: Vec<_> = db
            .get_todos()
            .unwrap()
            .into_iter()
            .map(|t| t.label)
            .collect();

        assert_eq!(labels, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_update_replaces_fields() {
        let db = MemoryDatabase::with_todos([new_todo("a")]);

        let updated = db
            .update_todo(Todo {
                id: 1,
                label: "renamed".to_owned(),
                complete: true,
            })
            .unwrap();

        assert_eq!(updated.label, "renamed");
        assert_eq!(db.get_todos().unwrap(), vec![updated]);
    }

    #[test]
    fn test_update_unknown_id_is_not_found() {
        let db = MemoryDatabase::new();

        let err = db
            .update_todo(Todo {
                id: 42,
                label: "x".to_owned(),
                complete: false,
            })
            .unwrap_err();

        assert!(matches!(err, StoreError::NotFound(42)));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let db = MemoryDatabase::with_todos([new_todo("a")]);

        db.remove_todo(1).unwrap();
        db.remove_todo(1).unwrap();
        db.remove_todo(99).unwrap();

        assert!(db.get_todos().unwrap().is_empty());
    }

    #[test]
    fn test_ids_not_reused_after_remove() {
        let db = MemoryDatabase::with_todos([new_todo("a")]);
        db.remove_todo(1).unwrap();

        let todo = db.add_todo(new_todo("b")).unwrap();

        assert_eq!(todo.id, 2);
    }
}
