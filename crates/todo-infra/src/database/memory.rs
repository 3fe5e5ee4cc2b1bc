//! In-memory repositories - used when the `postgres` feature is off, and by tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use todo_core::domain::{Todo, TodoFilter, User};
use todo_core::error::RepoError;
use todo_core::ports::{BaseRepository, TodoRepository, UserRepository};

/// In-memory user store with the same uniqueness rules as the `users` table.
///
/// Note: Data is lost on process restart.
#[derive(Default)]
pub struct InMemoryUserRepository {
    store: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.store.read().await.get(&id).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let mut store = self.store.write().await;

        if store.contains_key(&user.id) {
            return Err(RepoError::Constraint("users_pkey".to_string()));
        }
        if let Some(existing) = store
            .values()
            .find(|u| u.username == user.username || u.email == user.email)
        {
            let key = if existing.username == user.username {
                "users_username_key"
            } else {
                "users_email_key"
            };
            return Err(RepoError::Constraint(key.to_string()));
        }

        store.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let mut store = self.store.write().await;
        let slot = store.get_mut(&user.id).ok_or(RepoError::NotFound)?;
        *slot = user.clone();
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.store
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let store = self.store.read().await;
        Ok(store.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>, RepoError> {
        let store = self.store.read().await;
        Ok(store
            .values()
            .find(|u| u.username == username || u.email == email)
            .cloned())
    }
}

/// In-memory todo store.
#[derive(Default)]
pub struct InMemoryTodoRepository {
    store: RwLock<HashMap<Uuid, Todo>>,
}

impl InMemoryTodoRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<Todo, Uuid> for InMemoryTodoRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Todo>, RepoError> {
        Ok(self.store.read().await.get(&id).cloned())
    }

    async fn insert(&self, todo: Todo) -> Result<Todo, RepoError> {
        let mut store = self.store.write().await;
        if store.contains_key(&todo.id) {
            return Err(RepoError::Constraint("todos_pkey".to_string()));
        }
        store.insert(todo.id, todo.clone());
        Ok(todo)
    }

    async fn update(&self, todo: Todo) -> Result<Todo, RepoError> {
        let mut store = self.store.write().await;
        let slot = store.get_mut(&todo.id).ok_or(RepoError::NotFound)?;
        *slot = todo.clone();
        Ok(todo)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.store
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl TodoRepository for InMemoryTodoRepository {
    async fn find_all(&self, filter: &TodoFilter) -> Result<Vec<Todo>, RepoError> {
        let store = self.store.read().await;
        let mut todos: Vec<Todo> = store.values().filter(|t| t.matches(filter)).cloned().collect();
        todos.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(todos)
    }
}
