//! Shared in-memory state container.
//!
//! `Store` is a cheap cloneable handle; repositories hold one each the same
//! way they would hold a connection pool. Mutations take the write lock, finish,
//! drop the guard and then publish a `StoreEvent` to every subscriber.

pub mod store_events;

pub use store_events::StoreEvent;

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::{chat::chat_models::Chat, user::user_models::User};

#[derive(Debug, Default)]
pub struct StoreState {
    /// Insertion order is the directory order.
    pub users: Vec<User>,
    pub current_user_id: Option<Uuid>,
    pub chats: Vec<Chat>,
}

impl StoreState {
    pub fn user(&self, user_id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.id == user_id)
    }

    pub fn user_mut(&mut self, user_id: Uuid) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.id == user_id)
    }

    pub fn chat(&self, chat_id: Uuid) -> Option<&Chat> {
        self.chats.iter().find(|c| c.id == chat_id)
    }

    pub fn chat_mut(&mut self, chat_id: Uuid) -> Option<&mut Chat> {
        self.chats.iter_mut().find(|c| c.id == chat_id)
    }
}

/// Point-in-time copy of everything a front end renders.
#[derive(Debug, Clone, Serialize)]
pub struct StoreSnapshot {
    pub users: Vec<User>,
    pub current_user: Option<User>,
    pub chats: Vec<Chat>,
}

#[derive(Clone)]
pub struct Store {
    state: Arc<RwLock<StoreState>>,
    events: broadcast::Sender<StoreEvent>,
}

impl Store {
    pub fn new(event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            state: Arc::new(RwLock::new(StoreState::default())),
            events,
        }
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().await
    }

    /// Publish a change. Having no subscribers is not an error.
    pub fn publish(&self, event: StoreEvent) {
        tracing::debug!(event = event.kind(), "store changed");
        let _ = self.events.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        let state = self.read().await;
        StoreSnapshot {
            users: state.users.clone(),
            current_user: state
                .current_user_id
                .and_then(|id| state.user(id).cloned()),
            chats: state.chats.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::store_events::CurrentUserPayload;

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let store = Store::new(8);
        let mut rx = store.subscribe();

        store.publish(StoreEvent::CurrentUserChanged(CurrentUserPayload { user_id: None }));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind(), "current_user_changed");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_silent() {
        let store = Store::new(8);
        store.publish(StoreEvent::CurrentUserChanged(CurrentUserPayload { user_id: None }));
    }

    #[tokio::test]
    async fn test_snapshot_resolves_current_user() {
        let store = Store::new(8);
        let user = User::new("alice_dev", "+71234567890", "Alice");
        {
            let mut state = store.write().await;
            state.users.push(user.clone());
            state.current_user_id = Some(user.id);
        }

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.users.len(), 1);
        assert_eq!(snapshot.current_user, Some(user));
        assert!(snapshot.chats.is_empty());
    }
}
