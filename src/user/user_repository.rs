use chrono::Utc;
use uuid::Uuid;

use super::user_models::{DuplicatePolicy, User};
use crate::{
    error::{AppError, Result},
    store::{
        store_events::{CurrentUserPayload, UserAddedPayload, UserStatusPayload},
        Store, StoreEvent,
    },
};

const DEMO_USERS: &[(&str, &str, &str)] = &[
    ("alexey_petrov", "+79161234567", "Alexey Petrov"),
    ("maria_ivanova", "+79267654321", "Maria Ivanova"),
    ("bob_designer", "+79035550101", "Bob"),
];

#[derive(Clone)]
pub struct UserRepository {
    store: Store,
    policy: DuplicatePolicy,
}

impl UserRepository {
    pub fn new(store: Store, policy: DuplicatePolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    #[cfg(test)]
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Insert a user, honouring the configured duplicate policy.
    pub async fn add_user(&self, user: User) -> Result<User> {
        let replaced = {
            let mut state = self.store.write().await;

            if self.policy == DuplicatePolicy::Reject {
                if state.users.iter().any(|u| u.id == user.id) {
                    return Err(AppError::Conflict(format!("User {} already exists", user.id)));
                }
                if state
                    .users
                    .iter()
                    .any(|u| u.username.eq_ignore_ascii_case(&user.username))
                {
                    return Err(AppError::Conflict("Username is already taken".to_string()));
                }
                if state.users.iter().any(|u| u.phone == user.phone) {
                    return Err(AppError::Conflict(
                        "Phone number is already registered".to_string(),
                    ));
                }
            }

            let before = state.users.len();
            state.users.retain(|u| u.id != user.id);
            let replaced = state.users.len() != before;
            state.users.push(user.clone());
            tracing::debug!(total = state.users.len(), "users in directory");
            replaced
        };

        if replaced {
            tracing::warn!(user_id = %user.id, "Replaced existing user with the same id");
        }

        self.store.publish(StoreEvent::UserAdded(UserAddedPayload {
            user: user.clone(),
            replaced,
        }));

        Ok(user)
    }

    pub async fn create(&self, username: &str, phone: &str, name: &str) -> Result<User> {
        self.add_user(User::new(username, phone, name)).await
    }

    pub async fn find_by_id(&self, user_id: Uuid) -> Option<User> {
        self.store.read().await.user(user_id).cloned()
    }

    pub async fn find_by_phone(&self, phone: &str) -> Option<User> {
        self.store
            .read()
            .await
            .users
            .iter()
            .find(|u| u.phone == phone)
            .cloned()
    }

    pub async fn find_by_username(&self, username: &str) -> Option<User> {
        self.store
            .read()
            .await
            .users
            .iter()
            .find(|u| u.username.eq_ignore_ascii_case(username))
            .cloned()
    }

    pub async fn all(&self) -> Vec<User> {
        self.store.read().await.users.clone()
    }

    /// Returns the updated user, or `None` when the id is unknown.
    pub async fn update_status(&self, user_id: Uuid, is_online: bool) -> Option<User> {
        let user = {
            let mut state = self.store.write().await;
            let user = state.user_mut(user_id)?;
            user.set_presence(is_online, Utc::now());
            user.clone()
        };

        self.store.publish(StoreEvent::UserStatus(UserStatusPayload {
            user_id,
            is_online: user.is_online,
            last_seen: user.last_seen,
        }));

        Some(user)
    }

    /// Marks the user online and makes them current under one write guard, so a
    /// presence pass never sees the user online but not yet current.
    pub async fn start_session(&self, user_id: Uuid) -> Result<User> {
        let user = {
            let mut state = self.store.write().await;
            let user = state
                .user_mut(user_id)
                .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
            user.set_presence(true, Utc::now());
            let user = user.clone();
            state.current_user_id = Some(user_id);
            user
        };

        self.store.publish(StoreEvent::UserStatus(UserStatusPayload {
            user_id,
            is_online: user.is_online,
            last_seen: user.last_seen,
        }));
        self.store.publish(StoreEvent::CurrentUserChanged(CurrentUserPayload {
            user_id: Some(user_id),
        }));

        Ok(user)
    }

    /// One presence pass under a single write guard. `roll` picks the online flag
    /// for every user except the current one; only users whose flag actually
    /// changed are returned and published.
    pub async fn roll_presence<F>(&self, mut roll: F) -> Vec<User>
    where
        F: FnMut(&User) -> bool,
    {
        let changed: Vec<User> = {
            let mut state = self.store.write().await;
            let current = state.current_user_id;
            let now = Utc::now();
            let mut changed = Vec::new();
            for user in state.users.iter_mut() {
                if Some(user.id) == current {
                    continue;
                }
                let online = roll(user);
                if user.is_online != online {
                    user.set_presence(online, now);
                    changed.push(user.clone());
                }
            }
            changed
        };

        for user in &changed {
            self.store.publish(StoreEvent::UserStatus(UserStatusPayload {
                user_id: user.id,
                is_online: user.is_online,
                last_seen: user.last_seen,
            }));
        }

        changed
    }

    pub async fn set_current_user(&self, user_id: Option<Uuid>) -> Result<Option<User>> {
        let user = {
            let mut state = self.store.write().await;
            let user = match user_id {
                Some(id) => Some(
                    state
                        .user(id)
                        .cloned()
                        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?,
                ),
                None => None,
            };
            state.current_user_id = user_id;
            user
        };

        self.store
            .publish(StoreEvent::CurrentUserChanged(CurrentUserPayload { user_id }));

        Ok(user)
    }

    pub async fn current_user_id(&self) -> Option<Uuid> {
        self.store.read().await.current_user_id
    }

    pub async fn current_user(&self) -> Option<User> {
        let state = self.store.read().await;
        state.current_user_id.and_then(|id| state.user(id).cloned())
    }

    /// Directory search in insertion order. Blank queries match nothing.
    pub async fn search(&self, query: &str, exclude: Option<Uuid>) -> Vec<User> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        self.store
            .read()
            .await
            .users
            .iter()
            .filter(|u| Some(u.id) != exclude)
            .filter(|u| u.matches_query(&needle))
            .cloned()
            .collect()
    }

    pub async fn seed_demo_users(&self) -> Result<usize> {
        let mut added = 0;
        for (username, phone, name) in DEMO_USERS {
            if self.find_by_phone(phone).await.is_some() {
                continue;
            }
            let mut user = User::new(username, phone, name);
            user.set_presence(false, Utc::now());
            self.add_user(user).await?;
            added += 1;
        }
        tracing::info!("Seeded {} demo users", added);
        Ok(added)
    }
}
