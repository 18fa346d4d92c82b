use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    auth::AuthService,
    chat::{ChatRepository, ChatService},
    error::{AppError, Result},
    store::Store,
    user::{DuplicatePolicy, UserRepository, UserService},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Store,
    pub user_repository: UserRepository,
    pub chat_repository: ChatRepository,
    pub user_service: UserService,
    pub chat_service: ChatService,
    pub auth_service: AuthService,
}

impl AppState {
    pub fn new(config: Arc<Config>) -> Self {
        let store = Store::new(config.event_channel_capacity);

        let user_repository = UserRepository::new(store.clone(), config.duplicate_user_policy);
        let chat_repository = ChatRepository::new(store.clone());

        let user_service = UserService::new(user_repository.clone());
        let chat_service = ChatService::new(chat_repository.clone(), user_service.clone());
        let auth_service = AuthService::new(user_repository.clone(), config.demo_password.clone());

        Self {
            config,
            store,
            user_repository,
            chat_repository,
            user_service,
            chat_service,
            auth_service,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub presence_interval: Duration,
    pub presence_online_probability: f64,
    pub duplicate_user_policy: DuplicatePolicy,
    pub demo_password: Option<String>,
    pub event_channel_capacity: usize,
    pub seed_demo_users: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            presence_interval: Duration::from_secs(10),
            presence_online_probability: 0.7,
            duplicate_user_policy: DuplicatePolicy::Replace,
            demo_password: None,
            event_channel_capacity: 100,
            seed_demo_users: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let interval_secs: u64 = parse_or(
            &lookup,
            "PRESENCE_INTERVAL_SECS",
            defaults.presence_interval.as_secs(),
        )?;
        if interval_secs == 0 {
            return Err(AppError::Config(
                "PRESENCE_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }

        let probability: f64 = parse_or(
            &lookup,
            "PRESENCE_ONLINE_PROBABILITY",
            defaults.presence_online_probability,
        )?;
        if !(0.0..=1.0).contains(&probability) {
            return Err(AppError::Config(
                "PRESENCE_ONLINE_PROBABILITY must be between 0 and 1".to_string(),
            ));
        }

        Ok(Self {
            presence_interval: Duration::from_secs(interval_secs),
            presence_online_probability: probability,
            duplicate_user_policy: parse_or(
                &lookup,
                "DUPLICATE_USER_POLICY",
                defaults.duplicate_user_policy,
            )?,
            demo_password: lookup("DEMO_PASSWORD").filter(|p| !p.is_empty()),
            event_channel_capacity: parse_or(
                &lookup,
                "EVENT_CHANNEL_CAPACITY",
                defaults.event_channel_capacity,
            )?,
            seed_demo_users: parse_or(&lookup, "SEED_DEMO_USERS", defaults.seed_demo_users)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{} has an invalid value '{}': {}", key, raw, e))),
        None => Ok(default),
    }
}
