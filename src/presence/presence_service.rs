use rand::Rng;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::user::user_repository::UserRepository;

/// Randomly flips other users between online and offline.
pub struct PresenceSimulator<R> {
    users: UserRepository,
    rng: R,
    online_probability: f64,
}

impl<R: Rng> PresenceSimulator<R> {
    /// `online_probability` is clamped into `0.0..=1.0`.
    pub fn new(users: UserRepository, rng: R, online_probability: f64) -> Self {
        Self {
            users,
            rng,
            online_probability: online_probability.clamp(0.0, 1.0),
        }
    }

    /// One pass over every user except the current one. Returns how many changed.
    pub async fn tick(&mut self) -> usize {
        let rng = &mut self.rng;
        let probability = self.online_probability;
        let changed = self
            .users
            .roll_presence(|_| rng.random_bool(probability))
            .await;

        for user in &changed {
            debug!(user_id = %user.id, online = user.is_online, "presence flipped");
        }
        changed.len()
    }
}

impl<R: Rng + Send + 'static> PresenceSimulator<R> {
    /// Runs `tick` every `period` until the returned handle is shut down.
    /// The first tick happens one full period after start.
    pub fn spawn(mut self, period: Duration) -> PresenceHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let join = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        let changed = self.tick().await;
                        debug!(changed, "presence tick");
                    }
                }
            }

            info!("Presence simulator stopped");
        });

        info!(period_ms = period.as_millis() as u64, "Presence simulator started");
        PresenceHandle { shutdown_tx, join }
    }
}

pub struct PresenceHandle {
    shutdown_tx: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

impl PresenceHandle {
    /// Stops the loop and waits for an in-flight tick to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.join.await {
            tracing::error!("Presence task ended abnormally: {:?}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{store::Store, user::user_models::DuplicatePolicy};
    use rand::{rngs::StdRng, SeedableRng};

    async fn users_with(online: bool) -> (UserRepository, Vec<uuid::Uuid>) {
        let repo = UserRepository::new(Store::new(64), DuplicatePolicy::Replace);
        let mut ids = Vec::new();
        for (i, name) in ["alice_dev", "bob_designer", "carol"].iter().enumerate() {
            let user = repo
                .create(name, &format!("+7000000000{}", i), name)
                .await
                .unwrap();
            repo.update_status(user.id, online).await;
            ids.push(user.id);
        }
        (repo, ids)
    }

    #[tokio::test]
    async fn test_tick_brings_everyone_online_with_probability_one() {
        let (repo, ids) = users_with(false).await;
        repo.set_current_user(Some(ids[0])).await.unwrap();

        let mut sim = PresenceSimulator::new(repo.clone(), StdRng::seed_from_u64(7), 1.0);
        assert_eq!(sim.tick().await, 2);

        let users = repo.all().await;
        // The current user is never touched.
        assert!(!users[0].is_online);
        assert!(users[1].is_online && users[1].last_seen.is_none());
        assert!(users[2].is_online);

        // Already in the target state: nothing changes.
        assert_eq!(sim.tick().await, 0);
    }

    #[tokio::test]
    async fn test_tick_takes_everyone_offline_with_probability_zero() {
        let (repo, _) = users_with(true).await;
        let mut sim = PresenceSimulator::new(repo.clone(), StdRng::seed_from_u64(7), 0.0);

        assert_eq!(sim.tick().await, 3);
        assert!(repo
            .all()
            .await
            .iter()
            .all(|u| !u.is_online && u.last_seen.is_some()));
    }

    #[tokio::test]
    async fn test_tick_only_publishes_changes() {
        let (repo, _) = users_with(true).await;
        let mut rx = repo_events(&repo);
        let mut sim = PresenceSimulator::new(repo.clone(), StdRng::seed_from_u64(1), 1.0);

        assert_eq!(sim.tick().await, 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_same_seed_same_outcome() {
        let (first, _) = users_with(true).await;
        let (second, _) = users_with(true).await;

        let mut a = PresenceSimulator::new(first.clone(), StdRng::seed_from_u64(42), 0.7);
        let mut b = PresenceSimulator::new(second.clone(), StdRng::seed_from_u64(42), 0.7);
        for _ in 0..5 {
            assert_eq!(a.tick().await, b.tick().await);
        }

        let flags = |users: Vec<crate::user::User>| users.iter().map(|u| u.is_online).collect::<Vec<_>>();
        assert_eq!(flags(first.all().await), flags(second.all().await));
    }

    #[tokio::test]
    async fn test_spawned_task_ticks_and_shuts_down() {
        let (repo, _) = users_with(true).await;
        let sim = PresenceSimulator::new(repo.clone(), StdRng::seed_from_u64(3), 0.0);

        let handle = sim.spawn(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.shutdown().await;

        assert!(repo.all().await.iter().all(|u| !u.is_online));
    }

    #[tokio::test]
    async fn test_tick_skips_user_who_logged_in_since_last_pass() {
        let (repo, ids) = users_with(false).await;
        let mut sim = PresenceSimulator::new(repo.clone(), StdRng::seed_from_u64(9), 0.0);

        repo.start_session(ids[1]).await.unwrap();
        assert_eq!(sim.tick().await, 0);

        let bob = repo.find_by_id(ids[1]).await.unwrap();
        assert!(bob.is_online);
        assert_eq!(repo.current_user_id().await, Some(bob.id));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_login_racing_ticks_stays_online() {
        for _ in 0..20 {
            let (repo, ids) = users_with(false).await;
            let mut sim = PresenceSimulator::new(repo.clone(), StdRng::seed_from_u64(11), 0.0);

            let ticks = tokio::spawn(async move {
                for _ in 0..50 {
                    sim.tick().await;
                    tokio::task::yield_now().await;
                }
            });
            repo.start_session(ids[1]).await.unwrap();
            ticks.await.unwrap();

            let bob = repo.find_by_id(ids[1]).await.unwrap();
            assert!(bob.is_online, "logged-in user was taken offline");
            assert_eq!(repo.current_user_id().await, Some(bob.id));
        }
    }

    fn repo_events(repo: &UserRepository) -> tokio::sync::broadcast::Receiver<crate::store::StoreEvent> {
        repo.store().subscribe()
    }
}
