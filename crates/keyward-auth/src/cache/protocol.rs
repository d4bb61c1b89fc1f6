//! Refresh-on-miss user cache
//!
//! Both directory backends share one protocol:
//! 1. Scan the published snapshot for a key that verifies the signature.
//! 2. On a miss, refresh the snapshot from the directory.
//! 3. Scan the new snapshot exactly once more.
//!
//! Snapshots are built off to the side and swapped in whole, so readers
//! never see a half-built map. Refreshes are serialized; a caller that
//! missed while another refresh was running reuses that refresh's outcome
//! instead of going back to the directory.

use async_trait::async_trait;
use keyward_core::{Error, GroupRoles, Result, User, UserMap};
use keyward_crypto::{verify_signature, Signature};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::stats::{names, Stats};

/// One complete, immutable view of the directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub users: UserMap,
    /// Group DN to role ARNs; only populated by the LDAP engine
    pub groups: GroupRoles,
}

impl Snapshot {
    pub fn new(users: UserMap, groups: GroupRoles) -> Self {
        Self { users, groups }
    }

    /// First user holding a key that verifies `signature` over `challenge`
    pub fn find_verified(&self, challenge: &[u8], signature: &Signature) -> Option<Arc<User>> {
        self.users
            .values()
            .find(|user| {
                user.ssh_keys
                    .iter()
                    .any(|key| verify_signature(key, challenge, signature))
            })
            .cloned()
    }
}

/// A directory the cache can rebuild its snapshot from
#[async_trait]
pub trait UserSource: Send + Sync {
    /// Prefix for this engine's metric names, e.g. `ldapCache`
    fn metric_prefix(&self) -> &'static str;

    /// Directory name used in log messages
    fn name(&self) -> &'static str;

    /// Build a complete replacement snapshot. Must not publish anything.
    async fn fetch(&self) -> Result<Snapshot>;
}

#[derive(Default)]
struct RefreshState {
    last_error: Option<Error>,
    /// Attempt count as of the most recent committed snapshot
    committed_at: u64,
}

pub struct UserCache<S> {
    source: S,
    stats: Arc<dyn Stats>,
    snapshot: RwLock<Arc<Snapshot>>,
    refresh: Mutex<RefreshState>,
    /// Completed refresh attempts, successful or not
    attempts: AtomicU64,
    /// Committed snapshots
    refreshes: AtomicU64,
    update_metric: String,
    miss_metric: String,
}

impl<S: UserSource> UserCache<S> {
    /// Build the cache and run the initial sync.
    ///
    /// The cache is returned even when that sync fails, alongside its
    /// outcome; callers decide whether an empty cache is fatal.
    pub async fn new(source: S, stats: Arc<dyn Stats>) -> (Self, Result<()>) {
        let cache = Self::empty(source, stats);
        let outcome = cache.update().await;
        (cache, outcome)
    }

    /// A cache with an empty snapshot and no initial sync
    pub fn empty(source: S, stats: Arc<dyn Stats>) -> Self {
        let prefix = source.metric_prefix();
        Self {
            update_metric: format!("{}{}", prefix, names::UPDATE),
            miss_metric: format!("{}{}", prefix, names::MISS),
            source,
            stats,
            snapshot: RwLock::new(Arc::new(Snapshot::default())),
            refresh: Mutex::new(RefreshState::default()),
            attempts: AtomicU64::new(0),
            refreshes: AtomicU64::new(0),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// The currently published snapshot
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.read().clone()
    }

    /// Point-in-time copy of the username map
    pub fn users(&self) -> UserMap {
        self.snapshot().users.clone()
    }

    pub fn user(&self, username: &str) -> Option<Arc<User>> {
        self.snapshot().users.get(username).cloned()
    }

    pub fn groups(&self) -> GroupRoles {
        self.snapshot().groups.clone()
    }

    /// Number of snapshots committed since construction
    pub fn refresh_count(&self) -> u64 {
        self.refreshes.load(Ordering::Relaxed)
    }

    /// Rebuild the snapshot from the directory.
    ///
    /// On failure the previously published snapshot stays in place.
    pub async fn update(&self) -> Result<()> {
        let mut state = self.refresh.lock().await;
        self.refresh_locked(&mut state).await
    }

    /// Resolve the user whose key verifies `signature` over `challenge`.
    ///
    /// `username` is advisory: every cached key is tried. `Ok(None)` means
    /// nothing verified even after a refresh; `Err` means the refresh failed.
    pub async fn authenticate(
        &self,
        username: &str,
        challenge: &[u8],
        signature: &Signature,
    ) -> Result<Option<Arc<User>>> {
        // Read before scanning so a refresh finishing mid-scan is noticed
        let observed = self.attempts.load(Ordering::Acquire);

        if let Some(user) = self.snapshot().find_verified(challenge, signature) {
            note_match(username, &user);
            return Ok(Some(user));
        }

        debug!(
            "Could not find {} in the {} cache; updating from the directory.",
            username,
            self.source.name()
        );
        self.stats.counter(1.0, &self.miss_metric, 1);

        self.refresh_after_miss(observed).await?;

        let user = self.snapshot().find_verified(challenge, signature);
        match &user {
            Some(user) => note_match(username, user),
            None => debug!(username, "No cached key verified the signature after refresh"),
        }
        Ok(user)
    }

    async fn refresh_after_miss(&self, observed: u64) -> Result<()> {
        let mut state = self.refresh.lock().await;

        if self.attempts.load(Ordering::Acquire) != observed {
            debug!(
                "{} refresh finished while waiting; reusing its outcome",
                self.source.name()
            );
            // A snapshot committed since `observed` has not been scanned yet,
            // even if a later attempt failed
            if state.committed_at > observed {
                return Ok(());
            }
            return match &state.last_error {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            };
        }

        self.refresh_locked(&mut state).await
    }

    /// Caller holds the refresh lock
    async fn refresh_locked(&self, state: &mut RefreshState) -> Result<()> {
        let start = Instant::now();

        let outcome = self.source.fetch().await.map(|snapshot| {
            let users = snapshot.users.len();
            *self.snapshot.write() = Arc::new(snapshot);
            self.refreshes.fetch_add(1, Ordering::Relaxed);

            info!(users, "{} information re-cached", self.source.name());
            self.stats.timing(1.0, &self.update_metric, start.elapsed());
        });

        if let Err(err) = &outcome {
            warn!(
                error = %err,
                "{} refresh failed; keeping the previous snapshot",
                self.source.name()
            );
        }

        state.last_error = outcome.as_ref().err().cloned();
        let attempt = self.attempts.fetch_add(1, Ordering::Release) + 1;
        if outcome.is_ok() {
            state.committed_at = attempt;
        }
        outcome
    }
}

fn note_match(username: &str, user: &User) {
    if user.username != username {
        debug!(
            requested = username,
            matched = %user.username,
            "Signature verified under another user's key"
        );
    }
}
