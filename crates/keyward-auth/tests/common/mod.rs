//! Shared fakes for the cache integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use keyward_auth::{
    Directory, KeyRecord, KeyRecords, KeysFile, ModifyRequest, SearchEntry, SearchRequest, Stats,
};
use keyward_core::config::CacheConfig;
use keyward_core::{Error, Result};
use keyward_crypto::{encode_key_blob, Signature};
use parking_lot::Mutex;
use rand_core::OsRng;
use signature::Signer;
use ssh_key::{Algorithm, PrivateKey};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

pub const BASE_DN: &str = "dc=example,dc=org";
pub const CHALLENGE: &[u8] = b"session-challenge";

pub fn new_key() -> PrivateKey {
    PrivateKey::random(&mut OsRng, Algorithm::Ed25519).unwrap()
}

pub fn sign(key: &PrivateKey, challenge: &[u8]) -> Signature {
    Signer::<Signature>::try_sign(key, challenge).unwrap()
}

/// Base64 wire blob, as LDAP usually stores it
pub fn key_blob(key: &PrivateKey) -> String {
    encode_key_blob(key.public_key()).unwrap()
}

/// Authorized-keys line with a comment
pub fn key_line(key: &PrivateKey, comment: &str) -> String {
    let mut public = key.public_key().clone();
    public.set_comment(comment);
    public.to_openssh().unwrap()
}

pub fn cache_config(enable_server_roles: bool) -> CacheConfig {
    CacheConfig {
        base_dn: BASE_DN.to_string(),
        enable_server_roles,
        role_attribute: "roles".to_string(),
        default_role: "arn:aws:iam::000000000000:role/default".to_string(),
        ..CacheConfig::default()
    }
}

pub fn user_entry(cn: &str, keys: &[String], groups: &[&str]) -> SearchEntry {
    SearchEntry::new(format!("cn={},ou=people,{}", cn, BASE_DN))
        .with_attribute("cn", [cn])
        .with_attribute("sshPublicKey", keys.iter().cloned())
        .with_attribute("memberOf", groups.iter().copied())
}

pub fn group_entry(dn: &str, roles: &[&str]) -> SearchEntry {
    SearchEntry::new(dn).with_attribute("roles", roles.iter().copied())
}

/// In-memory LDAP directory that counts searches and records modifies
#[derive(Default)]
pub struct FakeDirectory {
    pub users: Mutex<Vec<SearchEntry>>,
    pub groups: Mutex<Vec<SearchEntry>>,
    pub failure: Mutex<Option<Error>>,
    pub delay: Mutex<Option<Duration>>,
    pub user_searches: AtomicUsize,
    pub group_searches: AtomicUsize,
    pub modifies: Mutex<Vec<ModifyRequest>>,
}

impl FakeDirectory {
    pub fn new(users: Vec<SearchEntry>, groups: Vec<SearchEntry>) -> Self {
        Self {
            users: Mutex::new(users),
            groups: Mutex::new(groups),
            ..Self::default()
        }
    }

    pub fn set_users(&self, users: Vec<SearchEntry>) {
        *self.users.lock() = users;
    }

    pub fn fail_with(&self, err: Option<Error>) {
        *self.failure.lock() = err;
    }

    pub fn slow_down(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    pub fn user_searches(&self) -> usize {
        self.user_searches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Directory for FakeDirectory {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchEntry>> {
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.failure.lock().clone() {
            return Err(err);
        }

        if request.filter == "(objectClass=groupOfNames)" {
            self.group_searches.fetch_add(1, Ordering::SeqCst);
            return Ok(self.groups.lock().clone());
        }
        if request.filter == "(sshPublicKey=*)" {
            self.user_searches.fetch_add(1, Ordering::SeqCst);
            return Ok(self.users.lock().clone());
        }

        // Single-user lookup: (cn=<name>)
        let wanted = request
            .filter
            .trim_start_matches("(cn=")
            .trim_end_matches(')');
        Ok(self
            .users
            .lock()
            .iter()
            .filter(|entry| entry.attribute_value("cn") == wanted)
            .cloned()
            .collect())
    }

    async fn modify(&self, request: &ModifyRequest) -> Result<()> {
        if let Some(err) = self.failure.lock().clone() {
            return Err(err);
        }
        self.modifies.lock().push(request.clone());
        Ok(())
    }
}

/// In-memory keys file that counts loads
#[derive(Default)]
pub struct FakeKeysFile {
    pub records: Mutex<KeyRecords>,
    pub failure: Mutex<Option<Error>>,
    pub loads: AtomicUsize,
}

impl FakeKeysFile {
    pub fn new(records: Vec<(String, KeyRecord)>) -> Self {
        Self {
            records: Mutex::new(records.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn set_records(&self, records: Vec<(String, KeyRecord)>) {
        *self.records.lock() = records.into_iter().collect();
    }

    pub fn fail_with(&self, err: Option<Error>) {
        *self.failure.lock() = err;
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeysFile for FakeKeysFile {
    async fn load(&self) -> Result<()> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        match self.failure.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn keys(&self) -> Result<KeyRecords> {
        Ok(self.records.lock().clone())
    }

    async fn search(&self, key: &str) -> Result<Option<KeyRecord>> {
        Ok(self.records.lock().get(key).cloned())
    }
}

/// Stats sink that remembers every emission
#[derive(Default)]
pub struct RecordingStats {
    pub counters: Mutex<Vec<(String, i64)>>,
    pub timings: Mutex<Vec<String>>,
}

impl RecordingStats {
    pub fn counter_total(&self, name: &str) -> i64 {
        self.counters
            .lock()
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, delta)| delta)
            .sum()
    }

    pub fn timing_count(&self, name: &str) -> usize {
        self.timings.lock().iter().filter(|n| *n == name).count()
    }
}

impl Stats for RecordingStats {
    fn timing(&self, _sample_rate: f32, name: &str, _duration: Duration) {
        self.timings.lock().push(name.to_string());
    }

    fn counter(&self, _sample_rate: f32, name: &str, delta: i64) {
        self.counters.lock().push((name.to_string(), delta));
    }
}

/// Counts `WARN` events emitted on the current thread while installed
#[derive(Clone, Default)]
pub struct WarningCounter {
    count: Arc<AtomicUsize>,
}

impl WarningCounter {
    /// Install as the thread's default subscriber until the guard drops
    pub fn install() -> (Self, DefaultGuard) {
        let counter = Self::default();
        let subscriber = tracing_subscriber::registry().with(counter.clone());
        let guard = tracing::subscriber::set_default(subscriber);
        (counter, guard)
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl<S: Subscriber> Layer<S> for WarningCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::WARN {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }
}
