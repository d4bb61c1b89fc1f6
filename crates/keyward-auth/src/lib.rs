//! User identity caches for Keyward
//!
//! Maps an SSH signature over a server challenge to the directory user
//! holding the signing key, refreshing from LDAP or a keys file on a miss.

pub mod cache;
pub mod keys_file;
pub mod ldap;
pub mod stats;

pub use cache::{
    AnyUserCache, Authenticator, KeysFileUserCache, KeysFileUserSource, LdapUserCache,
    LdapUserSource, Snapshot, UserCache, UserSource,
};
pub use keys_file::{JsonKeysFile, KeyRecord, KeyRecords, KeysFile};
pub use ldap::{Directory, LdapDirectory, ModifyRequest, SearchEntry, SearchRequest};
pub use stats::{MetricsStats, NoopStats, Stats};
