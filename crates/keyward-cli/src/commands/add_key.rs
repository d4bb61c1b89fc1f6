//! add-key command - register a public key on a user's LDAP entry

use super::CommandContext;
use anyhow::{bail, Result};
use colored::Colorize;
use keyward_auth::AnyUserCache;

pub async fn execute(ctx: &CommandContext, username: &str, material: &str) -> Result<()> {
    let cache = match ctx.load_cache().await? {
        AnyUserCache::Ldap(cache) => cache,
        AnyUserCache::KeysFile(_) => {
            bail!("add-key needs the LDAP backend; edit the keys file directly instead")
        }
    };

    cache.add_ssh_key(username, material).await?;

    if !ctx.is_json() {
        println!("{} {}", "Added key for".green(), username.bold());
    }
    Ok(())
}
