//! users command - list every user in the configured directory

use super::CommandContext;
use anyhow::Result;
use colored::Colorize;
use keyward_auth::Authenticator;
use keyward_core::User;
use keyward_crypto::fingerprint;
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
struct UserSummary {
    username: String,
    keys: Vec<String>,
    default_role: String,
    arns: Vec<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            keys: user.ssh_keys.iter().map(fingerprint).collect(),
            default_role: user.default_role.clone(),
            arns: user.arns.iter().cloned().collect(),
        }
    }
}

pub async fn execute(ctx: &CommandContext) -> Result<()> {
    let cache = ctx.load_cache().await?;

    let mut users: Vec<Arc<User>> = cache.users().into_values().collect();
    users.sort_by(|a, b| a.username.cmp(&b.username));

    if ctx.is_json() {
        let summaries: Vec<UserSummary> = users.iter().map(|u| u.as_ref().into()).collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    for user in &users {
        let summary = UserSummary::from(user.as_ref());
        println!("{}", summary.username.blue().bold());
        println!("  {}: {}", "Keys".cyan(), summary.keys.len());
        for key in &summary.keys {
            println!("    {}", key);
        }
        if !summary.default_role.is_empty() {
            println!("  {}: {}", "Default role".cyan(), summary.default_role);
        }
        for arn in &summary.arns {
            println!("  {}: {}", "Role".cyan(), arn);
        }
    }
    println!();
    println!("{} users", users.len());

    Ok(())
}
