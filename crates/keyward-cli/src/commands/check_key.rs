//! check-key command - validate key material the way the caches read it

use super::CommandContext;
use anyhow::{Context, Result};
use colored::Colorize;
use keyward_crypto::{fingerprint, parse_public_key};
use serde::Serialize;

#[derive(Serialize)]
struct KeyCheckResult {
    algorithm: String,
    fingerprint: String,
    comment: String,
}

pub fn execute(ctx: &CommandContext, material: &str) -> Result<()> {
    let key = parse_public_key(material).context("Key material was not accepted")?;

    let result = KeyCheckResult {
        algorithm: key.algorithm().to_string(),
        fingerprint: fingerprint(&key),
        comment: key.comment().to_string(),
    };

    if ctx.is_json() {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", "Valid SSH public key".green().bold());
        println!("  {}: {}", "Algorithm".cyan(), result.algorithm);
        println!("  {}: {}", "Fingerprint".cyan(), result.fingerprint);
        if !result.comment.is_empty() {
            println!("  {}: {}", "Comment".cyan(), result.comment);
        }
    }

    Ok(())
}
