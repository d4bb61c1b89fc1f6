//! CLI command implementations

pub mod add_key;
pub mod check_key;
pub mod users;

use crate::OutputFormat;
use keyward_auth::{AnyUserCache, MetricsStats, NoopStats, Stats};
use keyward_core::KeywardConfig;
use std::sync::Arc;

/// Context passed to all commands
pub struct CommandContext {
    pub config: KeywardConfig,
    pub output_format: OutputFormat,
}

impl CommandContext {
    /// Check if output should be JSON
    pub fn is_json(&self) -> bool {
        matches!(self.output_format, OutputFormat::Json)
    }

    fn stats(&self) -> Arc<dyn Stats> {
        if self.config.metrics.enabled {
            Arc::new(MetricsStats)
        } else {
            Arc::new(NoopStats)
        }
    }

    /// Build the configured cache; a failed initial sync is fatal here
    pub async fn load_cache(&self) -> anyhow::Result<AnyUserCache> {
        let (cache, outcome) = AnyUserCache::from_config(&self.config, self.stats()).await;
        outcome?;
        Ok(cache)
    }
}
