use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context as AnyhowContext, Result};
use bayou_search::SearchConfig;

pub const DEFAULT_BIND: &str = "localhost:8084";
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(10);
pub const IO_TIMEOUT_ENV: &str = "BAYOU_IO_TIMEOUT_MS";

/// Optional search settings read from the model directory.
pub const SEARCH_CONFIG_FILE: &str = "search.toml";

/// Search limits given on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchOverrides {
    pub max_draws: Option<usize>,
    pub gap_threshold: Option<u32>,
    pub top_k: Option<usize>,
}

/// Defaults, then `<save_dir>/search.toml`, then command-line overrides.
pub fn resolve_search_config(save_dir: &Path, overrides: &SearchOverrides) -> Result<SearchConfig> {
    let path = save_dir.join(SEARCH_CONFIG_FILE);
    let mut config = if path.exists() {
        log::info!("loading search settings from {}", path.display());
        SearchConfig::from_file(&path)
            .with_context(|| format!("Failed to load search settings {}", path.display()))?
    } else {
        SearchConfig::default()
    };

    if let Some(max_draws) = overrides.max_draws {
        config.max_draws = max_draws;
    }
    if let Some(gap_threshold) = overrides.gap_threshold {
        config.gap_threshold = gap_threshold;
    }
    if let Some(top_k) = overrides.top_k {
        config.top_k = top_k;
    }

    config.validate()?;
    Ok(config)
}

/// Resolve the address to listen on.
///
/// The server answers anyone who connects, so an address that is not
/// loopback is only accepted with `public`. IPv4 is preferred so that
/// `localhost` lines up with clients dialing `127.0.0.1`.
pub async fn listen_addr(bind: &str, public: bool) -> Result<SocketAddr> {
    let resolved: Vec<SocketAddr> = tokio::net::lookup_host(bind)
        .await
        .with_context(|| format!("Failed to resolve listen address {bind}"))?
        .collect();

    if !public {
        if let Some(exposed) = resolved.iter().find(|addr| !addr.ip().is_loopback()) {
            anyhow::bail!(
                "Refusing to listen on {exposed} (from {bind}) without --public: requests are not authenticated"
            );
        }
    }

    resolved
        .iter()
        .copied()
        .find(SocketAddr::is_ipv4)
        .or_else(|| resolved.first().copied())
        .with_context(|| format!("{bind} resolved to no addresses"))
}

fn duration_from_ms(raw: Option<String>) -> Option<Duration> {
    raw.map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
}

/// Per-connection read/write timeout.
#[must_use]
pub fn io_timeout() -> Duration {
    duration_from_ms(std::env::var(IO_TIMEOUT_ENV).ok()).unwrap_or(DEFAULT_IO_TIMEOUT)
}
