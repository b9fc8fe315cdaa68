use std::str::FromStr;
use std::time::Duration;

/// Freshness windows of the response caches.
#[derive(Debug, Clone)]
pub struct CacheTtls {
    /// Basic employee list snapshot.
    pub employees: Duration,
    /// Cost centers, branches and job titles.
    pub catalogs: Duration,
    /// Per-employee detail, contract, vacation and license entries.
    pub details: Duration,
    /// Full active-contracts snapshot.
    pub active_contracts: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            employees: Duration::from_secs(300),
            catalogs: Duration::from_secs(1800),
            details: Duration::from_secs(600),
            active_contracts: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub talana_base_url: String,
    pub talana_token: String,
    /// Minimum gap between two requests to Talana (about 20 requests/minute).
    pub min_request_interval: Duration,
    /// Connect and whole-request timeout for Talana calls.
    pub request_timeout: Duration,
    /// How many times a 429 answer is retried.
    pub max_retries: u32,
    /// Base delay of the exponential 429 backoff.
    pub retry_base_delay: Duration,
    /// Skip `/persona/{id}/saldo_vacaciones/`, which most tokens are not allowed to read.
    pub skip_vacation_balance: bool,
    pub cache_ttls: CacheTtls,
    /// UTC hour of the daily active-contracts warmup; `None` disables it.
    pub warmup_hour_utc: Option<u32>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = CacheTtls::default();
        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            talana_base_url: std::env::var("TALANA_BASE_URL")
                .or_else(|_| std::env::var("TALANA_API_BASE_URL"))
                .map_err(|_| anyhow::anyhow!("TALANA_BASE_URL environment variable required"))
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("TALANA_BASE_URL cannot be empty");
                    }
                    if !url.starts_with("http://") && !url.starts_with("https://") {
                        anyhow::bail!("TALANA_BASE_URL must start with http:// or https://");
                    }
                    Ok(url.trim().to_string())
                })?,
            talana_token: std::env::var("TALANA_API_TOKEN")
                .map_err(|_| anyhow::anyhow!("TALANA_API_TOKEN environment variable required"))
                .and_then(|token| {
                    if token.trim().is_empty() {
                        anyhow::bail!("TALANA_API_TOKEN cannot be empty");
                    }
                    Ok(token.trim().to_string())
                })?,
            min_request_interval: Duration::from_millis(env_num(
                "TALANA_MIN_INTERVAL_MS",
                3_000,
            )?),
            request_timeout: Duration::from_secs(env_num("TALANA_TIMEOUT_SECS", 180)?),
            max_retries: env_num("TALANA_MAX_RETRIES", 5)?,
            retry_base_delay: Duration::from_millis(env_num(
                "TALANA_RETRY_BASE_MS",
                1_000,
            )?),
            skip_vacation_balance: env_bool("TALANA_SKIP_VACATION_BALANCE", true)?,
            cache_ttls: CacheTtls {
                employees: env_secs("CACHE_TTL_EMPLOYEES_SECS", defaults.employees)?,
                catalogs: env_secs("CACHE_TTL_CATALOGS_SECS", defaults.catalogs)?,
                details: env_secs("CACHE_TTL_DETAILS_SECS", defaults.details)?,
                active_contracts: env_secs(
                    "CACHE_TTL_ACTIVE_CONTRACTS_SECS",
                    defaults.active_contracts,
                )?,
            },
            warmup_hour_utc: match std::env::var("WARMUP_HOUR_UTC") {
                Ok(raw) if raw.trim().is_empty() => None,
                Ok(raw) => {
                    let hour: u32 = raw
                        .trim()
                        .parse()
                        .map_err(|_| anyhow::anyhow!("WARMUP_HOUR_UTC must be a number 0-23"))?;
                    if hour > 23 {
                        anyhow::bail!("WARMUP_HOUR_UTC must be a number 0-23");
                    }
                    Some(hour)
                }
                Err(_) => Some(8),
            },
        };

        // Never log the token
        tracing::debug!("Talana Base URL: {}", config.talana_base_url);
        tracing::debug!(
            "Talana min interval: {:?}, timeout: {:?}, max retries: {}",
            config.min_request_interval,
            config.request_timeout,
            config.max_retries
        );
        tracing::debug!("Cache TTLs: {:?}", config.cache_ttls);
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}

fn env_num<T: FromStr>(key: &str, default: T) -> anyhow::Result<T> {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => parse_num(key, &raw),
        _ => Ok(default),
    }
}

/// Parses straight into the target type, so out-of-range values are rejected.
fn parse_num<T: FromStr>(key: &str, raw: &str) -> anyhow::Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("{} must be a non-negative integer in range", key))
}

fn env_secs(key: &str, default: Duration) -> anyhow::Result<Duration> {
    env_num(key, default.as_secs()).map(Duration::from_secs)
}

fn env_bool(key: &str, default: bool) -> anyhow::Result<bool> {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => parse_flag(&raw)
            .ok_or_else(|| anyhow::anyhow!("{} must be true or false", key)),
        _ => Ok(default),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "si" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" si "), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_parse_num_rejects_out_of_range() {
        assert_eq!(parse_num::<u32>("TALANA_MAX_RETRIES", " 7 ").unwrap(), 7);
        assert!(parse_num::<u32>("TALANA_MAX_RETRIES", "4294967296").is_err());
        assert!(parse_num::<u32>("TALANA_MAX_RETRIES", "-1").is_err());
        assert_eq!(
            parse_num::<u64>("TALANA_MIN_INTERVAL_MS", "4294967296").unwrap(),
            4_294_967_296
        );
    }

    #[test]
    fn test_default_ttls() {
        let ttls = CacheTtls::default();
        assert_eq!(ttls.employees, Duration::from_secs(5 * 60));
        assert_eq!(ttls.catalogs, Duration::from_secs(30 * 60));
        assert_eq!(ttls.details, Duration::from_secs(10 * 60));
        assert_eq!(ttls.active_contracts, Duration::from_secs(5 * 60));
    }
}
