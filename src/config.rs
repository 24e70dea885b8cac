use anyhow::{Context, Result, anyhow};
use chrono::FixedOffset;
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

const MAX_GRACE_MINUTES: i64 = 24 * 60;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub server_addr: String,
    pub api_prefix: String,

    // Rate limiting
    pub rate_scan_per_min: u32,

    /// Offset used to derive calendar dates from scan timestamps.
    pub utc_offset: FixedOffset,
    pub cutover_grace_minutes: i64,
    pub shift_cache_ttl_secs: u64,

    // Notifications
    pub notify_recipients: Vec<u64>,
    pub notify_image_url: Option<String>,

    pub log_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let offset_minutes: i32 = parse_or("UTC_OFFSET_MINUTES", 0)?;
        let utc_offset = FixedOffset::east_opt(offset_minutes * 60)
            .ok_or_else(|| anyhow!("UTC_OFFSET_MINUTES out of range: {}", offset_minutes))?;

        Ok(Self {
            server_addr: env::var("SERVER_ADDR").context("SERVER_ADDR must be set")?,
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            rate_scan_per_min: parse_or("RATE_SCAN_PER_MIN", 120)?,

            utc_offset,
            cutover_grace_minutes: check_grace(parse_or("CUTOVER_GRACE_MINUTES", 120)?)?,
            shift_cache_ttl_secs: parse_or("SHIFT_CACHE_TTL_SECS", 300)?,

            notify_recipients: parse_id_list(
                &env::var("NOTIFY_RECIPIENTS").unwrap_or_default(),
            )?,
            notify_image_url: env::var("NOTIFY_IMAGE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),

            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
        })
    }
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", key, raw)),
        Err(_) => Ok(default),
    }
}

/// Grace before the next shift, at most one day.
fn check_grace(minutes: i64) -> Result<i64> {
    if !(0..=MAX_GRACE_MINUTES).contains(&minutes) {
        return Err(anyhow!(
            "CUTOVER_GRACE_MINUTES must be between 0 and {}, got {}",
            MAX_GRACE_MINUTES,
            minutes
        ));
    }
    Ok(minutes)
}

/// Parses `"1, 2,3"` into ids, ignoring empty segments.
fn parse_id_list(raw: &str) -> Result<Vec<u64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u64>()
                .with_context(|| format!("NOTIFY_RECIPIENTS contains a bad id: {:?}", s))
        })
        .collect()
}
