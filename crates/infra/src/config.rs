use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;
use notibot_domain::{ReminderTiers, DEFAULT_REMINDER_OFFSETS, DEFAULT_REMINDER_TOLERANCE};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

const DEFAULT_SWEEP_CRON: &str = "*/5 * * * *";
const DEFAULT_DISPATCH_CONCURRENCY: usize = 8;
const DEFAULT_API_TIMEOUT_MS: u64 = 5000;
const DEFAULT_STORAGE_TIMEOUT_MS: u64 = 5000;
const DEFAULT_MAX_API_BASE_URL: &str = "https://platform-api.max.ru";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Unsupported sweep schedule: `{0}`. Expected `*/N * * * *` where N divides 60")]
    InvalidSweepSchedule(String),
}

/// Fixed cadence of the reminder sweep, aligned to wall clock minutes.
///
/// Expressed as a cron like minute step, e.g. `*/5 * * * *`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepSchedule {
    every_minutes: u32,
}

impl SweepSchedule {
    pub fn every_minutes(every_minutes: u32) -> Result<Self, ConfigError> {
        if every_minutes == 0 || 60 % every_minutes != 0 {
            return Err(ConfigError::InvalidSweepSchedule(format!(
                "*/{} * * * *",
                every_minutes
            )));
        }
        Ok(Self { every_minutes })
    }

    pub fn parse(expression: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidSweepSchedule(expression.to_string());
        let fields = expression.split_whitespace().collect::<Vec<_>>();
        if fields.len() != 5 || fields[1..].iter().any(|f| *f != "*") {
            return Err(invalid());
        }
        let every_minutes = match fields[0] {
            "*" => 1,
            minute => minute
                .strip_prefix("*/")
                .and_then(|step| step.parse::<u32>().ok())
                .ok_or_else(invalid)?,
        };
        Self::every_minutes(every_minutes).map_err(|_| invalid())
    }

    pub fn interval_minutes(&self) -> u32 {
        self.every_minutes
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.every_minutes) * 60)
    }

    /// Time from `now` until the next boundary of the schedule, evaluated
    /// on the wall clock of `timezone`. Exactly on a boundary this is a
    /// full interval.
    pub fn delay_until_next_run(&self, now: DateTime<Utc>, timezone: Tz) -> Duration {
        let local = now.with_timezone(&timezone);
        let cycle_millis = u64::from(self.every_minutes) * 60 * 1000;
        let elapsed_millis = u64::from(local.minute() % self.every_minutes) * 60 * 1000
            + u64::from(local.second()) * 1000
            + u64::from(local.nanosecond() / 1_000_000).min(999);
        Duration::from_millis(cycle_millis.saturating_sub(elapsed_millis))
    }
}

impl Default for SweepSchedule {
    fn default() -> Self {
        Self { every_minutes: 5 }
    }
}

#[derive(Debug, Clone)]
pub struct MessengerConfig {
    /// Deliver to an in-process mock instead of the MAX platform
    pub use_mock: bool,
    pub base_url: String,
    /// Bearer token of the bot. Required when not using the mock.
    pub bot_token: Option<String>,
    /// Upper bound for a single send call
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Tiers and tolerance used to decide when reminders are due
    pub reminder_tiers: ReminderTiers,
    /// How often the reminder sweep runs. Must not exceed the tolerance
    /// of `reminder_tiers`, otherwise whole tier windows can be skipped.
    pub sweep_schedule: SweepSchedule,
    /// Used for aligning the sweep to the wall clock and for rendering
    /// event times in messages
    pub timezone: Tz,
    /// Maximum number of reminders dispatched concurrently within a sweep
    pub dispatch_concurrency: usize,
    /// Upper bound for a single storage call made by the scheduler
    pub storage_timeout: Duration,
    pub messenger: MessengerConfig,
    /// Postgres connection string. In memory storage is used when missing.
    pub database_url: Option<String>,
    /// JSON file with the events to seed an empty database with. The
    /// bundled sample events are used when missing.
    pub data_source_path: Option<PathBuf>,
}

impl Config {
    pub fn new() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from a key lookup, falling back to the default
    /// for every missing or invalid value.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let reminder_tiers = parse_reminder_tiers(&lookup);

        let sweep_schedule = match lookup("REMINDER_SWEEP_CRON") {
            Some(expression) => match SweepSchedule::parse(&expression) {
                Ok(schedule) => schedule,
                Err(e) => {
                    warn!(
                        "{}. Falling back to the default schedule: {}",
                        e, DEFAULT_SWEEP_CRON
                    );
                    SweepSchedule::default()
                }
            },
            None => SweepSchedule::default(),
        };

        let timezone = match lookup("TIMEZONE") {
            Some(tz) => match tz.parse::<Tz>() {
                Ok(tz) => tz,
                Err(_) => {
                    warn!("The given TIMEZONE: {} is not valid, falling back to UTC.", tz);
                    Tz::UTC
                }
            },
            None => Tz::UTC,
        };

        let dispatch_concurrency = parse_positive(
            &lookup,
            "REMINDER_DISPATCH_CONCURRENCY",
            DEFAULT_DISPATCH_CONCURRENCY as u64,
        ) as usize;
        let api_timeout_ms = parse_positive(&lookup, "API_TIMEOUT_MS", DEFAULT_API_TIMEOUT_MS);
        let storage_timeout_ms =
            parse_positive(&lookup, "STORAGE_TIMEOUT_MS", DEFAULT_STORAGE_TIMEOUT_MS);

        let use_mock = lookup("USE_MOCK_MAX_API")
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(true);
        let bot_token = lookup("MAX_BOT_TOKEN").filter(|t| !t.trim().is_empty());
        if !use_mock && bot_token.is_none() {
            warn!("MAX_BOT_TOKEN is not set while USE_MOCK_MAX_API=false. Sending messages will fail.");
        }

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        if database_url.is_none() {
            info!("Did not find DATABASE_URL environment variable. Going to use in memory storage.");
        }

        let data_source_path = lookup("DATA_SOURCE_PATH")
            .filter(|path| !path.trim().is_empty())
            .map(resolve_path);

        Self {
            reminder_tiers,
            sweep_schedule,
            timezone,
            dispatch_concurrency,
            storage_timeout: Duration::from_millis(storage_timeout_ms),
            messenger: MessengerConfig {
                use_mock,
                base_url: lookup("MAX_API_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_MAX_API_BASE_URL.to_string()),
                bot_token,
                timeout: Duration::from_millis(api_timeout_ms),
            },
            database_url,
            data_source_path,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_reminder_tiers<F>(lookup: &F) -> ReminderTiers
where
    F: Fn(&str) -> Option<String>,
{
    let tolerance = match lookup("REMINDER_TOLERANCE_MINUTES") {
        Some(raw) => match raw.trim().parse::<u32>() {
            Ok(tolerance) if tolerance > 0 => tolerance,
            _ => {
                warn!(
                    "The given REMINDER_TOLERANCE_MINUTES: {} is not valid, falling back to: {}.",
                    raw, DEFAULT_REMINDER_TOLERANCE
                );
                DEFAULT_REMINDER_TOLERANCE
            }
        },
        None => DEFAULT_REMINDER_TOLERANCE,
    };

    let offsets = match lookup("REMINDER_OFFSETS_MINUTES") {
        Some(raw) => ReminderTiers::parse_offsets(&raw),
        None => match lookup("REMINDER_LEAD_MINUTES") {
            Some(raw) => ReminderTiers::parse_offsets(&raw).into_iter().take(1).collect(),
            None => DEFAULT_REMINDER_OFFSETS.to_vec(),
        },
    };

    match ReminderTiers::new(offsets, tolerance) {
        Ok(tiers) => tiers,
        Err(e) => {
            warn!(
                "{}. Falling back to the default reminder offsets: {:?}",
                e, DEFAULT_REMINDER_OFFSETS
            );
            ReminderTiers::new(DEFAULT_REMINDER_OFFSETS.to_vec(), tolerance)
                .unwrap_or_default()
        }
    }
}

/// Relative paths are resolved against the working directory
fn resolve_path(raw: String) -> PathBuf {
    let path = PathBuf::from(raw.trim());
    if path.is_absolute() {
        return path;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path,
    }
}

fn parse_positive<F>(lookup: &F, key: &str, default: u64) -> u64
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(value) if value > 0 => value,
            _ => {
                warn!(
                    "The given {}: {} is not valid, falling back to: {}.",
                    key, raw, default
                );
                default
            }
        },
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.reminder_tiers.offsets(), &[60, 30, 15]);
        assert_eq!(config.reminder_tiers.tolerance(), 5);
        assert_eq!(config.sweep_schedule.interval_minutes(), 5);
        assert_eq!(config.timezone, Tz::UTC);
        assert_eq!(config.dispatch_concurrency, 8);
        assert!(config.messenger.use_mock);
        assert_eq!(config.messenger.timeout, Duration::from_millis(5000));
        assert!(config.database_url.is_none());
        assert!(config.data_source_path.is_none());
    }

    #[test]
    fn resolves_data_source_path() {
        let config = config_from(&[("DATA_SOURCE_PATH", "data/events.json")]);
        let path = config.data_source_path.expect("To have a data source path");
        assert!(path.is_absolute());
        assert!(path.ends_with("data/events.json"));

        let config = config_from(&[("DATA_SOURCE_PATH", "/srv/events.json")]);
        assert_eq!(config.data_source_path, Some(PathBuf::from("/srv/events.json")));

        let config = config_from(&[("DATA_SOURCE_PATH", "  ")]);
        assert!(config.data_source_path.is_none());
    }

    #[test]
    fn reads_reminder_offsets_and_tolerance() {
        let config = config_from(&[
            ("REMINDER_OFFSETS_MINUTES", "15, 120,x,45"),
            ("REMINDER_TOLERANCE_MINUTES", "10"),
            ("REMINDER_LEAD_MINUTES", "30"),
        ]);
        assert_eq!(config.reminder_tiers.offsets(), &[120, 45, 15]);
        assert_eq!(config.reminder_tiers.tolerance(), 10);
    }

    #[test]
    fn falls_back_to_legacy_lead_minutes() {
        let config = config_from(&[("REMINDER_LEAD_MINUTES", "30")]);
        assert_eq!(config.reminder_tiers.offsets(), &[30]);
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let config = config_from(&[
            ("REMINDER_OFFSETS_MINUTES", "abc,0"),
            ("REMINDER_TOLERANCE_MINUTES", "-1"),
            ("REMINDER_SWEEP_CRON", "0 9 * * *"),
            ("TIMEZONE", "Mars/Olympus"),
            ("REMINDER_DISPATCH_CONCURRENCY", "0"),
        ]);
        assert_eq!(config.reminder_tiers, ReminderTiers::default());
        assert_eq!(config.sweep_schedule, SweepSchedule::default());
        assert_eq!(config.timezone, Tz::UTC);
        assert_eq!(config.dispatch_concurrency, 8);
    }

    #[test]
    fn reads_messenger_settings() {
        let config = config_from(&[
            ("USE_MOCK_MAX_API", "FALSE"),
            ("MAX_BOT_TOKEN", "secret"),
            ("API_TIMEOUT_MS", "1500"),
            ("TIMEZONE", "Europe/Moscow"),
        ]);
        assert!(!config.messenger.use_mock);
        assert_eq!(config.messenger.bot_token.as_deref(), Some("secret"));
        assert_eq!(config.messenger.timeout, Duration::from_millis(1500));
        assert_eq!(config.timezone, chrono_tz::Europe::Moscow);
    }

    #[test]
    fn parses_sweep_schedules() {
        assert_eq!(SweepSchedule::parse("*/5 * * * *").unwrap().interval_minutes(), 5);
        assert_eq!(SweepSchedule::parse("* * * * *").unwrap().interval_minutes(), 1);
        assert_eq!(
            SweepSchedule::parse("*/15  *  * * *").unwrap().interval(),
            Duration::from_secs(15 * 60)
        );
        assert!(SweepSchedule::parse("*/7 * * * *").is_err());
        assert!(SweepSchedule::parse("*/0 * * * *").is_err());
        assert!(SweepSchedule::parse("5 * * * *").is_err());
        assert!(SweepSchedule::parse("*/5 * * *").is_err());
        assert!(SweepSchedule::parse("*/5 1 * * *").is_err());
    }

    #[test]
    fn delay_until_next_run_aligns_to_wall_clock() {
        let schedule = SweepSchedule::default();
        let at = |h, m, s| Utc.with_ymd_and_hms(2025, 11, 10, h, m, s).unwrap();

        assert_eq!(
            schedule.delay_until_next_run(at(9, 0, 0), Tz::UTC),
            Duration::from_secs(300)
        );
        assert_eq!(
            schedule.delay_until_next_run(at(9, 3, 20), Tz::UTC),
            Duration::from_secs(100)
        );
        assert_eq!(
            schedule.delay_until_next_run(at(9, 4, 59), Tz::UTC),
            Duration::from_secs(1)
        );

        // Kathmandu is UTC+05:45, so 09:03 UTC is 14:48 local
        assert_eq!(
            schedule.delay_until_next_run(at(9, 3, 0), chrono_tz::Asia::Kathmandu),
            Duration::from_secs(120)
        );

        let minutely = SweepSchedule::parse("* * * * *").unwrap();
        assert_eq!(
            minutely.delay_until_next_run(at(9, 3, 50), Tz::UTC),
            Duration::from_secs(10)
        );
    }
}
