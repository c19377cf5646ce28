//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `portier.toml` in the working directory (or the file named by
//! `PORTIER_CONFIG`). Every field has a sensible default so the file is
//! optional; without `[[opening_hours]]` the door simply stays locked.
//! Environment variables take precedence over file values.

use std::time::Duration;

use chrono::{NaiveDate, TimeDelta};
use chrono_tz::Tz;
use serde::Deserialize;

use portier_adapter_mqtt::MqttConfig;
use portier_adapter_virtual::StaticHolidayCalendar;
use portier_app::scheduler::SchedulerConfig;
use portier_domain::daytime::DayTimeRange;
use portier_domain::error::ValidationError;
use portier_domain::opening_hours::{MonthDay, OpeningHour, RuleSet, parse_weekday};

const DEFAULT_PATH: &str = "portier.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Where the door is.
    pub location: LocationConfig,
    /// Door backend and scheduler policy.
    pub door: DoorConfig,
    /// MQTT backend settings (only used with `backend = "mqtt"`).
    pub mqtt: MqttConfig,
    /// Public holidays of the configured country.
    pub holidays: HolidaysConfig,
    /// Opening hours, one entry per group of days.
    pub opening_hours: Vec<OpeningHoursEntry>,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Time zone and country of the door.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// IANA time zone name, e.g. `Europe/Vienna`.
    #[serde(deserialize_with = "timezone_serde::deserialize")]
    pub timezone: Tz,
    /// ISO 3166 alpha-2 country code for holiday lookups.
    pub country: String,
}

/// Which [`DoorActuator`](portier_app::ports::DoorActuator) drives the door.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorBackend {
    /// In-memory door, commands are only logged.
    #[default]
    Virtual,
    /// Relay controller reached over MQTT.
    Mqtt,
}

/// Door backend and scheduler policy.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DoorConfig {
    pub backend: DoorBackend,
    pub resend_interval_secs: u64,
    pub fallback_horizon_secs: u64,
    pub max_tries_locked: u32,
    pub max_tries_unlocked: u32,
    pub command_timeout_ms: u64,
    pub reset_settle_delay_ms: u64,
    pub reset_command_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

/// Holidays, on top of which the holiday layer of the opening hours applies.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HolidaysConfig {
    /// One-off holidays (`YYYY-MM-DD`).
    pub fixed: Vec<NaiveDate>,
    /// Holidays on the same day every year (`MM/DD`).
    pub recurring: Vec<MonthDay>,
}

/// How an opening hours entry relates to holidays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HolidayMode {
    /// Regular weekdays only; closed on holidays.
    #[default]
    No,
    /// Regular weekdays and holidays.
    Yes,
    /// Holidays only.
    Only,
}

/// One `[[opening_hours]]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct OpeningHoursEntry {
    /// Weekday names (`mon`, `tuesday`, …).
    #[serde(default)]
    pub weekdays: Vec<String>,
    /// `MM/DD` dates; takes the entry out of the weekday schedule.
    #[serde(default)]
    pub dates: Vec<MonthDay>,
    /// `HH:MM - HH:MM` ranges. Empty together with `dates` means closed.
    #[serde(default)]
    pub time_ranges: Vec<DayTimeRange>,
    #[serde(default)]
    pub open_before_mins: u32,
    #[serde(default)]
    pub close_after_mins: u32,
    #[serde(default)]
    pub holiday: HolidayMode,
}

impl Config {
    /// Load configuration from `PORTIER_CONFIG` or `portier.toml` (if
    /// present), then apply environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed or the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("PORTIER_CONFIG").unwrap_or_else(|_| DEFAULT_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("PORTIER_DOOR_BACKEND") {
            match val.to_ascii_lowercase().as_str() {
                "virtual" => self.door.backend = DoorBackend::Virtual,
                "mqtt" => self.door.backend = DoorBackend::Mqtt,
                _ => {}
            }
        }
        if let Ok(val) = std::env::var("PORTIER_MQTT_HOST") {
            self.mqtt.broker_host = val;
        }
        if let Ok(val) = std::env::var("PORTIER_MQTT_PORT") {
            if let Ok(port) = val.parse() {
                self.mqtt.broker_port = port;
            }
        }
        if let Ok(val) = std::env::var("PORTIER_TIMEZONE") {
            if let Ok(timezone) = val.parse() {
                self.location.timezone = timezone;
            }
        }
        if let Ok(val) = std::env::var("PORTIER_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.location.country.trim().is_empty() {
            return Err(ConfigError::Validation(
                "location.country must not be empty".to_string(),
            ));
        }
        if self.mqtt.qos > 2 {
            return Err(ConfigError::Validation(format!(
                "mqtt.qos must be 0, 1 or 2, got {}",
                self.mqtt.qos
            )));
        }
        for (index, entry) in self.opening_hours.iter().enumerate() {
            if entry.dates.is_empty()
                && entry.weekdays.is_empty()
                && entry.holiday != HolidayMode::Only
            {
                return Err(ConfigError::Validation(format!(
                    "opening_hours[{index}] applies to no day, set weekdays or dates"
                )));
            }
        }
        self.scheduler()
            .validate()
            .map_err(|err| ConfigError::Validation(err.to_string()))
    }

    /// The scheduler policy from `[door]`.
    #[must_use]
    pub fn scheduler(&self) -> SchedulerConfig {
        let door = &self.door;
        SchedulerConfig {
            resend_interval: Duration::from_secs(door.resend_interval_secs),
            fallback_horizon: Duration::from_secs(door.fallback_horizon_secs),
            max_tries_locked: door.max_tries_locked,
            max_tries_unlocked: door.max_tries_unlocked,
            command_timeout: Duration::from_millis(door.command_timeout_ms),
            reset_settle_delay: Duration::from_millis(door.reset_settle_delay_ms),
            reset_command_timeout: Duration::from_secs(door.reset_command_timeout_secs),
            request_timeout: Duration::from_secs(door.request_timeout_secs),
        }
    }

    /// The holiday calendar of the configured country.
    #[must_use]
    pub fn holiday_calendar(&self) -> StaticHolidayCalendar {
        let mut calendar = StaticHolidayCalendar::new(self.location.country.clone());
        for date in &self.holidays.fixed {
            calendar.add_fixed(*date);
        }
        for day in &self.holidays.recurring {
            calendar.add_recurring(*day);
        }
        calendar
    }

    /// Build the validated rule set from the `[[opening_hours]]` entries.
    ///
    /// Entries with `dates` populate the date-specific layer; the others
    /// populate the regular layer, the holiday layer or both depending on
    /// their `holiday` mode.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Rules`] for unknown weekdays and overlapping
    /// hours.
    pub fn rule_set(&self) -> Result<RuleSet, ConfigError> {
        let mut builder = RuleSet::builder();
        // several entries may share the same holiday hours
        let mut holiday_hours: Vec<OpeningHour> = Vec::new();

        for entry in &self.opening_hours {
            let hours: Vec<OpeningHour> = entry
                .time_ranges
                .iter()
                .map(|range| {
                    OpeningHour::new(*range)
                        .open_before(TimeDelta::minutes(i64::from(entry.open_before_mins)))
                        .close_after(TimeDelta::minutes(i64::from(entry.close_after_mins)))
                        .applies_to_holidays(entry.holiday != HolidayMode::No)
                })
                .collect();

            if !entry.dates.is_empty() {
                for day in &entry.dates {
                    if hours.is_empty() {
                        builder.close_on(*day);
                    }
                    for hour in &hours {
                        builder.add_date_specific(*day, *hour);
                    }
                }
                continue;
            }

            if entry.holiday != HolidayMode::Only {
                for name in &entry.weekdays {
                    let weekday = parse_weekday(name)?;
                    for hour in &hours {
                        builder.add_regular(weekday, *hour);
                    }
                }
            }
            if entry.holiday != HolidayMode::No {
                for hour in &hours {
                    if !holiday_hours.contains(hour) {
                        holiday_hours.push(*hour);
                        builder.add_holiday(*hour);
                    }
                }
            }
        }

        builder.build().map_err(ConfigError::Rules)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "portierd=info,portier_app=info,portier_adapter_mqtt=info".to_string(),
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::Europe::Vienna,
            country: "AT".to_string(),
        }
    }
}

impl Default for DoorConfig {
    fn default() -> Self {
        let defaults = SchedulerConfig::default();
        Self {
            backend: DoorBackend::default(),
            resend_interval_secs: defaults.resend_interval.as_secs(),
            fallback_horizon_secs: defaults.fallback_horizon.as_secs(),
            max_tries_locked: defaults.max_tries_locked,
            max_tries_unlocked: defaults.max_tries_unlocked,
            command_timeout_ms: duration_millis(defaults.command_timeout),
            reset_settle_delay_ms: duration_millis(defaults.reset_settle_delay),
            reset_command_timeout_secs: defaults.reset_command_timeout.as_secs(),
            request_timeout_secs: defaults.request_timeout.as_secs(),
        }
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

mod timezone_serde {
    use chrono_tz::Tz;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Tz, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
    /// The opening hours do not form a valid rule set.
    #[error("invalid opening hours")]
    Rules(#[from] ValidationError),
}
