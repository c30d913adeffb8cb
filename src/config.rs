use std::{env, fmt::Display, str::FromStr};

use anyhow::{Context, Result, anyhow};
use chrono::NaiveTime;
use dotenvy::dotenv;

use crate::policy::{AttendancePolicy, PayPolicy};

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: String,
    /// MySQL connection string; the in-memory store is used when unset
    pub database_url: Option<String>,
    pub run_migrations: bool,
    pub log_dir: String,

    pub api_prefix: String,
    // Rate limiting
    pub rate_api_per_min: u32,

    // Attendance policy
    pub late_after: NaiveTime,
    pub min_worked_minutes: u64,

    // Pay policy
    pub hourly_rate_cents: i64,
    pub paid_leave_hours: u32,
}

/// Reads `key`, falling back to `default` when it is not set.
fn var_or<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse()
        .map_err(|e| anyhow!("invalid {key} value '{raw}': {e}"))
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: env::var("SERVER_ADDR").context("SERVER_ADDR must be set")?,
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()),
            run_migrations: var_or("RUN_MIGRATIONS", "true")?,
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api/v1".to_string()),
            rate_api_per_min: var_or("RATE_API_PER_MIN", "1000")?,

            late_after: var_or("LATE_AFTER", "09:15:00")?,
            min_worked_minutes: var_or("MIN_WORKED_MINUTES", "240")?,

            hourly_rate_cents: var_or("HOURLY_RATE_CENTS", "1500")?,
            paid_leave_hours: var_or("PAID_LEAVE_HOURS", "8")?,
        })
    }

    pub fn attendance_policy(&self) -> AttendancePolicy {
        AttendancePolicy {
            late_after: self.late_after,
            min_worked_minutes: self.min_worked_minutes,
        }
    }

    pub fn pay_policy(&self) -> PayPolicy {
        PayPolicy {
            hourly_rate_cents: self.hourly_rate_cents,
            paid_leave_hours: self.paid_leave_hours,
        }
    }
}
