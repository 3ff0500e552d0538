use std::env;
use std::time::Duration;

/// Account lockout policy. `max_attempts` consecutive failed logins lock the
/// account for `lockout_duration`.
#[derive(Debug, Clone, Copy)]
pub struct LockoutPolicy {
    pub max_attempts: u32,
    pub lockout_duration: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lockout_duration: Duration::from_secs(900),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub database_path: String,
    pub calendar_base_url: String,
    pub admin_email: String,
    pub admin_password: String,
    pub lockout: LockoutPolicy,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            log::warn!("Ignoring unparseable {key}={raw}");
            default
        }),
        Err(_) => default,
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = LockoutPolicy::default();
        Self {
            bind_addr: env_or("BIND_ADDR", "127.0.0.1:8080"),
            database_path: env_or("DATABASE_PATH", "data/huddle.db"),
            calendar_base_url: env_or("CALENDAR_BASE_URL", "http://localhost:5003"),
            admin_email: env_or("ADMIN_EMAIL", "admin@example.com"),
            admin_password: env_or("ADMIN_PASSWORD", "admin123"),
            lockout: LockoutPolicy {
                max_attempts: env_parsed("LOCKOUT_MAX_ATTEMPTS", defaults.max_attempts),
                lockout_duration: Duration::from_secs(env_parsed(
                    "LOCKOUT_DURATION_SECS",
                    defaults.lockout_duration.as_secs(),
                )),
            },
        }
    }
}
