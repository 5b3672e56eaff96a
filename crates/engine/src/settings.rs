//! Runtime settings for one planning session.
//!
//! Defaults suit a model service on localhost. Every field can be overridden
//! from `CRHS_*` environment variables; the binary layers its CLI flags on top.

use std::path::PathBuf;
use std::time::Duration;

use bevy::prelude::*;

use crate::environment::Region;
use crate::session::Role;

pub const ENV_API_BASE: &str = "CRHS_API_BASE";
pub const ENV_REGION: &str = "CRHS_REGION";
pub const ENV_ROLE: &str = "CRHS_ROLE";
pub const ENV_TIMEOUT_SECS: &str = "CRHS_TIMEOUT_SECS";
pub const ENV_REFRESH_SECS: &str = "CRHS_REFRESH_SECS";
pub const ENV_STORE_PATH: &str = "CRHS_STORE_PATH";
pub const ENV_REPORT_PATH: &str = "CRHS_REPORT_PATH";
pub const ENV_OFFLINE: &str = "CRHS_OFFLINE";

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Base URL of the model service, without a trailing slash.
    pub api_base: String,
    /// Region the risk feed is requested for at startup.
    pub region: Region,
    pub role: Role,
    /// Skip the model service entirely and use the rule-based predictor.
    pub offline: bool,
    pub request_timeout: Duration,
    /// Fetch the risk feed once as soon as the session starts.
    pub refresh_on_start: bool,
    /// Re-fetch the risk feed on this interval. `None` disables polling.
    pub refresh_interval: Option<Duration>,
    /// How long success/info banners stay visible.
    pub status_ttl: Duration,
    /// How long error/warning banners stay visible.
    pub error_status_ttl: Duration,
    /// Local capacity store. `None` disables local persistence.
    pub store_path: Option<PathBuf>,
    /// Where downloaded reports are written.
    pub report_path: PathBuf,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8000".to_string(),
            region: Region::Delhi,
            role: Role::Admin,
            offline: false,
            request_timeout: Duration::from_secs(15),
            refresh_on_start: true,
            refresh_interval: None,
            status_ttl: Duration::from_secs(2),
            error_status_ttl: Duration::from_secs(5),
            store_path: Some(PathBuf::from("crhs_capacity.bin")),
            report_path: PathBuf::from("climate_health_report.csv"),
        }
    }
}

impl EngineSettings {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`. Unparseable values are logged and the
    /// current value is kept.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(base) = lookup(ENV_API_BASE) {
            let base = base.trim().trim_end_matches('/');
            if base.is_empty() {
                warn!("{ENV_API_BASE} is empty; keeping {}", self.api_base);
            } else {
                self.api_base = base.to_string();
            }
        }

        if let Some(raw) = lookup(ENV_REGION) {
            match Region::from_name(&raw) {
                Some(region) => self.region = region,
                None => warn!("{ENV_REGION}={raw:?} is not a known region; keeping {}", self.region),
            }
        }

        if let Some(raw) = lookup(ENV_ROLE) {
            self.role = Role::from_name(&raw);
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            match parse_secs(&raw) {
                Some(secs) if secs > 0 => self.request_timeout = Duration::from_secs(secs),
                _ => warn!(
                    "{ENV_TIMEOUT_SECS}={raw:?} is not a positive integer; keeping {:?}",
                    self.request_timeout
                ),
            }
        }

        if let Some(raw) = lookup(ENV_REFRESH_SECS) {
            match parse_secs(&raw) {
                Some(0) => self.refresh_interval = None,
                Some(secs) => self.refresh_interval = Some(Duration::from_secs(secs)),
                None => warn!("{ENV_REFRESH_SECS}={raw:?} is not an integer; ignoring"),
            }
        }

        if let Some(raw) = lookup(ENV_STORE_PATH) {
            let raw = raw.trim();
            self.store_path = if raw.is_empty() {
                None
            } else {
                Some(PathBuf::from(raw))
            };
        }

        if let Some(raw) = lookup(ENV_REPORT_PATH) {
            let raw = raw.trim();
            if !raw.is_empty() {
                self.report_path = PathBuf::from(raw);
            }
        }

        if let Some(raw) = lookup(ENV_OFFLINE) {
            match parse_flag(&raw) {
                Some(flag) => self.offline = flag,
                None => warn!("{ENV_OFFLINE}={raw:?} is not a boolean; keeping {}", self.offline),
            }
        }

        self
    }

    /// Banner lifetime for a status of the given severity.
    pub fn status_lifetime(&self, is_error: bool) -> Duration {
        if is_error {
            self.error_status_ttl
        } else {
            self.status_ttl
        }
    }
}

fn parse_secs(raw: &str) -> Option<u64> {
    raw.trim().parse().ok()
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let s = EngineSettings::default();
        assert_eq!(s.api_base, "http://localhost:8000");
        assert_eq!(s.region, Region::Delhi);
        assert_eq!(s.request_timeout, Duration::from_secs(15));
        assert!(!s.offline);
        assert!(s.refresh_interval.is_none());
    }

    #[test]
    fn test_env_overrides_apply() {
        let s = EngineSettings::default().with_env_overrides(lookup(&[
            (ENV_API_BASE, "http://models.internal:9000/"),
            (ENV_REGION, "pune"),
            (ENV_ROLE, "analyst"),
            (ENV_TIMEOUT_SECS, "3"),
            (ENV_REFRESH_SECS, "60"),
            (ENV_STORE_PATH, "/tmp/cap.bin"),
            (ENV_OFFLINE, "yes"),
        ]));
        assert_eq!(s.api_base, "http://models.internal:9000");
        assert_eq!(s.region, Region::Pune);
        assert_eq!(s.role, Role::Analyst);
        assert_eq!(s.request_timeout, Duration::from_secs(3));
        assert_eq!(s.refresh_interval, Some(Duration::from_secs(60)));
        assert_eq!(s.store_path, Some(PathBuf::from("/tmp/cap.bin")));
        assert!(s.offline);
    }

    #[test]
    fn test_invalid_env_values_keep_defaults() {
        let s = EngineSettings::default().with_env_overrides(lookup(&[
            (ENV_REGION, "Gotham"),
            (ENV_TIMEOUT_SECS, "soon"),
            (ENV_OFFLINE, "maybe"),
        ]));
        assert_eq!(s, EngineSettings::default());
    }

    #[test]
    fn test_empty_store_path_disables_persistence() {
        let s = EngineSettings::default().with_env_overrides(lookup(&[(ENV_STORE_PATH, "")]));
        assert!(s.store_path.is_none());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let s = EngineSettings::default().with_env_overrides(lookup(&[(ENV_TIMEOUT_SECS, "0")]));
        assert_eq!(s.request_timeout, Duration::from_secs(15));
    }
}
