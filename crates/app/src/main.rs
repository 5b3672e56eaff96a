use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use bevy::log::{Level, LogPlugin};
use bevy::prelude::*;
use clap::{ArgAction, Parser};

use engine::environment::Region;
use engine::session::Role;
use engine::settings::EngineSettings;

mod session_mode;

#[derive(Parser, Debug)]
#[command(name = "crhs")]
#[command(
    about = "Climate-health risk & capacity planning session over stdin/stdout",
    long_about = None
)]
struct Cli {
    /// Model service base URL (overrides CRHS_API_BASE)
    #[arg(long, value_name = "URL")]
    api_base: Option<String>,

    /// Region to load risk for at startup
    #[arg(long)]
    region: Option<Region>,

    /// Session role: admin, clinician, analyst or guest
    #[arg(long)]
    role: Option<String>,

    /// Never contact the model service; predict with the rule-based fallback
    #[arg(long, action = ArgAction::SetTrue)]
    offline: bool,

    /// Per-request timeout in seconds (at least 1)
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: Option<u64>,

    /// Re-fetch the risk feed every SECS seconds
    #[arg(long, value_name = "SECS")]
    refresh_secs: Option<u64>,

    /// Skip the risk fetch at startup
    #[arg(long, action = ArgAction::SetTrue)]
    no_initial_refresh: bool,

    /// Local capacity store file
    #[arg(long, value_name = "FILE", conflicts_with = "no_store")]
    store_path: Option<PathBuf>,

    /// Keep capacity in memory only
    #[arg(long, action = ArgAction::SetTrue)]
    no_store: bool,

    /// Where downloaded reports are written
    #[arg(long, value_name = "FILE")]
    report_path: Option<PathBuf>,

    /// Log level (logs go to stderr)
    #[arg(long, default_value = "info")]
    log_level: Level,
}

impl Cli {
    /// Layer the flags that were given over `settings`.
    fn apply(&self, mut settings: EngineSettings) -> EngineSettings {
        if let Some(api_base) = &self.api_base {
            settings.api_base = api_base.trim_end_matches('/').to_string();
        }
        if let Some(region) = self.region {
            settings.region = region;
        }
        if let Some(role) = &self.role {
            settings.role = Role::from_name(role);
        }
        if self.offline {
            settings.offline = true;
        }
        if let Some(secs) = self.timeout_secs {
            settings.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.refresh_secs {
            settings.refresh_interval = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if self.no_initial_refresh {
            settings.refresh_on_start = false;
        }
        if self.no_store {
            settings.store_path = None;
        } else if let Some(path) = &self.store_path {
            settings.store_path = Some(path.clone());
        }
        if let Some(path) = &self.report_path {
            settings.report_path = path.clone();
        }
        settings
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let settings = cli.apply(EngineSettings::from_env());
    let settle_timeout = settings.request_timeout + Duration::from_secs(1);

    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins(LogPlugin {
            level: cli.log_level,
            ..default()
        })
        .insert_resource(settings)
        .add_plugins((engine::EnginePlugin, save::LocalStorePlugin));

    match session_mode::run_session_mode(app, settle_timeout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Session ended with an I/O error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("crhs").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_no_flags_keeps_settings() {
        let base = EngineSettings::default();
        assert_eq!(parse(&[]).apply(base.clone()), base);
    }

    #[test]
    fn test_flags_override_settings() {
        let cli = parse(&[
            "--api-base",
            "http://model:9000/",
            "--region",
            "mumbai",
            "--role",
            "Analyst",
            "--timeout-secs",
            "3",
            "--refresh-secs",
            "60",
            "--no-initial-refresh",
            "--report-path",
            "out/report.csv",
        ]);
        let settings = cli.apply(EngineSettings::default());
        assert_eq!(settings.api_base, "http://model:9000");
        assert_eq!(settings.region, Region::Mumbai);
        assert_eq!(settings.role, Role::Analyst);
        assert_eq!(settings.request_timeout, Duration::from_secs(3));
        assert_eq!(settings.refresh_interval, Some(Duration::from_secs(60)));
        assert!(!settings.refresh_on_start);
        assert_eq!(settings.report_path, PathBuf::from("out/report.csv"));
    }

    #[test]
    fn test_no_store_disables_persistence() {
        let settings = parse(&["--no-store", "--offline"]).apply(EngineSettings::default());
        assert_eq!(settings.store_path, None);
        assert!(settings.offline);
    }

    #[test]
    fn test_unknown_region_rejected() {
        let args = ["crhs", "--region", "atlantis"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let args = ["crhs", "--timeout-secs", "0"];
        assert!(Cli::try_parse_from(args).is_err());
        let settings = parse(&["--timeout-secs", "1"]).apply(EngineSettings::default());
        assert_eq!(settings.request_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_store_flags_conflict() {
        let args = ["crhs", "--no-store", "--store-path", "x.bin"];
        assert!(Cli::try_parse_from(args).is_err());
    }
}
