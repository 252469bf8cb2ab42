//! Command-line flags for the `oht50d` daemon and the various shim binaries.

use std::path::PathBuf;

use clap::Parser;

use crate::config::LogLevel;

#[derive(Debug, Parser)]
#[command(name = "oht50d", about = "OHT-50 master module firmware")]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "/etc/oht50/oht50.toml")]
    pub config: PathBuf,

    /// Override the configured log level.
    #[arg(long)]
    pub log_level: Option<LogLevel>,

    /// Force simulation mode: disable RT syscalls (sched_setscheduler,
    /// mlockall, CLOCK_MONOTONIC absolute sleeps) even in an `rt`-feature
    /// build, and use simulated HAL shims regardless of configuration.
    #[arg(long, default_value_t = false)]
    pub simulate: bool,
}

// clap's derive requires `LogLevel` to implement `clap::ValueEnum` to be
// usable as a flag value; implement it here rather than pulling the
// `derive` feature's `ValueEnum` derive into oht50_common's dependency on
// a type that otherwise only needs Serialize/Deserialize.
impl clap::ValueEnum for LogLevel {
    fn value_variants<'a>() -> &'a [Self] {
        &[
            LogLevel::Trace,
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warn,
            LogLevel::Error,
        ]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(self.as_filter_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_defaults() {
        let cli = Cli::parse_from(["oht50d"]);
        assert_eq!(cli.config, PathBuf::from("/etc/oht50/oht50.toml"));
        assert!(cli.log_level.is_none());
        assert!(!cli.simulate);
    }

    #[test]
    fn parses_overrides() {
        let cli = Cli::parse_from([
            "oht50d",
            "--config",
            "/tmp/x.toml",
            "--log-level",
            "debug",
            "--simulate",
        ]);
        assert_eq!(cli.config, PathBuf::from("/tmp/x.toml"));
        assert_eq!(cli.log_level, Some(LogLevel::Debug));
        assert!(cli.simulate);
    }
}
