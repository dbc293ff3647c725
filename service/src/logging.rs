use crate::config::{Config, RustEnv};
use log::{LevelFilter, SetLoggerError};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

/// Dependency targets that are silenced below `TRACE`. Their request-level chatter
/// drowns out the authorization flow logs we actually care about.
const NOISY_TARGETS: &[&str] = &[
    "sqlx",
    "sea_orm",
    "tower",
    "tower_sessions",
    "hyper",
    "hyper_util",
    "h2",
    "reqwest",
    "rustls",
    "axum",
];

pub struct Logger;

impl Logger {
    /// Installs the global `log` backend.
    ///
    /// Development gets colored, mixed stdout/stderr output. Staging and production
    /// write plain text to stderr so the container runtime can collect it untouched.
    pub fn init_logger(config: &Config) -> Result<(), SetLoggerError> {
        let (mode, color) = Self::terminal_for(&config.runtime_env());

        TermLogger::init(
            config.log_level_filter,
            Self::build_log_config(config.log_level_filter),
            mode,
            color,
        )
    }

    fn terminal_for(env: &RustEnv) -> (TerminalMode, ColorChoice) {
        match env {
            RustEnv::Development => (TerminalMode::Mixed, ColorChoice::Auto),
            RustEnv::Staging | RustEnv::Production => (TerminalMode::Stderr, ColorChoice::Never),
        }
    }

    fn ignored_targets(level: LevelFilter) -> &'static [&'static str] {
        if level == LevelFilter::Trace {
            &[]
        } else {
            NOISY_TARGETS
        }
    }

    fn build_log_config(level: LevelFilter) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder
            .set_time_format_rfc3339()
            .set_target_level(LevelFilter::Error)
            .set_thread_level(LevelFilter::Off);

        for target in Self::ignored_targets(level) {
            builder.add_filter_ignore_str(target);
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_level_shows_dependency_output() {
        assert!(Logger::ignored_targets(LevelFilter::Trace).is_empty());
    }

    #[test]
    fn lower_levels_silence_dependency_output() {
        for level in [
            LevelFilter::Off,
            LevelFilter::Error,
            LevelFilter::Warn,
            LevelFilter::Info,
            LevelFilter::Debug,
        ] {
            let ignored = Logger::ignored_targets(level);
            assert!(ignored.contains(&"sqlx"), "{level} should silence sqlx");
            assert!(ignored.contains(&"sea_orm"), "{level} should silence sea_orm");
            assert!(ignored.contains(&"reqwest"), "{level} should silence reqwest");
        }
    }

    #[test]
    fn deployed_environments_log_plain_text_to_stderr() {
        let (mode, color) = Logger::terminal_for(&RustEnv::Production);
        assert!(matches!(mode, TerminalMode::Stderr));
        assert!(matches!(color, ColorChoice::Never));

        let (mode, _) = Logger::terminal_for(&RustEnv::Development);
        assert!(matches!(mode, TerminalMode::Mixed));
    }

    #[test]
    fn log_config_builds_for_every_level() {
        let _ = Logger::build_log_config(LevelFilter::Trace);
        let _ = Logger::build_log_config(LevelFilter::Info);
    }
}
