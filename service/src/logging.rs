use crate::config::Config;
use log::LevelFilter;
use simplelog::{self, ConfigBuilder};

/// Modules to filter out from logging when not in Trace mode.
/// These are typically verbose dependencies that clutter normal log output.
const FILTERED_MODULES: &[&str] = &[
    "reqwest",
    "reqwest_retry",
    "hyper",
    "hyper_util",
    "rustls",
    "cookie_store",
    "mockito",
];

pub struct Logger {}

impl Logger {
    /// Initializes the global logger with configuration based on the provided Config.
    ///
    /// When the log level is set to Trace, all logs including dependency logs are shown.
    /// For all other log levels, verbose dependency logs are filtered out.
    pub fn init_logger(config: &Config) {
        let log_level_filter = Self::convert_level_filter(config.log_level_filter);
        let apply_filters = Self::should_filter_dependencies(config.log_level_filter);
        let log_config = Self::build_log_config(apply_filters);

        // A second init (e.g. from tests) keeps the first logger.
        if let Err(e) = simplelog::TermLogger::init(
            log_level_filter,
            log_config,
            simplelog::TerminalMode::Mixed,
            simplelog::ColorChoice::Auto,
        ) {
            eprintln!("Failed to start simplelog: {e}");
        }
    }

    /// Converts log::LevelFilter to simplelog::LevelFilter.
    fn convert_level_filter(level: LevelFilter) -> simplelog::LevelFilter {
        match level {
            LevelFilter::Off => simplelog::LevelFilter::Off,
            LevelFilter::Error => simplelog::LevelFilter::Error,
            LevelFilter::Warn => simplelog::LevelFilter::Warn,
            LevelFilter::Info => simplelog::LevelFilter::Info,
            LevelFilter::Debug => simplelog::LevelFilter::Debug,
            LevelFilter::Trace => simplelog::LevelFilter::Trace,
        }
    }

    /// Determines whether dependency logging should be filtered.
    ///
    /// Returns `false` for Trace level (show all logs), `true` for all other levels.
    fn should_filter_dependencies(level: LevelFilter) -> bool {
        level != LevelFilter::Trace
    }

    /// Builds a simplelog Config with optional module filtering.
    ///
    /// When `apply_filters` is true, logs from noisy dependencies are suppressed.
    fn build_log_config(apply_filters: bool) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder.set_time_format_rfc3339();

        if apply_filters {
            for module in FILTERED_MODULES {
                builder.add_filter_ignore_str(module);
            }
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEVELS: [(LevelFilter, simplelog::LevelFilter); 6] = [
        (LevelFilter::Off, simplelog::LevelFilter::Off),
        (LevelFilter::Error, simplelog::LevelFilter::Error),
        (LevelFilter::Warn, simplelog::LevelFilter::Warn),
        (LevelFilter::Info, simplelog::LevelFilter::Info),
        (LevelFilter::Debug, simplelog::LevelFilter::Debug),
        (LevelFilter::Trace, simplelog::LevelFilter::Trace),
    ];

    #[test]
    fn test_filtered_modules_cover_http_stack() {
        for module in ["reqwest", "hyper", "rustls", "cookie_store", "mockito"] {
            assert!(
                FILTERED_MODULES.contains(&module),
                "{module} should be filtered"
            );
        }
        assert!(
            !FILTERED_MODULES.contains(&"solar_auth"),
            "the auth core itself must never be filtered"
        );
    }

    #[test]
    fn test_only_trace_shows_dependency_logs() {
        for (level, _) in LEVELS {
            assert_eq!(
                Logger::should_filter_dependencies(level),
                level != LevelFilter::Trace,
                "unexpected filtering for {level}"
            );
        }
    }

    #[test]
    fn test_build_log_config_does_not_panic() {
        let _filtered = Logger::build_log_config(true);
        let _unfiltered = Logger::build_log_config(false);
    }

    #[test]
    fn test_convert_level_filter_all_variants() {
        for (level, expected) in LEVELS {
            assert_eq!(Logger::convert_level_filter(level) as u8, expected as u8);
        }
    }
}
