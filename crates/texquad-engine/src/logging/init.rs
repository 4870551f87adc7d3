use std::sync::Once;

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info", "warn",
/// "texquad_engine=debug,wgpu_core=warn").
///
/// `default_filter` applies when neither `env_filter` nor `RUST_LOG` is set.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub default_filter: String,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            default_filter: "info".to_string(),
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

impl LoggingConfig {
    /// Picks the filter string: explicit config, then `rust_log`, then the default.
    fn resolve_filter(&self, rust_log: Option<String>) -> String {
        self.env_filter
            .clone()
            .or(rust_log.filter(|f| !f.trim().is_empty()))
            .unwrap_or_else(|| self.default_filter.clone())
    }
}

static INIT: Once = Once::new();

/// Initializes the global logger once.
///
/// This function is idempotent; subsequent calls are ignored.
/// Intended usage is early in `main`.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = config.resolve_filter(std::env::var("RUST_LOG").ok());

        let mut builder = env_logger::Builder::new();
        builder.parse_filters(&filter);
        builder.write_style(config.write_style);

        // Another logger may already be installed (tests, embedding hosts).
        if builder.try_init().is_err() {
            return;
        }

        log::debug!("logging initialized with filter `{filter}`");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_filter_wins_over_rust_log() {
        let config = LoggingConfig {
            env_filter: Some("warn".into()),
            ..LoggingConfig::default()
        };
        assert_eq!(config.resolve_filter(Some("trace".into())), "warn");
    }

    #[test]
    fn rust_log_used_when_no_explicit_filter() {
        let config = LoggingConfig::default();
        assert_eq!(config.resolve_filter(Some("debug".into())), "debug");
    }

    #[test]
    fn blank_rust_log_falls_back_to_default() {
        let config = LoggingConfig {
            default_filter: "info,naga=warn".into(),
            ..LoggingConfig::default()
        };
        assert_eq!(config.resolve_filter(Some("  ".into())), "info,naga=warn");
        assert_eq!(config.resolve_filter(None), "info,naga=warn");
    }

    #[test]
    fn init_is_idempotent() {
        init_logging(LoggingConfig::default());
        init_logging(LoggingConfig::default());
    }
}
