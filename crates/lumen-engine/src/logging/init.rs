use std::sync::Once;

/// Filter applied when neither an explicit filter nor `RUST_LOG` is given.
/// wgpu and naga are chatty at info.
pub const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

/// Logger configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `env_logger` filter syntax (e.g. "debug", "lumen_engine=trace,wgpu=warn").
    /// Takes precedence over `RUST_LOG`.
    pub filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

fn effective_filter(config: &LoggingConfig, rust_log: Option<String>) -> String {
    config
        .filter
        .clone()
        .or(rust_log.filter(|f| !f.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

static INIT: Once = Once::new();

/// Installs `env_logger` as the global logger; only the first call has an
/// effect.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = effective_filter(&config, std::env::var("RUST_LOG").ok());

        let mut builder = env_logger::Builder::new();
        builder
            .parse_filters(&filter)
            .write_style(config.write_style)
            .format_timestamp_millis();

        // A test harness may have installed a logger already.
        if builder.try_init().is_ok() {
            log::debug!("logging initialized with `{filter}`");
        }
    });
}
