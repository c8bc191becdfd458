use std::sync::Once;

/// Crates whose info/debug output drowns out the canvas's own logs.
const NOISY_BACKENDS: &[&str] = &["wgpu_core", "wgpu_hal", "naga"];

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info", "warn",
/// "nabu_engine=debug,wgpu_core=warn"). Falls back to `RUST_LOG`, then info.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
    /// Caps the GPU backend crates at warn unless the filter names them.
    pub quiet_backends: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
            quiet_backends: true,
        }
    }
}

/// Backends not mentioned in `filter` and therefore capped.
fn backends_to_quiet(filter: Option<&str>) -> Vec<&'static str> {
    NOISY_BACKENDS
        .iter()
        .copied()
        .filter(|name| {
            !filter.is_some_and(|f| f.split(',').any(|directive| directive.trim().starts_with(name)))
        })
        .collect()
}

static INIT: Once = Once::new();

/// Initializes the global logger once.
///
/// Idempotent; call early in `main`.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        let filter = config.env_filter.or_else(|| std::env::var("RUST_LOG").ok());
        match filter.as_deref() {
            Some(f) => {
                builder.parse_filters(f);
            }
            None => {
                builder.filter_level(log::LevelFilter::Info);
            }
        }

        if config.quiet_backends {
            for name in backends_to_quiet(filter.as_deref()) {
                builder.filter_module(name, log::LevelFilter::Warn);
            }
        }

        builder.write_style(config.write_style);
        builder.init();

        log::debug!("logging initialized");
    });
}
