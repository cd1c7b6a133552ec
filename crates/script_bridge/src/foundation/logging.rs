//! Logging utilities and structured logging support

use env_logger::{Builder, Env, WriteStyle};

use crate::config::LoggingConfig;

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system from configuration
///
/// `RUST_LOG` wins over the configured filter. Calling this more than once is harmless.
pub fn init(config: &LoggingConfig) {
    let env = Env::default().default_filter_or(config.filter.as_str());
    let mut builder = Builder::from_env(env);
    builder.write_style(parse_write_style(&config.write_style));

    if builder.try_init().is_err() {
        log::debug!("Logger already initialized, keeping existing configuration");
    }
}

fn parse_write_style(style: &str) -> WriteStyle {
    match style {
        "always" => WriteStyle::Always,
        "never" => WriteStyle::Never,
        _ => WriteStyle::Auto,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        let config = LoggingConfig::default();
        init(&config);
        init(&config);
        log::info!("logging initialized twice");
    }

    #[test]
    fn test_parse_write_style() {
        assert!(matches!(parse_write_style("never"), WriteStyle::Never));
        assert!(matches!(parse_write_style("garbage"), WriteStyle::Auto));
    }
}
