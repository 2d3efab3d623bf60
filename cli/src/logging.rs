//! Tracing setup.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Environment variable holding a level (`debug`) or a full filter spec.
pub const LOG_ENV: &str = "OAPIGEN_LOG";

const CRATES: [&str; 2] = ["oapigen", "oapigen_core"];

fn is_plain_level(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error" | "off"
    )
}

fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Filter directives for `verbosity`, unless `env_value` overrides them.
pub fn filter_spec(verbosity: u8, env_value: Option<&str>) -> String {
    let level = match env_value {
        Some(value) if is_plain_level(value) => value.to_string(),
        Some(spec) => return spec.to_string(),
        None => level_for(verbosity).to_string(),
    };
    CRATES
        .iter()
        .map(|name| format!("{}={}", name, level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Installs a stderr formatter filtered by [`filter_spec`].
pub fn init_tracing(verbosity: u8) {
    let env_value = std::env::var(LOG_ENV).ok();
    let filter = filter_spec(verbosity, env_value.as_deref());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(EnvFilter::new(filter));

    if tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_spec_from_verbosity() {
        assert_eq!(filter_spec(0, None), "oapigen=warn,oapigen_core=warn");
        assert_eq!(filter_spec(2, None), "oapigen=debug,oapigen_core=debug");
        assert_eq!(filter_spec(9, None), "oapigen=trace,oapigen_core=trace");
    }

    #[test]
    fn test_env_overrides_verbosity() {
        assert_eq!(filter_spec(0, Some("DEBUG")), "oapigen=DEBUG,oapigen_core=DEBUG");
        assert_eq!(filter_spec(3, Some("oapigen_core=info")), "oapigen_core=info");
    }
}
