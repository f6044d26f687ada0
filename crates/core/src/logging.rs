//! Logging and observability
//!
//! Structured logging via `tracing`, with either human-readable text or JSON
//! formatting selected at runtime. All logging output is directed to stderr so
//! that stdout stays with the child processes launched inside an environment.

use anyhow::Result;
use std::{io, sync::Once};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

static INIT: Once = Once::new();

/// Environment variable holding a filter directive (highest precedence)
pub const LOG_ENV: &str = "BEOKAY_LOG";

/// Environment variable selecting the output format (`json` or text)
pub const LOG_FORMAT_ENV: &str = "BEOKAY_LOG_FORMAT";

/// Initialize the logging system with an optional format specification
///
/// Can be called multiple times safely; subsequent calls are no-ops.
///
/// ## Arguments
///
/// * `format` - `None` or `"text"` for human-readable output, `"json"` for
///   structured JSON. When `None`, `BEOKAY_LOG_FORMAT` is consulted.
/// * `default_directive` - Filter used when neither environment variable is
///   set. Falls back to `info`.
///
/// ## Environment Variables
///
/// * `BEOKAY_LOG_FORMAT` - Output format ("json" for JSON, any other value for text)
/// * `BEOKAY_LOG` - Filter directive
/// * `RUST_LOG` - Fallback filter directive
pub fn init(format: Option<&str>, default_directive: Option<&str>) -> Result<()> {
    INIT.call_once(|| {
        let filter = create_env_filter(default_directive);

        let env_format = std::env::var(LOG_FORMAT_ENV).ok();
        let effective_format = format.or(env_format.as_deref()).unwrap_or("text");

        match effective_format {
            "json" => {
                tracing_subscriber::registry()
                    .with(
                        fmt::layer()
                            .json()
                            .with_target(true)
                            .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
                            .with_writer(io::stderr),
                    )
                    .with(filter)
                    .init();
            }
            _ => {
                tracing_subscriber::registry()
                    .with(fmt::layer().with_target(false).with_writer(io::stderr))
                    .with(filter)
                    .init();
            }
        }

        tracing::debug!("Logging initialized with format: {}", effective_format);
    });

    Ok(())
}

/// Create an EnvFilter from `BEOKAY_LOG`, then `RUST_LOG`, then `default_directive`
fn create_env_filter(default_directive: Option<&str>) -> EnvFilter {
    let fallback = || {
        default_directive
            .and_then(|spec| EnvFilter::try_new(spec).ok())
            .unwrap_or_else(|| EnvFilter::new("info"))
    };

    if let Ok(spec) = std::env::var(LOG_ENV) {
        EnvFilter::try_new(&spec).unwrap_or_else(|_| {
            eprintln!("Invalid {} specification '{}', using 'info'", LOG_ENV, spec);
            EnvFilter::new("info")
        })
    } else if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback())
    } else {
        fallback()
    }
}

/// Check if logging has been initialized
pub fn is_initialized() -> bool {
    INIT.is_completed()
}
