//! Process-wide tracing setup shared by the binaries.

/// Subscriber configuration (format, filter).
pub mod logging;

pub use logging::LogFormat;

/// Initialize tracing from `RUST_LOG` and `LOG_FORMAT`.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    let format = LogFormat::from_env_value(std::env::var("LOG_FORMAT").ok().as_deref());
    logging::init(format);
}
