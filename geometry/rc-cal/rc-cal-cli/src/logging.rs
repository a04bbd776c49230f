use eyre::Context;
use time::{UtcOffset, format_description::well_known::Iso8601};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, time::OffsetTime},
    layer::SubscriberExt,
};

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

struct Guard {}

impl Drop for Guard {
    fn drop(&mut self) {}
}

/// Log to the console only.
pub fn init() -> eyre::Result<impl Drop> {
    initiate_logging::<&str>(None)
}

/// Start logging to the console and, if `path` is given, to a file.
pub fn initiate_logging<P: AsRef<std::path::Path>>(path: Option<P>) -> eyre::Result<impl Drop> {
    // Offset of the local timezone when logging starts.
    let timer = OffsetTime::new(
        UtcOffset::from_whole_seconds(chrono::Local::now().offset().local_minus_utc())?,
        Iso8601::DEFAULT,
    );

    let file_layer = match &path {
        Some(path) => {
            let path = path.as_ref();
            let file = std::fs::File::create(path)
                .with_context(|| format!("creating log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_timer(timer.clone())
                    .with_writer(std::sync::Mutex::new(file))
                    .with_ansi(false)
                    .with_file(true)
                    .with_line_number(true),
            )
        }
        None => None,
    };

    let console_layer = fmt::layer()
        .with_timer(timer)
        .with_writer(std::io::stderr)
        .with_ansi(!cfg!(windows))
        .with_file(true)
        .with_line_number(true);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let collector = tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .with(filter);
    tracing::subscriber::set_global_default(collector)?;

    let log_var = match std::env::var("RUST_LOG") {
        Ok(var) => format!(" with RUST_LOG=\"{var}\"."),
        Err(_) => format!(" with default filter \"{DEFAULT_FILTER}\"."),
    };
    match &path {
        Some(path) => tracing::debug!(
            "Logging initiated to console and file \"{}\"{log_var}",
            path.as_ref().display()
        ),
        None => tracing::debug!("Logging initiated to console{log_var}"),
    }

    Ok(Guard {})
}
