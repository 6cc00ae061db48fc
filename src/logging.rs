//! Logging infrastructure - structured tracing for the pool model
//!
//! Design: uses `tracing` so the per-step hot path costs nothing when the
//! level is filtered out. Events are grouped under three targets:
//! - `freelist::alloc` for grants and exhaustion
//! - `freelist::dealloc` for releases
//! - `freelist::control` for reset, scan, load and step commits

use once_cell::sync::OnceCell;
use tracing::{debug, info, trace, Level, Subscriber};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

static LOGGER_INITIALIZED: OnceCell<()> = OnceCell::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    Stderr,
    /// Daily-rotated file
    File { directory: String, prefix: String },
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: Level,
    pub format: LogFormat,
    pub output: LogOutput,
    /// Emit span enter/close events (one `step` span per cycle)
    pub show_spans: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Compact,
            output: LogOutput::Stderr,
            show_spans: false,
        }
    }
}

impl LogConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // FREELIST_LOG_LEVEL: trace, debug, info, warn, error
        if let Ok(level_str) = std::env::var("FREELIST_LOG_LEVEL") {
            config.level = parse_level(&level_str).unwrap_or(Level::INFO);
        }

        // FREELIST_LOG_FILE: directory for rotated log files
        if let Ok(directory) = std::env::var("FREELIST_LOG_FILE") {
            config.output = LogOutput::File {
                directory,
                prefix: "freelist.log".to_string(),
            };
        }

        if std::env::var("FREELIST_LOG_JSON").is_ok() {
            config.format = LogFormat::Json;
        }

        config.show_spans = std::env::var("FREELIST_LOG_SPANS").is_ok();

        config
    }

    /// Per-step tracing of every grant and release
    pub fn debug() -> Self {
        Self {
            level: Level::TRACE,
            format: LogFormat::Pretty,
            output: LogOutput::Stderr,
            show_spans: true,
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }
}

fn parse_level(s: &str) -> Option<Level> {
    match s.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Initialize logging from the environment
pub fn init() -> Option<WorkerGuard> {
    init_with_config(LogConfig::from_env())
}

/// Initialize logging once; later calls are no-ops and return `None`.
///
/// The returned guard flushes the non-blocking writer on drop, so hold it for
/// the lifetime of the program.
pub fn init_with_config(config: LogConfig) -> Option<WorkerGuard> {
    if LOGGER_INITIALIZED.set(()).is_err() {
        return None;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("freelist={}", config.level.as_str().to_lowercase()))
    });

    let (writer, guard) = match &config.output {
        LogOutput::Stdout => tracing_appender::non_blocking(std::io::stdout()),
        LogOutput::Stderr => tracing_appender::non_blocking(std::io::stderr()),
        LogOutput::File { directory, prefix } => {
            tracing_appender::non_blocking(rolling::daily(directory, prefix))
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(build_layer(config.format, writer, config.show_spans))
        .try_init()
        .ok()?;

    Some(guard)
}

pub fn is_initialized() -> bool {
    LOGGER_INITIALIZED.get().is_some()
}

fn build_layer<S>(format: LogFormat, writer: NonBlocking, show_spans: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let span_events = if show_spans {
        FmtSpan::ENTER | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let layer = fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_span_events(span_events);

    match format {
        LogFormat::Pretty => layer.pretty().boxed(),
        LogFormat::Compact => layer.compact().boxed(),
        LogFormat::Json => layer.json().boxed(),
    }
}

// ============================================================================
// Pool events
// ============================================================================

pub fn log_pool_created(width: usize, trackable: usize, alloc_ports: usize, dealloc_ports: usize) {
    info!(
        target: "freelist::control",
        width,
        trackable,
        alloc_ports,
        dealloc_ports,
        "free list created"
    );
}

#[inline]
pub fn log_grant(port: usize, slot: usize) {
    trace!(target: "freelist::alloc", port, slot, "slot granted");
}

#[inline]
pub fn log_exhausted(port: usize) {
    debug!(target: "freelist::alloc", port, "no free slot for port");
}

#[inline]
pub fn log_release(slot: usize) {
    trace!(target: "freelist::dealloc", slot, "slot released");
}

#[inline]
pub fn log_redundant_release(count: usize) {
    trace!(target: "freelist::dealloc", count, "released slots that were already free");
}

pub fn log_reset(previously_taken: usize) {
    info!(target: "freelist::control", previously_taken, "pool reset");
}

#[inline]
pub fn log_scan_shift(scan_in: bool, scan_out: bool) {
    trace!(target: "freelist::control", scan_in, scan_out, "scan shift");
}

pub fn log_snapshot_load(taken: usize) {
    info!(target: "freelist::control", taken, "snapshot loaded");
}

#[inline]
pub fn log_step_committed(granted: usize, released: usize, taken: usize, pool_empty: bool) {
    debug!(
        target: "freelist::control",
        granted,
        released,
        taken,
        pool_empty,
        "step committed"
    );
}
