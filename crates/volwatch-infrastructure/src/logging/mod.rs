//! Logging setup
//!
//! - one-line JSON records in a daily-rotated file
//! - human-readable colored output on stdout (debug builds or on request)
//! - `log` records from dependencies bridged into `tracing`
//!
//! Every JSON record carries: timestamp (ISO 8601, millisecond precision,
//! UTC), level, target, pid, tid, thread name, file + line, message,
//! structured fields and the crate version.

use log::LevelFilter;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::Level;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_log::LogTracer;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer, Registry};

static LOG_DIR: OnceLock<PathBuf> = OnceLock::new();
static LOGGER_READY: OnceLock<()> = OnceLock::new();
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

const LOG_FILE_PREFIX: &str = "volwatch.log";

/// Install the global subscriber. Calling it twice is a no-op.
pub fn init_logger(log_dir: PathBuf, stdout: bool) -> anyhow::Result<()> {
    if LOGGER_READY.get().is_some() {
        return Ok(());
    }

    std::fs::create_dir_all(&log_dir)?;
    let _ = LOG_DIR.set(log_dir.clone());

    let _ = LogTracer::builder()
        .with_max_level(LevelFilter::Trace)
        .init();

    let file_appender = rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = FILE_GUARD.set(guard);

    let json_layer = fmt::layer()
        .with_writer(non_blocking)
        .event_format(JsonFormatter::new())
        .with_filter(file_filter());

    let stdout_layer = if stdout {
        Some(
            fmt::layer()
                .with_ansi(true)
                .event_format(HumanReadableFormatter)
                .with_filter(stdout_filter()),
        )
    } else {
        None
    };

    let subscriber = Registry::default().with(json_layer).with(stdout_layer);

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set global subscriber: {}", e))?;

    let _ = LOGGER_READY.set(());

    tracing::info!(
        target: "volwatch::logging",
        log_dir = %log_dir.display(),
        version = env!("CARGO_PKG_VERSION"),
        profile = if cfg!(debug_assertions) { "Debug" } else { "Release" },
        "Logger initialized"
    );

    Ok(())
}

/// File filter: `RUST_LOG` wins, otherwise INFO (release) or DEBUG (debug).
fn file_filter() -> EnvFilter {
    let default_level = if cfg!(debug_assertions) {
        "info,volwatch=debug,volwatch_app=debug,volwatch_infrastructure=debug"
    } else {
        "info"
    };

    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn stdout_filter() -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,volwatch_app=debug"))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Directory given to `init_logger`, if it ran.
pub fn get_log_dir() -> Option<PathBuf> {
    LOG_DIR.get().cloned()
}

// ============================================================
// Formatters
// ============================================================

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::{format::Writer, FmtContext, FormatEvent, FormatFields, FormattedFields};
use tracing_subscriber::registry::LookupSpan;

/// One-line JSON formatter
struct JsonFormatter {
    pid: u32,
    version: &'static str,
}

impl JsonFormatter {
    fn new() -> Self {
        Self {
            pid: std::process::id(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

impl<S, N> FormatEvent<S, N> for JsonFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let thread = std::thread::current();

        let mut fields = FieldCollector::default();
        event.record(&mut fields);
        let message = fields.0.remove("message").unwrap_or_default();

        let spans: Vec<&str> = ctx
            .event_scope()
            .map(|scope| scope.from_root().map(|span| span.name()).collect())
            .unwrap_or_default();

        let record = serde_json::json!({
            "timestamp": chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            "level": metadata.level().as_str(),
            "pid": self.pid,
            "tid": format!("{:?}", thread.id()),
            "thread_name": thread.name().unwrap_or("unnamed"),
            "target": metadata.target(),
            "file": metadata.file(),
            "line": metadata.line(),
            "spans": spans,
            "message": message,
            "fields": fields.0,
            "version": self.version,
        });

        writeln!(writer, "{}", record)
    }
}

/// Human-readable formatter
/// `2020-06-15 12:00:00.123 INFO tick{uid=42}: volwatch_app::scheduler: message key=value (src/x.rs:10)`
struct HumanReadableFormatter;

impl HumanReadableFormatter {
    fn level(level: &Level) -> &'static str {
        match *level {
            Level::ERROR => "\x1b[31mERROR\x1b[0m",
            Level::WARN => "\x1b[33m WARN\x1b[0m",
            Level::INFO => "\x1b[32m INFO\x1b[0m",
            Level::DEBUG => "\x1b[36mDEBUG\x1b[0m",
            Level::TRACE => "\x1b[35mTRACE\x1b[0m",
        }
    }
}

impl<S, N> FormatEvent<S, N> for HumanReadableFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        write!(
            writer,
            "{} {} ",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            Self::level(metadata.level())
        )?;

        // scheduler spans carry the uid
        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                write!(writer, "{}", span.name())?;
                let extensions = span.extensions();
                if let Some(fields) = extensions.get::<FormattedFields<N>>() {
                    if !fields.is_empty() {
                        write!(writer, "{{{}}}", fields)?;
                    }
                }
                write!(writer, ": ")?;
            }
        }

        let mut fields = FieldCollector::default();
        event.record(&mut fields);
        let message = fields.0.remove("message");

        write!(writer, "{}: ", metadata.target())?;
        match message {
            Some(serde_json::Value::String(text)) => write!(writer, "{}", text)?,
            Some(other) => write!(writer, "{}", other)?,
            None => {}
        }
        for (key, value) in &fields.0 {
            write!(writer, " {}={}", key, value)?;
        }
        if let (Some(file), Some(line)) = (metadata.file(), metadata.line()) {
            write!(writer, " ({}:{})", file, line)?;
        }
        writeln!(writer)
    }
}

/// Collects event fields into a JSON map
#[derive(Default)]
struct FieldCollector(serde_json::Map<String, serde_json::Value>);

impl FieldCollector {
    fn put(&mut self, field: &Field, value: impl Into<serde_json::Value>) {
        self.0.insert(field.name().to_string(), value.into());
    }
}

impl Visit for FieldCollector {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.put(field, value);
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, value);
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, value);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, value);
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, value);
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.put(field, format!("{:?}", value));
    }
}
