//! Stderr logger used by the CLI and by tests.
//!
//! Lines look like `[  0.012s  INFO perio_landmarks] message`. The detector's
//! per-stage diagnostic events are logged under [`DIAGNOSTICS_TARGET`] and get
//! their own level, so a batch run can trace why single radiographs were
//! rejected without drowning in everything else. Install the logger once at
//! startup with [`init_with_level`] or [`init_with_levels`].

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

/// `log` target of the detector's diagnostic events.
pub const DIAGNOSTICS_TARGET: &str = "perio_landmarks";

/// Level filters for general output and for detector diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogLevels {
    pub general: LevelFilter,
    pub diagnostics: LevelFilter,
}

impl LogLevels {
    pub fn uniform(level: LevelFilter) -> Self {
        Self {
            general: level,
            diagnostics: level,
        }
    }

    /// Filter that applies to records of `target`.
    pub fn for_target(&self, target: &str) -> LevelFilter {
        let diagnostic = target
            .strip_prefix(DIAGNOSTICS_TARGET)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"));
        if diagnostic {
            self.diagnostics
        } else {
            self.general
        }
    }

    /// `EnvFilter`-style directive, e.g. `info,perio_landmarks=debug`.
    pub fn directive(&self) -> String {
        let general = self.general.to_string().to_lowercase();
        if self.diagnostics == self.general {
            general
        } else {
            let diagnostics = self.diagnostics.to_string().to_lowercase();
            format!("{general},{DIAGNOSTICS_TARGET}={diagnostics}")
        }
    }

    fn max(&self) -> LevelFilter {
        self.general.max(self.diagnostics)
    }
}

struct StderrLogger {
    levels: LogLevels,
    started: Instant,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.levels.for_target(metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let elapsed = self.started.elapsed().as_secs_f64();
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(
            stderr,
            "[{:7.3}s {:>5} {}] {}",
            elapsed,
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Install the stderr logger with one level for every target.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    init_with_levels(LogLevels::uniform(level))
}

/// Install the stderr logger with a separate level for detector diagnostics.
///
/// Only the first call installs the logger; later calls are no-ops.
pub fn init_with_levels(levels: LogLevels) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_none() {
        let logger = LOGGER.get_or_init(|| StderrLogger {
            levels,
            started: Instant::now(),
        });
        log::set_logger(logger)?;
        log::set_max_level(levels.max());
    }
    Ok(())
}

/// Install a `tracing` subscriber filtered by `RUST_LOG`, falling back to
/// `default_directive` (e.g. `"info"`) when the variable is unset.
///
/// With `json = true` events are emitted as flattened JSON lines, which is
/// what batch runs over many radiographs want. `log` records are bridged
/// into the subscriber.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool, default_directive: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    if json {
        let _ = fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
            .finish()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .with_timer(fmt::time::Uptime::default())
            .with_writer(std::io::stderr)
            .finish()
            .try_init();
    }
}
