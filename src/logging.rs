//! Process-wide logging
//!
//! One tracing subscriber writing to stderr. Its level can be changed after
//! installation, so the `--log-level` choice applies once argv has been parsed.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, Registry};

use crate::parser::LogLevel;

static HANDLE: OnceLock<reload::Handle<LevelFilter, Registry>> = OnceLock::new();
static CURRENT: AtomicU8 = AtomicU8::new(LEVEL_UNSET);

const LEVEL_UNSET: u8 = u8::MAX;

/// Set the process log level, installing the subscriber on first use.
pub fn set_level(level: LogLevel) {
    let filter = LevelFilter::from(level);

    if let Some(handle) = HANDLE.get() {
        if let Err(e) = handle.reload(filter) {
            eprintln!("Error: Failed to change log level: {}", e);
        }
    } else {
        let (filter_layer, handle) = reload::Layer::new(filter);
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE);

        match tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .try_init()
        {
            Ok(()) => {
                let _ = HANDLE.set(handle);
            }
            // Another subscriber owns the process (e.g. a test harness); only record the level.
            Err(e) => tracing::debug!("logging already initialised: {}", e),
        }
    }

    CURRENT.store(level as u8, Ordering::SeqCst);
    tracing::debug!("log level: {}", level);
}

/// Level last applied with [`set_level`], if any.
pub fn current_level() -> Option<LogLevel> {
    match CURRENT.load(Ordering::SeqCst) {
        x if x == LogLevel::Debug as u8 => Some(LogLevel::Debug),
        x if x == LogLevel::Info as u8 => Some(LogLevel::Info),
        x if x == LogLevel::Warn as u8 => Some(LogLevel::Warn),
        x if x == LogLevel::Error as u8 => Some(LogLevel::Error),
        _ => None,
    }
}
