#![allow(clippy::cast_precision_loss)] // Progress display - precision loss acceptable

//! Download progress tracking
//!
//! The downloader owns a [`ProgressState`] that every fetch task bumps, and
//! forwards each update to a [`ProgressObserver`]. Observers are driven in the
//! order `set_total -> kickoff -> add* -> finish`.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

const PB_STYLE: &str = "{spinner:.blue} [{elapsed_precise}] {wide_bar:.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

const PB_CHARS: &str = "█▓▒░  ";

/// Receives progress events from the downloader
pub trait ProgressObserver: Send + Sync {
    /// Total number of bytes expected
    fn set_total(&self, total: u64);

    /// Record `bytes` more written; returns the new cumulative count
    fn add(&self, bytes: u64) -> u64;

    /// Start rendering. Must tolerate being called more than once.
    fn kickoff(&self);

    /// Stop rendering
    fn finish(&self);
}

/// Shared byte counter mutated by every fetch task
#[derive(Debug, Default)]
pub struct ProgressState {
    total: AtomicU64,
    written: AtomicU64,
}

impl ProgressState {
    /// Create a counter expecting `total` bytes
    #[must_use]
    pub const fn new(total: u64) -> Self {
        Self {
            total: AtomicU64::new(total),
            written: AtomicU64::new(0),
        }
    }

    /// Add `bytes` and return the new written count, clamped to the total
    pub fn add(&self, bytes: u64) -> u64 {
        let total = self.total();
        let previous = self
            .written
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(current.saturating_add(bytes).min(total))
            })
            .unwrap_or_else(|current| current);
        previous.saturating_add(bytes).min(total)
    }

    /// Bytes expected
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Acquire)
    }

    /// Bytes written so far
    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Acquire)
    }

    /// Whether every expected byte has been written
    pub fn is_complete(&self) -> bool {
        self.written() == self.total()
    }
}

/// Calls [`ProgressObserver::finish`] when dropped
pub struct FinishGuard<'a> {
    observer: &'a dyn ProgressObserver,
}

impl<'a> FinishGuard<'a> {
    /// Guard `observer` so it is finished on every exit path
    pub fn new(observer: &'a dyn ProgressObserver) -> Self {
        Self { observer }
    }
}

impl Drop for FinishGuard<'_> {
    fn drop(&mut self) {
        self.observer.finish();
    }
}

impl std::fmt::Debug for FinishGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinishGuard").finish_non_exhaustive()
    }
}

/// Terminal progress bar backed by `indicatif`.
///
/// Each [`set_total`](ProgressObserver::set_total) starts a fresh bar, so one
/// observer can follow any number of downloads in sequence.
#[derive(Debug)]
pub struct ProgressBarObserver {
    name: String,
    pb: Mutex<ProgressBar>,
    started: AtomicBool,
    finished: AtomicBool,
}

impl ProgressBarObserver {
    /// Create an observer whose bars are labelled with `name`
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            pb: Mutex::new(Self::hidden_bar(name, 0)),
            started: AtomicBool::new(false),
            finished: AtomicBool::new(false),
        }
    }

    /// Hidden bar; it appears on [`kickoff`](ProgressObserver::kickoff)
    fn hidden_bar(name: &str, total: u64) -> ProgressBar {
        let pb = ProgressBar::hidden();
        pb.set_length(total);
        if let Ok(pb_style) = ProgressStyle::with_template(PB_STYLE) {
            pb.set_style(pb_style.tick_chars(TICK).progress_chars(PB_CHARS));
        }
        pb.set_message(name.to_string());
        pb
    }

    /// Handle on the current bar
    fn bar(&self) -> ProgressBar {
        self.pb
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ProgressObserver for ProgressBarObserver {
    fn set_total(&self, total: u64) {
        let mut pb = self.pb.lock().unwrap_or_else(PoisonError::into_inner);
        *pb = Self::hidden_bar(&self.name, total);
        self.started.store(false, Ordering::Release);
        self.finished.store(false, Ordering::Release);
    }

    fn add(&self, bytes: u64) -> u64 {
        let pb = self.bar();
        pb.inc(bytes);
        pb.position()
    }

    fn kickoff(&self) {
        if self.started.swap(true, Ordering::AcqRel) {
            return;
        }
        let pb = self.bar();
        pb.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        pb.enable_steady_tick(Duration::from_millis(120));
    }

    fn finish(&self) {
        if self.finished.swap(true, Ordering::AcqRel) {
            return;
        }
        let pb = self.bar();
        let total = pb.length().unwrap_or(0);
        if pb.position() >= total {
            let mb = total as f64 / 1_048_576.0;
            pb.finish_with_message(format!("{} {mb:.1} MB", style("✓").green()));
        } else {
            pb.abandon();
        }
    }
}

/// Observer that renders nothing
#[derive(Debug, Default)]
pub struct NoProgress {
    written: AtomicU64,
}

impl ProgressObserver for NoProgress {
    fn set_total(&self, _total: u64) {}

    fn add(&self, bytes: u64) -> u64 {
        self.written.fetch_add(bytes, Ordering::Relaxed) + bytes
    }

    fn kickoff(&self) {}

    fn finish(&self) {}
}
