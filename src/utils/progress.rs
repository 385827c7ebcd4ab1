//! Completed-item counter with an optional indicatif bar.
//!
//! The bar is drawn on stderr only when stderr is a terminal; the counter is
//! always maintained so callers and tests can observe progress.

use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::sync::atomic::{AtomicUsize, Ordering};

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} {prefix:<12.cyan.bold} [{bar:40.cyan/blue}] {pos}/{len} {wide_msg:.dim}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}

pub struct Progress {
    completed: AtomicUsize,
    bar: ProgressBar,
}

impl Progress {
    pub fn new(total: usize, label: &str) -> Self {
        if !std::io::stderr().is_terminal() {
            return Self::hidden(total);
        }

        let bar = ProgressBar::new(total as u64);
        bar.set_style(bar_style());
        bar.set_prefix(label.to_string());
        Self {
            completed: AtomicUsize::new(0),
            bar,
        }
    }

    pub fn hidden(total: usize) -> Self {
        let bar = ProgressBar::hidden();
        bar.set_length(total as u64);
        Self {
            completed: AtomicUsize::new(0),
            bar,
        }
    }

    /// Marks one item finished and returns the new completed count.
    pub fn tick(&self) -> usize {
        let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        self.bar.inc(1);
        done
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn finish(&self, message: impl Into<String>) {
        self.bar.finish_with_message(message.into());
    }
}
