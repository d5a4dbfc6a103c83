//! A console progress bar over the runs of a batch.
//!
//! Only one progress bar can be active at a time. The batch drives it from the calling
//! thread as run results arrive, so worker threads never touch the terminal.
use std::sync::atomic::{AtomicBool, Ordering};

use log::trace;
use progress_bar::{
    finalize_progress_bar, inc_progress_bar, init_progress_bar, set_progress_bar_action,
    set_progress_bar_progress, Color, Style,
};

static RUN_PROGRESS_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Whether a run progress bar is currently drawn.
pub fn is_run_progress_active() -> bool {
    RUN_PROGRESS_ACTIVE.load(Ordering::Relaxed)
}

/// Initializes the batch progress bar with the number of runs to complete.
pub fn init_run_progress_bar(nsims: usize) {
    trace!("initializing run progress bar with {nsims} runs");
    init_progress_bar(nsims);
    set_progress_bar_action("Runs", Color::Blue, Style::Bold);
    RUN_PROGRESS_ACTIVE.store(true, Ordering::Relaxed);
}

/// Marks one more run as finished, successfully or not.
pub fn increment_run_progress() {
    inc_progress_bar();
}

/// Jumps to `finished` runs and closes the bar.
pub fn finish_run_progress(finished: usize) {
    set_progress_bar_progress(finished);
    finalize_progress_bar();
    RUN_PROGRESS_ACTIVE.store(false, Ordering::Relaxed);
}
