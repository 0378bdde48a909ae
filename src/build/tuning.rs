//! Parallel job tuning.
//!
//! After every successful build the job count moves by at most one step,
//! based on how the latest build compares to recent successful ones.

use crate::state::HistoryEntry;

/// Most recent history entries considered.
pub const WINDOW: usize = 10;
/// Successful builds needed inside the window before tuning kicks in.
pub const MIN_SAMPLES: usize = 3;

const FASTER: f64 = 0.9;
const SLOWER: f64 = 1.1;

/// Returns the job count for the next run.
///
/// `history` must already contain the build that just finished. The result
/// differs from `jobs` by at most one and stays within `1..=max_jobs`.
pub fn tune_jobs(history: &[HistoryEntry], jobs: usize, max_jobs: usize) -> usize {
    let start = history.len().saturating_sub(WINDOW);
    let durations: Vec<f64> = history[start..]
        .iter()
        .filter_map(HistoryEntry::successful_build_duration)
        .collect();

    let Some(&latest) = durations.last() else {
        return jobs;
    };
    if durations.len() < MIN_SAMPLES {
        return jobs;
    }

    let average = durations.iter().sum::<f64>() / durations.len() as f64;
    if latest < average * FASTER && jobs < max_jobs {
        log::debug!("build {:.2}s vs avg {:.2}s, raising jobs", latest, average);
        jobs + 1
    } else if latest > average * SLOWER && jobs > 1 {
        log::debug!("build {:.2}s vs avg {:.2}s, lowering jobs", latest, average);
        jobs - 1
    } else {
        jobs
    }
}
