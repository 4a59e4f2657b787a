use std::ops::Range;

use smallvec::SmallVec;

/// One sample of a series; `None` marks a missing sample.
pub type Sample = Option<f64>;

/// Index ranges of maximal present-sample runs, in ascending order.
pub type RunList = SmallVec<[Range<usize>; 4]>;

/// Converts raw provider values into samples; non-finite values are missing.
#[must_use]
pub fn samples_from_raw(values: &[f64]) -> Vec<Sample> {
    values
        .iter()
        .map(|value| value.is_finite().then_some(*value))
        .collect()
}

/// Maximal runs of consecutive present samples.
#[must_use]
pub fn present_runs(samples: &[Sample]) -> RunList {
    runs_where(samples.len(), |index| samples[index].is_some())
}

/// Maximal runs where both the min and max sample are present.
///
/// Mismatched lengths yield no runs.
#[must_use]
pub fn envelope_runs(min: &[Sample], max: &[Sample]) -> RunList {
    if min.len() != max.len() {
        return RunList::new();
    }
    runs_where(min.len(), |index| min[index].is_some() && max[index].is_some())
}

fn runs_where(len: usize, present: impl Fn(usize) -> bool) -> RunList {
    let mut runs = RunList::new();
    let mut run_start: Option<usize> = None;

    for index in 0..len {
        match (present(index), run_start) {
            (true, None) => run_start = Some(index),
            (false, Some(start)) => {
                runs.push(start..index);
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = run_start {
        runs.push(start..len);
    }

    runs
}
