//! Planning for looped load-test output.

use crate::error::{MediaError, MediaResult};

/// Float slack when comparing a source against the remaining time.
const EPS: f64 = 1e-6;

/// One source clip placed in the looped output.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedSegment {
    pub source_index: usize,
    /// Seconds of this source used.
    pub duration: f64,
    /// Whether the source is cut short.
    pub trimmed: bool,
}

/// Ordered segments whose durations add up to the target.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopPlan {
    pub segments: Vec<PlannedSegment>,
}

impl LoopPlan {
    pub fn total_duration(&self) -> f64 {
        self.segments.iter().map(|s| s.duration).sum()
    }

    /// Number of whole or partial passes over the source set.
    pub fn passes(&self, source_count: usize) -> usize {
        if source_count == 0 {
            return 0;
        }
        self.segments.len().div_ceil(source_count)
    }
}

/// Cycle through sources in order until `target` seconds are covered.
///
/// Only the last segment may be trimmed; a source that would overshoot the
/// target is cut to the remaining time rather than appended whole. Sources
/// with no usable duration are skipped.
pub fn plan_loop(source_durations: &[f64], target: f64) -> MediaResult<LoopPlan> {
    if !target.is_finite() || target <= 0.0 {
        return Err(MediaError::invalid_input(format!(
            "target duration must be positive, got {target}"
        )));
    }
    let usable = |d: f64| d.is_finite() && d > EPS;
    if !source_durations.iter().copied().any(usable) {
        return Err(MediaError::invalid_input("no source has a positive duration"));
    }

    let mut segments = Vec::new();
    let mut remaining = target;

    for (source_index, &duration) in source_durations.iter().enumerate().cycle() {
        if !usable(duration) {
            continue;
        }
        if duration >= remaining - EPS {
            segments.push(PlannedSegment {
                source_index,
                duration: remaining,
                trimmed: duration > remaining + EPS,
            });
            break;
        }
        segments.push(PlannedSegment {
            source_index,
            duration,
            trimmed: false,
        });
        remaining -= duration;
    }

    Ok(LoopPlan { segments })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_only_the_last_segment() {
        let plan = plan_loop(&[10.0, 10.0, 10.0], 25.0).unwrap();
        assert_eq!(
            plan.segments,
            vec![
                PlannedSegment { source_index: 0, duration: 10.0, trimmed: false },
                PlannedSegment { source_index: 1, duration: 10.0, trimmed: false },
                PlannedSegment { source_index: 2, duration: 5.0, trimmed: true },
            ]
        );
        assert_eq!(plan.total_duration(), 25.0);
        assert_eq!(plan.passes(3), 1);
    }

    #[test]
    fn test_repeats_source_set() {
        let plan = plan_loop(&[4.0, 6.0], 23.0).unwrap();
        let order: Vec<usize> = plan.segments.iter().map(|s| s.source_index).collect();
        assert_eq!(order, vec![0, 1, 0, 1, 0]);
        assert_eq!(plan.segments.last().unwrap().duration, 3.0);
        assert_eq!(plan.total_duration(), 23.0);
        assert_eq!(plan.passes(2), 3);
    }

    #[test]
    fn test_exact_fit_is_not_trimmed() {
        let plan = plan_loop(&[10.0, 10.0, 10.0], 30.0).unwrap();
        assert_eq!(plan.segments.len(), 3);
        assert!(plan.segments.iter().all(|s| !s.trimmed));
    }

    #[test]
    fn test_short_target() {
        let plan = plan_loop(&[10.0], 2.5).unwrap();
        assert_eq!(plan.segments.len(), 1);
        assert!(plan.segments[0].trimmed);
        assert_eq!(plan.total_duration(), 2.5);
    }

    #[test]
    fn test_skips_empty_sources() {
        let plan = plan_loop(&[0.0, 5.0], 12.0).unwrap();
        assert!(plan.segments.iter().all(|s| s.source_index == 1));
        assert_eq!(plan.total_duration(), 12.0);
    }

    #[test]
    fn test_rejects_unusable_input() {
        assert!(plan_loop(&[0.0, f64::NAN], 10.0).is_err());
        assert!(plan_loop(&[], 10.0).is_err());
        assert!(plan_loop(&[5.0], 0.0).is_err());
        assert!(plan_loop(&[5.0], -1.0).is_err());
    }
}
