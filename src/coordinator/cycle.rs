//! Arithmetic and bookkeeping for one synchronization cycle.

use std::fmt;

/// Average of the collected deltas with the coordinator counted as one more
/// participant whose delta is zero.
///
/// `round((Σ deltas) / (deltas.len() + 1))`, rounding half away from zero.
/// Computed in integer arithmetic, so the result does not depend on the
/// order of `deltas`.
pub fn average_with_coordinator(deltas: &[i64]) -> i64 {
    let sum: i128 = deltas.iter().map(|&d| i128::from(d)).sum();
    let count = deltas.len() as i128 + 1;
    // The mean of i64 values, rounded to an integer, is itself within i64 range.
    div_round_half_away(sum, count) as i64
}

/// Adjustment that moves a peer with `delta` onto `average`.
///
/// `None` when `average - delta` does not fit in an `i64`.
pub fn adjustment_for(average: i64, delta: i64) -> Option<i64> {
    average.checked_sub(delta)
}

fn div_round_half_away(num: i128, den: i128) -> i128 {
    let quotient = num / den;
    let remainder = num % den;
    if 2 * remainder.abs() >= den {
        quotient + num.signum()
    } else {
        quotient
    }
}

/// How a cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No peers registered; no I/O was performed.
    Skipped,
    /// Every poll failed; no clock was adjusted.
    Aborted,
    /// Average computed, adjustments pushed, coordinator adjusted.
    Completed,
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CycleOutcome::Skipped => "skipped",
            CycleOutcome::Aborted => "aborted",
            CycleOutcome::Completed => "completed",
        })
    }
}

/// Record of one cycle. Not persisted.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub number: u64,
    /// Coordinator logical time every peer was compared against.
    pub time_server: Option<i64>,
    /// `(identity, delta)` for every peer that answered, in poll order.
    pub deltas: Vec<(String, i64)>,
    pub average: Option<i64>,
    /// `(identity, adjustment)` for every push that was written.
    pub adjustments: Vec<(String, i64)>,
    /// Identities removed from the peer set during this cycle.
    pub evicted: Vec<String>,
    pub outcome: CycleOutcome,
}

impl CycleReport {
    pub(crate) fn new(number: u64) -> Self {
        Self {
            number,
            time_server: None,
            deltas: Vec::new(),
            average: None,
            adjustments: Vec::new(),
            evicted: Vec::new(),
            outcome: CycleOutcome::Skipped,
        }
    }

    /// Delta reported by `identity`, if it answered.
    pub fn delta_of(&self, identity: &str) -> Option<i64> {
        self.deltas
            .iter()
            .find(|(id, _)| id == identity)
            .map(|(_, delta)| *delta)
    }

    /// Adjustment pushed to `identity`, if the push was written.
    pub fn adjustment_of(&self, identity: &str) -> Option<i64> {
        self.adjustments
            .iter()
            .find(|(id, _)| id == identity)
            .map(|(_, adjust)| *adjust)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worked_example() {
        // Coordinator 0, peers +200 and -100: (0 + 200 - 100) / 3 = 33.3
        let average = average_with_coordinator(&[200, -100]);
        assert_eq!(average, 33);
        assert_eq!(adjustment_for(average, 200), Some(-167));
        assert_eq!(adjustment_for(average, -100), Some(133));
    }

    #[test]
    fn test_denominator_counts_coordinator() {
        assert_eq!(average_with_coordinator(&[300]), 150);
        assert_eq!(average_with_coordinator(&[300, 300]), 200);
        assert_eq!(average_with_coordinator(&[]), 0);
    }

    #[test]
    fn test_rounds_half_away_from_zero() {
        assert_eq!(average_with_coordinator(&[1]), 1); // 0.5
        assert_eq!(average_with_coordinator(&[-1]), -1); // -0.5
        assert_eq!(average_with_coordinator(&[3]), 2); // 1.5
        assert_eq!(average_with_coordinator(&[-3]), -2); // -1.5
        assert_eq!(average_with_coordinator(&[1, 0]), 0); // 0.33
        assert_eq!(average_with_coordinator(&[2, 0]), 1); // 0.67
        assert_eq!(average_with_coordinator(&[-2, 0]), -1); // -0.67
    }

    #[test]
    fn test_order_invariant() {
        let deltas = [913, -48, 7, -1_200, 305, 0, 66];
        let expected = average_with_coordinator(&deltas);

        let mut reversed = deltas;
        reversed.reverse();
        assert_eq!(average_with_coordinator(&reversed), expected);

        let mut sorted = deltas;
        sorted.sort_unstable();
        assert_eq!(average_with_coordinator(&sorted), expected);
    }

    #[test]
    fn test_no_overflow_on_extreme_deltas() {
        let average = average_with_coordinator(&[i64::MAX, i64::MAX]);
        assert_eq!(average, (i128::from(i64::MAX) * 2 / 3) as i64 + 1);
    }

    #[test]
    fn test_unrepresentable_adjustment() {
        let average = average_with_coordinator(&[i64::MIN, i64::MAX]);
        assert_eq!(average, 0);
        assert_eq!(adjustment_for(average, i64::MIN), None);
        assert_eq!(adjustment_for(average, i64::MAX), Some(-i64::MAX));
    }

    #[test]
    fn test_adjusted_clocks_converge() {
        // Offsets relative to the coordinator at the same reference instant.
        let deltas = [420, -75, 3, -999, 12];
        let average = average_with_coordinator(&deltas);

        let coordinator_after = average;
        for delta in deltas {
            assert_eq!(delta + adjustment_for(average, delta).unwrap(), coordinator_after);
        }
    }

    #[test]
    fn test_report_lookup() {
        let mut report = CycleReport::new(4);
        report.deltas.push(("a".into(), 200));
        report.adjustments.push(("a".into(), -167));

        assert_eq!(report.delta_of("a"), Some(200));
        assert_eq!(report.adjustment_of("a"), Some(-167));
        assert_eq!(report.delta_of("b"), None);
        assert_eq!(report.outcome.to_string(), "skipped");
    }
}
