use crate::rates::Ratio;
use num::{BigInt, One};
use parking_lot::RwLock;
use tracing::{debug, warn};

/// Bounds on the path's exchange rate, learned from what the receiver reports.
///
/// Every connector rounds down, so receiving `r` for `s` sent means the real
/// rate lies in `[r / s, (r + 1) / s)`.
pub trait ExchangeRateTracker: Send + Sync {
    fn update_rate(&self, source_amount: u64, destination_amount: u64);

    fn lower_bound_rate(&self) -> Option<Ratio>;

    fn upper_bound_rate(&self) -> Option<Ratio>;
}

#[derive(Default)]
pub struct InMemoryExchangeRateTracker {
    state: RwLock<RateBounds>,
}

#[derive(Default)]
struct RateBounds {
    lower: Option<Ratio>,
    upper: Option<Ratio>,
}

impl InMemoryExchangeRateTracker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExchangeRateTracker for InMemoryExchangeRateTracker {
    fn update_rate(&self, source_amount: u64, destination_amount: u64) {
        if source_amount == 0 {
            return;
        }
        let sample_lower = Ratio::new(destination_amount, source_amount)
            .unwrap_or_else(|_| Ratio::zero());
        let sample_upper =
            Ratio::new(BigInt::from(destination_amount) + BigInt::one(), source_amount)
                .unwrap_or_else(|_| Ratio::zero());

        let mut state = self.state.write();
        let lower = match &state.lower {
            Some(lower) if *lower > sample_lower => lower.clone(),
            _ => sample_lower,
        };
        let upper = match &state.upper {
            Some(upper) if *upper < sample_upper => upper.clone(),
            _ => sample_upper,
        };
        if lower >= upper {
            warn!(
                "Ignoring exchange rate sample {} -> {}, it is outside the known bounds [{:?}, {:?})",
                source_amount, destination_amount, state.lower, state.upper
            );
            return;
        }

        debug!("Exchange rate bounds are now [{}, {})", lower, upper);
        state.lower = Some(lower);
        state.upper = Some(upper);
    }

    fn lower_bound_rate(&self) -> Option<Ratio> {
        self.state.read().lower.clone()
    }

    fn upper_bound_rate(&self) -> Option<Ratio> {
        self.state.read().upper.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_without_bounds() {
        let tracker = InMemoryExchangeRateTracker::new();
        assert!(tracker.lower_bound_rate().is_none());
        assert!(tracker.upper_bound_rate().is_none());
    }

    #[test]
    fn bounds_account_for_rounding() {
        let tracker = InMemoryExchangeRateTracker::new();
        tracker.update_rate(1000, 245);
        assert_eq!(tracker.lower_bound_rate(), Some(Ratio::new(245, 1000).unwrap()));
        assert_eq!(tracker.upper_bound_rate(), Some(Ratio::new(246, 1000).unwrap()));
    }

    #[test]
    fn bounds_only_tighten() {
        let tracker = InMemoryExchangeRateTracker::new();
        tracker.update_rate(10, 2);
        tracker.update_rate(1000, 245);
        tracker.update_rate(10, 2);
        assert_eq!(tracker.lower_bound_rate(), Some(Ratio::new(245, 1000).unwrap()));
        assert_eq!(tracker.upper_bound_rate(), Some(Ratio::new(246, 1000).unwrap()));

        tracker.update_rate(100_000, 24_550);
        assert_eq!(
            tracker.lower_bound_rate(),
            Some(Ratio::new(24_550, 100_000).unwrap())
        );
        assert_eq!(
            tracker.upper_bound_rate(),
            Some(Ratio::new(24_551, 100_000).unwrap())
        );
    }

    #[test]
    fn ignores_samples_that_invert_the_bounds() {
        let tracker = InMemoryExchangeRateTracker::new();
        tracker.update_rate(1000, 500);
        tracker.update_rate(1000, 100);
        assert_eq!(tracker.lower_bound_rate(), Some(Ratio::new(1, 2).unwrap()));
        assert_eq!(tracker.upper_bound_rate(), Some(Ratio::new(501, 1000).unwrap()));
    }
}
