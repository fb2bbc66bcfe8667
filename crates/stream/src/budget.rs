use std::time::{Duration, Instant};

/// A per-tick work allowance.
///
/// Production ticks are sliced by wall clock: the budget captures an
/// `Instant` when the tick starts and work stops once the elapsed time
/// passes the limit. Tests and the despawn path can use unit budgets
/// instead, which count discrete work items and need no clock.
#[derive(Debug, Clone)]
pub enum FrameBudget {
    Timed { start: Instant, limit: Duration },
    Units { total: u32, used: u32 },
}

impl FrameBudget {
    /// Wall-clock budget starting now.
    pub fn millis(ms: f64) -> Self {
        Self::Timed {
            start: Instant::now(),
            limit: Duration::from_secs_f64(ms / 1000.0),
        }
    }

    /// Budget of `total` discrete work units.
    pub fn units(total: u32) -> Self {
        Self::Units { total, used: 0 }
    }

    /// Effectively unbounded; used by the synchronous warmup drain.
    pub fn unlimited() -> Self {
        Self::Units {
            total: u32::MAX,
            used: 0,
        }
    }

    /// Charge one completed work unit. No-op for timed budgets, where the
    /// clock does the accounting.
    pub fn charge(&mut self) {
        if let Self::Units { used, .. } = self {
            *used = used.saturating_add(1);
        }
    }

    pub fn expired(&self) -> bool {
        self.fraction_expired(1.0)
    }

    /// Whether the given fraction of the budget has been consumed.
    /// The scheduler admits new chunks only within a small leading
    /// fraction so chunk creation can never starve incremental stepping.
    pub fn fraction_expired(&self, fraction: f32) -> bool {
        match self {
            Self::Timed { start, limit } => {
                start.elapsed().as_secs_f64() >= limit.as_secs_f64() * fraction as f64
            }
            Self::Units { total, used } => (*used as f64) >= (*total as f64) * fraction as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_budget_counts_charges() {
        let mut b = FrameBudget::units(3);
        assert!(!b.expired());
        b.charge();
        b.charge();
        assert!(!b.expired());
        b.charge();
        assert!(b.expired());
    }

    #[test]
    fn unit_budget_fraction() {
        let mut b = FrameBudget::units(4);
        assert!(!b.fraction_expired(0.25));
        b.charge();
        assert!(b.fraction_expired(0.25));
        assert!(!b.fraction_expired(1.0));
    }

    #[test]
    fn zero_unit_budget_is_immediately_expired() {
        let b = FrameBudget::units(0);
        assert!(b.expired());
        assert!(b.fraction_expired(0.25));
    }

    #[test]
    fn unlimited_budget_survives_many_charges() {
        let mut b = FrameBudget::unlimited();
        for _ in 0..10_000 {
            b.charge();
        }
        assert!(!b.expired());
    }

    #[test]
    fn timed_budget_expires() {
        let b = FrameBudget::Timed {
            start: Instant::now() - Duration::from_millis(10),
            limit: Duration::from_millis(1),
        };
        assert!(b.expired());
    }
}
