use std::sync::atomic::{AtomicU64, Ordering};

/// Which tier served a hit, for the counters in [`CacheStats`].
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum Tier {
    L1,
    L2,
}

#[derive(Default, Debug)]
pub struct Counters {
    l1_hits: AtomicU64,
    l2_hits: AtomicU64,
    misses: AtomicU64,
}

impl Counters {
    pub fn record_hit(&self, tier: Tier) {
        match tier {
            Tier::L1 => self.l1_hits.fetch_add(1, Ordering::Relaxed),
            Tier::L2 => self.l2_hits.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CacheStats {
        let l1_hits = self.l1_hits.load(Ordering::Relaxed);
        let l2_hits = self.l2_hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        CacheStats {
            l1_hits,
            l2_hits,
            misses,
        }
    }
}

/// Point-in-time snapshot of cache hit/miss counters.
#[derive(Clone, Copy, Default, Eq, PartialEq, Debug)]
pub struct CacheStats {
    pub l1_hits: u64,
    pub l2_hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hits(&self) -> u64 {
        self.l1_hits + self.l2_hits
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.hits() + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits() as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_rate_is_zero_with_no_activity() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn hit_rate_computes_correctly() {
        let counters = Counters::default();
        counters.record_hit(Tier::L1);
        counters.record_hit(Tier::L2);
        counters.record_miss();
        let stats = counters.snapshot();
        assert_eq!(stats.hits(), 2);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - (2.0 / 3.0)).abs() < 1e-9);
    }
}
