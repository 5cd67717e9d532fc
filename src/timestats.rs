//! Opt-in per-operation time statistics.
//!
//! Disabled by default. When enabled on a [`crate::session::Session`],
//! every transport call records one sample keyed by `"<METHOD> <uri-template>"`.
//! Snapshots are cheap clones; printing uses a fixed-width table similar
//! to what the HMC client CLIs render for `--timestats`.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Running count/min/max/avg for one operation key.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeStat {
    pub count: u64,
    pub total: Duration,
    pub min: Duration,
    pub max: Duration,
}

impl TimeStat {
    fn record(&mut self, elapsed: Duration) {
        if self.count == 0 {
            self.min = elapsed;
            self.max = elapsed;
        } else {
            self.min = self.min.min(elapsed);
            self.max = self.max.max(elapsed);
        }
        self.total += elapsed;
        self.count += 1;
    }

    /// Arithmetic mean of all recorded samples.
    #[must_use]
    pub fn avg(&self) -> Duration {
        if self.count == 0 {
            Duration::ZERO
        } else {
            self.total / u32::try_from(self.count).unwrap_or(u32::MAX)
        }
    }
}

/// Thread-safe keeper of per-operation [`TimeStat`]s.
///
/// Held behind a plain [`Mutex`] rather than an async lock: increments
/// are always short, non-awaiting critical sections.
#[derive(Debug, Default)]
pub struct TimeStatsKeeper {
    enabled: std::sync::atomic::AtomicBool,
    stats: Mutex<HashMap<String, TimeStat>>,
}

impl TimeStatsKeeper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable(&self) {
        self.enabled.store(true, std::sync::atomic::Ordering::Relaxed);
    }

    pub fn disable(&self) {
        self.enabled.store(false, std::sync::atomic::Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(std::sync::atomic::Ordering::Relaxed)
    }

    /// Record one sample for `key` if time-stats are enabled; a no-op otherwise.
    pub fn record(&self, key: &str, elapsed: Duration) {
        if !self.is_enabled() {
            return;
        }
        if let Ok(mut stats) = self.stats.lock() {
            stats.entry(key.to_string()).or_default().record(elapsed);
        }
    }

    /// Snapshot of all recorded stats, sorted by key for stable output.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(String, TimeStat)> {
        let stats = self.stats.lock().map_or_else(|_| HashMap::new(), |s| s.clone());
        let mut out: Vec<_> = stats.into_iter().collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Render a human-readable table, one row per operation key.
    #[must_use]
    pub fn print(&self) -> String {
        let mut out = String::from("Operation                                    Count   Avg(ms)   Min(ms)   Max(ms)\n");
        for (key, stat) in self.snapshot() {
            out.push_str(&format!(
                "{key:<44}  {count:>6}  {avg:>8.1}  {min:>8.1}  {max:>8.1}\n",
                key = key,
                count = stat.count,
                avg = stat.avg().as_secs_f64() * 1000.0,
                min = stat.min.as_secs_f64() * 1000.0,
                max = stat.max.as_secs_f64() * 1000.0,
            ));
        }
        out
    }

    /// Clear all recorded stats without changing the enabled flag.
    pub fn reset(&self) {
        if let Ok(mut stats) = self.stats.lock() {
            stats.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_by_default_records_nothing() {
        let keeper = TimeStatsKeeper::new();
        keeper.record("GET /api/cpcs", Duration::from_millis(10));
        assert!(keeper.snapshot().is_empty());
    }

    #[test]
    fn enabled_accumulates_count_min_max_avg() {
        let keeper = TimeStatsKeeper::new();
        keeper.enable();
        keeper.record("GET /api/cpcs", Duration::from_millis(10));
        keeper.record("GET /api/cpcs", Duration::from_millis(30));
        let snap = keeper.snapshot();
        assert_eq!(snap.len(), 1);
        let (key, stat) = &snap[0];
        assert_eq!(key, "GET /api/cpcs");
        assert_eq!(stat.count, 2);
        assert_eq!(stat.min, Duration::from_millis(10));
        assert_eq!(stat.max, Duration::from_millis(30));
        assert_eq!(stat.avg(), Duration::from_millis(20));
    }
}
