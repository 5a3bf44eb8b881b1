//! Daily spend tracking for oracle usage

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

const MICROS_PER_USD: f64 = 1_000_000.0;

/// Spend accumulator gated against a daily ceiling.
///
/// Shared by every in-flight classification, so spend is held as micro-USD in
/// an atomic rather than behind `&mut self`.
#[derive(Debug)]
pub struct BudgetTracker {
    daily_ceiling_micros: u64,
    spent_micros: AtomicU64,
    period_started_ms: AtomicI64,
}

impl BudgetTracker {
    /// Create a tracker with the given daily ceiling in USD
    pub fn new(daily_ceiling_usd: f64) -> Self {
        Self {
            daily_ceiling_micros: to_micros(daily_ceiling_usd),
            spent_micros: AtomicU64::new(0),
            period_started_ms: AtomicI64::new(Utc::now().timestamp_millis()),
        }
    }

    /// True while spend is still under the ceiling
    pub fn has_budget(&self) -> bool {
        self.spent_micros.load(Ordering::Acquire) < self.daily_ceiling_micros
    }

    /// Add spend. Not clamped: one call may push the total past the ceiling,
    /// and the next `has_budget` then fails closed.
    pub fn record_spend(&self, amount_usd: f64) {
        if !amount_usd.is_finite() || amount_usd <= 0.0 {
            return;
        }
        let micros = to_micros(amount_usd);
        let total = self
            .spent_micros
            .fetch_add(micros, Ordering::AcqRel)
            .saturating_add(micros);
        tracing::debug!(
            "Recorded ${:.6} oracle spend (${:.6} of ${:.2} today)",
            amount_usd,
            from_micros(total),
            self.daily_ceiling()
        );
    }

    /// Start a new tracking period. Called by whatever owns the day boundary.
    pub fn reset_daily_budget(&self) {
        let previous = self.spent_micros.swap(0, Ordering::AcqRel);
        self.period_started_ms
            .store(Utc::now().timestamp_millis(), Ordering::Release);
        tracing::info!("Daily budget reset (previous period spent ${:.4})", from_micros(previous));
    }

    pub fn spent_today(&self) -> f64 {
        from_micros(self.spent_micros.load(Ordering::Acquire))
    }

    pub fn daily_ceiling(&self) -> f64 {
        from_micros(self.daily_ceiling_micros)
    }

    /// Get remaining budget in USD
    pub fn remaining(&self) -> f64 {
        from_micros(
            self.daily_ceiling_micros
                .saturating_sub(self.spent_micros.load(Ordering::Acquire)),
        )
    }

    /// Get usage percentage
    pub fn usage_percentage(&self) -> f32 {
        if self.daily_ceiling_micros == 0 {
            return 100.0;
        }
        let spent = self.spent_micros.load(Ordering::Acquire) as f64;
        (spent / self.daily_ceiling_micros as f64 * 100.0) as f32
    }

    pub fn period_started(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.period_started_ms.load(Ordering::Acquire))
            .unwrap_or_else(Utc::now)
    }

    pub fn snapshot(&self) -> BudgetSnapshot {
        BudgetSnapshot {
            spent_today_usd: self.spent_today(),
            daily_ceiling_usd: self.daily_ceiling(),
            remaining_usd: self.remaining(),
            warning_level: self.warning_level(),
            period_started: self.period_started(),
        }
    }
}

/// Budget warning levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetWarning {
    /// Budget is healthy (< 50%)
    Healthy,
    /// Budget is getting low (50-75%)
    Warning,
    /// Budget is critically low (75-90%)
    Critical,
    /// Budget is nearly exhausted (> 90%)
    Exhausted,
}

impl BudgetTracker {
    /// Get the current warning level
    pub fn warning_level(&self) -> BudgetWarning {
        let percentage = self.usage_percentage();
        match percentage {
            p if p < 50.0 => BudgetWarning::Healthy,
            p if p < 75.0 => BudgetWarning::Warning,
            p if p < 90.0 => BudgetWarning::Critical,
            _ => BudgetWarning::Exhausted,
        }
    }
}

/// Point-in-time view of the tracker, for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct BudgetSnapshot {
    pub spent_today_usd: f64,
    pub daily_ceiling_usd: f64,
    pub remaining_usd: f64,
    pub warning_level: BudgetWarning,
    pub period_started: DateTime<Utc>,
}

fn to_micros(amount_usd: f64) -> u64 {
    if !amount_usd.is_finite() || amount_usd <= 0.0 {
        return 0;
    }
    // Never under-count a fractional micro-dollar
    (amount_usd * MICROS_PER_USD).ceil() as u64
}

fn from_micros(micros: u64) -> f64 {
    micros as f64 / MICROS_PER_USD
}
