use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::catalog::{Category, Tier};

/// One row from the event store: a single check-in/redemption, created by the
/// upstream POS integration and never mutated here.
#[derive(Debug, Clone)]
pub struct EventRecord {
    pub id: i64,
    pub activity_db_id: i32,
    pub activity_name: String,
    pub occurred_at: NaiveDateTime,
    pub member_id: String,
    pub member_tier: String,
    pub receipt_no: String,
    pub payment_method: String,
    pub redeem_type: String,
    pub spending_amount: f64,
    pub rights_earned: Option<i32>,
    pub staff_id: String,
}

impl EventRecord {
    /// Reward units granted by this event. Zero or absent rights means the
    /// event still counts as one unit.
    pub fn units(&self) -> i64 {
        match self.rights_earned {
            Some(n) if n > 0 => i64::from(n),
            _ => 1,
        }
    }

    pub fn event_date(&self) -> NaiveDate {
        self.occurred_at.date()
    }
}

/// One calendar day of an activity's breakdown. Recomputed on every query,
/// never persisted. Category keys are exactly the activity's supported set;
/// tier keys always cover the full tier vocabulary.
#[derive(Debug, Clone)]
pub struct DailyBucket {
    pub date: NaiveDate,
    pub is_active: bool,
    pub total_check_in: i64,
    pub redemption_counts: BTreeMap<Category, i64>,
    pub tier_counts: BTreeMap<Tier, i64>,
    /// Units from events whose category is unmapped or unsupported by the
    /// activity. Tracked for reconciliation, excluded from named totals.
    pub other_units: i64,
}

impl DailyBucket {
    pub fn zeroed(date: NaiveDate, supported: &[Category], is_active: bool) -> Self {
        DailyBucket {
            date,
            is_active,
            total_check_in: 0,
            redemption_counts: supported.iter().map(|c| (*c, 0)).collect(),
            tier_counts: Tier::ALL.iter().map(|t| (*t, 0)).collect(),
            other_units: 0,
        }
    }

    /// Date label used by pivot columns and chart axes.
    pub fn date_display(&self) -> String {
        self.date.format("%d %b").to_string()
    }
}

/// Rollup across a bucket sequence, the in-memory stand-in for the SQL
/// GROUP BY ROLLUP rows the dashboard pages used to generate.
#[derive(Debug, Clone, Default)]
pub struct AggregateTotals {
    pub by_category: BTreeMap<Category, i64>,
    pub by_tier: BTreeMap<Tier, i64>,
    pub grand_total: i64,
}

/// Chart.js-style series payload: one label per date, one dataset per
/// redemption category.
#[derive(Debug, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
}

#[derive(Debug, Serialize)]
pub struct ChartDataset {
    pub label: String,
    pub data: Vec<i64>,
}

/// Pie slice for the tier distribution chart.
#[derive(Debug, Serialize)]
pub struct TierSlice {
    pub tier: String,
    pub count: i64,
}
