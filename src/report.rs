use std::fmt::Write;

use crate::aggregate;
use crate::catalog::Activity;
use crate::models::{ChartDataset, ChartSeries, DailyBucket, TierSlice};

/// Stacked-bar series: one label per day ("dd MMM"), one dataset per
/// redemption category in the bucket's own category set.
pub fn category_series(buckets: &[DailyBucket]) -> ChartSeries {
    let labels: Vec<String> = buckets.iter().map(|b| b.date_display()).collect();

    let categories: Vec<_> = buckets
        .first()
        .map(|b| b.redemption_counts.keys().copied().collect())
        .unwrap_or_default();

    let datasets = categories
        .into_iter()
        .map(|category| ChartDataset {
            label: category.as_str().to_string(),
            data: buckets
                .iter()
                .map(|b| b.redemption_counts.get(&category).copied().unwrap_or(0))
                .collect(),
        })
        .collect();

    ChartSeries { labels, datasets }
}

/// Pie slices for the tier distribution across the whole bucket range.
pub fn tier_slices(buckets: &[DailyBucket]) -> Vec<TierSlice> {
    let totals = aggregate::compute_totals(buckets);
    totals
        .by_tier
        .into_iter()
        .map(|(tier, count)| TierSlice {
            tier: tier.as_str().to_string(),
            count,
        })
        .collect()
}

/// Renders the segment pivot: one row per redemption category, one column
/// per day plus a trailing Total, and the synthetic TOTAL MEMBER BY DAY row.
pub fn category_pivot(buckets: &[DailyBucket]) -> String {
    let mut out = String::new();
    write_header(&mut out, "Segment", buckets);

    let categories: Vec<_> = buckets
        .first()
        .map(|b| b.redemption_counts.keys().copied().collect())
        .unwrap_or_default();

    for category in &categories {
        let _ = write!(out, "| {} |", category.as_str());
        let mut row_total = 0i64;
        for bucket in buckets {
            let count = bucket.redemption_counts.get(category).copied().unwrap_or(0);
            row_total += count;
            let _ = write!(out, " {count} |");
        }
        let _ = writeln!(out, " {row_total} |");
    }

    let _ = write!(out, "| TOTAL MEMBER BY DAY |");
    let mut grand = 0i64;
    for bucket in buckets {
        grand += bucket.total_check_in;
        let _ = write!(out, " {} |", bucket.total_check_in);
    }
    let _ = writeln!(out, " {grand} |");
    out
}

/// Renders the tier pivot with its TOTAL BY TIER rollup row.
pub fn tier_pivot(buckets: &[DailyBucket]) -> String {
    let mut out = String::new();
    write_header(&mut out, "Tier", buckets);

    let tiers: Vec<_> = buckets
        .first()
        .map(|b| b.tier_counts.keys().copied().collect())
        .unwrap_or_default();

    for tier in &tiers {
        let _ = write!(out, "| {} |", tier.as_str());
        let mut row_total = 0i64;
        for bucket in buckets {
            let count = bucket.tier_counts.get(tier).copied().unwrap_or(0);
            row_total += count;
            let _ = write!(out, " {count} |");
        }
        let _ = writeln!(out, " {row_total} |");
    }

    let _ = write!(out, "| TOTAL BY TIER |");
    let mut grand = 0i64;
    for bucket in buckets {
        let day_total: i64 = bucket.tier_counts.values().sum();
        grand += day_total;
        let _ = write!(out, " {day_total} |");
    }
    let _ = writeln!(out, " {grand} |");
    out
}

fn write_header(out: &mut String, first_column: &str, buckets: &[DailyBucket]) {
    let _ = write!(out, "| {first_column} |");
    for bucket in buckets {
        // Closed days stay in the table so the series is gap-free.
        if bucket.is_active {
            let _ = write!(out, " {} |", bucket.date_display());
        } else {
            let _ = write!(out, " {} (closed) |", bucket.date_display());
        }
    }
    let _ = writeln!(out, " Total |");

    let _ = write!(out, "|---|");
    for _ in buckets {
        let _ = write!(out, "---:|");
    }
    let _ = writeln!(out, "---:|");
}

/// Per-activity report: quota headline plus both pivots, in markdown.
pub fn build_activity_report(activity: &Activity, buckets: &[DailyBucket]) -> String {
    let totals = aggregate::compute_totals(buckets);
    let mut out = String::new();

    let _ = writeln!(out, "# {} Check-In Report", activity.name);
    let _ = writeln!(
        out,
        "Window {} to {} | quota {} | used {}",
        activity.start_date, activity.end_date, activity.total_quota, totals.grand_total
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "## Check-Ins by Segment");
    out.push_str(&category_pivot(buckets));
    let _ = writeln!(out);
    let _ = writeln!(out, "## Members by Tier");
    out.push_str(&tier_pivot(buckets));
    out
}

/// Cross-activity overview report for the whole event.
pub fn build_overview_report(activities: &[Activity], buckets: &[DailyBucket]) -> String {
    let totals = aggregate::compute_totals(buckets);
    let quota_all: i64 = activities.iter().map(|a| a.total_quota).sum();
    let mut out = String::new();

    let _ = writeln!(out, "# Event Overview");
    let _ = writeln!(
        out,
        "{} activities | quota {} | used {}",
        activities.len(),
        quota_all,
        totals.grand_total
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "## Check-Ins by Segment");
    out.push_str(&category_pivot(buckets));
    let _ = writeln!(out);
    let _ = writeln!(out, "## Members by Tier");
    out.push_str(&tier_pivot(buckets));
    let _ = writeln!(out);
    let _ = writeln!(out, "## Per-Activity Quota");
    for activity in activities {
        let _ = writeln!(
            out,
            "- {} ({}): quota {}",
            activity.name, activity.id, activity.total_quota
        );
    }
    out
}
