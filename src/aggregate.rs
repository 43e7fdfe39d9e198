use chrono::{Duration, NaiveDate};

use crate::catalog::{self, Activity, Category, Tier};
use crate::models::{AggregateTotals, DailyBucket, EventRecord};

/// Builds the per-day breakdown for one activity over its event window.
///
/// Returns exactly one bucket per calendar day of the window, ascending and
/// gap-free, so chart consumers never have to interpolate. Days outside the
/// activity's open-day policy come back zeroed with `is_active = false`.
/// An unresolved activity (`None`) still yields the series over the default
/// window, but aggregates nothing: no supported categories, and tier and
/// other counts stay zero regardless of the events passed in.
///
/// `total_check_in` is the sum of per-category rights units, not a raw event
/// count. The two diverge when one event grants several rights; summing is
/// the intended behavior.
pub fn daily_breakdown(
    activity: Option<&Activity>,
    events: &[EventRecord],
    filter_date: Option<NaiveDate>,
) -> Vec<DailyBucket> {
    let (start, end) = match activity {
        Some(a) => (a.start_date, a.end_date),
        None => catalog::default_window(),
    };
    let supported: &[Category] = activity.map(|a| a.supported.as_slice()).unwrap_or(&[]);

    let mut buckets = Vec::new();
    for offset in 0..=(end - start).num_days().max(0) {
        let day = start + Duration::days(offset);
        if let Some(filter) = filter_date {
            if filter != day {
                continue;
            }
        }

        let open = activity.map(|a| a.is_open(day)).unwrap_or(true);
        let mut bucket = DailyBucket::zeroed(day, supported, open);

        // Only a resolved activity aggregates events; an unknown id keeps
        // every bucket zeroed.
        if let (true, Some(a)) = (open, activity) {
            for event in events.iter().filter(|e| e.event_date() == day) {
                if event.activity_db_id != a.db_id {
                    continue;
                }

                let category = Category::normalize(Some(&event.payment_method));
                if let Some(count) = bucket.redemption_counts.get_mut(&category) {
                    *count += event.units();
                } else {
                    // Unmapped, or a named category this activity does not
                    // support. Kept out of the named totals either way.
                    bucket.other_units += event.units();
                }

                if let Some(tier) = Tier::parse(&event.member_tier) {
                    if let Some(count) = bucket.tier_counts.get_mut(&tier) {
                        *count += 1;
                    }
                }
            }
            bucket.total_check_in = bucket.redemption_counts.values().sum();
        }

        buckets.push(bucket);
    }

    buckets
}

/// Cross-activity rollup for the overview page: the union of every
/// activity's day list, with all named categories and all tiers as columns.
/// An activity that does not support a category contributes zero to that
/// cell rather than an error.
pub fn overview_breakdown(
    activities: &[Activity],
    events: &[EventRecord],
    filter_date: Option<NaiveDate>,
) -> Vec<DailyBucket> {
    let mut merged: std::collections::BTreeMap<NaiveDate, DailyBucket> =
        std::collections::BTreeMap::new();

    for activity in activities {
        for bucket in daily_breakdown(Some(activity), events, filter_date) {
            let day = merged
                .entry(bucket.date)
                .or_insert_with(|| DailyBucket::zeroed(bucket.date, &Category::NAMED, true));

            if !bucket.is_active {
                continue;
            }
            day.total_check_in += bucket.total_check_in;
            day.other_units += bucket.other_units;
            for (category, count) in &bucket.redemption_counts {
                if let Some(cell) = day.redemption_counts.get_mut(category) {
                    *cell += count;
                }
            }
            for (tier, count) in &bucket.tier_counts {
                if let Some(cell) = day.tier_counts.get_mut(tier) {
                    *cell += count;
                }
            }
        }
    }

    merged.into_values().collect()
}

/// Sums a bucket sequence into the synthetic TOTAL row. Closed days already
/// hold zeros, so no special-casing is needed here.
pub fn compute_totals(buckets: &[DailyBucket]) -> AggregateTotals {
    let mut totals = AggregateTotals::default();

    for bucket in buckets {
        totals.grand_total += bucket.total_check_in;
        for (category, count) in &bucket.redemption_counts {
            *totals.by_category.entry(*category).or_insert(0) += count;
        }
        for (tier, count) in &bucket.tier_counts {
            *totals.by_tier.entry(*tier).or_insert(0) += count;
        }
    }

    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{catalog, find_activity};
    use chrono::NaiveDateTime;

    fn event(
        activity_db_id: i32,
        timestamp: &str,
        tier: &str,
        payment_method: &str,
        rights: Option<i32>,
    ) -> EventRecord {
        let occurred_at =
            NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S").expect("valid timestamp");
        EventRecord {
            id: 0,
            activity_db_id,
            activity_name: "TEST".to_string(),
            occurred_at,
            member_id: "M0001".to_string(),
            member_tier: tier.to_string(),
            receipt_no: "R-1".to_string(),
            payment_method: payment_method.to_string(),
            redeem_type: "GIFT".to_string(),
            spending_amount: 0.0,
            rights_earned: rights,
            staff_id: "S01".to_string(),
        }
    }

    #[test]
    fn one_bucket_per_day_no_gaps() {
        let activities = catalog();
        let ginger = find_activity(&activities, "ginger").unwrap();
        let buckets = daily_breakdown(Some(ginger), &[], None);

        assert_eq!(buckets.len(), 11); // 18..=28 Dec
        for pair in buckets.windows(2) {
            assert_eq!(pair[1].date - pair[0].date, Duration::days(1));
        }
        assert_eq!(buckets[0].date, ginger.start_date);
        assert_eq!(buckets.last().unwrap().date, ginger.end_date);
    }

    #[test]
    fn total_check_in_equals_sum_of_category_counts() {
        let activities = catalog();
        let chill = find_activity(&activities, "chill").unwrap();
        let events = vec![
            event(5, "2025-12-19 10:00:00", "NAVY", "RECEIPT SPENDING", Some(2)),
            event(5, "2025-12-19 11:30:00", "CROWN", "CARAT REDEEM", None),
            event(5, "2025-12-19 12:00:00", "VEGA", "MEMBER TIER", Some(1)),
        ];

        let buckets = daily_breakdown(Some(chill), &events, None);
        for bucket in &buckets {
            let category_sum: i64 = bucket.redemption_counts.values().sum();
            assert_eq!(bucket.total_check_in, category_sum);
        }
        let day = buckets.iter().find(|b| b.date.to_string() == "2025-12-19").unwrap();
        assert_eq!(day.total_check_in, 4); // 2 + 1 (fallback) + 1
    }

    #[test]
    fn rights_sum_diverges_from_event_count() {
        let activities = catalog();
        let ginger = find_activity(&activities, "ginger").unwrap();
        let events = vec![event(1, "2025-12-20 09:00:00", "NAVY", "Receipt-8000TH", Some(5))];

        let buckets = daily_breakdown(Some(ginger), &events, None);
        let day = buckets.iter().find(|b| b.date.to_string() == "2025-12-20").unwrap();
        assert_eq!(day.total_check_in, 5);
        assert_eq!(day.tier_counts[&Tier::Navy], 1); // tiers count events once
    }

    #[test]
    fn closed_days_stay_zero_even_with_events() {
        let activities = catalog();
        let lucky = find_activity(&activities, "lucky").unwrap();
        let events = vec![
            event(6, "2025-12-18 10:00:00", "NAVY", "RECEIPT SPENDING", Some(1)),
            event(6, "2025-12-19 10:00:00", "NAVY", "RECEIPT SPENDING", Some(3)),
            event(6, "2025-12-25 15:00:00", "SCARLET", "RECEIPT SPENDING", Some(2)),
        ];

        let buckets = daily_breakdown(Some(lucky), &events, None);
        for bucket in &buckets {
            let day = bucket.date.format("%d").to_string();
            if day == "18" || day == "25" {
                assert!(bucket.is_active);
            } else {
                assert!(!bucket.is_active);
                assert_eq!(bucket.total_check_in, 0);
                assert!(bucket.redemption_counts.values().all(|c| *c == 0));
                assert!(bucket.tier_counts.values().all(|c| *c == 0));
            }
        }
        let open_total: i64 = buckets.iter().map(|b| b.total_check_in).sum();
        assert_eq!(open_total, 3); // the 19th never counts
    }

    #[test]
    fn category_set_is_activity_scoped() {
        let activities = catalog();
        let ginger = find_activity(&activities, "ginger").unwrap();
        let events = vec![
            event(1, "2025-12-18 10:00:00", "CROWN", "CASH CARD", Some(2)),
            event(1, "2025-12-18 10:05:00", "CROWN", "special-thing", None),
        ];

        let buckets = daily_breakdown(Some(ginger), &events, None);
        let day = buckets.first().unwrap();
        assert!(!day.redemption_counts.contains_key(&Category::CashCard));
        assert_eq!(day.total_check_in, 0);
        assert_eq!(day.other_units, 3); // 2 cash-card units + 1 unmapped
    }

    #[test]
    fn filter_date_keeps_only_that_day() {
        let activities = catalog();
        let power = find_activity(&activities, "power").unwrap();
        let filter = NaiveDate::from_ymd_opt(2025, 12, 22).unwrap();

        let buckets = daily_breakdown(Some(power), &[], Some(filter));
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].date, filter);
    }

    #[test]
    fn unknown_activity_yields_zeroed_series() {
        // Real events for known activities must not bleed into the buckets
        // of an unresolved id, not even as tier or other counts.
        let events = vec![
            event(1, "2025-12-18 10:00:00", "NAVY", "RECEIPT SPENDING", Some(2)),
            event(5, "2025-12-19 11:00:00", "CROWN", "special-thing", None),
        ];

        let buckets = daily_breakdown(None, &events, None);
        assert_eq!(buckets.len(), 11);
        for bucket in &buckets {
            assert!(bucket.redemption_counts.is_empty());
            assert_eq!(bucket.total_check_in, 0);
            assert_eq!(bucket.other_units, 0);
            assert!(bucket.tier_counts.values().all(|c| *c == 0));
        }
    }

    #[test]
    fn events_for_other_activities_are_ignored() {
        let activities = catalog();
        let ginger = find_activity(&activities, "ginger").unwrap();
        let events = vec![
            event(1, "2025-12-18 10:00:00", "NAVY", "RECEIPT SPENDING", Some(1)),
            event(3, "2025-12-18 10:00:00", "NAVY", "RECEIPT SPENDING", Some(9)),
        ];

        let buckets = daily_breakdown(Some(ginger), &events, None);
        assert_eq!(buckets[0].total_check_in, 1);
    }

    #[test]
    fn overview_sums_across_activities() {
        let activities = catalog();
        let events = vec![
            event(1, "2025-12-18 10:00:00", "NAVY", "RECEIPT SPENDING", Some(2)),
            event(3, "2025-12-18 11:00:00", "VEGA", "RECEIPT SPENDING", Some(1)),
            event(2, "2025-12-18 12:00:00", "CROWN", "CASH CARD", Some(4)),
        ];

        let buckets = overview_breakdown(&activities, &events, None);
        assert_eq!(buckets.len(), 11);

        let day = buckets.first().unwrap();
        assert_eq!(day.redemption_counts[&Category::ReceiptSpending], 3);
        assert_eq!(day.redemption_counts[&Category::CashCard], 4);
        assert_eq!(day.total_check_in, 7);
        assert_eq!(day.tier_counts[&Tier::Navy], 1);
        assert_eq!(day.tier_counts[&Tier::Crown], 1);
    }

    #[test]
    fn totals_match_bucket_sums() {
        let activities = catalog();
        let chill = find_activity(&activities, "chill").unwrap();
        let events = vec![
            event(5, "2025-12-18 10:00:00", "NAVY", "RECEIPT SPENDING", Some(2)),
            event(5, "2025-12-21 10:00:00", "SCARLET", "CARAT REDEEM", Some(3)),
            event(5, "2025-12-28 10:00:00", "NAVY", "MEMBER TIER", None),
        ];

        let buckets = daily_breakdown(Some(chill), &events, None);
        let totals = compute_totals(&buckets);

        let expected: i64 = buckets.iter().map(|b| b.total_check_in).sum();
        assert_eq!(totals.grand_total, expected);
        assert_eq!(totals.by_category[&Category::ReceiptSpending], 2);
        assert_eq!(totals.by_category[&Category::CaratRedeem], 3);
        assert_eq!(totals.by_tier[&Tier::Navy], 2);
        assert_eq!(totals.by_tier[&Tier::Scarlet], 1);
    }

    #[test]
    fn inactive_buckets_add_nothing_to_totals() {
        let activities = catalog();
        let lucky = find_activity(&activities, "lucky").unwrap();
        let events = vec![event(6, "2025-12-25 10:00:00", "VEGA", "RECEIPT SPENDING", Some(2))];

        let buckets = daily_breakdown(Some(lucky), &events, None);
        let totals = compute_totals(&buckets);
        assert_eq!(totals.grand_total, 2);
    }
}
