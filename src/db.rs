use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::{PgPool, Row};
use thiserror::Error;

use crate::models::EventRecord;

/// Store-level failures, kept distinct from "no rows matched" so adapters
/// can degrade to an empty dataset with a user-visible message instead of
/// treating an outage as an empty event log.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("event store query failed: {0}")]
    Query(#[from] sqlx::Error),
    #[error("schema migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

pub async fn init_db(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Inserts a realistic fixture set covering the Dec 18-28 window. Idempotent
/// via source keys, so re-running `seed` never duplicates rows.
pub async fn seed(pool: &PgPool) -> anyhow::Result<usize> {
    // (source_key, activity_db_id, activity_name, timestamp, member, tier,
    //  receipt, payment_method, redeem_type, spending, rights, staff)
    let fixtures: Vec<(
        &str,
        i32,
        &str,
        &str,
        &str,
        &str,
        &str,
        &str,
        &str,
        f64,
        Option<i32>,
        &str,
    )> = vec![
        (
            "seed-0001", 1, "GINGER BREAD", "2025-12-18 10:12:00", "M100201", "NAVY",
            "RC-88001", "Receipt-8000TH", "GIFT SET", 8250.0, Some(2), "ST-01",
        ),
        (
            "seed-0002", 1, "GINGER BREAD", "2025-12-18 13:40:00", "M100342", "CROWN",
            "RC-88002", "RECEIPT SPENDING", "GIFT SET", 4100.0, Some(1), "ST-01",
        ),
        (
            "seed-0003", 1, "GINGER BREAD", "2025-12-19 11:05:00", "M100577", "SCARLET",
            "RC-88003", "receipt spending", "GIFT SET", 12500.0, Some(3), "ST-02",
        ),
        (
            "seed-0004", 2, "THE LUXE CLAW", "2025-12-18 12:00:00", "M100881", "VEGA",
            "CC-20011", "CASH CARD", "CLAW TOKEN", 2000.0, Some(1), "ST-03",
        ),
        (
            "seed-0005", 2, "THE LUXE CLAW", "2025-12-20 16:22:00", "M100342", "CROWN",
            "CC-20012", "Cash Card 2000", "CLAW TOKEN", 2000.0, None, "ST-03",
        ),
        (
            "seed-0006", 3, "THE POWER CLAW", "2025-12-19 10:45:00", "M100002", "NAVY",
            "RC-88010", "RECEIPT SPENDING", "CLAW TOKEN", 6000.0, Some(2), "ST-04",
        ),
        (
            "seed-0007", 4, "THE GIANT CLAW", "2025-12-21 14:10:00", "M100119", "SCARLET",
            "RC-88011", "Receipt-15000TH", "CLAW TOKEN", 15300.0, Some(1), "ST-04",
        ),
        (
            "seed-0008", 5, "GIFTIVAL CHILL BAR", "2025-12-19 15:30:00", "M100881", "VEGA",
            "BR-00021", "MEMBER TIER", "DRINK", 0.0, Some(1), "ST-05",
        ),
        (
            "seed-0009", 5, "GIFTIVAL CHILL BAR", "2025-12-22 17:05:00", "M100577", "SCARLET",
            "BR-00022", "CARAT REDEEM", "DRINK", 0.0, Some(1), "ST-05",
        ),
        (
            "seed-0010", 6, "LUCKY GIFTMAS", "2025-12-18 11:11:00", "M100201", "NAVY",
            "RC-88020", "RECEIPT SPENDING", "LUCKY DRAW", 3000.0, Some(1), "ST-06",
        ),
        (
            "seed-0011", 6, "LUCKY GIFTMAS", "2025-12-25 12:34:00", "M100999", "CROWN",
            "RC-88021", "RECEIPT SPENDING", "LUCKY DRAW", 9400.0, Some(2), "ST-06",
        ),
        (
            "seed-0012", 7, "SPIN THE POWER WHEEL", "2025-12-20 13:00:00", "M100119", "SCARLET",
            "WH-00301", "CARDX-Promo", "WHEEL SPIN", 0.0, Some(1), "ST-07",
        ),
        (
            "seed-0013", 7, "SPIN THE POWER WHEEL", "2025-12-23 18:40:00", "M100002", "NAVY",
            "WH-00302", "CARAT REDEEM 360", "WHEEL SPIN", 0.0, Some(1), "ST-07",
        ),
        (
            "seed-0014", 7, "SPIN THE POWER WHEEL", "2025-12-26 19:15:00", "M100342", "CROWN",
            "WH-00303", "walk-in special", "WHEEL SPIN", 0.0, None, "ST-07",
        ),
    ];

    let mut inserted = 0usize;
    for (
        source_key,
        activity_db_id,
        activity_name,
        occurred_at,
        member_id,
        member_tier,
        receipt_no,
        payment_method,
        redeem_type,
        spending_amount,
        rights_earned,
        staff_id,
    ) in fixtures
    {
        let occurred_at = NaiveDateTime::parse_from_str(occurred_at, "%Y-%m-%d %H:%M:%S")
            .context("invalid fixture timestamp")?;

        let result = sqlx::query(
            r#"
            INSERT INTO event_checkin.event_transactions
            (activity_id, activity_name, occurred_at, member_id, member_tier,
             receipt_no, payment_method, redeem_type, spending_amount,
             rights_earned, staff_id, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(activity_db_id)
        .bind(activity_name)
        .bind(occurred_at)
        .bind(member_id)
        .bind(member_tier)
        .bind(receipt_no)
        .bind(payment_method)
        .bind(redeem_type)
        .bind(spending_amount)
        .bind(rights_earned)
        .bind(staff_id)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}

/// The engine's one bulk read: all events for an activity (or every activity
/// when `activity_db_id` is `None`) within the date range. Day-by-day
/// reshaping happens in memory, never as per-day queries.
pub async fn fetch_events(
    pool: &PgPool,
    activity_db_id: Option<i32>,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<EventRecord>, StoreError> {
    let mut query = String::from(
        "SELECT id, activity_id, activity_name, occurred_at, member_id, \
         member_tier, receipt_no, payment_method, redeem_type, \
         spending_amount, rights_earned, staff_id \
         FROM event_checkin.event_transactions \
         WHERE occurred_at::date BETWEEN $1 AND $2",
    );
    if activity_db_id.is_some() {
        query.push_str(" AND activity_id = $3");
    }
    query.push_str(" ORDER BY occurred_at");

    let mut rows = sqlx::query(&query).bind(start).bind(end);
    if let Some(id) = activity_db_id {
        rows = rows.bind(id);
    }

    let records = rows.fetch_all(pool).await?;
    Ok(records.iter().map(event_from_row).collect::<Result<_, _>>()?)
}

/// Raw rows for CSV export, ordered by timestamp. No date window: the export
/// is a full dump for the activity, or the whole event log when the id is
/// unresolved.
pub async fn fetch_export_rows(
    pool: &PgPool,
    activity_db_id: Option<i32>,
) -> Result<Vec<EventRecord>, StoreError> {
    let mut query = String::from(
        "SELECT id, activity_id, activity_name, occurred_at, member_id, \
         member_tier, receipt_no, payment_method, redeem_type, \
         spending_amount, rights_earned, staff_id \
         FROM event_checkin.event_transactions",
    );
    if activity_db_id.is_some() {
        query.push_str(" WHERE activity_id = $1");
    }
    query.push_str(" ORDER BY occurred_at");

    let mut rows = sqlx::query(&query);
    if let Some(id) = activity_db_id {
        rows = rows.bind(id);
    }

    let records = rows.fetch_all(pool).await?;
    Ok(records.iter().map(event_from_row).collect::<Result<_, _>>()?)
}

fn event_from_row(row: &sqlx::postgres::PgRow) -> Result<EventRecord, sqlx::Error> {
    Ok(EventRecord {
        id: row.try_get("id")?,
        activity_db_id: row.try_get("activity_id")?,
        activity_name: row.try_get("activity_name")?,
        occurred_at: row.try_get("occurred_at")?,
        member_id: row.try_get("member_id")?,
        member_tier: row.try_get("member_tier")?,
        receipt_no: row.try_get("receipt_no")?,
        payment_method: row.try_get("payment_method")?,
        redeem_type: row.try_get("redeem_type")?,
        spending_amount: row.try_get("spending_amount")?,
        rights_earned: row.try_get("rights_earned")?,
        staff_id: row.try_get("staff_id")?,
    })
}
