use crate::models::EventRecord;

pub const CSV_HEADER: [&str; 11] = [
    "Date",
    "Time",
    "Activity",
    "MemberID",
    "Tier",
    "ReceiptNo",
    "PaymentMethod",
    "RedeemType",
    "Spending",
    "Rights",
    "StaffID",
];

/// Raw row-level dump of events, one line per event in timestamp order.
/// Deliberately not built on the aggregation engine: export consumers need
/// the individual transactions, not daily summaries. Free-text fields go
/// through the csv writer so embedded commas and quotes are escaped.
pub fn write_csv(events: &[EventRecord]) -> anyhow::Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for event in events {
        writer.write_record(&[
            event.occurred_at.format("%Y-%m-%d").to_string(),
            event.occurred_at.format("%H:%M:%S").to_string(),
            event.activity_name.clone(),
            event.member_id.clone(),
            event.member_tier.clone(),
            event.receipt_no.clone(),
            event.payment_method.clone(),
            event.redeem_type.clone(),
            format!("{:.2}", event.spending_amount),
            event
                .rights_earned
                .map(|r| r.to_string())
                .unwrap_or_default(),
            event.staff_id.clone(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flushing csv buffer failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn event(timestamp: &str, activity_name: &str, member_id: &str) -> EventRecord {
        EventRecord {
            id: 1,
            activity_db_id: 1,
            activity_name: activity_name.to_string(),
            occurred_at: NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S").unwrap(),
            member_id: member_id.to_string(),
            member_tier: "NAVY".to_string(),
            receipt_no: "RC-1".to_string(),
            payment_method: "RECEIPT SPENDING".to_string(),
            redeem_type: "GIFT".to_string(),
            spending_amount: 1234.5,
            rights_earned: Some(2),
            staff_id: "ST-01".to_string(),
        }
    }

    #[test]
    fn one_line_per_event_plus_header() {
        let events = vec![
            event("2025-12-18 10:00:00", "GINGER BREAD", "M1"),
            event("2025-12-19 11:00:00", "GINGER BREAD", "M2"),
        ];

        let bytes = write_csv(&events).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), events.len() + 1);
        assert_eq!(lines[0], CSV_HEADER.join(","));
        assert!(lines[1].starts_with("2025-12-18,10:00:00,GINGER BREAD,M1,NAVY"));
    }

    #[test]
    fn embedded_commas_are_quoted() {
        let events = vec![event("2025-12-18 10:00:00", "CLAW, THE GIANT", "M1")];
        let bytes = write_csv(&events).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("\"CLAW, THE GIANT\""));
        // Still parses back to the same number of fields.
        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(record.len(), CSV_HEADER.len());
        assert_eq!(&record[2], "CLAW, THE GIANT");
    }

    #[test]
    fn absent_rights_exports_as_empty_field() {
        let mut e = event("2025-12-18 10:00:00", "GINGER BREAD", "M1");
        e.rights_earned = None;
        let text = String::from_utf8(write_csv(&[e]).unwrap()).unwrap();
        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[9], "");
    }
}
