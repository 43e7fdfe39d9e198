use chrono::{Datelike, NaiveDate};

/// Member loyalty tiers. The vocabulary is global and fixed; raw tier text
/// from upstream that matches none of these is left out of named tier totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Navy,
    Scarlet,
    Crown,
    Vega,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Navy, Tier::Scarlet, Tier::Crown, Tier::Vega];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Navy => "NAVY",
            Tier::Scarlet => "SCARLET",
            Tier::Crown => "CROWN",
            Tier::Vega => "VEGA",
        }
    }

    pub fn parse(raw: &str) -> Option<Tier> {
        match raw.trim().to_uppercase().as_str() {
            "NAVY" => Some(Tier::Navy),
            "SCARLET" => Some(Tier::Scarlet),
            "CROWN" => Some(Tier::Crown),
            "VEGA" => Some(Tier::Vega),
            _ => None,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized redemption categories. Raw payment-method text is free text
/// from several integration sources, so everything funnels through
/// [`Category::normalize`]; `Other` collects whatever matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    ReceiptSpending,
    CashCard,
    CardX,
    CaratRedeem,
    MemberTier,
    Other,
}

impl Category {
    /// Every named category, excluding the `Other` bucket.
    pub const NAMED: [Category; 5] = [
        Category::ReceiptSpending,
        Category::CashCard,
        Category::CardX,
        Category::CaratRedeem,
        Category::MemberTier,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::ReceiptSpending => "RECEIPT SPENDING",
            Category::CashCard => "CASH CARD",
            Category::CardX => "CARD X",
            Category::CaratRedeem => "CARAT REDEEM",
            Category::MemberTier => "MEMBER TIER",
            Category::Other => "OTHER",
        }
    }

    /// Maps raw payment-method text to exactly one category. Case-insensitive
    /// substring match in a fixed priority order; the order matters because
    /// "CARDX" would otherwise be swallowed by a "CARD" match. Total and
    /// deterministic: never fails, null/empty input lands in `Other`.
    pub fn normalize(raw: Option<&str>) -> Category {
        let text = match raw {
            Some(t) if !t.trim().is_empty() => t.to_uppercase(),
            _ => return Category::Other,
        };

        if text.contains("RECEIPT") {
            Category::ReceiptSpending
        } else if text.contains("CARDX") || text.contains("CARD X") {
            Category::CardX
        } else if text.contains("CASH CARD") {
            Category::CashCard
        } else if text.contains("CARAT") {
            Category::CaratRedeem
        } else if text.contains("TIER") || text.contains("QUOTA") {
            Category::MemberTier
        } else {
            Category::Other
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which calendar days within an activity's window accept redemptions.
#[derive(Debug, Clone)]
pub enum OpenDays {
    All,
    /// Restricted to the listed days of the month, e.g. a lucky-draw that
    /// only runs on the 18th and 25th of a ten-day event.
    OnlyDaysOfMonth(Vec<u32>),
}

#[derive(Debug, Clone)]
pub struct Activity {
    pub id: &'static str,
    pub db_id: i32,
    pub name: &'static str,
    pub total_quota: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub supported: Vec<Category>,
    pub open_days: OpenDays,
}

impl Activity {
    pub fn is_open(&self, date: NaiveDate) -> bool {
        match &self.open_days {
            OpenDays::All => true,
            OpenDays::OnlyDaysOfMonth(days) => days.contains(&date.day()),
        }
    }
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    // Only called with literal, known-valid dates below.
    NaiveDate::from_ymd_opt(year, month, day).expect("valid calendar date")
}

/// Default event window used when an activity id cannot be resolved, so
/// callers still get a gap-free (if empty) daily series.
pub fn default_window() -> (NaiveDate, NaiveDate) {
    (ymd(2025, 12, 18), ymd(2025, 12, 28))
}

/// The static activity catalog. Supported categories are declared here, not
/// derived from data: an activity that has never seen a CASH CARD event still
/// reports a zero row for it if listed, and omits it entirely if not.
pub fn catalog() -> Vec<Activity> {
    let (start_date, end_date) = default_window();
    let entry = |id, db_id, name, total_quota, supported, open_days| Activity {
        id,
        db_id,
        name,
        total_quota,
        start_date,
        end_date,
        supported,
        open_days,
    };

    vec![
        entry(
            "ginger",
            1,
            "GINGER BREAD",
            1000,
            vec![Category::ReceiptSpending],
            OpenDays::All,
        ),
        entry(
            "luxe",
            2,
            "THE LUXE CLAW",
            100,
            vec![Category::CashCard],
            OpenDays::All,
        ),
        entry(
            "power",
            3,
            "THE POWER CLAW",
            300,
            vec![Category::ReceiptSpending],
            OpenDays::All,
        ),
        entry(
            "giant",
            4,
            "THE GIANT CLAW",
            50,
            vec![Category::ReceiptSpending],
            OpenDays::All,
        ),
        entry(
            "chill",
            5,
            "GIFTIVAL CHILL BAR",
            100,
            vec![
                Category::MemberTier,
                Category::ReceiptSpending,
                Category::CaratRedeem,
            ],
            OpenDays::All,
        ),
        entry(
            "lucky",
            6,
            "LUCKY GIFTMAS",
            9999,
            vec![Category::ReceiptSpending],
            OpenDays::OnlyDaysOfMonth(vec![18, 25]),
        ),
        entry(
            "wheel",
            7,
            "SPIN THE POWER WHEEL",
            500,
            vec![Category::CaratRedeem, Category::CardX, Category::MemberTier],
            OpenDays::All,
        ),
    ]
}

pub fn find_activity<'a>(activities: &'a [Activity], id: &str) -> Option<&'a Activity> {
    activities
        .iter()
        .find(|a| a.id.eq_ignore_ascii_case(id.trim()))
}
