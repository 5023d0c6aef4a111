use chrono::NaiveDate;
use serde::Serialize;

/// One signed commission payment as returned by the ledger query.
///
/// `statement_date` is kept as the raw text the data source produced; it is
/// only parsed while grouping so malformed values can be counted instead of
/// aborting the run.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub policy_id: i64,
    pub policy_number: String,
    pub statement_date: String,
    pub override_amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolicySummary {
    pub policy_id: i64,
    pub policy_number: String,
    pub first_statement_date: NaiveDate,
    pub advance_amount: f64,
    pub chargeback_amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyStatus {
    Active,
    ChargedBack,
}

impl PolicyStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::ChargedBack => "charged_back",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::ChargedBack => "Charged Back",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedSummary {
    pub summary: PolicySummary,
    pub cb_fraction: f64,
    pub months_paid: u8,
    pub status: PolicyStatus,
}

impl ClassifiedSummary {
    pub fn first_statement_date(&self) -> NaiveDate {
        self.summary.first_statement_date
    }

    pub fn is_charged_back(&self) -> bool {
        self.status == PolicyStatus::ChargedBack
    }
}

/// Named views over a classified population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    All,
    InPolicy,
    NonInPolicy,
}

impl Segment {
    pub const ALL_SEGMENTS: [Segment; 3] = [Self::All, Self::InPolicy, Self::NonInPolicy];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::InPolicy => "in_policy",
            Self::NonInPolicy => "non_in_policy",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All Policies",
            Self::InPolicy => "IP Returns (Month 0)",
            Self::NonInPolicy => "Non-IP Returns (Month 1+)",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "all" => Some(Self::All),
            "in_policy" | "ip" => Some(Self::InPolicy),
            "non_in_policy" | "nip" => Some(Self::NonInPolicy),
            _ => None,
        }
    }

    pub fn contains(self, record: &ClassifiedSummary) -> bool {
        match self {
            Self::All => true,
            Self::InPolicy => record.is_charged_back() && record.months_paid == 0,
            Self::NonInPolicy => record.is_charged_back() && record.months_paid > 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationInterval {
    Day,
    Week,
    Month,
}

impl AggregationInterval {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "day" | "d" => Some(Self::Day),
            "week" | "w" => Some(Self::Week),
            "month" | "m" => Some(Self::Month),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeBucket {
    pub period_start: NaiveDate,
    pub advance_total: f64,
    pub chargeback_total: f64,
    pub count: usize,
    pub mean_months_paid: f64,
}

/// Inclusive range over `first_statement_date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Caller supplied bounds; a missing side falls back to the default range rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeRequest {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::{AggregationInterval, Segment};

    #[test]
    fn segment_parse_accepts_cli_and_contract_spellings() {
        assert_eq!(Segment::parse("in-policy"), Some(Segment::InPolicy));
        assert_eq!(Segment::parse("NON_IN_POLICY"), Some(Segment::NonInPolicy));
        assert_eq!(Segment::parse(" all "), Some(Segment::All));
        assert_eq!(Segment::parse("active"), None);
    }

    #[test]
    fn interval_parse_accepts_short_forms() {
        assert_eq!(AggregationInterval::parse("W"), Some(AggregationInterval::Week));
        assert_eq!(AggregationInterval::parse("month"), Some(AggregationInterval::Month));
        assert_eq!(AggregationInterval::parse("quarter"), None);
    }
}
