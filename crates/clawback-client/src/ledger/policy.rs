use chrono::{NaiveDate, Weekday};

use crate::ledger::date::parse_statement_date;

/// Deterministic classification/bucketing policy identifier.
///
/// Emitted with every report so a change to the rounding rule, the default
/// epoch or the week anchor shows up as a version bump rather than silently
/// shifting historical numbers.
pub const REPORT_POLICY_VERSION: &str = "classification/v1";

/// v1 report policy.
///
/// Notes:
/// - `months_scale` is the number of premium months an advance covers.
/// - `default_range_start` is the earliest first-statement date shown when no
///   explicit range is requested.
/// - Statement dates outside `earliest_statement_date..=latest_statement_date`
///   are treated as unparseable and dropped from the population.
#[derive(Debug, Clone, Copy)]
pub struct ReportPolicy {
    pub months_scale: u8,
    pub default_range_start: &'static str,
    pub week_start: Weekday,
    pub earliest_statement_date: &'static str,
    pub latest_statement_date: &'static str,
}

impl ReportPolicy {
    /// Months of premium paid before the chargeback, from the signed amounts.
    ///
    /// Worked from the unrecovered remainder rather than from `cb_fraction`,
    /// so a true half month (1200 advanced, 1150 recovered) is an exact `.5`
    /// and rounds half away from zero.
    pub fn months_paid(self, advance_amount: f64, chargeback_amount: f64) -> u8 {
        let recovered = chargeback_amount.abs();
        if advance_amount.is_nan() || advance_amount <= 0.0 || recovered.is_nan() {
            return self.months_scale;
        }
        if recovered >= advance_amount {
            return 0;
        }
        let scale = f64::from(self.months_scale);
        let rounded = (scale * (advance_amount - recovered) / advance_amount)
            .round()
            .clamp(0.0, scale);
        rounded as u8
    }

    pub fn default_range_start_date(self) -> Option<NaiveDate> {
        parse_statement_date(self.default_range_start)
    }

    pub fn accepts_statement_date(self, date: NaiveDate) -> bool {
        let lower = parse_statement_date(self.earliest_statement_date);
        let upper = parse_statement_date(self.latest_statement_date);
        lower.is_none_or(|bound| date >= bound) && upper.is_none_or(|bound| date <= bound)
    }
}

pub const REPORT_POLICY_V1: ReportPolicy = ReportPolicy {
    months_scale: 12,
    default_range_start: "2024-01-01",
    week_start: Weekday::Mon,
    earliest_statement_date: "1677-09-22",
    latest_statement_date: "2262-04-11",
};
