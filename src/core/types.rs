use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvestmentMode {
    Systematic,
    Lumpsum,
}

/// One horizon bucket: applies to any horizon of at most `max_years`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateBucket {
    pub label: String,
    pub max_years: f64,
    pub rate: f64,
}

/// Rate applied once the horizon is past every explicit bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenEndedRate {
    pub label: String,
    pub rate: f64,
}

/// Horizon buckets in ascending `max_years` order plus the open-ended tail.
///
/// Construct through [`RateTable::new`] (or the JSON loader) so the
/// ordering and value checks hold.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateTable {
    pub(crate) buckets: Vec<RateBucket>,
    pub(crate) open_ended: OpenEndedRate,
}

#[derive(Debug, Clone)]
pub struct ContributionPlan {
    pub base_amount: f64,
    pub horizon_months: u32,
    pub mode: InvestmentMode,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DynamicRangeConfig {
    Symmetric { flexibility_percent: f64 },
    Custom { custom_min: f64, custom_max: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContributionRange {
    pub min: f64,
    pub max: f64,
}

impl ContributionRange {
    pub fn midpoint(self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

/// The window a user-supplied band has to fit in, derived from the base amount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomRangeBounds {
    pub min_lower_limit: f64,
    pub min_upper_limit: f64,
    pub max_lower_limit: f64,
    pub max_upper_limit: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomRangeOutcome {
    pub range: ContributionRange,
    pub min_percent: f64,
    pub max_percent: f64,
    pub effective_flexibility: f64,
}

/// Output of a single future value computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FutureValue {
    pub invested: f64,
    pub gains: f64,
    pub maturity_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    pub invested: f64,
    pub gains: f64,
    pub maturity_value: f64,
    pub is_dynamic: bool,
    pub range_used: Option<ContributionRange>,
    pub annual_rate: f64,
    pub projected_contribution: f64,
    pub flexibility_percent: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulePoint {
    pub month: u32,
    pub invested: f64,
    pub gains: f64,
    pub maturity_value: f64,
}
