use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use super::error::{EngineResult, ProjectionError};
use super::types::{OpenEndedRate, RateBucket, RateTable};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedRate<'a> {
    pub label: &'a str,
    pub rate: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RateTableFile {
    buckets: Vec<RateBucket>,
    open_ended: OpenEndedRate,
}

impl RateTable {
    pub fn new(mut buckets: Vec<RateBucket>, open_ended: OpenEndedRate) -> EngineResult<Self> {
        if buckets.is_empty() {
            return Err(invalid_table("at least one horizon bucket is required"));
        }
        for bucket in &buckets {
            if !bucket.max_years.is_finite() || bucket.max_years <= 0.0 {
                return Err(invalid_table(format!(
                    "bucket {} has a non-positive upper bound",
                    bucket.label
                )));
            }
            if !bucket.rate.is_finite() || bucket.rate < 0.0 {
                return Err(invalid_table(format!(
                    "bucket {} has a negative or non-finite rate",
                    bucket.label
                )));
            }
        }
        if !open_ended.rate.is_finite() || open_ended.rate < 0.0 {
            return Err(invalid_table("open-ended rate must be finite and >= 0"));
        }

        buckets.sort_by(|a, b| a.max_years.total_cmp(&b.max_years));
        if buckets
            .windows(2)
            .any(|pair| pair[0].max_years == pair[1].max_years)
        {
            return Err(invalid_table("bucket upper bounds must be unique"));
        }

        Ok(Self {
            buckets,
            open_ended,
        })
    }

    pub fn from_json_str(json: &str) -> EngineResult<Self> {
        let file: RateTableFile = serde_json::from_str(json)
            .map_err(|e| invalid_table(format!("malformed JSON: {e}")))?;
        Self::new(file.buckets, file.open_ended)
    }

    pub fn load(path: &Path) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| invalid_table(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json_str(&content)
    }

    pub fn buckets(&self) -> &[RateBucket] {
        &self.buckets
    }

    pub fn open_ended(&self) -> &OpenEndedRate {
        &self.open_ended
    }
}

impl Default for RateTable {
    /// Expected annualised returns by horizon used by the dashboard's fund list.
    fn default() -> Self {
        let bucket = |label: &str, max_years: f64, rate: f64| RateBucket {
            label: label.to_string(),
            max_years,
            rate,
        };
        Self {
            buckets: vec![
                bucket("1Y", 1.0, 0.142),
                bucket("2Y", 2.0, 0.138),
                bucket("3Y", 3.0, 0.151),
                bucket("5Y", 5.0, 0.164),
                bucket("10Y", 10.0, 0.172),
            ],
            open_ended: OpenEndedRate {
                label: "15Y".to_string(),
                rate: 0.168,
            },
        }
    }
}

fn invalid_table(reason: impl Into<String>) -> ProjectionError {
    ProjectionError::InvalidRateTable {
        reason: reason.into(),
    }
}

/// Finds the first bucket whose upper bound covers the horizon. Bounds are
/// inclusive, so exactly 12 months lands in a 1-year bucket.
pub fn resolve_bucket(horizon_months: u32, table: &RateTable) -> EngineResult<ResolvedRate<'_>> {
    if horizon_months == 0 {
        return Err(ProjectionError::InvalidHorizon { months: 0 });
    }
    let years = horizon_months as f64 / 12.0;
    let resolved = table
        .buckets
        .iter()
        .find(|bucket| bucket.max_years >= years)
        .map(|bucket| ResolvedRate {
            label: &bucket.label,
            rate: bucket.rate,
        })
        .unwrap_or(ResolvedRate {
            label: &table.open_ended.label,
            rate: table.open_ended.rate,
        });
    debug!(
        horizon_months,
        bucket = resolved.label,
        rate = resolved.rate,
        "resolved annual rate"
    );
    Ok(resolved)
}

pub fn resolve_annual_rate(horizon_months: u32, table: &RateTable) -> EngineResult<f64> {
    resolve_bucket(horizon_months, table).map(|resolved| resolved.rate)
}
