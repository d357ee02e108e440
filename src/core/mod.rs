mod engine;
mod error;
mod growth;
mod range;
mod rates;
mod types;

pub use engine::{project, project_schedule};
pub use error::{EngineResult, ProjectionError};
pub use growth::compute_future_value;
pub use range::{compute_symmetric_range, custom_range_bounds, resolve_range, validate_custom_range};
pub use rates::{ResolvedRate, resolve_annual_rate, resolve_bucket};
pub use types::{
    ContributionPlan, ContributionRange, CustomRangeBounds, CustomRangeOutcome,
    DynamicRangeConfig, FutureValue, InvestmentMode, OpenEndedRate, ProjectionResult, RateBucket,
    RateTable, SchedulePoint,
};
