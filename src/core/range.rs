use tracing::debug;

use super::error::{EngineResult, ProjectionError};
use super::types::{ContributionRange, CustomRangeBounds, CustomRangeOutcome, DynamicRangeConfig};

const MIN_FLOOR_AMOUNT: f64 = 500.0;
const MIN_LOWER_FACTOR: f64 = 0.5;
const MIN_UPPER_FACTOR: f64 = 0.9;
const MAX_LOWER_FACTOR: f64 = 1.1;
const MAX_UPPER_FACTOR: f64 = 1.5;

/// Symmetric band around `base_amount` whose total width is
/// `flexibility_percent` of it. The percent is not clamped.
pub fn compute_symmetric_range(base_amount: f64, flexibility_percent: f64) -> ContributionRange {
    let half_spread = flexibility_percent / 2.0;
    ContributionRange {
        min: (base_amount * (1.0 - half_spread / 100.0)).round(),
        max: (base_amount * (1.0 + half_spread / 100.0)).round(),
    }
}

pub fn custom_range_bounds(base_amount: f64) -> CustomRangeBounds {
    CustomRangeBounds {
        min_lower_limit: MIN_FLOOR_AMOUNT.max((base_amount * MIN_LOWER_FACTOR).round()),
        min_upper_limit: (base_amount * MIN_UPPER_FACTOR).round(),
        max_lower_limit: (base_amount * MAX_LOWER_FACTOR).round(),
        max_upper_limit: (base_amount * MAX_UPPER_FACTOR).round(),
    }
}

/// Checks a user-proposed band against the window derived from
/// `base_amount`. The first failing check is reported: minimum bounds,
/// then maximum bounds, then ordering.
pub fn validate_custom_range(
    base_amount: f64,
    proposed_min: f64,
    proposed_max: f64,
) -> EngineResult<CustomRangeOutcome> {
    let bounds = custom_range_bounds(base_amount);

    if !(bounds.min_lower_limit..=bounds.min_upper_limit).contains(&proposed_min) {
        return Err(ProjectionError::MinOutOfBounds {
            value: proposed_min,
            lower: bounds.min_lower_limit,
            upper: bounds.min_upper_limit,
        });
    }
    if !(bounds.max_lower_limit..=bounds.max_upper_limit).contains(&proposed_max) {
        return Err(ProjectionError::MaxOutOfBounds {
            value: proposed_max,
            lower: bounds.max_lower_limit,
            upper: bounds.max_upper_limit,
        });
    }
    ensure_ordered(proposed_min, proposed_max)?;

    let min_percent = (base_amount - proposed_min) / base_amount * 100.0;
    let max_percent = (proposed_max - base_amount) / base_amount * 100.0;
    Ok(CustomRangeOutcome {
        range: ContributionRange {
            min: proposed_min,
            max: proposed_max,
        },
        min_percent,
        max_percent,
        effective_flexibility: (min_percent + max_percent) / 2.0 * 2.0,
    })
}

fn ensure_ordered(min: f64, max: f64) -> EngineResult<()> {
    if min >= max {
        return Err(ProjectionError::MinNotLessThanMax { min, max });
    }
    Ok(())
}

/// Resolves a band configuration into the range to project with, plus the
/// flexibility percent that band represents.
pub fn resolve_range(
    base_amount: f64,
    config: &DynamicRangeConfig,
) -> EngineResult<(ContributionRange, f64)> {
    let resolved = match *config {
        DynamicRangeConfig::Symmetric {
            flexibility_percent,
        } => (
            compute_symmetric_range(base_amount, flexibility_percent),
            flexibility_percent,
        ),
        DynamicRangeConfig::Custom {
            custom_min,
            custom_max,
        } => {
            let outcome = validate_custom_range(base_amount, custom_min, custom_max)?;
            (outcome.range, outcome.effective_flexibility)
        }
    };
    debug!(
        base_amount,
        min = resolved.0.min,
        max = resolved.0.max,
        flexibility = resolved.1,
        "resolved contribution range"
    );
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn symmetric_thirty_percent_band() {
        let range = compute_symmetric_range(5_000.0, 30.0);
        assert_eq!(range, ContributionRange { min: 4_250.0, max: 5_750.0 });
    }

    #[test]
    fn symmetric_band_rounds_to_whole_currency_units() {
        let range = compute_symmetric_range(1_005.0, 10.0);
        assert_eq!(range.min, 955.0);
        assert_eq!(range.max, 1_055.0);
    }

    #[test]
    fn symmetric_band_does_not_clamp_flexibility() {
        let range = compute_symmetric_range(1_000.0, 80.0);
        assert_eq!(range, ContributionRange { min: 600.0, max: 1_400.0 });
    }

    #[test]
    fn custom_bounds_use_floor_for_small_amounts() {
        let bounds = custom_range_bounds(800.0);
        assert_eq!(bounds.min_lower_limit, 500.0);
        assert_eq!(bounds.min_upper_limit, 720.0);
        assert_eq!(bounds.max_lower_limit, 880.0);
        assert_eq!(bounds.max_upper_limit, 1_200.0);
    }

    #[test]
    fn custom_min_below_window_is_rejected_with_bounds() {
        let err = validate_custom_range(10_000.0, 4_000.0, 12_000.0).expect_err("must reject");
        assert_eq!(
            err,
            ProjectionError::MinOutOfBounds {
                value: 4_000.0,
                lower: 5_000.0,
                upper: 9_000.0,
            }
        );
        assert!(err.to_string().contains("between ₹5000 and ₹9000"));
    }

    #[test]
    fn custom_max_outside_window_is_rejected() {
        let err = validate_custom_range(10_000.0, 8_000.0, 16_000.0).expect_err("must reject");
        assert_eq!(
            err,
            ProjectionError::MaxOutOfBounds {
                value: 16_000.0,
                lower: 11_000.0,
                upper: 15_000.0,
            }
        );
    }

    #[test]
    fn min_check_wins_when_both_bounds_fail() {
        let err = validate_custom_range(10_000.0, 100.0, 100_000.0).expect_err("must reject");
        assert_eq!(err.code(), "MinOutOfBounds");
    }

    #[test]
    fn inverted_band_fails_on_min_window_first() {
        // 9200 sits above the 9000 minimum ceiling, so the window check fires
        // before the ordering check does.
        let err = validate_custom_range(10_000.0, 9_200.0, 9_000.0).expect_err("must reject");
        assert_eq!(err.code(), "MinOutOfBounds");
    }

    #[test]
    fn ordering_check_rejects_equal_and_inverted_bounds() {
        assert_eq!(
            ensure_ordered(9_200.0, 9_000.0),
            Err(ProjectionError::MinNotLessThanMax {
                min: 9_200.0,
                max: 9_000.0,
            })
        );
        assert!(ensure_ordered(9_000.0, 9_000.0).is_err());
        assert!(ensure_ordered(8_999.0, 9_000.0).is_ok());
    }

    #[test]
    fn window_edges_are_inclusive() {
        let outcome = validate_custom_range(10_000.0, 5_000.0, 15_000.0).expect("valid band");
        assert_eq!(outcome.range, ContributionRange { min: 5_000.0, max: 15_000.0 });
        let outcome = validate_custom_range(10_000.0, 9_000.0, 11_000.0).expect("valid band");
        assert_approx(outcome.effective_flexibility, 20.0);
    }

    #[test]
    fn custom_band_reports_one_sided_deviations() {
        let outcome = validate_custom_range(10_000.0, 8_000.0, 13_000.0).expect("valid band");
        assert_approx(outcome.min_percent, 20.0);
        assert_approx(outcome.max_percent, 30.0);
        assert_approx(outcome.effective_flexibility, 50.0);
    }

    #[test]
    fn effective_flexibility_is_not_revalidated() {
        let outcome = validate_custom_range(10_000.0, 5_000.0, 15_000.0).expect("valid band");
        assert_approx(outcome.effective_flexibility, 100.0);
    }

    #[test]
    fn resolve_range_passes_through_symmetric_percent() {
        let (range, flexibility) = resolve_range(
            5_000.0,
            &DynamicRangeConfig::Symmetric {
                flexibility_percent: 30.0,
            },
        )
        .expect("valid config");
        assert_eq!(range, ContributionRange { min: 4_250.0, max: 5_750.0 });
        assert_eq!(flexibility, 30.0);
    }

    #[test]
    fn resolve_range_propagates_custom_errors() {
        let err = resolve_range(
            10_000.0,
            &DynamicRangeConfig::Custom {
                custom_min: 9_000.0,
                custom_max: 10_500.0,
            },
        )
        .expect_err("must reject");
        assert_eq!(err.code(), "MaxOutOfBounds");
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(128))]

        #[test]
        fn prop_symmetric_band_contains_base(
            base in 1u32..5_000_000,
            flexibility in 10u32..=50,
        ) {
            let base = base as f64;
            let range = compute_symmetric_range(base, flexibility as f64);
            prop_assert!(range.min <= base.round());
            prop_assert!(base.round() <= range.max);
            prop_assert!(range.min <= range.max);
        }

        #[test]
        fn prop_custom_validation_is_idempotent(
            base in 500u32..1_000_000,
            min in 0u32..2_000_000,
            max in 0u32..2_000_000,
        ) {
            let first = validate_custom_range(base as f64, min as f64, max as f64);
            let second = validate_custom_range(base as f64, min as f64, max as f64);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_accepted_custom_band_straddles_base(
            base in 1_000u32..1_000_000,
            min_share in 50u32..=90,
            max_share in 110u32..=150,
        ) {
            let base = base as f64;
            let bounds = custom_range_bounds(base);
            let min = (base * min_share as f64 / 100.0).round().clamp(bounds.min_lower_limit, bounds.min_upper_limit);
            let max = (base * max_share as f64 / 100.0).round().clamp(bounds.max_lower_limit, bounds.max_upper_limit);
            let outcome = validate_custom_range(base, min, max).expect("band inside window");
            prop_assert!(outcome.range.min < base);
            prop_assert!(base < outcome.range.max);
            prop_assert!(outcome.effective_flexibility > 0.0);
        }
    }
}
