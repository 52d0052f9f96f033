//! Raw predictor outputs to the user-facing verdict.

use serde::{Deserialize, Serialize};

use crate::model::RawPrediction;

/// Probability above which an event is reported (strictly greater)
pub const EVENT_THRESHOLD: f64 = 0.5;

/// Length of the window the arrival heads are normalized to (seconds)
pub const ARRIVAL_WINDOW_SECS: f64 = 60.0;

/// Decimal places kept in every reported number
pub const REPORT_DECIMALS: i32 = 4;

/// Verdict returned for one recording
///
/// The arrival offsets are present if and only if an event was detected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub event_probability: f64,
    pub event_detected: bool,
    #[serde(
        rename = "p_prediction",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub p_offset_seconds: Option<f64>,
    #[serde(
        rename = "s_prediction",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub s_offset_seconds: Option<f64>,
}

/// Apply the detection threshold and unit conversion
pub fn build(raw: RawPrediction) -> PredictionResult {
    build_from_parts(
        raw.event_probability as f64,
        raw.p_raw as f64,
        raw.s_raw as f64,
    )
}

/// Same as [`build`], from the three scalars directly
pub fn build_from_parts(event_probability: f64, p_raw: f64, s_raw: f64) -> PredictionResult {
    let event_detected = event_probability > EVENT_THRESHOLD;

    let (p_offset_seconds, s_offset_seconds) = if event_detected {
        (
            Some(round_to(p_raw * ARRIVAL_WINDOW_SECS, REPORT_DECIMALS)),
            Some(round_to(s_raw * ARRIVAL_WINDOW_SECS, REPORT_DECIMALS)),
        )
    } else {
        (None, None)
    };

    PredictionResult {
        event_probability: round_to(event_probability, REPORT_DECIMALS),
        event_detected,
        p_offset_seconds,
        s_offset_seconds,
    }
}

/// Round to `decimals` places, exact ties going to the even digit
///
/// The decision is made on the exact decimal value of `value`, not on the
/// rounded product `value * 10^decimals`.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(decimals);
    let scaled = value * factor;
    // Exact residual of the product; `factor` itself is exact
    let residual = value.mul_add(factor, -scaled);
    let floor = scaled.floor();

    let rounded = if scaled - floor == 0.5 {
        if residual > 0.0 {
            floor + 1.0
        } else if residual < 0.0 {
            floor
        } else {
            scaled.round_ties_even()
        }
    } else {
        scaled.round()
    };
    rounded / factor
}
