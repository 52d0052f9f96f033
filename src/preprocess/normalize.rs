// Per-channel scaling helpers

use ndarray::Array2;

/// Guard added to every divisor so silent or constant channels stay finite
pub const EPSILON: f64 = 1e-6;

/// Standardize a channel in place: (x - mean) / (std + EPSILON)
///
/// Uses the population standard deviation.
pub fn standardize(channel: &mut [f64]) {
    if channel.is_empty() {
        return;
    }
    let n = channel.len() as f64;
    let mean = channel.iter().sum::<f64>() / n;
    let variance = channel.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / n;
    let denom = variance.sqrt() + EPSILON;

    for x in channel.iter_mut() {
        *x = (*x - mean) / denom;
    }
}

/// Scale a magnitude map in place to [0, 1] using its own extrema
pub fn min_max(map: &mut Array2<f64>) {
    let (min, max) = map
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if !min.is_finite() {
        return;
    }
    let denom = max - min + EPSILON;
    map.mapv_inplace(|v| (v - min) / denom);
}
