use super::{BandSample, PositionedFlow};

/// Samples a flow band between two anchors.
///
/// The centerline is a quartic Bézier with horizontal control fractions
/// `0, curve, 0.5, 1 - curve, 1` and vertical fractions `0, 0, 0.5, 1, 1`,
/// stretched over the `(x0, y0)`–`(x1, y1)` box. The half-width moves
/// linearly from `band0` to `band1`.
#[allow(clippy::too_many_arguments)]
pub fn curve_samples(
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    band0: f64,
    band1: f64,
    curve: f64,
    resolution: usize,
) -> Vec<BandSample> {
    let xs = [0.0, curve, 0.5, 1.0 - curve, 1.0];
    let ys = [0.0, 0.0, 0.5, 1.0, 1.0];
    let steps = resolution.saturating_sub(1).max(1) as f64;
    (0..resolution)
        .map(|i| {
            let t = i as f64 / steps;
            let x = x0 + bezier(&xs, t) * (x1 - x0);
            let y = y0 + bezier(&ys, t) * (y1 - y0);
            let band = band0 + (band1 - band0) * t;
            BandSample {
                x,
                y_upper: y + band,
                y_lower: y - band,
            }
        })
        .collect()
}

/// Band samples for a laid-out flow.
pub fn flow_samples(flow: &PositionedFlow, curve: f64, resolution: usize) -> Vec<BandSample> {
    curve_samples(
        flow.start_band.x,
        flow.start_band.y,
        flow.end_band.x,
        flow.end_band.y,
        flow.start_band.y_band,
        flow.end_band.y_band,
        curve,
        resolution,
    )
}

// de Casteljau evaluation of a degree-4 curve in one coordinate.
fn bezier(points: &[f64; 5], t: f64) -> f64 {
    let mut work = *points;
    for level in (1..work.len()).rev() {
        for i in 0..level {
            work[i] = work[i] + (work[i + 1] - work[i]) * t;
        }
    }
    work[0]
}
