//! Hilbert transform cycle indicators (Ehlers).
//!
//! Every output comes from one pass over the price series. Values inside
//! the unstable warmup of the transform are reported as undefined: 32 bars
//! for the dominant cycle period and the phasor, 63 bars for everything that
//! also needs the phase.

use std::f64::consts::PI;

use super::mask_warmup;

const PERIOD_LOOKBACK: usize = 32;
const PHASE_LOOKBACK: usize = 63;

const A: f64 = 0.0962;
const B: f64 = 0.5769;

/// Per-bar state of the transform
#[derive(Debug, Clone, Default)]
pub struct HilbertOutput {
    pub dc_period: Vec<f64>,
    pub dc_phase: Vec<f64>,
    pub inphase: Vec<f64>,
    pub quadrature: Vec<f64>,
    pub sine: Vec<f64>,
    pub lead_sine: Vec<f64>,
    pub trendline: Vec<f64>,
    pub trend_mode: Vec<f64>,
}

/// Value `k` bars before `t`, 0 before the start of the series
#[inline]
fn back(values: &[f64], t: usize, k: usize) -> f64 {
    if t >= k {
        values[t - k]
    } else {
        0.0
    }
}

#[inline]
fn hilbert(values: &[f64], t: usize, adjust: f64) -> f64 {
    (A * back(values, t, 0) + B * back(values, t, 2) - B * back(values, t, 4) - A * back(values, t, 6)) * adjust
}

/// Runs the transform and returns every output series
pub fn hilbert_transform(price: &[f64]) -> HilbertOutput {
    let n = price.len();
    let mut out = HilbertOutput {
        dc_period: vec![f64::NAN; n],
        dc_phase: vec![f64::NAN; n],
        inphase: vec![f64::NAN; n],
        quadrature: vec![f64::NAN; n],
        sine: vec![f64::NAN; n],
        lead_sine: vec![f64::NAN; n],
        trendline: vec![f64::NAN; n],
        trend_mode: vec![f64::NAN; n],
    };
    if n == 0 {
        return out;
    }

    let mut smooth = vec![0.0; n];
    let mut detrender = vec![0.0; n];
    let mut q1 = vec![0.0; n];
    let mut i1 = vec![0.0; n];

    let (mut prev_i2, mut prev_q2) = (0.0, 0.0);
    let (mut re, mut im) = (0.0, 0.0);
    let mut period = 0.0;
    let mut smooth_period = 0.0;
    let mut dc_phase = 0.0;
    let mut i_trend = [0.0; 3];
    let (mut prev_sine, mut prev_lead_sine) = (0.0, 0.0);
    let mut prev_dc_phase = 0.0;
    let mut days_in_trend = 0usize;

    for t in 0..n {
        // 4-bar WMA of price; the head repeats the first price
        let p = |k: usize| price[t.saturating_sub(k)];
        smooth[t] = (4.0 * p(0) + 3.0 * p(1) + 2.0 * p(2) + p(3)) / 10.0;

        let adjust = 0.075 * period + 0.54;
        detrender[t] = hilbert(&smooth, t, adjust);
        q1[t] = hilbert(&detrender, t, adjust);
        i1[t] = back(&detrender, t, 3);
        let j_i = hilbert(&i1, t, adjust);
        let j_q = hilbert(&q1, t, adjust);

        let i2 = 0.2 * (i1[t] - j_q) + 0.8 * prev_i2;
        let q2 = 0.2 * (q1[t] + j_i) + 0.8 * prev_q2;

        re = 0.2 * (i2 * prev_i2 + q2 * prev_q2) + 0.8 * re;
        im = 0.2 * (i2 * prev_q2 - q2 * prev_i2) + 0.8 * im;
        prev_i2 = i2;
        prev_q2 = q2;

        let previous_period = period;
        if im != 0.0 && re != 0.0 {
            period = 360.0 / (im / re).atan().to_degrees();
        }
        period = period
            .min(1.5 * previous_period)
            .max(0.67 * previous_period)
            .clamp(6.0, 50.0);
        period = 0.2 * period + 0.8 * previous_period;
        smooth_period = 0.33 * period + 0.67 * smooth_period;

        // dominant cycle phase from a DFT over one smoothed period
        let dc_len = ((smooth_period + 0.5) as usize).max(1);
        let (mut real, mut imag) = (0.0, 0.0);
        for k in 0..dc_len {
            let angle = k as f64 * 2.0 * PI / dc_len as f64;
            let value = back(&smooth, t, k);
            real += angle.sin() * value;
            imag += angle.cos() * value;
        }
        if imag.abs() > 0.0 {
            dc_phase = (real / imag).atan().to_degrees();
        } else if real < 0.0 {
            dc_phase -= 90.0;
        } else if real > 0.0 {
            dc_phase += 90.0;
        }
        dc_phase += 90.0;
        dc_phase += 360.0 / smooth_period;
        if imag < 0.0 {
            dc_phase += 180.0;
        }
        if dc_phase > 315.0 {
            dc_phase -= 360.0;
        }
        let sine = dc_phase.to_radians().sin();
        let lead_sine = (dc_phase + 45.0).to_radians().sin();

        // instantaneous trendline: mean price over the cycle, then smoothed
        let window = dc_len.min(t + 1);
        let mean = price[t + 1 - window..=t].iter().sum::<f64>() / window as f64;
        let trendline = (4.0 * mean + 3.0 * i_trend[0] + 2.0 * i_trend[1] + i_trend[2]) / 10.0;
        i_trend = [mean, i_trend[0], i_trend[1]];

        let mut trend = 1.0;
        let crossed = (sine > lead_sine && prev_sine <= prev_lead_sine)
            || (sine < lead_sine && prev_sine >= prev_lead_sine);
        if crossed {
            days_in_trend = 0;
            trend = 0.0;
        }
        days_in_trend += 1;
        if (days_in_trend as f64) < 0.5 * smooth_period {
            trend = 0.0;
        }
        let phase_delta = dc_phase - prev_dc_phase;
        if smooth_period != 0.0
            && phase_delta > 0.67 * 360.0 / smooth_period
            && phase_delta < 1.5 * 360.0 / smooth_period
        {
            trend = 0.0;
        }
        if trendline != 0.0 && ((smooth[t] - trendline) / trendline).abs() >= 0.015 {
            trend = 1.0;
        }
        prev_sine = sine;
        prev_lead_sine = lead_sine;
        prev_dc_phase = dc_phase;

        out.dc_period[t] = smooth_period;
        out.dc_phase[t] = dc_phase;
        out.inphase[t] = i1[t];
        out.quadrature[t] = q1[t];
        out.sine[t] = sine;
        out.lead_sine[t] = lead_sine;
        out.trendline[t] = trendline;
        out.trend_mode[t] = trend;
    }

    HilbertOutput {
        dc_period: mask_warmup(out.dc_period, PERIOD_LOOKBACK),
        dc_phase: mask_warmup(out.dc_phase, PHASE_LOOKBACK),
        inphase: mask_warmup(out.inphase, PERIOD_LOOKBACK),
        quadrature: mask_warmup(out.quadrature, PERIOD_LOOKBACK),
        sine: mask_warmup(out.sine, PHASE_LOOKBACK),
        lead_sine: mask_warmup(out.lead_sine, PHASE_LOOKBACK),
        trendline: mask_warmup(out.trendline, PHASE_LOOKBACK),
        trend_mode: mask_warmup(out.trend_mode, PHASE_LOOKBACK),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine_wave(n: usize, cycle: f64) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + 5.0 * (2.0 * PI * i as f64 / cycle).sin())
            .collect()
    }

    #[test]
    fn test_warmup_lengths() {
        let out = hilbert_transform(&sine_wave(200, 20.0));
        assert!(out.dc_period[31].is_nan());
        assert!(out.dc_period[32].is_finite());
        assert!(out.inphase[32].is_finite());
        assert!(out.sine[62].is_nan());
        assert!(out.sine[63].is_finite());
        assert!(out.trend_mode[63].is_finite());
    }

    #[test]
    fn test_period_tracks_cycle_bounds() {
        let out = hilbert_transform(&sine_wave(400, 20.0));
        for v in out.dc_period.iter().skip(32) {
            assert!(*v > 0.0 && *v <= 50.0, "period out of range: {}", v);
        }
        let tail = &out.dc_period[300..];
        let mean = tail.iter().sum::<f64>() / tail.len() as f64;
        assert!(mean > 10.0 && mean < 35.0, "dominant period {}", mean);
    }

    #[test]
    fn test_sine_is_bounded_and_trendline_near_mean() {
        let out = hilbert_transform(&sine_wave(300, 25.0));
        for t in 63..300 {
            assert!(out.sine[t].abs() <= 1.0);
            assert!(out.trend_mode[t] == 0.0 || out.trend_mode[t] == 1.0);
            assert!((out.trendline[t] - 100.0).abs() < 5.0);
        }
    }
}
