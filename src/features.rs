//! Feature extraction: scans the configured integration window of a waveform
//! for peak, integral and timing statistics above a threshold.

use crate::config::Config;
use crate::waveform::Waveform;

/// Below this, a waveform's integration window is treated as "nothing
/// happened" and every feature is reported as `-1`, per the design notes.
pub const NO_SIGNAL_SENTINEL: f64 = -1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Features {
    pub peak: f64,
    pub integral: f64,
    pub toa: f64,
    pub tot: f64,
    pub top: f64,
}

impl Features {
    fn no_signal() -> Self {
        Features {
            peak: NO_SIGNAL_SENTINEL,
            integral: NO_SIGNAL_SENTINEL,
            toa: NO_SIGNAL_SENTINEL,
            tot: NO_SIGNAL_SENTINEL,
            top: NO_SIGNAL_SENTINEL,
        }
    }
}

/// Extracts `Features` from `waveform[intstart .. intstart + intgate]`. If no
/// sample in that window exceeds `threshold`, all five fields are `-1`,
/// unless `debug` forces the computation regardless.
pub fn extract(config: &Config, waveform: &Waveform, debug: bool) -> Features {
    let start = config.intstart_samples;
    let end = (start + config.intgate_samples).min(waveform.len());
    if start >= end {
        return Features::no_signal();
    }
    let window = &waveform[start..end];
    let threshold = config.raw.threshold;
    let sampling = config.raw.sampling_ns;

    let (peak, peak_idx) = argmax(window);

    if peak <= threshold && !debug {
        return Features::no_signal();
    }

    let integral = window.iter().sum::<f64>() * sampling;
    let toa_idx = window.iter().position(|&s| s > threshold);
    let tot_count = window.iter().filter(|&&s| s > threshold).count();

    Features {
        peak,
        integral,
        toa: toa_idx.map(|i| i as f64 * sampling).unwrap_or(NO_SIGNAL_SENTINEL),
        tot: tot_count as f64 * sampling,
        top: peak_idx as f64 * sampling,
    }
}

fn argmax(window: &[f64]) -> (f64, usize) {
    let mut best = (f64::MIN, 0);
    for (i, &v) in window.iter().enumerate() {
        if v > best.0 {
            best = (v, i);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawConfig;

    fn cfg() -> Config {
        Config::build(RawConfig {
            siglen_ns: 100.0,
            sampling_ns: 1.0,
            intstart_ns: 0.0,
            intgate_ns: 100.0,
            threshold: 1.5,
            ..RawConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn below_threshold_waveform_yields_all_sentinels() {
        let config = cfg();
        let waveform: Waveform = vec![0.1; 100];
        let features = extract(&config, &waveform, false);
        assert_eq!(features.peak, -1.0);
        assert_eq!(features.integral, -1.0);
        assert_eq!(features.toa, -1.0);
        assert_eq!(features.tot, -1.0);
        assert_eq!(features.top, -1.0);
    }

    #[test]
    fn debug_forces_computation_below_threshold() {
        let config = cfg();
        let waveform: Waveform = vec![0.1; 100];
        let features = extract(&config, &waveform, true);
        assert_eq!(features.peak, 0.1);
        assert!((features.integral - 10.0).abs() < 1e-9);
    }

    #[test]
    fn single_spike_reports_consistent_timing() {
        let config = cfg();
        let mut waveform: Waveform = vec![0.0; 100];
        waveform[30] = 2.0;
        let features = extract(&config, &waveform, false);
        assert_eq!(features.peak, 2.0);
        assert_eq!(features.toa, 30.0);
        assert_eq!(features.top, 30.0);
        assert_eq!(features.tot, 1.0);
    }

    #[test]
    fn extraction_is_idempotent() {
        let config = cfg();
        let mut waveform: Waveform = vec![0.0; 100];
        waveform[10] = 3.0;
        waveform[11] = 2.5;
        let a = extract(&config, &waveform, false);
        let b = extract(&config, &waveform, false);
        assert_eq!(a, b);
    }
}
