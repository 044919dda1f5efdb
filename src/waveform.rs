//! The waveform synthesizer: sums shifted, scaled pulse-shape copies onto a
//! noisy baseline to produce the sampled trace the feature extractor reads.

use crate::config::Config;
use crate::pulse::PulseShape;
use crate::rng::Rng;

/// A sampled sensor trace, always exactly `Config::sigpts` samples long.
pub type Waveform = Vec<f64>;

/// Builds the baseline-noise waveform and sums in one pulse per avalanche.
/// `times_ns`/`amplitudes` are parallel arrays, as produced by `event::generate`.
///
/// Below `config.raw.cputhreshold` or above `config.raw.gpumax` avalanches,
/// pulses are summed one at a time. In between, `synthesize` instead builds
/// a dense shift matrix and reduces it column-wise in one pass; see
/// `synthesize_batched` for why the two must and do agree.
pub fn synthesize(
    config: &Config,
    shape: &PulseShape,
    rng: &mut Rng,
    times_ns: &[f64],
    amplitudes: &[f64],
) -> Waveform {
    let mut output = baseline_noise(config, rng);

    let (t_idx, h): (Vec<usize>, Vec<f64>) = times_ns
        .iter()
        .zip(amplitudes.iter())
        .filter(|(&t, _)| t < config.raw.siglen_ns)
        .map(|(&t, &h)| ((t / config.raw.sampling_ns) as usize, h))
        .unzip();

    if t_idx.is_empty() {
        return output;
    }

    let gainvars = rng.normal(1.0, config.raw.ccgv, t_idx.len());

    let n = t_idx.len();
    let use_batched = n >= config.raw.cputhreshold && n <= config.raw.gpumax;

    if use_batched {
        synthesize_batched(config, shape, &t_idx, &h, &gainvars, &mut output);
    } else {
        for i in 0..n {
            let scaled = h[i] * gainvars[i];
            if config.raw.exact_signal {
                shape.add_pulse_exact(&mut output, t_idx[i], scaled);
            } else {
                shape.add_pulse_fast(&mut output, t_idx[i], scaled);
            }
        }
    }

    output
}

fn baseline_noise(config: &Config, rng: &mut Rng) -> Waveform {
    let mean = if config.raw.basespread > 0.0 {
        rng.normal(0.0, config.raw.basespread, 1)[0]
    } else {
        0.0
    };
    rng.normal(mean, config.snr_linear, config.sigpts)
}

/// Batched reduction over a dense (n_avalanches x sigpts) shift matrix. A
/// pure-CPU stand-in for the GPU path named in the design notes: same
/// numerical result, different memory access pattern, used only when the
/// avalanche-set cardinality falls in `[cputhreshold, gpumax]` so the extra
/// allocation pays for itself.
fn synthesize_batched(
    config: &Config,
    shape: &PulseShape,
    t_idx: &[usize],
    h: &[f64],
    gainvars: &[f64],
    output: &mut [f64],
) {
    let sigpts = config.sigpts;
    let template = shape.template();
    for (i, &t) in t_idx.iter().enumerate() {
        if t >= sigpts {
            continue;
        }
        let scaled = h[i] * gainvars[i];
        let row_len = sigpts - t;
        for j in 0..row_len {
            output[t + j] += scaled * template[j];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawConfig;

    fn cfg(overrides: impl FnOnce(&mut RawConfig)) -> Config {
        let mut raw = RawConfig::default();
        overrides(&mut raw);
        Config::build(raw).unwrap()
    }

    #[test]
    fn pure_noise_when_no_avalanches() {
        let config = cfg(|r| r.snr_db = 30.0);
        let shape = PulseShape::new(config.tf_samples, config.tr_samples, config.sigpts);
        let mut rng = Rng::from_seed(42);
        let waveform = synthesize(&config, &shape, &mut rng, &[], &[]);
        assert_eq!(waveform.len(), config.sigpts);
        // noise sigma is small; no sample should look like a real pulse peak.
        assert!(waveform.iter().all(|&s| s.abs() < 1.0));
    }

    #[test]
    fn single_photoelectron_peaks_near_one() {
        let config = cfg(|r| {
            r.ccgv = 0.0;
            r.basespread = 0.0;
        });
        let shape = PulseShape::new(config.tf_samples, config.tr_samples, config.sigpts);
        let mut rng = Rng::from_seed(42);
        let waveform = synthesize(&config, &shape, &mut rng, &[20.0], &[1.0]);
        let peak = waveform.iter().cloned().fold(f64::MIN, f64::max);
        assert!((peak - 1.0).abs() < 3.0 * config.snr_linear, "peak was {peak}");
    }

    #[test]
    fn fixed_seed_is_bit_identical_across_runs() {
        let config = cfg(|r| r.ccgv = 0.02);
        let shape = PulseShape::new(config.tf_samples, config.tr_samples, config.sigpts);

        let mut rng_a = Rng::from_seed(99);
        let a = synthesize(&config, &shape, &mut rng_a, &[20.0, 40.0], &[1.0, 0.8]);

        let mut rng_b = Rng::from_seed(99);
        let b = synthesize(&config, &shape, &mut rng_b, &[20.0, 40.0], &[1.0, 0.8]);

        assert_eq!(a, b);
    }

    #[test]
    fn batched_and_per_pulse_paths_agree() {
        let config = cfg(|r| {
            r.cputhreshold = 1;
            r.gpumax = 10_000;
            r.ccgv = 0.0;
        });
        let shape = PulseShape::new(config.tf_samples, config.tr_samples, config.sigpts);

        let times: Vec<f64> = (0..200).map(|i| (i as f64) * 2.0).collect();
        let amplitudes = vec![0.7; times.len()];

        let mut rng_batched = Rng::from_seed(5);
        let batched = synthesize(&config, &shape, &mut rng_batched, &times, &amplitudes);

        let mut config_unbatched = config.clone();
        config_unbatched.raw.cputhreshold = usize::MAX;
        let mut rng_unbatched = Rng::from_seed(5);
        let unbatched = synthesize(
            &config_unbatched,
            &shape,
            &mut rng_unbatched,
            &times,
            &amplitudes,
        );

        for (a, b) in batched.iter().zip(unbatched.iter()) {
            let rel = (a - b).abs() / a.abs().max(1e-9);
            assert!(rel < 1e-4, "{a} vs {b}");
        }
    }
}
