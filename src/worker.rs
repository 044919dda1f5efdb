//! The worker driver: a pure function from `(photon_times, tag)` to
//! `(Features, tag, optional Waveform, Counters)`, composing the event
//! generator, waveform synthesizer and feature extractor in sequence. This
//! is the function the orchestrator (and, ultimately, the CLI) calls once
//! per input record.

use crate::config::Config;
use crate::event;
use crate::features::{self, Features};
use crate::pulse::PulseShape;
use crate::rng::Rng;
use crate::waveform::{self, Waveform};

pub use event::Counters;

/// Runs one event through the full pipeline. `tag` is an opaque payload (an
/// event id, fiber geometry, anything the caller needs back) passed through
/// unchanged. `want_waveform` controls whether the sampled trace is returned
/// alongside the features; `debug` forces feature computation even below
/// threshold and widens per-event logging.
pub fn drive<T>(
    config: &Config,
    shape: &PulseShape,
    rng: &mut Rng,
    photon_times: &[f64],
    tag: T,
    want_waveform: bool,
    debug: bool,
) -> (Features, T, Option<Waveform>, Counters) {
    let (avalanches, counters) = event::generate(config, rng, photon_times);

    let signal = waveform::synthesize(
        config,
        shape,
        rng,
        &avalanches.times,
        &avalanches.amplitudes,
    );

    let extracted = features::extract(config, &signal, debug);

    if log::log_enabled!(log::Level::Debug) {
        log::debug!(
            "event: n_pe={} n_dcr={} n_xt={} n_ap={} peak={:.3}",
            counters.n_pe_input,
            counters.n_dcr,
            counters.n_xt,
            counters.n_ap,
            extracted.peak
        );
    }

    let out_waveform = if want_waveform { Some(signal) } else { None };

    (extracted, tag, out_waveform, counters)
}
