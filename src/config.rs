//! The process-wide, immutable configuration snapshot.
//!
//! `RawConfig` holds every parameter in physical units as a user or settings
//! file would provide it. `Config::build` validates it once and folds in the
//! derived quantities (`sigpts`, `ncell`, …) that every other component reads
//! directly, the same separation the originating tool draws between its
//! argument parser and its "NOT EDITABLE VARIABLES" derivation block.

use crate::error::ConfigError;

/// User-facing configuration in physical units (ns, mm, um, Hz, dB, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct RawConfig {
    pub siglen_ns: f64,
    pub sampling_ns: f64,

    pub size_mm: f64,
    pub cellsize_um: f64,

    pub dcr_hz: f64,
    pub xt: f64,
    pub ap: f64,

    pub tfall_ns: f64,
    pub trise_ns: f64,
    pub cellrecovery_ns: f64,
    pub tauapfast_ns: f64,
    pub tauapslow_ns: f64,

    pub snr_db: f64,
    pub basespread: f64,
    pub ccgv: f64,

    pub intstart_ns: f64,
    pub intgate_ns: f64,
    pub threshold: f64,

    pub cputhreshold: usize,
    pub gpumax: usize,

    pub nodcr: bool,
    pub noxt: bool,
    pub noap: bool,
    /// Exact per-pulse evaluation instead of the shift-and-scale template (`--signal`).
    pub exact_signal: bool,
}

impl Default for RawConfig {
    /// Mirrors the defaults in the originating tool's settings module.
    fn default() -> Self {
        Self {
            siglen_ns: 500.0,
            sampling_ns: 1.0,

            size_mm: 1.0,
            cellsize_um: 10.0,

            dcr_hz: 200e3,
            xt: 0.02,
            ap: 0.01,

            tfall_ns: 50.0,
            trise_ns: 1.0,
            cellrecovery_ns: 30.0,
            tauapfast_ns: 15.0,
            tauapslow_ns: 85.0,

            snr_db: 30.0,
            basespread: 0.0,
            ccgv: 0.05,

            intstart_ns: 10.0,
            intgate_ns: 300.0,
            threshold: 1.5,

            cputhreshold: 100,
            gpumax: 2000,

            nodcr: false,
            noxt: false,
            noap: false,
            exact_signal: false,
        }
    }
}

/// Validated, immutable simulation parameters plus everything derived from
/// them. Cheap to `Clone`; safe to share across worker threads behind an
/// `Arc` or by value.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub raw: RawConfig,

    /// Waveform length in samples: floor(SIGLEN / SAMPLING).
    pub sigpts: usize,
    /// Cells per side of the square SiPM matrix.
    pub cellside: i64,
    /// Highest valid cell id (CELLSIDE^2 - 1).
    pub ncell: i64,

    /// TFALL expressed in samples.
    pub tf_samples: f64,
    /// TRISE expressed in samples.
    pub tr_samples: f64,

    /// Linear (amplitude-domain) noise sigma derived from `snr_db`.
    pub snr_linear: f64,

    /// Integration window start, in samples.
    pub intstart_samples: usize,
    /// Integration window length, in samples (clamped to fit inside sigpts).
    pub intgate_samples: usize,
}

const NEIGHBOUR_OFFSET_COUNT: usize = 8;

impl Config {
    /// Validates `raw` and derives the quantities every component needs.
    /// Equivalent to the originating tool's post-parse "NOT EDITABLE
    /// VARIABLES" block, but returning errors instead of asserting.
    pub fn build(raw: RawConfig) -> Result<Self, ConfigError> {
        if raw.sampling_ns <= 0.0 {
            return Err(ConfigError::NonPositiveSampling(raw.sampling_ns));
        }

        let sigpts_f = raw.siglen_ns / raw.sampling_ns;
        let sigpts = sigpts_f.floor() as i64;
        if sigpts <= 0 {
            return Err(ConfigError::NonPositiveSigpts(sigpts));
        }

        let cellside = (raw.size_mm * 1000.0 / raw.cellsize_um).floor() as i64;
        if cellside <= 0 {
            return Err(ConfigError::NonPositiveCellside(cellside));
        }
        let ncell = cellside * cellside - 1;

        if !raw.nodcr && raw.dcr_hz <= 0.0 {
            return Err(ConfigError::NonPositiveDcr);
        }

        if raw.tfall_ns <= 0.0 || raw.trise_ns <= 0.0 || raw.tfall_ns == raw.trise_ns {
            return Err(ConfigError::InvalidPulseConstants {
                tfall: raw.tfall_ns,
                trise: raw.trise_ns,
            });
        }

        let tf_samples = raw.tfall_ns / raw.sampling_ns;
        let tr_samples = raw.trise_ns / raw.sampling_ns;
        let snr_linear = 10f64.powf(-raw.snr_db / 20.0);

        let intstart_samples = (raw.intstart_ns / raw.sampling_ns) as usize;
        let mut intgate_ns = raw.intgate_ns;
        if raw.intstart_ns + intgate_ns > raw.siglen_ns {
            log::warn!(
                "integration gate of {intgate_ns:.0} ns exceeds signal length of {:.0} ns, clamping",
                raw.siglen_ns
            );
            intgate_ns = raw.siglen_ns - raw.intstart_ns;
        }
        let intgate_samples = (intgate_ns / raw.sampling_ns) as usize;

        Ok(Config {
            raw,
            sigpts: sigpts as usize,
            cellside,
            ncell,
            tf_samples,
            tr_samples,
            snr_linear,
            intstart_samples,
            intgate_samples,
        })
    }

    /// The eight 2-D neighbour offsets on the cell-id grid: ±1, ±CELLSIDE,
    /// and the four diagonals. `cell_id + offset` is not itself clamped;
    /// callers apply `Config::clamp_cell_id`.
    pub fn neighbour_offsets(&self) -> [i64; NEIGHBOUR_OFFSET_COUNT] {
        let side = self.cellside;
        [1, -1, side, -side, 1 + side, 1 - side, -1 + side, -1 - side]
    }

    /// Clamps a candidate cell id into `[0, ncell]`. Crosstalk neighbours can
    /// legitimately fall off the grid near the SiPM border; policy (a) from
    /// the design notes accepts them clamped rather than discarding them.
    pub fn clamp_cell_id(&self, id: i64) -> i64 {
        id.clamp(0, self.ncell)
    }

    pub fn log_settings_banner(&self) {
        log::info!(
            "SiPM settings: sampling={} ns, sigpts={}, ncell={}, dcr={} Hz, xt={}, ap={}",
            self.raw.sampling_ns,
            self.sigpts,
            self.ncell,
            self.raw.dcr_hz,
            self.raw.xt,
            self.raw.ap,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_defaults_like_the_original_tool() {
        let cfg = Config::build(RawConfig::default()).unwrap();
        assert_eq!(cfg.sigpts, 500);
        assert_eq!(cfg.cellside, 100);
        assert_eq!(cfg.ncell, 100 * 100 - 1);
        assert_eq!(cfg.intstart_samples, 10);
        assert_eq!(cfg.intgate_samples, 300);
    }

    #[test]
    fn rejects_nonpositive_sigpts() {
        let raw = RawConfig {
            siglen_ns: 0.0,
            ..RawConfig::default()
        };
        assert_eq!(
            Config::build(raw).unwrap_err(),
            ConfigError::NonPositiveSigpts(0)
        );
    }

    #[test]
    fn rejects_nonpositive_cellside() {
        let raw = RawConfig {
            size_mm: 0.0,
            ..RawConfig::default()
        };
        assert!(matches!(
            Config::build(raw).unwrap_err(),
            ConfigError::NonPositiveCellside(_)
        ));
    }

    #[test]
    fn rejects_zero_dcr_when_dcr_enabled() {
        let raw = RawConfig {
            dcr_hz: 0.0,
            nodcr: false,
            ..RawConfig::default()
        };
        assert_eq!(Config::build(raw).unwrap_err(), ConfigError::NonPositiveDcr);
    }

    #[test]
    fn allows_zero_dcr_when_dcr_disabled() {
        let raw = RawConfig {
            dcr_hz: 0.0,
            nodcr: true,
            ..RawConfig::default()
        };
        assert!(Config::build(raw).is_ok());
    }

    #[test]
    fn clamps_oversized_integration_gate() {
        let raw = RawConfig {
            siglen_ns: 500.0,
            intstart_ns: 10.0,
            intgate_ns: 10_000.0,
            ..RawConfig::default()
        };
        let cfg = Config::build(raw).unwrap();
        assert_eq!(cfg.intgate_samples, 490);
    }

    #[test]
    fn clamp_cell_id_clips_into_range() {
        let cfg = Config::build(RawConfig::default()).unwrap();
        assert_eq!(cfg.clamp_cell_id(-5), 0);
        assert_eq!(cfg.clamp_cell_id(cfg.ncell + 50), cfg.ncell);
        assert_eq!(cfg.clamp_cell_id(42), 42);
    }
}
