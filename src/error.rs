//! Typed errors surfaced at the process/config boundary and at the I/O boundary.
//! Nothing in the hot simulation path (event generation, waveform synthesis,
//! feature extraction) can fail: see the module docs on `event`, `waveform`
//! and `features` for why.

use thiserror::Error;

/// Failures detected while validating a `RawConfig` into a `Config`.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("SIGPTS must be positive, got {0} (check SIGLEN/SAMPLING)")]
    NonPositiveSigpts(i64),

    #[error("CELLSIDE must be positive, got {0} (check SIZE/CELLSIZE)")]
    NonPositiveCellside(i64),

    #[error("DCR must be > 0 Hz when dark counts are enabled (nodcr=false)")]
    NonPositiveDcr,

    #[error("SAMPLING must be > 0 ns, got {0}")]
    NonPositiveSampling(f64),

    #[error("TFALL and TRISE must be positive and distinct, got TFALL={tfall} TRISE={trise}")]
    InvalidPulseConstants { tfall: f64, trise: f64 },
}

/// Failures while reading and parsing an input record.
#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("line {line}: expected at least 7 whitespace-separated fields, got {found}")]
    TooFewFields { line: usize, found: usize },

    #[error("line {line}: could not parse field {field:?} as a number")]
    BadNumber { line: usize, field: String },

    #[error("io error reading input: {0}")]
    Io(String),
}

/// Failures while writing a result row or waveform to a sink.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("io error writing output: {0}")]
    Io(#[from] std::io::Error),
}
