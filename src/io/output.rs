//! Output collaborator: a sink trait plus a small CSV-shaped demonstration
//! implementation. The columnar/HDF5 writers named in the external
//! interfaces are not implemented here, only this trait boundary.

use std::io::Write;

use crate::error::OutputError;
use crate::features::Features;
use crate::waveform::Waveform;

/// Geometry fields carried through from the input record, unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub event_id: i64,
    pub fiber_type_is_scintillating: bool,
    pub fiber_id: i64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A destination for extracted features (and, optionally, waveforms).
pub trait OutputSink {
    fn write_feature_row(&mut self, features: &Features, geom: &Geometry) -> Result<(), OutputError>;

    /// Default no-op: most sinks do not persist full waveforms.
    fn write_waveform(&mut self, _waveform: &Waveform) -> Result<(), OutputError> {
        Ok(())
    }
}

/// Writes a simple comma-delimited table: header row, then one row per
/// event with Integral, Peak, ToA, ToT, ToP, EventId, FiberType, FiberId, X, Y, Z.
pub struct CsvFeatureWriter<W: Write> {
    out: W,
    header_written: bool,
}

impl<W: Write> CsvFeatureWriter<W> {
    pub fn new(out: W) -> Self {
        CsvFeatureWriter {
            out,
            header_written: false,
        }
    }
}

impl<W: Write> OutputSink for CsvFeatureWriter<W> {
    fn write_feature_row(&mut self, features: &Features, geom: &Geometry) -> Result<(), OutputError> {
        if !self.header_written {
            writeln!(
                self.out,
                "Integral,Peak,ToA,ToT,ToP,EventId,FiberType,FiberId,X,Y,Z"
            )?;
            self.header_written = true;
        }
        writeln!(
            self.out,
            "{},{},{},{},{},{},{},{},{},{},{}",
            features.integral,
            features.peak,
            features.toa,
            features.tot,
            features.top,
            geom.event_id,
            if geom.fiber_type_is_scintillating { "Scin" } else { "Cher" },
            geom.fiber_id,
            geom.x,
            geom.y,
            geom.z,
        )?;
        Ok(())
    }
}
