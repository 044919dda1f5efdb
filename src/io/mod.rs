//! Collaborator interfaces for reading photon-arrival records and writing
//! results. Input parsing and output writing are explicitly out of scope as
//! deep implementations (see the purpose/scope notes); what lives here is
//! the trait boundary plus one small concrete implementation on each side,
//! enough to exercise the pipeline end to end in tests and the CLI.

mod input;
mod output;

pub use input::{FiberRecord, LineRecordReader, PhotonSource};
pub use output::{CsvFeatureWriter, Geometry, OutputSink};
