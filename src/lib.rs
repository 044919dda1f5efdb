// Copyright (c) 2024 pySiPM-rs contributors
//
// This program is free software: you can redistribute it and/or
// modify it under the terms of the GNU Affero General Public License
// as published by the Free Software Foundation, either version 3 of
// the License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public
// License along with this program.
// If not, see <https://www.gnu.org/licenses/>.

//! Monte Carlo simulator of Silicon Photomultiplier (SiPM) detector
//! response. Given per-channel photon arrival times, produces a digitized
//! waveform and a handful of extracted features (integral, peak, time of
//! arrival, time over threshold, time of peak), modelling dark-count noise,
//! optical crosstalk, afterpulsing, cell recovery, cell-to-cell gain
//! variation and electronics noise.
//!
//! The pipeline is strictly forward: `event::generate` turns photon times
//! into an `AvalancheSet`; `waveform::synthesize` turns that into a sampled
//! trace; `features::extract` turns the trace into a `Features` tuple.
//! `worker::drive` composes all three behind one pure function; `Orchestrator`
//! fans many such calls out across a worker pool.

pub mod config;
pub mod error;
pub mod event;
pub mod features;
pub mod io;
pub mod orchestrator;
pub mod pulse;
pub mod rng;
pub mod waveform;
pub mod worker;

pub use config::{Config, RawConfig};
pub use error::{ConfigError, InputError, OutputError};
pub use event::{AvalancheSet, Counters};
pub use features::Features;
pub use orchestrator::Orchestrator;
pub use pulse::PulseShape;
pub use rng::Rng;
pub use waveform::Waveform;
