
// External data representation, the serialization format underneath RPC
pub mod xdr;

// Remote procedure call client, just the parts VXI-11 needs
pub mod rpc;

// The VXI-11 core channel used to talk to LAN instruments
pub mod vxi11;

// Command/response link seen by the sweep engine, and its VXI-11 implementation
pub mod transport;

// Instrument drivers built on a transport
pub mod devices;

pub mod error;
pub mod measurement;
pub mod validate;
pub mod sweep;
pub mod report;
pub mod config;

pub mod utils;

pub use error::{Error, ParameterCheck, Result};
pub use measurement::MeasurementType;
pub use sweep::{run_batch, run_sweep, AxisKind, MeasurementSample, SweepAxis, SweepRequest, SweepResult};
pub use transport::Transport;
pub use config::{Configuration, Defaults};
