//! Error type shared by the sweep engine, the configuration codec and the result logger.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Which pre-flight check rejected a sweep request.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterCheck {
	Frequency,
	Voltage,
	Measurement(String),
}

impl fmt::Display for ParameterCheck {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ParameterCheck::Frequency => write!(f, "requested frequencies may be out of range (1 Hz - 500 kHz)"),
			ParameterCheck::Voltage => write!(f, "requested voltages out of range (0 V < V <= 2 V)"),
			ParameterCheck::Measurement(code) => write!(f, "requested measurement '{}' is not available", code),
		}
	}
}

#[derive(Error, Debug)]
pub enum Error {
	#[error("Invalid sweep parameters: {0}")]
	InvalidSweepParameters(ParameterCheck),

	#[error("Unknown measurement type '{0}'")]
	UnknownMeasurementType(String),

	#[error("Malformed response {response:?}: {reason}")]
	MalformedResponse { response: String, reason: String },

	#[error("Communication failure: {0}")]
	CommunicationFailure(#[from] io::Error),

	#[error("Incomplete configuration, missing: {}", .0.join(", "))]
	IncompleteConfiguration(Vec<&'static str>),

	#[error("Invalid value {value:?} for configuration key '{key}'")]
	InvalidConfigValue { key: &'static str, value: String },

	#[error("Unable to access {}: {source}", .path.display())]
	Io { path: PathBuf, source: io::Error },
}

impl Error {
	pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
		Error::Io { path: path.into(), source }
	}
}
