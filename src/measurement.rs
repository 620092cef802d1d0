//! Measurement functions of the meter and the pair of quantities each one returns.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::{Error, Result};

/// One of the `FUNC:IMP` codes accepted by the meter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasurementType {
	CPD,
	CPQ,
	CPG,
	CPRP,
	CSD,
	CSQ,
	CSRS,
	LPD,
	LPQ,
	LPG,
	LPRP,
	LSD,
	LSQ,
	LSRS,
	RX,
	ZTD,
	ZTR,
	GB,
	YTD,
	YTR,
}

use MeasurementType::*;

// Capability table: variant, instrument code, primary label, secondary label
static CAPABILITIES: [(MeasurementType, &str, &str, &str); 20] = [
	(CPD,  "CPD",  "Cp [F]",   "Dissip. [-]"),
	(CPQ,  "CPQ",  "Cp [F]",   "Quality [-]"),
	(CPG,  "CPG",  "Cp [F]",   "Cond. [S]"),
	(CPRP, "CPRP", "Cp [F]",   "Resis. [Ohm]"),
	(CSD,  "CSD",  "Cs [F]",   "Dissip. [-]"),
	(CSQ,  "CSQ",  "Cs [F]",   "Quality [-]"),
	(CSRS, "CSRS", "Cs [F]",   "Resis. [Ohm]"),
	(LPD,  "LPD",  "Lp [H]",   "Dissip. [-]"),
	(LPQ,  "LPQ",  "Lp [H]",   "Quality [-]"),
	(LPG,  "LPG",  "Lp [H]",   "Cond. [S]"),
	(LPRP, "LPRP", "Lp [H]",   "Resis. [Ohm]"),
	(LSD,  "LSD",  "Ls [H]",   "Dissip. [-]"),
	(LSQ,  "LSQ",  "Ls [H]",   "Quality [-]"),
	(LSRS, "LSRS", "Ls [H]",   "Resis. [Ohm]"),
	(RX,   "RX",   "R [Ohm]",  "X [Ohm]"),
	(ZTD,  "ZTD",  "Z [Ohm]",  "Theta [Deg]"),
	(ZTR,  "ZTR",  "Z [Ohm]",  "Theta [Rad]"),
	(GB,   "GB",   "G [S]",    "B [S]"),
	(YTD,  "YTD",  "Y [S]",    "Theta [Deg]"),
	(YTR,  "YTR",  "Y [S]",    "Theta [Rad]"),
];

impl MeasurementType {

	pub const ALL: [MeasurementType; 20] = [
		CPD, CPQ, CPG, CPRP, CSD, CSQ, CSRS,
		LPD, LPQ, LPG, LPRP, LSD, LSQ, LSRS,
		RX, ZTD, ZTR, GB, YTD, YTR,
	];

	fn entry(self) -> &'static (MeasurementType, &'static str, &'static str, &'static str) {
		// Table order matches declaration order
		&CAPABILITIES[self as usize]
	}

	/// Code as the instrument spells it.
	pub fn code(self) -> &'static str { self.entry().1 }

	pub fn labels(self) -> (&'static str, &'static str) {
		let e = self.entry();
		(e.2, e.3)
	}

	/// Case-insensitive lookup of a code.
	pub fn from_code(code: &str) -> Option<MeasurementType> {
		let code = code.trim();
		CAPABILITIES.iter()
			.find(|(_, c, _, _)| c.eq_ignore_ascii_case(code))
			.map(|(m, _, _, _)| *m)
	}

}

/// Column labels for a measurement code that has not been validated yet.
pub fn labels_for(code: &str) -> Result<(&'static str, &'static str)> {
	MeasurementType::from_code(code)
		.map(MeasurementType::labels)
		.ok_or_else(|| Error::UnknownMeasurementType(code.to_owned()))
}

impl FromStr for MeasurementType {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		MeasurementType::from_code(s).ok_or_else(|| Error::UnknownMeasurementType(s.to_owned()))
	}
}

impl fmt::Display for MeasurementType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.code()) }
}

impl Serialize for MeasurementType {
	fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		serializer.serialize_str(self.code())
	}
}
