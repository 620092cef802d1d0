
// Scientific notation with a signed, at least two digit exponent (1.234e+02), which is what
// spreadsheet and plotting tools expect from tab-delimited logs. Rust's own `{:e}` writes 1.234e2.

pub fn format_exp(value:f64, precision:usize) -> String {
	let raw = format!("{:.*e}", precision, value);
	match raw.split_once('e') {
		Some((mantissa, exponent)) => {
			let (sign, digits) = match exponent.strip_prefix('-') {
				Some(d) => ('-', d),
				None    => ('+', exponent),
			};
			format!("{}e{}{:0>2}", mantissa, sign, digits)
		},
		// inf and NaN have no exponent
		None => raw,
	}
}

// Voltages keep a decimal point even when whole (2.0 rather than 2), in commands and in logs alike
pub fn format_voltage(volts:f64) -> String {
	if volts.is_finite() && volts.fract() == 0.0 {
		format!("{:.1}", volts)
	} else {
		format!("{}", volts)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn matches_c_style_exponent() {
		assert_eq!(format_exp(123.4, 3), "1.234e+02");
		assert_eq!(format_exp(56.7, 8), "5.67000000e+01");
		assert_eq!(format_exp(-0.00045, 2), "-4.50e-04");
		assert_eq!(format_exp(1.5e-123, 1), "1.5e-123");
		assert_eq!(format_exp(0.0, 3), "0.000e+00");
	}

	#[test]
	fn non_finite_passes_through() {
		assert_eq!(format_exp(f64::INFINITY, 3), "inf");
		assert_eq!(format_exp(f64::NAN, 3), "NaN");
	}

	#[test]
	fn whole_voltages_keep_a_decimal() {
		assert_eq!(format_voltage(2.0), "2.0");
		assert_eq!(format_voltage(1.0), "1.0");
		assert_eq!(format_voltage(0.5), "0.5");
		assert_eq!(format_voltage(0.25), "0.25");
		assert_eq!(format_voltage(0.30000000000000004), "0.30000000000000004");
	}
}
