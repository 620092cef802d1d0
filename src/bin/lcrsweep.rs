use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use log::{warn, LevelFilter};

use lcrsweep::config::{Configuration, Defaults};
use lcrsweep::devices::bk894::BK894;
use lcrsweep::devices::mock::MockMeter;
use lcrsweep::report;
use lcrsweep::sweep::{AxisKind, SweepRequest, BATCH_RUNS};
use lcrsweep::transport::{self, Transport};

const DEFAULT_CONFIG: &str = "lcrsweep.cfg";
const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Parser)]
#[command(name = "lcrsweep", version, about = "Frequency and amplitude sweeps on a BK Precision 894 LCR meter")]
struct Cli {
	/// Log every command sent to the meter
	#[arg(short, long, global = true)]
	verbose: bool,

	/// Instrument timeout in milliseconds
	#[arg(long, global = true, default_value_t = transport::DEFAULT_TIMEOUT.as_millis() as u64,
		value_parser = clap::value_parser!(u64).range(1..))]
	timeout_ms: u64,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	/// Generate a new configuration file
	Cfg {
		/// File to store the configuration in
		#[arg(default_value = DEFAULT_CONFIG)]
		filename: PathBuf,

		/// Instrument resource, e.g. TCPIP0::192.168.1.20::inst0::INSTR; prompts from a network scan if omitted
		#[arg(long)]
		device: Option<String>,
	},
	/// Perform a frequency sweep at the configured AC voltage
	Fsweep(SweepArgs),
	/// Perform an amplitude sweep at the configured frequency
	Asweep(SweepArgs),
}

#[derive(Args)]
struct SweepArgs {
	/// Perform a batch run of 5 sweeps and save them to file
	#[arg(short, long, requires = "filename")]
	batch: bool,

	/// Configuration file to use
	#[arg(long, default_value = DEFAULT_CONFIG)]
	config: PathBuf,

	/// Sweep a simulated meter instead of connecting to the configured device
	#[arg(long)]
	simulate: bool,

	/// Also print each sweep as JSON
	#[arg(long)]
	json: bool,

	/// File to append measured data to; nothing is saved if omitted
	filename: Option<PathBuf>,
}

fn select_device() -> anyhow::Result<Option<String>> {
	let devices = transport::discover(DISCOVERY_TIMEOUT).context("Unable to scan the network for instruments")?;
	if devices.is_empty() {
		bail!("No instruments found; pass one with --device");
	}

	println!("\nConnected devices");
	println!("{}", "-".repeat(52));
	for (i, device) in devices.iter().enumerate() {
		println!("{}: {}", i, device);
	}
	println!("q: Quit");
	print!("\nSelect device by number: ");
	io::stdout().flush()?;

	let mut choice = String::new();
	io::stdin().lock().read_line(&mut choice)?;
	let choice = choice.trim();
	if choice.eq_ignore_ascii_case("q") {
		return Ok(None);
	}

	let idx: usize = choice.parse().with_context(|| format!("{:?} is not a device number", choice))?;
	match devices.get(idx) {
		Some(device) => Ok(Some(device.clone())),
		None => bail!("No device number {}", idx),
	}
}

fn write_config(filename: &Path, device: Option<String>) -> anyhow::Result<()> {
	let device = match device {
		Some(d) => d,
		None => match select_device()? {
			Some(d) => d,
			None => return Ok(()),
		},
	};

	Configuration::fresh(&device, &Defaults::default()).save(filename)?;
	println!("\nConfiguration file saved as: {}", filename.display());
	Ok(())
}

fn build_request(kind: AxisKind, cfg: &Configuration) -> SweepRequest {
	match kind {
		AxisKind::Frequency => {
			if cfg.voltages.len() > 1 {
				warn!("{} voltages configured, sweeping at the first", cfg.voltages.len());
				println!("\nList of voltages supplied, will use first in list.");
			}
			SweepRequest::frequency(cfg.frequencies.clone(), cfg.voltages[0], &cfg.measurement)
		},
		AxisKind::Amplitude => {
			if cfg.frequencies.len() > 1 {
				warn!("{} frequencies configured, sweeping at the first", cfg.frequencies.len());
				println!("\nList of frequencies supplied, will use first in list.");
			}
			SweepRequest::amplitude(cfg.voltages.clone(), cfg.frequencies[0], &cfg.measurement)
		},
	}
}

fn run<T: Transport>(meter: &mut BK894<T>, request: &SweepRequest, args: &SweepArgs) -> anyhow::Result<()> {
	println!();
	for line in meter.identity.banner() {
		println!("{}", line);
	}

	if let Some(filename) = &args.filename {
		println!("\nCreating or appending to {}", filename.display());
	}

	let runs = if args.batch { BATCH_RUNS } else { 1 };
	meter.sweep_batch(request, runs, |_, result| -> anyhow::Result<()> {
		println!();
		for line in report::render_table(result) {
			println!("{}", line);
		}
		if args.json {
			println!("{}", serde_json::to_string_pretty(result)?);
		}
		if let Some(filename) = &args.filename {
			report::append_log(result, filename)?;
		}
		Ok(())
	})?;
	Ok(())
}

fn sweep(kind: AxisKind, args: &SweepArgs, timeout: Duration) -> anyhow::Result<()> {
	let cfg = Configuration::load(&args.config)
		.with_context(|| format!("Could not read {}; generate one with `lcrsweep cfg`", args.config.display()))?;
	let request = build_request(kind, &cfg);

	// Reject bad parameters before touching the instrument
	request.validate()?;

	if args.simulate {
		let mut meter = BK894::new(MockMeter::default())?;
		return run(&mut meter, &request, args);
	}

	let mut meter = BK894::connect(&cfg.device, timeout).with_context(|| format!(
		"Could not connect to {}. Make sure the meter's LAN interface is enabled and reachable, \
		 or generate a new configuration file.", cfg.device))?;
	run(&mut meter, &request, args)
}

pub fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	env_logger::Builder::new()
		.filter_level(if cli.verbose { LevelFilter::Debug } else { LevelFilter::Warn })
		.parse_default_env()
		.init();

	let timeout = Duration::from_millis(cli.timeout_ms);
	match &cli.command {
		Command::Cfg{ filename, device } => write_config(filename, device.clone()),
		Command::Fsweep(args) => sweep(AxisKind::Frequency, args, timeout),
		Command::Asweep(args) => sweep(AxisKind::Amplitude, args, timeout),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use clap::CommandFactory;

	#[test]
	fn cli_definition_is_consistent() {
		Cli::command().debug_assert();
	}

	#[test]
	fn zero_timeout_is_rejected() {
		assert!(Cli::try_parse_from(["lcrsweep", "--timeout-ms", "0", "fsweep"]).is_err());

		let cli = Cli::try_parse_from(["lcrsweep", "--timeout-ms", "250", "fsweep"]).unwrap();
		assert_eq!(cli.timeout_ms, 250);
		let cli = Cli::try_parse_from(["lcrsweep", "asweep"]).unwrap();
		assert_eq!(cli.timeout_ms, transport::DEFAULT_TIMEOUT.as_millis() as u64);
	}

	#[test]
	fn batch_needs_a_log_file() {
		assert!(Cli::try_parse_from(["lcrsweep", "fsweep", "-b"]).is_err());

		let cli = Cli::try_parse_from(["lcrsweep", "fsweep", "-b", "out.txt"]).unwrap();
		match cli.command {
			Command::Fsweep(args) => {
				assert!(args.batch);
				assert_eq!(args.filename, Some(PathBuf::from("out.txt")));
			},
			_ => panic!("expected fsweep"),
		}
	}
}
