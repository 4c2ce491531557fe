use std::fmt::Display;
use std::path::Path;
use std::process;

use clap::Parser;
use gmd_cli::Commands;
use gmd_cli::GmdCli;
use gmd_core::GmdConfig;
use gmd_core::GmdError;
use gmd_core::OutputType;
use gmd_core::ProcessOptions;
use gmd_core::Processor;
use gmd_core::RunSummary;
use gmd_core::collect_files;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

/// Styles for the lines gmd prints itself. Plain text when color is off.
#[derive(Clone, Copy)]
struct Palette {
	color: bool,
}

impl Palette {
	fn failure(self, text: &str) -> String {
		if self.color { text.red().to_string() } else { text.to_string() }
	}

	fn success(self, text: &str) -> String {
		if self.color { text.green().to_string() } else { text.to_string() }
	}

	fn emphasis(self, text: impl Display) -> String {
		if self.color { text.bold().to_string() } else { text.to_string() }
	}
}

fn main() {
	let args = match GmdCli::try_parse() {
		Ok(args) => args,
		Err(e) => {
			let _ = e.print();
			process::exit(i32::from(e.use_stderr()));
		}
	};

	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	let palette = Palette { color: use_color };

	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_logging(args.verbose, use_color);

	let result = match args.command {
		Some(Commands::Process {
			source,
			target,
			output_type,
			jobs,
		}) => run_process(&source, &target, &output_type, jobs, palette),
		None => {
			eprintln!("No subcommand specified. Run `gmd --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		match e.downcast::<GmdError>() {
			Ok(gmd_err) => {
				let report: miette::Report = (*gmd_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", palette.failure("error:"));
			}
		}
		process::exit(2);
	}
}

/// `RUST_LOG` wins; otherwise `info`, or `debug` with `--verbose`.
fn init_logging(verbose: bool, use_color: bool) {
	let default_level = if verbose { "debug" } else { "info" };
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.try_init();
}

fn run_process(
	source: &Path,
	target: &Path,
	output_type: &str,
	jobs: Option<usize>,
	palette: Palette,
) -> Result<(), Box<dyn std::error::Error>> {
	let output_type: OutputType = output_type.parse()?;

	if !source.exists() {
		tracing::warn!(
			source = %source.display(),
			"source directory does not exist, nothing to convert"
		);
		return Ok(());
	}
	if !source.is_dir() {
		return Err(format!("source `{}` is not a directory", source.display()).into());
	}

	let mut options = GmdConfig::load(source)?
		.map(ProcessOptions::from)
		.unwrap_or_default();
	if jobs.is_some() {
		options.jobs = jobs;
	}

	let files = collect_files(source, &options.exclude)?;
	if files.is_empty() {
		tracing::warn!(
			source = %source.display(),
			"no .gmd documents found, nothing to convert"
		);
		return Ok(());
	}

	let summary = Processor::new(options).process_files(source, &files, target, output_type)?;
	print_summary(&summary, target, palette);
	summary.into_result()?;

	Ok(())
}

fn print_summary(summary: &RunSummary, target: &Path, palette: Palette) {
	for report in summary.failed() {
		let stage = report
			.failed_stage
			.map_or_else(String::new, |stage| format!(" during {stage:?}").to_lowercase());
		let reason = report
			.error
			.as_ref()
			.map_or_else(String::new, ToString::to_string);
		eprintln!(
			"{} {}{stage}: {reason}",
			palette.failure("failed"),
			report.source.display()
		);
	}

	let written = summary.written().count();
	println!(
		"{} {written} of {} document(s) to {} in {}",
		palette.success("Converted"),
		summary.documents.len(),
		palette.emphasis(summary.output_type),
		target.display()
	);
}
