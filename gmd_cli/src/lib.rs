use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

/// Default directory scanned for `*.gmd` sources.
pub const DEFAULT_SOURCE: &str = "src/main/gmd";
/// Default directory artifacts are written to.
pub const DEFAULT_TARGET: &str = "target/gmd";

#[derive(Debug, Parser)]
#[command(
	author,
	version,
	about = "Convert trees of gmd documents into markdown, html or pdf.",
	long_about = "gmd converts a directory of gmd documents (markdown with embedded `${...}` \
	              expressions) into rendered markdown, standalone html or paginated pdf.\n\nEach \
	              document is evaluated, parsed and rendered on its own: a failing document is \
	              reported without stopping the others.\n\nQuick start:\n  gmd process          \
	              Convert src/main/gmd into target/gmd as markdown\n  gmd process -o html  \
	              Convert to html instead"
)]
pub struct GmdCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
	/// Convert every `*.gmd` document under the source directory.
	///
	/// Artifacts keep their path relative to the source directory and take
	/// the extension of the output type. A `gmd.toml` in the source directory
	/// supplies variables, exclusions and html/pdf settings.
	///
	/// A missing or empty source directory is not an error: there is simply
	/// nothing to convert.
	Process {
		/// Directory containing the `*.gmd` sources.
		#[arg(long, short, default_value = DEFAULT_SOURCE)]
		source: PathBuf,

		/// Directory the artifacts are written to. Created when missing.
		#[arg(long, short, default_value = DEFAULT_TARGET)]
		target: PathBuf,

		/// Output type: `md`, `html` or `pdf` (case-insensitive).
		#[arg(long, short, default_value = "md")]
		output_type: String,

		/// Number of documents converted in parallel. Overrides `jobs` from
		/// `gmd.toml`.
		#[arg(long, short)]
		jobs: Option<usize>,
	},
}
