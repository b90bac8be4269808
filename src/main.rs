//! CLI entrypoint.

use std::error::Error;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};
use owo_colors::OwoColorize;
use pydocmd::core_api::list_items;
use pydocmd::python::{interpreter_search_paths, split_module_path};
use pydocmd::{ProcessReport, Processor, list_tree_json, load_options_file, parse_option_override};
use serde_yaml::Mapping;
use tracing_subscriber::EnvFilter;

#[derive(Args, Clone)]
struct CommonArgs {
	/// Directory searched for Python packages (repeatable, searched in order)
	#[arg(short = 'p', long = "path", value_name = "DIR", default_value = ".")]
	paths: Vec<PathBuf>,

	/// Python interpreter whose `sys.path` is appended to the search paths
	#[arg(long, value_name = "INTERP")]
	python: Option<String>,

	/// YAML file with default render options
	#[arg(short = 'c', long, value_name = "FILE")]
	config: Option<PathBuf>,

	/// Enable verbose mode, logging block expansion at debug level
	#[arg(short = 'v', long, default_value_t = false)]
	verbose: bool,

	/// Disable ANSI colors in CLI output
	#[arg(long, default_value_t = false)]
	no_color: bool,
}

#[derive(Args, Clone)]
struct ProcessArgs {
	/// Markdown file containing `:::` placeholder blocks
	input: PathBuf,

	/// Write the processed document here instead of stdout
	#[arg(short = 'O', long)]
	output: Option<PathBuf>,

	#[command(flatten)]
	common: CommonArgs,
}

#[derive(Args, Clone)]
struct RenderArgs {
	/// Dotted path of the object to document, e.g. `statsforecast.models.AutoARIMA`
	path: String,

	/// Render option as `key=value`; the value is read as YAML (repeatable)
	#[arg(short = 'o', long = "option", value_name = "KEY=VALUE")]
	options: Vec<String>,

	#[command(flatten)]
	common: CommonArgs,
}

#[derive(Args, Clone)]
struct InspectArgs {
	/// Package or dotted object path to list
	path: String,

	/// Print the object tree as JSON
	#[arg(long, default_value_t = false)]
	json: bool,

	#[command(flatten)]
	common: CommonArgs,
}

#[derive(Subcommand, Clone)]
enum Command {
	/// Expand every placeholder block in a markdown file.
	Process(ProcessArgs),
	/// Render documentation for a single object.
	Render(RenderArgs),
	/// List the objects of a package.
	Inspect(InspectArgs),
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
/// Parsed command-line options for the pydocmd CLI.
struct Cli {
	#[command(subcommand)]
	command: Command,
}

impl Command {
	fn common(&self) -> &CommonArgs {
		match self {
			Self::Process(args) => &args.common,
			Self::Render(args) => &args.common,
			Self::Inspect(args) => &args.common,
		}
	}
}

/// Install the stderr log subscriber; `RUST_LOG` overrides the CLI level.
fn init_tracing(common: &CommonArgs) {
	let level = if common.verbose { "debug" } else { "warn" };
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into()))
		.with_writer(std::io::stderr)
		.with_ansi(should_color_output(common))
		.with_target(false)
		.init();
}

/// Build a Processor configured with common CLI knobs.
fn build_processor(common: &CommonArgs) -> Result<Processor, Box<dyn Error>> {
	let mut processor = Processor::new().with_search_paths(common.paths.clone());
	if let Some(interpreter) = common.python.as_deref() {
		for path in interpreter_search_paths(interpreter)? {
			processor = processor.with_search_path(path);
		}
	}
	if let Some(config) = common.config.as_deref() {
		processor = processor.with_default_options(load_options_file(config)?);
	}
	Ok(processor)
}

/// Expand a markdown file and report failed blocks on stderr.
fn run_process(args: &ProcessArgs, processor: &Processor) -> Result<(), Box<dyn Error>> {
	let report = processor.process_file_report(&args.input, args.output.as_deref())?;
	if args.output.is_none() {
		print!("{}", report.output);
	}
	report_failures(&args.common, &args.input.display().to_string(), &report);
	Ok(())
}

fn report_failures(common: &CommonArgs, input: &str, report: &ProcessReport) {
	if report.failures.is_empty() {
		return;
	}
	let colored = should_color_output(common);
	for failure in &report.failures {
		let location = format!("{input}:{}", failure.line);
		if colored {
			eprintln!("{} {} {}", location.bold(), "failed:".red(), failure.module_path);
		} else {
			eprintln!("{location} failed: {}", failure.module_path);
		}
	}
	let summary = format!("{} of {} blocks failed", report.failures.len(), report.blocks);
	if colored {
		eprintln!("{}", summary.yellow().bold());
	} else {
		eprintln!("{summary}");
	}
}

/// Render one object with options given on the command line.
fn run_render(args: &RenderArgs, processor: &Processor) -> Result<(), Box<dyn Error>> {
	let mut options = Mapping::new();
	for text in &args.options {
		let (key, value) = parse_option_override(text)?;
		options.insert(key.into(), value);
	}
	print!("{}", processor.render(&args.path, &options)?);
	Ok(())
}

/// List the object tree of a package, or of one object inside it.
fn run_inspect(args: &InspectArgs, processor: &Processor) -> Result<(), Box<dyn Error>> {
	let (package_name, object_path) = split_module_path(&args.path);
	let package = processor.inspect(package_name)?;
	let obj = package.get(object_path)?;

	if args.json {
		println!("{}", list_tree_json(obj)?);
		return Ok(());
	}

	let listings = list_items(obj);
	let label_width = listings.iter().map(|entry| entry.kind.label().len()).max().unwrap_or(0);
	let path_width = listings.iter().map(|entry| entry.path.len()).max().unwrap_or(0);
	let colored = should_color_output(&args.common);

	let mut buffer = String::new();
	for entry in listings {
		let label = format!("{:<label_width$}", entry.kind.label());
		let label = if colored { label.cyan().to_string() } else { label };
		let location = entry.source.as_deref().unwrap_or("-");
		buffer.push_str(&format!("{label} {path:<path_width$} {location}\n", path = entry.path));
	}
	print!("{buffer}");
	Ok(())
}

fn should_color_output(common: &CommonArgs) -> bool {
	if common.no_color {
		return false;
	}
	if std::env::var_os("NO_COLOR").is_some() {
		return false;
	}
	if std::env::var("TERM").ok().as_deref() == Some("dumb") {
		return false;
	}
	std::io::stderr().is_terminal()
}

fn main() {
	let cli = Cli::parse();
	init_tracing(cli.command.common());

	if let Err(e) = run(cli) {
		eprintln!("{e}");
		process::exit(1);
	}
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
	let processor = build_processor(cli.command.common())?;
	match &cli.command {
		Command::Process(args) => run_process(args, &processor),
		Command::Render(args) => run_render(args, &processor),
		Command::Inspect(args) => run_inspect(args, &processor),
	}
}
