mod common;

use clap::Parser;
use gmd_cli::Commands;
use gmd_cli::GmdCli;
use gmd_core::AnyEmptyResult;
use predicates::prelude::PredicateBooleanExt;

#[test]
fn process_defaults_to_markdown_in_the_conventional_layout() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_tree(
		tmp.path(),
		&[("src/main/gmd/guide/intro.gmd", "# Intro\n\nBuilt in ${year}.\n")],
	)?;

	let mut cmd = common::gmd_cmd();
	let _ = cmd
		.current_dir(tmp.path())
		.arg("process")
		.assert()
		.success()
		.stdout(predicates::str::contains("Converted 1 of 1 document(s) to md"));

	let artifact = std::fs::read_to_string(tmp.path().join("target/gmd/guide/intro.md"))?;
	assert!(artifact.starts_with("# Intro\n\nBuilt in "), "{artifact}");
	assert!(!artifact.contains("${"), "{artifact}");

	Ok(())
}

#[test]
fn process_writes_html_and_pdf() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let source = tmp.path().join("docs");
	common::write_tree(&source, &[("index.gmd", "# Greetings\n\nHello world!\n")])?;

	for output_type in ["html", "PDF"] {
		let mut cmd = common::gmd_cmd();
		let _ = cmd
			.arg("process")
			.arg("--source")
			.arg(&source)
			.arg("--target")
			.arg(tmp.path().join("out"))
			.arg("--output-type")
			.arg(output_type)
			.assert()
			.success();
	}

	let html = std::fs::read_to_string(tmp.path().join("out/index.html"))?;
	assert!(html.contains("<h1>Greetings</h1>"));
	let pdf = std::fs::read(tmp.path().join("out/index.pdf"))?;
	assert!(pdf.starts_with(b"%PDF-"));

	Ok(())
}

#[test]
fn missing_source_directory_is_not_an_error() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	let mut cmd = common::gmd_cmd();
	let _ = cmd
		.arg("process")
		.arg("--source")
		.arg(tmp.path().join("nowhere"))
		.arg("--target")
		.arg(tmp.path().join("out"))
		.assert()
		.success()
		.stderr(predicates::str::contains("does not exist"));

	assert!(!tmp.path().join("out").exists());

	Ok(())
}

#[test]
fn empty_source_directory_is_not_an_error() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_tree(tmp.path(), &[("src/readme.txt", "no documents here\n")])?;

	let mut cmd = common::gmd_cmd();
	let _ = cmd
		.arg("process")
		.arg("--source")
		.arg(tmp.path().join("src"))
		.arg("--target")
		.arg(tmp.path().join("out"))
		.assert()
		.success()
		.stderr(predicates::str::contains("no .gmd documents found"));

	Ok(())
}

#[test]
fn source_file_fails_the_run() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_tree(tmp.path(), &[("single.gmd", "# Single\n")])?;

	let mut cmd = common::gmd_cmd();
	let _ = cmd
		.arg("process")
		.arg("--source")
		.arg(tmp.path().join("single.gmd"))
		.arg("--target")
		.arg(tmp.path().join("out"))
		.assert()
		.code(2)
		.stderr(predicates::str::contains("is not a directory"));

	Ok(())
}

#[test]
fn unsupported_output_type_fails_before_reading() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_tree(tmp.path(), &[("src/a.gmd", "# A\n")])?;

	let mut cmd = common::gmd_cmd();
	let _ = cmd
		.arg("process")
		.arg("--source")
		.arg(tmp.path().join("src"))
		.arg("--target")
		.arg(tmp.path().join("out"))
		.arg("--output-type")
		.arg("xml")
		.assert()
		.code(2)
		.stderr(predicates::str::contains("unsupported output type"));

	assert!(!tmp.path().join("out").exists());

	Ok(())
}

#[test]
fn failing_documents_are_reported_and_siblings_written() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let source = tmp.path().join("src");
	common::write_tree(
		&source,
		&[("bad.gmd", "Hello ${missing}\n"), ("good.gmd", "# Good\n")],
	)?;

	let mut cmd = common::gmd_cmd();
	let _ = cmd
		.arg("process")
		.arg("--source")
		.arg(&source)
		.arg("--target")
		.arg(tmp.path().join("out"))
		.assert()
		.code(2)
		.stdout(predicates::str::contains("Converted 1 of 2 document(s)"))
		.stderr(
			predicates::str::contains("bad.gmd during evaluate")
				.and(predicates::str::contains("1 of 2 document(s) failed to convert")),
		);

	assert!(tmp.path().join("out/good.md").is_file());
	assert!(!tmp.path().join("out/bad.md").exists());

	Ok(())
}

#[test]
fn zero_jobs_fail_the_run() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_tree(tmp.path(), &[("src/a.gmd", "# A\n")])?;

	let mut cmd = common::gmd_cmd();
	let _ = cmd
		.arg("process")
		.arg("--source")
		.arg(tmp.path().join("src"))
		.arg("--target")
		.arg(tmp.path().join("out"))
		.arg("--jobs")
		.arg("0")
		.assert()
		.code(2)
		.stderr(predicates::str::contains("invalid worker count"));

	Ok(())
}

#[test]
fn config_file_is_applied() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let source = tmp.path().join("src");
	common::write_tree(
		&source,
		&[
			(
				"gmd.toml",
				"[variables]\nproject = \"Atlas\"\n\n[exclude]\npatterns = [\"drafts/\"]\n",
			),
			("a.gmd", "About ${project}\n"),
			("drafts/b.gmd", "${undefined}\n"),
		],
	)?;

	let mut cmd = common::gmd_cmd();
	let _ = cmd
		.arg("process")
		.arg("--source")
		.arg(&source)
		.arg("--target")
		.arg(tmp.path().join("out"))
		.assert()
		.success();

	assert_eq!(
		std::fs::read_to_string(tmp.path().join("out/a.md"))?,
		"About Atlas\n"
	);
	assert!(!tmp.path().join("out/drafts").exists());

	Ok(())
}

#[test]
fn summary_is_colored_unless_disabled() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let source = tmp.path().join("src");
	common::write_tree(&source, &[("a.gmd", "# A\n")])?;

	let colored = common::gmd_cmd()
		.env_remove("NO_COLOR")
		.arg("process")
		.arg("--source")
		.arg(&source)
		.arg("--target")
		.arg(tmp.path().join("out"))
		.output()?;
	let stdout = String::from_utf8_lossy(&colored.stdout);
	assert!(stdout.contains("\u{1b}[32mConverted"), "{stdout}");

	let plain = common::gmd_cmd()
		.env_remove("NO_COLOR")
		.arg("process")
		.arg("--no-color")
		.arg("--source")
		.arg(&source)
		.arg("--target")
		.arg(tmp.path().join("out"))
		.output()?;
	let stdout = String::from_utf8_lossy(&plain.stdout);
	assert!(stdout.starts_with("Converted 1 of 1 document(s) to md"), "{stdout}");
	assert!(!stdout.contains('\u{1b}'), "{stdout}");

	Ok(())
}

#[test]
fn unknown_flags_are_usage_errors() {
	let mut cmd = common::gmd_cmd();
	let _ = cmd.arg("process").arg("--colour").assert().code(1);
}

#[test]
fn help_exits_successfully() {
	let mut cmd = common::gmd_cmd();
	let _ = cmd
		.arg("--help")
		.assert()
		.success()
		.stdout(predicates::str::contains("process"));
}

#[test]
fn process_arguments_have_defaults() {
	let cli = GmdCli::try_parse_from(["gmd", "process"]).unwrap_or_else(|e| panic!("{e}"));
	let Some(Commands::Process {
		source,
		target,
		output_type,
		jobs,
	}) = cli.command
	else {
		panic!("expected the process command");
	};

	assert_eq!(source, std::path::PathBuf::from(gmd_cli::DEFAULT_SOURCE));
	assert_eq!(target, std::path::PathBuf::from(gmd_cli::DEFAULT_TARGET));
	assert_eq!(output_type, "md");
	assert_eq!(jobs, None);
	assert!(!cli.verbose);
}

#[test]
fn global_flags_follow_the_subcommand() {
	let cli = GmdCli::try_parse_from(["gmd", "process", "-o", "pdf", "--verbose", "--no-color"])
		.unwrap_or_else(|e| panic!("{e}"));
	assert!(cli.verbose);
	assert!(cli.no_color);
	assert!(matches!(
		cli.command,
		Some(Commands::Process { ref output_type, .. }) if output_type == "pdf"
	));
}
