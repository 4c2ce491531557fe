use std::path::Path;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub fn gmd_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("gmd"));
	cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
	cmd
}

/// Write `files` (relative path, content) under `root`.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) -> std::io::Result<()> {
	for (relative, content) in files {
		let path = root.join(relative);
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(path, content)?;
	}
	Ok(())
}
