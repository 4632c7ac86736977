//! Common utilities for command-line tests.

use std::io::Write;
use std::process::{Command, Output};

use tempfile::NamedTempFile;

/// Write `source` to a temporary `.frag` file that lives as long as the
/// returned handle.
pub fn shader_file(source: &str) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(".frag").expect("Failed to create temp file");
    file.write_all(source.as_bytes())
        .expect("Failed to write shader");
    file
}

/// Run the `shader-reduce` binary with `args`.
pub fn shader_reduce<I, S>(args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    Command::new(env!("CARGO_BIN_EXE_shader-reduce"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("Failed to execute shader-reduce")
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
