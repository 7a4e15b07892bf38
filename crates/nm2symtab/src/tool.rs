//! Running the external symbol dump utility.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::info;

use crate::Error;

/// The utility used when no other one is configured.
///
/// It is looked up through `PATH`.
pub const DEFAULT_NM: &str = "rust-nm";

/// Defined symbols only, with sizes, sorted by size, in hex.
const NM_ARGS: [&str; 5] = [
    "--defined-only",
    "--print-size",
    "--print-armap",
    "--size-sort",
    "--radix=x",
];

/// An `nm` compatible symbol dump utility.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NmTool {
    program: PathBuf,
}

impl NmTool {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Build the command that lists the symbols of `object`.
    pub fn command(&self, object: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command.args(NM_ARGS).arg(object);
        command
    }

    /// Run the utility against `object` and collect its output.
    ///
    /// Output that is not valid UTF-8 is decoded lossily; the affected lines
    /// will usually fail to parse and be skipped.
    pub fn run(&self, object: &Path) -> Result<NmListing, Error> {
        info!(
            program = %self.program.display(),
            object = %object.display(),
            "listing symbols"
        );

        let output = self
            .command(object)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| Error::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(Error::ToolFailed {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        Ok(NmListing::from_text(
            String::from_utf8_lossy(&output.stdout).into_owned(),
        ))
    }
}

impl Default for NmTool {
    fn default() -> Self {
        Self::new(DEFAULT_NM)
    }
}

/// The text output of a symbol dump utility.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NmListing {
    text: String,
}

impl NmListing {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn lines(&self) -> std::str::Lines<'_> {
        self.text.lines()
    }
}
