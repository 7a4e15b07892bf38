//! Errors for symbol listing to symbol section conversion.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use elf_symtab::write::EmitError;

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The symbol dump utility could not be started.
    #[error("failed to run `{}`", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The symbol dump utility ran but reported a failure.
    #[error("`{}` exited with {status}: {stderr}", .program.display())]
    ToolFailed {
        program: PathBuf,
        status: ExitStatus,
        stderr: String,
    },

    /// The section could not be encoded, most commonly because the selected
    /// symbols do not fit into the requested section size.
    #[error(transparent)]
    Emit(#[from] EmitError),

    /// Verbose output could not be written.
    #[error("failed to echo a symbol")]
    Echo(#[source] io::Error),

    /// Creating or replacing the output file failed.
    #[error("failed to write `{}`", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
