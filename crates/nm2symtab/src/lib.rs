//! Convert `nm` symbol listings into fixed-size [`elf_symtab`] sections.
//!
//! The listing is consumed one line at a time. Lines that do not parse are
//! skipped, symbols whose type is not accepted by the [`SymbolFilter`] are
//! dropped and everything else is streamed straight into a
//! [`SymtabWriter`] in listing order.

use std::fs::{self, File};
use std::io::{self, BufWriter, Seek, Write};
use std::path::Path;

use elf_symtab::raw::Version;
use elf_symtab::write::{SymtabOptions, SymtabWriter};
use elf_symtab::LittleEndian;
use tracing::{debug, trace};

pub extern crate elf_symtab;

mod error;
pub mod nm;
pub mod tool;

pub use crate::error::Error;
pub use crate::nm::{parse_line, NmSymbol, ParseLineError, SymbolFilter};
pub use crate::tool::{NmListing, NmTool};

#[derive(Clone, Debug)]
pub struct Options {
    section_size: u64,
    version: Version,
    verbose: bool,
    filter: SymbolFilter,
}

impl Options {
    /// Options for a section that must be exactly `section_size` bytes.
    pub fn new(section_size: u64) -> Self {
        Self {
            section_size,
            version: Version::V1,
            verbose: false,
            filter: SymbolFilter::default(),
        }
    }

    /// The entry format to write.
    ///
    /// Defaults to [`Version::V1`].
    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Echo every symbol that goes into the section.
    ///
    /// The echo goes to stdout unless another sink is passed to
    /// [`convert_with_echo`] or [`write_section_file_with_echo`].
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Which symbol types to keep.
    ///
    /// Defaults to code and absolute symbols.
    pub fn filter(mut self, filter: SymbolFilter) -> Self {
        self.filter = filter;
        self
    }
}

/// What happened to the lines of a listing.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Summary {
    /// Symbols written to the section.
    pub entries: u32,

    /// Lines that could not be parsed.
    pub skipped: usize,

    /// Symbols dropped because of their type.
    pub filtered: usize,

    /// Size of the header plus all entries.
    pub content_size: u64,

    /// Size of the section including padding.
    pub section_size: u64,
}

/// Encode the symbols in `lines` into `sink`.
///
/// The section starts at the current position of `sink`. On success the sink
/// is returned positioned at the end of the section.
pub fn convert<I, S, W>(lines: I, sink: W, options: &Options) -> Result<(W, Summary), Error>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    W: Write + Seek,
{
    convert_with_echo(lines, sink, options, &mut io::stdout())
}

/// Like [`convert`] but verbose output is written to `echo`.
pub fn convert_with_echo<I, S, W>(
    lines: I,
    sink: W,
    options: &Options,
    echo: &mut dyn Write,
) -> Result<(W, Summary), Error>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    W: Write + Seek,
{
    let symtab_options = SymtabOptions::new(options.section_size).version(options.version);
    let mut writer = SymtabWriter::<W, LittleEndian>::new(sink, symtab_options)?;
    let mut summary = Summary {
        section_size: options.section_size,
        ..Default::default()
    };

    for (index, line) in lines.into_iter().enumerate() {
        let line = line.as_ref();

        let symbol = match parse_line(line) {
            Ok(symbol) => symbol,
            Err(error) => {
                trace!(line = index + 1, %error, "skipping line");
                summary.skipped += 1;
                continue;
            }
        };

        if !options.filter.accepts(symbol.kind) {
            summary.filtered += 1;
            continue;
        }

        if options.verbose {
            writeln!(
                echo,
                "0x{:018x}, 0x{:018x}, {}",
                symbol.address, symbol.size, symbol.name
            )
            .map_err(Error::Echo)?;
        }

        writer.symbol(symbol.address, symbol.size, symbol.name.as_bytes())?;
    }

    summary.entries = writer.entry_count();
    summary.content_size = writer.content_len();

    debug!(
        entries = summary.entries,
        skipped = summary.skipped,
        filtered = summary.filtered,
        content_size = summary.content_size,
        section_size = summary.section_size,
        "encoded symbol section"
    );

    let sink = writer.finish()?;
    Ok((sink, summary))
}

/// Encode the symbols in `lines` into a new file at `path`.
///
/// The section is first written to a temporary file next to `path` which
/// only replaces `path` once the section is complete. If anything fails,
/// `path` is left untouched.
///
/// A new file gets the same permissions as any other file created by the
/// process. When `path` already exists its permissions are kept.
pub fn write_section_file<I, S>(path: &Path, lines: I, options: &Options) -> Result<Summary, Error>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    write_section_file_with_echo(path, lines, options, &mut io::stdout())
}

/// Like [`write_section_file`] but verbose output is written to `echo`.
pub fn write_section_file_with_echo<I, S>(
    path: &Path,
    lines: I,
    options: &Options,
    echo: &mut dyn Write,
) -> Result<Summary, Error>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let write_error = |source| Error::Write {
        path: path.to_owned(),
        source,
    };

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    #[cfg_attr(not(unix), allow(unused_mut))]
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        // The process umask still applies on top of this.
        builder.permissions(fs::Permissions::from_mode(0o666));
    }

    let temp = builder.tempfile_in(dir).map_err(write_error)?;
    if let Ok(metadata) = fs::metadata(path) {
        temp.as_file()
            .set_permissions(metadata.permissions())
            .map_err(write_error)?;
    }

    let (temp, summary) = convert_with_echo(lines, BufWriter::new(temp), options, echo)?;
    let temp = temp
        .into_inner()
        .map_err(|error| write_error(error.into_error()))?;

    let file: File = temp.persist(path).map_err(|error| write_error(error.error))?;
    file.sync_all().map_err(write_error)?;

    Ok(summary)
}
