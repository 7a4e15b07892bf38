//! Stream a symbol section into a seekable sink.
//!
//! The section is written in a single forward pass: a placeholder header, one
//! entry per symbol as it arrives and then zero padding up to the requested
//! section size. Finally the writer seeks back and patches the header with the
//! entry count and total size. Nothing but the header needs to be kept in
//! memory so arbitrarily large symbol lists can be streamed through it.

use core::fmt;
use core::marker::PhantomData;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::vec::Vec;

use zerocopy::{AsBytes, ByteOrder, LittleEndian, U32, U64};

use crate::raw::*;
use crate::Symbol;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SymtabOptions {
    section_size: u64,
    version: Version,
}

impl SymtabOptions {
    /// Options for a section that must occupy exactly `section_size` bytes.
    pub fn new(section_size: u64) -> Self {
        Self {
            section_size,
            version: Version::V1,
        }
    }

    /// Set the entry format. Defaults to [`Version::V1`].
    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    pub fn section_size(&self) -> u64 {
        self.section_size
    }

    pub fn format_version(&self) -> Version {
        self.version
    }
}

/// Writes a symbol section to `W`.
///
/// The section starts at whatever position `W` is at when the writer is
/// created. Once the encoded content grows past the section size nothing else
/// is written to the sink, but the writer keeps counting so that
/// [`finish`](SymtabWriter::finish) can report how large the section would
/// have needed to be.
pub struct SymtabWriter<W: Write + Seek, O: ByteOrder = LittleEndian> {
    inner: W,
    options: SymtabOptions,
    start: u64,
    len: u64,
    count: u32,
    _order: PhantomData<O>,
}

impl<W: Write + Seek, O: ByteOrder> SymtabWriter<W, O> {
    /// Create a new writer and emit the placeholder header.
    pub fn new(mut inner: W, options: SymtabOptions) -> Result<Self, EmitError> {
        if options.version.entry_prefix_size().is_none() {
            return Err(EmitError::UnsupportedVersion(options.version.0));
        }

        let start = inner.stream_position()?;
        let mut writer = Self {
            inner,
            options,
            start,
            len: 0,
            count: 0,
            _order: PhantomData,
        };

        let header = Header::<O>::new(options.version, 0, 0);
        writer.emit(&[header.as_bytes()])?;

        Ok(writer)
    }

    pub fn options(&self) -> SymtabOptions {
        self.options
    }

    /// The number of entries written so far.
    pub fn entry_count(&self) -> u32 {
        self.count
    }

    /// The number of bytes taken up by the header and entries so far.
    ///
    /// This may exceed the section size, in which case
    /// [`finish`](SymtabWriter::finish) will fail.
    pub fn content_len(&self) -> u64 {
        self.len
    }

    /// Append an entry for a symbol.
    pub fn symbol(&mut self, address: u64, size: u64, name: &[u8]) -> Result<(), EmitError> {
        let count = self.count.checked_add(1).ok_or(EmitError::TooManySymbols)?;

        match self.options.version {
            Version::V2 => {
                let name_len = u32::try_from(name.len()).map_err(|_| EmitError::InvalidName)?;
                let prefix = v2::EntryPrefix::<O> {
                    address: U64::new(address),
                    size: U64::new(size),
                    name_len: U32::new(name_len),
                };

                self.emit(&[prefix.as_bytes(), name, &[0u8]])?;
            }
            _ => {
                if name.contains(&0) {
                    return Err(EmitError::InvalidName);
                }

                let prefix = v1::EntryPrefix::<O> {
                    address: U64::new(address),
                    size: U64::new(size),
                };

                self.emit(&[prefix.as_bytes(), name, &[0u8]])?;
            }
        }

        self.count = count;
        Ok(())
    }

    /// Pad the section out to its full size and patch the header.
    ///
    /// On success the sink is positioned at the end of the section.
    pub fn finish(mut self) -> Result<W, EmitError> {
        let available = self.options.section_size;
        if self.len > available {
            return Err(EmitError::SectionTooSmall {
                required: self.len,
                available,
            });
        }

        let fill = available - self.len;
        io::copy(&mut io::repeat(0).take(fill), &mut self.inner)?;

        let header = Header::<O>::new(self.options.version, self.count, self.len + fill);
        self.inner.seek(SeekFrom::Start(self.start))?;
        self.inner.write_all(header.as_bytes())?;
        self.inner.seek(SeekFrom::Start(self.start + available))?;
        self.inner.flush()?;

        Ok(self.inner)
    }

    /// Write `parts` as one unit if all of them still fit in the section.
    fn emit(&mut self, parts: &[&[u8]]) -> io::Result<()> {
        let len: u64 = parts.iter().map(|part| part.len() as u64).sum();
        let end = self.len.saturating_add(len);

        if end <= self.options.section_size {
            for part in parts {
                self.inner.write_all(part)?;
            }
        }

        self.len = end;
        Ok(())
    }
}

/// Encode `symbols` into an in-memory section.
pub fn encode<'s, O, I>(symbols: I, options: SymtabOptions) -> Result<Vec<u8>, EmitError>
where
    O: ByteOrder,
    I: IntoIterator<Item = Symbol<'s>>,
{
    let mut writer = SymtabWriter::<_, O>::new(Cursor::new(Vec::new()), options)?;
    for symbol in symbols {
        writer.symbol(symbol.address(), symbol.size(), symbol.name())?;
    }

    Ok(writer.finish()?.into_inner())
}

#[non_exhaustive]
#[derive(Debug)]
pub enum EmitError {
    /// The header and entries do not fit into the requested section size.
    ///
    /// `required` is the size the section would need to hold every symbol
    /// that was passed to the writer.
    SectionTooSmall { required: u64, available: u64 },

    /// More than `u32::MAX` symbols were written.
    TooManySymbols,

    /// A name cannot be represented in the configured format version.
    ///
    /// Version 1 names may not contain a zero byte and version 2 names must be
    /// shorter than 4GiB.
    InvalidName,

    /// The options requested a format version this crate cannot write.
    UnsupportedVersion(u32),

    /// The underlying sink failed.
    Io(io::Error),
}

impl From<io::Error> for EmitError {
    fn from(error: io::Error) -> Self {
        Self::Io(error)
    }
}

impl fmt::Display for EmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SectionTooSmall {
                required,
                available,
            } => write!(
                f,
                "symbol section of {available:#x} bytes is too small, the selected symbols need \
                 {required:#x} bytes"
            ),
            Self::TooManySymbols => f.write_str("too many symbols for a single section"),
            Self::InvalidName => {
                f.write_str("symbol name cannot be represented in this format version")
            }
            Self::UnsupportedVersion(version) => {
                write!(f, "cannot write symbol table version {version}")
            }
            Self::Io(error) => write!(f, "io error: {error}"),
        }
    }
}

impl std::error::Error for EmitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(error) => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_only_section() {
        let data = encode::<LittleEndian, _>([], SymtabOptions::new(24)).unwrap();

        assert_eq!(data.len(), 24);
        assert_eq!(&data[..8], b"symbols\0");
        assert_eq!(&data[16..24], &24u64.to_le_bytes());
    }

    #[test]
    fn nothing_is_written_past_the_section() {
        let mut buf = Cursor::new(Vec::new());
        let mut writer = SymtabWriter::<_, LittleEndian>::new(&mut buf, SymtabOptions::new(40))
            .unwrap();

        writer.symbol(0x1000, 0x10, b"fits").unwrap();
        writer.symbol(0x2000, 0x10, b"spills").unwrap();
        assert_eq!(writer.content_len(), 24 + 21 + 23);

        match writer.finish() {
            Err(EmitError::SectionTooSmall {
                required,
                available,
            }) => {
                assert_eq!(required, 68);
                assert_eq!(available, 40);
            }
            other => panic!("unexpected result: {other:?}"),
        }

        // Only the header made it out; the first entry would have ended at 45.
        assert_eq!(buf.get_ref().len(), 24);
    }

    #[test]
    fn unsupported_version() {
        let options = SymtabOptions::new(64).version(Version(7));
        let err = SymtabWriter::<_, LittleEndian>::new(Cursor::new(Vec::new()), options)
            .err()
            .unwrap();

        assert!(matches!(err, EmitError::UnsupportedVersion(7)));
    }
}
