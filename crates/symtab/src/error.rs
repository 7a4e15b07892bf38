use core::fmt;

#[non_exhaustive]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ReadError {
    /// The section does not start with [`MAGIC`](crate::raw::MAGIC).
    InvalidMagic,

    /// Found an unsupported format version.
    UnsupportedVersion(u32),

    /// Hit the end of input before it was expected.
    UnexpectedEof,

    /// The header claims a total size smaller than the header itself.
    InvalidTotalSize(u64),

    /// An entry name was not followed by a zero byte.
    MissingTerminator,
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMagic => f.write_str("section does not start with the symbol table magic"),
            Self::UnsupportedVersion(version) => {
                write!(f, "unsupported symbol table version {version}")
            }
            Self::UnexpectedEof => f.write_str("unexpected end of symbol section"),
            Self::InvalidTotalSize(size) => {
                write!(f, "header total size {size:#x} is smaller than the header")
            }
            Self::MissingTerminator => f.write_str("symbol name is missing its zero terminator"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ReadError {}
