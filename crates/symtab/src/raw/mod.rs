//! Raw struct types representing the on-disk layout of a symbol section.

use core::mem;

use c_enum::c_enum;
use zerocopy::{AsBytes, ByteOrder, FromBytes, FromZeroes, NativeEndian, Unaligned, U32, U64};

pub mod v1;
pub mod v2;

/// The magic tag that every symbol section starts with.
pub const MAGIC: [u8; 8] = *b"symbols\0";

/// The size of [`Header`] in bytes.
///
/// This does not depend on the byte order or on the format version.
pub const HEADER_SIZE: usize = mem::size_of::<Header<NativeEndian>>();

/// The header is the first part of a symbol section.
///
/// A writer emits it twice: once with placeholder values before any entries
/// and once more at the end, when the number of entries and the final size of
/// the section are known.
#[repr(packed)]
#[derive(Copy, Clone, Debug, AsBytes, FromBytes, FromZeroes, Unaligned)]
pub struct Header<O: ByteOrder> {
    /// Always [`MAGIC`].
    pub magic: [u8; 8],

    /// The format version used by the entries in this section.
    pub version: U32<O>,

    /// The number of symbol entries in the section.
    pub entry_count: U32<O>,

    /// The length of the whole section in bytes.
    ///
    /// This covers the header, every entry and the zero padding after the last
    /// entry, so it is always the size of the region the section was built
    /// for.
    pub total_size: U64<O>,
}

impl<O: ByteOrder> Header<O> {
    pub fn new(version: Version, entry_count: u32, total_size: u64) -> Self {
        Self {
            magic: MAGIC,
            version: U32::new(version.0),
            entry_count: U32::new(entry_count),
            total_size: U64::new(total_size),
        }
    }

    pub fn version(&self) -> Version {
        Version(self.version.get())
    }
}

c_enum! {
    /// The version of the symbol section format.
    #[repr(transparent)]
    #[derive(Copy, Clone, Eq, PartialEq, PartialOrd, Ord, Hash)]
    pub enum Version: u32 {
        /// Names are stored without a length and end at the first zero byte.
        V1 = 1,

        /// Names are preceded by an explicit 32-bit length.
        V2 = 2,
    }
}

impl Version {
    /// The size in bytes of the fixed part of an entry in this version.
    ///
    /// Returns `None` for versions this crate does not know about.
    pub fn entry_prefix_size(self) -> Option<usize> {
        match self {
            Self::V1 => Some(mem::size_of::<v1::EntryPrefix<NativeEndian>>()),
            Self::V2 => Some(mem::size_of::<v2::EntryPrefix<NativeEndian>>()),
            _ => None,
        }
    }

    /// The encoded size of an entry with a name of `name_len` bytes.
    pub fn entry_size(self, name_len: usize) -> Option<usize> {
        // +1 for the terminating zero byte.
        Some(self.entry_prefix_size()? + name_len + 1)
    }
}
