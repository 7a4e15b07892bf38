//! Definitions for version 2 of the symbol section format.
//!
//! Version 2 adds an explicit name length to the entry prefix so a reader can
//! skip over an entry without scanning its name. The name is still followed
//! by a zero byte so it can be handed out as a C string.

use zerocopy::{AsBytes, ByteOrder, FromBytes, FromZeroes, Unaligned, U32, U64};

/// The fixed part of a version 2 entry.
#[repr(packed)]
#[derive(Copy, Clone, Debug, AsBytes, FromBytes, FromZeroes, Unaligned)]
pub struct EntryPrefix<O: ByteOrder> {
    /// The load address of the symbol.
    pub address: U64<O>,

    /// The size of the symbol in bytes.
    pub size: U64<O>,

    /// The length of the name in bytes, not counting the terminator.
    pub name_len: U32<O>,
}
