//! Definitions for version 1 of the symbol section format.
//!
//! An entry is an [`EntryPrefix`] followed directly by the raw name bytes and
//! a single zero byte. There is no length field: a reader has to scan for the
//! terminator to find both the end of the name and the start of the next
//! entry, so entries can only be visited in order. This also means that a
//! name may not contain a zero byte.

use zerocopy::{AsBytes, ByteOrder, FromBytes, FromZeroes, Unaligned, U64};

/// The fixed part of a version 1 entry.
#[repr(packed)]
#[derive(Copy, Clone, Debug, AsBytes, FromBytes, FromZeroes, Unaligned)]
pub struct EntryPrefix<O: ByteOrder> {
    /// The load address of the symbol.
    pub address: U64<O>,

    /// The size of the symbol in bytes.
    pub size: U64<O>,
}
