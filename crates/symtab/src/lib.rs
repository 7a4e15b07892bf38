//! `elf-symtab` is a library for reading and writing compact symbol table
//! sections.
//!
//! A symbol section is a fixed-size blob meant to be embedded verbatim into a
//! reserved region of a firmware or kernel image. At runtime the image can
//! walk it to turn an address back into a symbol name, e.g. when printing a
//! backtrace from a panic handler.
//!
//! The layout is a 24 byte header followed by one variable-length entry per
//! symbol and zero padding up to the size of the reserved region:
//! ```text
//! offset 0:  magic        [8 bytes, "symbols\0"]
//! offset 8:  version      [u32]
//! offset 12: entry_count  [u32]
//! offset 16: total_size   [u64]
//! offset 24: entry[0]
//!   ...
//! <zero padding up to total_size>
//! ```
//!
//! # Modules
//! - Types to read a symbol section are available in the crate root.
//! - [`raw`] - Raw on-disk structs for the header and entry prefixes.
//! - [`write`][mod@write] - Stream a new symbol section into a seekable sink.
//!   Requires the `std` feature.

#![no_std]

#[cfg(feature = "std")]
extern crate std;

mod error;
pub mod raw;
mod read;
#[cfg(feature = "std")]
pub mod write;

pub use zerocopy::{BigEndian, ByteOrder, LittleEndian, NativeEndian};

pub use self::error::ReadError;
pub use self::read::*;
