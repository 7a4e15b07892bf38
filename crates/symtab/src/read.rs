use core::fmt;
use core::iter::FusedIterator;
use core::mem;

use zerocopy::{ByteOrder, FromBytes, LittleEndian};

use crate::raw::*;
use crate::ReadError;

/// A symbol section.
pub struct Symtab<'a, O: ByteOrder = LittleEndian> {
    header: Header<O>,

    /// Everything between the end of the header and `total_size`.
    data: &'a [u8],
}

impl<'a, O: ByteOrder> Symtab<'a, O> {
    /// Validate the header of a symbol section.
    ///
    /// `section` may be longer than the section itself, anything past the
    /// `total_size` recorded in the header is ignored. Entries are decoded
    /// lazily, see [`Symtab::symbols`].
    pub fn load(section: &'a [u8]) -> Result<Self, ReadError> {
        let header = match Header::<O>::read_from_prefix(section) {
            Some(header) if header.magic != MAGIC => return Err(ReadError::InvalidMagic),
            Some(header) => header,
            None => return Err(ReadError::UnexpectedEof),
        };

        match header.version() {
            Version::V1 | Version::V2 => (),
            version => return Err(ReadError::UnsupportedVersion(version.0)),
        }

        let total_size = header.total_size.get();
        if total_size < HEADER_SIZE as u64 {
            return Err(ReadError::InvalidTotalSize(total_size));
        }

        let data = usize::try_from(total_size)
            .ok()
            .and_then(|len| section.get(HEADER_SIZE..len))
            .ok_or(ReadError::UnexpectedEof)?;

        Ok(Self { header, data })
    }

    /// The format version used by the entries of this section.
    pub fn version(&self) -> Version {
        self.header.version()
    }

    /// The number of entries recorded in the header.
    pub fn num_entries(&self) -> u32 {
        self.header.entry_count.get()
    }

    /// The size of the whole section, including the header and padding.
    pub fn total_size(&self) -> u64 {
        self.header.total_size.get()
    }

    /// Get an iterator over all the symbols in this section, in the order
    /// they were written.
    pub fn symbols(&self) -> SymbolIter<'a, O> {
        SymbolIter {
            version: self.version(),
            data: self.data,
            remaining: self.num_entries(),
            _order: Default::default(),
        }
    }

    /// Find the first symbol whose address range contains `address`.
    ///
    /// A symbol covers `[address, address + size)`, so the address one past
    /// its end already belongs to whatever follows it. Zero-sized symbols only
    /// match their exact address. See [`Symbol::contains`].
    ///
    /// Sections built from a size-sorted listing yield the smallest enclosing
    /// symbol. Entries are not indexed so this is a linear scan.
    pub fn lookup(&self, address: u64) -> Result<Option<Symbol<'a>>, ReadError> {
        for symbol in self.symbols() {
            let symbol = symbol?;

            if symbol.contains(address) {
                return Ok(Some(symbol));
            }
        }

        Ok(None)
    }

    /// Like [`Symtab::lookup`] but also returns the offset of `address` from
    /// the start of the symbol.
    pub fn resolve(&self, address: u64) -> Result<Option<(Symbol<'a>, u64)>, ReadError> {
        Ok(self
            .lookup(address)?
            .map(|symbol| (symbol, address - symbol.address())))
    }

    /// Find the first symbol with the given name.
    pub fn find(&self, name: &[u8]) -> Result<Option<Symbol<'a>>, ReadError> {
        for symbol in self.symbols() {
            let symbol = symbol?;

            if symbol.name() == name {
                return Ok(Some(symbol));
            }
        }

        Ok(None)
    }

    /// The length of the header plus all entries, i.e. the offset at which
    /// the padding starts.
    pub fn content_len(&self) -> Result<usize, ReadError> {
        let mut iter = self.symbols();
        for symbol in iter.by_ref() {
            symbol?;
        }

        Ok(HEADER_SIZE + self.data.len() - iter.data.len())
    }

    /// The bytes between the end of the last entry and `total_size`.
    pub fn padding(&self) -> Result<&'a [u8], ReadError> {
        let offset = self.content_len()? - HEADER_SIZE;
        Ok(&self.data[offset..])
    }

    /// Whether every padding byte is zero.
    pub fn padding_is_zeroed(&self) -> Result<bool, ReadError> {
        Ok(self.padding()?.iter().all(|&b| b == 0))
    }
}

impl<'a, O: ByteOrder> fmt::Debug for Symtab<'a, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Symtab")
            .field("version", &self.version())
            .field("num_entries", &self.num_entries())
            .field("total_size", &self.total_size())
            .finish()
    }
}

/// A single decoded symbol.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Symbol<'a> {
    address: u64,
    size: u64,
    name: &'a [u8],
}

impl<'a> Symbol<'a> {
    pub fn new(address: u64, size: u64, name: &'a [u8]) -> Self {
        Self {
            address,
            size,
            name,
        }
    }

    fn load<O: ByteOrder>(version: Version, data: &'a [u8]) -> Result<(Self, &'a [u8]), ReadError> {
        let (address, size, rest, name_len) = match version {
            Version::V2 => {
                let prefix =
                    v2::EntryPrefix::<O>::read_from_prefix(data).ok_or(ReadError::UnexpectedEof)?;
                let rest = &data[mem::size_of::<v2::EntryPrefix<O>>()..];
                let name_len =
                    usize::try_from(prefix.name_len.get()).map_err(|_| ReadError::UnexpectedEof)?;

                (prefix.address.get(), prefix.size.get(), rest, name_len)
            }
            _ => {
                let prefix =
                    v1::EntryPrefix::<O>::read_from_prefix(data).ok_or(ReadError::UnexpectedEof)?;
                let rest = &data[mem::size_of::<v1::EntryPrefix<O>>()..];
                let name_len = rest
                    .iter()
                    .position(|&b| b == 0)
                    .ok_or(ReadError::MissingTerminator)?;

                (prefix.address.get(), prefix.size.get(), rest, name_len)
            }
        };

        let name = rest.get(..name_len).ok_or(ReadError::UnexpectedEof)?;
        match rest.get(name_len) {
            Some(0) => (),
            Some(_) => return Err(ReadError::MissingTerminator),
            None => return Err(ReadError::UnexpectedEof),
        }

        Ok((Self::new(address, size, name), &rest[name_len + 1..]))
    }

    /// The load address of the symbol.
    pub fn address(&self) -> u64 {
        self.address
    }

    /// The size of the symbol in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// The raw name bytes, without the terminator.
    pub fn name(&self) -> &'a [u8] {
        self.name
    }

    /// The name as a string, if it is valid UTF-8.
    pub fn name_str(&self) -> Option<&'a str> {
        core::str::from_utf8(self.name).ok()
    }

    /// Returns whether this symbol covers `address`.
    ///
    /// The end of the symbol is exclusive: `address + size` is not covered.
    /// A zero-sized symbol only covers its own address.
    pub fn contains(&self, address: u64) -> bool {
        if address < self.address {
            return false;
        }

        address == self.address || address - self.address < self.size
    }
}

#[derive(Clone)]
pub struct SymbolIter<'a, O: ByteOrder = LittleEndian> {
    version: Version,
    data: &'a [u8],
    remaining: u32,
    _order: core::marker::PhantomData<O>,
}

impl<'a, O: ByteOrder> Iterator for SymbolIter<'a, O> {
    type Item = Result<Symbol<'a>, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        Some(match Symbol::load::<O>(self.version, self.data) {
            Ok((symbol, rest)) => {
                self.remaining -= 1;
                self.data = rest;

                Ok(symbol)
            }
            Err(e) => {
                self.remaining = 0;

                Err(e)
            }
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let bound = self.remaining as usize;
        (1.min(bound), Some(bound))
    }
}

impl<'a, O: ByteOrder> FusedIterator for SymbolIter<'a, O> {}
