//! Parsing of `nm --print-size` style symbol listings.
//!
//! Each symbol is described by one line of four whitespace separated fields:
//! ```text
//! <address:hex> <size:hex> <type:char> <name>
//! ```
//! Addresses and sizes are hexadecimal without a radix prefix. Anything else
//! the utility prints (archive member headers, blank separators) fails to
//! parse and is expected to be skipped by the caller.

/// One parsed line of a symbol listing.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NmSymbol {
    pub address: u64,
    pub size: u64,

    /// The single character type code, e.g. `T` for a global code symbol.
    pub kind: char,

    pub name: String,
}

#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ParseLineError {
    #[error("expected 4 fields but found {0}")]
    FieldCount(usize),

    #[error("invalid symbol address `{0}`")]
    InvalidAddress(String),

    #[error("invalid symbol size `{0}`")]
    InvalidSize(String),

    #[error("symbol type `{0}` is not a single character")]
    InvalidKind(String),

    #[error("symbol name {0:?} contains a zero byte")]
    InvalidName(String),
}

/// Parse a single line of a symbol listing.
pub fn parse_line(line: &str) -> Result<NmSymbol, ParseLineError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [address, size, kind, name] = fields[..] else {
        return Err(ParseLineError::FieldCount(fields.len()));
    };

    let address = u64::from_str_radix(address, 16)
        .map_err(|_| ParseLineError::InvalidAddress(address.to_owned()))?;
    let size =
        u64::from_str_radix(size, 16).map_err(|_| ParseLineError::InvalidSize(size.to_owned()))?;

    let mut chars = kind.chars();
    let kind = match (chars.next(), chars.next()) {
        (Some(c), None) => c,
        _ => return Err(ParseLineError::InvalidKind(kind.to_owned())),
    };

    if name.contains('\0') {
        return Err(ParseLineError::InvalidName(name.to_owned()));
    }

    Ok(NmSymbol {
        address,
        size,
        kind,
        name: name.to_owned(),
    })
}

/// The set of symbol type codes that end up in the section.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SymbolFilter {
    kinds: Vec<char>,
}

impl SymbolFilter {
    pub fn new(kinds: impl IntoIterator<Item = char>) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
        }
    }

    pub fn accepts(&self, kind: char) -> bool {
        self.kinds.contains(&kind)
    }
}

impl Default for SymbolFilter {
    /// Local and global code symbols (`t`, `T`) and local and global absolute
    /// symbols (`a`, `A`).
    fn default() -> Self {
        Self::new(['t', 'T', 'a', 'A'])
    }
}
