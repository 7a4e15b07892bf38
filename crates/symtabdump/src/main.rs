use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use elf_symtab::{LittleEndian, Symtab};
use object::{Object, ObjectSection};

const HELP: &str = "\
Dump a symbol section.

USAGE
    symtabdump [OPTIONS] <file>

DESCRIPTION
    symtabdump prints the header and every entry of a symbol section in a
    human readable format. <file> is the raw section as written by nm2symtab
    or, with --section, an object file that embeds it.

FLAGS
    -h
    --help
        Print this help message and then exit.

OPTIONS
    -s <NAME>
    --section <NAME>
        Read the section called NAME out of an object file instead of treating
        the whole file as the symbol section.

    -a <ADDR>
    --address <ADDR>
        Resolve the hex address ADDR to a symbol and offset. May be given
        more than once.
";

fn main() -> anyhow::Result<()> {
    let mut opts = getopts::Options::new();
    opts.optflag("h", "help", "show this help text");
    opts.optopt("s", "section", "read the symbols from this object section", "NAME");
    opts.optmulti("a", "address", "resolve an address", "ADDR");

    let matches = opts.parse(std::env::args().skip(1))?;

    if matches.opt_present("help") {
        eprintln!("{HELP}");
        return Ok(());
    }

    if matches.free.is_empty() {
        anyhow::bail!("no input file provided");
    }

    if matches.free.len() != 1 {
        anyhow::bail!("at most one input file can be provided")
    }

    let addresses = matches
        .opt_strs("address")
        .iter()
        .map(|addr| parse_address(addr))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let path = Path::new(&matches.free[0]);
    let file = File::open(path).with_context(|| format!("failed to open `{}`", path.display()))?;
    let data = unsafe { memmap2::Mmap::map(&file) }
        .with_context(|| format!("failed to mmap `{}`", path.display()))?;

    let section: Cow<[u8]> = match matches.opt_str("section") {
        Some(name) => {
            let file = object::File::parse(&*data)
                .with_context(|| format!("failed to parse `{}`", path.display()))?;
            let section = file
                .section_by_name(&name)
                .with_context(|| format!("`{}` has no {name} section", path.display()))?;

            section
                .uncompressed_data()
                .with_context(|| format!("failed to decompress the {name} section"))?
        }
        None => Cow::Borrowed(&data[..]),
    };

    let symtab: Symtab<LittleEndian> =
        Symtab::load(&section).context("failed to decode the symbol section")?;
    let stdout = std::io::stdout();
    let mut w = BufWriter::new(stdout.lock());

    dump(&mut w, &symtab)?;
    resolve(&mut w, &symtab, &addresses)?;
    w.flush()?;

    Ok(())
}

fn parse_address(addr: &str) -> anyhow::Result<u64> {
    let digits = addr
        .strip_prefix("0x")
        .or_else(|| addr.strip_prefix("0X"))
        .unwrap_or(addr);

    u64::from_str_radix(digits, 16).with_context(|| format!("`{addr}` is not a hex address"))
}

fn dump<W: Write>(w: &mut W, symtab: &Symtab) -> anyhow::Result<()> {
    writeln!(w, "Header:")?;
    writeln!(w, "  Version:    {}", symtab.version().0)?;
    writeln!(w, "  Entries:    {}", symtab.num_entries())?;
    writeln!(w, "  Total Size: {:#x}", symtab.total_size())?;
    match symtab.content_len() {
        Ok(len) => writeln!(
            w,
            "  Content:    {len:#x} ({:#x} bytes of padding)",
            symtab.total_size() - len as u64
        )?,
        Err(e) => writeln!(w, "  Content:    invalid ({e})")?,
    }
    if let Ok(false) = symtab.padding_is_zeroed() {
        writeln!(w, "  warning: padding contains non-zero bytes")?;
    }
    writeln!(w)?;
    writeln!(w, "Symbols:")?;
    writeln!(w, "  IDX    ADDRESS            SIZE               NAME")?;

    for (idx, symbol) in symtab.symbols().enumerate() {
        let symbol = match symbol {
            Ok(symbol) => symbol,
            Err(e) => {
                w.flush()?;
                eprintln!("  error decoding entry {idx}: {e}");
                break;
            }
        };

        writeln!(
            w,
            "  {idx:<6} {:016x}   {:016x}   {}",
            symbol.address(),
            symbol.size(),
            String::from_utf8_lossy(symbol.name())
        )?;
    }

    Ok(())
}

fn resolve<W: Write>(w: &mut W, symtab: &Symtab, addresses: &[u64]) -> anyhow::Result<()> {
    if addresses.is_empty() {
        return Ok(());
    }

    writeln!(w)?;
    writeln!(w, "Addresses:")?;

    for &address in addresses {
        match symtab.resolve(address)? {
            Some((symbol, offset)) => writeln!(
                w,
                "  {address:016x} => {}+{offset:#x}",
                String::from_utf8_lossy(symbol.name())
            )?,
            None => writeln!(w, "  {address:016x} => <unknown>")?,
        }
    }

    Ok(())
}
