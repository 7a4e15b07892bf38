use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use nm2symtab::elf_symtab::raw::Version;
use nm2symtab::{NmListing, NmTool, Options, Summary};
use tracing_subscriber::EnvFilter;

/// Encode the code and absolute symbols of an object into a symbol section of
/// a fixed size.
#[derive(Debug, Parser)]
struct Args {
    /// Object to list the symbols of.
    elf_path: PathBuf,

    /// Output file.
    dist_path: PathBuf,

    /// Size of the output in bytes, decimal or `0x` prefixed hex.
    #[arg(value_parser = parse_size)]
    section_size: u64,

    /// Print every symbol written to the section and a summary.
    #[arg(long, short)]
    verbose: bool,

    /// The `nm` compatible utility used to list symbols.
    #[arg(long, default_value = nm2symtab::tool::DEFAULT_NM)]
    nm: PathBuf,

    /// Read an existing symbol listing instead of running the utility. `-`
    /// reads from stdin. `elf_path` is not opened in this case.
    #[arg(long, value_name = "PATH")]
    listing: Option<PathBuf>,

    /// Entry format version to write.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=2))]
    format_version: u32,
}

fn parse_size(value: &str) -> Result<u64, String> {
    let parsed = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => value.parse(),
    };

    parsed.map_err(|e| format!("`{value}` is not a valid size: {e}"))
}

fn report<W: Write>(w: &mut W, summary: &Summary) -> io::Result<()> {
    writeln!(w, "symbols size: 0x{:018x}", summary.content_size)?;
    writeln!(w, "symbols entry num: {}", summary.entries)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if args.verbose { "info" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let listing = match &args.listing {
        Some(path) if path.as_os_str() == "-" => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("failed to read the symbol listing from stdin")?;
            NmListing::from_text(text)
        }
        Some(path) => NmListing::from_text(
            fs::read_to_string(path)
                .with_context(|| format!("failed to read `{}`", path.display()))?,
        ),
        None => NmTool::new(&args.nm)
            .run(&args.elf_path)
            .with_context(|| format!("failed to list the symbols of `{}`", args.elf_path.display()))?,
    };

    let options = Options::new(args.section_size)
        .version(Version(args.format_version))
        .verbose(args.verbose);
    let summary = nm2symtab::write_section_file(&args.dist_path, listing.lines(), &options)
        .with_context(|| format!("failed to create `{}`", args.dist_path.display()))?;

    if args.verbose {
        report(&mut io::stdout().lock(), &summary)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_accepts_decimal_and_hex() {
        assert_eq!(parse_size("4096"), Ok(4096));
        assert_eq!(parse_size("0x1000"), Ok(4096));
        assert_eq!(parse_size("0X1000"), Ok(4096));
        assert!(parse_size("4k").is_err());
        assert!(parse_size("-1").is_err());
    }

    #[test]
    fn report_format() {
        let summary = Summary {
            entries: 3,
            content_size: 0x6f,
            section_size: 0x1000,
            ..Default::default()
        };

        let mut out = Vec::new();
        report(&mut out, &summary).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "symbols size: 0x00000000000000006f\nsymbols entry num: 3\n"
        );
    }

    #[test]
    fn args_parse() {
        let args =
            Args::try_parse_from(["nm2symtab", "-v", "kernel.elf", "symbols.bin", "0x2000"]).unwrap();

        assert!(args.verbose);
        assert_eq!(args.section_size, 0x2000);
        assert_eq!(args.nm, PathBuf::from("rust-nm"));
        assert_eq!(args.format_version, 1);
        assert!(args.listing.is_none());

        assert!(Args::try_parse_from([
            "nm2symtab",
            "--format-version",
            "3",
            "kernel.elf",
            "symbols.bin",
            "64"
        ])
        .is_err());
    }
}
