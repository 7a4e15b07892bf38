use std::fs;
use std::io::Cursor;

use elf_symtab::raw::Version;
use elf_symtab::write::EmitError;
use elf_symtab::{LittleEndian, Symtab};
use nm2symtab::{
    convert, convert_with_echo, write_section_file, write_section_file_with_echo, Error, Options,
    SymbolFilter,
};

const LISTING: &str = "\
0000000000001000 0000000000000010 T foo
0000000000002000 0000000000000020 D bar
";

#[test]
fn filters_and_pads() -> anyhow::Result<()> {
    let (sink, summary) = convert(LISTING.lines(), Cursor::new(Vec::new()), &Options::new(64))?;
    let data = sink.into_inner();

    assert_eq!(data.len(), 64);
    assert_eq!(summary.entries, 1);
    assert_eq!(summary.filtered, 1);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.content_size, 44);
    assert_eq!(summary.section_size, 64);

    let symtab = Symtab::<LittleEndian>::load(&data)?;
    assert_eq!(symtab.num_entries(), 1);
    assert_eq!(symtab.total_size(), 64);

    let symbol = symtab.symbols().next().unwrap()?;
    assert_eq!(symbol.address(), 0x1000);
    assert_eq!(symbol.size(), 0x10);
    assert_eq!(symbol.name(), b"foo");

    assert!(data[44..].iter().all(|&b| b == 0));

    Ok(())
}

#[test]
fn too_small_section_is_an_error() {
    let err = convert(LISTING.lines(), Cursor::new(Vec::new()), &Options::new(40)).unwrap_err();

    assert!(
        matches!(
            err,
            Error::Emit(EmitError::SectionTooSmall {
                required: 44,
                available: 40
            })
        ),
        "{err:?}"
    );
}

const NOISY_LISTING: &str = "\

libkernel.a:kernel-0123.o:
0000000080200000 000000000000001a t _start
0000000080200020 0000000000000004 U undefined_here
0000000080201000 0000000000000008 W weak_thing
garbage line

0000000000000000 0000000000000000 A __abs_zero
0000000080202000 0000000000000100 T kmain
ffffffffffffffff xyz T broken
0000000080203000 0000000000000008 d local_data
";

#[test]
fn noisy_listing() -> anyhow::Result<()> {
    let (sink, summary) = convert(
        NOISY_LISTING.lines(),
        Cursor::new(Vec::new()),
        &Options::new(4096),
    )?;
    let data = sink.into_inner();

    assert_eq!(summary.entries, 3);
    assert_eq!(summary.filtered, 3);
    assert_eq!(summary.skipped, 4);

    let symtab = Symtab::<LittleEndian>::load(&data)?;
    let names = symtab
        .symbols()
        .map(|s| s.map(|s| s.name_str().unwrap().to_owned()))
        .collect::<Result<Vec<_>, _>>()?;

    assert_eq!(names, ["_start", "__abs_zero", "kmain"]);

    Ok(())
}

#[test]
fn custom_filter_and_version() -> anyhow::Result<()> {
    let options = Options::new(128)
        .filter(SymbolFilter::new(['D']))
        .version(Version::V2);
    let (sink, summary) = convert(LISTING.lines(), Cursor::new(Vec::new()), &options)?;
    let data = sink.into_inner();

    assert_eq!(summary.entries, 1);

    let symtab = Symtab::<LittleEndian>::load(&data)?;
    assert_eq!(symtab.version(), Version::V2);
    assert_eq!(symtab.symbols().next().unwrap()?.name(), b"bar");

    Ok(())
}

#[test]
fn writes_exact_size_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("symbols.bin");

    let summary = write_section_file(&path, LISTING.lines(), &Options::new(0x100))?;
    assert_eq!(summary.entries, 1);

    let data = fs::read(&path)?;
    assert_eq!(data.len(), 0x100);

    let symtab = Symtab::<LittleEndian>::load(&data)?;
    assert_eq!(symtab.total_size(), 0x100);
    assert!(symtab.padding_is_zeroed()?);

    Ok(())
}

#[test]
fn failed_conversion_leaves_no_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("symbols.bin");

    let err = write_section_file(&path, LISTING.lines(), &Options::new(40)).unwrap_err();
    assert!(matches!(err, Error::Emit(_)), "{err:?}");

    assert!(!path.exists());
    assert_eq!(fs::read_dir(dir.path())?.count(), 0);

    Ok(())
}

#[test]
fn failed_conversion_keeps_previous_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("symbols.bin");
    fs::write(&path, b"previous")?;

    assert!(write_section_file(&path, LISTING.lines(), &Options::new(40)).is_err());
    assert_eq!(fs::read(&path)?, b"previous");

    Ok(())
}

#[test]
fn verbose_echoes_accepted_symbols() -> anyhow::Result<()> {
    let mut echo = Vec::new();
    let options = Options::new(4096).verbose(true);
    convert_with_echo(
        NOISY_LISTING.lines(),
        Cursor::new(Vec::new()),
        &options,
        &mut echo,
    )?;

    assert_eq!(
        String::from_utf8(echo)?,
        "\
0x000000000080200000, 0x00000000000000001a, _start
0x000000000000000000, 0x000000000000000000, __abs_zero
0x000000000080202000, 0x000000000000000100, kmain
"
    );

    Ok(())
}

#[test]
fn quiet_conversion_echoes_nothing() -> anyhow::Result<()> {
    let mut echo = Vec::new();
    convert_with_echo(
        NOISY_LISTING.lines(),
        Cursor::new(Vec::new()),
        &Options::new(4096),
        &mut echo,
    )?;

    assert!(echo.is_empty());

    Ok(())
}

#[test]
fn name_with_zero_byte_is_skipped() -> anyhow::Result<()> {
    let listing = "\
0000000000001000 0000000000000010 T foo
0000000000002000 0000000000000010 T bad\0name
";
    let (sink, summary) = convert(listing.lines(), Cursor::new(Vec::new()), &Options::new(64))?;

    assert_eq!(summary.entries, 1);
    assert_eq!(summary.skipped, 1);

    let data = sink.into_inner();
    let symtab = Symtab::<LittleEndian>::load(&data)?;
    assert_eq!(symtab.symbols().next().unwrap()?.name(), b"foo");

    Ok(())
}

#[cfg(unix)]
#[test]
fn new_file_gets_default_permissions() -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("symbols.bin");
    let plain = dir.path().join("plain.bin");

    write_section_file_with_echo(
        &path,
        LISTING.lines(),
        &Options::new(64),
        &mut std::io::sink(),
    )?;
    fs::write(&plain, b"plain")?;

    let mode = fs::metadata(&path)?.permissions().mode() & 0o777;
    let plain_mode = fs::metadata(&plain)?.permissions().mode() & 0o777;
    assert_eq!(mode, plain_mode, "{mode:o} != {plain_mode:o}");

    Ok(())
}

#[cfg(unix)]
#[test]
fn replaced_file_keeps_its_permissions() -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("symbols.bin");
    fs::write(&path, b"previous")?;
    fs::set_permissions(&path, fs::Permissions::from_mode(0o640))?;

    write_section_file(&path, LISTING.lines(), &Options::new(64))?;

    assert_eq!(fs::read(&path)?.len(), 64);
    assert_eq!(fs::metadata(&path)?.permissions().mode() & 0o777, 0o640);

    Ok(())
}
