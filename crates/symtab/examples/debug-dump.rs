use std::path::PathBuf;

use elf_symtab::{LittleEndian, Symtab};

fn main() {
    let path = std::env::args_os()
        .nth(1)
        .expect("USAGE: debug-dump <symbol section file>");
    let path = PathBuf::from(path);

    let data = std::fs::read(&path).expect("could not read symbol section file");
    let symtab = Symtab::<LittleEndian>::load(&data).expect("failed to parse symbol section");

    println!("{symtab:?}");
    for symbol in symtab.symbols() {
        println!("{:?}", symbol.expect("failed to decode symbol"));
    }
}
