//! `c++filt`-style symbol filter.
//!
//! Demangles every argument, or every whitespace-separated token read
//! from stdin when no arguments are given.

use std::io::{self, BufRead};

use cxx_demangle::demangle_full_signature;

fn main() -> io::Result<()> {
    let symbols: Vec<String> = std::env::args().skip(1).collect();

    if !symbols.is_empty() {
        for symbol in symbols {
            println!("{}", demangle_full_signature(&symbol));
        }
        return Ok(());
    }

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let demangled: Vec<String> = line
            .split_whitespace()
            .map(demangle_full_signature)
            .collect();
        println!("{}", demangled.join(" "));
    }

    Ok(())
}
