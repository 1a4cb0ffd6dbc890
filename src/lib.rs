//! C++ symbol demangler for gcc 2 (ARM/cfront style) and gcc 3+ (Itanium
//! C++ ABI) manglings.
//!
//! Two engines share one output convention: [`itanium`] parses the
//! recursive Itanium grammar into a per-call AST, [`legacy`] is a linear
//! scanner over the old gcc 2 type codes. [`demangle_symbol`] dispatches
//! between them, trying the Itanium engine for `_Z`-prefixed names first
//! and falling back to the legacy one.
//!
//! ```
//! use cxx_demangle::{demangle_symbol, NameBuffer};
//!
//! let mut buffer = NameBuffer::new(1024);
//! let (name, is_method) = demangle_symbol("_ZN3foo3barEv", &mut buffer).unwrap();
//! assert_eq!(name, "foo::bar");
//! assert!(is_method);
//! ```

/// Fixed ABI tables: type tags, CV qualifiers, the operator table
pub mod abi;
/// AST arena of the Itanium demangler
pub mod ast;
/// Fixed-capacity output writer
pub mod buffer;
mod demangle;
mod error;
/// Bounded input cursor
pub mod input;
/// Itanium C++ ABI demangler (gcc 3 and later)
pub mod itanium;
/// Legacy gcc 2 demangler
pub mod legacy;
/// Module binding for debugger hosts
pub mod module;

pub use self::abi::TypeTag;
pub use self::buffer::NameBuffer;
pub use self::demangle::{
    arguments, demangle_full_signature, demangle_symbol, get_next_argument, Argument, Arguments,
};
pub use self::error::Error;
pub use self::input::Input;
