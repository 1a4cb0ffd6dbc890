use std::{error, fmt};

/// Demangling errors, shared by both engines and the dispatch layer.
///
/// Inside a parse the first error wins; later failures never overwrite it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The input does not look like a symbol of the scheme at hand.
    NotMangled,
    /// Grammar violation, truncation or trailing garbage.
    Invalid,
    /// A production the engine deliberately does not handle.
    Unsupported,
    /// The output buffer latched its overflow flag.
    BufferTooSmall,
    /// The AST arena refused to grow further.
    NoMemory,
    /// A render hook failed after a successful parse.
    Internal,
    /// The argument index lies outside the function's parameter list.
    InvalidParameterIndex,
    /// Argument enumeration reached the end of the list (legacy engine).
    NoMoreArguments,
    /// The legacy enumerator caps symbols at 32 arguments.
    TooManyArguments,
    /// A legacy repeat or back-reference resolved to another one.
    RepeatLimit,
    /// A legacy namespace component turned out to be a template.
    BadType,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotMangled => "symbol is not mangled",
            Self::Invalid => "invalid mangled symbol",
            Self::Unsupported => "unsupported mangling production",
            Self::BufferTooSmall => "output buffer too small",
            Self::NoMemory => "out of node memory",
            Self::Internal => "internal demangler error",
            Self::InvalidParameterIndex => "invalid parameter index",
            Self::NoMoreArguments => "no more arguments",
            Self::TooManyArguments => "too many arguments",
            Self::RepeatLimit => "chained argument back-reference",
            Self::BadType => "bad argument type",
        })
    }
}

impl error::Error for Error {}
