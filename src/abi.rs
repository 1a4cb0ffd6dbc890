//! Fixed tables from the two mangling ABIs: built-in type tags, CV
//! qualifiers, type modifiers and the operator table.
//!
//! Everything here is immutable data shared by the parsers and the
//! argument enumerator.

use bitflags::bitflags;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::ffi::{c_int, c_long};
use std::mem::size_of;

/// Semantic tag of a demangled argument type.
///
/// The first block mirrors the Itanium `<builtin-type>` production; the
/// tail holds the composite tags used to report aggregate arguments to the
/// enumerator even when the element type is unknown. The legacy scheme
/// maps its coarser code set into the same enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum TypeTag {
    Ellipsis,
    Void,
    WcharT,
    Bool,
    Char,
    SignedChar,
    UnsignedChar,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    LongLong,
    UnsignedLongLong,
    Int128,
    UnsignedInt128,
    Float,
    Double,
    LongDouble,
    Float128,
    /// IEEE 754r decimal floating point (16 bits)
    DFloat16,
    /// IEEE 754r decimal floating point (32 bits)
    DFloat32,
    /// IEEE 754r decimal floating point (64 bits)
    DFloat64,
    /// IEEE 754r decimal floating point (128 bits)
    DFloat128,
    Char16T,
    Char32T,

    Unknown,
    ConstCharPointer,
    Pointer,
    Reference,
}

impl TypeTag {
    /// The rendered spelling of the type.
    #[must_use]
    pub fn lexeme(self) -> &'static str {
        match self {
            Self::Ellipsis => "...",
            Self::Void => "void",
            Self::WcharT => "wchar_t",
            Self::Bool => "bool",
            Self::Char => "char",
            Self::SignedChar => "signed char",
            Self::UnsignedChar => "unsigned char",
            Self::Short => "short",
            Self::UnsignedShort => "unsigned short",
            Self::Int => "int",
            Self::UnsignedInt => "unsigned int",
            Self::Long => "long",
            Self::UnsignedLong => "unsigned long",
            Self::LongLong => "long long",
            Self::UnsignedLongLong => "unsigned long long",
            Self::Int128 => "__int128",
            Self::UnsignedInt128 => "unsigned __int128",
            Self::Float => "float",
            Self::Double => "double",
            Self::LongDouble => "long double",
            Self::Float128 => "__float128",
            Self::DFloat16 => "__dfloat16",
            Self::DFloat32 => "__dfloat32",
            Self::DFloat64 => "__dfloat64",
            Self::DFloat128 => "__dfloat128",
            Self::Char16T => "char16_t",
            Self::Char32T => "char32_t",
            Self::Unknown => "?",
            Self::ConstCharPointer => "char const*",
            Self::Pointer => "void*",
            Self::Reference => "void&",
        }
    }

    /// Suggested size in bytes for reading an argument of this type from a
    /// register or stack slot. Pointer-like tags report the host pointer
    /// width; everything is rounded up to int-width argument alignment.
    #[must_use]
    pub fn suggested_size(self) -> usize {
        let size = match self {
            Self::Bool | Self::Char | Self::SignedChar | Self::UnsignedChar => 1,
            Self::Short | Self::UnsignedShort | Self::Char16T | Self::WcharT | Self::DFloat16 => 2,
            Self::Int | Self::UnsignedInt | Self::Char32T | Self::DFloat32 => 4,
            Self::Long | Self::UnsignedLong => size_of::<c_long>(),
            Self::LongLong | Self::UnsignedLongLong | Self::DFloat64 => 8,
            Self::Int128 | Self::UnsignedInt128 => 16,
            Self::Float => size_of::<f32>(),
            Self::Double => size_of::<f64>(),
            Self::LongDouble | Self::Float128 | Self::DFloat128 => 16,
            Self::ConstCharPointer | Self::Pointer | Self::Reference => size_of::<usize>(),
            Self::Ellipsis | Self::Void | Self::Unknown => size_of::<c_int>(),
        };
        size.max(size_of::<c_int>())
    }
}

bitflags! {
    /// `<CV-qualifiers> ::= [r] [V] [K]`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CvQualifiers: u8 {
        const RESTRICT = 0x1;
        const VOLATILE = 0x2;
        const CONST = 0x4;
    }
}

/// A type tag together with the CV qualifiers collected around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeInfo {
    pub tag: TypeTag,
    pub cv: CvQualifiers,
}

impl TypeInfo {
    #[must_use]
    pub fn new(tag: TypeTag) -> Self {
        Self {
            tag,
            cv: CvQualifiers::empty(),
        }
    }

    #[must_use]
    pub fn qualified(self, cv: CvQualifiers) -> Self {
        Self {
            tag: self.tag,
            cv: self.cv | cv,
        }
    }
}

impl Default for TypeInfo {
    fn default() -> Self {
        Self::new(TypeTag::Unknown)
    }
}

/// `P`, `R`, `O`, `C`, `G` type decorations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeModifier {
    Pointer,
    Reference,
    RvalueReference,
    Complex,
    Imaginary,
}

impl TypeModifier {
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Pointer => "*",
            Self::Reference => "&",
            Self::RvalueReference => "&&",
            Self::Complex => " complex",
            Self::Imaginary => " imaginary",
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OperatorFlags: u8 {
        /// The first argument of the operator expression is a type.
        const TYPE_PARAM = 0x01;
        /// The operator is always a member function.
        const IS_MEMBER = 0x02;
    }
}

/// One entry of the `<operator-name>` table.
#[derive(Debug)]
pub struct OperatorInfo {
    /// Two-letter mangled form.
    pub mangled: &'static str,
    /// Printed form, without the `operator` keyword.
    pub name: &'static str,
    /// Fixed argument count, -1 for variadic.
    pub arity: i8,
    pub flags: OperatorFlags,
}

impl OperatorInfo {
    /// Whether the printed form reads like an identifier rather than a
    /// symbol, which decides prefix vs infix rendering and the spacing
    /// after `operator`.
    #[must_use]
    pub fn is_identifier(&self) -> bool {
        self.name
            .as_bytes()
            .first()
            .is_some_and(|c| c.is_ascii_alphabetic() || *c == b'_')
    }
}

/// The operator table, matched by prefix in order. The unary `ps`, `ng`,
/// `ad` and `de` forms precede their binary spellings.
pub static OPERATORS: &[OperatorInfo] = &[
    OperatorInfo { mangled: "nw", name: "new", arity: -1, flags: OperatorFlags::IS_MEMBER },
    OperatorInfo { mangled: "na", name: "new[]", arity: -1, flags: OperatorFlags::IS_MEMBER },
    OperatorInfo { mangled: "dl", name: "delete", arity: -1, flags: OperatorFlags::IS_MEMBER },
    OperatorInfo { mangled: "da", name: "delete[]", arity: -1, flags: OperatorFlags::IS_MEMBER },
    OperatorInfo { mangled: "ps", name: "+", arity: 1, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "ng", name: "-", arity: 1, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "ad", name: "&", arity: 1, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "de", name: "*", arity: 1, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "co", name: "~", arity: 1, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "pl", name: "+", arity: 2, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "mi", name: "-", arity: 2, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "ml", name: "*", arity: 2, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "dv", name: "/", arity: 2, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "rm", name: "%", arity: 2, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "an", name: "&", arity: 2, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "or", name: "|", arity: 2, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "eo", name: "^", arity: 2, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "aS", name: "=", arity: 2, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "pL", name: "+=", arity: 2, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "mI", name: "-=", arity: 2, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "mL", name: "*=", arity: 2, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "dV", name: "/=", arity: 2, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "rM", name: "%=", arity: 2, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "aN", name: "&=", arity: 2, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "oR", name: "|=", arity: 2, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "eO", name: "^=", arity: 2, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "ls", name: "<<", arity: 2, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "rs", name: ">>", arity: 2, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "lS", name: "<<=", arity: 2, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "rS", name: ">>=", arity: 2, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "eq", name: "==", arity: 2, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "ne", name: "!=", arity: 2, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "lt", name: "<", arity: 2, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "gt", name: ">", arity: 2, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "le", name: "<=", arity: 2, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "ge", name: ">=", arity: 2, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "nt", name: "!", arity: 1, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "aa", name: "&&", arity: 2, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "oo", name: "||", arity: 2, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "pp", name: "++", arity: 1, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "mm", name: "--", arity: 1, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "cm", name: ",", arity: -1, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "pm", name: "->*", arity: 2, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "pt", name: "->", arity: 2, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "cl", name: "()", arity: -1, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "ix", name: "[]", arity: -1, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "qu", name: "?", arity: 3, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "st", name: "sizeof", arity: 1, flags: OperatorFlags::TYPE_PARAM },
    OperatorInfo { mangled: "sz", name: "sizeof", arity: 1, flags: OperatorFlags::empty() },
    OperatorInfo { mangled: "at", name: "alignof", arity: 1, flags: OperatorFlags::TYPE_PARAM },
    OperatorInfo { mangled: "az", name: "alignof", arity: 1, flags: OperatorFlags::empty() },
];

/// Find the table entry matching the start of `input`.
#[must_use]
pub fn find_operator(input: &[u8]) -> Option<&'static OperatorInfo> {
    OPERATORS
        .iter()
        .find(|info| input.starts_with(info.mangled.as_bytes()))
}

#[test]
fn test_operator_lookup() {
    assert_eq!(find_operator(b"nwXYZ").unwrap().name, "new");
    // unary minus precedes anything else starting with 'n' except new/new[]
    assert_eq!(find_operator(b"ngE").unwrap().arity, 1);
    // assignment is case sensitive
    assert_eq!(find_operator(b"aSrest").unwrap().name, "=");
    assert_eq!(find_operator(b"aNx").unwrap().name, "&=");
    assert!(find_operator(b"zz").is_none());
    assert!(find_operator(b"n").is_none());
}

#[test]
fn test_suggested_sizes() {
    assert_eq!(TypeTag::Pointer.suggested_size(), size_of::<usize>());
    assert_eq!(TypeTag::ConstCharPointer.suggested_size(), size_of::<usize>());
    // int-width alignment floor
    assert_eq!(TypeTag::Bool.suggested_size(), size_of::<c_int>());
    assert_eq!(TypeTag::LongLong.suggested_size(), 8);
}
