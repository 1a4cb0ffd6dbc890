//! Front-end dispatch over the two demangling engines.
//!
//! Symbols that look like Itanium manglings (leading `_Z`) go to the
//! Itanium engine first; everything else, and everything that engine
//! rejects, falls back to the legacy gcc 2 engine.

use crate::abi::TypeTag;
use crate::buffer::NameBuffer;
use crate::error::Error;
use crate::{itanium, legacy};
use std::ffi::c_long;
use std::mem::size_of;

/// One enumerated argument: its semantic type tag and the suggested size
/// in bytes for reading it from a register or stack slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argument {
    pub tag: TypeTag,
    pub size: usize,
}

impl Default for Argument {
    fn default() -> Self {
        Self {
            tag: TypeTag::Unknown,
            size: 0,
        }
    }
}

fn looks_like_itanium(mangled: &str) -> bool {
    mangled.starts_with("_Z")
}

/// Demangle a whole symbol into `buffer` and classify it: the flag is
/// true when the symbol is a method on an object (best-effort guess for
/// the legacy scheme). When both engines reject the name, the caller may
/// display the original.
pub fn demangle_symbol<'a>(
    mangled: &str,
    buffer: &'a mut NameBuffer,
) -> Result<(&'a str, bool), Error> {
    if looks_like_itanium(mangled) {
        match itanium::demangle_symbol(mangled, buffer) {
            Ok(is_object_method) => return Ok((buffer.terminate(), is_object_method)),
            // an exhausted buffer is not a parse failure; retrying with
            // the legacy engine cannot help
            Err(Error::BufferTooSmall) => return Err(Error::BufferTooSmall),
            Err(_) => buffer.clear(),
        }
    }

    // fallback is the legacy engine
    let is_object_method = legacy::demangle_symbol(mangled, buffer)?;
    Ok((buffer.terminate(), is_object_method))
}

/// Enumerate the next argument of a mangled symbol. The caller initializes
/// the cookie to zero and passes it back unchanged on every call; the
/// argument's display name lands in `buffer`.
pub fn get_next_argument(
    cookie: &mut u32,
    mangled: &str,
    buffer: &mut NameBuffer,
) -> Result<Argument, Error> {
    if looks_like_itanium(mangled) {
        match itanium::parameter_info(mangled, *cookie, buffer) {
            Ok(info) => {
                *cookie += 1;
                return Ok(Argument {
                    tag: info.tag,
                    size: info.tag.suggested_size(),
                });
            }
            // end of the parameter list and buffer exhaustion are final
            // for an Itanium symbol
            Err(error @ (Error::InvalidParameterIndex | Error::BufferTooSmall)) => {
                return Err(error);
            }
            Err(_) => buffer.clear(),
        }
    }

    let (tag, size) = legacy::next_argument(cookie, mangled, buffer)?;
    Ok(Argument { tag, size })
}

/// Iterator over the arguments of a mangled symbol.
#[derive(Debug)]
pub struct Arguments<'a> {
    mangled: &'a str,
    cookie: u32,
    done: bool,
}

impl Iterator for Arguments<'_> {
    type Item = Result<(String, Argument), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut buffer = NameBuffer::new(1024);
        match get_next_argument(&mut self.cookie, self.mangled, &mut buffer) {
            Ok(argument) => Some(Ok((buffer.terminate().to_string(), argument))),
            Err(Error::NoMoreArguments | Error::InvalidParameterIndex) => {
                self.done = true;
                None
            }
            Err(error) => {
                self.done = true;
                Some(Err(error))
            }
        }
    }
}

/// Iterate the arguments of `mangled`, ending cleanly at the end of the
/// parameter list and yielding the first hard error, if any.
#[must_use]
pub fn arguments(mangled: &str) -> Arguments<'_> {
    Arguments {
        mangled,
        cookie: 0,
        done: false,
    }
}

/// Fallback spelling for a legacy argument without a class name. The
/// legacy codes report fixed-width integer tags, so `char` arguments show
/// up as `int8` here.
fn legacy_tag_lexeme(tag: TypeTag) -> &'static str {
    let long_is_32 = size_of::<c_long>() == 4;
    match tag {
        TypeTag::Unknown => "",
        TypeTag::LongLong => "int64",
        TypeTag::Long => {
            if long_is_32 {
                "int32"
            } else {
                "int64"
            }
        }
        TypeTag::Int => "int32",
        TypeTag::Short => "int16",
        TypeTag::Char => "int8",
        TypeTag::UnsignedLongLong => "uint64",
        TypeTag::UnsignedLong => {
            if long_is_32 {
                "uint32"
            } else {
                "uint64"
            }
        }
        TypeTag::UnsignedInt => "uint32",
        TypeTag::UnsignedShort => "uint16",
        TypeTag::UnsignedChar => "uint8",
        TypeTag::Bool => "bool",
        TypeTag::Float => "float",
        TypeTag::Double => "double",
        TypeTag::Pointer => "void*",
        TypeTag::Reference => "&",
        TypeTag::ConstCharPointer => "char*",
        _ => "?",
    }
}

/// Demangle a symbol to a full signature. Itanium symbols use the full
/// renderer; legacy symbols combine the name with the enumerated argument
/// list, falling back to tag spellings for unnamed arguments. A name
/// neither engine accepts is returned unchanged.
#[must_use]
pub fn demangle_full_signature(mangled: &str) -> String {
    let mut buffer = NameBuffer::new(1024);

    if looks_like_itanium(mangled) {
        if itanium::demangle_name(mangled, &mut buffer).is_ok() {
            return buffer.terminate().to_string();
        }
        buffer.clear();
    }

    if legacy::demangle_symbol(mangled, &mut buffer).is_err() {
        // name not mangled
        return mangled.to_string();
    }

    let mut signature = buffer.terminate().to_string();
    signature.push('(');

    let mut cookie = 0;
    let mut argument_buffer = NameBuffer::new(1024);
    let mut first = true;
    loop {
        argument_buffer.clear();
        let Ok((tag, _)) = legacy::next_argument(&mut cookie, mangled, &mut argument_buffer)
        else {
            break;
        };

        if !first {
            signature.push_str(", ");
        }
        first = false;

        let name = argument_buffer.terminate();
        if !name.is_empty() {
            signature.push_str(name);
        } else {
            signature.push_str(legacy_tag_lexeme(tag));
        }
    }

    signature.push(')');
    signature
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_prefers_itanium() {
        let mut buffer = NameBuffer::new(256);
        let (name, is_method) = demangle_symbol("_ZN3foo3barEv", &mut buffer).unwrap();
        assert_eq!(name, "foo::bar");
        assert!(is_method);
    }

    #[test]
    fn dispatch_falls_back_to_legacy() {
        let mut buffer = NameBuffer::new(256);
        let (name, is_method) = demangle_symbol("SetTo__9BDirectoryP9BVolumePc", &mut buffer).unwrap();
        assert_eq!(name, "BDirectory::SetTo");
        assert!(is_method);
    }

    #[test]
    fn unmangled_name_is_an_error() {
        let mut buffer = NameBuffer::new(256);
        assert_eq!(
            demangle_symbol("already plain", &mut buffer),
            Err(Error::NotMangled)
        );
    }

    #[test]
    fn argument_iterator_counts_parameters() {
        let collected: Vec<_> = arguments("_Z3fooiPKc").map(Result::unwrap).collect();
        assert_eq!(collected.len(), 2);
        assert_eq!(collected[0].0, "int");
        assert_eq!(collected[1].0, "char const*");
        assert_eq!(collected[1].1.tag, TypeTag::ConstCharPointer);

        assert_eq!(arguments("_ZN3foo3barEv").count(), 0);
    }

    #[test]
    fn full_signature_for_both_schemes() {
        assert_eq!(
            demangle_full_signature("_ZN8BPrivate9IconCache8SyncDrawEPNS_5ModelEP5BView6BPointNS_12IconDrawModeE9icon_sizePFvS4_S5_P7BBitmapPvESA_"),
            "BPrivate::IconCache::SyncDraw(BPrivate::Model*, BView*, BPoint, \
             BPrivate::IconDrawMode, icon_size, void (*)(BView*, BPoint, BBitmap*, void*), void*)"
        );
        assert_eq!(
            demangle_full_signature("SyncDraw__Q28BPrivate9IconCachePQ28BPrivate5ModelP5BViewG6BPointQ28BPrivate12IconDrawMode9icon_sizePFP5BViewG6BPointP7BBitmapPv_vPv"),
            "BPrivate::IconCache::SyncDraw(BPrivate::Model*, BView*, BPoint, \
             BPrivate::IconDrawMode, icon_size, void*, void*)"
        );
        // unmangled input comes back unchanged
        assert_eq!(demangle_full_signature("main"), "main");
    }
}
