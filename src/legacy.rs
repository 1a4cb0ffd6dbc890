//! Demangler for the legacy gcc 2.x (ARM/cfront style) mangling scheme.
//!
//! Legacy symbols embed the unmangled source name, a `__` separator, an
//! optional const marker and class specifier, and a linear run of
//! one-letter argument type codes. The whole scheme is handled by a
//! single-pass scanner over fixed tables; there is no AST.
//!
//! Classification is a guess: apart from the `C` const marker there is
//! nothing that distinguishes a method from a free function with a
//! qualified name, so every symbol with a `__<qualifier>` layout is
//! reported as a method.

use crate::abi::TypeTag;
use crate::buffer::NameBuffer;
use crate::error::Error;
use crate::input::Input;
use log::trace;

/// The enumerator refuses to skip more than this many arguments.
const MAX_ARGUMENTS: u32 = 32;

/// Skip qualifier letters in front of a type code. `Q` opens a class
/// specifier and stays; `F` opens a function signature, which has no named
/// end marker other than its `_` return-type separator.
fn ignore_qualifiers(arg: &mut Input) {
    while arg.peek(0).is_ascii_uppercase() {
        if arg.peek(0) == b'Q' {
            break;
        }
        if arg.peek(0) == b'F' {
            while !arg.is_at_end() && arg.peek(0) != b'_' {
                arg.skip(1);
            }
            if arg.is_at_end() {
                break;
            }
        }
        arg.skip(1);
    }
}

/// The type of the argument at `arg`, or None for codes the scheme cannot
/// express (`long double`, templates).
fn argument_type(mut arg: Input) -> Option<TypeTag> {
    match arg.peek(0) {
        kind @ (b'P' | b'R') => {
            // the leading P/R is consumed as a qualifier
            ignore_qualifiers(&mut arg);
            if arg.peek(0) == b'c' && kind == b'P' {
                return Some(TypeTag::ConstCharPointer);
            }
            if arg.peek(0) == b't' {
                // templates
                return None;
            }
            Some(if kind == b'P' {
                TypeTag::Pointer
            } else {
                TypeTag::Reference
            })
        }
        b'x' => Some(TypeTag::LongLong),
        b'l' => Some(TypeTag::Long),
        b'i' => Some(TypeTag::Int),
        b's' => Some(TypeTag::Short),
        b'c' => Some(TypeTag::Char),
        b'b' => Some(TypeTag::Bool),
        b'U' => Some(match arg.peek(1) {
            b'x' => TypeTag::UnsignedLongLong,
            b'l' => TypeTag::UnsignedLong,
            b'i' => TypeTag::UnsignedInt,
            b's' => TypeTag::UnsignedShort,
            b'c' => TypeTag::UnsignedChar,
            _ => TypeTag::UnsignedInt,
        }),
        b'f' => Some(TypeTag::Float),
        b'd' => Some(TypeTag::Double),
        // long double
        b'r' => None,
        // templates
        b't' => None,
        _ => Some(TypeTag::Unknown),
    }
}

/// `<digit>` or `<decimal> _` when more than one digit follows. With
/// `number_left` set, a `_` only delimits when a further number follows
/// it.
fn parse_number(arg: &mut Input, number_left: bool) -> u32 {
    let mut probe = *arg;
    while probe.peek(0).is_ascii_digit() {
        probe.skip(1);
    }

    if probe.peek(0) == b'_' && (!number_left || probe.peek(1).is_ascii_digit()) {
        let value = parse_decimal(arg);
        if arg.peek(0) == b'_' {
            arg.skip(1);
        }
        value
    } else {
        let value = u32::from(arg.peek(0)).wrapping_sub(u32::from(b'0'));
        arg.skip(1);
        value
    }
}

/// Decimal digit run, capped at the end of the input.
fn parse_decimal(arg: &mut Input) -> u32 {
    let mut value: u32 = 0;
    while arg.peek(0).is_ascii_digit() {
        value = value
            .wrapping_mul(10)
            .wrapping_add(u32::from(arg.peek(0) - b'0'));
        arg.skip(1);
    }
    value
}

/// `N <count> <index>`: repeat argument `index` a total of `count` times.
fn parse_repeats(arg: &mut Input) -> (u32, u32) {
    if arg.peek(0) != b'N' {
        return (0, 0);
    }
    arg.skip(1);

    let count = parse_number(arg, true);
    let index = parse_number(arg, false);
    (count, index)
}

fn skip_numbers(arg: &mut Input, count: u32) {
    // the leading N/T
    arg.skip(1);

    for remaining in (0..count).rev() {
        parse_number(arg, remaining != 0);
    }
}

/// Number of class-specifier components: `Q<digit>`, `Q_<decimal>_`, or a
/// bare length digit for a single component.
fn count_namespaces(mangled: &mut Input) -> u32 {
    let mut cursor = *mangled;
    let mut namespaces: u32 = 0;

    if cursor.peek(0) == b'Q' {
        if cursor.peek(1) == b'_' {
            // more than 9 components
            cursor.skip(2);
            namespaces = parse_decimal(&mut cursor);
            if cursor.peek(0) != b'_' {
                namespaces = 0;
            }
            cursor.skip(1);
        } else {
            namespaces = u32::from(cursor.peek(1)).wrapping_sub(u32::from(b'0'));
            cursor.skip(2);
        }
    } else if cursor.peek(0).is_ascii_digit() {
        return 1;
    }

    *mangled = cursor;
    namespaces
}

fn skip_namespaces(mangled: &mut Input) {
    let namespaces = count_namespaces(mangled);

    for _ in 0..namespaces {
        if !mangled.peek(0).is_ascii_digit() {
            break;
        }
        let length = parse_decimal(mangled);
        mangled.skip(length as usize);
    }
}

/// Whether the argument carries a class name the enumerator can print.
fn has_named_argument(mut arg: Input) -> bool {
    ignore_qualifiers(&mut arg);

    // anything else is a built-in type
    arg.peek(0) == b'Q' || arg.peek(0).is_ascii_digit()
}

/// Length of the argument at `arg`, with qualifiers and repeat codes
/// consumed from `arg` itself.
fn argument_length(arg: &mut Input) -> usize {
    if arg.peek(0) == b'N' {
        // repeats
        skip_numbers(arg, 2);
        return 0;
    }
    if arg.peek(0) == b'T' {
        // back-reference
        skip_numbers(arg, 1);
        return 0;
    }

    ignore_qualifiers(arg);

    if arg.is_at_end() {
        return 0;
    }

    // built-in types are one letter
    if arg.peek(0) != b'Q' && !arg.peek(0).is_ascii_digit() {
        return 1;
    }

    let mut mangled = *arg;
    skip_namespaces(&mut mangled);
    arg.chars_remaining() - mangled.chars_remaining()
}

fn advance_argument(mut arg: Input) -> Input {
    if arg.is_at_end() || arg.peek(0) == b'\0' {
        return arg;
    }

    let length = argument_length(&mut arg);
    arg.skip(length);
    arg
}

fn first_argument(mut mangled: Input) -> Input {
    skip_namespaces(&mut mangled);
    mangled
}

/// Find the `__` separator (right to left, rejected at the start), leave
/// `name` at the type encoding and report the source-name length and
/// whether the symbol looks like a method. A const marker still follows
/// for methods; templates (`H`) are rejected.
fn mangled_start(name: &mut Input) -> Option<(usize, bool)> {
    let bytes = name.as_bytes();
    if bytes.len() < 2 {
        return None;
    }

    let mut pos = bytes.len() - 1;
    let mut found = false;
    while pos > 1 {
        if bytes[pos] == b'_' {
            if bytes[pos - 1] == b'_' {
                found = true;
                name.skip(pos + 1);
                break;
            }
            pos -= 1;
        }
        pos -= 1;
    }

    if !found {
        return None;
    }

    if name.peek(0) == b'H' {
        // templates are not supported
        return None;
    }

    let symbol_length = pos - 1;

    if name.peek(0) == b'F' {
        name.skip(1);
        return Some((symbol_length, false));
    }

    Some((symbol_length, true))
}

fn get_next_argument_internal(
    cookie: &mut u32,
    symbol: &str,
    buffer: &mut NameBuffer,
    repeating: bool,
) -> Result<(TypeTag, usize), Error> {
    let mut mangled = Input::new(symbol.as_bytes());
    if mangled_start(&mut mangled).is_none() {
        return Err(Error::NotMangled);
    }
    // skip the const method marker
    mangled.skip_prefix(b'C');

    let mut arg = first_argument(mangled);

    // (void) is not an argument
    if arg.peek(0) == b'v' {
        return Err(Error::NoMoreArguments);
    }

    let current = *cookie;
    if current > MAX_ARGUMENTS {
        return Err(Error::TooManyArguments);
    }

    let mut index = 0;
    while index < current {
        arg = advance_argument(arg);
        if !arg.is_at_end() && arg.peek(0) == b'N' {
            // repeat argument 'count' times
            let (count, repeat_index) = parse_repeats(&mut arg);
            if current <= index + count {
                if repeating {
                    return Err(Error::RepeatLimit);
                }

                // it's a repeat case
                let mut repeat_cookie = repeat_index;
                let result =
                    get_next_argument_internal(&mut repeat_cookie, symbol, buffer, true)?;
                *cookie += 1;
                return Ok(result);
            }

            index += count.saturating_sub(1);
        }
        index += 1;
    }

    if arg.is_at_end() || arg.peek(0) == b'\0' {
        return Err(Error::NoMoreArguments);
    }

    // a repeat at the head of the list has nothing to repeat
    if arg.peek(0) == b'N' {
        return Err(Error::Invalid);
    }

    trace!(
        "arg {current}: {:?}",
        String::from_utf8_lossy(arg.as_bytes())
    );

    if arg.peek(0) == b'T' {
        // duplicate argument
        if repeating {
            return Err(Error::RepeatLimit);
        }

        arg.skip(1);
        let mut reference_cookie = parse_number(&mut arg, false);
        let result = get_next_argument_internal(&mut reference_cookie, symbol, buffer, true)?;
        *cookie += 1;
        return Ok(result);
    }

    *cookie += 1;

    let Some(tag) = argument_type(arg) else {
        return Err(Error::Unsupported);
    };
    let size = tag.suggested_size();

    if !has_named_argument(arg) {
        return Ok((tag, size));
    }

    let mut namespace_start = arg;
    ignore_qualifiers(&mut namespace_start);
    let mut namespaces = count_namespaces(&mut namespace_start);

    while namespaces > 0 {
        if namespace_start.peek(0) == b't' {
            // it's a template class after all
            return Err(Error::BadType);
        }
        if !namespace_start.peek(0).is_ascii_digit() {
            break;
        }

        let length = parse_decimal(&mut namespace_start);
        let take = (length as usize).min(namespace_start.chars_remaining());
        buffer.append_bytes(&namespace_start.as_bytes()[..take]);
        if namespaces > 1 {
            buffer.append("::");
        }
        namespace_start.skip(length as usize);
        namespaces -= 1;
    }

    Ok((tag, size))
}

/// Demangle a legacy symbol to its qualified name (without arguments) and
/// guess whether it is a method: the `C` const marker or any class
/// specifier counts, a `F` free-function marker does not.
pub fn demangle_symbol(mangled: &str, buffer: &mut NameBuffer) -> Result<bool, Error> {
    let mut name = Input::new(mangled.as_bytes());
    let Some((symbol_length, mut is_method)) = mangled_start(&mut name) else {
        return Err(Error::NotMangled);
    };

    if name.skip_prefix(b'C') {
        // const method
        is_method = true;
    }

    let mut namespace_start = name;
    let mut namespaces = count_namespaces(&mut namespace_start);

    while namespaces > 0 {
        if namespace_start.peek(0) == b't' {
            // it's a template class after all
            return Err(Error::NotMangled);
        }
        if !namespace_start.peek(0).is_ascii_digit() {
            break;
        }

        let length = parse_decimal(&mut namespace_start);
        let take = (length as usize).min(namespace_start.chars_remaining());
        buffer.append_bytes(&namespace_start.as_bytes()[..take]);
        buffer.append("::");
        namespace_start.skip(length as usize);
        namespaces -= 1;
    }

    // the source name, verbatim
    buffer.append_bytes(&mangled.as_bytes()[..symbol_length]);

    if buffer.had_overflow() {
        return Err(Error::BufferTooSmall);
    }

    Ok(is_method)
}

/// Enumerate the arguments of a legacy symbol. The cookie starts at zero
/// and advances on every successful call; the argument's display name (if
/// it has one) lands in `buffer`, completed with `*`/`&` for pointers and
/// references.
pub fn next_argument(
    cookie: &mut u32,
    mangled: &str,
    buffer: &mut NameBuffer,
) -> Result<(TypeTag, usize), Error> {
    let (tag, size) = get_next_argument_internal(cookie, mangled, buffer, false)?;

    // append the missing '*'/'&' for named pointer/reference types
    if !buffer.is_empty() && (tag == TypeTag::Pointer || tag == TypeTag::Reference) {
        buffer.append(if tag == TypeTag::Pointer { "*" } else { "&" });
    }

    if buffer.had_overflow() {
        return Err(Error::BufferTooSmall);
    }

    Ok((tag, size))
}
