//! Module binding for debugger hosts.
//!
//! The engine is exposed as a two-field hook table next to the usual
//! init/uninit lifecycle entry, with errors translated to the host's
//! numeric status convention.

use crate::buffer::NameBuffer;
use crate::demangle::{self, Argument};
use crate::error::Error;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Host status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(i32)]
pub enum Status {
    Ok = 0,
    GeneralError = -1,
    BadValue = -2,
    BadIndex = -3,
    BadType = -4,
    NoMemory = -5,
    NotSupported = -6,
    BufferOverflow = -7,
    EntryNotFound = -8,
    TooManyArguments = -9,
    LinkLimit = -10,
}

impl From<Error> for Status {
    fn from(error: Error) -> Self {
        match error {
            Error::NotMangled | Error::Invalid => Status::BadValue,
            Error::Unsupported => Status::NotSupported,
            Error::BufferTooSmall => Status::BufferOverflow,
            Error::NoMemory => Status::NoMemory,
            Error::InvalidParameterIndex => Status::BadIndex,
            Error::NoMoreArguments => Status::EntryNotFound,
            Error::TooManyArguments => Status::TooManyArguments,
            Error::RepeatLimit => Status::LinkLimit,
            Error::BadType => Status::BadType,
            Error::Internal => Status::GeneralError,
        }
    }
}

/// Lifecycle operations the host drives through [`std_ops`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(i32)]
pub enum ModuleOp {
    Init = 1,
    Uninit = 2,
}

/// Standard module lifecycle hook: init and uninit succeed, everything
/// else is rejected.
pub fn std_ops(op: i32) -> Status {
    match ModuleOp::try_from(op) {
        Ok(ModuleOp::Init | ModuleOp::Uninit) => Status::Ok,
        Err(_) => Status::BadValue,
    }
}

pub type DemangleSymbolHook =
    fn(mangled: &str, buffer: &mut NameBuffer, is_object_method: &mut bool) -> Status;

pub type NextArgumentHook =
    fn(cookie: &mut u32, mangled: &str, buffer: &mut NameBuffer, argument: &mut Argument) -> Status;

/// The module table a debugger host loads.
#[derive(Debug, Clone, Copy)]
pub struct DemanglerModule {
    pub name: &'static str,
    pub std_ops: fn(i32) -> Status,
    pub demangle_symbol: DemangleSymbolHook,
    pub next_argument: NextArgumentHook,
}

fn demangle_symbol_hook(mangled: &str, buffer: &mut NameBuffer, is_object_method: &mut bool) -> Status {
    match demangle::demangle_symbol(mangled, buffer) {
        Ok((_, method)) => {
            *is_object_method = method;
            Status::Ok
        }
        Err(error) => error.into(),
    }
}

fn next_argument_hook(
    cookie: &mut u32,
    mangled: &str,
    buffer: &mut NameBuffer,
    argument: &mut Argument,
) -> Status {
    match demangle::get_next_argument(cookie, mangled, buffer) {
        Ok(result) => {
            *argument = result;
            Status::Ok
        }
        Err(error) => error.into(),
    }
}

pub static MODULE: DemanglerModule = DemanglerModule {
    name: "debugger/demangle/v1",
    std_ops,
    demangle_symbol: demangle_symbol_hook,
    next_argument: next_argument_hook,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::TypeTag;

    #[test]
    fn lifecycle_ops() {
        assert_eq!((MODULE.std_ops)(ModuleOp::Init.into()), Status::Ok);
        assert_eq!((MODULE.std_ops)(ModuleOp::Uninit.into()), Status::Ok);
        assert_eq!((MODULE.std_ops)(99), Status::BadValue);
    }

    #[test]
    fn hooks_round_trip() {
        let mut buffer = NameBuffer::new(256);
        let mut is_object_method = false;
        let status = (MODULE.demangle_symbol)("_ZN3foo3barEv", &mut buffer, &mut is_object_method);
        assert_eq!(status, Status::Ok);
        assert_eq!(buffer.terminate(), "foo::bar");
        assert!(is_object_method);

        let mut cookie = 0;
        let mut argument = Argument::default();
        let mut buffer = NameBuffer::new(256);
        let status = (MODULE.next_argument)(&mut cookie, "_Z3fooiPKc", &mut buffer, &mut argument);
        assert_eq!(status, Status::Ok);
        assert_eq!(argument.tag, TypeTag::Int);
        assert_eq!(cookie, 1);
    }

    #[test]
    fn status_mapping() {
        let mut buffer = NameBuffer::new(256);
        let mut is_object_method = false;
        assert_eq!(
            (MODULE.demangle_symbol)("unmangled", &mut buffer, &mut is_object_method),
            Status::BadValue
        );

        let mut cookie = 0;
        let mut argument = Argument::default();
        let mut buffer = NameBuffer::new(256);
        assert_eq!(
            (MODULE.next_argument)(&mut cookie, "_ZN3foo3barEv", &mut buffer, &mut argument),
            Status::BadIndex
        );
    }
}
