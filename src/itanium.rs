//! Demangler for Itanium C++ ABI symbols (gcc 3 and later).
//!
//! Grammar reference: <http://www.codesourcery.com/public/cxx-abi/abi.html>
//!
//! The parser is a straight recursive descent over the grammar. All nodes
//! live in a per-call arena; back-references (`S…`) resolve against the
//! ordered list of referenceable nodes, and template parameters (`T…`)
//! against the innermost templatized name, which is saved and restored
//! around every function signature parse.

use crate::abi::{self, CvQualifiers, OperatorFlags, TypeInfo, TypeModifier, TypeTag};
use crate::ast::{Arena, Dimension, NodeId, NodeKind, ObjectType};
use crate::buffer::NameBuffer;
use crate::error::Error;
use crate::input::Input;
use log::trace;

/// Parse failure sentinel; the actual error sits in the demangler's error
/// slot, where the first failure wins.
struct Fail;

type Parse<T> = Result<T, Fail>;

/// Arena headroom beyond the per-byte node allowance. Every grammar
/// production consumes input, so node count is linear in the input length;
/// the slack covers the fixed expansions (std:: aliases, wrapper nodes).
const NODE_LIMIT_PER_BYTE: usize = 4;
const NODE_LIMIT_SLACK: usize = 64;

struct Demangler<'input> {
    input: Input<'input>,
    version_suffix: Option<&'input [u8]>,
    error: Option<Error>,
    arena: Arena<'input>,
    referenceable: Vec<NodeId>,
    templatized_node: Option<NodeId>,
}

impl<'input> Demangler<'input> {
    fn new(mangled: &'input str) -> Self {
        // ignore a version suffix ("@@GLIBCXX..." style) while demangling;
        // it is re-appended verbatim on success
        let bytes = mangled.as_bytes();
        let (main, version_suffix) = match bytes.iter().position(|&b| b == b'@') {
            Some(at) => (&bytes[..at], Some(&bytes[at..])),
            None => (bytes, None),
        };

        Self {
            input: Input::new(main),
            version_suffix,
            error: None,
            arena: Arena::new(NODE_LIMIT_PER_BYTE * main.len() + NODE_LIMIT_SLACK),
            referenceable: Vec::new(),
            templatized_node: None,
        }
    }

    fn fail<T>(&mut self, error: Error) -> Parse<T> {
        if self.error.is_none() {
            trace!(
                "demangle error {error:?}, remaining input: {:?}",
                String::from_utf8_lossy(self.input.as_bytes())
            );
            self.error = Some(error);
        }
        Err(Fail)
    }

    fn alloc(&mut self, kind: NodeKind<'input>) -> Parse<NodeId> {
        match self.arena.alloc(kind) {
            Some(id) => Ok(id),
            None => self.fail(Error::NoMemory),
        }
    }

    fn skip_expected(&mut self, prefix: u8) -> Parse<()> {
        if self.input.skip_prefix(prefix) {
            Ok(())
        } else {
            self.fail(Error::Invalid)
        }
    }

    fn skip_expected_str(&mut self, prefix: &str) -> Parse<()> {
        if self.input.skip_str_prefix(prefix) {
            Ok(())
        } else {
            self.fail(Error::Invalid)
        }
    }

    /// Append a node to the substitution table, unless it is not a
    /// candidate or already listed.
    fn register_referenceable(&mut self, node: NodeId) {
        if self.arena.is_referenceable(node) && !self.arena.is_registered(node) {
            self.arena.mark_registered(node);
            self.referenceable.push(node);
        }
    }

    // <mangled-name> ::= _Z <encoding>
    fn parse(&mut self) -> Result<NodeId, Error> {
        if !self.input.skip_str_prefix("_Z") {
            return Err(Error::NotMangled);
        }

        match self.parse_encoding() {
            Ok(node) => {
                if self.input.chars_remaining() != 0 {
                    // bogus at end of input
                    return Err(Error::Invalid);
                }
                Ok(node)
            }
            Err(Fail) => Err(self.error.unwrap_or(Error::Internal)),
        }
    }

    // <encoding> ::= <function name> <bare-function-type>
    //            ::= <data name>
    //            ::= <special-name>
    fn parse_encoding(&mut self) -> Parse<NodeId> {
        // local entities carry an 'L' prefix the ABI grammar does not
        // mention
        self.input.skip_prefix(b'L');

        if self.input.has_prefix(b'T') || self.input.has_str_prefix("GV") {
            let name = self.parse_special_name()?;
            return self.alloc(NodeKind::Object { name: Some(name) });
        }

        // either <data name> or <function name>
        let name = self.parse_name()?;

        if self.input.is_at_end() || self.input.has_prefix(b'E') {
            // <data name>
            return self.alloc(NodeKind::Object { name: Some(name) });
        }

        // <function name> -- the remainder is the <bare-function-type>
        let function = self.alloc(NodeKind::Function {
            name: Some(name),
            has_return_type: false,
            is_extern_c: false,
            types: Vec::new(),
        })?;

        // a templatized name provides the T_ resolution context while the
        // signature is parsed
        let previous_templatized = self.templatized_node;
        if self.arena.is_templatized(name) {
            self.templatized_node = Some(name);
        }

        let result = self.parse_bare_function_type(function);
        self.templatized_node = previous_templatized;
        result?;

        Ok(function)
    }

    // <special-name> ::= TV <type>  # virtual table
    //                ::= TT <type>  # VTT structure
    //                ::= TI <type>  # typeinfo structure
    //                ::= TS <type>  # typeinfo name
    //                ::= GV <object name>  # guard variable
    //                ::= T <call-offset> <base encoding>
    //                ::= Tc <call-offset> <call-offset> <base encoding>
    fn parse_special_name(&mut self) -> Parse<NodeId> {
        if self.input.is_at_end() {
            return self.fail(Error::Invalid);
        }

        if !self.input.skip_prefix(b'T') {
            self.skip_expected_str("GV")?;
            let name = self.parse_name()?;
            return self.alloc(NodeKind::SpecialName {
                prefix: "guard variable for ",
                child: name,
            });
        }

        let prefix = match self.input.peek(0) {
            b'V' => "vtable for ",
            b'T' => "VTT for ",
            b'I' => "typeinfo for ",
            b'S' => "typeinfo name for ",
            _ => "",
        };

        if !prefix.is_empty() {
            self.input.skip(1);
            let type_node = self.parse_type()?;
            return self.alloc(NodeKind::SpecialName {
                prefix,
                child: type_node,
            });
        }

        if self.input.skip_prefix(b'c') {
            // this adjustment, then result adjustment
            self.parse_call_offset()?;
            self.parse_call_offset()?;
            let encoding = self.parse_encoding()?;
            return self.alloc(NodeKind::SpecialName {
                prefix: "covariant return thunk to ",
                child: encoding,
            });
        }

        let non_virtual = self.parse_call_offset()?;
        let encoding = self.parse_encoding()?;
        self.alloc(NodeKind::SpecialName {
            prefix: if non_virtual {
                "non-virtual thunk to "
            } else {
                "virtual thunk to "
            },
            child: encoding,
        })
    }

    // <call-offset> ::= h <nv-offset> _
    //               ::= v <v-offset> _
    fn parse_call_offset(&mut self) -> Parse<bool> {
        if self.input.skip_prefix(b'h') {
            self.parse_number()?;
            self.skip_expected(b'_')?;
            return Ok(true);
        }

        self.skip_expected(b'v')?;
        self.parse_number()?;
        self.skip_expected(b'_')?;
        self.parse_number()?;
        self.skip_expected(b'_')?;
        Ok(false)
    }

    // <name> ::= <nested-name>
    //        ::= <unscoped-name>
    //        ::= <unscoped-template-name> <template-args>
    //        ::= <local-name>
    fn parse_name(&mut self) -> Parse<NodeId> {
        if self.input.is_at_end() {
            return self.fail(Error::Invalid);
        }

        let node = match self.input.peek(0) {
            b'N' => return self.parse_nested_name(),
            b'Z' => return self.parse_local_name(),
            b'S' if !self.input.has_str_prefix("St") => self.parse_substitution()?,
            b'S' => {
                // the std:: namespace
                self.input.skip(2);
                let prefix = self.alloc(NodeKind::SimpleName { name: b"std" })?;
                let unqualified = self.parse_unqualified_name()?;
                self.alloc(NodeKind::Prefixed {
                    prefix,
                    name: unqualified,
                })?
            }
            _ => self.parse_unqualified_name()?,
        };

        // an <unscoped-template-name> registers before its arguments
        if !self.input.has_prefix(b'I') {
            return Ok(node);
        }
        self.register_referenceable(node);
        self.parse_template_args(node)
    }

    // <nested-name> ::= N [<CV-qualifiers>] <prefix> <unqualified-name> E
    //               ::= N [<CV-qualifiers>] <template-prefix>
    //                   <template-args> E
    fn parse_nested_name(&mut self) -> Parse<NodeId> {
        self.skip_expected(b'N')?;

        let qualifiers = self.parse_cv_qualifiers();
        let node = self.parse_nested_name_internal()?;

        if !qualifiers.is_empty() {
            return self.alloc(NodeKind::CvQualified {
                qualifiers,
                child: node,
            });
        }
        Ok(node)
    }

    // <prefix> ::= <prefix> <unqualified-name>
    //          ::= <template-prefix> <template-args>
    //          ::= <template-param>
    //          ::= # empty
    //          ::= <substitution>
    fn parse_nested_name_internal(&mut self) -> Parse<NodeId> {
        if self.input.is_at_end() {
            return self.fail(Error::Invalid);
        }

        // the initial prefix may be a template param or a substitution
        let mut initial_prefix = match self.input.peek(0) {
            b'T' => {
                let node = self.parse_template_param()?;
                // a <prefix> or <template-prefix> and as such referenceable
                self.register_referenceable(node);
                Some(node)
            }
            b'S' => Some(self.parse_substitution()?),
            _ => None,
        };

        let mut prefix: Option<NodeId> = None;
        loop {
            let mut can_terminate = false;
            let mut node = match initial_prefix.take() {
                Some(node) => node,
                None => {
                    can_terminate = true;
                    self.parse_unqualified_name()?
                }
            };

            if let Some(prefix) = prefix {
                node = self.alloc(NodeKind::Prefixed { prefix, name: node })?;
            }

            if self.input.has_prefix(b'I') {
                // <template-prefix> is referenceable
                self.register_referenceable(node);
                node = self.parse_template_args(node)?;
                can_terminate = true;
            }

            if self.input.is_at_end() {
                return self.fail(Error::Invalid);
            }

            if self.input.skip_prefix(b'E') {
                // without template args the last item must be an
                // unqualified name
                if !can_terminate {
                    return self.fail(Error::Invalid);
                }
                return Ok(node);
            }

            // more components follow, so this is a <prefix> or
            // <template-prefix> and as such referenceable
            self.register_referenceable(node);
            prefix = Some(node);
        }
    }

    // <local-name> := Z <function encoding> E <entity name>
    //                 [<discriminator>]
    //              := Z <function encoding> E s [<discriminator>]
    fn parse_local_name(&mut self) -> Parse<NodeId> {
        self.skip_expected(b'Z')?;
        let function = self.parse_encoding()?;
        self.skip_expected(b'E')?;

        let entity = if self.input.skip_prefix(b's') {
            self.alloc(NodeKind::SimpleName {
                name: b"string literal",
            })?
        } else {
            self.parse_name()?
        };

        // the discriminator is parsed but not rendered
        if self.input.skip_prefix(b'_') {
            let discriminator = self.parse_number()?;
            if discriminator < 0 {
                return self.fail(Error::Invalid);
            }
        }

        self.alloc(NodeKind::Prefixed {
            prefix: function,
            name: entity,
        })
    }

    // <unqualified-name> ::= <operator-name>
    //                    ::= <ctor-dtor-name>
    //                    ::= <source-name>
    fn parse_unqualified_name(&mut self) -> Parse<NodeId> {
        if self.input.chars_remaining() < 2 {
            return self.fail(Error::Invalid);
        }

        let first = self.input.peek(0);
        let second = self.input.peek(1);

        if first.is_ascii_digit() || (first == b'n' && second.is_ascii_digit()) {
            return self.parse_source_name();
        }

        // C1/C2/C3: complete, base and allocating constructors;
        // D0/D1/D2: deleting, complete and base destructors
        if first == b'C' {
            return match second {
                b'1' | b'2' | b'3' => {
                    let node = self.alloc(NodeKind::Xtructor {
                        constructor: true,
                        unqualified: None,
                    })?;
                    self.input.skip(2);
                    Ok(node)
                }
                _ => self.fail(Error::Invalid),
            };
        }

        if first == b'D' {
            return match second {
                b'0' | b'1' | b'2' => {
                    let node = self.alloc(NodeKind::Xtructor {
                        constructor: false,
                        unqualified: None,
                    })?;
                    self.input.skip(2);
                    Ok(node)
                }
                _ => self.fail(Error::Invalid),
            };
        }

        self.parse_operator_name()
    }

    // <source-name> ::= <positive length number> <identifier>
    fn parse_source_name(&mut self) -> Parse<NodeId> {
        if self.input.is_at_end() {
            return self.fail(Error::Invalid);
        }

        let number = self.parse_number()?;
        if number <= 0 || number > self.input.chars_remaining() as i64 {
            return self.fail(Error::Invalid);
        }

        let length = number as usize;
        let name = &self.input.as_bytes()[..length];
        self.input.skip(length);
        self.alloc(NodeKind::SimpleName { name })
    }

    // <operator-name>, a cast operator `cv <type>`, or a vendor extended
    // operator `v <digit> <source-name>`
    fn parse_operator_name(&mut self) -> Parse<NodeId> {
        if self.input.chars_remaining() < 2 {
            return self.fail(Error::Invalid);
        }

        if let Some(info) = abi::find_operator(self.input.as_bytes()) {
            self.input.skip(info.mangled.len());
            return self.alloc(NodeKind::Operator { info });
        }

        if self.input.skip_str_prefix("cv") {
            let target_type = self.parse_type()?;
            return self.alloc(NodeKind::CastOperator { target_type });
        }

        if self.input.skip_prefix(b'v') {
            if self.input.is_at_end() || !self.input.peek(0).is_ascii_digit() {
                return self.fail(Error::Invalid);
            }
            self.input.skip(1);
            let name = self.parse_source_name()?;
            return self.alloc(NodeKind::VendorOperator { name });
        }

        self.fail(Error::Invalid)
    }

    fn parse_type(&mut self) -> Parse<NodeId> {
        let node = self.parse_type_internal()?;
        self.register_referenceable(node);
        Ok(node)
    }

    // <type> ::= <builtin-type>
    //        ::= <function-type>
    //        ::= <class-enum-type>
    //        ::= <array-type>
    //        ::= <pointer-to-member-type>
    //        ::= <template-param>
    //        ::= <template-template-param> <template-args>
    //        ::= <substitution>
    //        ::= <CV-qualifiers> <type>
    //        ::= P <type>   # pointer-to
    //        ::= R <type>   # reference-to
    //        ::= O <type>   # rvalue reference-to (C++0x)
    //        ::= C <type>   # complex pair (C 2000)
    //        ::= G <type>   # imaginary (C 2000)
    //        ::= U <source-name> <type>  # vendor extended type qualifier
    fn parse_type_internal(&mut self) -> Parse<NodeId> {
        if let Some(node) = self.try_parse_builtin_type()? {
            self.arena.set_referenceable(node, false);
            return Ok(node);
        }

        if self.input.is_at_end() {
            return self.fail(Error::Invalid);
        }

        let node = match self.input.peek(0) {
            b'F' => return self.parse_function_type(),
            b'A' => return self.parse_array_type(),
            b'M' => return self.parse_pointer_to_member_type(),

            b'T' => self.parse_template_param()?,

            b'r' | b'V' | b'K' => {
                let qualifiers = self.parse_cv_qualifiers();
                let child = self.parse_type()?;
                return self.alloc(NodeKind::CvQualified { qualifiers, child });
            }

            b'P' => return self.parse_type_with_modifier(TypeModifier::Pointer),
            b'R' => return self.parse_type_with_modifier(TypeModifier::Reference),
            b'O' => return self.parse_type_with_modifier(TypeModifier::RvalueReference),
            b'C' => return self.parse_type_with_modifier(TypeModifier::Complex),
            b'G' => return self.parse_type_with_modifier(TypeModifier::Imaginary),

            // Dp (pack expansion) and Dt/DT (decltype), which the GNU
            // demangler does not support either
            b'D' => return self.fail(Error::Unsupported),

            b'U' => {
                self.input.skip(1);
                let name = self.parse_source_name()?;
                let child = self.parse_type()?;
                return self.alloc(NodeKind::VendorModified { name, child });
            }

            // "St" is ambiguous between <substitution> and
            // <class-enum-type>; it parses as the latter
            b'S' if !self.input.has_str_prefix("St") => self.parse_substitution()?,

            _ => {
                // <class-enum-type> ::= <name>
                let name = self.parse_name()?;
                return self.alloc(NodeKind::NamedType { name: Some(name) });
            }
        };

        // a <template-template-param> registers before its arguments
        if !self.input.has_prefix(b'I') {
            return Ok(node);
        }
        self.register_referenceable(node);
        self.parse_template_args(node)
    }

    // <CV-qualifiers> ::= [r] [V] [K]   # restrict (C99), volatile, const
    fn parse_cv_qualifiers(&mut self) -> CvQualifiers {
        let mut qualifiers = CvQualifiers::empty();
        if self.input.skip_prefix(b'r') {
            qualifiers |= CvQualifiers::RESTRICT;
        }
        if self.input.skip_prefix(b'V') {
            qualifiers |= CvQualifiers::VOLATILE;
        }
        if self.input.skip_prefix(b'K') {
            qualifiers |= CvQualifiers::CONST;
        }
        qualifiers
    }

    fn parse_type_with_modifier(&mut self, modifier: TypeModifier) -> Parse<NodeId> {
        self.input.skip(1);
        let child = self.parse_type()?;
        self.alloc(NodeKind::Modified { modifier, child })
    }

    // <builtin-type>, or `u <source-name>` for a vendor extended type
    fn try_parse_builtin_type(&mut self) -> Parse<Option<NodeId>> {
        if self.input.is_at_end() {
            return Ok(None);
        }

        let (tag, to_skip) = match self.input.peek(0) {
            b'v' => (TypeTag::Void, 1),
            b'w' => (TypeTag::WcharT, 1),
            b'b' => (TypeTag::Bool, 1),
            b'c' => (TypeTag::Char, 1),
            b'a' => (TypeTag::SignedChar, 1),
            b'h' => (TypeTag::UnsignedChar, 1),
            b's' => (TypeTag::Short, 1),
            b't' => (TypeTag::UnsignedShort, 1),
            b'i' => (TypeTag::Int, 1),
            b'j' => (TypeTag::UnsignedInt, 1),
            b'l' => (TypeTag::Long, 1),
            b'm' => (TypeTag::UnsignedLong, 1),
            b'x' => (TypeTag::LongLong, 1),
            b'y' => (TypeTag::UnsignedLongLong, 1),
            b'n' => (TypeTag::Int128, 1),
            b'o' => (TypeTag::UnsignedInt128, 1),
            b'f' => (TypeTag::Float, 1),
            b'd' => (TypeTag::Double, 1),
            b'e' => (TypeTag::LongDouble, 1),
            b'g' => (TypeTag::Float128, 1),
            b'z' => (TypeTag::Ellipsis, 1),

            b'D' => {
                if self.input.chars_remaining() < 2 {
                    return Ok(None);
                }
                match self.input.peek(1) {
                    b'd' => (TypeTag::DFloat64, 2),
                    b'e' => (TypeTag::DFloat128, 2),
                    b'f' => (TypeTag::DFloat32, 2),
                    b'h' => (TypeTag::DFloat16, 2),
                    b'i' => (TypeTag::Char32T, 2),
                    b's' => (TypeTag::Char16T, 2),
                    _ => return Ok(None),
                }
            }

            b'u' => {
                self.input.skip(1);
                let name = self.parse_source_name()?;
                let node = self.alloc(NodeKind::NamedType { name: Some(name) })?;
                return Ok(Some(node));
            }

            _ => return Ok(None),
        };

        self.input.skip(to_skip);
        let node = self.alloc(NodeKind::SimpleType {
            tag,
            name: tag.lexeme().as_bytes(),
        })?;
        Ok(Some(node))
    }

    // <function-type> ::= F [Y] <bare-function-type> E
    fn parse_function_type(&mut self) -> Parse<NodeId> {
        self.skip_expected(b'F')?;

        let is_extern_c = self.input.skip_prefix(b'Y');

        let function = self.alloc(NodeKind::Function {
            name: None,
            has_return_type: true,
            is_extern_c,
            types: Vec::new(),
        })?;
        self.parse_bare_function_type(function)?;
        self.skip_expected(b'E')?;
        Ok(function)
    }

    // <array-type> ::= A <positive dimension number> _ <element type>
    //              ::= A [<dimension expression>] _ <element type>
    fn parse_array_type(&mut self) -> Parse<NodeId> {
        if self.input.chars_remaining() < 2 || !self.input.skip_prefix(b'A') {
            return self.fail(Error::Invalid);
        }

        // a leading digit selects the first production
        let dimension = if self.input.peek(0).is_ascii_digit()
            || (self.input.peek(0) == b'n'
                && self.input.chars_remaining() >= 2
                && self.input.peek(1).is_ascii_digit())
        {
            Dimension::Number(self.parse_number()?)
        } else {
            Dimension::Expression(self.parse_expression()?)
        };

        self.skip_expected(b'_')?;
        let element = self.parse_type()?;
        self.alloc(NodeKind::Array { element, dimension })
    }

    // <pointer-to-member-type> ::= M <class type> <member type>
    fn parse_pointer_to_member_type(&mut self) -> Parse<NodeId> {
        self.skip_expected(b'M')?;
        let class_type = self.parse_type()?;
        let member_type = self.parse_type()?;
        self.alloc(NodeKind::PointerToMember {
            class_type,
            child: member_type,
        })
    }

    // <template-param> ::= T_   # first template parameter
    //                  ::= T <parameter-2 non-negative number> _
    fn parse_template_param(&mut self) -> Parse<NodeId> {
        self.skip_expected(b'T')?;
        let Some(templatized) = self.templatized_node else {
            return self.fail(Error::Invalid);
        };

        let mut index: i64 = 0;
        if !self.input.has_prefix(b'_') {
            index = self.parse_number()?;
            if index < 0 {
                return self.fail(Error::Invalid);
            }
            index += 1;
        }
        self.skip_expected(b'_')?;

        let Some(parameter) = self.arena.template_parameter_at(templatized, index as usize) else {
            return self.fail(Error::Invalid);
        };

        // share the parameter node instead of registering it twice
        self.alloc(NodeKind::Substitution { target: parameter })
    }

    fn parse_substitution(&mut self) -> Parse<NodeId> {
        let node = self.parse_substitution_internal()?;
        // substitutions are never referenceable themselves
        self.arena.set_referenceable(node, false);
        Ok(node)
    }

    // <substitution> ::= S <seq-id> _
    //                ::= S_
    //                ::= St  # ::std::
    //                ::= Sa  # ::std::allocator
    //                ::= Sb  # ::std::basic_string
    //                ::= Ss  # ::std::basic_string<char, ...>
    //                ::= Si  # ::std::basic_istream<char, ...>
    //                ::= So  # ::std::basic_ostream<char, ...>
    //                ::= Sd  # ::std::basic_iostream<char, ...>
    fn parse_substitution_internal(&mut self) -> Parse<NodeId> {
        if self.input.chars_remaining() < 2 || !self.input.skip_prefix(b'S') {
            return self.fail(Error::Invalid);
        }

        match self.input.peek(0) {
            b't' => {
                self.input.skip(1);
                return self.alloc(NodeKind::SimpleName { name: b"std" });
            }
            b'a' => return self.create_std_alias("allocator", None),
            b'b' => return self.create_std_alias("basic_string", None),
            b's' => {
                return self.create_std_alias(
                    "basic_string",
                    Some("char, std::char_traits<char>, std::allocator<char>"),
                );
            }
            b'i' => {
                return self.create_std_alias("basic_istream", Some("char, std::char_traits<char>"));
            }
            b'o' => {
                return self.create_std_alias("basic_ostream", Some("char, std::char_traits<char>"));
            }
            b'd' => {
                return self
                    .create_std_alias("basic_iostream", Some("char, std::char_traits<char>"));
            }
            b'_' => {
                self.input.skip(1);
                return self.create_substitution_node(0);
            }
            _ => {}
        }

        // <seq-id>: base 36, digits then upper-case letters
        let bytes = self.input.as_bytes();
        let mut sequence: i64 = 0;
        let mut i = 0;
        while i < bytes.len() && bytes[i] != b'_' {
            let digit = match bytes[i] {
                c @ b'0'..=b'9' => i64::from(c - b'0'),
                c @ b'A'..=b'Z' => i64::from(c - b'A') + 10,
                _ => return self.fail(Error::Invalid),
            };
            sequence = match sequence.checked_mul(36).and_then(|s| s.checked_add(digit)) {
                Some(sequence) => sequence,
                None => return self.fail(Error::Invalid),
            };
            i += 1;
        }

        if i == bytes.len() {
            return self.fail(Error::Invalid);
        }

        // the digits and the '_'
        self.input.skip(i + 1);
        self.create_substitution_node(sequence as usize + 1)
    }

    /// `std::<name>`, optionally with canonical template arguments.
    fn create_std_alias(
        &mut self,
        name: &'static str,
        template_args: Option<&'static str>,
    ) -> Parse<NodeId> {
        self.input.skip(1);

        let base = self.alloc(NodeKind::SimpleType {
            tag: TypeTag::Unknown,
            name: name.as_bytes(),
        })?;
        let std_prefix = self.alloc(NodeKind::SimpleType {
            tag: TypeTag::Unknown,
            name: b"std",
        })?;
        let qualified = self.alloc(NodeKind::Prefixed {
            prefix: std_prefix,
            name: base,
        })?;

        let Some(arguments) = template_args else {
            return Ok(qualified);
        };

        let template = self.alloc(NodeKind::Template {
            base: qualified,
            arguments: Vec::new(),
        })?;
        let arguments = self.alloc(NodeKind::SimpleType {
            tag: TypeTag::Unknown,
            name: arguments.as_bytes(),
        })?;
        self.arena.add_template_argument(template, arguments);
        Ok(template)
    }

    fn create_substitution_node(&mut self, index: usize) -> Parse<NodeId> {
        let Some(&target) = self.referenceable.get(index) else {
            return self.fail(Error::Invalid);
        };
        self.alloc(NodeKind::Substitution { target })
    }

    // <bare-function-type> ::= <signature type>+
    //     # types are possible return type, then parameter types
    fn parse_bare_function_type(&mut self, function: NodeId) -> Parse<()> {
        if self.input.is_at_end() {
            return self.fail(Error::Invalid);
        }

        loop {
            let type_node = self.parse_type()?;
            self.arena.add_function_type(function, type_node);

            // 'E' delimits <function-type>
            if self.input.is_at_end() || self.input.has_prefix(b'E') {
                return Ok(());
            }
        }
    }

    // <template-args> ::= I <template-arg>+ E
    fn parse_template_args(&mut self, base: NodeId) -> Parse<NodeId> {
        self.skip_expected(b'I')?;

        // at least one <template-arg>
        if self.input.is_at_end() || self.input.has_prefix(b'E') {
            return self.fail(Error::Invalid);
        }

        let template = self.alloc(NodeKind::Template {
            base,
            arguments: Vec::new(),
        })?;

        while !self.input.is_at_end() && !self.input.has_prefix(b'E') {
            let argument = self.parse_template_arg()?;
            self.arena.add_template_argument(template, argument);
        }

        self.skip_expected(b'E')?;
        Ok(template)
    }

    // <template-arg> ::= <type>
    //                ::= X <expression> E
    //                ::= <expr-primary>
    //                ::= I <template-arg>* E  # argument pack
    //                ::= sp <expression>      # pack expansion (C++0x)
    fn parse_template_arg(&mut self) -> Parse<NodeId> {
        if self.input.is_at_end() {
            return self.fail(Error::Invalid);
        }

        match self.input.peek(0) {
            b'X' => {
                self.input.skip(1);
                let expression = self.parse_expression()?;
                self.skip_expected(b'E')?;
                Ok(expression)
            }

            b'L' => self.parse_expression_primary(),

            // argument packs and pack expansions, which the GNU demangler
            // does not support either
            b'I' => self.fail(Error::Unsupported),
            b's' if self.input.has_str_prefix("sp") => self.fail(Error::Unsupported),

            _ => self.parse_type(),
        }
    }

    // <expression> ::= <unary operator-name> <expression>
    //              ::= <binary operator-name> <expression> <expression>
    //              ::= <trinary operator-name> <expression> <expression>
    //                  <expression>
    //              ::= cl <expression>* E          # call
    //              ::= cv <type> expression        # one-argument conversion
    //              ::= cv <type> _ <expression>* E # n-argument conversion
    //              ::= st <type>                   # sizeof (a type)
    //              ::= at <type>                   # alignof (a type)
    //              ::= <template-param>
    //              ::= sr <type> <unqualified-name> [<template-args>]
    //              ::= sZ <template-param>  # size of a parameter pack
    //              ::= <expr-primary>
    fn parse_expression(&mut self) -> Parse<NodeId> {
        if self.input.is_at_end() {
            return self.fail(Error::Invalid);
        }

        match self.input.peek(0) {
            b'L' => return self.parse_expression_primary(),
            b'T' => return self.parse_template_param(),
            _ => {}
        }

        if self.input.chars_remaining() < 2 {
            return self.fail(Error::Invalid);
        }

        if self.input.skip_str_prefix("cl") {
            let call = self.alloc(NodeKind::Call {
                arguments: Vec::new(),
            })?;
            while !self.input.is_at_end() && !self.input.has_prefix(b'E') {
                let sub = self.parse_expression()?;
                self.arena.add_sub_expression(call, sub);
            }
            self.skip_expected(b'E')?;
            return Ok(call);
        }

        if self.input.skip_str_prefix("cv") {
            let conversion_type = self.parse_type()?;
            let conversion = self.alloc(NodeKind::ConversionExpression {
                conversion_type,
                arguments: Vec::new(),
            })?;

            if self.input.skip_prefix(b'_') {
                while !self.input.is_at_end() && !self.input.has_prefix(b'E') {
                    let sub = self.parse_expression()?;
                    self.arena.add_sub_expression(conversion, sub);
                }
                self.skip_expected(b'E')?;
                return Ok(conversion);
            }

            let sub = self.parse_expression()?;
            self.arena.add_sub_expression(conversion, sub);
            return Ok(conversion);
        }

        if self.input.skip_str_prefix("sr") {
            // dependent name, possibly a template-id
            let dependent_type = self.parse_type()?;
            let name = self.parse_unqualified_name()?;
            let node = self.alloc(NodeKind::Prefixed {
                prefix: dependent_type,
                name,
            })?;

            if !self.input.has_prefix(b'I') {
                return Ok(node);
            }
            return self.parse_template_args(node);
        }

        if self.input.has_str_prefix("sZ") {
            // unsupported by the GNU demangler as well
            return self.fail(Error::Unsupported);
        }

        // a fixed-arity operator
        let Some(info) = abi::find_operator(self.input.as_bytes()) else {
            return self.fail(Error::Invalid);
        };
        if info.arity < 0 {
            return self.fail(Error::Invalid);
        }
        self.input.skip(info.mangled.len());

        let operator = self.alloc(NodeKind::OperatorExpression {
            info,
            arguments: Vec::new(),
        })?;

        // sizeof/alignof take a type as their first argument
        let mut parsed = 0;
        if info.flags.contains(OperatorFlags::TYPE_PARAM) {
            let type_node = self.parse_type()?;
            self.arena.add_sub_expression(operator, type_node);
            parsed = 1;
        }

        while parsed < info.arity {
            let sub = self.parse_expression()?;
            self.arena.add_sub_expression(operator, sub);
            parsed += 1;
        }

        Ok(operator)
    }

    // <expr-primary> ::= L <type> <value number> E  # integer literal
    //                ::= L <type> <value float> E   # floating literal
    //                ::= L <mangled-name> E         # external name
    fn parse_expression_primary(&mut self) -> Parse<NodeId> {
        self.skip_expected(b'L')?;

        let node = if self.input.skip_str_prefix("_Z") {
            self.parse_encoding()?
        } else {
            let literal_type = self.parse_type()?;

            // the value is copied verbatim up to the 'E'; rendering
            // replaces a leading 'n' by '-'
            let bytes = self.input.as_bytes();
            let mut length = 0;
            while length < bytes.len() && bytes[length] != b'E' {
                length += 1;
            }
            if length == 0 {
                return self.fail(Error::Invalid);
            }

            let number = &bytes[..length];
            self.input.skip(length);
            self.alloc(NodeKind::TypedNumberLiteral {
                literal_type,
                number,
            })?
        };

        self.skip_expected(b'E')?;
        Ok(node)
    }

    // <number> ::= [n] <non-negative decimal integer>
    fn parse_number(&mut self) -> Parse<i64> {
        let negative = self.input.skip_prefix(b'n');

        if self.input.is_at_end() {
            return self.fail(Error::Invalid);
        }

        let bytes = self.input.as_bytes();
        let mut number: i64 = 0;
        let mut i = 0;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            number = match number
                .checked_mul(10)
                .and_then(|n| n.checked_add(i64::from(bytes[i] - b'0')))
            {
                Some(number) => number,
                None => return self.fail(Error::Invalid),
            };
            i += 1;
        }
        self.input.skip(i);

        Ok(if negative { -number } else { number })
    }
}

/// Demangle `mangled` into `buffer`, object name only when `name_only` is
/// set, and report what kind of symbol it is.
fn demangle(mangled: &str, buffer: &mut NameBuffer, name_only: bool) -> Result<ObjectType, Error> {
    let mut demangler = Demangler::new(mangled);
    let node = demangler.parse()?;

    let rendered = demangler.arena.object_name(node, buffer, name_only);

    // a versioned symbol gets its unmodified version string back
    if rendered {
        if let Some(suffix) = demangler.version_suffix {
            buffer.append_bytes(suffix);
        }
    }

    if buffer.had_overflow() {
        return Err(Error::BufferTooSmall);
    }
    if !rendered {
        return Err(Error::Internal);
    }

    Ok(demangler.arena.object_type(node))
}

/// Demangle a whole symbol to its object name and classify it: the flag is
/// true when the symbol is a method on an object. Unless the symbol is
/// known not to be one, a qualified name counts as a method.
pub fn demangle_symbol(mangled: &str, buffer: &mut NameBuffer) -> Result<bool, Error> {
    let object_type = demangle(mangled, buffer, true)?;

    Ok(match object_type {
        ObjectType::Data | ObjectType::Function | ObjectType::MethodClass => false,
        ObjectType::MethodObject => true,
        ObjectType::Unknown | ObjectType::MethodUnknown => buffer.terminate().contains("::"),
    })
}

/// Demangle a whole symbol to its full form, return type included where
/// the symbol carries one.
pub fn demangle_name(mangled: &str, buffer: &mut NameBuffer) -> Result<(), Error> {
    demangle(mangled, buffer, false).map(|_| ())
}

/// Write the display name of parameter `index` into `buffer` and report
/// its type.
pub fn parameter_info(mangled: &str, index: u32, buffer: &mut NameBuffer) -> Result<TypeInfo, Error> {
    let mut demangler = Demangler::new(mangled);
    let node = demangler.parse()?;

    let Some(parameter) = demangler.arena.parameter_at(node, index as usize) else {
        return Err(Error::InvalidParameterIndex);
    };

    let rendered = demangler.arena.get_name(parameter, buffer);
    if buffer.had_overflow() {
        return Err(Error::BufferTooSmall);
    }
    if !rendered {
        return Err(Error::Internal);
    }

    Ok(demangler.arena.type_info(parameter))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demangled(mangled: &str) -> String {
        let mut buffer = NameBuffer::new(1024);
        demangle_name(mangled, &mut buffer).unwrap();
        buffer.terminate().to_string()
    }

    #[test]
    fn simple_function() {
        assert_eq!(demangled("_Z3fooiPKc"), "foo(int, char const*)");
    }

    #[test]
    fn nested_name_elides_void() {
        assert_eq!(demangled("_ZN3foo3barEv"), "foo::bar()");
    }

    #[test]
    fn constructor_with_substitution() {
        // the table runs foo, foo::bar; S_ names the first entry and S0_
        // the second
        assert_eq!(
            demangled("_ZN3foo3barC1ERKS0_"),
            "foo::bar::bar(foo::bar const&)"
        );
        assert_eq!(demangled("_ZN3foo3barC1ERKS_"), "foo::bar::bar(foo const&)");
    }

    #[test]
    fn basic_string_alias() {
        assert_eq!(
            demangled("_ZN9__gnu_cxx17__normal_iteratorIPKcSsE4baseEv"),
            "__gnu_cxx::__normal_iterator<char const*, \
             std::basic_string<char, std::char_traits<char>, std::allocator<char> > >::base()"
        );
    }

    #[test]
    fn vtable_special_name() {
        assert_eq!(
            demangled("_ZTVN10__cxxabiv120__si_class_type_infoE"),
            "vtable for __cxxabiv1::__si_class_type_info"
        );
    }

    #[test]
    fn function_pointer_parameter() {
        assert_eq!(
            demangled("_ZN8BPrivate9IconCache8SyncDrawEPNS_5ModelEP5BView6BPointNS_12IconDrawModeE9icon_sizePFvS4_S5_P7BBitmapPvESA_"),
            "BPrivate::IconCache::SyncDraw(BPrivate::Model*, BView*, BPoint, \
             BPrivate::IconDrawMode, icon_size, void (*)(BView*, BPoint, BBitmap*, void*), void*)"
        );
    }

    #[test]
    fn templated_function_has_return_type() {
        assert_eq!(demangled("_Z3maxIiET_S0_S0_"), "int max<int>(int, int)");
    }

    #[test]
    fn errors() {
        let mut buffer = NameBuffer::new(64);
        assert_eq!(demangle_name("", &mut buffer), Err(Error::NotMangled));
        assert_eq!(demangle_name("_Z", &mut buffer), Err(Error::Invalid));
        assert_eq!(demangle_name("foo__Fi", &mut buffer), Err(Error::NotMangled));
        // substitution index past the table
        assert_eq!(demangle_name("_Z3fooS9_", &mut buffer), Err(Error::Invalid));
        // pack expansion is not supported
        assert_eq!(demangle_name("_Z3fooDpi", &mut buffer), Err(Error::Unsupported));
    }

    #[test]
    fn zero_capacity_buffer_overflows() {
        let mut buffer = NameBuffer::new(0);
        assert_eq!(
            demangle_name("_Z3foov", &mut buffer),
            Err(Error::BufferTooSmall)
        );
    }

    #[test]
    fn method_classification() {
        let mut buffer = NameBuffer::new(256);
        // conversion operators run on an object
        assert_eq!(demangle_symbol("_ZN3FoocviEv", &mut buffer), Ok(true));

        // constructors are class methods
        let mut buffer = NameBuffer::new(256);
        assert_eq!(demangle_symbol("_ZN3fooC1Ev", &mut buffer), Ok(false));

        // free functions are not methods
        let mut buffer = NameBuffer::new(256);
        assert_eq!(demangle_symbol("_Z3fooi", &mut buffer), Ok(false));

        // a plain member function is assumed to be one
        let mut buffer = NameBuffer::new(256);
        assert_eq!(demangle_symbol("_ZN3foo3barEv", &mut buffer), Ok(true));
    }

    #[test]
    fn parameter_enumeration() {
        let mut buffer = NameBuffer::new(64);
        let info = parameter_info("_Z3fooiPKc", 0, &mut buffer).unwrap();
        assert_eq!(buffer.terminate(), "int");
        assert_eq!(info.tag, TypeTag::Int);

        let mut buffer = NameBuffer::new(64);
        let info = parameter_info("_Z3fooiPKc", 1, &mut buffer).unwrap();
        assert_eq!(buffer.terminate(), "char const*");
        assert_eq!(info.tag, TypeTag::ConstCharPointer);

        let mut buffer = NameBuffer::new(64);
        assert_eq!(
            parameter_info("_Z3fooiPKc", 2, &mut buffer),
            Err(Error::InvalidParameterIndex)
        );

        // (void) has no arguments at all
        let mut buffer = NameBuffer::new(64);
        assert_eq!(
            parameter_info("_ZN3foo3barEv", 0, &mut buffer),
            Err(Error::InvalidParameterIndex)
        );
    }

    #[test]
    fn versioned_symbol_keeps_suffix() {
        assert_eq!(demangled("_Z3foov@@MYLIB_1.0"), "foo()@@MYLIB_1.0");
    }
}
