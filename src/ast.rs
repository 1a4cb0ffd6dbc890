//! AST for the Itanium demangler.
//!
//! Nodes live in a per-call arena and reference each other by index, so
//! the whole tree is freed by dropping the arena. Substitutions make the
//! tree a DAG: they point back at earlier nodes and delegate every query
//! to them.

use crate::abi::{CvQualifiers, OperatorInfo, TypeInfo, TypeModifier, TypeTag};
use crate::buffer::NameBuffer;

/// Handle of a node inside an [`Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Array dimension: either a parsed number or a dimension expression.
#[derive(Debug)]
pub enum Dimension {
    Number(i64),
    Expression(NodeId),
}

/// What kind of symbol a parsed name denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Unknown,
    Data,
    Function,
    MethodClass,
    MethodObject,
    MethodUnknown,
}

/// What kind of scope a name prefix denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixType {
    None,
    Namespace,
    Class,
    Unknown,
}

#[derive(Debug)]
pub enum NodeKind<'input> {
    /// Raw identifier bytes, e.g. a source-name.
    SimpleName { name: &'input [u8] },
    /// A type with a fixed spelling. Builtins carry their tag; named types
    /// (the `std::` substitution aliases) carry `TypeTag::Unknown`.
    SimpleType { tag: TypeTag, name: &'input [u8] },
    /// `L <type> <number> E` literal.
    TypedNumberLiteral { literal_type: NodeId, number: &'input [u8] },
    /// Constructor or destructor; prints the name of the enclosing class,
    /// resolved by walking the prefix chain when the node is adopted.
    Xtructor { constructor: bool, unqualified: Option<NodeId> },
    /// vtable/typeinfo/thunk/guard variable prefix around a name or type.
    SpecialName { prefix: &'static str, child: NodeId },
    /// CV qualifier decoration.
    CvQualified { qualifiers: CvQualifiers, child: NodeId },
    /// Pointer/reference/complex/imaginary decoration.
    Modified { modifier: TypeModifier, child: NodeId },
    /// `U <source-name> <type>` vendor qualifier decoration.
    VendorModified { name: NodeId, child: NodeId },
    /// `M <class> <member>`; the member type is the decorated child.
    PointerToMember { class_type: NodeId, child: NodeId },
    Operator { info: &'static OperatorInfo },
    /// `v <digit> <source-name>` vendor operator.
    VendorOperator { name: NodeId },
    /// `cv <type>` conversion operator.
    CastOperator { target_type: NodeId },
    /// `left::right`.
    Prefixed { prefix: NodeId, name: NodeId },
    /// `base<arg, arg, ...>`.
    Template { base: NodeId, arguments: Vec<NodeId> },
    /// Class-enum type or vendor type wrapping a name.
    NamedType { name: Option<NodeId> },
    /// A data symbol or special name at the root of the tree.
    Object { name: Option<NodeId> },
    /// Function symbol or function type. `types` starts with the return
    /// type when one is present, followed by the parameter types.
    Function {
        name: Option<NodeId>,
        has_return_type: bool,
        is_extern_c: bool,
        types: Vec<NodeId>,
    },
    Array { element: NodeId, dimension: Dimension },
    /// `cl <expression>* E`.
    Call { arguments: Vec<NodeId> },
    OperatorExpression {
        info: &'static OperatorInfo,
        arguments: Vec<NodeId>,
    },
    /// `cv <type>` applied to one or more expression arguments.
    ConversionExpression {
        conversion_type: NodeId,
        arguments: Vec<NodeId>,
    },
    /// Back-reference; delegates every query to its target.
    Substitution { target: NodeId },
}

#[derive(Debug)]
struct Node<'input> {
    kind: NodeKind<'input>,
    parent: Option<NodeId>,
    referenceable: bool,
    registered: bool,
}

/// Decoration state threaded through a decorated-name render.
#[derive(Debug, Default, Clone, Copy)]
struct DecorationInfo {
    first_decorator: Option<NodeId>,
    closest_cv_decorator: Option<NodeId>,
}

/// Split of a name into its leading CV decorators and the rest.
#[derive(Debug, Default, Clone, Copy)]
struct CvQualifierInfo {
    first_cv_qualifier: Option<NodeId>,
    first_non_cv_qualifier: Option<NodeId>,
}

/// Render recursion cap. Substitutions only point backwards, so cycles can
/// only arise from degenerate ctor names resolving to their own enclosing
/// node; those inputs fail with an internal error instead of recursing
/// forever.
const MAX_RENDER_DEPTH: usize = 512;

/// Per-call node pool. `limit` bounds the node count in proportion to the
/// input length; exceeding it reports out-of-memory.
#[derive(Debug)]
pub struct Arena<'input> {
    nodes: Vec<Node<'input>>,
    limit: usize,
}

impl<'input> Arena<'input> {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            nodes: Vec::new(),
            limit,
        }
    }

    pub fn alloc(&mut self, kind: NodeKind<'input>) -> Option<NodeId> {
        if self.nodes.len() >= self.limit {
            return None;
        }

        let referenceable = !matches!(
            kind,
            NodeKind::Operator { .. }
                | NodeKind::VendorOperator { .. }
                | NodeKind::TypedNumberLiteral { .. }
        );

        let children = Self::initial_children(&kind);
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            parent: None,
            referenceable,
            registered: false,
        });

        for child in children.into_iter().flatten() {
            self.adopt(id, child);
        }

        Some(id)
    }

    fn initial_children(kind: &NodeKind<'input>) -> [Option<NodeId>; 2] {
        match kind {
            NodeKind::TypedNumberLiteral { literal_type, .. } => [Some(*literal_type), None],
            NodeKind::SpecialName { child, .. }
            | NodeKind::CvQualified { child, .. }
            | NodeKind::Modified { child, .. } => [Some(*child), None],
            NodeKind::VendorModified { name, child } => [Some(*name), Some(*child)],
            NodeKind::PointerToMember { class_type, child } => [Some(*class_type), Some(*child)],
            NodeKind::VendorOperator { name } => [Some(*name), None],
            NodeKind::CastOperator { target_type } => [Some(*target_type), None],
            NodeKind::Prefixed { prefix, name } => [Some(*prefix), Some(*name)],
            NodeKind::Template { base, .. } => [Some(*base), None],
            NodeKind::NamedType { name }
            | NodeKind::Object { name }
            | NodeKind::Function { name, .. } => [*name, None],
            NodeKind::Array { element, dimension } => [
                Some(*element),
                match dimension {
                    Dimension::Expression(expr) => Some(*expr),
                    Dimension::Number(_) => None,
                },
            ],
            NodeKind::ConversionExpression {
                conversion_type, ..
            } => [Some(*conversion_type), None],
            // substitutions never own their target
            NodeKind::SimpleName { .. }
            | NodeKind::SimpleType { .. }
            | NodeKind::Xtructor { .. }
            | NodeKind::Operator { .. }
            | NodeKind::Call { .. }
            | NodeKind::OperatorExpression { .. }
            | NodeKind::Substitution { .. } => [None, None],
        }
    }

    /// Link `child` below `parent`. Adopting a ctor/dtor resolves the
    /// unqualified name it prints, by asking the new parent for the
    /// nearest prior sibling in the prefix chain.
    fn adopt(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.index()].parent = Some(parent);

        if matches!(self.nodes[child.index()].kind, NodeKind::Xtructor { .. }) {
            let resolved = self.unqualified_node(parent, child);
            if let NodeKind::Xtructor { unqualified, .. } = &mut self.nodes[child.index()].kind {
                *unqualified = Some(resolved);
            }
        }
    }

    fn unqualified_node(&self, node: NodeId, before: NodeId) -> NodeId {
        match &self.nodes[node.index()].kind {
            NodeKind::Prefixed { prefix, name } => {
                if before == *name {
                    self.unqualified_node(*prefix, before)
                } else {
                    self.unqualified_node(*name, before)
                }
            }
            NodeKind::Template { base, .. } => {
                if *base != before {
                    self.unqualified_node(*base, before)
                } else {
                    node
                }
            }
            _ => node,
        }
    }

    pub fn add_template_argument(&mut self, template: NodeId, argument: NodeId) {
        self.adopt(template, argument);
        if let NodeKind::Template { arguments, .. } = &mut self.nodes[template.index()].kind {
            arguments.push(argument);
        }
    }

    pub fn add_function_type(&mut self, function: NodeId, type_node: NodeId) {
        self.adopt(function, type_node);
        if let NodeKind::Function { types, .. } = &mut self.nodes[function.index()].kind {
            types.push(type_node);
        }
    }

    pub fn add_sub_expression(&mut self, expression: NodeId, sub: NodeId) {
        self.adopt(expression, sub);
        match &mut self.nodes[expression.index()].kind {
            NodeKind::Call { arguments }
            | NodeKind::OperatorExpression { arguments, .. }
            | NodeKind::ConversionExpression { arguments, .. } => arguments.push(sub),
            _ => {}
        }
    }

    #[must_use]
    pub fn kind(&self, id: NodeId) -> &NodeKind<'input> {
        &self.nodes[id.index()].kind
    }

    #[must_use]
    pub fn is_referenceable(&self, id: NodeId) -> bool {
        self.nodes[id.index()].referenceable
    }

    pub fn set_referenceable(&mut self, id: NodeId, flag: bool) {
        self.nodes[id.index()].referenceable = flag;
    }

    #[must_use]
    pub fn is_registered(&self, id: NodeId) -> bool {
        self.nodes[id.index()].registered
    }

    pub fn mark_registered(&mut self, id: NodeId) {
        self.nodes[id.index()].registered = true;
    }

    // ---- rendering ----

    /// Render the full form of a node. Returns false when a child could
    /// not be resolved or the render recursed too deeply; buffer overflow
    /// is tracked separately by the buffer itself.
    pub fn get_name(&self, id: NodeId, buffer: &mut NameBuffer) -> bool {
        self.name_at(id, buffer, 0)
    }

    /// Render the root of a parse: the bare object name when `name_only`
    /// is set (the kernel-debugger view), the full form otherwise.
    pub fn object_name(&self, id: NodeId, buffer: &mut NameBuffer, name_only: bool) -> bool {
        if name_only {
            match &self.nodes[id.index()].kind {
                NodeKind::Object { name } | NodeKind::Function { name, .. } => {
                    return match name {
                        Some(name) => self.name_at(*name, buffer, 0),
                        None => true,
                    };
                }
                _ => {}
            }
        }
        self.name_at(id, buffer, 0)
    }

    fn name_at(&self, id: NodeId, buffer: &mut NameBuffer, depth: usize) -> bool {
        if depth > MAX_RENDER_DEPTH {
            return false;
        }
        let depth = depth + 1;

        match &self.nodes[id.index()].kind {
            NodeKind::SimpleName { name } | NodeKind::SimpleType { name, .. } => {
                buffer.append_bytes(name)
            }

            NodeKind::TypedNumberLiteral {
                literal_type,
                number,
            } => {
                // bool 0/1 print as false/true
                if self.is_type_name(*literal_type, "bool")
                    && (*number == b"0" || *number == b"1")
                {
                    return buffer.append(if *number == b"0" { "false" } else { "true" });
                }

                // the type in parentheses; "int" is elided like the GNU
                // demangler does
                if !self.is_type_name(*literal_type, "int") {
                    buffer.append("(");
                    if !self.name_at(*literal_type, buffer, depth) {
                        return false;
                    }
                    buffer.append(")");
                }

                // a leading 'n' marks a negative value
                if let Some(rest) = number.strip_prefix(b"n") {
                    buffer.append("-");
                    buffer.append_bytes(rest)
                } else {
                    buffer.append_bytes(number)
                }
            }

            NodeKind::Xtructor {
                constructor,
                unqualified,
            } => {
                let Some(unqualified) = unqualified else {
                    return false;
                };
                if !constructor {
                    buffer.append("~");
                }
                self.name_at(*unqualified, buffer, depth)
            }

            NodeKind::SpecialName { prefix, child } => {
                buffer.append(prefix) && self.name_at(*child, buffer, depth)
            }

            NodeKind::CvQualified { child, .. }
            | NodeKind::Modified { child, .. }
            | NodeKind::VendorModified { child, .. }
            | NodeKind::PointerToMember { child, .. } => {
                let mut info = DecorationInfo {
                    first_decorator: Some(id),
                    closest_cv_decorator: None,
                };
                self.decorated_name_at(*child, buffer, &mut info, depth)
            }

            NodeKind::Operator { info } => {
                buffer.append(if info.is_identifier() {
                    "operator "
                } else {
                    "operator"
                }) && buffer.append(info.name)
            }

            NodeKind::VendorOperator { name } => {
                buffer.append("operator ") && self.name_at(*name, buffer, depth)
            }

            NodeKind::CastOperator { target_type } => {
                buffer.append("operator ") && self.name_at(*target_type, buffer, depth)
            }

            NodeKind::Prefixed { prefix, name } => {
                if !self.name_at(*prefix, buffer, depth) {
                    return false;
                }
                buffer.append("::");
                self.name_at(*name, buffer, depth)
            }

            NodeKind::Template { base, arguments } => {
                if !self.name_at(*base, buffer, depth) {
                    return false;
                }
                buffer.append("<");
                for (i, argument) in arguments.iter().enumerate() {
                    if i > 0 {
                        buffer.append(", ");
                    }
                    if !self.name_at(*argument, buffer, depth) {
                        return false;
                    }
                }
                // keep consecutive '>' apart
                if buffer.last_char() == b'>' {
                    buffer.append(" ");
                }
                buffer.append(">")
            }

            NodeKind::NamedType { name } | NodeKind::Object { name } => match name {
                Some(name) => self.name_at(*name, buffer, depth),
                None => true,
            },

            NodeKind::Function { .. } => {
                let mut info = DecorationInfo::default();
                self.decorated_name_at(id, buffer, &mut info, depth)
            }

            NodeKind::Array { element, dimension } => {
                if !self.name_at(*element, buffer, depth) {
                    return false;
                }
                buffer.append("[");
                match dimension {
                    Dimension::Number(number) => {
                        buffer.append(&number.to_string());
                    }
                    Dimension::Expression(expression) => {
                        if !self.name_at(*expression, buffer, depth) {
                            return false;
                        }
                    }
                }
                buffer.append("]")
            }

            NodeKind::Call { arguments } => {
                buffer.append("call(");
                for (i, argument) in arguments.iter().enumerate() {
                    if i > 0 {
                        buffer.append(", ");
                    }
                    if !self.name_at(*argument, buffer, depth) {
                        return false;
                    }
                }
                buffer.append(")")
            }

            NodeKind::OperatorExpression { info, arguments } => {
                self.operator_expression_name(info, arguments, buffer, depth)
            }

            NodeKind::ConversionExpression {
                conversion_type,
                arguments,
            } => {
                buffer.append("(");
                if !self.name_at(*conversion_type, buffer, depth) {
                    return false;
                }
                buffer.append(")(");
                for (i, argument) in arguments.iter().enumerate() {
                    if i > 0 {
                        buffer.append(", ");
                    }
                    if !self.name_at(*argument, buffer, depth) {
                        return false;
                    }
                }
                buffer.append(")")
            }

            NodeKind::Substitution { target } => self.name_at(*target, buffer, depth),
        }
    }

    fn operator_expression_name(
        &self,
        info: &OperatorInfo,
        arguments: &[NodeId],
        buffer: &mut NameBuffer,
        depth: usize,
    ) -> bool {
        let is_identifier = info.is_identifier();

        if info.arity == 1 || is_identifier || info.arity > 3 || (info.arity == 3 && info.name != "?")
        {
            // prefix form, parenthesized for identifier-like operators
            buffer.append(info.name);
            if is_identifier {
                buffer.append("(");
            }
            for (i, argument) in arguments.iter().enumerate() {
                if i > 0 {
                    buffer.append(", ");
                }
                if !self.name_at(*argument, buffer, depth) {
                    return false;
                }
            }
            if is_identifier {
                buffer.append(")");
            }
            return true;
        }

        if info.arity == 2 {
            let [first, second] = arguments else {
                return false;
            };
            buffer.append("(");
            if !self.name_at(*first, buffer, depth) {
                return false;
            }
            buffer.append(" ");
            buffer.append(info.name);
            buffer.append(" ");
            if !self.name_at(*second, buffer, depth) {
                return false;
            }
            return buffer.append(")");
        }

        // ?:
        let [first, second, third] = arguments else {
            return false;
        };
        buffer.append("(");
        if !self.name_at(*first, buffer, depth) {
            return false;
        }
        buffer.append(" ? ");
        if !self.name_at(*second, buffer, depth) {
            return false;
        }
        buffer.append(" : ");
        if !self.name_at(*third, buffer, depth) {
            return false;
        }
        buffer.append(")")
    }

    fn decorated_name_at(
        &self,
        id: NodeId,
        buffer: &mut NameBuffer,
        info: &mut DecorationInfo,
        depth: usize,
    ) -> bool {
        if depth > MAX_RENDER_DEPTH {
            return false;
        }
        let depth = depth + 1;

        match &self.nodes[id.index()].kind {
            NodeKind::CvQualified { child, .. } => {
                if info.closest_cv_decorator.is_none() {
                    info.closest_cv_decorator = Some(id);
                }
                self.decorated_name_at(*child, buffer, info, depth)
            }

            NodeKind::Modified { child, .. }
            | NodeKind::VendorModified { child, .. }
            | NodeKind::PointerToMember { child, .. } => {
                info.closest_cv_decorator = None;
                self.decorated_name_at(*child, buffer, info, depth)
            }

            NodeKind::Function { .. } => self.function_decorated_name(id, buffer, info, depth),

            NodeKind::Substitution { target } => {
                self.decorated_name_at(*target, buffer, info, depth)
            }

            _ => {
                if !self.name_at(id, buffer, depth) {
                    return false;
                }
                match info.first_decorator {
                    Some(decorator) => self.add_decoration_at(decorator, buffer, None, depth),
                    None => true,
                }
            }
        }
    }

    /// Function rendering: return type, declarator (with any external
    /// pointer/reference decorations between the name and the parameter
    /// list), parameters, then the function's own CV qualifiers followed
    /// by any outer CV decorator.
    fn function_decorated_name(
        &self,
        id: NodeId,
        buffer: &mut NameBuffer,
        decoration_info: &mut DecorationInfo,
        depth: usize,
    ) -> bool {
        let NodeKind::Function { name, types, .. } = &self.nodes[id.index()].kind else {
            return false;
        };

        let mut remaining: &[NodeId] = types;

        // the return type
        if self.function_has_return_type(id) {
            if let Some((return_type, rest)) = remaining.split_first() {
                if !self.name_at(*return_type, buffer, depth) {
                    return false;
                }
                remaining = rest;
                buffer.append(" ");
            }
        }

        // open a declarator for function pointers
        if name.is_none() {
            buffer.append("(");
        }

        // skip CV qualifiers on the name; they are added after the
        // parameter list
        let mut cv_info = CvQualifierInfo::default();
        if let Some(name) = name {
            self.cv_qualifier_info(*name, &mut cv_info);
            if let Some(stripped) = cv_info.first_non_cv_qualifier {
                if !self.name_at(stripped, buffer, depth) {
                    return false;
                }
            }
        }

        // non-CV decorations wrapping the function itself
        if let Some(decorator) = decoration_info.first_decorator {
            if !self.add_decoration_at(
                decorator,
                buffer,
                decoration_info.closest_cv_decorator,
                depth,
            ) {
                return false;
            }
        }

        if name.is_none() {
            buffer.append(")");
        }

        buffer.append("(");

        // a sole "void" parameter renders as ()
        if let [only] = remaining {
            if self.is_type_name(*only, "void") {
                remaining = &[];
            }
        }

        for (i, parameter) in remaining.iter().enumerate() {
            if i > 0 {
                buffer.append(", ");
            }
            if !self.name_at(*parameter, buffer, depth) {
                return false;
            }
        }

        buffer.append(")");

        // CV qualifiers of the name (const member functions)
        if let Some(first_cv) = cv_info.first_cv_qualifier {
            if !self.add_decoration_at(first_cv, buffer, cv_info.first_non_cv_qualifier, depth) {
                return false;
            }
        }

        // outer CV decorator wrapping the function type
        if let Some(closest_cv) = decoration_info.closest_cv_decorator {
            self.add_decoration_at(closest_cv, buffer, None, depth);
        }

        true
    }

    fn add_decoration_at(
        &self,
        id: NodeId,
        buffer: &mut NameBuffer,
        stop: Option<NodeId>,
        depth: usize,
    ) -> bool {
        if depth > MAX_RENDER_DEPTH {
            return false;
        }
        let depth = depth + 1;

        if stop == Some(id) {
            return true;
        }

        match &self.nodes[id.index()].kind {
            NodeKind::CvQualified { qualifiers, child } => {
                if !self.add_decoration_at(*child, buffer, stop, depth) {
                    return false;
                }
                if qualifiers.contains(CvQualifiers::RESTRICT) {
                    buffer.append(" restrict");
                }
                if qualifiers.contains(CvQualifiers::VOLATILE) {
                    buffer.append(" volatile");
                }
                if qualifiers.contains(CvQualifiers::CONST) {
                    buffer.append(" const");
                }
                true
            }

            NodeKind::Modified { modifier, child } => {
                self.add_decoration_at(*child, buffer, stop, depth)
                    && buffer.append(modifier.suffix())
            }

            NodeKind::VendorModified { name, child } => {
                self.add_decoration_at(*child, buffer, stop, depth)
                    && buffer.append(" ")
                    && self.name_at(*name, buffer, depth)
            }

            NodeKind::PointerToMember { class_type, child } => {
                if !self.add_decoration_at(*child, buffer, stop, depth) {
                    return false;
                }
                // a space before the class name, unless one would be
                // superfluous right after '('
                if !buffer.is_empty() && buffer.last_char() != b'(' {
                    buffer.append(" ");
                }
                if !self.name_at(*class_type, buffer, depth) {
                    return false;
                }
                buffer.append("::*")
            }

            NodeKind::Substitution { target } => self.add_decoration_at(*target, buffer, stop, depth),

            _ => true,
        }
    }

    fn cv_qualifier_info(&self, id: NodeId, info: &mut CvQualifierInfo) {
        match &self.nodes[id.index()].kind {
            NodeKind::CvQualified { child, .. } => {
                if info.first_cv_qualifier.is_none() {
                    info.first_cv_qualifier = Some(id);
                }
                self.cv_qualifier_info(*child, info);
            }
            NodeKind::Substitution { target } => self.cv_qualifier_info(*target, info),
            _ => info.first_non_cv_qualifier = Some(id),
        }
    }

    // ---- queries ----

    #[must_use]
    pub fn is_templatized(&self, id: NodeId) -> bool {
        match &self.nodes[id.index()].kind {
            NodeKind::Template { .. } => true,
            NodeKind::CvQualified { child, .. } => self.is_templatized(*child),
            NodeKind::Substitution { target } => self.is_templatized(*target),
            _ => false,
        }
    }

    #[must_use]
    pub fn template_parameter_at(&self, id: NodeId, index: usize) -> Option<NodeId> {
        match &self.nodes[id.index()].kind {
            NodeKind::Template { arguments, .. } => arguments.get(index).copied(),
            NodeKind::CvQualified { child, .. } => self.template_parameter_at(*child, index),
            NodeKind::Substitution { target } => self.template_parameter_at(*target, index),
            _ => None,
        }
    }

    /// Whether the name denotes something that never has a return type in
    /// its rendered form (ctor, dtor, conversion operator).
    fn is_no_return_value_function(&self, id: NodeId) -> bool {
        match &self.nodes[id.index()].kind {
            NodeKind::Xtructor { .. } | NodeKind::CastOperator { .. } => true,
            NodeKind::NamedType { name }
            | NodeKind::Object { name }
            | NodeKind::Function { name, .. } => {
                name.is_some_and(|name| self.is_no_return_value_function(name))
            }
            NodeKind::CvQualified { child, .. } => self.is_no_return_value_function(*child),
            NodeKind::Template { base, .. } => self.is_no_return_value_function(*base),
            NodeKind::Prefixed { name, .. } => self.is_no_return_value_function(*name),
            NodeKind::Substitution { target } => self.is_no_return_value_function(*target),
            _ => false,
        }
    }

    fn function_has_return_type(&self, id: NodeId) -> bool {
        let NodeKind::Function {
            name,
            has_return_type,
            ..
        } = &self.nodes[id.index()].kind
        else {
            return false;
        };

        match name {
            None => true,
            Some(name) => {
                *has_return_type
                    || (self.is_templatized(*name) && !self.is_no_return_value_function(*name))
            }
        }
    }

    fn is_type_name(&self, id: NodeId, name: &str) -> bool {
        match &self.nodes[id.index()].kind {
            NodeKind::SimpleType {
                name: type_name, ..
            } => *type_name == name.as_bytes(),
            NodeKind::Substitution { target } => self.is_type_name(*target, name),
            _ => false,
        }
    }

    #[must_use]
    pub fn object_type(&self, id: NodeId) -> ObjectType {
        match &self.nodes[id.index()].kind {
            NodeKind::SimpleType { .. }
            | NodeKind::TypedNumberLiteral { .. }
            | NodeKind::Array { .. }
            | NodeKind::Object { .. }
            | NodeKind::Modified { .. }
            | NodeKind::VendorModified { .. }
            | NodeKind::PointerToMember { .. } => ObjectType::Data,

            NodeKind::Xtructor { .. } => ObjectType::MethodClass,
            NodeKind::CastOperator { .. } => ObjectType::MethodObject,

            NodeKind::Operator { info } => {
                if info.flags.contains(crate::abi::OperatorFlags::IS_MEMBER) {
                    ObjectType::MethodClass
                } else {
                    ObjectType::Unknown
                }
            }

            NodeKind::Prefixed { name, .. } => self.object_type(*name),
            NodeKind::Template { base, .. } => self.object_type(*base),
            NodeKind::CvQualified { child, .. } => self.object_type(*child),
            NodeKind::Substitution { target } => self.object_type(*target),

            NodeKind::Function { name, .. } => {
                // no name, no fun
                let Some(name) = name else {
                    return ObjectType::Function;
                };

                match self.prefix_type(*name) {
                    PrefixType::None | PrefixType::Namespace => return ObjectType::Function,
                    PrefixType::Class | PrefixType::Unknown => {}
                }

                // the prefix could be a class or a namespace; ask the name
                // what it thinks it is
                match self.object_type(*name) {
                    kind @ (ObjectType::Function
                    | ObjectType::MethodClass
                    | ObjectType::MethodObject
                    | ObjectType::MethodUnknown) => kind,
                    ObjectType::Unknown | ObjectType::Data => ObjectType::MethodUnknown,
                }
            }

            _ => ObjectType::Unknown,
        }
    }

    fn prefix_type(&self, id: NodeId) -> PrefixType {
        match &self.nodes[id.index()].kind {
            NodeKind::Prefixed { .. } => PrefixType::Unknown,
            NodeKind::CvQualified { child, .. } => self.prefix_type(*child),
            NodeKind::Template { base, .. } => self.prefix_type(*base),
            NodeKind::Substitution { target } => self.prefix_type(*target),
            _ => PrefixType::None,
        }
    }

    #[must_use]
    pub fn type_info(&self, id: NodeId) -> TypeInfo {
        match &self.nodes[id.index()].kind {
            NodeKind::SimpleType { tag, .. } => TypeInfo::new(*tag),

            NodeKind::CvQualified { qualifiers, child } => {
                self.type_info(*child).qualified(*qualifiers)
            }

            NodeKind::Modified { modifier, child } => {
                let inner = self.type_info(*child);
                if inner.tag == TypeTag::Char && inner.cv.contains(CvQualifiers::CONST) {
                    return TypeInfo::new(TypeTag::ConstCharPointer);
                }
                match modifier {
                    TypeModifier::Pointer => TypeInfo::new(TypeTag::Pointer),
                    TypeModifier::Reference => TypeInfo::new(TypeTag::Reference),
                    _ => TypeInfo::default(),
                }
            }

            // member pointers and arrays decay to plain pointers as far as
            // the argument enumerator is concerned
            NodeKind::PointerToMember { .. } | NodeKind::Array { .. } => {
                TypeInfo::new(TypeTag::Pointer)
            }

            NodeKind::NamedType { name }
            | NodeKind::Object { name }
            | NodeKind::Function { name, .. } => name
                .map(|name| self.type_info(name))
                .unwrap_or_default(),

            NodeKind::Substitution { target } => self.type_info(*target),

            _ => TypeInfo::default(),
        }
    }

    /// Parameter `index` of a function root, with the return type skipped
    /// and the C `(void)` convention applied. Data roots have none.
    #[must_use]
    pub fn parameter_at(&self, id: NodeId, index: usize) -> Option<NodeId> {
        let NodeKind::Function { types, .. } = &self.nodes[id.index()].kind else {
            return None;
        };

        let parameters: &[NodeId] = if self.function_has_return_type(id) && !types.is_empty() {
            &types[1..]
        } else {
            types
        };

        if let [only] = parameters {
            if self.is_type_name(*only, "void") {
                return None;
            }
        }

        parameters.get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(arena: &Arena<'_>, id: NodeId) -> String {
        let mut buffer = NameBuffer::new(256);
        assert!(arena.get_name(id, &mut buffer));
        buffer.terminate().to_string()
    }

    #[test]
    fn prefixed_and_template_names() {
        let mut arena = Arena::new(64);
        let std_name = arena.alloc(NodeKind::SimpleName { name: b"std" }).unwrap();
        let vector = arena.alloc(NodeKind::SimpleName { name: b"vector" }).unwrap();
        let qualified = arena
            .alloc(NodeKind::Prefixed {
                prefix: std_name,
                name: vector,
            })
            .unwrap();
        let int_type = arena
            .alloc(NodeKind::SimpleType {
                tag: TypeTag::Int,
                name: TypeTag::Int.lexeme().as_bytes(),
            })
            .unwrap();
        let template = arena
            .alloc(NodeKind::Template {
                base: qualified,
                arguments: Vec::new(),
            })
            .unwrap();
        arena.add_template_argument(template, int_type);

        assert_eq!(render(&arena, template), "std::vector<int>");

        // nested templates keep their closing angle brackets apart
        let outer = arena
            .alloc(NodeKind::Template {
                base: std_name,
                arguments: Vec::new(),
            })
            .unwrap();
        arena.add_template_argument(outer, template);
        assert_eq!(render(&arena, outer), "std<std::vector<int> >");
    }

    #[test]
    fn xtructor_resolves_enclosing_class() {
        let mut arena = Arena::new(64);
        let foo = arena.alloc(NodeKind::SimpleName { name: b"foo" }).unwrap();
        let bar = arena.alloc(NodeKind::SimpleName { name: b"bar" }).unwrap();
        let class_name = arena
            .alloc(NodeKind::Prefixed {
                prefix: foo,
                name: bar,
            })
            .unwrap();
        let dtor = arena
            .alloc(NodeKind::Xtructor {
                constructor: false,
                unqualified: None,
            })
            .unwrap();
        let full = arena
            .alloc(NodeKind::Prefixed {
                prefix: class_name,
                name: dtor,
            })
            .unwrap();

        assert_eq!(render(&arena, full), "foo::bar::~bar");
        assert_eq!(arena.object_type(full), ObjectType::MethodClass);
    }

    #[test]
    fn pointer_decoration_wraps_function_type() {
        let mut arena = Arena::new(64);
        let void_type = arena
            .alloc(NodeKind::SimpleType {
                tag: TypeTag::Void,
                name: TypeTag::Void.lexeme().as_bytes(),
            })
            .unwrap();
        let int_type = arena
            .alloc(NodeKind::SimpleType {
                tag: TypeTag::Int,
                name: TypeTag::Int.lexeme().as_bytes(),
            })
            .unwrap();
        let function = arena
            .alloc(NodeKind::Function {
                name: None,
                has_return_type: true,
                is_extern_c: false,
                types: Vec::new(),
            })
            .unwrap();
        arena.add_function_type(function, void_type);
        arena.add_function_type(function, int_type);
        let pointer = arena
            .alloc(NodeKind::Modified {
                modifier: TypeModifier::Pointer,
                child: function,
            })
            .unwrap();

        assert_eq!(render(&arena, pointer), "void (*)(int)");
    }

    #[test]
    fn const_member_function_qualifiers_follow_parameters() {
        let mut arena = Arena::new(64);
        let foo = arena.alloc(NodeKind::SimpleName { name: b"foo" }).unwrap();
        let bar = arena.alloc(NodeKind::SimpleName { name: b"bar" }).unwrap();
        let qualified = arena
            .alloc(NodeKind::Prefixed {
                prefix: foo,
                name: bar,
            })
            .unwrap();
        let const_name = arena
            .alloc(NodeKind::CvQualified {
                qualifiers: CvQualifiers::CONST,
                child: qualified,
            })
            .unwrap();
        let void_type = arena
            .alloc(NodeKind::SimpleType {
                tag: TypeTag::Void,
                name: TypeTag::Void.lexeme().as_bytes(),
            })
            .unwrap();
        let function = arena
            .alloc(NodeKind::Function {
                name: Some(const_name),
                has_return_type: false,
                is_extern_c: false,
                types: Vec::new(),
            })
            .unwrap();
        arena.add_function_type(function, void_type);

        let mut buffer = NameBuffer::new(256);
        assert!(arena.get_name(function, &mut buffer));
        assert_eq!(buffer.terminate(), "foo::bar() const");
    }

    #[test]
    fn literal_rendering() {
        let mut arena = Arena::new(64);
        let bool_type = arena
            .alloc(NodeKind::SimpleType {
                tag: TypeTag::Bool,
                name: TypeTag::Bool.lexeme().as_bytes(),
            })
            .unwrap();
        let truthy = arena
            .alloc(NodeKind::TypedNumberLiteral {
                literal_type: bool_type,
                number: b"1",
            })
            .unwrap();
        assert_eq!(render(&arena, truthy), "true");

        let int_type = arena
            .alloc(NodeKind::SimpleType {
                tag: TypeTag::Int,
                name: TypeTag::Int.lexeme().as_bytes(),
            })
            .unwrap();
        let minus_two = arena
            .alloc(NodeKind::TypedNumberLiteral {
                literal_type: int_type,
                number: b"n2",
            })
            .unwrap();
        assert_eq!(render(&arena, minus_two), "-2");

        let long_type = arena
            .alloc(NodeKind::SimpleType {
                tag: TypeTag::Long,
                name: TypeTag::Long.lexeme().as_bytes(),
            })
            .unwrap();
        let typed = arena
            .alloc(NodeKind::TypedNumberLiteral {
                literal_type: long_type,
                number: b"7",
            })
            .unwrap();
        assert_eq!(render(&arena, typed), "(long)7");
    }

    #[test]
    fn arena_limit_reports_exhaustion() {
        let mut arena = Arena::new(1);
        assert!(arena.alloc(NodeKind::SimpleName { name: b"a" }).is_some());
        assert!(arena.alloc(NodeKind::SimpleName { name: b"b" }).is_none());
    }
}
