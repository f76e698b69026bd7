use std::fmt;

/// Arena index of a node. Two nodes are the same node iff their ids are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// `raw` is the source spelling; generated strings have none and print double-quoted.
    Str { value: String, raw: Option<String> },
    Int(String),
    Float(String),
    Bool(bool),
    None,
    Ellipsis,
}

impl Literal {
    pub fn string(value: impl Into<String>) -> Self {
        Literal::Str {
            value: value.into(),
            raw: None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::Str { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Python type name of the literal, as used in annotations.
    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::Str { .. } => "str",
            Literal::Int(_) => "int",
            Literal::Float(_) => "float",
            Literal::Bool(_) => "bool",
            Literal::None => "None",
            Literal::Ellipsis => "Any",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Normal,
    VarArgs,
    KwArgs,
    KwOnlyMarker,
    PosOnlyMarker,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    pub name: String,
    pub asname: Option<String>,
}

impl Alias {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            asname: None,
        }
    }

    /// The name this alias binds in the importing module.
    pub fn bound_name(&self) -> &str {
        self.asname.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompKind {
    List,
    Set,
    Generator,
    Dict,
}

/// Closed set of node kinds. Child references are arena ids; everything else is a leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Module {
        body: Vec<NodeId>,
    },
    FunctionDef {
        name: String,
        is_async: bool,
        decorators: Vec<NodeId>,
        params: Vec<NodeId>,
        returns: Option<NodeId>,
        body: Vec<NodeId>,
    },
    ClassDef {
        name: String,
        decorators: Vec<NodeId>,
        bases: Vec<NodeId>,
        body: Vec<NodeId>,
    },
    Param {
        name: String,
        kind: ParamKind,
        annotation: Option<NodeId>,
        default: Option<NodeId>,
    },
    Assign {
        targets: Vec<NodeId>,
        value: NodeId,
    },
    AnnAssign {
        target: NodeId,
        annotation: NodeId,
        value: Option<NodeId>,
    },
    AugAssign {
        target: NodeId,
        op: String,
        value: NodeId,
    },
    Expr {
        value: NodeId,
    },
    Return {
        value: Option<NodeId>,
    },
    If {
        test: NodeId,
        body: Vec<NodeId>,
        orelse: Vec<NodeId>,
    },
    For {
        is_async: bool,
        target: NodeId,
        iter: NodeId,
        body: Vec<NodeId>,
        orelse: Vec<NodeId>,
    },
    While {
        test: NodeId,
        body: Vec<NodeId>,
        orelse: Vec<NodeId>,
    },
    Try {
        body: Vec<NodeId>,
        handlers: Vec<NodeId>,
        orelse: Vec<NodeId>,
        finalbody: Vec<NodeId>,
    },
    ExceptHandler {
        star: bool,
        kind: Option<NodeId>,
        name: Option<String>,
        body: Vec<NodeId>,
    },
    With {
        is_async: bool,
        items: Vec<NodeId>,
        body: Vec<NodeId>,
    },
    WithItem {
        context: NodeId,
        target: Option<NodeId>,
    },
    Raise {
        exc: Option<NodeId>,
        cause: Option<NodeId>,
    },
    Assert {
        test: NodeId,
        msg: Option<NodeId>,
    },
    Delete {
        targets: Vec<NodeId>,
    },
    Pass,
    Break,
    Continue,
    Import {
        names: Vec<Alias>,
    },
    ImportFrom {
        module: String,
        names: Vec<Alias>,
    },
    Name {
        id: String,
    },
    Attribute {
        value: NodeId,
        attr: String,
    },
    Subscript {
        value: NodeId,
        slice: NodeId,
    },
    Slice {
        lower: Option<NodeId>,
        upper: Option<NodeId>,
        step: Option<NodeId>,
    },
    Call {
        func: NodeId,
        args: Vec<NodeId>,
    },
    Keyword {
        name: String,
        value: NodeId,
    },
    Constant {
        value: Literal,
    },
    FormattedString {
        raw: String,
    },
    List {
        elts: Vec<NodeId>,
    },
    Tuple {
        elts: Vec<NodeId>,
    },
    Set {
        elts: Vec<NodeId>,
    },
    Dict {
        items: Vec<NodeId>,
    },
    Pair {
        key: NodeId,
        value: NodeId,
    },
    Starred {
        value: NodeId,
        double: bool,
    },
    BinOp {
        left: NodeId,
        op: String,
        right: NodeId,
    },
    BoolOp {
        left: NodeId,
        op: String,
        right: NodeId,
    },
    Compare {
        left: NodeId,
        ops: Vec<String>,
        comparators: Vec<NodeId>,
    },
    UnaryOp {
        op: String,
        operand: NodeId,
    },
    IfExp {
        test: NodeId,
        body: NodeId,
        orelse: NodeId,
    },
    Lambda {
        params: String,
        body: NodeId,
    },
    Await {
        value: NodeId,
    },
    Yield {
        value: Option<NodeId>,
        from: bool,
    },
    NamedExpr {
        target: NodeId,
        value: NodeId,
    },
    Comprehension {
        kind: CompKind,
        element: NodeId,
        generators: Vec<NodeId>,
    },
    ForIn {
        is_async: bool,
        target: NodeId,
        iter: NodeId,
        ifs: Vec<NodeId>,
    },
    /// Source the lowering does not model, kept verbatim (dedented).
    Raw {
        text: String,
    },
}

/// Read view of one structural field of a node.
#[derive(Debug)]
pub enum Slot<'a> {
    Required(&'a NodeId),
    Optional(&'a Option<NodeId>),
    Many(&'a Vec<NodeId>),
}

/// Write view of one structural field of a node.
#[derive(Debug)]
pub enum SlotMut<'a> {
    Required(&'a mut NodeId),
    Optional(&'a mut Option<NodeId>),
    Many(&'a mut Vec<NodeId>),
}

// Single source of truth for the kind -> field mapping. Match ergonomics make the
// bindings `&T` or `&mut T` depending on how the node is borrowed.
macro_rules! node_fields {
    ($node:expr, $slot:ident) => {
        match $node {
            Node::Module { body } => vec![("body", $slot::Many(body))],
            Node::FunctionDef {
                decorators,
                params,
                returns,
                body,
                ..
            } => vec![
                ("decorators", $slot::Many(decorators)),
                ("params", $slot::Many(params)),
                ("returns", $slot::Optional(returns)),
                ("body", $slot::Many(body)),
            ],
            Node::ClassDef {
                decorators,
                bases,
                body,
                ..
            } => vec![
                ("decorators", $slot::Many(decorators)),
                ("bases", $slot::Many(bases)),
                ("body", $slot::Many(body)),
            ],
            Node::Param {
                annotation,
                default,
                ..
            } => vec![
                ("annotation", $slot::Optional(annotation)),
                ("default", $slot::Optional(default)),
            ],
            Node::Assign { targets, value } => vec![
                ("targets", $slot::Many(targets)),
                ("value", $slot::Required(value)),
            ],
            Node::AnnAssign {
                target,
                annotation,
                value,
            } => vec![
                ("target", $slot::Required(target)),
                ("annotation", $slot::Required(annotation)),
                ("value", $slot::Optional(value)),
            ],
            Node::AugAssign { target, value, .. } => vec![
                ("target", $slot::Required(target)),
                ("value", $slot::Required(value)),
            ],
            Node::Expr { value } => vec![("value", $slot::Required(value))],
            Node::Return { value } => vec![("value", $slot::Optional(value))],
            Node::If { test, body, orelse } | Node::While { test, body, orelse } => vec![
                ("test", $slot::Required(test)),
                ("body", $slot::Many(body)),
                ("orelse", $slot::Many(orelse)),
            ],
            Node::For {
                target,
                iter,
                body,
                orelse,
                ..
            } => vec![
                ("target", $slot::Required(target)),
                ("iter", $slot::Required(iter)),
                ("body", $slot::Many(body)),
                ("orelse", $slot::Many(orelse)),
            ],
            Node::Try {
                body,
                handlers,
                orelse,
                finalbody,
            } => vec![
                ("body", $slot::Many(body)),
                ("handlers", $slot::Many(handlers)),
                ("orelse", $slot::Many(orelse)),
                ("finalbody", $slot::Many(finalbody)),
            ],
            Node::ExceptHandler { kind, body, .. } => vec![
                ("kind", $slot::Optional(kind)),
                ("body", $slot::Many(body)),
            ],
            Node::With { items, body, .. } => vec![
                ("items", $slot::Many(items)),
                ("body", $slot::Many(body)),
            ],
            Node::WithItem { context, target } => vec![
                ("context", $slot::Required(context)),
                ("target", $slot::Optional(target)),
            ],
            Node::Raise { exc, cause } => vec![
                ("exc", $slot::Optional(exc)),
                ("cause", $slot::Optional(cause)),
            ],
            Node::Assert { test, msg } => vec![
                ("test", $slot::Required(test)),
                ("msg", $slot::Optional(msg)),
            ],
            Node::Delete { targets } => vec![("targets", $slot::Many(targets))],
            Node::Attribute { value, .. } => vec![("value", $slot::Required(value))],
            Node::Subscript { value, slice } => vec![
                ("value", $slot::Required(value)),
                ("slice", $slot::Required(slice)),
            ],
            Node::Slice { lower, upper, step } => vec![
                ("lower", $slot::Optional(lower)),
                ("upper", $slot::Optional(upper)),
                ("step", $slot::Optional(step)),
            ],
            Node::Call { func, args } => vec![
                ("func", $slot::Required(func)),
                ("args", $slot::Many(args)),
            ],
            Node::Keyword { value, .. } => vec![("value", $slot::Required(value))],
            Node::List { elts } | Node::Tuple { elts } | Node::Set { elts } => {
                vec![("elts", $slot::Many(elts))]
            }
            Node::Dict { items } => vec![("items", $slot::Many(items))],
            Node::Pair { key, value } => vec![
                ("key", $slot::Required(key)),
                ("value", $slot::Required(value)),
            ],
            Node::Starred { value, .. } => vec![("value", $slot::Required(value))],
            Node::BinOp { left, right, .. } | Node::BoolOp { left, right, .. } => vec![
                ("left", $slot::Required(left)),
                ("right", $slot::Required(right)),
            ],
            Node::Compare {
                left, comparators, ..
            } => vec![
                ("left", $slot::Required(left)),
                ("comparators", $slot::Many(comparators)),
            ],
            Node::UnaryOp { operand, .. } => vec![("operand", $slot::Required(operand))],
            Node::IfExp { test, body, orelse } => vec![
                ("test", $slot::Required(test)),
                ("body", $slot::Required(body)),
                ("orelse", $slot::Required(orelse)),
            ],
            Node::Lambda { body, .. } => vec![("body", $slot::Required(body))],
            Node::Await { value } => vec![("value", $slot::Required(value))],
            Node::Yield { value, .. } => vec![("value", $slot::Optional(value))],
            Node::NamedExpr { target, value } => vec![
                ("target", $slot::Required(target)),
                ("value", $slot::Required(value)),
            ],
            Node::Comprehension {
                element,
                generators,
                ..
            } => vec![
                ("element", $slot::Required(element)),
                ("generators", $slot::Many(generators)),
            ],
            Node::ForIn {
                target, iter, ifs, ..
            } => vec![
                ("target", $slot::Required(target)),
                ("iter", $slot::Required(iter)),
                ("ifs", $slot::Many(ifs)),
            ],
            Node::Pass
            | Node::Break
            | Node::Continue
            | Node::Import { .. }
            | Node::ImportFrom { .. }
            | Node::Name { .. }
            | Node::Constant { .. }
            | Node::FormattedString { .. }
            | Node::Raw { .. } => Vec::new(),
        }
    };
}

impl Node {
    pub fn fields(&self) -> Vec<(&'static str, Slot<'_>)> {
        node_fields!(self, Slot)
    }

    pub fn fields_mut(&mut self) -> Vec<(&'static str, SlotMut<'_>)> {
        node_fields!(self, SlotMut)
    }

    pub fn children(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        for (_, slot) in self.fields() {
            match slot {
                Slot::Required(id) => out.push(*id),
                Slot::Optional(Some(id)) => out.push(*id),
                Slot::Optional(None) => {}
                Slot::Many(ids) => out.extend(ids.iter().copied()),
            }
        }
        out
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Module { .. } => "Module",
            Node::FunctionDef { .. } => "FunctionDef",
            Node::ClassDef { .. } => "ClassDef",
            Node::Param { .. } => "Param",
            Node::Assign { .. } => "Assign",
            Node::AnnAssign { .. } => "AnnAssign",
            Node::AugAssign { .. } => "AugAssign",
            Node::Expr { .. } => "Expr",
            Node::Return { .. } => "Return",
            Node::If { .. } => "If",
            Node::For { .. } => "For",
            Node::While { .. } => "While",
            Node::Try { .. } => "Try",
            Node::ExceptHandler { .. } => "ExceptHandler",
            Node::With { .. } => "With",
            Node::WithItem { .. } => "WithItem",
            Node::Raise { .. } => "Raise",
            Node::Assert { .. } => "Assert",
            Node::Delete { .. } => "Delete",
            Node::Pass => "Pass",
            Node::Break => "Break",
            Node::Continue => "Continue",
            Node::Import { .. } => "Import",
            Node::ImportFrom { .. } => "ImportFrom",
            Node::Name { .. } => "Name",
            Node::Attribute { .. } => "Attribute",
            Node::Subscript { .. } => "Subscript",
            Node::Slice { .. } => "Slice",
            Node::Call { .. } => "Call",
            Node::Keyword { .. } => "Keyword",
            Node::Constant { .. } => "Constant",
            Node::FormattedString { .. } => "FormattedString",
            Node::List { .. } => "List",
            Node::Tuple { .. } => "Tuple",
            Node::Set { .. } => "Set",
            Node::Dict { .. } => "Dict",
            Node::Pair { .. } => "Pair",
            Node::Starred { .. } => "Starred",
            Node::BinOp { .. } => "BinOp",
            Node::BoolOp { .. } => "BoolOp",
            Node::Compare { .. } => "Compare",
            Node::UnaryOp { .. } => "UnaryOp",
            Node::IfExp { .. } => "IfExp",
            Node::Lambda { .. } => "Lambda",
            Node::Await { .. } => "Await",
            Node::Yield { .. } => "Yield",
            Node::NamedExpr { .. } => "NamedExpr",
            Node::Comprehension { .. } => "Comprehension",
            Node::ForIn { .. } => "ForIn",
            Node::Raw { .. } => "Raw",
        }
    }

    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            Node::Module { .. }
                | Node::FunctionDef { .. }
                | Node::ClassDef { .. }
                | Node::Assign { .. }
                | Node::AnnAssign { .. }
                | Node::AugAssign { .. }
                | Node::Expr { .. }
                | Node::Return { .. }
                | Node::If { .. }
                | Node::For { .. }
                | Node::While { .. }
                | Node::Try { .. }
                | Node::ExceptHandler { .. }
                | Node::With { .. }
                | Node::Raise { .. }
                | Node::Assert { .. }
                | Node::Delete { .. }
                | Node::Pass
                | Node::Break
                | Node::Continue
                | Node::Import { .. }
                | Node::ImportFrom { .. }
        )
    }
}

#[derive(Debug, Clone)]
pub struct NodeData {
    pub node: Node,
    pub parent: Option<NodeId>,
    pub line: Option<u32>,
}

/// Arena holding one parsed module. Nodes are never freed; detached nodes simply
/// become unreachable from the root.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// A tree whose root is an empty module.
    pub fn new() -> Self {
        let mut tree = Tree {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        tree.root = tree.alloc(Node::Module { body: Vec::new() });
        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a node and make it the parent of every child it references.
    pub fn alloc(&mut self, node: Node) -> NodeId {
        self.alloc_at(node, None)
    }

    pub fn alloc_at(&mut self, node: Node, line: Option<u32>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        for child in node.children() {
            self.nodes[child.index()].parent = Some(id);
        }
        self.nodes.push(NodeData {
            node,
            parent: None,
            line,
        });
        id
    }

    /// Overwrite a node in place, keeping its identity, and re-parent its children.
    pub fn replace_node(&mut self, id: NodeId, node: Node) {
        for child in node.children() {
            self.nodes[child.index()].parent = Some(id);
        }
        self.nodes[id.index()].node = node;
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()].node
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()].node
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) {
        self.nodes[id.index()].parent = parent;
    }

    pub fn line(&self, id: NodeId) -> Option<u32> {
        self.nodes[id.index()].line
    }

    pub fn set_line(&mut self, id: NodeId, line: Option<u32>) {
        self.nodes[id.index()].line = line;
    }

    pub fn slot_mut(&mut self, id: NodeId, field: &str) -> Option<SlotMut<'_>> {
        self.nodes[id.index()]
            .node
            .fields_mut()
            .into_iter()
            .find(|(name, _)| *name == field)
            .map(|(_, slot)| slot)
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id).children()
    }

    /// Pre-order walk of the subtree rooted at `id`, `id` included.
    pub fn walk(&self, id: NodeId) -> Walk<'_> {
        Walk {
            tree: self,
            stack: vec![id],
        }
    }

    /// True when following parents from `id` ends at the root and every hop is
    /// backed by the parent actually holding the child.
    pub fn is_reachable(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            let Some(parent) = self.parent(current) else {
                return false;
            };
            if !self.node(parent).children().contains(&current) {
                return false;
            }
            current = parent;
        }
    }

    /// Give every node without a line the line of its nearest located ancestor.
    pub fn fix_missing_locations(&mut self) {
        let order: Vec<NodeId> = self.walk(self.root).collect();
        for id in order {
            if self.line(id).is_some() {
                continue;
            }
            let inherited = self.parent(id).and_then(|parent| self.line(parent)).unwrap_or(1);
            self.set_line(id, Some(inherited));
        }
    }

    pub fn module_body(&self) -> &[NodeId] {
        self.body(self.root)
    }

    /// Statement list of a module, function or class; empty for other kinds.
    pub fn body(&self, id: NodeId) -> &[NodeId] {
        match self.node(id) {
            Node::Module { body } | Node::FunctionDef { body, .. } | Node::ClassDef { body, .. } => {
                body
            }
            _ => &[],
        }
    }

    pub fn name_id(&self, id: NodeId) -> Option<&str> {
        match self.node(id) {
            Node::Name { id } => Some(id),
            _ => None,
        }
    }

    pub fn str_value(&self, id: NodeId) -> Option<&str> {
        match self.node(id) {
            Node::Constant { value } => value.as_str(),
            _ => None,
        }
    }

    /// Name of a function or class declaration.
    pub fn declaration_name(&self, id: NodeId) -> Option<&str> {
        match self.node(id) {
            Node::FunctionDef { name, .. } | Node::ClassDef { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn name(&mut self, id: impl Into<String>) -> NodeId {
        self.alloc(Node::Name { id: id.into() })
    }

    pub fn string(&mut self, value: impl Into<String>) -> NodeId {
        self.alloc(Node::Constant {
            value: Literal::string(value),
        })
    }

    pub fn attribute(&mut self, value: NodeId, attr: impl Into<String>) -> NodeId {
        self.alloc(Node::Attribute {
            value,
            attr: attr.into(),
        })
    }

    pub fn subscript(&mut self, value: NodeId, slice: NodeId) -> NodeId {
        self.alloc(Node::Subscript { value, slice })
    }

    pub fn call(&mut self, func: NodeId, args: Vec<NodeId>) -> NodeId {
        self.alloc(Node::Call { func, args })
    }

    /// `<target> = <value>`
    pub fn assign(&mut self, target: impl Into<String>, value: NodeId) -> NodeId {
        let target = self.name(target);
        self.alloc(Node::Assign {
            targets: vec![target],
            value,
        })
    }

    pub fn param(
        &mut self,
        name: impl Into<String>,
        annotation: Option<NodeId>,
        default: Option<NodeId>,
    ) -> NodeId {
        self.alloc(Node::Param {
            name: name.into(),
            kind: ParamKind::Normal,
            annotation,
            default,
        })
    }

    /// `from <module> import <names...>`
    pub fn import_from(&mut self, module: &str, names: &[&str]) -> NodeId {
        self.alloc(Node::ImportFrom {
            module: module.to_string(),
            names: names.iter().map(|name| Alias::new(*name)).collect(),
        })
    }

    /// Copy a subtree into fresh nodes, keeping lines.
    pub fn deep_copy(&mut self, id: NodeId) -> NodeId {
        let mut node = self.node(id).clone();
        let line = self.line(id);
        for (_, slot) in node.fields_mut() {
            match slot {
                SlotMut::Required(child) => *child = self.deep_copy(*child),
                SlotMut::Optional(Some(child)) => *child = self.deep_copy(*child),
                SlotMut::Optional(None) => {}
                SlotMut::Many(children) => {
                    for child in children.iter_mut() {
                        *child = self.deep_copy(*child);
                    }
                }
            }
        }
        self.alloc_at(node, line)
    }
}

pub struct Walk<'a> {
    tree: &'a Tree,
    stack: Vec<NodeId>,
}

impl Iterator for Walk<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        let children = self.tree.children(id);
        self.stack.extend(children.into_iter().rev());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_sets_parent_of_children() {
        let mut tree = Tree::new();
        let request = tree.name("request");
        let attr = tree.attribute(request, "data");
        assert_eq!(tree.parent(request), Some(attr));
        assert_eq!(tree.parent(attr), None);
    }

    #[test]
    fn reachability_follows_parents_to_root() {
        let mut tree = Tree::new();
        let value = tree.string("x");
        let stmt = tree.assign("a", value);
        assert!(!tree.is_reachable(stmt));
        let root = tree.root();
        tree.replace_node(root, Node::Module { body: vec![stmt] });
        assert!(tree.is_reachable(value));
    }

    #[test]
    fn walk_is_pre_order() {
        let mut tree = Tree::new();
        let func = tree.name("f");
        let arg = tree.name("x");
        let call = tree.call(func, vec![arg]);
        let kinds: Vec<_> = tree
            .walk(call)
            .map(|id| tree.node(id).kind_name())
            .collect();
        assert_eq!(kinds, vec!["Call", "Name", "Name"]);
        let order: Vec<_> = tree.walk(call).collect();
        assert_eq!(order, vec![call, func, arg]);
    }

    #[test]
    fn fix_missing_locations_inherits_parent_line() {
        let mut tree = Tree::new();
        let value = tree.string("x");
        let stmt = tree.assign("a", value);
        tree.set_line(stmt, Some(7));
        let root = tree.root();
        tree.replace_node(root, Node::Module { body: vec![stmt] });
        tree.fix_missing_locations();
        assert_eq!(tree.line(value), Some(7));
    }

    #[test]
    fn deep_copy_produces_distinct_identities() {
        let mut tree = Tree::new();
        let request = tree.name("request");
        let attr = tree.attribute(request, "data");
        let copy = tree.deep_copy(attr);
        assert_ne!(copy, attr);
        assert_eq!(tree.node(copy).kind_name(), "Attribute");
        let copied_children = tree.children(copy);
        assert_ne!(copied_children[0], request);
        assert_eq!(tree.parent(copied_children[0]), Some(copy));
    }
}
