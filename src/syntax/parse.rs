use crate::error::MigrateError;
use crate::syntax::tree::{Alias, CompKind, Literal, Node, NodeId, ParamKind, Tree};
use crate::util;
use tree_sitter::{Node as TsNode, Parser};

/// Lowers Python source into the arena tree through tree-sitter.
pub struct PythonParser {
    parser: Parser,
}

impl PythonParser {
    pub fn new() -> Result<Self, MigrateError> {
        let mut parser = Parser::new();
        let language = tree_sitter_python::LANGUAGE;
        parser
            .set_language(&language.into())
            .map_err(|err| MigrateError::Parse {
                line: 0,
                message: err.to_string(),
            })?;
        Ok(Self { parser })
    }

    pub fn parse(&mut self, source: &str) -> Result<Tree, MigrateError> {
        let ts_tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| MigrateError::Parse {
                line: 0,
                message: "parser produced no tree".to_string(),
            })?;
        let root = ts_tree.root_node();
        if root.has_error() {
            let (line, message) = first_error(root, source);
            return Err(MigrateError::Parse { line, message });
        }
        let mut lowering = Lowering {
            source,
            tree: Tree::new(),
        };
        let body = lowering.block(root);
        let module = lowering.tree.root();
        lowering.tree.replace_node(module, Node::Module { body });
        lowering.tree.set_line(module, Some(1));
        Ok(lowering.tree)
    }
}

pub fn parse_module(source: &str) -> Result<Tree, MigrateError> {
    PythonParser::new()?.parse(source)
}

fn line_of(node: TsNode<'_>) -> u32 {
    node.start_position().row as u32 + 1
}

fn named<'t>(node: TsNode<'t>) -> Vec<TsNode<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| !child.is_extra())
        .collect()
}

fn all<'t>(node: TsNode<'t>) -> Vec<TsNode<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .filter(|child| !child.is_extra())
        .collect()
}

fn field_all<'t>(node: TsNode<'t>, field: &str) -> Vec<TsNode<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor).collect()
}

fn has_child_kind(node: TsNode<'_>, kind: &str) -> bool {
    all(node).iter().any(|child| child.kind() == kind)
}

fn first_error(root: TsNode<'_>, source: &str) -> (u32, String) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_missing() {
            return (line_of(node), format!("missing `{}`", node.kind()));
        }
        if node.is_error() {
            let text = node.utf8_text(source.as_bytes()).unwrap_or("").trim();
            let text = util::truncate_str_bytes(text, 40);
            return (line_of(node), format!("unexpected `{text}`"));
        }
        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    (line_of(root), "syntax error".to_string())
}

/// Strips the source indentation of the node's first line from its continuation lines.
fn dedent_continuation(text: &str, column: usize) -> String {
    let mut lines = text.lines();
    let mut out = lines.next().unwrap_or("").to_string();
    for line in lines {
        out.push('\n');
        let indent = line
            .bytes()
            .take_while(|b| *b == b' ' || *b == b'\t')
            .count();
        out.push_str(&line[indent.min(column)..]);
    }
    out
}

/// Decoded value of a (non-interpolated) Python string literal.
pub fn decode_string(raw: &str) -> String {
    let Some(prefix_len) = raw.find(['"', '\'']) else {
        return raw.to_string();
    };
    let prefix = raw[..prefix_len].to_ascii_lowercase();
    let body = &raw[prefix_len..];
    let quote = if body.starts_with("\"\"\"") || body.starts_with("'''") {
        3
    } else {
        1
    };
    if body.len() < quote * 2 {
        return String::new();
    }
    let inner = &body[quote..body.len() - quote];
    if prefix.contains('r') {
        inner.to_string()
    } else {
        unescape(inner)
    }
}

fn unescape(inner: &str) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('\n') => {}
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

struct Lowering<'s> {
    source: &'s str,
    tree: Tree,
}

impl<'s> Lowering<'s> {
    fn text(&self, node: TsNode<'_>) -> &'s str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    fn alloc(&mut self, node: Node, at: TsNode<'_>) -> NodeId {
        self.tree.alloc_at(node, Some(line_of(at)))
    }

    fn raw(&mut self, node: TsNode<'_>) -> NodeId {
        let text = dedent_continuation(self.text(node), node.start_position().column);
        self.alloc(Node::Raw { text }, node)
    }

    fn block(&mut self, node: TsNode<'_>) -> Vec<NodeId> {
        let mut out = Vec::new();
        for child in named(node) {
            if child.kind() == "comment" {
                continue;
            }
            out.push(self.statement(child));
        }
        out
    }

    fn block_field(&mut self, node: TsNode<'_>, field: &str) -> Vec<NodeId> {
        match node.child_by_field_name(field) {
            Some(block) => self.block(block),
            None => Vec::new(),
        }
    }

    fn field_expr(&mut self, node: TsNode<'_>, field: &str) -> NodeId {
        match node.child_by_field_name(field) {
            Some(child) => self.expression(child),
            None => self.alloc(
                Node::Raw {
                    text: String::new(),
                },
                node,
            ),
        }
    }

    fn opt_field_expr(&mut self, node: TsNode<'_>, field: &str) -> Option<NodeId> {
        node.child_by_field_name(field)
            .map(|child| self.expression(child))
    }

    fn statement(&mut self, node: TsNode<'_>) -> NodeId {
        match node.kind() {
            "expression_statement" => self.expression_statement(node),
            "return_statement" => {
                let value = named(node).first().map(|child| self.expression(*child));
                self.alloc(Node::Return { value }, node)
            }
            "pass_statement" => self.alloc(Node::Pass, node),
            "break_statement" => self.alloc(Node::Break, node),
            "continue_statement" => self.alloc(Node::Continue, node),
            "if_statement" => self.if_statement(node),
            "for_statement" => {
                let target = self.field_expr(node, "left");
                let iter = self.field_expr(node, "right");
                let body = self.block_field(node, "body");
                let orelse = match node.child_by_field_name("alternative") {
                    Some(alt) => self.block_field(alt, "body"),
                    None => Vec::new(),
                };
                let is_async = has_child_kind(node, "async");
                self.alloc(
                    Node::For {
                        is_async,
                        target,
                        iter,
                        body,
                        orelse,
                    },
                    node,
                )
            }
            "while_statement" => {
                let test = self.field_expr(node, "condition");
                let body = self.block_field(node, "body");
                let orelse = match node.child_by_field_name("alternative") {
                    Some(alt) => self.block_field(alt, "body"),
                    None => Vec::new(),
                };
                self.alloc(Node::While { test, body, orelse }, node)
            }
            "try_statement" => self.try_statement(node),
            "with_statement" => self.with_statement(node),
            "function_definition" => self.function(node, Vec::new()),
            "class_definition" => self.class(node, Vec::new()),
            "decorated_definition" => self.decorated(node),
            "import_statement" => {
                let names = self.aliases(node);
                self.alloc(Node::Import { names }, node)
            }
            "import_from_statement" | "future_import_statement" => {
                let module = if node.kind() == "future_import_statement" {
                    "__future__".to_string()
                } else {
                    node.child_by_field_name("module_name")
                        .map(|module| self.text(module).to_string())
                        .unwrap_or_default()
                };
                let mut names = self.aliases(node);
                if has_child_kind(node, "wildcard_import") {
                    names.push(Alias::new("*"));
                }
                self.alloc(Node::ImportFrom { module, names }, node)
            }
            "raise_statement" => {
                let cause_node = node.child_by_field_name("cause");
                let exc = named(node)
                    .into_iter()
                    .find(|child| Some(child.id()) != cause_node.map(|cause| cause.id()))
                    .map(|child| self.expression(child));
                let cause = cause_node.map(|cause| self.expression(cause));
                self.alloc(Node::Raise { exc, cause }, node)
            }
            "assert_statement" => {
                let parts = named(node);
                let Some(first) = parts.first() else {
                    return self.raw(node);
                };
                let test = self.expression(*first);
                let msg = parts.get(1).map(|msg| self.expression(*msg));
                self.alloc(Node::Assert { test, msg }, node)
            }
            "delete_statement" => {
                let mut targets = Vec::new();
                for child in named(node) {
                    if child.kind() == "expression_list" {
                        for element in named(child) {
                            targets.push(self.expression(element));
                        }
                    } else {
                        targets.push(self.expression(child));
                    }
                }
                self.alloc(Node::Delete { targets }, node)
            }
            _ => self.raw(node),
        }
    }

    fn expression_statement(&mut self, node: TsNode<'_>) -> NodeId {
        let children = named(node);
        if children.len() == 1 {
            let child = children[0];
            match child.kind() {
                "assignment" => return self.assignment(child, node),
                "augmented_assignment" => {
                    let target = self.field_expr(child, "left");
                    let op = child
                        .child_by_field_name("operator")
                        .map(|op| self.text(op).to_string())
                        .unwrap_or_else(|| "+=".to_string());
                    let value = self.field_expr(child, "right");
                    return self.alloc(Node::AugAssign { target, op, value }, node);
                }
                _ => {
                    let value = self.expression(child);
                    return self.alloc(Node::Expr { value }, node);
                }
            }
        }
        let mut elts = Vec::new();
        for child in children {
            elts.push(self.expression(child));
        }
        let value = self.alloc(Node::Tuple { elts }, node);
        self.alloc(Node::Expr { value }, node)
    }

    fn assignment(&mut self, node: TsNode<'_>, stmt: TsNode<'_>) -> NodeId {
        let Some(left) = node.child_by_field_name("left") else {
            return self.raw(stmt);
        };
        if let Some(annotation) = node.child_by_field_name("type") {
            let target = self.expression(left);
            let annotation = self.type_expr(annotation);
            let value = self.opt_field_expr(node, "right");
            return self.alloc(
                Node::AnnAssign {
                    target,
                    annotation,
                    value,
                },
                stmt,
            );
        }
        let mut targets = vec![self.expression(left)];
        let mut current = node.child_by_field_name("right");
        loop {
            match current {
                Some(right) if right.kind() == "assignment" => {
                    if let Some(left) = right.child_by_field_name("left") {
                        targets.push(self.expression(left));
                    }
                    current = right.child_by_field_name("right");
                }
                Some(right) => {
                    let value = self.expression(right);
                    return self.alloc(Node::Assign { targets, value }, stmt);
                }
                None => return self.raw(stmt),
            }
        }
    }

    fn if_statement(&mut self, node: TsNode<'_>) -> NodeId {
        let test = self.field_expr(node, "condition");
        let body = self.block_field(node, "consequence");
        let mut orelse = Vec::new();
        for alt in field_all(node, "alternative").into_iter().rev() {
            match alt.kind() {
                "else_clause" => orelse = self.block_field(alt, "body"),
                "elif_clause" => {
                    let test = self.field_expr(alt, "condition");
                    let body = self.block_field(alt, "consequence");
                    let nested = self.alloc(
                        Node::If {
                            test,
                            body,
                            orelse: std::mem::take(&mut orelse),
                        },
                        alt,
                    );
                    orelse = vec![nested];
                }
                _ => {}
            }
        }
        self.alloc(Node::If { test, body, orelse }, node)
    }

    fn try_statement(&mut self, node: TsNode<'_>) -> NodeId {
        let body = self.block_field(node, "body");
        let mut handlers = Vec::new();
        let mut orelse = Vec::new();
        let mut finalbody = Vec::new();
        for child in named(node) {
            match child.kind() {
                "except_clause" | "except_group_clause" => {
                    handlers.push(self.except_handler(child));
                }
                "else_clause" => orelse = self.block_field(child, "body"),
                "finally_clause" => {
                    if let Some(block) = named(child).into_iter().find(|c| c.kind() == "block") {
                        finalbody = self.block(block);
                    }
                }
                _ => {}
            }
        }
        self.alloc(
            Node::Try {
                body,
                handlers,
                orelse,
                finalbody,
            },
            node,
        )
    }

    fn except_handler(&mut self, node: TsNode<'_>) -> NodeId {
        let star = node.kind() == "except_group_clause";
        let mut kind = None;
        let mut name = None;
        let mut body = Vec::new();
        for child in named(node) {
            match child.kind() {
                "block" => body = self.block(child),
                "as_pattern" => {
                    let parts = named(child);
                    if let Some(first) = parts.first() {
                        kind = Some(self.expression(*first));
                    }
                    let alias = child
                        .child_by_field_name("alias")
                        .or_else(|| parts.get(1).copied());
                    name = alias.map(|alias| self.text(alias).to_string());
                }
                _ if kind.is_none() => kind = Some(self.expression(child)),
                _ => name = Some(self.text(child).to_string()),
            }
        }
        self.alloc(
            Node::ExceptHandler {
                star,
                kind,
                name,
                body,
            },
            node,
        )
    }

    fn with_statement(&mut self, node: TsNode<'_>) -> NodeId {
        let mut items = Vec::new();
        for clause in named(node) {
            if clause.kind() != "with_clause" {
                continue;
            }
            for item in named(clause) {
                if item.kind() == "with_item" {
                    items.push(self.with_item(item));
                }
            }
        }
        let body = self.block_field(node, "body");
        let is_async = has_child_kind(node, "async");
        self.alloc(
            Node::With {
                is_async,
                items,
                body,
            },
            node,
        )
    }

    fn with_item(&mut self, node: TsNode<'_>) -> NodeId {
        let Some(value) = node.child_by_field_name("value") else {
            return self.raw(node);
        };
        if value.kind() != "as_pattern" {
            let context = self.expression(value);
            return self.alloc(
                Node::WithItem {
                    context,
                    target: None,
                },
                node,
            );
        }
        let parts = named(value);
        let context = match parts.first() {
            Some(first) => self.expression(*first),
            None => return self.raw(node),
        };
        let target = value
            .child_by_field_name("alias")
            .or_else(|| parts.get(1).copied())
            .map(|alias| match named(alias).first() {
                Some(inner) if alias.kind() == "as_pattern_target" => self.expression(*inner),
                _ => self.expression(alias),
            });
        self.alloc(Node::WithItem { context, target }, node)
    }

    fn decorated(&mut self, node: TsNode<'_>) -> NodeId {
        let mut decorators = Vec::new();
        for child in named(node) {
            if child.kind() != "decorator" {
                continue;
            }
            if let Some(expr) = named(child).first() {
                decorators.push(self.expression(*expr));
            }
        }
        match node.child_by_field_name("definition") {
            Some(def) if def.kind() == "class_definition" => self.class(def, decorators),
            Some(def) if def.kind() == "function_definition" => self.function(def, decorators),
            _ => self.raw(node),
        }
    }

    fn function(&mut self, node: TsNode<'_>, decorators: Vec<NodeId>) -> NodeId {
        let name = node
            .child_by_field_name("name")
            .map(|name| self.text(name).to_string())
            .unwrap_or_default();
        let is_async = has_child_kind(node, "async");
        let params = match node.child_by_field_name("parameters") {
            Some(params) => self.parameters(params),
            None => Vec::new(),
        };
        let returns = node
            .child_by_field_name("return_type")
            .map(|ret| self.type_expr(ret));
        let body = self.block_field(node, "body");
        self.alloc(
            Node::FunctionDef {
                name,
                is_async,
                decorators,
                params,
                returns,
                body,
            },
            node,
        )
    }

    fn class(&mut self, node: TsNode<'_>, decorators: Vec<NodeId>) -> NodeId {
        let name = node
            .child_by_field_name("name")
            .map(|name| self.text(name).to_string())
            .unwrap_or_default();
        let bases = match node.child_by_field_name("superclasses") {
            Some(superclasses) => self.arguments(superclasses),
            None => Vec::new(),
        };
        let body = self.block_field(node, "body");
        self.alloc(
            Node::ClassDef {
                name,
                decorators,
                bases,
                body,
            },
            node,
        )
    }

    fn parameters(&mut self, node: TsNode<'_>) -> Vec<NodeId> {
        let mut out = Vec::new();
        for child in named(node) {
            let (name, kind, annotation, default) = match child.kind() {
                "identifier" => (self.text(child).to_string(), ParamKind::Normal, None, None),
                "typed_parameter" => {
                    let annotation = child
                        .child_by_field_name("type")
                        .map(|ty| self.type_expr(ty));
                    let Some(inner) = named(child).first().copied() else {
                        continue;
                    };
                    let (name, kind) = self.splat_name(inner);
                    (name, kind, annotation, None)
                }
                "default_parameter" | "typed_default_parameter" => {
                    let name = child
                        .child_by_field_name("name")
                        .map(|name| self.text(name).to_string())
                        .unwrap_or_default();
                    let annotation = child
                        .child_by_field_name("type")
                        .map(|ty| self.type_expr(ty));
                    let default = self.opt_field_expr(child, "value");
                    (name, ParamKind::Normal, annotation, default)
                }
                "list_splat_pattern" | "dictionary_splat_pattern" => {
                    let (name, kind) = self.splat_name(child);
                    (name, kind, None, None)
                }
                "keyword_separator" => (String::new(), ParamKind::KwOnlyMarker, None, None),
                "positional_separator" => (String::new(), ParamKind::PosOnlyMarker, None, None),
                _ => continue,
            };
            out.push(self.alloc(
                Node::Param {
                    name,
                    kind,
                    annotation,
                    default,
                },
                child,
            ));
        }
        out
    }

    fn splat_name(&self, node: TsNode<'_>) -> (String, ParamKind) {
        let kind = match node.kind() {
            "list_splat_pattern" => ParamKind::VarArgs,
            "dictionary_splat_pattern" => ParamKind::KwArgs,
            _ => return (self.text(node).to_string(), ParamKind::Normal),
        };
        let name = named(node)
            .first()
            .map(|inner| self.text(*inner).to_string())
            .unwrap_or_default();
        (name, kind)
    }

    fn aliases(&mut self, node: TsNode<'_>) -> Vec<Alias> {
        let mut names = Vec::new();
        for child in field_all(node, "name") {
            if child.kind() == "aliased_import" {
                let name = child
                    .child_by_field_name("name")
                    .map(|name| self.text(name).to_string())
                    .unwrap_or_default();
                let asname = child
                    .child_by_field_name("alias")
                    .map(|alias| self.text(alias).to_string());
                names.push(Alias { name, asname });
            } else {
                names.push(Alias::new(self.text(child)));
            }
        }
        names
    }

    fn arguments(&mut self, node: TsNode<'_>) -> Vec<NodeId> {
        let mut out = Vec::new();
        for child in named(node) {
            if child.kind() == "comment" {
                continue;
            }
            out.push(self.expression(child));
        }
        out
    }

    fn elements(&mut self, node: TsNode<'_>) -> Vec<NodeId> {
        self.arguments(node)
    }

    fn type_expr(&mut self, node: TsNode<'_>) -> NodeId {
        if node.kind() == "type" {
            if let Some(inner) = named(node).first() {
                return self.expression(*inner);
            }
        }
        self.expression(node)
    }

    fn expression(&mut self, node: TsNode<'_>) -> NodeId {
        match node.kind() {
            "identifier" => {
                let id = self.text(node).to_string();
                self.alloc(Node::Name { id }, node)
            }
            "attribute" => {
                let value = self.field_expr(node, "object");
                let attr = node
                    .child_by_field_name("attribute")
                    .map(|attr| self.text(attr).to_string())
                    .unwrap_or_default();
                self.alloc(Node::Attribute { value, attr }, node)
            }
            "subscript" => {
                let value = self.field_expr(node, "value");
                let parts = field_all(node, "subscript");
                let slice = if parts.len() == 1 {
                    self.expression(parts[0])
                } else {
                    let mut elts = Vec::new();
                    for part in parts {
                        elts.push(self.expression(part));
                    }
                    self.alloc(Node::Tuple { elts }, node)
                };
                self.alloc(Node::Subscript { value, slice }, node)
            }
            "slice" => {
                let mut parts: [Option<NodeId>; 3] = [None; 3];
                let mut index = 0;
                for child in all(node) {
                    if !child.is_named() {
                        if self.text(child) == ":" {
                            index += 1;
                        }
                    } else if index < 3 {
                        parts[index] = Some(self.expression(child));
                    }
                }
                let [lower, upper, step] = parts;
                self.alloc(Node::Slice { lower, upper, step }, node)
            }
            "call" => {
                let func = self.field_expr(node, "function");
                let args = match node.child_by_field_name("arguments") {
                    Some(args) if args.kind() == "argument_list" => self.arguments(args),
                    Some(args) => vec![self.expression(args)],
                    None => Vec::new(),
                };
                self.alloc(Node::Call { func, args }, node)
            }
            "keyword_argument" => {
                let name = node
                    .child_by_field_name("name")
                    .map(|name| self.text(name).to_string())
                    .unwrap_or_default();
                let value = self.field_expr(node, "value");
                self.alloc(Node::Keyword { name, value }, node)
            }
            "string" | "concatenated_string" => self.string(node),
            "integer" => {
                let value = Literal::Int(self.text(node).to_string());
                self.alloc(Node::Constant { value }, node)
            }
            "float" => {
                let value = Literal::Float(self.text(node).to_string());
                self.alloc(Node::Constant { value }, node)
            }
            "true" | "false" => {
                let value = Literal::Bool(node.kind() == "true");
                self.alloc(Node::Constant { value }, node)
            }
            "none" => self.alloc(
                Node::Constant {
                    value: Literal::None,
                },
                node,
            ),
            "ellipsis" => self.alloc(
                Node::Constant {
                    value: Literal::Ellipsis,
                },
                node,
            ),
            "list" | "list_pattern" => {
                let elts = self.elements(node);
                self.alloc(Node::List { elts }, node)
            }
            "tuple" | "tuple_pattern" | "expression_list" | "pattern_list" => {
                let elts = self.elements(node);
                self.alloc(Node::Tuple { elts }, node)
            }
            "set" => {
                let elts = self.elements(node);
                self.alloc(Node::Set { elts }, node)
            }
            "dictionary" => {
                let items = self.elements(node);
                self.alloc(Node::Dict { items }, node)
            }
            "pair" => {
                let key = self.field_expr(node, "key");
                let value = self.field_expr(node, "value");
                self.alloc(Node::Pair { key, value }, node)
            }
            "parenthesized_expression" => match named(node).first() {
                Some(inner) => self.expression(*inner),
                None => self.raw(node),
            },
            "binary_operator" | "boolean_operator" => {
                let left = self.field_expr(node, "left");
                let op = node
                    .child_by_field_name("operator")
                    .map(|op| self.text(op).to_string())
                    .unwrap_or_default();
                let right = self.field_expr(node, "right");
                if node.kind() == "boolean_operator" {
                    self.alloc(Node::BoolOp { left, op, right }, node)
                } else {
                    self.alloc(Node::BinOp { left, op, right }, node)
                }
            }
            "comparison_operator" => self.comparison(node),
            "not_operator" => {
                let operand = self.field_expr(node, "argument");
                self.alloc(
                    Node::UnaryOp {
                        op: "not".to_string(),
                        operand,
                    },
                    node,
                )
            }
            "unary_operator" => {
                let op = node
                    .child_by_field_name("operator")
                    .map(|op| self.text(op).to_string())
                    .unwrap_or_else(|| "-".to_string());
                let operand = self.field_expr(node, "argument");
                self.alloc(Node::UnaryOp { op, operand }, node)
            }
            "conditional_expression" => {
                let parts = named(node);
                if parts.len() != 3 {
                    return self.raw(node);
                }
                let body = self.expression(parts[0]);
                let test = self.expression(parts[1]);
                let orelse = self.expression(parts[2]);
                self.alloc(Node::IfExp { test, body, orelse }, node)
            }
            "lambda" => {
                let params = node
                    .child_by_field_name("parameters")
                    .map(|params| self.text(params).to_string())
                    .unwrap_or_default();
                let body = self.field_expr(node, "body");
                self.alloc(Node::Lambda { params, body }, node)
            }
            "await" => match named(node).first() {
                Some(inner) => {
                    let value = self.expression(*inner);
                    self.alloc(Node::Await { value }, node)
                }
                None => self.raw(node),
            },
            "yield" => {
                let from = has_child_kind(node, "from");
                let value = named(node).first().map(|inner| self.expression(*inner));
                self.alloc(Node::Yield { value, from }, node)
            }
            "named_expression" => {
                let target = self.field_expr(node, "name");
                let value = self.field_expr(node, "value");
                self.alloc(Node::NamedExpr { target, value }, node)
            }
            "list_comprehension" => self.comprehension(node, CompKind::List),
            "set_comprehension" => self.comprehension(node, CompKind::Set),
            "generator_expression" => self.comprehension(node, CompKind::Generator),
            "dictionary_comprehension" => self.comprehension(node, CompKind::Dict),
            "list_splat" | "list_splat_pattern" | "dictionary_splat" | "dictionary_splat_pattern" => {
                let double = node.kind().starts_with("dictionary");
                match named(node).first() {
                    Some(inner) => {
                        let value = self.expression(*inner);
                        self.alloc(Node::Starred { value, double }, node)
                    }
                    None => self.raw(node),
                }
            }
            "type" => self.type_expr(node),
            _ => self.raw(node),
        }
    }

    fn string(&mut self, node: TsNode<'_>) -> NodeId {
        let raw = self.text(node).to_string();
        let parts = if node.kind() == "concatenated_string" {
            named(node)
        } else {
            vec![node]
        };
        let interpolated = parts
            .iter()
            .any(|part| named(*part).iter().any(|c| c.kind() == "interpolation"));
        if interpolated {
            return self.alloc(Node::FormattedString { raw }, node);
        }
        let value = parts
            .iter()
            .map(|part| decode_string(self.text(*part)))
            .collect::<String>();
        self.alloc(
            Node::Constant {
                value: Literal::Str {
                    value,
                    raw: Some(raw),
                },
            },
            node,
        )
    }

    fn comparison(&mut self, node: TsNode<'_>) -> NodeId {
        let mut operands = Vec::new();
        let mut ops = Vec::new();
        let mut pending: Vec<&str> = Vec::new();
        for child in all(node) {
            if child.is_named() {
                if !pending.is_empty() {
                    ops.push(pending.join(" "));
                    pending.clear();
                }
                operands.push(self.expression(child));
            } else {
                pending.extend(self.text(child).split_whitespace());
            }
        }
        if operands.len() < 2 || ops.len() != operands.len() - 1 {
            return self.raw(node);
        }
        let left = operands.remove(0);
        self.alloc(
            Node::Compare {
                left,
                ops,
                comparators: operands,
            },
            node,
        )
    }

    fn comprehension(&mut self, node: TsNode<'_>, kind: CompKind) -> NodeId {
        let element = self.field_expr(node, "body");
        let mut generators: Vec<NodeId> = Vec::new();
        for child in named(node) {
            match child.kind() {
                "for_in_clause" => {
                    let target = self.field_expr(child, "left");
                    let iter = self.field_expr(child, "right");
                    let is_async = has_child_kind(child, "async");
                    generators.push(self.alloc(
                        Node::ForIn {
                            is_async,
                            target,
                            iter,
                            ifs: Vec::new(),
                        },
                        child,
                    ));
                }
                "if_clause" => {
                    let Some(last) = generators.last().copied() else {
                        continue;
                    };
                    let Some(inner) = named(child).first().copied() else {
                        continue;
                    };
                    let condition = self.expression(inner);
                    if let Node::ForIn { ifs, .. } = self.tree.node_mut(last) {
                        ifs.push(condition);
                    }
                    self.tree.set_parent(condition, Some(last));
                }
                _ => {}
            }
        }
        self.alloc(
            Node::Comprehension {
                kind,
                element,
                generators,
            },
            node,
        )
    }
}
