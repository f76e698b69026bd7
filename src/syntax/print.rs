use crate::syntax::tree::{CompKind, Literal, Node, NodeId, ParamKind, Tree};

// Binding strength, loosest first.
const NAMED: u8 = 1;
const YIELD: u8 = 2;
const TEST: u8 = 3;
const OR: u8 = 4;
const AND: u8 = 5;
const NOT: u8 = 6;
const CMP: u8 = 7;
const BOR: u8 = 8;
const BXOR: u8 = 9;
const BAND: u8 = 10;
const SHIFT: u8 = 11;
const ARITH: u8 = 12;
const TERM: u8 = 13;
const FACTOR: u8 = 14;
const POWER: u8 = 15;
const AWAIT: u8 = 16;
const ATOM: u8 = 17;

const INDENT: &str = "    ";

/// Print a module, statement or expression back to Python source.
///
/// Modules and statements end with a newline; expressions do not.
pub fn unparse(tree: &Tree, id: NodeId) -> String {
    let mut printer = Printer {
        tree,
        out: String::new(),
        indent: 0,
    };
    match tree.node(id) {
        Node::Module { body } => printer.statements(body),
        node if node.is_statement() => printer.statement(id),
        _ => return printer.expr(id, 0),
    }
    printer.out
}

/// Python double-quoted literal for a generated string.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

fn literal(value: &Literal) -> String {
    match value {
        Literal::Str { raw: Some(raw), .. } => raw.clone(),
        Literal::Str { value, raw: None } => quote(value),
        Literal::Int(text) | Literal::Float(text) => text.clone(),
        Literal::Bool(true) => "True".to_string(),
        Literal::Bool(false) => "False".to_string(),
        Literal::None => "None".to_string(),
        Literal::Ellipsis => "...".to_string(),
    }
}

fn binop_precedence(op: &str) -> u8 {
    match op {
        "|" => BOR,
        "^" => BXOR,
        "&" => BAND,
        "<<" | ">>" => SHIFT,
        "+" | "-" => ARITH,
        "**" => POWER,
        _ => TERM,
    }
}

struct Printer<'a> {
    tree: &'a Tree,
    out: String,
    indent: usize,
}

impl<'a> Printer<'a> {
    fn line(&mut self, text: &str) {
        if text.is_empty() {
            self.out.push('\n');
            return;
        }
        for _ in 0..self.indent {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn is_definition(&self, id: NodeId) -> bool {
        matches!(
            self.tree.node(id),
            Node::FunctionDef { .. } | Node::ClassDef { .. }
        )
    }

    fn statements(&mut self, stmts: &[NodeId]) {
        let blank_lines = if self.indent == 0 { 2 } else { 1 };
        for (index, stmt) in stmts.iter().enumerate() {
            if index > 0 && (self.is_definition(*stmt) || self.is_definition(stmts[index - 1])) {
                for _ in 0..blank_lines {
                    self.out.push('\n');
                }
            }
            self.statement(*stmt);
        }
    }

    fn suite(&mut self, body: &[NodeId]) {
        self.indent += 1;
        if body.is_empty() {
            self.line("pass");
        } else {
            self.statements(body);
        }
        self.indent -= 1;
    }

    fn statement(&mut self, id: NodeId) {
        let tree = self.tree;
        match tree.node(id) {
            Node::Module { body } => self.statements(body),
            Node::FunctionDef {
                name,
                is_async,
                decorators,
                params,
                returns,
                body,
            } => {
                self.decorators(decorators);
                let params = self.params(params);
                let returns = returns
                    .map(|ret| format!(" -> {}", self.expr(ret, TEST)))
                    .unwrap_or_default();
                let keyword = if *is_async { "async def" } else { "def" };
                self.line(&format!("{keyword} {name}({params}){returns}:"));
                self.suite(body);
            }
            Node::ClassDef {
                name,
                decorators,
                bases,
                body,
            } => {
                self.decorators(decorators);
                if bases.is_empty() {
                    self.line(&format!("class {name}:"));
                } else {
                    let bases = self.args(bases);
                    self.line(&format!("class {name}({bases}):"));
                }
                self.suite(body);
            }
            Node::Assign { targets, value } => {
                let mut parts: Vec<String> = targets
                    .iter()
                    .map(|target| self.expr(*target, TEST))
                    .collect();
                parts.push(self.expr(*value, YIELD));
                self.line(&parts.join(" = "));
            }
            Node::AnnAssign {
                target,
                annotation,
                value,
            } => {
                let mut text = format!(
                    "{}: {}",
                    self.expr(*target, TEST),
                    self.expr(*annotation, TEST)
                );
                if let Some(value) = value {
                    text.push_str(" = ");
                    text.push_str(&self.expr(*value, YIELD));
                }
                self.line(&text);
            }
            Node::AugAssign { target, op, value } => {
                let text = format!(
                    "{} {op} {}",
                    self.expr(*target, TEST),
                    self.expr(*value, YIELD)
                );
                self.line(&text);
            }
            Node::Expr { value } => {
                let text = self.expr(*value, YIELD);
                self.line(&text);
            }
            Node::Return { value } => match value {
                Some(value) => {
                    let text = format!("return {}", self.expr(*value, TEST));
                    self.line(&text);
                }
                None => self.line("return"),
            },
            Node::If { .. } => self.if_chain(id, "if"),
            Node::For {
                is_async,
                target,
                iter,
                body,
                orelse,
            } => {
                let keyword = if *is_async { "async for" } else { "for" };
                let text = format!(
                    "{keyword} {} in {}:",
                    self.expr(*target, TEST),
                    self.expr(*iter, TEST)
                );
                self.line(&text);
                self.suite(body);
                self.orelse(orelse);
            }
            Node::While { test, body, orelse } => {
                let text = format!("while {}:", self.expr(*test, NAMED));
                self.line(&text);
                self.suite(body);
                self.orelse(orelse);
            }
            Node::Try {
                body,
                handlers,
                orelse,
                finalbody,
            } => {
                self.line("try:");
                self.suite(body);
                for handler in handlers {
                    self.statement(*handler);
                }
                self.orelse(orelse);
                if !finalbody.is_empty() {
                    self.line("finally:");
                    self.suite(finalbody);
                }
            }
            Node::ExceptHandler {
                star,
                kind,
                name,
                body,
            } => {
                let mut text = String::from(if *star { "except*" } else { "except" });
                if let Some(kind) = kind {
                    text.push(' ');
                    text.push_str(&self.expr(*kind, TEST));
                }
                if let Some(name) = name {
                    text.push_str(" as ");
                    text.push_str(name);
                }
                text.push(':');
                self.line(&text);
                self.suite(body);
            }
            Node::With {
                is_async,
                items,
                body,
            } => {
                let keyword = if *is_async { "async with" } else { "with" };
                let items: Vec<String> = items.iter().map(|item| self.expr(*item, TEST)).collect();
                self.line(&format!("{keyword} {}:", items.join(", ")));
                self.suite(body);
            }
            Node::Raise { exc, cause } => {
                let mut text = String::from("raise");
                if let Some(exc) = exc {
                    text.push(' ');
                    text.push_str(&self.expr(*exc, TEST));
                }
                if let Some(cause) = cause {
                    text.push_str(" from ");
                    text.push_str(&self.expr(*cause, TEST));
                }
                self.line(&text);
            }
            Node::Assert { test, msg } => {
                let mut text = format!("assert {}", self.expr(*test, TEST));
                if let Some(msg) = msg {
                    text.push_str(", ");
                    text.push_str(&self.expr(*msg, TEST));
                }
                self.line(&text);
            }
            Node::Delete { targets } => {
                let targets: Vec<String> = targets.iter().map(|t| self.expr(*t, TEST)).collect();
                self.line(&format!("del {}", targets.join(", ")));
            }
            Node::Pass => self.line("pass"),
            Node::Break => self.line("break"),
            Node::Continue => self.line("continue"),
            Node::Import { names } => {
                let names: Vec<String> = names.iter().map(alias_text).collect();
                self.line(&format!("import {}", names.join(", ")));
            }
            Node::ImportFrom { module, names } => {
                let names: Vec<String> = names.iter().map(alias_text).collect();
                self.line(&format!("from {module} import {}", names.join(", ")));
            }
            Node::Raw { text } => {
                for line in text.lines() {
                    self.line(line);
                }
            }
            _ => {
                let text = self.expr(id, YIELD);
                self.line(&text);
            }
        }
    }

    fn decorators(&mut self, decorators: &[NodeId]) {
        for decorator in decorators {
            let text = format!("@{}", self.expr(*decorator, NAMED));
            self.line(&text);
        }
    }

    fn orelse(&mut self, orelse: &[NodeId]) {
        if !orelse.is_empty() {
            self.line("else:");
            self.suite(orelse);
        }
    }

    fn if_chain(&mut self, id: NodeId, keyword: &str) {
        let tree = self.tree;
        let Node::If { test, body, orelse } = tree.node(id) else {
            return;
        };
        let text = format!("{keyword} {}:", self.expr(*test, NAMED));
        self.line(&text);
        self.suite(body);
        if orelse.len() == 1 && matches!(tree.node(orelse[0]), Node::If { .. }) {
            self.if_chain(orelse[0], "elif");
        } else {
            self.orelse(orelse);
        }
    }

    fn params(&self, params: &[NodeId]) -> String {
        let parts: Vec<String> = params.iter().map(|param| self.param(*param)).collect();
        parts.join(", ")
    }

    fn param(&self, id: NodeId) -> String {
        let Node::Param {
            name,
            kind,
            annotation,
            default,
        } = self.tree.node(id)
        else {
            return self.expr(id, TEST);
        };
        let mut text = match kind {
            ParamKind::Normal => name.clone(),
            ParamKind::VarArgs => format!("*{name}"),
            ParamKind::KwArgs => format!("**{name}"),
            ParamKind::KwOnlyMarker => "*".to_string(),
            ParamKind::PosOnlyMarker => "/".to_string(),
        };
        if let Some(annotation) = annotation {
            text.push_str(": ");
            text.push_str(&self.expr(*annotation, TEST));
        }
        if let Some(default) = default {
            text.push_str(if annotation.is_some() { " = " } else { "=" });
            text.push_str(&self.expr(*default, TEST));
        }
        text
    }

    fn args(&self, args: &[NodeId]) -> String {
        let parts: Vec<String> = args.iter().map(|arg| self.expr(*arg, TEST)).collect();
        parts.join(", ")
    }

    fn expr(&self, id: NodeId, min: u8) -> String {
        let (text, precedence) = self.expr_inner(id);
        if precedence < min {
            format!("({text})")
        } else {
            text
        }
    }

    fn expr_inner(&self, id: NodeId) -> (String, u8) {
        match self.tree.node(id) {
            Node::Name { id } => (id.clone(), ATOM),
            Node::Constant { value } => (literal(value), ATOM),
            Node::FormattedString { raw } => (raw.clone(), ATOM),
            Node::Raw { text } => (text.clone(), ATOM),
            Node::Attribute { value, attr } => {
                (format!("{}.{attr}", self.expr(*value, ATOM)), ATOM)
            }
            Node::Subscript { value, slice } => (
                format!("{}[{}]", self.expr(*value, ATOM), self.slice(*slice)),
                ATOM,
            ),
            Node::Slice { lower, upper, step } => {
                let part = |part: &Option<NodeId>| {
                    part.map(|part| self.expr(part, TEST)).unwrap_or_default()
                };
                let mut text = format!("{}:{}", part(lower), part(upper));
                if step.is_some() {
                    text.push(':');
                    text.push_str(&part(step));
                }
                (text, ATOM)
            }
            Node::Call { func, args } => (
                format!("{}({})", self.expr(*func, ATOM), self.args(args)),
                ATOM,
            ),
            Node::Keyword { name, value } => (format!("{name}={}", self.expr(*value, TEST)), ATOM),
            Node::List { elts } => (format!("[{}]", self.args(elts)), ATOM),
            Node::Tuple { elts } => {
                let text = match elts.len() {
                    0 => "()".to_string(),
                    1 => format!("({},)", self.expr(elts[0], TEST)),
                    _ => format!("({})", self.args(elts)),
                };
                (text, ATOM)
            }
            Node::Set { elts } => {
                if elts.is_empty() {
                    ("set()".to_string(), ATOM)
                } else {
                    (format!("{{{}}}", self.args(elts)), ATOM)
                }
            }
            Node::Dict { items } => (format!("{{{}}}", self.args(items)), ATOM),
            Node::Pair { key, value } => (
                format!("{}: {}", self.expr(*key, TEST), self.expr(*value, TEST)),
                ATOM,
            ),
            Node::Starred { value, double } => {
                let stars = if *double { "**" } else { "*" };
                (format!("{stars}{}", self.expr(*value, BOR)), ATOM)
            }
            Node::BinOp { left, op, right } => {
                let precedence = binop_precedence(op);
                let (left_min, right_min) = if precedence == POWER {
                    (precedence + 1, precedence)
                } else {
                    (precedence, precedence + 1)
                };
                (
                    format!(
                        "{} {op} {}",
                        self.expr(*left, left_min),
                        self.expr(*right, right_min)
                    ),
                    precedence,
                )
            }
            Node::BoolOp { left, op, right } => {
                let precedence = if op == "and" { AND } else { OR };
                (
                    format!(
                        "{} {op} {}",
                        self.expr(*left, precedence),
                        self.expr(*right, precedence + 1)
                    ),
                    precedence,
                )
            }
            Node::Compare {
                left,
                ops,
                comparators,
            } => {
                let mut text = self.expr(*left, CMP + 1);
                for (op, comparator) in ops.iter().zip(comparators) {
                    text.push(' ');
                    text.push_str(op);
                    text.push(' ');
                    text.push_str(&self.expr(*comparator, CMP + 1));
                }
                (text, CMP)
            }
            Node::UnaryOp { op, operand } => {
                if op == "not" {
                    (format!("not {}", self.expr(*operand, NOT)), NOT)
                } else {
                    (format!("{op}{}", self.expr(*operand, FACTOR)), FACTOR)
                }
            }
            Node::IfExp { test, body, orelse } => (
                format!(
                    "{} if {} else {}",
                    self.expr(*body, OR),
                    self.expr(*test, OR),
                    self.expr(*orelse, TEST)
                ),
                TEST,
            ),
            Node::Lambda { params, body } => {
                let head = if params.is_empty() {
                    "lambda".to_string()
                } else {
                    format!("lambda {params}")
                };
                (format!("{head}: {}", self.expr(*body, TEST)), TEST)
            }
            Node::Await { value } => (format!("await {}", self.expr(*value, ATOM)), AWAIT),
            Node::Yield { value, from } => {
                let keyword = if *from { "yield from" } else { "yield" };
                match value {
                    Some(value) => (format!("{keyword} {}", self.expr(*value, TEST)), YIELD),
                    None => (keyword.to_string(), YIELD),
                }
            }
            Node::NamedExpr { target, value } => (
                format!("{} := {}", self.expr(*target, ATOM), self.expr(*value, TEST)),
                NAMED,
            ),
            Node::Comprehension {
                kind,
                element,
                generators,
            } => {
                let mut inner = self.expr(*element, TEST);
                for generator in generators {
                    inner.push(' ');
                    inner.push_str(&self.generator(*generator));
                }
                let text = match kind {
                    CompKind::List => format!("[{inner}]"),
                    CompKind::Set | CompKind::Dict => format!("{{{inner}}}"),
                    CompKind::Generator => format!("({inner})"),
                };
                (text, ATOM)
            }
            Node::ForIn { .. } => (self.generator(id), ATOM),
            Node::Param { .. } => (self.param(id), ATOM),
            Node::WithItem { context, target } => {
                let mut text = self.expr(*context, TEST);
                if let Some(target) = target {
                    text.push_str(" as ");
                    text.push_str(&self.expr(*target, TEST));
                }
                (text, ATOM)
            }
            other => (other.kind_name().to_string(), ATOM),
        }
    }

    fn generator(&self, id: NodeId) -> String {
        let Node::ForIn {
            is_async,
            target,
            iter,
            ifs,
        } = self.tree.node(id)
        else {
            return String::new();
        };
        let keyword = if *is_async { "async for" } else { "for" };
        let mut text = format!(
            "{keyword} {} in {}",
            self.expr(*target, TEST),
            self.expr(*iter, OR)
        );
        for condition in ifs {
            text.push_str(" if ");
            text.push_str(&self.expr(*condition, OR));
        }
        text
    }

    fn slice(&self, id: NodeId) -> String {
        match self.tree.node(id) {
            Node::Tuple { elts } if elts.len() == 1 => format!("{},", self.expr(elts[0], TEST)),
            Node::Tuple { elts } if !elts.is_empty() => self.args(elts),
            _ => self.expr(id, TEST),
        }
    }
}

fn alias_text(alias: &crate::syntax::tree::Alias) -> String {
    match &alias.asname {
        Some(asname) => format!("{} as {asname}", alias.name),
        None => alias.name.clone(),
    }
}
