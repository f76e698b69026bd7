//! Request-access and response-shape inference for one handler.
//!
//! The handler body is walked once, read-only, to collect every use of the
//! implicit `request` value and every response construction. The collected
//! idioms are then rewritten in place; statement removals are queued as edit
//! operations for the caller to apply.

use crate::diagnostics::ModuleScope;
use crate::edit::EditOperation;
use crate::naming;
use crate::syntax::{Literal, Node, NodeId, Tree, unparse};
use indexmap::IndexMap;

const REQUEST: &str = "request";
const BODY_CARRIER: &str = "data";
const QUERY_CARRIERS: [&str; 2] = ["query_params", "GET"];
const RESPONSE_HELPER: &str = "Response";
const SUCCESS_STATUS: &str = "HTTP_200_OK";

/// One synthesized call-signature entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescriptor {
    pub name: String,
    pub default: Option<NodeId>,
    pub annotation: Option<NodeId>,
}

#[derive(Debug, Default)]
pub struct PayloadInference {
    /// Required parameters first, then defaulted ones, each group in encounter order.
    pub params: Vec<ParameterDescriptor>,
    /// `PayloadInput... = TypedDict(...)`, present iff the body was read.
    pub input_type: Option<NodeId>,
    /// `PayloadOutput... = ...`, present iff a response carried a payload.
    pub output_type: Option<NodeId>,
    pub output_name: Option<String>,
    /// Statement removals that must run after the handler is in its final place.
    pub operations: Vec<EditOperation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldType {
    Any,
    OptionalAny,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Annotation {
    Str,
    OptionalStr,
    Any,
    Named(String),
}

#[derive(Debug)]
struct ParamEntry {
    default: Option<NodeId>,
    annotation: Annotation,
    injected: bool,
}

#[derive(Debug)]
enum Access {
    BodyField {
        carrier: NodeId,
        key: String,
        optional: bool,
    },
    Body {
        carrier: NodeId,
    },
    Query {
        key: String,
        default: Option<NodeId>,
        optional: bool,
        accessor: NodeId,
        rebinding: Option<NodeId>,
    },
    Dependency {
        name: String,
        attribute: NodeId,
    },
}

/// Coarse shape of a returned payload.
#[derive(Debug, Clone, PartialEq)]
enum Shape {
    Literal(&'static str),
    List,
    Str,
    Dict(Vec<(String, Shape)>),
    /// A dict literal with a spread or a non-string key; its keys are unknown.
    OpenDict,
    Any,
}

impl Shape {
    fn tag(&self) -> String {
        match self {
            Shape::Literal(name) => (*name).to_string(),
            Shape::List => "list".to_string(),
            Shape::Str => "str".to_string(),
            Shape::Any => "Any".to_string(),
            Shape::OpenDict => "dict:*".to_string(),
            Shape::Dict(fields) => {
                let fields: Vec<String> = fields
                    .iter()
                    .map(|(key, shape)| format!("{key}={}", shape.tag()))
                    .collect();
                format!("dict:{}", fields.join(","))
            }
        }
    }
}

/// Infer the parameters and payload types of `handler` and rewrite its request
/// accesses and response constructions.
///
/// `context` disambiguates generated type names; it is empty for bare functions
/// and the owning view's name for methods.
pub fn infer_payloads(
    tree: &mut Tree,
    handler: NodeId,
    context: &str,
    scope: &ModuleScope<'_>,
) -> PayloadInference {
    let handler_name = tree.declaration_name(handler).unwrap_or_default().to_string();
    let input_name = naming::payload_input_name(context, &handler_name);
    let output_name = naming::payload_output_name(context, &handler_name);

    let mut collector = Collector::default();
    for stmt in tree.body(handler) {
        for id in tree.walk(*stmt) {
            collector.visit(tree, id);
        }
    }
    if !collector.misses.is_empty() {
        let snippet = unparse(tree, handler);
        for (message, line) in &collector.misses {
            scope.warn(message, &snippet, *line);
        }
    }

    let mut params: IndexMap<String, ParamEntry> = IndexMap::new();
    let mut body: Option<IndexMap<String, FieldType>> = None;
    let mut operations = Vec::new();
    for access in collector.accesses {
        match access {
            Access::BodyField {
                carrier,
                key,
                optional,
            } => {
                register_body(&mut params, &input_name);
                let fields = body.get_or_insert_with(IndexMap::new);
                let observed = if optional {
                    FieldType::OptionalAny
                } else {
                    FieldType::Any
                };
                match fields.get(&key).copied() {
                    Some(existing) if existing != observed => {
                        scope.warn(
                            &format!(
                                "body field `{key}` is read both with and without a default; typing it Optional[Any]"
                            ),
                            &handler_name,
                            tree.line(carrier),
                        );
                        fields.insert(key, FieldType::OptionalAny);
                    }
                    Some(_) => {}
                    None => {
                        fields.insert(key, observed);
                    }
                }
                tree.replace_node(
                    carrier,
                    Node::Name {
                        id: BODY_CARRIER.to_string(),
                    },
                );
            }
            Access::Body { carrier } => {
                register_body(&mut params, &input_name);
                body.get_or_insert_with(IndexMap::new);
                tree.replace_node(
                    carrier,
                    Node::Name {
                        id: BODY_CARRIER.to_string(),
                    },
                );
            }
            Access::Query {
                key,
                default,
                optional,
                accessor,
                rebinding,
            } => {
                let annotation = if optional {
                    Annotation::OptionalStr
                } else {
                    Annotation::Str
                };
                params.entry(key.clone()).or_insert(ParamEntry {
                    default,
                    annotation,
                    injected: false,
                });
                match rebinding {
                    Some(stmt) => operations.push(EditOperation::Remove { target: stmt }),
                    None => tree.replace_node(accessor, Node::Name { id: key }),
                }
            }
            Access::Dependency { name, attribute } => {
                params.entry(name.clone()).or_insert(ParamEntry {
                    default: None,
                    annotation: Annotation::Any,
                    injected: true,
                });
                tree.replace_node(attribute, Node::Name { id: name });
            }
        }
    }

    let mut shapes: Vec<Shape> = Vec::new();
    let mut open_dicts = Vec::new();
    for call in collector.responses {
        if let Some(shape) = rewrite_response(tree, call, &mut open_dicts) {
            if !shapes.iter().any(|seen| seen.tag() == shape.tag()) {
                shapes.push(shape);
            }
        }
    }
    if !open_dicts.is_empty() {
        let snippet = unparse(tree, handler);
        for line in open_dicts {
            scope.warn(
                "response dict has a spread or non-string key; its type is left as Any",
                &snippet,
                line,
            );
        }
    }

    let input_type = body.map(|fields| build_input_type(tree, &input_name, &fields));
    let output_type = resolve_output(tree, &output_name, &shapes);
    PayloadInference {
        params: build_params(tree, params),
        input_type,
        output_name: output_type.map(|_| output_name),
        output_type,
        operations,
    }
}

fn register_body(params: &mut IndexMap<String, ParamEntry>, input_name: &str) {
    params
        .entry(BODY_CARRIER.to_string())
        .or_insert_with(|| ParamEntry {
            default: None,
            annotation: Annotation::Named(input_name.to_string()),
            injected: false,
        });
}

#[derive(Default)]
struct Collector {
    accesses: Vec<Access>,
    responses: Vec<NodeId>,
    misses: Vec<(String, Option<u32>)>,
}

impl Collector {
    fn visit(&mut self, tree: &Tree, id: NodeId) {
        match tree.node(id) {
            Node::Name { id: name } if name == REQUEST => match classify(tree, id) {
                Ok(access) => self.accesses.push(access),
                Err(message) => self.misses.push((message, tree.line(id))),
            },
            Node::Call { func, .. } if tree.name_id(*func) == Some(RESPONSE_HELPER) => {
                self.responses.push(id);
            }
            Node::Raw { text } if text.contains(REQUEST) => self.misses.push((
                "request is used inside a construct that cannot be analysed".to_string(),
                tree.line(id),
            )),
            _ => {}
        }
    }
}

/// `carrier.get(...)` call, when `carrier` is the receiver of a `.get`.
fn get_call(tree: &Tree, carrier: NodeId) -> Option<NodeId> {
    let attribute = tree.parent(carrier)?;
    match tree.node(attribute) {
        Node::Attribute { value, attr } if *value == carrier && attr == "get" => {}
        _ => return None,
    }
    let call = tree.parent(attribute)?;
    match tree.node(call) {
        Node::Call { func, .. } if *func == attribute => Some(call),
        _ => None,
    }
}

/// `carrier[...]` subscript and its key node.
fn subscript_of(tree: &Tree, carrier: NodeId) -> Option<(NodeId, NodeId)> {
    let parent = tree.parent(carrier)?;
    match tree.node(parent) {
        Node::Subscript { value, slice } if *value == carrier => Some((parent, *slice)),
        _ => None,
    }
}

fn positional_args(tree: &Tree, call: NodeId) -> Vec<NodeId> {
    match tree.node(call) {
        Node::Call { args, .. } => args
            .iter()
            .copied()
            .filter(|arg| {
                !matches!(
                    tree.node(*arg),
                    Node::Keyword { .. } | Node::Starred { .. }
                )
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn literal_key(tree: &Tree, key: Option<NodeId>, carrier: &str) -> Result<String, String> {
    match key.and_then(|key| tree.str_value(key)) {
        Some(key) => Ok(key.to_string()),
        None => Err(format!(
            "request.{carrier} is read with a key that is not a string literal"
        )),
    }
}

fn classify(tree: &Tree, request: NodeId) -> Result<Access, String> {
    let carrier = match tree.parent(request) {
        Some(parent) => parent,
        None => return Err("request is used outside of an expression".to_string()),
    };
    let attr = match tree.node(carrier) {
        Node::Attribute { value, attr } if *value == request => attr.as_str(),
        _ => return Err("request is used without an attribute access".to_string()),
    };

    if attr == BODY_CARRIER {
        if let Some(call) = get_call(tree, carrier) {
            let args = positional_args(tree, call);
            let key = literal_key(tree, args.first().copied(), attr)?;
            return Ok(Access::BodyField {
                carrier,
                key,
                optional: args.len() > 1,
            });
        }
        if let Some((_, slice)) = subscript_of(tree, carrier) {
            let key = literal_key(tree, Some(slice), attr)?;
            return Ok(Access::BodyField {
                carrier,
                key,
                optional: false,
            });
        }
        if let Some(parent) = tree.parent(carrier) {
            if let Node::Attribute { value, attr: method } = tree.node(parent) {
                if *value == carrier {
                    return Err(format!("unsupported request body access `.{method}`"));
                }
            }
        }
        return Ok(Access::Body { carrier });
    }

    if QUERY_CARRIERS.contains(&attr) {
        let (accessor, key, default, optional) = if let Some(call) = get_call(tree, carrier) {
            let args = positional_args(tree, call);
            let key = literal_key(tree, args.first().copied(), attr)?;
            (call, key, args.get(1).copied(), true)
        } else if let Some((subscript, slice)) = subscript_of(tree, carrier) {
            let key = literal_key(tree, Some(slice), attr)?;
            (subscript, key, None, false)
        } else {
            return Err(format!("request.{attr} is used without reading a key"));
        };
        let rebinding = tree.parent(accessor).filter(|stmt| match tree.node(*stmt) {
            Node::Assign { targets, value } => {
                *value == accessor
                    && targets.len() == 1
                    && tree.name_id(targets[0]) == Some(key.as_str())
            }
            _ => false,
        });
        return Ok(Access::Query {
            key,
            default,
            optional,
            accessor,
            rebinding,
        });
    }

    Ok(Access::Dependency {
        name: attr.to_string(),
        attribute: carrier,
    })
}

fn build_params(tree: &mut Tree, params: IndexMap<String, ParamEntry>) -> Vec<ParameterDescriptor> {
    let mut required = Vec::new();
    let mut defaulted = Vec::new();
    for (name, entry) in params {
        let annotation = match &entry.annotation {
            Annotation::Str => tree.name("str"),
            Annotation::OptionalStr => optional_of(tree, "str"),
            Annotation::Any => tree.name("Any"),
            Annotation::Named(type_name) => tree.name(type_name.as_str()),
        };
        let default = if entry.injected {
            let depends = tree.name("Depends");
            let provider = tree.name(format!("get_{name}"));
            Some(tree.call(depends, vec![provider]))
        } else {
            entry.default
        };
        let descriptor = ParameterDescriptor {
            name,
            default,
            annotation: Some(annotation),
        };
        if descriptor.default.is_some() {
            defaulted.push(descriptor);
        } else {
            required.push(descriptor);
        }
    }
    required.extend(defaulted);
    required
}

fn optional_of(tree: &mut Tree, inner: &str) -> NodeId {
    let optional = tree.name("Optional");
    let inner = tree.name(inner);
    tree.subscript(optional, inner)
}

fn typed_dict(tree: &mut Tree, name: &str, fields: Vec<(String, NodeId)>) -> NodeId {
    let func = tree.name("TypedDict");
    let title = tree.string(name);
    let items = fields
        .into_iter()
        .map(|(key, value)| {
            let key = tree.string(key);
            tree.alloc(Node::Pair { key, value })
        })
        .collect();
    let dict = tree.alloc(Node::Dict { items });
    tree.call(func, vec![title, dict])
}

fn build_input_type(tree: &mut Tree, name: &str, fields: &IndexMap<String, FieldType>) -> NodeId {
    let fields = fields
        .iter()
        .map(|(key, field)| {
            let value = match field {
                FieldType::Any => tree.name("Any"),
                FieldType::OptionalAny => optional_of(tree, "Any"),
            };
            (key.clone(), value)
        })
        .collect();
    let value = typed_dict(tree, name, fields);
    tree.assign(name, value)
}

/// Collapse the observed shapes: any open dict makes the payload `Any`, otherwise
/// the first dict shape wins outright, otherwise a single type or a `Union` of
/// every distinct one.
fn resolve_output(tree: &mut Tree, name: &str, shapes: &[Shape]) -> Option<NodeId> {
    if shapes.iter().any(|shape| matches!(shape, Shape::OpenDict)) {
        let value = tree.name("Any");
        return Some(tree.assign(name, value));
    }
    let value = match shapes.iter().find(|shape| matches!(shape, Shape::Dict(_))) {
        Some(dict) => shape_type(tree, dict, name),
        None => match shapes {
            [] => return None,
            [single] => shape_type(tree, single, name),
            many => {
                let union = tree.name("Union");
                let elts = many
                    .iter()
                    .map(|shape| shape_type(tree, shape, name))
                    .collect();
                let members = tree.alloc(Node::Tuple { elts });
                tree.subscript(union, members)
            }
        },
    };
    Some(tree.assign(name, value))
}

fn shape_type(tree: &mut Tree, shape: &Shape, name: &str) -> NodeId {
    match shape {
        Shape::Literal(type_name) => tree.name(*type_name),
        Shape::List => tree.name("list"),
        Shape::Str => tree.name("str"),
        Shape::Any | Shape::OpenDict => tree.name("Any"),
        Shape::Dict(fields) => {
            let fields = fields
                .iter()
                .map(|(key, field)| {
                    let nested = format!("{name}{}", naming::to_pascal_case(key));
                    (key.clone(), shape_type(tree, field, &nested))
                })
                .collect();
            typed_dict(tree, name, fields)
        }
    }
}

/// Shape of a payload expression. Lines of dict literals whose keys cannot all
/// be read are pushed to `open`.
fn shape_of(tree: &Tree, node: NodeId, open: &mut Vec<Option<u32>>) -> Shape {
    match tree.node(node) {
        Node::Constant {
            value: Literal::Str { .. },
        }
        | Node::FormattedString { .. } => Shape::Str,
        Node::Constant { value } => Shape::Literal(value.type_name()),
        Node::List { .. }
        | Node::Comprehension {
            kind: crate::syntax::CompKind::List,
            ..
        } => Shape::List,
        Node::Dict { items } => {
            let mut fields = Vec::with_capacity(items.len());
            for item in items {
                let field = match tree.node(*item) {
                    Node::Pair { key, value } => tree
                        .str_value(*key)
                        .map(|key| (key.to_string(), *value)),
                    _ => None,
                };
                match field {
                    Some((key, value)) => fields.push((key, shape_of(tree, value, open))),
                    None => {
                        open.push(tree.line(node));
                        return Shape::OpenDict;
                    }
                }
            }
            Shape::Dict(fields)
        }
        _ => Shape::Any,
    }
}

fn argument(tree: &Tree, call: NodeId, position: usize, keyword: &str) -> Option<NodeId> {
    let Node::Call { args, .. } = tree.node(call) else {
        return None;
    };
    for arg in args {
        if let Node::Keyword { name, value } = tree.node(*arg) {
            if name == keyword {
                return Some(*value);
            }
        }
    }
    positional_args(tree, call).get(position).copied()
}

fn is_success(tree: &Tree, status: Option<NodeId>) -> bool {
    let Some(status) = status else {
        return true;
    };
    match tree.node(status) {
        Node::Name { id } => id == SUCCESS_STATUS,
        Node::Attribute { attr, .. } => attr == SUCCESS_STATUS,
        Node::Constant {
            value: Literal::Int(value),
        } => value == "200",
        _ => false,
    }
}

/// Rewrite one `Response(...)` in place and return the shape of its payload.
fn rewrite_response(tree: &mut Tree, call: NodeId, open: &mut Vec<Option<u32>>) -> Option<Shape> {
    let payload = argument(tree, call, 0, "data");
    let status = argument(tree, call, 1, "status");
    let shape = payload.map(|payload| shape_of(tree, payload, open));
    match payload {
        Some(payload) if is_success(tree, status) => {
            let collapsed = tree.node(payload).clone();
            let line = tree.line(payload);
            tree.replace_node(call, collapsed);
            if tree.line(call).is_none() {
                tree.set_line(call, line);
            }
        }
        _ => {
            let func = tree.name(RESPONSE_HELPER);
            let payload = match payload {
                Some(payload) => payload,
                None => tree.alloc(Node::Constant {
                    value: Literal::None,
                }),
            };
            let status = match status {
                Some(status) => status,
                None => {
                    let module = tree.name("status");
                    tree.attribute(module, SUCCESS_STATUS)
                }
            };
            tree.replace_node(
                call,
                Node::Call {
                    func,
                    args: vec![payload, status],
                },
            );
        }
    }
    shape
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{Diagnostics, DiagnosticsSink};
    use crate::edit;
    use crate::syntax::parse_module;

    struct Inferred {
        tree: Tree,
        handler: NodeId,
        inference: PayloadInference,
        warnings: usize,
    }

    fn infer(source: &str, context: &str) -> Inferred {
        let mut tree = parse_module(source).unwrap();
        let handler = tree.module_body()[0];
        let diagnostics = Diagnostics::new();
        let scope = ModuleScope::new(&diagnostics, "views");
        let inference = infer_payloads(&mut tree, handler, context, &scope);
        edit::apply(&mut tree, &inference.operations).unwrap();
        Inferred {
            tree,
            handler,
            inference,
            warnings: diagnostics.warning_count(),
        }
    }

    fn signature(inferred: &Inferred) -> Vec<String> {
        inferred
            .inference
            .params
            .iter()
            .map(|param| {
                let mut text = param.name.clone();
                if let Some(annotation) = param.annotation {
                    text.push_str(": ");
                    text.push_str(&unparse(&inferred.tree, annotation));
                }
                if let Some(default) = param.default {
                    text.push_str(" = ");
                    text.push_str(&unparse(&inferred.tree, default));
                }
                text
            })
            .collect()
    }

    fn body(inferred: &Inferred) -> String {
        let tree = &inferred.tree;
        tree.body(inferred.handler)
            .iter()
            .map(|stmt| unparse(tree, *stmt))
            .collect()
    }

    #[test]
    fn query_get_becomes_optional_parameter_and_drops_rebinding() {
        let inferred = infer(
            "def my_view(request):\n    category = request.query_params.get(\"category\")\n    return category\n",
            "",
        );
        assert_eq!(signature(&inferred), vec!["category: Optional[str]"]);
        assert_eq!(inferred.inference.params[0].default, None);
        assert_eq!(body(&inferred), "return category\n");
    }

    #[test]
    fn query_values_bound_to_other_names_are_rewritten() {
        let inferred = infer(
            "def f(request):\n    cat = request.GET.get(\"category\", \"\")\n    blo = request.query_params[\"blo\"]\n",
            "",
        );
        assert_eq!(signature(&inferred), vec!["blo: str", "category: Optional[str] = \"\""]);
        assert_eq!(body(&inferred), "cat = category\n");
    }

    #[test]
    fn body_subscript_yields_single_data_parameter() {
        let inferred = infer("def my_view(request):\n    posts = request.data[\"posts\"]\n", "");
        assert_eq!(signature(&inferred), vec!["data: PayloadInputMyView"]);
        assert_eq!(body(&inferred), "posts = data[\"posts\"]\n");
        let input = inferred.inference.input_type.unwrap();
        assert_eq!(
            unparse(&inferred.tree, input),
            "PayloadInputMyView = TypedDict(\"PayloadInputMyView\", {\"posts\": Any})\n"
        );
    }

    #[test]
    fn body_get_with_default_is_optional() {
        let inferred = infer(
            "def my_view(request):\n    a = request.data.get(\"comments\", [])\n    b = request.data.get(\"title\")\n",
            "",
        );
        let input = inferred.inference.input_type.unwrap();
        assert_eq!(
            unparse(&inferred.tree, input),
            "PayloadInputMyView = TypedDict(\"PayloadInputMyView\", {\"comments\": Optional[Any], \"title\": Any})\n"
        );
        assert_eq!(
            body(&inferred),
            "a = data.get(\"comments\", [])\nb = data.get(\"title\")\n"
        );
    }

    #[test]
    fn bare_body_initialises_empty_record() {
        let inferred = infer("def my_view(request):\n    data = request.data\n", "");
        assert_eq!(signature(&inferred), vec!["data: PayloadInputMyView"]);
        let input = inferred.inference.input_type.unwrap();
        assert_eq!(
            unparse(&inferred.tree, input),
            "PayloadInputMyView = TypedDict(\"PayloadInputMyView\", {})\n"
        );
    }

    #[test]
    fn other_attributes_are_injected() {
        let inferred = infer("def my_view(request):\n    prop = request.prop\n", "");
        assert_eq!(signature(&inferred), vec!["prop: Any = Depends(get_prop)"]);
        assert_eq!(body(&inferred), "prop = prop\n");
    }

    #[test]
    fn required_parameters_precede_defaulted_ones() {
        let inferred = infer(
            "def f(request):\n    u = request.user\n    a = request.GET.get(\"a\", 1)\n    b = request.GET[\"b\"]\n    d = request.data[\"x\"]\n",
            "",
        );
        assert_eq!(
            signature(&inferred),
            vec![
                "b: str",
                "data: PayloadInputF",
                "user: Any = Depends(get_user)",
                "a: Optional[str] = 1",
            ]
        );
    }

    #[test]
    fn conflicting_body_reads_warn_and_widen() {
        let inferred = infer(
            "def f(request):\n    a = request.data[\"k\"]\n    b = request.data.get(\"k\", 0)\n",
            "",
        );
        assert_eq!(inferred.warnings, 1);
        let input = inferred.inference.input_type.unwrap();
        assert!(unparse(&inferred.tree, input).contains("\"k\": Optional[Any]"));
    }

    #[test]
    fn unrecognised_request_use_warns_and_is_left_alone() {
        let inferred = infer(
            "def f(request):\n    helper(request)\n    x = request.data[key]\n",
            "",
        );
        assert_eq!(inferred.warnings, 2);
        assert_eq!(body(&inferred), "helper(request)\nx = request.data[key]\n");
        assert!(inferred.inference.params.is_empty());
    }

    #[test]
    fn success_response_collapses_to_payload() {
        let inferred = infer(
            "def f(request):\n    return Response({\"id\": 1}, status=status.HTTP_200_OK)\n",
            "",
        );
        assert_eq!(body(&inferred), "return {\"id\": 1}\n");
        assert_eq!(inferred.inference.output_name.as_deref(), Some("PayloadOutputF"));
        let output = inferred.inference.output_type.unwrap();
        assert_eq!(
            unparse(&inferred.tree, output),
            "PayloadOutputF = TypedDict(\"PayloadOutputF\", {\"id\": int})\n"
        );
    }

    #[test]
    fn other_statuses_keep_an_explicit_response() {
        let inferred = infer(
            "def f(request):\n    if x:\n        return Response(\"missing\", status.HTTP_404_NOT_FOUND)\n    return Response(status=200)\n",
            "",
        );
        assert_eq!(
            body(&inferred),
            "if x:\n    return Response(\"missing\", status.HTTP_404_NOT_FOUND)\nreturn Response(None, 200)\n"
        );
        let output = inferred.inference.output_type.unwrap();
        assert_eq!(unparse(&inferred.tree, output), "PayloadOutputF = str\n");
    }

    #[test]
    fn dict_shape_wins_over_other_shapes() {
        let inferred = infer(
            "def f(request):\n    if a:\n        return Response([1])\n    if b:\n        return Response(1)\n    return Response({\"items\": [], \"meta\": {\"n\": 1}})\n",
            "",
        );
        let output = inferred.inference.output_type.unwrap();
        assert_eq!(
            unparse(&inferred.tree, output),
            "PayloadOutputF = TypedDict(\"PayloadOutputF\", {\"items\": list, \"meta\": TypedDict(\"PayloadOutputFMeta\", {\"n\": int})})\n"
        );
    }

    #[test]
    fn distinct_shapes_form_a_union() {
        let inferred = infer(
            "def f(request):\n    if a:\n        return Response([1])\n    if b:\n        return Response([2])\n    return Response(1.5)\n",
            "Posts",
        );
        let output = inferred.inference.output_type.unwrap();
        assert_eq!(
            unparse(&inferred.tree, output),
            "PayloadOutputPostsF = Union[list, float]\n"
        );
    }

    #[test]
    fn dict_with_unreadable_keys_is_left_open() {
        let inferred = infer("def f(request):\n    return Response({1: 2})\n", "");
        let output = inferred.inference.output_type.unwrap();
        assert_eq!(unparse(&inferred.tree, output), "PayloadOutputF = Any\n");
        assert_eq!(inferred.warnings, 1);
    }

    #[test]
    fn spread_dict_overrides_a_closed_dict_shape() {
        let inferred = infer(
            "def f(request):\n    if a:\n        return Response({\"id\": 1})\n    return Response({**base, \"meta\": {\"n\": 1}})\n",
            "",
        );
        let output = inferred.inference.output_type.unwrap();
        assert_eq!(unparse(&inferred.tree, output), "PayloadOutputF = Any\n");
        assert_eq!(inferred.warnings, 1);
    }

    #[test]
    fn open_dict_nested_in_a_field_types_only_that_field() {
        let inferred = infer(
            "def f(request):\n    return Response({\"meta\": {**extra}})\n",
            "",
        );
        let output = inferred.inference.output_type.unwrap();
        assert_eq!(
            unparse(&inferred.tree, output),
            "PayloadOutputF = TypedDict(\"PayloadOutputF\", {\"meta\": Any})\n"
        );
        assert_eq!(inferred.warnings, 1);
    }

    #[test]
    fn no_payload_means_no_output_type() {
        let inferred = infer("def f(request):\n    return Response()\n", "");
        assert!(inferred.inference.output_type.is_none());
        assert_eq!(body(&inferred), "return Response(None, status.HTTP_200_OK)\n");
    }
}
