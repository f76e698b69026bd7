//! Classification of routed declarations and the three rewrite strategies.
//!
//! Every strategy only builds detached replacement nodes and returns the edit
//! script that splices them into the module; nothing here touches the module
//! body directly.

use crate::diagnostics::ModuleScope;
use crate::edit::EditOperation;
use crate::migrate::MigrationOptions;
use crate::naming;
use crate::payloads::{self, ParameterDescriptor};
use crate::routes::Route;
use crate::syntax::{Literal, Node, NodeId, ParamKind, Tree, unparse};
use std::collections::HashMap;

/// Method names that map to an HTTP verb of the same name.
pub const ROUTE_VERBS: [&str; 5] = ["get", "post", "put", "patch", "delete"];

const CRUD_VERBS: [&str; 4] = ["get", "post", "put", "delete"];

const VIEW_BASES: [&str; 3] = ["APIView", "GenericAPIView", "View"];

const SELF: &str = "self";
const REQUEST: &str = "request";
const ROUTING_DECORATOR: &str = "api_view";

/// Function decorators that only configure the old framework's request handling.
const POLICY_DECORATORS: [&str; 7] = [
    ROUTING_DECORATOR,
    "permission_classes",
    "authentication_classes",
    "throttle_classes",
    "renderer_classes",
    "parser_classes",
    "schema",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    FunctionToFunction,
    ClassToFunctions,
    ClassToClass,
}

/// Edit script produced by one strategy plus the routers its output refers to.
#[derive(Debug, Default)]
pub struct StrategyOutput {
    pub operations: Vec<EditOperation>,
    pub routers: Vec<String>,
}

pub fn is_route_verb(name: &str) -> bool {
    ROUTE_VERBS.contains(&name)
}

fn methods(tree: &Tree, class: NodeId) -> impl Iterator<Item = (NodeId, &str)> {
    tree.body(class)
        .iter()
        .filter_map(move |stmt| match tree.node(*stmt) {
            Node::FunctionDef { name, .. } => Some((*stmt, name.as_str())),
            _ => None,
        })
}

/// True iff the verb-named methods of the class are exactly `get`, `post`, `put`, `delete`.
pub fn is_crud_class(tree: &Tree, class: NodeId) -> bool {
    let verbs: Vec<&str> = methods(tree, class)
        .map(|(_, name)| name)
        .filter(|name| is_route_verb(name))
        .collect();
    verbs.len() == CRUD_VERBS.len() && CRUD_VERBS.iter().all(|verb| verbs.contains(verb))
}

fn is_self_attribute(tree: &Tree, node: NodeId) -> bool {
    match tree.node(node) {
        Node::Attribute { value, .. } => tree.name_id(*value) == Some(SELF),
        Node::Tuple { elts } | Node::List { elts } => {
            elts.iter().any(|elt| is_self_attribute(tree, *elt))
        }
        Node::Starred { value, .. } => is_self_attribute(tree, *value),
        _ => false,
    }
}

/// True iff anything in the class assigns to `self.<attr>`, at any depth.
pub fn has_state(tree: &Tree, class: NodeId) -> bool {
    tree.walk(class).any(|id| match tree.node(id) {
        Node::Assign { targets, .. } => targets.iter().any(|target| is_self_attribute(tree, *target)),
        Node::AnnAssign { target, .. } | Node::AugAssign { target, .. } => {
            is_self_attribute(tree, *target)
        }
        _ => false,
    })
}

/// Strategy for a routed top-level declaration; `None` for anything not a def or class.
pub fn select_strategy(tree: &Tree, declaration: NodeId) -> Option<Strategy> {
    match tree.node(declaration) {
        Node::FunctionDef { .. } => Some(Strategy::FunctionToFunction),
        Node::ClassDef { .. } if is_crud_class(tree, declaration) || has_state(tree, declaration) => {
            Some(Strategy::ClassToClass)
        }
        Node::ClassDef { .. } => Some(Strategy::ClassToFunctions),
        _ => None,
    }
}

fn is_decorator(tree: &Tree, decorator: NodeId, names: &[&str]) -> bool {
    let callee = match tree.node(decorator) {
        Node::Call { func, .. } => *func,
        _ => decorator,
    };
    match tree.node(callee) {
        Node::Name { id } => names.contains(&id.as_str()),
        Node::Attribute { attr, .. } => names.contains(&attr.as_str()),
        _ => false,
    }
}

/// HTTP methods listed by the function's `@api_view([...])` decorator, lowercased.
///
/// A bare `@api_view` or `@api_view()` means GET. `None` when the function has no
/// such decorator.
pub fn function_route_methods(tree: &Tree, function: NodeId) -> Option<Vec<String>> {
    let Node::FunctionDef { decorators, .. } = tree.node(function) else {
        return None;
    };
    let decorator = decorators
        .iter()
        .copied()
        .find(|decorator| is_decorator(tree, *decorator, &[ROUTING_DECORATOR]))?;
    let Node::Call { args, .. } = tree.node(decorator) else {
        return Some(vec!["get".to_string()]);
    };
    let listed = args.iter().find_map(|arg| match tree.node(*arg) {
        Node::Keyword { name, value } if name == "http_method_names" => Some(*value),
        Node::Keyword { .. } => None,
        _ => Some(*arg),
    });
    let Some(listed) = listed else {
        return Some(vec!["get".to_string()]);
    };
    let (Node::List { elts } | Node::Tuple { elts }) = tree.node(listed) else {
        return None;
    };
    let methods: Vec<String> = elts
        .iter()
        .filter_map(|elt| tree.str_value(*elt))
        .map(str::to_lowercase)
        .collect();
    if methods.is_empty() { None } else { Some(methods) }
}

/// `@<router>.<verb>("<path>")`
fn route_decorator(tree: &mut Tree, router: &str, verb: &str, path: &str) -> NodeId {
    let router = tree.name(router);
    let func = tree.attribute(router, verb);
    let path = tree.string(path);
    tree.call(func, vec![path])
}

fn param_name(tree: &Tree, param: NodeId) -> Option<(&str, ParamKind)> {
    match tree.node(param) {
        Node::Param { name, kind, .. } => Some((name.as_str(), *kind)),
        _ => None,
    }
}

fn param_has_default(tree: &Tree, param: NodeId) -> bool {
    matches!(tree.node(param), Node::Param { default: Some(_), .. })
}

/// Original parameters that survive routing: everything but `self`, `request`
/// and the variadic or marker entries.
fn kept_params(tree: &Tree, params: &[NodeId]) -> Vec<NodeId> {
    params
        .iter()
        .copied()
        .filter(|param| match param_name(tree, *param) {
            Some((name, ParamKind::Normal)) => name != SELF && name != REQUEST,
            _ => false,
        })
        .collect()
}

/// Kept parameters followed by inferred ones, stably partitioned so that no
/// defaulted parameter precedes a required one.
fn merge_params(tree: &mut Tree, kept: Vec<NodeId>, inferred: Vec<ParameterDescriptor>) -> Vec<NodeId> {
    let mut all = kept;
    for descriptor in inferred {
        let taken = all
            .iter()
            .any(|param| param_name(tree, *param).map(|(name, _)| name) == Some(descriptor.name.as_str()));
        if taken {
            continue;
        }
        all.push(tree.param(descriptor.name, descriptor.annotation, descriptor.default));
    }
    let (required, defaulted): (Vec<NodeId>, Vec<NodeId>) = all
        .into_iter()
        .partition(|param| !param_has_default(tree, *param));
    required.into_iter().chain(defaulted).collect()
}

fn insert_payload_types(
    operations: &mut Vec<EditOperation>,
    anchor: NodeId,
    inference: &payloads::PayloadInference,
) {
    for candidate in [inference.input_type, inference.output_type].into_iter().flatten() {
        operations.push(EditOperation::InsertBefore {
            target: anchor,
            candidate,
        });
    }
}

fn return_annotation(tree: &mut Tree, returns: Option<NodeId>, inference: &payloads::PayloadInference) -> Option<NodeId> {
    returns.or_else(|| inference.output_name.as_deref().map(|name| tree.name(name)))
}

/// Rewrite a routed `@api_view` function into a router-bound handler.
///
/// Returns `None`, after a warning, when the function has no recognisable
/// routing decorator; the declaration is then left untouched.
pub fn function_to_function(
    tree: &mut Tree,
    function: NodeId,
    route: &Route,
    options: &MigrationOptions,
    scope: &ModuleScope<'_>,
) -> Option<StrategyOutput> {
    let Some(verbs) = function_route_methods(tree, function) else {
        let name = tree.declaration_name(function).unwrap_or_default().to_string();
        scope.warn(
            &format!("routed function `{name}` has no recognisable @api_view decorator; left unchanged"),
            &unparse(tree, function),
            tree.line(function),
        );
        return None;
    };
    let Node::FunctionDef {
        name,
        is_async,
        decorators,
        params,
        returns,
        body,
    } = tree.node(function).clone()
    else {
        return None;
    };

    let inference = payloads::infer_payloads(tree, function, "", scope);
    let router = "router";

    let mut new_decorators: Vec<NodeId> = verbs
        .iter()
        .map(|verb| route_decorator(tree, router, verb, &route.path))
        .collect();
    new_decorators.extend(
        decorators
            .into_iter()
            .filter(|decorator| !is_decorator(tree, *decorator, &POLICY_DECORATORS)),
    );
    let kept = kept_params(tree, &params);
    let params = merge_params(tree, kept, inference.params.clone());
    let returns = return_annotation(tree, returns, &inference);
    let line = tree.line(function);
    let candidate = tree.alloc_at(
        Node::FunctionDef {
            name,
            is_async: is_async || options.async_handlers,
            decorators: new_decorators,
            params,
            returns,
            body,
        },
        line,
    );

    let mut operations = Vec::new();
    insert_payload_types(&mut operations, function, &inference);
    operations.push(EditOperation::Replace {
        target: function,
        candidate,
    });
    operations.extend(inference.operations);
    Some(StrategyOutput {
        operations,
        routers: vec![router.to_string()],
    })
}

/// Replace every `self.<attr>` in the subtree with a bare name, in place.
fn flatten_self_references(tree: &mut Tree, root: NodeId, renames: &HashMap<String, String>) {
    let hits: Vec<(NodeId, String)> = tree
        .walk(root)
        .filter_map(|id| match tree.node(id) {
            Node::Attribute { value, attr } if tree.name_id(*value) == Some(SELF) => {
                let name = renames.get(attr).cloned().unwrap_or_else(|| attr.clone());
                Some((id, name))
            }
            _ => None,
        })
        .collect();
    for (id, name) in hits {
        tree.replace_node(id, Node::Name { id: name });
    }
}

fn is_docstring(tree: &Tree, stmt: NodeId) -> bool {
    match tree.node(stmt) {
        Node::Expr { value } => matches!(
            tree.node(*value),
            Node::Constant {
                value: Literal::Str { .. } | Literal::Ellipsis
            }
        ),
        Node::Pass => true,
        _ => false,
    }
}

/// Flatten a stateless, non-CRUD view class into module-level functions.
pub fn class_to_functions(
    tree: &mut Tree,
    class: NodeId,
    route: &Route,
    options: &MigrationOptions,
    scope: &ModuleScope<'_>,
) -> StrategyOutput {
    let view = route.view.as_str();
    let router = "router";
    let renames: HashMap<String, String> = ROUTE_VERBS
        .iter()
        .map(|verb| (verb.to_string(), naming::route_function_name(verb, view)))
        .collect();

    let mut hoisted = Vec::new();
    let mut functions = Vec::new();
    let mut trailing = Vec::new();
    let mut routed = false;
    let statements = tree.body(class).to_vec();
    for stmt in statements {
        let Node::FunctionDef {
            name,
            is_async,
            decorators,
            params,
            returns,
            body: _,
        } = tree.node(stmt).clone()
        else {
            if !is_docstring(tree, stmt) {
                hoisted.push(stmt);
            }
            continue;
        };

        flatten_self_references(tree, stmt, &renames);
        let line = tree.line(stmt);
        let candidate = if is_route_verb(&name) {
            routed = true;
            let inference = payloads::infer_payloads(tree, stmt, view, scope);
            let mut new_decorators = vec![route_decorator(tree, router, &name, &route.path)];
            new_decorators.extend(decorators);
            let kept = kept_params(tree, &params);
            let params = merge_params(tree, kept, inference.params.clone());
            let returns = return_annotation(tree, returns, &inference);
            let body = tree.body(stmt).to_vec();
            insert_payload_types(&mut functions, class, &inference);
            trailing.extend(inference.operations);
            tree.alloc_at(
                Node::FunctionDef {
                    name: naming::route_function_name(&name, view),
                    is_async: is_async || options.async_handlers,
                    decorators: new_decorators,
                    params,
                    returns,
                    body,
                },
                line,
            )
        } else {
            let params = params
                .into_iter()
                .filter(|param| param_name(tree, *param).map(|(name, _)| name) != Some(SELF))
                .collect();
            let body = tree.body(stmt).to_vec();
            tree.alloc_at(
                Node::FunctionDef {
                    name,
                    is_async,
                    decorators,
                    params,
                    returns,
                    body,
                },
                line,
            )
        };
        functions.push(EditOperation::InsertBefore {
            target: class,
            candidate,
        });
    }

    let mut operations: Vec<EditOperation> = hoisted
        .into_iter()
        .map(|stmt| {
            let candidate = tree.deep_copy(stmt);
            EditOperation::InsertBefore {
                target: class,
                candidate,
            }
        })
        .collect();
    operations.extend(functions);
    operations.extend(trailing);
    operations.push(EditOperation::Remove { target: class });
    StrategyOutput {
        operations,
        routers: if routed {
            vec![router.to_string()]
        } else {
            Vec::new()
        },
    }
}

fn is_view_base(tree: &Tree, base: NodeId) -> bool {
    match tree.node(base) {
        Node::Name { id } => VIEW_BASES.contains(&id.as_str()),
        Node::Attribute { attr, .. } => VIEW_BASES.contains(&attr.as_str()),
        _ => false,
    }
}

/// Keep a CRUD or stateful view as a class bound to its own router with `@cbv`.
pub fn class_to_class(
    tree: &mut Tree,
    class: NodeId,
    route: &Route,
    options: &MigrationOptions,
    scope: &ModuleScope<'_>,
) -> StrategyOutput {
    let view = route.view.as_str();
    let router = naming::router_name(view);
    let Node::ClassDef {
        name,
        decorators,
        bases,
        body,
    } = tree.node(class).clone()
    else {
        return StrategyOutput::default();
    };

    let mut operations = Vec::new();
    let mut parameter_inserts = Vec::new();
    let mut trailing = Vec::new();
    let mut new_body = Vec::with_capacity(body.len());
    for stmt in body {
        let Node::FunctionDef {
            name: method,
            is_async,
            decorators,
            params,
            returns,
            body,
        } = tree.node(stmt).clone()
        else {
            new_body.push(stmt);
            continue;
        };
        if !is_route_verb(&method) {
            new_body.push(stmt);
            continue;
        }

        let inference = payloads::infer_payloads(tree, stmt, view, scope);
        insert_payload_types(&mut operations, class, &inference);
        let mut new_decorators = vec![route_decorator(tree, &router, &method, "/")];
        new_decorators.extend(decorators);
        let receiver: Vec<NodeId> = params
            .iter()
            .copied()
            .filter(|param| param_name(tree, *param).map(|(name, _)| name) == Some(SELF))
            .take(1)
            .collect();
        let kept = kept_params(tree, &params);
        let signature = merge_params(tree, kept, inference.params.clone());
        let returns = return_annotation(tree, returns, &inference);
        let line = tree.line(stmt);
        let candidate = tree.alloc_at(
            Node::FunctionDef {
                name: method,
                is_async: is_async || options.async_handlers,
                decorators: new_decorators,
                params: receiver.clone(),
                returns,
                body,
            },
            line,
        );
        for (offset, param) in signature.into_iter().enumerate() {
            parameter_inserts.push(EditOperation::InsertAt {
                container: candidate,
                field: "params",
                position: receiver.len() + offset,
                candidate: param,
            });
        }
        trailing.extend(inference.operations);
        new_body.push(candidate);
    }

    let cbv = tree.name("cbv");
    let router_ref = tree.name(router.as_str());
    let mut new_decorators = decorators;
    new_decorators.push(tree.call(cbv, vec![router_ref]));
    let bases = bases
        .into_iter()
        .filter(|base| !is_view_base(tree, *base))
        .collect();
    let line = tree.line(class);
    let candidate = tree.alloc_at(
        Node::ClassDef {
            name,
            decorators: new_decorators,
            bases,
            body: new_body,
        },
        line,
    );

    operations.push(EditOperation::Replace {
        target: class,
        candidate,
    });
    operations.extend(parameter_inserts);
    operations.extend(trailing);
    StrategyOutput {
        operations,
        routers: vec![router],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{Diagnostics, DiagnosticsSink};
    use crate::edit;
    use crate::syntax::parse_module;

    const CRUD: &str = "class PostsView(APIView):\n    def get(self, request):\n        ...\n\n    def post(self, request):\n        ...\n\n    def put(self, request):\n        ...\n\n    def delete(self, request):\n        ...\n";

    const UNIQUE_ACTION: &str = "class UniqueActionView(APIView):\n    def post(self, request):\n        self.other_method(\"bla\")\n\n    def other_method(self, arg):\n        ...\n";

    const STATEFUL: &str = "class CounterView(APIView):\n    def get(self, request):\n        if True:\n            self.count = 1\n        return Response(self.count)\n";

    fn first(source: &str) -> (Tree, NodeId) {
        let tree = parse_module(source).unwrap();
        let node = tree.module_body()[0];
        (tree, node)
    }

    fn sync_options() -> MigrationOptions {
        MigrationOptions {
            async_handlers: false,
            ..MigrationOptions::default()
        }
    }

    #[test]
    fn classifies_crud_classes() {
        let (tree, class) = first(CRUD);
        assert!(is_crud_class(&tree, class));
        let (tree, class) = first(UNIQUE_ACTION);
        assert!(!is_crud_class(&tree, class));
        let (tree, class) = first("class V:\n    def get(self):\n        ...\n\n    def post(self):\n        ...\n\n    def put(self):\n        ...\n\n    def patch(self):\n        ...\n");
        assert!(!is_crud_class(&tree, class));
    }

    #[test]
    fn detects_nested_instance_state() {
        let (tree, class) = first(STATEFUL);
        assert!(has_state(&tree, class));
        let (tree, class) = first(UNIQUE_ACTION);
        assert!(!has_state(&tree, class));
        let (tree, class) = first("class V:\n    def get(self):\n        self.a, b = 1, 2\n");
        assert!(has_state(&tree, class));
    }

    #[test]
    fn strategy_follows_classification() {
        for (source, expected) in [
            (CRUD, Strategy::ClassToClass),
            (STATEFUL, Strategy::ClassToClass),
            (UNIQUE_ACTION, Strategy::ClassToFunctions),
            ("def f(request):\n    ...\n", Strategy::FunctionToFunction),
        ] {
            let (tree, node) = first(source);
            assert_eq!(select_strategy(&tree, node), Some(expected));
        }
        let (tree, node) = first("x = 1\n");
        assert_eq!(select_strategy(&tree, node), None);
    }

    #[test]
    fn reads_api_view_methods() {
        let (tree, function) = first("@api_view([\"POST\", \"get\"])\ndef signin(request):\n    ...\n");
        assert_eq!(
            function_route_methods(&tree, function),
            Some(vec!["post".to_string(), "get".to_string()])
        );
        let (tree, function) = first("@api_view\ndef f(request):\n    ...\n");
        assert_eq!(function_route_methods(&tree, function), Some(vec!["get".to_string()]));
        let (tree, function) = first("def f(request):\n    ...\n");
        assert_eq!(function_route_methods(&tree, function), None);
    }

    #[test]
    fn function_becomes_router_handler() {
        let (mut tree, function) = first(
            "@api_view([\"POST\"])\n@permission_classes([IsAuthenticated])\ndef signin(request):\n    \"\"\"blockcomment\"\"\"\n    ...\n",
        );
        let diagnostics = Diagnostics::new();
        let scope = ModuleScope::new(&diagnostics, "auth");
        let route = Route::new("/auth/signin", "signin");
        let output = function_to_function(&mut tree, function, &route, &sync_options(), &scope).unwrap();
        edit::apply(&mut tree, &output.operations).unwrap();
        assert_eq!(output.routers, vec!["router"]);
        assert_eq!(
            unparse(&tree, tree.root()),
            "@router.post(\"/auth/signin\")\ndef signin():\n    \"\"\"blockcomment\"\"\"\n    ...\n"
        );
    }

    #[test]
    fn function_keeps_path_parameters_first() {
        let (mut tree, function) = first(
            "@api_view([\"GET\"])\ndef detail(request, pk):\n    fmt = request.query_params.get(\"fmt\", \"json\")\n    return Response(fmt)\n",
        );
        let diagnostics = Diagnostics::new();
        let scope = ModuleScope::new(&diagnostics, "posts");
        let route = Route::new("/posts/{pk}", "detail");
        let output =
            function_to_function(&mut tree, function, &route, &MigrationOptions::default(), &scope).unwrap();
        edit::apply(&mut tree, &output.operations).unwrap();
        assert_eq!(
            unparse(&tree, tree.root()),
            "PayloadOutputDetail = Any\n\n\n@router.get(\"/posts/{pk}\")\nasync def detail(pk, fmt: Optional[str] = \"json\") -> PayloadOutputDetail:\n    return fmt\n"
        );
    }

    #[test]
    fn missing_api_view_warns_and_passes_through() {
        let (mut tree, function) = first("def signin(request):\n    ...\n");
        let diagnostics = Diagnostics::new();
        let scope = ModuleScope::new(&diagnostics, "auth");
        let route = Route::new("/auth/signin", "signin");
        assert!(function_to_function(&mut tree, function, &route, &sync_options(), &scope).is_none());
        assert_eq!(diagnostics.warning_count(), 1);
    }

    #[test]
    fn stateless_class_flattens_to_functions() {
        let (mut tree, class) = first(UNIQUE_ACTION);
        let diagnostics = Diagnostics::new();
        let scope = ModuleScope::new(&diagnostics, "actions");
        let route = Route::new("/do-something", "UniqueActionView");
        let output = class_to_functions(&mut tree, class, &route, &sync_options(), &scope);
        edit::apply(&mut tree, &output.operations).unwrap();
        assert_eq!(output.routers, vec!["router"]);
        let printed = unparse(&tree, tree.root());
        assert_eq!(
            printed,
            "@router.post(\"/do-something\")\ndef post_unique_action():\n    other_method(\"bla\")\n\n\ndef other_method(arg):\n    ...\n"
        );
        assert!(!printed.contains("self"));
    }

    #[test]
    fn flattening_renames_verb_attributes_and_hoists_class_state() {
        let (mut tree, class) = first(
            "class SyncView(APIView):\n    \"\"\"Docs.\"\"\"\n    limit = 10\n\n    def get(self, request):\n        return self.post(self.limit)\n\n    def post(self, request, value):\n        ...\n",
        );
        let diagnostics = Diagnostics::new();
        let scope = ModuleScope::new(&diagnostics, "sync");
        let route = Route::new("/sync", "SyncView");
        let output = class_to_functions(&mut tree, class, &route, &sync_options(), &scope);
        edit::apply(&mut tree, &output.operations).unwrap();
        assert_eq!(
            unparse(&tree, tree.root()),
            "limit = 10\n\n\n@router.get(\"/sync\")\ndef get_sync():\n    return post_sync(limit)\n\n\n@router.post(\"/sync\")\ndef post_sync(value):\n    ...\n"
        );
    }

    #[test]
    fn crud_class_is_bound_to_its_own_router() {
        let (mut tree, class) = first(CRUD);
        let diagnostics = Diagnostics::new();
        let scope = ModuleScope::new(&diagnostics, "posts");
        let route = Route::new("/posts", "PostsView");
        let output = class_to_class(&mut tree, class, &route, &sync_options(), &scope);
        edit::apply(&mut tree, &output.operations).unwrap();
        assert_eq!(output.routers, vec!["router_posts"]);
        assert_eq!(
            unparse(&tree, tree.root()),
            "@cbv(router_posts)\nclass PostsView:\n    @router_posts.get(\"/\")\n    def get(self):\n        ...\n\n    @router_posts.post(\"/\")\n    def post(self):\n        ...\n\n    @router_posts.put(\"/\")\n    def put(self):\n        ...\n\n    @router_posts.delete(\"/\")\n    def delete(self):\n        ...\n"
        );
    }

    #[test]
    fn kept_class_methods_receive_inferred_parameters_after_self() {
        let (mut tree, class) = first(
            "class ItemView(generics.GenericAPIView):\n    def get(self, request, pk):\n        self.page = request.query_params.get(\"page\", 1)\n        return Response(self.page)\n",
        );
        let diagnostics = Diagnostics::new();
        let scope = ModuleScope::new(&diagnostics, "items");
        let route = Route::new("/items/{pk}", "ItemView");
        let output = class_to_class(&mut tree, class, &route, &sync_options(), &scope);
        edit::apply(&mut tree, &output.operations).unwrap();
        assert_eq!(
            unparse(&tree, tree.root()),
            "PayloadOutputItemViewGet = Any\n\n\n@cbv(router_item)\nclass ItemView:\n    @router_item.get(\"/\")\n    def get(self, pk, page: Optional[str] = 1) -> PayloadOutputItemViewGet:\n        self.page = page\n        return self.page\n"
        );
    }
}
