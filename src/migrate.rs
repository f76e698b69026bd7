use crate::diagnostics::ModuleScope;
use crate::edit::{self, EditOperation};
use crate::error::MigrateError;
use crate::routes::{Route, find_route};
use crate::syntax::{Alias, Node, NodeId, Rewrite, Tree, parse_module, splice_list, unparse};
use crate::views::{self, Strategy};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

const OLD_FRAMEWORK_PACKAGES: [&str; 2] = ["rest_framework", "django"];
const SETTINGS_MODULE: &str = "django.conf";
const EXPORT_NAME: &str = "routers";

/// Callable used to build every router declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub enum RouterFactory {
    #[default]
    InferringRouter,
    ApiRouter,
}

impl RouterFactory {
    pub fn name(self) -> &'static str {
        match self {
            RouterFactory::InferringRouter => "InferringRouter",
            RouterFactory::ApiRouter => "APIRouter",
        }
    }
}

impl fmt::Display for RouterFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RouterFactory {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "InferringRouter" => Ok(RouterFactory::InferringRouter),
            "APIRouter" => Ok(RouterFactory::ApiRouter),
            other => Err(format!("unknown router factory `{other}`")),
        }
    }
}

/// Per-run knobs passed explicitly into the library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationOptions {
    /// Emit routed handlers as `async def`.
    pub async_handlers: bool,
    pub router_factory: RouterFactory,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            async_handlers: true,
            router_factory: RouterFactory::default(),
        }
    }
}

/// Import the rewritten module needs; the declaration order is the emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RequiredImport {
    FastApi,
    ClassBasedView,
    Router(RouterFactory),
    Typing,
}

impl RequiredImport {
    pub fn module(self) -> &'static str {
        match self {
            RequiredImport::FastApi => "fastapi",
            RequiredImport::ClassBasedView => "fastapi_utils.cbv",
            RequiredImport::Router(RouterFactory::InferringRouter) => {
                "fastapi_utils.inferring_router"
            }
            RequiredImport::Router(RouterFactory::ApiRouter) => "fastapi",
            RequiredImport::Typing => "typing",
        }
    }

    pub fn names(self) -> &'static [&'static str] {
        match self {
            RequiredImport::FastApi => &["Depends", "Request", "Response", "status"],
            RequiredImport::ClassBasedView => &["cbv"],
            RequiredImport::Router(RouterFactory::InferringRouter) => &["InferringRouter"],
            RequiredImport::Router(RouterFactory::ApiRouter) => &["APIRouter"],
            RequiredImport::Typing => &["Any", "Optional", "TypedDict", "Union"],
        }
    }

    fn statement(self, tree: &mut Tree) -> NodeId {
        tree.import_from(self.module(), self.names())
    }
}

/// Edit script for one module plus what it will declare once applied.
#[derive(Debug, Default)]
pub struct MigrationPlan {
    pub operations: Vec<EditOperation>,
    pub routers: Vec<String>,
    pub imports: Vec<RequiredImport>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationOutcome {
    /// Router variables declared by the module, in first-use order.
    pub routers: Vec<String>,
    pub imports: Vec<RequiredImport>,
}

pub struct Migrator {
    routes: Vec<Route>,
    options: MigrationOptions,
}

impl Migrator {
    pub fn new(routes: Vec<Route>, options: MigrationOptions) -> Self {
        Self { routes, options }
    }

    /// Build the edit script for every routed top-level declaration.
    ///
    /// Unrouted declarations produce no operations. Node allocation and
    /// idiom-level in-place rewrites happen here; splicing into the module body
    /// is left to [`apply`].
    pub fn analyze(&self, tree: &mut Tree, scope: &ModuleScope<'_>) -> MigrationPlan {
        let mut plan = MigrationPlan::default();
        let mut imports = BTreeSet::new();
        let declarations = tree.module_body().to_vec();
        let mut first_routed = None;

        for (index, declaration) in declarations.iter().copied().enumerate() {
            let Some(name) = tree.declaration_name(declaration) else {
                continue;
            };
            let Some(route) = find_route(&self.routes, name).cloned() else {
                continue;
            };
            let Some(strategy) = views::select_strategy(tree, declaration) else {
                continue;
            };
            tracing::debug!(
                module = scope.module,
                view = %route.view,
                path = %route.path,
                ?strategy,
                "migrating view"
            );
            let output = match strategy {
                Strategy::FunctionToFunction => {
                    match views::function_to_function(tree, declaration, &route, &self.options, scope) {
                        Some(output) => output,
                        None => continue,
                    }
                }
                Strategy::ClassToFunctions => {
                    views::class_to_functions(tree, declaration, &route, &self.options, scope)
                }
                Strategy::ClassToClass => {
                    imports.insert(RequiredImport::ClassBasedView);
                    views::class_to_class(tree, declaration, &route, &self.options, scope)
                }
            };
            first_routed.get_or_insert(index);
            imports.insert(RequiredImport::FastApi);
            imports.insert(RequiredImport::Typing);
            imports.insert(RequiredImport::Router(self.options.router_factory));

            for router in output.routers {
                if plan.routers.contains(&router) {
                    continue;
                }
                let factory = tree.name(self.options.router_factory.name());
                let value = tree.call(factory, Vec::new());
                let candidate = tree.assign(router.as_str(), value);
                plan.operations.push(EditOperation::InsertBefore {
                    target: declaration,
                    candidate,
                });
                plan.routers.push(router);
            }
            plan.operations.extend(output.operations);
        }

        // Generated code is only ever placed at or after the first routed
        // declaration, so imports go after the last import preceding it.
        let preceding = &declarations[..first_routed.unwrap_or(0)];
        let anchor = preceding
            .iter()
            .rev()
            .copied()
            .find(|stmt| matches!(tree.node(*stmt), Node::Import { .. } | Node::ImportFrom { .. }));
        let top = usize::from(preceding.first().is_some_and(|stmt| is_docstring(tree, *stmt)));
        let mut previous: Option<NodeId> = None;
        for import in &imports {
            let candidate = import.statement(tree);
            let operation = match previous.or(anchor) {
                Some(target) => EditOperation::InsertAfter { target, candidate },
                None => EditOperation::InsertAt {
                    container: tree.root(),
                    field: "body",
                    position: top,
                    candidate,
                },
            };
            plan.operations.push(operation);
            previous = Some(candidate);
        }
        plan.imports = imports.into_iter().collect();

        if !plan.routers.is_empty() {
            let elts = plan.routers.iter().map(|router| tree.name(router.as_str())).collect();
            let value = tree.alloc(Node::List { elts });
            let candidate = tree.assign(EXPORT_NAME, value);
            plan.operations.push(EditOperation::AppendToBody { candidate });
        }
        plan
    }
}

fn is_docstring(tree: &Tree, stmt: NodeId) -> bool {
    match tree.node(stmt) {
        Node::Expr { value } => tree.str_value(*value).is_some(),
        _ => false,
    }
}

pub fn apply(tree: &mut Tree, operations: &[EditOperation]) -> Result<(), MigrateError> {
    edit::apply(tree, operations)
}

/// Analyze and apply in one step.
pub fn migrate_module(
    tree: &mut Tree,
    routes: &[Route],
    options: &MigrationOptions,
    scope: &ModuleScope<'_>,
) -> Result<MigrationOutcome, MigrateError> {
    let migrator = Migrator::new(routes.to_vec(), options.clone());
    let plan = migrator.analyze(tree, scope);
    apply(tree, &plan.operations)?;
    Ok(MigrationOutcome {
        routers: plan.routers,
        imports: plan.imports,
    })
}

fn is_old_framework(module: &str) -> bool {
    OLD_FRAMEWORK_PACKAGES.iter().any(|package| {
        module == *package
            || module
                .strip_prefix(package)
                .is_some_and(|rest| rest.starts_with('.'))
    })
}

/// Drop top-level imports of the old framework; settings move to a local `conf` module.
pub fn clear_imports(tree: &mut Tree) -> Result<(), MigrateError> {
    let root = tree.root();
    splice_list(tree, root, "body", |tree, stmt| match tree.node(stmt) {
        Node::ImportFrom { module, names } if module == SETTINGS_MODULE => {
            let names = names.clone();
            let line = tree.line(stmt);
            Rewrite::ReplaceWithOne(tree.alloc_at(
                Node::ImportFrom {
                    module: "conf".to_string(),
                    names,
                },
                line,
            ))
        }
        Node::ImportFrom { module, .. } if is_old_framework(module) => Rewrite::Delete,
        Node::Import { names } => {
            let kept: Vec<Alias> = names
                .iter()
                .filter(|alias| !is_old_framework(&alias.name))
                .cloned()
                .collect();
            if kept.len() == names.len() {
                Rewrite::Keep
            } else if kept.is_empty() {
                Rewrite::Delete
            } else {
                let line = tree.line(stmt);
                Rewrite::ReplaceWithOne(tree.alloc_at(Node::Import { names: kept }, line))
            }
        }
        _ => Rewrite::Keep,
    })
}

/// A module after migration, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedModule {
    pub code: String,
    pub outcome: MigrationOutcome,
}

/// Parse, migrate, clear old imports and print one module.
pub fn process_source(
    source: &str,
    routes: &[Route],
    options: &MigrationOptions,
    scope: &ModuleScope<'_>,
) -> Result<ConvertedModule, MigrateError> {
    let mut tree = parse_module(source)?;
    let outcome = migrate_module(&mut tree, routes, options, scope)?;
    clear_imports(&mut tree)?;
    Ok(ConvertedModule {
        code: unparse(&tree, tree.root()),
        outcome,
    })
}
