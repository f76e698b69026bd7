use crate::error::MigrateError;
use crate::syntax::{Node, NodeId, Tree, parse_module, unparse};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const ROUTE_TABLE: &str = "urlpatterns";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub path: String,
    pub view: String,
}

impl Route {
    pub fn new(path: impl Into<String>, view: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            view: view.into(),
        }
    }
}

/// First route naming `view`; later duplicates are ignored.
pub fn find_route<'r>(routes: &'r [Route], view: &str) -> Option<&'r Route> {
    routes.iter().find(|route| route.view == view)
}

pub fn get_routes(source: &str) -> Result<Vec<Route>, MigrateError> {
    let tree = parse_module(source)?;
    routes_from_tree(&tree)
}

/// Reads the top-level `urlpatterns` list, including later `urlpatterns += [...]` extensions.
pub fn routes_from_tree(tree: &Tree) -> Result<Vec<Route>, MigrateError> {
    let mut routes = Vec::new();
    for stmt in tree.module_body() {
        let value = match tree.node(*stmt) {
            Node::Assign { targets, value }
                if targets
                    .iter()
                    .any(|target| tree.name_id(*target) == Some(ROUTE_TABLE)) =>
            {
                routes.clear();
                *value
            }
            Node::AugAssign { target, op, value }
                if op == "+=" && tree.name_id(*target) == Some(ROUTE_TABLE) =>
            {
                *value
            }
            _ => continue,
        };
        let elements = match tree.node(value) {
            Node::List { elts } | Node::Tuple { elts } => elts,
            other => {
                return Err(MigrateError::MalformedRoute(format!(
                    "{ROUTE_TABLE} is a {} at line {}, expected a list literal",
                    other.kind_name(),
                    tree.line(value).unwrap_or(0)
                )));
            }
        };
        for element in elements {
            match route_from_element(tree, *element) {
                Some(route) => routes.push(route),
                None => tracing::warn!(
                    line = tree.line(*element).unwrap_or(0),
                    "skipping route entry `{}`",
                    unparse(tree, *element)
                ),
            }
        }
    }
    Ok(routes)
}

fn route_from_element(tree: &Tree, element: NodeId) -> Option<Route> {
    let Node::Call { func, args } = tree.node(element) else {
        return None;
    };
    let regex = matches!(tree.name_id(*func), Some("re_path" | "url"));
    let positional: Vec<NodeId> = args
        .iter()
        .copied()
        .filter(|arg| !matches!(tree.node(*arg), Node::Keyword { .. }))
        .collect();
    let raw_path = tree.str_value(*positional.first()?)?;
    let view = view_name(tree, *positional.get(1)?)?;
    let path = if regex {
        normalize_regex_path(raw_path)
    } else {
        normalize_path(raw_path)
    };
    Some(Route { path, view })
}

/// `signin` -> `signin`; `PostsView.as_view()` and `PostsView(...).as_view()` -> `PostsView`.
fn view_name(tree: &Tree, node: NodeId) -> Option<String> {
    match tree.node(node) {
        Node::Name { id } => Some(id.clone()),
        Node::Attribute { .. } => Some(unparse(tree, node)),
        Node::Call { func, .. } => {
            let Node::Attribute { value, attr } = tree.node(*func) else {
                return None;
            };
            if attr != "as_view" {
                return None;
            }
            match tree.node(*value) {
                Node::Name { id } => Some(id.clone()),
                Node::Call { func, .. } => tree.name_id(*func).map(str::to_string),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Adds the leading `/` and rewrites `<int:pk>` converters to `{pk}`.
pub fn normalize_path(raw: &str) -> String {
    let mut out = String::from("/");
    let mut rest = raw.trim_start_matches('/');
    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let Some(end) = rest[start..].find('>') else {
            break;
        };
        let converter = &rest[start + 1..start + end];
        let name = converter.rsplit(':').next().unwrap_or(converter);
        out.push('{');
        out.push_str(name);
        out.push('}');
        rest = &rest[start + end + 1..];
    }
    out.push_str(rest);
    out
}

/// `^posts/(?P<pk>[0-9]+)/$` -> `/posts/{pk}/`
pub fn normalize_regex_path(raw: &str) -> String {
    let trimmed = raw.trim_start_matches('^').trim_end_matches('$');
    let mut out = String::new();
    let mut chars = trimmed.char_indices().peekable();
    while let Some((index, ch)) = chars.next() {
        if ch == '(' && trimmed[index..].starts_with("(?P<") {
            let name_start = index + 4;
            let Some(name_len) = trimmed[name_start..].find('>') else {
                out.push(ch);
                continue;
            };
            out.push('{');
            out.push_str(&trimmed[name_start..name_start + name_len]);
            out.push('}');
            let mut depth = 1;
            for (_, inner) in chars.by_ref() {
                match inner {
                    '(' => depth += 1,
                    ')' => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    _ => {}
                }
            }
        } else {
            out.push(ch);
        }
    }
    normalize_path(&out)
}

/// Modules imported by the routes file that provide at least one routed view,
/// deduplicated in first-seen order.
pub fn modules_from_routes(source: &str, routes: &[Route]) -> Result<Vec<String>, MigrateError> {
    let tree = parse_module(source)?;
    let mut modules: Vec<String> = Vec::new();
    for stmt in tree.module_body() {
        let Node::ImportFrom { module, names } = tree.node(*stmt) else {
            continue;
        };
        let provides_view = names
            .iter()
            .any(|alias| find_route(routes, alias.bound_name()).is_some());
        if provides_view && !modules.contains(module) {
            modules.push(module.clone());
        }
    }
    Ok(modules)
}

/// Source file for a dotted module path: `a/b.py` or `a/b/__init__.py`.
///
/// Absolute modules resolve under `project_root`; relative ones (leading dots)
/// against `urls_dir`, the package holding the routes file.
pub fn resolve_module_path(project_root: &Path, urls_dir: &Path, module: &str) -> Option<PathBuf> {
    let dots = module.chars().take_while(|ch| *ch == '.').count();
    let mut base = if dots == 0 {
        project_root.to_path_buf()
    } else {
        let mut base = urls_dir.to_path_buf();
        for _ in 1..dots {
            base = base.parent()?.to_path_buf();
        }
        base
    };
    let rest = &module[dots..];
    let parts: Vec<&str> = rest.split('.').filter(|part| !part.is_empty()).collect();
    let Some((last, packages)) = parts.split_last() else {
        let init = base.join("__init__.py");
        return init.is_file().then_some(init);
    };
    for package in packages {
        base.push(package);
    }
    let file = base.join(format!("{last}.py"));
    if file.is_file() {
        return Some(file);
    }
    let init = base.join(last).join("__init__.py");
    init.is_file().then_some(init)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn extracts_views_and_paths() {
        let source = r#"
from django.urls import path, include

urlpatterns = [
    path('posts/create', CreatePostsView.as_view()),
    path('posts', PostsView.as_view()),
    path('last', LastView().as_view()),
    path('auth/signin', signin, name="signin"),
    path('api/', include('api.urls')),
]
"#;
        let routes = get_routes(source).unwrap();
        assert_eq!(
            routes,
            vec![
                Route::new("/posts/create", "CreatePostsView"),
                Route::new("/posts", "PostsView"),
                Route::new("/last", "LastView"),
                Route::new("/auth/signin", "signin"),
            ]
        );
    }

    #[test]
    fn normalizes_converters() {
        assert_eq!(normalize_path("posts/<int:pk>/"), "/posts/{pk}/");
        assert_eq!(normalize_path("<slug>"), "/{slug}");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(
            normalize_regex_path("^posts/(?P<pk>[0-9]+)/(?P<tag>(a|b))$"),
            "/posts/{pk}/{tag}"
        );
    }

    #[test]
    fn extended_route_tables_are_concatenated() {
        let source = "urlpatterns = [path('a', a)]\nurlpatterns += [re_path(r'^b/$', b)]\n";
        let routes = get_routes(source).unwrap();
        assert_eq!(routes, vec![Route::new("/a", "a"), Route::new("/b/", "b")]);
    }

    #[test]
    fn rejects_non_literal_route_tables() {
        let err = get_routes("urlpatterns = build()\n").unwrap_err();
        assert!(matches!(err, MigrateError::MalformedRoute(_)));
    }

    #[test]
    fn first_route_wins() {
        let routes = vec![Route::new("/a", "v"), Route::new("/b", "v")];
        assert_eq!(find_route(&routes, "v").map(|r| r.path.as_str()), Some("/a"));
    }

    #[test]
    fn collects_modules_providing_views() {
        let source = "from frontend_api.endpoints.posts import CreatePostsView, UnpublishPostsView\nfrom frontend_api.endpoints.auth import signin, signup\nfrom other import helper\nfrom frontend_api.endpoints.posts import PostsView\n";
        let routes = vec![
            Route::new("/posts/create", "CreatePostsView"),
            Route::new("/auth/signin", "signin"),
            Route::new("/posts", "PostsView"),
        ];
        assert_eq!(
            modules_from_routes(source, &routes).unwrap(),
            vec!["frontend_api.endpoints.posts", "frontend_api.endpoints.auth"]
        );
    }

    #[test]
    fn resolves_files_and_packages() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("blog/api")).unwrap();
        fs::write(root.join("blog/views.py"), "").unwrap();
        fs::write(root.join("blog/api/__init__.py"), "").unwrap();
        let urls_dir = root.join("blog");
        assert_eq!(
            resolve_module_path(root, &urls_dir, "blog.views"),
            Some(root.join("blog/views.py"))
        );
        assert_eq!(
            resolve_module_path(root, &urls_dir, "blog.api"),
            Some(root.join("blog/api/__init__.py"))
        );
        assert_eq!(
            resolve_module_path(root, &urls_dir, ".views"),
            Some(root.join("blog/views.py"))
        );
        assert_eq!(resolve_module_path(root, &urls_dir, "blog.missing"), None);
    }
}
