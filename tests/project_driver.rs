use std::fs;
use std::path::Path;
use viewshift::migrate::MigrationOptions;
use viewshift::project::{ProjectOptions, list_routes, migrate_project};
use viewshift::routes::Route;

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

const URLS: &str = r#"
from django.urls import path, include
from blog.views import PostsView, signin
from blog.api import UniqueActionView
from .missing import GhostView

urlpatterns = [
    path("posts", PostsView.as_view()),
    path("auth/signin", signin),
    path("do-something", UniqueActionView.as_view()),
    path("ghost", GhostView.as_view()),
    path("admin/", include("admin.urls")),
]
"#;

const VIEWS: &str = r#"
from rest_framework.decorators import api_view
from rest_framework.response import Response
from rest_framework.views import APIView


class PostsView(APIView):
    def get(self, request):
        return Response([])

    def post(self, request):
        title = request.data["title"]
        return Response({"title": title})

    def put(self, request):
        ...

    def delete(self, request):
        ...


@api_view(["POST"])
def signin(request):
    user = request.data.get("user", None)
    if user is None:
        return Response(None, status=401)
    return Response(user)
"#;

const API: &str = r#"
from rest_framework.views import APIView


class UniqueActionView(APIView):
    def post(self, request):
        self.other_method(request)

    def other_method(self, arg):
        ...
"#;

fn project(root: &Path) -> std::path::PathBuf {
    let urls = root.join("site/urls.py");
    write(&urls, URLS);
    write(&root.join("blog/__init__.py"), "");
    write(&root.join("blog/views.py"), VIEWS);
    write(&root.join("blog/api/__init__.py"), API);
    urls
}

#[test]
fn lists_routes_and_providing_modules() {
    let dir = tempfile::tempdir().unwrap();
    let urls = project(dir.path());
    let (routes, modules) = list_routes(&urls).unwrap();
    assert_eq!(routes.len(), 4);
    assert_eq!(routes[0], Route::new("/posts", "PostsView"));
    assert_eq!(modules, vec!["blog.views", "blog.api", ".missing"]);
}

#[test]
fn migrates_every_module_and_scaffolds_the_app() {
    let dir = tempfile::tempdir().unwrap();
    let urls = project(dir.path());
    let out = dir.path().join("output");
    let options = ProjectOptions {
        project_root: None,
        jobs: 2,
        migration: MigrationOptions::default(),
    };
    let report = migrate_project(&urls, &out, &options).unwrap();

    assert_eq!(report.modules.len(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].module, ".missing");
    assert!(report.has_failures());

    let views = fs::read_to_string(out.join("blog-views.py")).unwrap();
    assert!(views.contains("@cbv(router_posts)\nclass PostsView:\n"));
    assert!(views.contains("@router.post(\"/auth/signin\")\nasync def signin(data: PayloadInputSignin)"));
    assert!(views.contains("        return Response(None, 401)\n"));
    assert!(views.ends_with("routers = [router_posts, router]\n"));
    assert!(!views.contains("rest_framework"));

    let api = fs::read_to_string(out.join("blog-api.py")).unwrap();
    assert!(api.contains("async def post_unique_action():\n    other_method(request)\n"));
    assert!(api.ends_with("routers = [router]\n"));

    // passing `request` along cannot be rewritten
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].module, "blog.api");

    let main = fs::read_to_string(out.join("main.py")).unwrap();
    assert!(main.contains("app.include_router(router)"));
    assert!(main.contains("spec.loader.exec_module(module)"));
    let bootstrap = fs::read_to_string(out.join("bootstrap.py")).unwrap();
    assert!(bootstrap.contains("app = create_app()"));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["modules"][0]["routers"][0], "router_posts");
    assert_eq!(json["failures"][0]["module"], ".missing");
}

#[test]
fn explicit_project_root_changes_resolution() {
    let dir = tempfile::tempdir().unwrap();
    let urls = project(dir.path());
    let out = dir.path().join("output");
    let options = ProjectOptions {
        project_root: Some(dir.path().join("site")),
        ..ProjectOptions::default()
    };
    let report = migrate_project(&urls, &out, &options).unwrap();
    assert!(report.modules.is_empty());
    assert_eq!(report.failures.len(), 3);
    assert!(out.join("main.py").is_file());
}
