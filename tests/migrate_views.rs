use viewshift::diagnostics::{Diagnostics, DiagnosticsSink, ModuleScope};
use viewshift::migrate::{MigrationOptions, RequiredImport, RouterFactory, process_source};
use viewshift::routes::Route;

fn convert(source: &str, routes: &[Route]) -> (String, Vec<String>, usize) {
    let diagnostics = Diagnostics::new();
    let scope = ModuleScope::new(&diagnostics, "app.views");
    let converted = process_source(source, routes, &MigrationOptions::default(), &scope).unwrap();
    (
        converted.code,
        converted.outcome.routers,
        diagnostics.warning_count(),
    )
}

#[test]
fn query_rebinding_becomes_optional_parameter() {
    let source = r#"
from rest_framework.decorators import api_view
from rest_framework.response import Response


@api_view(["GET"])
def my_view(request):
    category = request.query_params.get("category")
    return Response(category)
"#;
    let (code, routers, warnings) = convert(source, &[Route::new("/items", "my_view")]);
    assert_eq!(warnings, 0);
    assert_eq!(routers, vec!["router"]);
    assert!(code.contains(
        "@router.get(\"/items\")\nasync def my_view(category: Optional[str]) -> PayloadOutputMyView:\n    return category\n"
    ));
    assert!(!code.contains("category = "));
    assert!(!code.contains("rest_framework"));
}

#[test]
fn body_subscript_becomes_typed_data_parameter() {
    let source = r#"
@api_view(["POST"])
def my_view(request):
    posts = request.data["posts"]
    return Response(posts, status=status.HTTP_201_CREATED)
"#;
    let (code, _, _) = convert(source, &[Route::new("/posts", "my_view")]);
    assert!(code.contains(
        "PayloadInputMyView = TypedDict(\"PayloadInputMyView\", {\"posts\": Any})\n"
    ));
    assert!(code.contains("async def my_view(data: PayloadInputMyView) -> PayloadOutputMyView:"));
    assert!(code.contains("    posts = data[\"posts\"]\n"));
    assert!(code.contains("    return Response(posts, status.HTTP_201_CREATED)\n"));
}

#[test]
fn crud_class_is_kept_on_its_own_router() {
    let source = r#"
from rest_framework.views import APIView


class PostsView(APIView):
    def get(self, request):
        ...

    def post(self, request):
        ...

    def put(self, request):
        ...

    def delete(self, request):
        ...
"#;
    let (code, routers, _) = convert(source, &[Route::new("/posts", "PostsView")]);
    assert_eq!(routers, vec!["router_posts"]);
    assert!(code.contains("from fastapi_utils.cbv import cbv\n"));
    assert!(code.contains("router_posts = InferringRouter()\n\n\n@cbv(router_posts)\nclass PostsView:\n"));
    for verb in ["get", "post", "put", "delete"] {
        assert!(code.contains(&format!(
            "    @router_posts.{verb}(\"/\")\n    async def {verb}(self):\n        ...\n"
        )));
    }
    assert!(!code.contains("APIView"));
    assert!(code.ends_with("routers = [router_posts]\n"));
}

#[test]
fn stateless_class_flattens_without_self() {
    let source = r#"
class UniqueActionView(APIView):
    def post(self, request):
        self.other_method("bla")

    def other_method(self, arg):
        ...
"#;
    let (code, routers, _) = convert(source, &[Route::new("/do-something", "UniqueActionView")]);
    assert_eq!(routers, vec!["router"]);
    assert!(code.contains(
        "@router.post(\"/do-something\")\nasync def post_unique_action():\n    other_method(\"bla\")\n\n\ndef other_method(arg):\n    ...\n"
    ));
    assert!(!code.contains("self"));
    assert!(!code.contains("class UniqueActionView"));
}

#[test]
fn success_responses_collapse_and_others_stay_explicit() {
    let source = r#"
@api_view(["POST"])
def create(request):
    title = request.data["title"]
    if not title:
        return Response({"error": "title"}, status=status.HTTP_400_BAD_REQUEST)
    return Response({"id": 1}, status=status.HTTP_200_OK)
"#;
    let (code, _, _) = convert(source, &[Route::new("/create", "create")]);
    assert!(code.contains("        return Response({\"error\": \"title\"}, status.HTTP_400_BAD_REQUEST)\n"));
    assert!(code.contains("    return {\"id\": 1}\n"));
    assert!(code.contains(
        "PayloadOutputCreate = TypedDict(\"PayloadOutputCreate\", {\"error\": str})\n"
    ));
}

#[test]
fn unrouted_declarations_pass_through() {
    let source = "def helper(request):\n    return request.data\n\n\nclass Plain:\n    pass\n";
    let (code, routers, warnings) = convert(source, &[Route::new("/x", "elsewhere")]);
    assert_eq!(code, source);
    assert!(routers.is_empty());
    assert_eq!(warnings, 0);
}

#[test]
fn routed_function_without_api_view_is_reported() {
    let source = "def signin(request):\n    ...\n";
    let (code, routers, warnings) = convert(source, &[Route::new("/auth/signin", "signin")]);
    assert_eq!(code, source);
    assert!(routers.is_empty());
    assert_eq!(warnings, 1);
}

#[test]
fn generated_signatures_never_put_defaults_first() {
    let source = r#"
class SearchView(APIView):
    def get(self, request, pk):
        page = request.GET.get("page", 1)
        term = request.GET["term"]
        user = request.user
        body = request.data
        return Response([page, term, user, body])
"#;
    let (code, _, _) = convert(source, &[Route::new("/search/{pk}", "SearchView")]);
    assert!(code.contains(
        "async def get_search(pk, term: str, data: PayloadInputSearchViewGet, page: Optional[str] = 1, user: Any = Depends(get_user)) -> PayloadOutputSearchViewGet:"
    ));
}

#[test]
fn api_router_factory_is_honoured() {
    let diagnostics = Diagnostics::new();
    let scope = ModuleScope::new(&diagnostics, "app.views");
    let options = MigrationOptions {
        async_handlers: false,
        router_factory: RouterFactory::ApiRouter,
    };
    let converted = process_source(
        "@api_view\ndef ping(request):\n    return Response(\"pong\")\n",
        &[Route::new("/ping", "ping")],
        &options,
        &scope,
    )
    .unwrap();
    assert!(converted.code.contains("router = APIRouter()\n"));
    assert!(converted.code.contains("def ping() -> PayloadOutputPing:\n    return \"pong\"\n"));
    assert!(!converted.code.contains("async def"));
    assert!(
        converted
            .outcome
            .imports
            .contains(&RequiredImport::Router(RouterFactory::ApiRouter))
    );
}

#[test]
fn settings_import_is_redirected() {
    let source = "from django.conf import settings\nfrom django.db import models\n\n\n@api_view\ndef ping(request):\n    return Response(settings.NAME)\n";
    let (code, _, _) = convert(source, &[Route::new("/ping", "ping")]);
    assert!(code.starts_with("from conf import settings\nfrom fastapi import"));
    assert!(!code.contains("django"));
}
