use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use viewshift::diagnostics::{Diagnostics, ModuleScope};
use viewshift::migrate::{MigrationOptions, process_source};
use viewshift::routes::Route;
use viewshift::syntax::{parse_module, unparse};

const HEADER: &str = "from rest_framework.decorators import api_view\nfrom rest_framework.response import Response\nfrom rest_framework.views import APIView\nfrom rest_framework import status\n";

/// A views module with `count` of each view shape.
fn build_module(count: usize) -> (String, Vec<Route>) {
    let mut source = String::from(HEADER);
    let mut routes = Vec::new();
    for i in 0..count {
        source.push_str(&format!(
            r#"

@api_view(["GET", "POST"])
def search_{i}(request, pk):
    term = request.query_params.get("term", "")
    page = request.GET["page"]
    if not term:
        return Response({{"error": "term"}}, status=status.HTTP_400_BAD_REQUEST)
    return Response({{"items": [], "page": page, "user": request.user.id}})


class Posts{i}View(APIView):
    def get(self, request):
        return Response([])

    def post(self, request):
        title = request.data["title"]
        body = request.data.get("body", "")
        return Response({{"title": title, "body": body}}, status=status.HTTP_200_OK)

    def put(self, request):
        ...

    def delete(self, request):
        ...


class Action{i}View(APIView):
    limit = 10

    def post(self, request):
        return Response(self.helper(self.limit))

    def helper(self, n):
        return n * 2
"#
        ));
        routes.push(Route::new(format!("/search/{{pk}}/{i}"), format!("search_{i}")));
        routes.push(Route::new(format!("/posts/{i}"), format!("Posts{i}View")));
        routes.push(Route::new(format!("/action/{i}"), format!("Action{i}View")));
    }
    (source, routes)
}

fn bench_parse_print(c: &mut Criterion) {
    let (source, _) = build_module(20);
    c.bench_function("parse_print_60_views", |b| {
        b.iter(|| {
            let tree = parse_module(black_box(&source)).unwrap();
            black_box(unparse(&tree, tree.root()))
        })
    });
}

fn bench_process_source(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_source");
    for count in [1, 10, 50] {
        let (source, routes) = build_module(count);
        let options = MigrationOptions::default();
        group.bench_with_input(BenchmarkId::from_parameter(count * 3), &source, |b, source| {
            b.iter(|| {
                let diagnostics = Diagnostics::new();
                let scope = ModuleScope::new(&diagnostics, "bench.views");
                let converted =
                    process_source(black_box(source), black_box(&routes), &options, &scope).unwrap();
                black_box(converted.code.len())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parse_print, bench_process_source);
criterion_main!(benches);
