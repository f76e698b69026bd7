//! End-to-end driver: routes file in, a runnable FastAPI project out.

use crate::diagnostics::{Diagnostics, ModuleScope, Warning};
use crate::migrate::{MigrationOptions, MigrationOutcome, process_source};
use crate::routes::{self, Route};
use crate::util;
use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

const BOOTSTRAP_FILE: &str = "bootstrap.py";
const ENTRYPOINT_FILE: &str = "main.py";

const BOOTSTRAP_TEMPLATE: &str = r#"from os import getenv

from fastapi import FastAPI

CONTEXT = getenv("CONTEXT", "prod")


def create_app():
    if CONTEXT == "dev":
        return FastAPI()
    else:
        return FastAPI(docs_url="/debug", redoc_url=None)


app = create_app()
"#;

const ENTRYPOINT_TEMPLATE: &str = r#"import glob
import importlib.util
import os

import uvicorn

from bootstrap import app, CONTEXT

HERE = os.path.dirname(os.path.abspath(__file__))

for path in sorted(glob.glob(os.path.join(HERE, "*.py"))):
    name = os.path.splitext(os.path.basename(path))[0]
    if name in ("main", "bootstrap"):
        continue
    spec = importlib.util.spec_from_file_location(name, path)
    module = importlib.util.module_from_spec(spec)
    spec.loader.exec_module(module)
    for router in getattr(module, "routers", []):
        app.include_router(router)


if __name__ == "__main__":
    uvicorn.run("main:app", host="127.0.0.1", port=4000, log_level="error", reload=CONTEXT == "dev")
"#;

#[derive(Debug, Clone, Default)]
pub struct ProjectOptions {
    /// Root that absolute module paths resolve under; defaults to the parent
    /// of the directory holding the routes file.
    pub project_root: Option<PathBuf>,
    /// Worker threads; 0 uses the rayon default.
    pub jobs: usize,
    pub migration: MigrationOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleReport {
    pub module: String,
    pub source: String,
    pub output: String,
    #[serde(flatten)]
    pub outcome: MigrationOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleFailure {
    pub module: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub routes: Vec<Route>,
    pub modules: Vec<ModuleReport>,
    pub failures: Vec<ModuleFailure>,
    pub warnings: Vec<Warning>,
    pub duration_ms: u64,
}

impl RunReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Project root used when none is given: the parent of the routes file's directory.
pub fn default_project_root(urls_path: &Path) -> PathBuf {
    let urls_dir = urls_path.parent().unwrap_or(Path::new("."));
    urls_dir.parent().unwrap_or(urls_dir).to_path_buf()
}

/// `blog/api/views.py` under the root -> `blog-api-views.py`.
pub fn output_file_name(project_root: &Path, source: &Path, module: &str) -> String {
    let stem = match source.strip_prefix(project_root) {
        Ok(relative) => {
            let normalized = util::normalize_path(relative);
            let trimmed = normalized.strip_suffix(".py").unwrap_or(&normalized);
            trimmed
                .strip_suffix("/__init__")
                .unwrap_or(trimmed)
                .replace('/', "-")
        }
        Err(_) => module.trim_start_matches('.').replace('.', "-"),
    };
    format!("{stem}.py")
}

/// Routes declared by the urls file together with the modules providing them.
pub fn list_routes(urls_path: &Path) -> Result<(Vec<Route>, Vec<String>)> {
    let source = util::read_to_string(urls_path)?;
    let routes = routes::get_routes(&source)
        .with_context(|| format!("read routes from {}", urls_path.display()))?;
    let modules = routes::modules_from_routes(&source, &routes)
        .with_context(|| format!("read imports from {}", urls_path.display()))?;
    Ok((routes, modules))
}

/// Convert one module with an explicit route table, without touching the filesystem
/// beyond reading `source_path`.
pub fn convert_file(
    urls_path: &Path,
    source_path: &Path,
    options: &MigrationOptions,
    diagnostics: &Diagnostics,
) -> Result<String> {
    let (routes, _) = list_routes(urls_path)?;
    let source = util::read_to_string(source_path)?;
    let module = util::normalize_path(source_path);
    let scope = ModuleScope::new(diagnostics, &module);
    let converted = process_source(&source, &routes, options, &scope)
        .with_context(|| format!("migrate {}", source_path.display()))?;
    Ok(converted.code)
}

fn migrate_one(
    module: &str,
    project_root: &Path,
    urls_dir: &Path,
    output_dir: &Path,
    routes: &[Route],
    options: &MigrationOptions,
    diagnostics: &Diagnostics,
) -> Result<ModuleReport> {
    let path = routes::resolve_module_path(project_root, urls_dir, module)
        .with_context(|| format!("resolve module {module}"))?;
    let source = util::read_to_string(&path)?;
    let scope = ModuleScope::new(diagnostics, module);
    let converted = process_source(&source, routes, options, &scope)
        .with_context(|| format!("migrate {}", path.display()))?;
    let output = output_dir.join(output_file_name(project_root, &path, module));
    util::write_string(&output, &converted.code)?;
    tracing::info!(
        module,
        output = %output.display(),
        routers = converted.outcome.routers.len(),
        "migrated module"
    );
    Ok(ModuleReport {
        module: module.to_string(),
        source: util::normalize_path(&path),
        output: util::normalize_path(&output),
        outcome: converted.outcome,
    })
}

/// Migrate every module that provides a routed view and scaffold the app.
///
/// A failing module is reported and skipped; only problems with the routes
/// file itself or the output directory abort the run.
pub fn migrate_project(urls_path: &Path, output_dir: &Path, options: &ProjectOptions) -> Result<RunReport> {
    let start = Instant::now();
    let (routes, modules) = list_routes(urls_path)?;
    let urls_dir = urls_path.parent().unwrap_or(Path::new(".")).to_path_buf();
    let project_root = options
        .project_root
        .clone()
        .unwrap_or_else(|| default_project_root(urls_path));
    tracing::info!(
        routes = routes.len(),
        modules = modules.len(),
        root = %project_root.display(),
        "starting migration"
    );

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("create dir {}", output_dir.display()))?;
    let diagnostics = Diagnostics::new();

    let run = || -> Vec<(String, Result<ModuleReport>)> {
        modules
            .par_iter()
            .map(|module| {
                let result = migrate_one(
                    module,
                    &project_root,
                    &urls_dir,
                    output_dir,
                    &routes,
                    &options.migration,
                    &diagnostics,
                );
                (module.clone(), result)
            })
            .collect()
    };
    let results = if options.jobs > 0 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.jobs)
            .build()
            .with_context(|| "build worker pool")?;
        pool.install(run)
    } else {
        run()
    };

    let mut reports = Vec::new();
    let mut failures = Vec::new();
    for (module, result) in results {
        match result {
            Ok(report) => reports.push(report),
            Err(err) => {
                let reason = format!("{err:#}");
                tracing::error!(module = %module, "module migration failed: {reason}");
                failures.push(ModuleFailure { module, reason });
            }
        }
    }

    util::write_string(&output_dir.join(BOOTSTRAP_FILE), BOOTSTRAP_TEMPLATE)?;
    util::write_string(&output_dir.join(ENTRYPOINT_FILE), ENTRYPOINT_TEMPLATE)?;

    Ok(RunReport {
        routes,
        modules: reports,
        failures,
        warnings: diagnostics.warnings(),
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_names_flatten_module_paths() {
        let root = Path::new("/proj");
        assert_eq!(
            output_file_name(root, Path::new("/proj/blog/api/views.py"), "blog.api.views"),
            "blog-api-views.py"
        );
        assert_eq!(
            output_file_name(root, Path::new("/proj/blog/api/__init__.py"), "blog.api"),
            "blog-api.py"
        );
        assert_eq!(
            output_file_name(root, Path::new("/elsewhere/views.py"), "..views"),
            "views.py"
        );
    }

    #[test]
    fn default_root_is_the_parent_of_the_urls_package() {
        assert_eq!(
            default_project_root(Path::new("/proj/site/urls.py")),
            PathBuf::from("/proj")
        );
    }
}
