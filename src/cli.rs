use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "viewshift",
    version,
    about = "Migrate Django REST views to FastAPI routers",
    after_help = r#"Examples:
  viewshift migrate --urls project/site/urls.py --out output
  viewshift migrate --urls project/site/urls.py --project-root project --sync-handlers
  viewshift routes --urls project/site/urls.py
  viewshift convert --urls project/site/urls.py --source project/blog/views.py
"#
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Migrate every module providing a routed view and scaffold the app.
    Migrate {
        /// Django routes file declaring `urlpatterns`.
        #[arg(long)]
        urls: PathBuf,
        /// Output directory (defaults to VIEWSHIFT_OUTPUT_DIR or `output`).
        #[arg(long)]
        out: Option<PathBuf>,
        /// Root for absolute module paths (defaults to the parent of the routes package).
        #[arg(long)]
        project_root: Option<PathBuf>,
        /// Emit plain `def` handlers instead of `async def`.
        #[arg(long)]
        sync_handlers: bool,
        /// Worker threads; 0 uses one per core.
        #[arg(long)]
        jobs: Option<usize>,
    },
    /// Print the route table and the modules providing it as JSON.
    Routes {
        #[arg(long)]
        urls: PathBuf,
    },
    /// Migrate a single module and print it to stdout.
    Convert {
        #[arg(long)]
        urls: PathBuf,
        #[arg(long)]
        source: PathBuf,
        /// Emit plain `def` handlers instead of `async def`.
        #[arg(long)]
        sync_handlers: bool,
    },
}
