use anyhow::Result;
use clap::Parser;
use serde_json::json;
use viewshift::config::Config;
use viewshift::diagnostics::Diagnostics;
use viewshift::{cli, logging, project};

fn main() -> Result<()> {
    logging::init_tracing();
    let args = cli::Args::parse();
    let config = Config::get();

    match args.command {
        cli::Command::Migrate {
            urls,
            out,
            project_root,
            sync_handlers,
            jobs,
        } => {
            let output_dir = out.unwrap_or_else(|| config.output_dir.clone());
            let mut migration = config.migration_options();
            if sync_handlers {
                migration.async_handlers = false;
            }
            let options = project::ProjectOptions {
                project_root,
                jobs: jobs.unwrap_or(config.jobs),
                migration,
            };
            let report = project::migrate_project(&urls, &output_dir, &options)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if report.has_failures() {
                std::process::exit(1);
            }
            Ok(())
        }
        cli::Command::Routes { urls } => {
            let (routes, modules) = project::list_routes(&urls)?;
            let listing = json!({ "routes": routes, "modules": modules });
            println!("{}", serde_json::to_string_pretty(&listing)?);
            Ok(())
        }
        cli::Command::Convert {
            urls,
            source,
            sync_handlers,
        } => {
            let mut options = config.migration_options();
            if sync_handlers {
                options.async_handlers = false;
            }
            let diagnostics = Diagnostics::new();
            let code = project::convert_file(&urls, &source, &options, &diagnostics)?;
            print!("{code}");
            for warning in diagnostics.warnings() {
                eprintln!("viewshift: Warning: {}: {}", warning.module, warning.message);
            }
            Ok(())
        }
    }
}
