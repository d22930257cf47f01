//! Main application entry point and orchestration logic.
//! Handles command-line argument parsing and dispatches each subcommand.

use std::path::Path;

use provision::{
    cli::{get_args, print_help, Args, Command, ListKind, ProvisionArgs},
    context::Context,
    copier::CopyAction,
    error::{default_error_handler, Error, Result},
    external::pull_external_repo,
    materializer::{clean_target, Materialization, Materializer},
    publisher::{GitBackend, Publisher},
    renderer::TokenRenderer,
};

/// Main application entry point.
fn main() {
    let args = get_args();

    // Logger configuration
    env_logger::Builder::new()
        .filter_level(if args.verbose {
            log::LevelFilter::Trace
        } else {
            log::LevelFilter::Warn
        })
        .init();

    if let Err(err) = run(args) {
        default_error_handler(err);
    }
}

fn run(args: Args) -> Result<()> {
    let Some(command) = args.command else {
        print_help();
        std::process::exit(1);
    };

    let load_context = || Context::load(&args.root, args.manifest.as_deref());

    match command {
        Command::List { kind } => list(&load_context()?, kind),
        Command::Provision(provision_args) => provision(&load_context()?, &provision_args),
        Command::Clean { ai_tool } => clean(&load_context()?, &ai_tool),
        Command::PullRepo { repo, target_dir } => pull_repo(&args.root, &repo, &target_dir),
        Command::Publish { targets } => publish(&load_context()?, targets),
    }
}

fn list(ctx: &Context, kind: ListKind) -> Result<()> {
    let manifest = ctx.manifest();
    if kind.includes_ai_tools() {
        println!("Available AI Tools:");
        for name in manifest.targets.keys() {
            println!("  - {name}");
        }
        println!();
    }
    if kind.includes_projects() && !manifest.project_types.is_empty() {
        println!("Available Project Types:");
        for (name, project) in &manifest.project_types {
            println!("  - {name}: {}", project.name);
            println!("    {}", project.description);
        }
        println!();
    }
    Ok(())
}

fn print_records(materialization: &Materialization) {
    for record in &materialization.records {
        match record.action {
            CopyAction::Skipped => log::debug!("Skipped {}", record.source.display()),
            action => println!(
                "  {action} {} -> {}",
                record.source.display(),
                record.target.display()
            ),
        }
    }
}

fn provision(ctx: &Context, args: &ProvisionArgs) -> Result<()> {
    if args.project_type.is_none() && args.ai_tool.is_none() {
        return Err(Error::UsageError(
            "specify either --project-type or --ai-tool (or both)".to_string(),
        ));
    }

    // Validate both keys before anything is written.
    if let Some(project_type) = &args.project_type {
        ctx.manifest().project_type(project_type)?;
    }
    if let Some(ai_tool) = &args.ai_tool {
        ctx.manifest().target(ai_tool)?;
    }

    let renderer = TokenRenderer::new();
    let metadata = args.metadata();
    let materializer = Materializer::new(ctx, &renderer, &metadata);

    if let Some(project_type) = &args.project_type {
        let project = ctx.manifest().project_type(project_type)?;
        println!("Provisioning {}...", project.name);
        println!("  Description: {}", project.description);
        let result = materializer.materialize_project_type(project_type, ctx.root())?;
        print_records(&result);
        println!("Project type '{project_type}' provisioned successfully!");
    }

    if let Some(ai_tool) = &args.ai_tool {
        println!("Provisioning AI tool configuration for {ai_tool}...");
        let result = materializer.materialize_target(ai_tool, ctx.root())?;
        print_records(&result);
        println!("AI tool configuration for {ai_tool} completed!");
    }

    Ok(())
}

fn clean(ctx: &Context, target: &str) -> Result<()> {
    println!("Cleaning provisioned files for {target}...");
    for path in clean_target(ctx, target)? {
        println!("  Removed {}", path.display());
    }
    println!("Cleanup for {target} completed!");
    Ok(())
}

/// Pulling external resources only needs the external resources map, not the
/// provisioning manifest.
fn pull_repo(root: &Path, repo: &str, target_dir: &Path) -> Result<()> {
    let report = pull_external_repo(root, repo, target_dir)?;
    for (source, destination) in &report.copied {
        println!("  Copied {} -> {}", source.display(), destination.display());
    }
    for folder in &report.missing {
        println!("  Warning: {} not found in repo {repo}", folder.display());
    }
    let target_base = report.target_base.display();
    println!("External resources from {repo} pulled into {target_base}");
    Ok(())
}

fn publish(ctx: &Context, targets: Vec<String>) -> Result<()> {
    let targets = if targets.is_empty() {
        ctx.manifest().targets.keys().cloned().collect()
    } else {
        targets
    };

    let renderer = TokenRenderer::new();
    let mut publisher = Publisher::new(GitBackend::open(ctx.root(), ctx.worktrees_dir())?);
    publisher.publish_targets(ctx, &renderer, &targets, |result, outcome| {
        println!(
            "Materialized {}: {} files ({} excluded)",
            result.name,
            result.written(),
            result.skipped()
        );
        println!("Published {}: {outcome}", result.name);
    })?;

    Ok(())
}
