//! Command-line interface implementation.
//! Provides argument parsing and help text formatting using clap.

use clap::{error::ErrorKind, Args as ClapArgs, CommandFactory, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::tokens::ProjectMetadata;

/// Command-line arguments structure.
#[derive(Parser, Debug)]
#[command(
    name = "provision",
    author,
    version,
    about = "Provision AI tool templates and project types",
    long_about = None
)]
pub struct Args {
    /// Repository root that manifest paths are resolved against
    #[arg(long, global = true, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Manifest file (defaults to <ROOT>/map.yaml)
    #[arg(long, global = true, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List available templates
    List {
        /// Type of templates to list
        #[arg(long = "type", value_enum, default_value_t = ListKind::All)]
        kind: ListKind,
    },

    /// Provision templates
    Provision(ProvisionArgs),

    /// Clean provisioned files
    Clean {
        /// AI tool to clean
        #[arg(short = 't', long = "ai-tool", value_name = "TARGET")]
        ai_tool: String,
    },

    /// Pull resources from external repo
    PullRepo {
        /// Repo key from external-resources.map.yaml
        #[arg(long, value_name = "KEY")]
        repo: String,

        /// Target directory in client project
        #[arg(long, value_name = "DIR")]
        target_dir: PathBuf,
    },

    /// Commit materialized targets to their template-<target> branches
    Publish {
        /// Targets to publish; all targets when omitted
        #[arg(value_name = "TARGET")]
        targets: Vec<String>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    AiTools,
    Projects,
    All,
}

impl ListKind {
    pub fn includes_ai_tools(self) -> bool {
        matches!(self, ListKind::AiTools | ListKind::All)
    }

    pub fn includes_projects(self) -> bool {
        matches!(self, ListKind::Projects | ListKind::All)
    }
}

#[derive(ClapArgs, Debug, Default)]
pub struct ProvisionArgs {
    /// AI tool to provision
    #[arg(short = 't', long = "ai-tool", value_name = "TARGET")]
    pub ai_tool: Option<String>,

    /// Project type to provision
    #[arg(short = 'p', long, value_name = "PROJECT_TYPE")]
    pub project_type: Option<String>,

    /// Project name for variable substitution [default: my-project]
    #[arg(long)]
    pub project_name: Option<String>,

    /// Project title for variable substitution [default: title-cased name]
    #[arg(long)]
    pub project_title: Option<String>,

    /// Project description for variable substitution [default: A new project]
    #[arg(long)]
    pub project_description: Option<String>,

    /// Project URL for variable substitution [default: https://example.com]
    #[arg(long)]
    pub project_url: Option<String>,

    /// Project repository URL for variable substitution
    #[arg(long)]
    pub project_repo_url: Option<String>,

    /// Contact email for variable substitution
    #[arg(long)]
    pub project_email: Option<String>,
}

impl ProvisionArgs {
    pub fn metadata(&self) -> ProjectMetadata {
        ProjectMetadata {
            name: self.project_name.clone(),
            title: self.project_title.clone(),
            description: self.project_description.clone(),
            url: self.project_url.clone(),
            repo_url: self.project_repo_url.clone(),
            email: self.project_email.clone(),
        }
    }
}

/// Exit status for missing required command-line arguments.
pub const MISSING_ARGUMENT_EXIT_CODE: i32 = 2;

/// Exit status for a command-line parse error. Missing required arguments map
/// to [`MISSING_ARGUMENT_EXIT_CODE`]; everything else keeps clap's status (0 for
/// `--help` and `--version`).
pub fn exit_code(err: &clap::Error) -> i32 {
    if err.kind() == ErrorKind::MissingRequiredArgument {
        MISSING_ARGUMENT_EXIT_CODE
    } else {
        err.exit_code()
    }
}

/// Parses command line arguments and returns the Args structure.
///
/// # Exits
/// * With status code 2 if required arguments are missing
/// * With clap's default error handling for other argument errors
pub fn get_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // Help and version output go to stdout, errors to stderr.
            let _ = e.print();
            std::process::exit(exit_code(&e));
        }
    }
}

/// Prints the top-level help text.
pub fn print_help() {
    // Failing to write help to a closed stdout is not worth reporting.
    let _ = Args::command().print_help();
}
