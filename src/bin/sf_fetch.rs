//! `sf-fetch`: export or fetch org metadata into a local directory.
//!
//! ```text
//! sf-fetch export
//! sf-fetch export --exclude Document,StaticResource org/schema
//! sf-fetch fetch -t CustomObject -n Book__c -n Author__c
//! sf-fetch fetch -t Aura -n MyComponent -d /Users/me/project/src
//! sf-fetch fetch -t StaticResource -u
//! sf-fetch fetch -x myproj/metadata/package.xml
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use busbar_sf_fetch::config::{absolute, source_dir};
use busbar_sf_fetch::{
    run_export, run_fetch, ExportRequest, FetchRequest, OrgConfig, OrgService, Outcome,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Retrieve Salesforce metadata into a local source tree.
#[derive(Debug, Parser)]
#[command(name = "sf-fetch", version)]
struct Cli {
    /// Read the session of this org alias or username from the `sf` CLI
    /// instead of SF_INSTANCE_URL / SF_ACCESS_TOKEN.
    #[arg(long, global = true, value_name = "ALIAS")]
    target_org: Option<String>,

    /// Metadata API version to use.
    #[arg(long, global = true, value_name = "VERSION", env = "SF_API_VERSION")]
    api_version: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Export metadata to a local directory
    Export {
        /// Output directory (defaults to the project source directory)
        dir: Option<PathBuf>,

        /// Metadata types to exclude from export
        #[arg(long, value_delimiter = ',', value_name = "TYPE")]
        exclude: Vec<String>,

        /// Display warnings about metadata that cannot be retrieved
        #[arg(short, long)]
        warnings: bool,
    },

    /// Export specified artifact(s) to a local directory
    ///
    /// Use the "package" type to retrieve an unmanaged package and "aura" to
    /// lay out Aura bundles as individual source files.
    Fetch {
        /// Type of metadata to retrieve (several allowed when -n is not used)
        #[arg(short = 't', long = "type", value_delimiter = ',', value_name = "TYPE")]
        types: Vec<String>,

        /// Name of specific metadata to retrieve
        #[arg(short = 'n', long = "name", value_delimiter = ',', value_name = "NAME")]
        names: Vec<String>,

        /// Override the default target directory
        #[arg(short = 'd', long = "directory", value_name = "DIR")]
        directory: Option<PathBuf>,

        /// Unpack zipped static resources
        #[arg(short, long)]
        unpack: bool,

        /// Keep the retrieved package zip as <name>.zip
        #[arg(short, long)]
        preserve: bool,

        /// package.xml file describing what to fetch
        #[arg(short = 'x', long = "xml", value_name = "PATH")]
        package_xml: Option<PathBuf>,

        /// Display warnings about metadata that cannot be retrieved
        #[arg(short, long)]
        warnings: bool,
    },
}

async fn load_config(
    target_org: Option<&str>,
    api_version: Option<&str>,
) -> busbar_sf_fetch::Result<OrgConfig> {
    let mut config = match target_org {
        Some(alias) => OrgConfig::from_sf_cli(alias).await?,
        None => OrgConfig::from_env()?,
    };
    if let Some(version) = api_version {
        config.api_version = version.to_string();
    }
    Ok(config)
}

fn resolve_root(cwd: &Path, explicit: Option<&PathBuf>) -> PathBuf {
    match explicit {
        Some(dir) => absolute(cwd, dir),
        None => source_dir(cwd),
    }
}

enum Job {
    Export(ExportRequest),
    Fetch(FetchRequest),
}

fn job_for(command: Command, cwd: &Path) -> Job {
    match command {
        Command::Export {
            dir,
            exclude,
            warnings,
        } => Job::Export(ExportRequest {
            root: resolve_root(cwd, dir.as_ref()),
            exclude,
            show_warnings: warnings,
        }),
        Command::Fetch {
            types,
            names,
            directory,
            unpack,
            preserve,
            package_xml,
            warnings,
        } => Job::Fetch(FetchRequest {
            root: resolve_root(cwd, directory.as_ref()),
            types,
            names,
            unpack,
            preserve,
            package_xml: package_xml.map(|p| absolute(cwd, &p)),
            show_warnings: warnings,
        }),
    }
}

async fn run(cli: Cli) -> busbar_sf_fetch::Result<Outcome> {
    let cwd = std::env::current_dir()?;
    let config = load_config(cli.target_org.as_deref(), cli.api_version.as_deref());
    let job = job_for(cli.command, &cwd);

    // Usage errors surface before any session lookup.
    if let Job::Fetch(request) = &job {
        request.validate()?;
    }

    let service = OrgService::connect(&config.await?)?;
    match job {
        Job::Export(request) => run_export(&service, &request).await,
        Job::Fetch(request) => run_fetch(&service, &request).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(outcome) => {
            for problem in &outcome.problems {
                eprintln!("{}", problem);
            }
            println!("Exported to {}", outcome.root.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("ERROR: {}", err);
            ExitCode::FAILURE
        }
    }
}
