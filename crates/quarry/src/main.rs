use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use log::error;

use quarry_core::package_system::signature;
use quarry_core::package_system::sort::resolve_load_order;
use quarry_core::package_system::validator::Validator;
use quarry_core::{HostContext, HostSide, LoadOptions, PackageDescriptor};

/// Quarry: a dependency-aware package loader
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Host root directory (contains the packs directory)
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Which kind of host to resolve for
    #[arg(long, value_enum, default_value = "client")]
    side: CliSide,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliSide {
    Client,
    Server,
}

impl From<CliSide> for HostSide {
    fn from(side: CliSide) -> Self {
        match side {
            CliSide::Client => HostSide::Client,
            CliSide::Server => HostSide::Server,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List discovered packages and their enabled status
    List {},
    /// Enable a package (persist setting)
    Enable {
        /// The name of the package to enable
        name: String,
    },
    /// Disable a package (persist setting)
    Disable {
        /// The name of the package to disable
        name: String,
    },
    /// Validate the candidate set and print the load order (dry run)
    Resolve {
        /// Named load-set override to apply for this attempt
        #[arg(long)]
        load_set: Option<String>,
        /// Treat weak references as ordering and existence constraints
        #[arg(long)]
        include_weak: bool,
    },
    /// Verify a package's content hash and signature
    Verify {
        /// The package header artifact
        header: PathBuf,
        /// The archive the header describes
        #[arg(long)]
        content: PathBuf,
        /// PEM-encoded ECDSA P-256 verifying key
        #[arg(long)]
        key: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let args = CliArgs::parse();
    let mut ctx = HostContext::new(&args.root, args.side.into());

    match args.command {
        Commands::List {} => {
            let discovered = match ctx.discover().await {
                Ok(discovered) => discovered,
                Err(e) => {
                    error!("Discovery failed: {}", e);
                    return ExitCode::FAILURE;
                }
            };
            if discovered.is_empty() {
                println!("No packages found.");
                return ExitCode::SUCCESS;
            }
            let enabled = ctx.enabled().clone();
            let mut enabled = enabled.lock().await;
            println!("Discovered packages:");
            for pkg in &discovered {
                let status = if enabled.is_enabled(&pkg.name) {
                    "Enabled"
                } else {
                    "Disabled"
                };
                println!(
                    "  - Name: {}, Version: {}, Side: {:?}, Status: {}",
                    pkg.name, pkg.version, pkg.side, status
                );
            }
            ExitCode::SUCCESS
        }
        Commands::Enable { name } => set_enabled(&mut ctx, &name, true).await,
        Commands::Disable { name } => set_enabled(&mut ctx, &name, false).await,
        Commands::Resolve {
            load_set,
            include_weak,
        } => {
            let opts = LoadOptions {
                load_set,
                include_weak,
                skip_all: false,
            };
            match resolve(&mut ctx, &opts).await {
                Ok(order) => {
                    println!("Load order ({} package(s)):", order.len());
                    for (position, pkg) in order.iter().enumerate() {
                        println!("  {}. {} v{}", position + 1, pkg.name, pkg.version);
                    }
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("Resolution failed:\n{}", e);
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Verify {
            header,
            content,
            key,
        } => verify(&header, &content, &key),
    }
}

async fn set_enabled(ctx: &mut HostContext, name: &str, enable: bool) -> ExitCode {
    // Discover first so stale names are pruned before the new flag persists.
    if let Err(e) = ctx.discover().await {
        error!("Discovery failed: {}", e);
        return ExitCode::FAILURE;
    }
    let enabled = ctx.enabled().clone();
    let mut enabled = enabled.lock().await;
    match enabled.set_enabled(name, enable) {
        Ok(()) => {
            let verb = if enable { "enabled" } else { "disabled" };
            println!("Package '{}' {}.", name, verb);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to persist enabled set: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn resolve(
    ctx: &mut HostContext,
    opts: &LoadOptions,
) -> quarry_core::Result<Vec<std::sync::Arc<PackageDescriptor>>> {
    let candidates = ctx.select_candidates(opts).await?;
    let enabled = ctx.enabled().clone();
    let mut enabled = enabled.lock().await;
    Validator::new(opts.include_weak).validate(&candidates, &mut enabled)?;
    Ok(resolve_load_order(&candidates, opts.include_weak)?)
}

fn verify(header: &PathBuf, content: &PathBuf, key: &PathBuf) -> ExitCode {
    let bytes = match std::fs::read(header) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Cannot read header '{}': {}", header.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let descriptor =
        match PackageDescriptor::parse_header(header, &bytes, std::time::SystemTime::UNIX_EPOCH) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                error!("{}", e);
                return ExitCode::FAILURE;
            }
        };

    let archive = match std::fs::read(content) {
        Ok(archive) => archive,
        Err(e) => {
            error!("Cannot read content '{}': {}", content.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let computed = signature::content_hash(&archive);
    if computed != descriptor.hash {
        println!(
            "Hash mismatch for '{}': header declares {}, content is {}",
            descriptor.name,
            hex::encode(descriptor.hash),
            hex::encode(computed)
        );
        return ExitCode::FAILURE;
    }

    let pem = match std::fs::read_to_string(key) {
        Ok(pem) => pem,
        Err(e) => {
            error!("Cannot read key '{}': {}", key.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let verifying_key = match signature::verifying_key_from_pem(&pem) {
        Ok(verifying_key) => verifying_key,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if signature::descriptor_is_signed_by(&descriptor, &verifying_key) {
        println!("Package '{}' is signed by the supplied key.", descriptor.name);
        ExitCode::SUCCESS
    } else {
        println!(
            "Package '{}' is NOT signed by the supplied key.",
            descriptor.name
        );
        ExitCode::FAILURE
    }
}
