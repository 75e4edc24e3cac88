//! embedvfs - Virtual filesystem overlay for embedded resources
//!
//! Usage:
//!   embedvfs init                              - Write a default configuration
//!   embedvfs map <namespace> <resource>        - Show the virtual path of a resource
//!   embedvfs exists <path>                     - Check whether a virtual file exists
//!   embedvfs cat <path>                        - Print a virtual file
//!   embedvfs hash <path>                       - Print the content hash of a virtual file
//!   embedvfs deps <path> [--with <path>...]    - Show what to watch for changes
//!   embedvfs pack <dir> --name <n> --namespace <ns> - Pack a directory into a bundle archive

use clap::{Parser, Subcommand};
use embedvfs::{
    bundle::{pack_directory, BundleArchive, BundleRegistry},
    config::Config,
    fs::overlay::{map_resource, OverlayResolver},
    settings::MapSettings,
    Error, Result,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "embedvfs")]
#[command(author = "embedvfs Contributors")]
#[command(version)]
#[command(about = "Virtual filesystem overlay for resources embedded in source bundles")]
struct Cli {
    /// Configuration file path (JSON or YAML)
    #[arg(short, long, default_value = "~/.config/embedvfs/config.json")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Directory the application root maps to
        #[arg(long)]
        base_root: Option<PathBuf>,

        /// Source bundles to scan, in order
        #[arg(long = "bundle")]
        bundles: Vec<String>,

        /// Let files on the base filesystem override embedded ones
        #[arg(long)]
        allow_override: bool,
    },

    /// Show the virtual path a resource identifier maps to
    Map {
        /// Base namespace of the bundle
        namespace: String,

        /// Resource identifier, e.g. Demo.Config.MyFile.config
        resource: String,
    },

    /// Check whether a virtual file exists
    Exists {
        /// Virtual path
        path: String,
    },

    /// Print the content of a virtual file
    Cat {
        /// Virtual path
        path: String,
    },

    /// Print the BLAKE3 digest of a virtual file
    Hash {
        /// Virtual path
        path: String,
    },

    /// Show the files that invalidate a virtual file
    Deps {
        /// Virtual path
        path: String,

        /// Additional dependent paths
        #[arg(long = "with")]
        with: Vec<String>,
    },

    /// Pack a directory into a bundle archive
    Pack {
        /// Directory to pack
        dir: PathBuf,

        /// Bundle name
        #[arg(long)]
        name: String,

        /// Base namespace of the resource identifiers
        #[arg(long)]
        namespace: String,

        /// Output file (defaults to the configured bundle directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set subscriber: {}", e);
    }

    // Expand ~ in config path
    let config_path = expand_tilde(&cli.config);

    // Run the command
    match run_command(cli.command, &config_path) {
        Ok(outcome) => {
            if let Some(code) = outcome.exit_code() {
                std::process::exit(code);
            }
        }
        Err(e) => {
            error!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Result of a command that completed without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Success,
    /// The queried file does not exist
    Missing,
}

impl Outcome {
    fn from_exists(exists: bool) -> Self {
        if exists {
            Outcome::Success
        } else {
            Outcome::Missing
        }
    }

    /// Non-zero process exit status, if any
    fn exit_code(self) -> Option<i32> {
        match self {
            Outcome::Success => None,
            Outcome::Missing => Some(2),
        }
    }
}

fn run_command(command: Commands, config_path: &Path) -> Result<Outcome> {
    let outcome = match command {
        Commands::Init {
            base_root,
            bundles,
            allow_override,
        } => cmd_init(config_path, base_root, bundles, allow_override),

        Commands::Map {
            namespace,
            resource,
        } => cmd_map(&namespace, &resource),

        Commands::Exists { path } => {
            return cmd_exists(config_path, &path).map(Outcome::from_exists);
        }

        Commands::Cat { path } => cmd_cat(config_path, &path),

        Commands::Hash { path } => cmd_hash(config_path, &path),

        Commands::Deps { path, with } => cmd_deps(config_path, &path, &with),

        Commands::Pack {
            dir,
            name,
            namespace,
            output,
        } => cmd_pack(config_path, &dir, &name, &namespace, output),
    };

    outcome.map(|()| Outcome::Success)
}

fn cmd_init(
    config_path: &Path,
    base_root: Option<PathBuf>,
    bundles: Vec<String>,
    allow_override: bool,
) -> Result<()> {
    info!("Initializing embedvfs configuration...");

    let mut config = Config::default();
    config.base.root = base_root.map(|p| expand_tilde(&p));
    config.overlay.bundles = bundles;
    config.overlay.allow_override = allow_override;
    config.validate()?;

    // Ensure config directory exists
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    config.save(config_path)?;
    config.ensure_directories()?;

    info!("Configuration saved to {:?}", config_path);
    info!("Bundle directory: {:?}", config.overlay.bundle_dir);

    Ok(())
}

fn cmd_map(namespace: &str, resource: &str) -> Result<()> {
    println!("{}", map_resource(namespace, resource)?);
    Ok(())
}

fn cmd_exists(config_path: &Path, path: &str) -> Result<bool> {
    let resolver = open_resolver(config_path)?;
    let exists = resolver.exists(path)?;
    println!("{}", exists);
    Ok(exists)
}

fn cmd_cat(config_path: &Path, path: &str) -> Result<()> {
    let resolver = open_resolver(config_path)?;
    let mut stream = resolver.open(path)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    io::copy(&mut stream, &mut out)?;
    out.flush()?;
    Ok(())
}

fn cmd_hash(config_path: &Path, path: &str) -> Result<()> {
    let resolver = open_resolver(config_path)?;
    println!("{}  {}", resolver.content_hash(path)?, path);
    Ok(())
}

fn cmd_deps(config_path: &Path, path: &str, with: &[String]) -> Result<()> {
    let resolver = open_resolver(config_path)?;

    match resolver.invalidation_dependency(path, with, SystemTime::now())? {
        Some(dep) => {
            for watched in dep.watched_paths() {
                println!("{}", watched.display());
            }
        }
        None => println!("(nothing to watch)"),
    }
    Ok(())
}

fn cmd_pack(
    config_path: &Path,
    dir: &Path,
    name: &str,
    namespace: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let output = match output {
        Some(path) => path,
        None => {
            let config = load_config(config_path)?;
            config.ensure_directories()?;
            BundleArchive::path_in(&config.overlay.bundle_dir, name)
        }
    };

    info!("Packing {:?} as bundle '{}'...", dir, name);
    let archive = pack_directory(dir, name, namespace)?;
    archive.save(&output)?;

    info!(
        "Wrote {} resources to {:?}",
        archive.declarations.len(),
        output
    );
    Ok(())
}

/// Load the configuration, falling back to defaults when the file is missing
fn load_config(config_path: &Path) -> Result<Config> {
    if config_path.exists() {
        return Config::load(config_path);
    }

    warn!(
        "No configuration at {:?}, using defaults (run 'embedvfs init' to create one)",
        config_path
    );
    let mut config = Config::default();
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

/// Build and initialize a resolver from the configuration
///
/// Missing bundles are reported but do not prevent serving the rest.
fn open_resolver(config_path: &Path) -> Result<OverlayResolver> {
    let config = load_config(config_path)?;
    let settings = Arc::new(MapSettings::new());
    let mut resolver = OverlayResolver::from_config(&config, BundleRegistry::new(), settings)?;

    match resolver.initialize(config.overlay.bundles.as_slice()) {
        Ok(()) => {}
        Err(Error::BundleNotFound(names)) => warn!("Missing source bundles: {}", names),
        Err(e) => return Err(e),
    }

    Ok(resolver)
}

/// Expand ~ to home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_exists_reports_missing_without_exiting() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("site");
        std::fs::create_dir(&base).unwrap();
        std::fs::write(base.join("present.txt"), b"x").unwrap();

        let mut config = Config::default();
        config.overlay.bundle_dir = dir.path().join("bundles");
        config.base.root = Some(base);
        let config_path = dir.path().join("config.json");
        config.save(&config_path).unwrap();

        let outcome = run_command(
            Commands::Exists {
                path: "~/missing.txt".to_string(),
            },
            &config_path,
        )
        .unwrap();
        assert_eq!(outcome, Outcome::Missing);
        assert_eq!(outcome.exit_code(), Some(2));

        let outcome = run_command(
            Commands::Exists {
                path: "~/present.txt".to_string(),
            },
            &config_path,
        )
        .unwrap();
        assert_eq!(outcome, Outcome::Success);
        assert_eq!(outcome.exit_code(), None);
    }

    #[test]
    fn test_exists_propagates_invalid_path() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.overlay.bundle_dir = dir.path().join("bundles");
        let config_path = dir.path().join("config.json");
        config.save(&config_path).unwrap();

        let err = run_command(
            Commands::Exists {
                path: String::new(),
            },
            &config_path,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
