//! layout-host: command-line front end for stored layouts.
//!
//! Loads layouts from the file store, rebuilds them against the standard
//! element catalog and writes them back.
//!
//! # Usage
//!
//! ```text
//! layout-host [OPTIONS] <COMMAND>
//!
//! Commands:
//!   show        <RESOURCE>            Print the element tree of a layout
//!   normalize   <RESOURCE>            Print a layout in canonical form
//!   copy        <RESOURCE> <TARGET>   Store a layout under a new name
//!   list        [--private]           List stored layouts
//!   init-config                       Write the default config file
//!
//! Options:
//!   --config       <PATH>   Config file [default: platform config dir]
//!   --storage-root <DIR>    Override `storage.root`
//!   --user         <NAME>   Override `storage.user`
//!   --max-depth    <N>      Override `engine.max_depth`
//!   --strict                Skip unrecognized subtrees instead of flattening
//! ```
//!
//! `RESOURCE` is `app:<id>`, `shared:<name>`, `private:<name>` or a path
//! under `<root>/resources/`.  `TARGET` is `shared:<name>` or
//! `private:<name>`.
//!
//! # Environment variable overrides
//!
//! | Variable                | Option           |
//! |-------------------------|------------------|
//! | `LAYOUT_HOST_CONFIG`    | `--config`       |
//! | `LAYOUT_HOST_ROOT`      | `--storage-root` |
//! | `LAYOUT_HOST_USER`      | `--user`         |
//! | `LAYOUT_HOST_MAX_DEPTH` | `--max-depth`    |
//!
//! Log output goes to stderr.  `RUST_LOG` takes precedence over
//! `storage.log_level`.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use layout_core::{DeserializeOptions, ElementId, ElementTree, LayoutIdentifier};
use layout_host::application::open_layout::{OpenLayoutUseCase, OpenedLayout};
use layout_host::application::save_layout::{normalize, SaveLayoutUseCase};
use layout_host::infrastructure::catalog::standard_registry;
use layout_host::infrastructure::storage::config::{
    config_file_path, load_config_from, save_config_to, HostConfig, PolicySetting,
};
use layout_host::infrastructure::storage::FileLayoutStore;

// ── CLI definition ────────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(
    name = "layout-host",
    about = "Load, inspect and store persisted UI layouts",
    version
)]
struct Cli {
    /// Path of the TOML config file.
    #[arg(long, global = true, env = "LAYOUT_HOST_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding `shared/`, `users/` and `resources/`.
    #[arg(long, global = true, env = "LAYOUT_HOST_ROOT")]
    storage_root: Option<PathBuf>,

    /// Owner of `private:` layouts.
    #[arg(long, global = true, env = "LAYOUT_HOST_USER")]
    user: Option<String>,

    /// Maximum element nesting accepted on load and save.
    #[arg(long, global = true, env = "LAYOUT_HOST_MAX_DEPTH")]
    max_depth: Option<usize>,

    /// Skip unrecognized elements together with their children.
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the element tree of a layout and any load diagnostics.
    Show { resource: String },
    /// Print a layout re-serialized through the element catalog.
    Normalize { resource: String },
    /// Load a layout and store it under a new identifier.
    Copy { resource: String, target: String },
    /// List stored layouts.
    List {
        /// List the current user's private layouts instead of shared ones.
        #[arg(long)]
        private: bool,
    },
    /// Write the effective configuration to the config file.
    InitConfig,
}

impl Cli {
    fn config_path(&self) -> anyhow::Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => config_file_path().context("cannot locate the config directory"),
        }
    }

    /// Applies command-line overrides on top of the file configuration.
    fn apply(&self, mut config: HostConfig) -> HostConfig {
        if let Some(root) = &self.storage_root {
            config.storage.root = root.clone();
        }
        if let Some(user) = &self.user {
            config.storage.user = user.clone();
        }
        if let Some(max_depth) = self.max_depth {
            config.engine.max_depth = max_depth;
        }
        if self.strict {
            config.engine.unresolved_policy = PolicySetting::SkipSubtree;
        }
        config
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config_path()?;
    let config = load_config_from(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    let config = cli.apply(config);

    // `RUST_LOG` wins; otherwise the configured level applies.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.storage.log_level)),
        )
        .init();

    info!(
        root = %config.storage.root.display(),
        user = %config.storage.user,
        "layout-host starting"
    );

    let output = run(&cli.command, &config, &config_path)?;
    print!("{output}");
    Ok(())
}

/// Executes one command and returns what it prints.
fn run(command: &Command, config: &HostConfig, config_path: &std::path::Path) -> anyhow::Result<String> {
    let store = FileLayoutStore::from_config(config);
    let registry = standard_registry().context("element catalog is inconsistent")?;
    let options = DeserializeOptions::from(&config.engine);
    let max_depth = config.engine.max_depth;

    match command {
        Command::Show { resource } => {
            let opened = OpenLayoutUseCase::new(&store, &registry, options)
                .open(resource)
                .with_context(|| format!("failed to open layout '{resource}'"))?;
            Ok(describe(&opened))
        }
        Command::Normalize { resource } => {
            let opened = OpenLayoutUseCase::new(&store, &registry, options)
                .open(resource)
                .with_context(|| format!("failed to open layout '{resource}'"))?;
            let layout = normalize(&opened, max_depth)
                .with_context(|| format!("failed to serialize layout '{resource}'"))?;
            Ok(layout.to_xml()?)
        }
        Command::Copy { resource, target } => {
            let id: LayoutIdentifier = target
                .parse()
                .with_context(|| format!("invalid target '{target}'"))?;
            let opened = OpenLayoutUseCase::new(&store, &registry, options)
                .open(resource)
                .with_context(|| format!("failed to open layout '{resource}'"))?;
            SaveLayoutUseCase::new(&store, max_depth)
                .save_opened(&opened, &id)
                .with_context(|| format!("failed to save layout '{id}'"))?;
            Ok(format!("{resource} -> {id}\n"))
        }
        Command::List { private } => {
            let layouts = store
                .list_layouts(!private)
                .context("failed to list layouts")?;
            Ok(layouts.iter().map(|id| format!("{id}\n")).collect())
        }
        Command::InitConfig => {
            save_config_to(config_path, config)
                .with_context(|| format!("failed to write {}", config_path.display()))?;
            Ok(format!("wrote {}\n", config_path.display()))
        }
    }
}

// ── Rendering ─────────────────────────────────────────────────────────────────

fn describe(opened: &OpenedLayout) -> String {
    let mut out = String::new();
    let name = opened.layout.name().filter(|n| !n.is_empty()).unwrap_or("(unnamed)");
    let version = opened.layout.version().filter(|v| !v.is_empty()).unwrap_or("?");
    let _ = writeln!(out, "layout {name} (version {version})");
    outline(&opened.tree, opened.desktop, 1, &mut out);
    for diagnostic in &opened.outcome.diagnostics {
        let _ = writeln!(out, "warning: {diagnostic}");
    }
    out
}

/// Appends one line per element: tag followed by its set properties.
fn outline(tree: &ElementTree, id: ElementId, depth: usize, out: &mut String) {
    let Some(element) = tree.get(id) else {
        return;
    };
    let _ = write!(out, "{:indent$}{}", "", element.tag(), indent = depth * 2);
    for property in element.descriptor().properties() {
        if let Some(value) = element.property(property.id()) {
            let _ = write!(out, " {}={value}", property.id());
        }
    }
    out.push('\n');
    for &child in element.children() {
        outline(tree, child, depth + 1, out);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
