use camino::Utf8PathBuf;
use clap::builder::{styling::AnsiColor, Styles};
use clap::ColorChoice;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use commands::{
    inspect_mod, list_conflicts, move_mod, print_tree, rename_folder, reset_config,
    resolve_path, set_data_dir, set_mod_dir, show_config, InspectModArgs, ListConflictsArgs,
    MoveModArgs, PrintTreeArgs, RenameFolderArgs, ResolvePathArgs,
};
use miette::Result;

mod commands;
mod errors;
mod utils;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Use this mod directory instead of the configured one
    #[arg(long, global = true)]
    mod_dir: Option<Utf8PathBuf>,

    /// Use this data directory instead of the configured one
    #[arg(long, global = true)]
    data_dir: Option<Utf8PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the mod organization tree
    Tree {
        /// Only print this folder
        #[arg(short, long)]
        folder: Option<String>,
    },
    /// Show which file a virtual path resolves to
    Resolve {
        /// The virtual asset path, e.g. assets/characters/hero/skin0.tex
        path: String,

        /// Resolve as this character
        #[arg(short, long)]
        identity: Option<String>,
    },
    /// List paths claimed by more than one enabled mod
    Conflicts {
        /// The collection to inspect (defaults to the current one)
        #[arg(short, long)]
        collection: Option<String>,
    },
    /// Show a mod's metadata, option groups and current selection
    Inspect {
        /// The mod identity (its directory name)
        identity: String,

        /// Explain how this virtual path resolves within the mod
        #[arg(short, long)]
        path: Option<String>,
    },
    /// Move a mod to a new place in the tree
    Move {
        /// The mod identity (its directory name)
        identity: String,

        /// Full tree path including the leaf name, e.g. Skins/Blue/Crimson
        sort_path: String,
    },
    /// Rename a folder of the tree, merging into a sibling of the same name
    RenameFolder {
        /// Slash-separated folder path
        path: String,

        /// The new folder name
        name: String,
    },
    /// Manage the ltk-mods configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the current configuration
    Show,
    /// Set the mod directory
    SetModDir { path: String },
    /// Set the data directory
    SetDataDir { path: String },
    /// Reset the configuration to defaults
    Reset,
}

fn parse_args() -> Args {
    // Configure colored/styled help output
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Blue.on_default());

    let matches = Args::command()
        .styles(styles)
        .color(ColorChoice::Auto)
        .get_matches();

    Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
}

fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ltk_mods=info,ltk_collections=info".into());

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    init_logging();

    let args = parse_args();

    let mut cfg = utils::config::load_config();
    if let Some(dir) = args.mod_dir {
        cfg.mod_directory = Some(dir);
    }
    if let Some(dir) = args.data_dir {
        cfg.data_directory = Some(dir);
    }

    match args.command {
        Commands::Tree { folder } => print_tree(&cfg, PrintTreeArgs { folder }),
        Commands::Resolve { path, identity } => {
            resolve_path(&cfg, ResolvePathArgs { path, identity })
        }
        Commands::Conflicts { collection } => {
            list_conflicts(&cfg, ListConflictsArgs { collection })
        }
        Commands::Inspect { identity, path } => inspect_mod(&cfg, InspectModArgs { identity, path }),
        Commands::Move {
            identity,
            sort_path,
        } => move_mod(
            &cfg,
            MoveModArgs {
                identity,
                sort_path,
            },
        ),
        Commands::RenameFolder { path, name } => {
            rename_folder(&cfg, RenameFolderArgs { path, name })
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => show_config(),
            ConfigCommands::SetModDir { path } => set_mod_dir(path),
            ConfigCommands::SetDataDir { path } => set_data_dir(path),
            ConfigCommands::Reset => reset_config(),
        },
    }
}
