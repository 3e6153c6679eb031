use crate::errors::CliError;
use crate::println_pad;
use crate::utils::{config::AppConfig, open_manager};
use colored::Colorize;
use ltk_collections::ModManager;
use ltk_mod_tree::{FolderId, ModTree};
use miette::Result;

pub struct PrintTreeArgs {
    /// Only print this folder and what is below it.
    pub folder: Option<String>,
}

pub fn print_tree(cfg: &AppConfig, args: PrintTreeArgs) -> Result<()> {
    let manager = open_manager(cfg)?;
    let tree = manager.file_system().tree();

    let start = match args.folder.as_deref() {
        Some(path) => match tree.find(path) {
            (true, id) => id,
            (false, _) => return Err(CliError::folder_not_found(path).into()),
        },
        None => FolderId::ROOT,
    };

    let title = tree
        .folder_path(start)
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| "/".to_string());
    println_pad!("{}", title.bright_blue().bold());
    print_folder(&manager, tree, start, "");

    println!();
    println_pad!(
        "{} mod(s), current collection: {}",
        tree.all_mods(start, true).len(),
        manager.collections().current_name().bright_cyan()
    );
    Ok(())
}

fn print_folder(manager: &ModManager, tree: &ModTree, id: FolderId, indent: &str) {
    let folders = tree.sub_folders(id);
    let mods = tree.mods_in(id);
    let total = folders.len() + mods.len();
    let mut index = 0;

    for folder in folders {
        index += 1;
        let (branch, next) = branch(indent, index == total);
        let name = tree.folder_name(folder).unwrap_or_default();
        println_pad!("{}{}", branch, format!("{}/", name).bright_blue());
        print_folder(manager, tree, folder, &next);
    }

    let current = manager.collections().current();
    for identity in mods {
        index += 1;
        let (branch, _) = branch(indent, index == total);
        let leaf = tree
            .sort_order(identity)
            .map(|order| order.name.as_str())
            .unwrap_or(identity);
        let enabled = current
            .and_then(|c| c.mod_settings(identity))
            .is_some_and(|s| s.enabled);
        let marker = if enabled {
            "●".bright_green()
        } else {
            "○".dimmed()
        };

        if leaf == identity {
            println_pad!("{}{} {}", branch, marker, leaf);
        } else {
            println_pad!(
                "{}{} {} {}",
                branch,
                marker,
                leaf,
                format!("[{}]", identity).dimmed()
            );
        }
    }
}

fn branch(indent: &str, last: bool) -> (String, String) {
    if last {
        (format!("{}└── ", indent), format!("{}    ", indent))
    } else {
        (format!("{}├── ", indent), format!("{}│   ", indent))
    }
}
