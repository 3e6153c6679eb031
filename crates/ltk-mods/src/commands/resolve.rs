use crate::println_pad;
use crate::errors::CliError;
use crate::utils::{config::AppConfig, open_manager};
use colored::Colorize;
use ltk_collections::ResolveSource;
use ltk_mod_core::{GamePath, Redirect};
use miette::Result;

pub struct ResolvePathArgs {
    pub path: String,
    /// Requesting character; `None` asks as an unbound requester.
    pub identity: Option<String>,
}

pub fn resolve_path(cfg: &AppConfig, args: ResolvePathArgs) -> Result<()> {
    let manager = open_manager(cfg)?;
    let path = GamePath::new(&args.path);
    let identity = args.identity.as_deref();

    println_pad!("{} {}", "🔎 Path:".bright_blue().bold(), path.as_str().bright_white());
    if let Some(identity) = identity {
        println_pad!("{} {}", "👤 Requester:".bright_blue(), identity.bright_white());
    }

    let Some((source, entry)) = manager.resolve_entry(&path, identity) else {
        println_pad!("{}", "No collection redirects this path; the original file is served.".dimmed());
        return Ok(());
    };

    let collections = manager.collections();
    let collection = match source {
        ResolveSource::Character => identity.and_then(|id| collections.character_collection(id)),
        ResolveSource::Default => collections.default_name(),
        ResolveSource::Forced => collections.forced_name(),
    }
    .unwrap_or("?");
    let mod_name = manager
        .descriptor(&entry.mod_identity)
        .map(|d| d.display_name())
        .unwrap_or(&entry.mod_identity);

    println_pad!(
        "{} {} {}",
        "📚 Collection:".bright_green(),
        collection.bright_cyan().bold(),
        format!("({:?})", source).dimmed()
    );
    println_pad!(
        "{} {} {}",
        "📦 Mod:".bright_green(),
        mod_name.bright_white().bold(),
        format!("[{}]", entry.mod_identity).dimmed()
    );
    match &entry.redirect {
        Redirect::File(file) => {
            println_pad!("{} {}", "➡️  File:".bright_green(), file.to_string().bright_white())
        }
        Redirect::Removed => println_pad!(
            "{} {}",
            "⛔ Removed:".bright_red(),
            "an option group claims this path without supplying a file".bright_white()
        ),
    }
    Ok(())
}

pub struct ListConflictsArgs {
    /// Collection to report on; the current one when `None`.
    pub collection: Option<String>,
}

pub fn list_conflicts(cfg: &AppConfig, args: ListConflictsArgs) -> Result<()> {
    let manager = open_manager(cfg)?;
    let name = args
        .collection
        .as_deref()
        .unwrap_or(manager.collections().current_name());
    let conflicts = manager
        .conflicts(Some(name))
        .map_err(CliError::from)?;

    if conflicts.is_empty() {
        println_pad!("{} {}", "✓ No conflicts in".bright_green().bold(), name.bright_cyan());
        return Ok(());
    }

    println_pad!(
        "{} {} {}",
        "⚔️  Conflicts in".bright_yellow().bold(),
        name.bright_cyan().bold(),
        format!("({})", conflicts.len()).dimmed()
    );
    for conflict in conflicts {
        println_pad!("\n{}", conflict.path.as_str().bright_white().bold());
        for contribution in &conflict.contributions {
            let won = contribution.mod_identity == conflict.winner;
            let marker = if won { "★".bright_green() } else { "•".dimmed() };
            println_pad!(
                "   {} {} {}",
                marker,
                contribution.mod_name.bright_cyan(),
                format!(
                    "(priority: {}, order: {})",
                    contribution.priority, contribution.discovery_order
                )
                .dimmed()
            );
        }
    }
    Ok(())
}
