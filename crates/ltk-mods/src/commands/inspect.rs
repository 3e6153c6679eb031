use crate::errors::CliError;
use crate::println_pad;
use crate::utils::{config::AppConfig, open_manager, print_ansi_boxed_lines};
use colored::Colorize;
use ltk_mod_core::{
    all_files_for_path, resolve_path, GamePath, ModSettings, Redirect, SelectionType,
};
use miette::Result;

pub struct InspectModArgs {
    pub identity: String,
    /// Explain how this virtual path resolves within the mod.
    pub path: Option<String>,
}

pub fn inspect_mod(cfg: &AppConfig, args: InspectModArgs) -> Result<()> {
    let manager = open_manager(cfg)?;
    let descriptor = manager
        .descriptor(&args.identity)
        .ok_or_else(|| CliError::mod_not_found(&args.identity))?;

    let collection = manager.collections().current();
    let settings = collection
        .and_then(|c| c.mod_settings(descriptor.identity()))
        .cloned()
        .unwrap_or_else(|| ModSettings::default_for(descriptor));

    let mut header = vec![
        format!("{} {}", "📦 Mod:".bright_blue().bold(), descriptor.display_name().bright_cyan().bold()),
        format!("{} {}", "🆔 Identity:".bright_blue(), descriptor.identity()),
        format!("{} {}", "📁 Location:".bright_blue(), descriptor.base_path()),
    ];
    if !descriptor.meta.version.is_empty() {
        header.push(format!("{} {}", "🏷️ Version:".bright_green(), descriptor.meta.version));
    }
    if let Some(path) = manager.file_system().tree().full_path(descriptor.identity()) {
        header.push(format!("{} {}", "🗂️ Tree:".bright_green(), path));
    }
    print_ansi_boxed_lines(&header);

    if !descriptor.meta.description.is_empty() {
        println_pad!("\n{}", descriptor.meta.description.bright_white());
    }

    println_pad!(
        "\n{} {} {}",
        "⚙️  Settings in".bright_magenta().bold(),
        manager.collections().current_name().bright_cyan(),
        format!(
            "(enabled: {}, priority: {})",
            settings.enabled, settings.priority
        )
        .dimmed()
    );

    for group in descriptor.groups() {
        let selection = settings.selection(group.name());
        println_pad!(
            "   {} {} {}",
            "•".bright_cyan(),
            group.name().bright_cyan().bold(),
            format!("({})", group.selection_type()).dimmed()
        );
        for (index, option) in group.options().iter().enumerate() {
            let active = match group.selection_type() {
                SelectionType::Single => selection as usize == index,
                SelectionType::Multi => selection & (1 << index) != 0,
            };
            let marker = if active { "●".bright_green() } else { "○".dimmed() };
            println_pad!(
                "       {} {} {}",
                marker,
                option.name,
                format!("{} file(s)", option.files.len()).dimmed()
            );
        }
    }

    println_pad!(
        "\n{} {}",
        "🧾 Files:".bright_magenta().bold(),
        descriptor.files().len()
    );

    if let Some(path) = args.path {
        let path = GamePath::new(&path);
        println_pad!("\n{} {}", "🔎 Path:".bright_blue().bold(), path.as_str());

        let candidates = all_files_for_path(&path, descriptor);
        if candidates.is_empty() {
            println_pad!("   {}", "This mod never touches the path".dimmed());
        }
        for file in &candidates {
            println_pad!("   {} {}", "•".bright_cyan(), file);
        }

        match resolve_path(&path, &settings, descriptor) {
            Some(Redirect::File(file)) => println_pad!(
                "   {} {}",
                "➡️  With current settings:".bright_green(),
                descriptor.full_path(&file)
            ),
            Some(Redirect::Removed) => println_pad!(
                "   {} {}",
                "⛔ With current settings:".bright_red(),
                "removed"
            ),
            None => println_pad!("   {}", "Not affected with current settings".dimmed()),
        }
    }

    Ok(())
}
