use camino::{Utf8Path, Utf8PathBuf};
use ltk_collections::{Error, ModManager, ResolveSource, DEFAULT_COLLECTION};
use ltk_mod_core::{GamePath, Redirect, RealPath};
use std::fs;
use tempfile::TempDir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct Fixture {
    _dir: TempDir,
    mods: Utf8PathBuf,
    data: Utf8PathBuf,
}

impl Fixture {
    fn new() -> Self {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap().to_path_buf();
        let mods = root.join("mods");
        fs::create_dir_all(&mods).unwrap();
        Self {
            _dir: dir,
            data: root.join("data"),
            mods,
        }
    }

    fn write_mod(&self, dir: &str, config: &str, files: &[&str]) {
        let mod_dir = self.mods.join(dir);
        fs::create_dir_all(&mod_dir).unwrap();
        fs::write(mod_dir.join("mod.config.json"), config).unwrap();
        for file in files {
            let path = mod_dir.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, file.as_bytes()).unwrap();
        }
    }

    fn open(&self) -> ModManager {
        ModManager::open(&self.mods, &self.data).unwrap()
    }

    fn real(&self, dir: &str, file: &str) -> Option<Redirect> {
        Some(Redirect::File(RealPath::new(self.mods.join(dir).join(file))))
    }
}

const CRIMSON: &str = r#"{
    "name": "crimson",
    "display_name": "Crimson",
    "option_groups": [
        {
            "name": "Variant",
            "selection": "single",
            "options": [
                { "name": "Plain" },
                { "name": "Blue", "files": { "hero/skin.tex": "options/blue/skin.tex" } }
            ]
        }
    ]
}"#;

const AZURE: &str = r#"{ "name": "azure", "display_name": "Azure" }"#;

fn standard() -> Fixture {
    let fixture = Fixture::new();
    fixture.write_mod(
        "crimson",
        CRIMSON,
        &["content/hero/skin.tex", "content/hero/icon.tex", "options/blue/skin.tex"],
    );
    fixture.write_mod("azure", AZURE, &["content/hero/icon.tex"]);
    fixture
}

#[test]
fn discovery_and_resolution() {
    let fixture = standard();
    let mut manager = fixture.open();
    let report = manager.discover_mods().unwrap();
    assert_eq!(report.loaded, vec!["azure", "crimson"]);

    manager.set_enabled(None, "crimson", true).unwrap();
    manager.set_enabled(None, "azure", true).unwrap();
    manager.set_priority(None, "crimson", 1).unwrap();

    let icon = GamePath::new("HERO/icon.tex");
    assert_eq!(
        manager.resolve(&icon, None),
        fixture.real("crimson", "content/hero/icon.tex")
    );

    // Plain claims the skin without supplying a file
    let skin = GamePath::new("hero/skin.tex");
    assert_eq!(manager.resolve(&skin, None), Some(Redirect::Removed));

    manager
        .set_selection(None, "crimson", "Variant", 1)
        .unwrap();
    assert_eq!(
        manager.resolver().resolve(&skin, None),
        fixture.real("crimson", "options/blue/skin.tex")
    );

    let conflicts = manager.conflicts(None).unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].path, icon);
    assert_eq!(conflicts[0].winner, "crimson");

    assert_eq!(manager.resolve(&GamePath::new("hero/unknown.tex"), None), None);
}

#[test]
fn state_survives_reopen() {
    let fixture = standard();
    {
        let mut manager = fixture.open();
        manager.discover_mods().unwrap();
        manager.add_collection("Hero Only", None).unwrap();
        manager
            .set_enabled(Some("Hero Only"), "azure", true)
            .unwrap();
        manager
            .set_character_collection("Hero", Some("Hero Only"))
            .unwrap();
        manager
            .file_system_mut()
            .move_mod_to_path("azure", "Skins/Blue/Azure")
            .unwrap();
    }

    let mut manager = fixture.open();
    manager.discover_mods().unwrap();

    assert_eq!(
        manager.collections().character_collection("Hero"),
        Some("Hero Only")
    );
    assert_eq!(
        manager.file_system().tree().full_path("azure").as_deref(),
        Some("Skins/Blue/Azure")
    );

    let icon = GamePath::new("hero/icon.tex");
    let (source, entry) = manager.resolve_entry(&icon, Some("Hero")).unwrap();
    assert_eq!(source, ResolveSource::Character);
    assert_eq!(entry.mod_identity, "azure");
    assert_eq!(manager.resolve(&icon, Some("Someone")), None);
}

#[test]
fn reload_picks_up_changes_and_failures() {
    let fixture = standard();
    let mut manager = fixture.open();
    manager.discover_mods().unwrap();
    manager.set_enabled(None, "azure", true).unwrap();

    assert!(!manager.reload_mod("azure").unwrap());

    fixture.write_mod("azure", AZURE, &["content/hero/extra.tex"]);
    assert!(manager.reload_mod("azure").unwrap());
    assert!(manager
        .resolve(&GamePath::new("hero/extra.tex"), None)
        .is_some());

    fs::write(fixture.mods.join("azure/mod.config.json"), "{ broken").unwrap();
    assert!(matches!(manager.reload_mod("azure"), Err(Error::Project(_))));
    assert!(manager.descriptor("azure").is_none());
    assert_eq!(manager.resolve(&GamePath::new("hero/icon.tex"), None), None);
}

#[test]
fn broken_mod_does_not_abort_discovery() {
    let fixture = standard();
    fixture.write_mod("broken", "{ nope", &[]);

    let mut manager = fixture.open();
    let report = manager.discover_mods().unwrap();

    assert_eq!(report.loaded, vec!["azure", "crimson"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "broken");
}

#[test]
fn removing_collections_updates_roles_on_disk() {
    let fixture = standard();
    let mut manager = fixture.open();
    manager.discover_mods().unwrap();

    manager.add_collection("Temp", Some(DEFAULT_COLLECTION)).unwrap();
    manager.set_current("Temp").unwrap();
    manager.set_forced(Some("Temp")).unwrap();
    manager.remove_collection("Temp").unwrap();

    assert!(matches!(
        manager.remove_collection(DEFAULT_COLLECTION),
        Err(Error::CannotDeleteDefault)
    ));

    let reopened = fixture.open();
    assert_eq!(reopened.collections().current_name(), DEFAULT_COLLECTION);
    assert_eq!(reopened.collections().forced_name(), None);
    assert!(reopened.collections().collection("Temp").is_none());
}
