//! Tests for the application index

use super::*;
use proptest::prelude::*;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

fn write_cache(dir: &Path, lines: &[&str]) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(MIME_CACHE_FILE);
    let mut content = String::from("[MIME Cache]\n");
    for line in lines {
        content.push_str(line);
        content.push('\n');
    }
    std::fs::write(&path, content).unwrap();
    path
}

fn write_defaults(dir: &Path, lines: &[&str]) {
    std::fs::create_dir_all(dir).unwrap();
    let mut content = String::from("[Default Applications]\n");
    for line in lines {
        content.push_str(line);
        content.push('\n');
    }
    std::fs::write(dir.join(DEFAULTS_FILE), content).unwrap();
}

fn set_mtime(path: &Path, secs: u64) {
    let file = std::fs::File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
        .unwrap();
}

/// Index over `<root>/user` and `<root>/system`
fn create_index(root: &Path, interval: Duration) -> AppIndex {
    let user = root.join("user");
    let system = root.join("system");
    AppIndex::new(
        MimeInfoCache::new(&[user.clone(), system.clone()], interval),
        DefaultsStore::new(user.join(DEFAULTS_FILE), vec![system.join(DEFAULTS_FILE)]),
    )
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// Registry parsing
// ============================================================================

#[test]
fn test_parse_section() {
    let content = "\
# comment
[Other]
image/png=wrong.desktop
[MIME Cache]
image/png=viewer.desktop;editor.desktop;
text/plain = notes.desktop ; ;
image/png=later.desktop
garbage line
";
    let parsed = parse_section(content, MIME_CACHE_SECTION);
    assert_eq!(
        parsed,
        vec![
            ("image/png".to_string(), strings(&["viewer", "editor"])),
            ("text/plain".to_string(), strings(&["notes"])),
        ]
    );
}

// ============================================================================
// Registry cache
// ============================================================================

#[test]
fn test_cache_merges_directories_in_priority_order() {
    let temp_dir = TempDir::new().unwrap();
    write_cache(&temp_dir.path().join("user"), &["image/png=mine.desktop;viewer.desktop;"]);
    write_cache(
        &temp_dir.path().join("system"),
        &["image/png=viewer.desktop;gallery.desktop;", "text/plain=notes.desktop;"],
    );

    let mut cache = MimeInfoCache::new(
        &[temp_dir.path().join("user"), temp_dir.path().join("system")],
        Duration::ZERO,
    );
    cache.refresh();

    assert_eq!(cache.apps("image/png"), strings(&["mine", "viewer", "gallery"]).as_slice());
    assert_eq!(cache.apps("text/plain"), strings(&["notes"]).as_slice());
    assert!(cache.apps("audio/ogg").is_empty());
}

#[test]
fn test_cache_respects_refresh_interval() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("apps");
    let path = write_cache(&dir, &["image/png=old.desktop;"]);
    set_mtime(&path, 1_000);

    let mut cache = MimeInfoCache::new(&[dir.clone()], Duration::from_secs(3600));
    assert!(cache.refresh());
    assert_eq!(cache.apps("image/png"), strings(&["old"]).as_slice());

    write_cache(&dir, &["image/png=new.desktop;"]);
    set_mtime(&path, 2_000);

    // Within the window the snapshot is reused
    assert!(!cache.refresh());
    assert_eq!(cache.apps("image/png"), strings(&["old"]).as_slice());

    cache.rescan();
    assert_eq!(cache.apps("image/png"), strings(&["new"]).as_slice());
}

#[test]
fn test_cache_reparses_only_on_mtime_change() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("apps");
    let path = write_cache(&dir, &["image/png=old.desktop;"]);
    set_mtime(&path, 1_000);

    let mut cache = MimeInfoCache::new(&[dir.clone()], Duration::ZERO);
    cache.refresh();

    // Same modification time: the content change goes unnoticed
    write_cache(&dir, &["image/png=new.desktop;"]);
    set_mtime(&path, 1_000);
    cache.refresh();
    assert_eq!(cache.apps("image/png"), strings(&["old"]).as_slice());

    set_mtime(&path, 1_001);
    cache.refresh();
    assert_eq!(cache.apps("image/png"), strings(&["new"]).as_slice());
}

#[test]
fn test_cache_missing_files_are_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let mut cache = MimeInfoCache::new(&[temp_dir.path().join("nowhere")], Duration::ZERO);
    cache.refresh();
    assert!(cache.apps("image/png").is_empty());
    assert!(cache.apps("text/plain").is_empty());
}

// ============================================================================
// Application index
// ============================================================================

#[test]
fn test_apps_for_includes_generalization() {
    let temp_dir = TempDir::new().unwrap();
    write_cache(
        &temp_dir.path().join("system"),
        &["image/png=viewer.desktop;", "image/*=gallery.desktop;viewer.desktop;"],
    );

    let mut index = create_index(temp_dir.path(), Duration::ZERO);
    assert_eq!(index.apps_for("image/png"), strings(&["viewer", "gallery"]));
    assert_eq!(index.apps_for("image/jpeg"), strings(&["gallery", "viewer"]));
    assert!(index.apps_for("x-urischeme/http").is_empty());
}

#[test]
fn test_apps_for_promotes_default() {
    let temp_dir = TempDir::new().unwrap();
    write_cache(
        &temp_dir.path().join("system"),
        &["image/png=viewer.desktop;editor.desktop;gallery.desktop;"],
    );
    write_defaults(&temp_dir.path().join("system"), &["image/png=gallery.desktop"]);

    let mut index = create_index(temp_dir.path(), Duration::ZERO);
    assert_eq!(index.default_app_for("image/png").as_deref(), Some("gallery"));
    assert_eq!(
        index.apps_for("image/png"),
        strings(&["gallery", "viewer", "editor"])
    );
}

#[test]
fn test_default_falls_back_to_generalization() {
    let temp_dir = TempDir::new().unwrap();
    write_defaults(&temp_dir.path().join("system"), &["image/*=gallery.desktop;viewer.desktop;"]);

    let mut index = create_index(temp_dir.path(), Duration::ZERO);
    assert_eq!(index.default_app_for("image/png").as_deref(), Some("gallery"));
    assert_eq!(index.default_app_for("text/plain"), None);
    // The default is prepended even when the registry does not list it
    assert_eq!(index.apps_for("image/png"), strings(&["gallery"]));
}

#[test]
fn test_user_default_overrides_system() {
    let temp_dir = TempDir::new().unwrap();
    write_defaults(&temp_dir.path().join("system"), &["text/plain=notes.desktop"]);
    write_defaults(&temp_dir.path().join("user"), &["text/plain=editor.desktop"]);

    let mut index = create_index(temp_dir.path(), Duration::ZERO);
    assert_eq!(index.default_app_for("text/plain").as_deref(), Some("editor"));
}

#[test]
fn test_set_and_reset_default_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let mut index = create_index(temp_dir.path(), Duration::from_secs(60));

    assert_eq!(index.default_app_for("image/png"), None);

    index.set_default("image/png", "viewer.desktop").unwrap();
    assert_eq!(index.default_app_for("image/png").as_deref(), Some("viewer"));

    index.set_default("text/plain", "notes").unwrap();
    let written = std::fs::read_to_string(temp_dir.path().join("user").join(DEFAULTS_FILE)).unwrap();
    assert_eq!(
        written,
        "[Default Applications]\nimage/png=viewer.desktop\ntext/plain=notes.desktop\n"
    );
    assert!(!temp_dir.path().join("user/defaults.list.tmp").exists());

    index.reset_default("image/png").unwrap();
    assert_eq!(index.default_app_for("image/png"), None);
    assert_eq!(index.default_app_for("text/plain").as_deref(), Some("notes"));

    // Resetting again is harmless
    index.reset_default("image/png").unwrap();
}

#[test]
fn test_set_default_preserves_foreign_entries() {
    let temp_dir = TempDir::new().unwrap();
    let user = temp_dir.path().join("user");
    std::fs::create_dir_all(&user).unwrap();
    let original = "\
# managed by hand
[Default Applications]
text/html=a.desktop;b.desktop;
audio/ogg=player.desktop;other.desktop;

[Added Associations]
text/html=c.desktop;
";
    std::fs::write(user.join(DEFAULTS_FILE), original).unwrap();

    let mut index = create_index(temp_dir.path(), Duration::ZERO);
    index.set_default("text/plain", "notes").unwrap();

    let written = std::fs::read_to_string(user.join(DEFAULTS_FILE)).unwrap();
    assert_eq!(
        written,
        "\
# managed by hand
[Default Applications]
text/html=a.desktop;b.desktop;
audio/ogg=player.desktop;other.desktop;
text/plain=notes.desktop

[Added Associations]
text/html=c.desktop;
"
    );
    assert_eq!(index.default_app_for("audio/ogg").as_deref(), Some("player"));
    assert_eq!(index.default_app_for("text/plain").as_deref(), Some("notes"));

    index.set_default("audio/ogg", "other").unwrap();
    index.reset_default("text/plain").unwrap();
    let written = std::fs::read_to_string(user.join(DEFAULTS_FILE)).unwrap();
    assert_eq!(
        written,
        "\
# managed by hand
[Default Applications]
text/html=a.desktop;b.desktop;
audio/ogg=other.desktop

[Added Associations]
text/html=c.desktop;
"
    );
}

#[test]
fn test_set_default_appends_missing_section() {
    let temp_dir = TempDir::new().unwrap();
    let user = temp_dir.path().join("user");
    std::fs::create_dir_all(&user).unwrap();
    std::fs::write(user.join(DEFAULTS_FILE), "[Added Associations]\ntext/html=c.desktop;\n").unwrap();

    let mut index = create_index(temp_dir.path(), Duration::ZERO);
    index.set_default("x-maemo-highlight/email", "mail").unwrap();

    let written = std::fs::read_to_string(user.join(DEFAULTS_FILE)).unwrap();
    assert_eq!(
        written,
        "[Added Associations]\ntext/html=c.desktop;\n\n[Default Applications]\nx-maemo-highlight/email=mail.desktop\n"
    );
    assert_eq!(
        index.default_app_for("x-maemo-highlight/email").as_deref(),
        Some("mail")
    );
}

#[test]
fn test_set_default_validates_input() {
    let temp_dir = TempDir::new().unwrap();
    let mut index = create_index(temp_dir.path(), Duration::ZERO);

    assert!(matches!(
        index.set_default("nonsense", "viewer"),
        Err(MimeError::InvalidContentType(_))
    ));
    assert!(matches!(
        index.set_default("image/png", ".desktop"),
        Err(MimeError::InvalidAppId(_))
    ));
    assert!(matches!(
        index.reset_default("image/"),
        Err(MimeError::InvalidContentType(_))
    ));
}

// ============================================================================
// Detection
// ============================================================================

#[test]
fn test_extension_detection() {
    let temp_dir = TempDir::new().unwrap();
    let detector = ExtensionDetector;

    assert_eq!(
        detector.mime_for_path(temp_dir.path()).as_deref(),
        Some(DIRECTORY_MIME)
    );
    assert_eq!(
        detector.mime_for_path(Path::new("/tmp/Photo.JPG")).as_deref(),
        Some("image/jpeg")
    );
    assert_eq!(
        detector.mime_for_path(Path::new("/tmp/notes.txt")).as_deref(),
        Some("text/plain")
    );
    assert_eq!(
        detector.mime_for_path(Path::new("/tmp/blob")).as_deref(),
        Some(UNKNOWN_MIME)
    );
}

// ============================================================================
// Property-Based Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The default is first and no application appears twice
    #[test]
    fn prop_default_first_without_duplicates(
        apps in proptest::collection::vec("[a-e]", 0..8),
        default_index in 0usize..8,
    ) {
        let temp_dir = TempDir::new().unwrap();
        let line = format!(
            "image/png={}",
            apps.iter().map(|a| format!("{}.desktop;", a)).collect::<String>()
        );
        write_cache(&temp_dir.path().join("system"), &[line.as_str()]);

        let default = apps.get(default_index).cloned().unwrap_or_else(|| "z".to_string());
        write_defaults(
            &temp_dir.path().join("system"),
            &[format!("image/png={}.desktop", default).as_str()],
        );

        let mut index = create_index(temp_dir.path(), Duration::ZERO);
        let result = index.apps_for("image/png");

        prop_assert_eq!(result.first(), Some(&default));
        let mut unique = result.clone();
        unique.sort();
        unique.dedup();
        prop_assert_eq!(unique.len(), result.len());
        for app in &apps {
            prop_assert!(result.contains(app));
        }
    }
}
