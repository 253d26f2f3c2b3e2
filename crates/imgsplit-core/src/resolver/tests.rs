//! Tests for input resolution and directory expansion

use super::*;
use std::collections::BTreeSet;
use tempfile::{tempdir, TempDir};

fn config_with(root: &Path, extensions: &[&str], recursive: bool) -> Config {
    Config {
        allowed_extensions: extensions.iter().map(|e| e.to_string()).collect::<BTreeSet<_>>(),
        output_location: root.join("default_out"),
        recursive,
        ..Config::default()
    }
}

fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"").unwrap();
}

fn token(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn file_names(items: &[WorkItem]) -> Vec<String> {
    items
        .iter()
        .map(|item| {
            item.source_file
                .file_name()
                .unwrap()
                .to_string_lossy()
                .into_owned()
        })
        .collect()
}

/// photos/{a.png, b.txt, c.jpg, sub/d.png}
fn photo_tree() -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let photos = dir.path().join("photos");
    touch(&photos.join("a.png"));
    touch(&photos.join("b.txt"));
    touch(&photos.join("c.jpg"));
    touch(&photos.join("sub/d.png"));
    (dir, photos)
}

// ========================================================================
// Output Directory Selection Tests
// ========================================================================

#[test]
fn test_output_dir_first_convention() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out");
    fs::create_dir(&out).unwrap();
    let file_a = dir.path().join("fileA.png");
    let file_b = dir.path().join("fileB.png");
    touch(&file_a);
    touch(&file_b);

    let config = config_with(dir.path(), &["png"], false);
    let resolution = PathResolver::new(&config)
        .resolve(&[token(&out), token(&file_a), token(&file_b)], None)
        .unwrap();

    assert_eq!(resolution.output_dir, out);
    assert_eq!(file_names(&resolution.work_items), vec!["fileA.png", "fileB.png"]);
    assert!(resolution.work_items.iter().all(|item| item.output_dir == out));
    assert!(resolution.unresolved.is_empty());
}

#[test]
fn test_explicit_output_takes_precedence() {
    let (dir, photos) = photo_tree();
    let explicit = dir.path().join("explicit");
    let extra = dir.path().join("extra.png");
    touch(&extra);

    let config = config_with(dir.path(), &["png", "jpg"], false);
    let resolution = PathResolver::new(&config)
        .resolve(&[token(&photos), token(&extra)], Some(&explicit))
        .unwrap();

    // The leading directory is an input, not the destination
    assert_eq!(resolution.output_dir, explicit);
    assert!(explicit.is_dir());
    assert_eq!(
        file_names(&resolution.work_items),
        vec!["a.png", "c.jpg", "extra.png"]
    );
}

#[test]
fn test_lone_directory_is_an_input() {
    let (dir, photos) = photo_tree();
    let config = config_with(dir.path(), &["png", "jpg"], false);

    let resolution = PathResolver::new(&config)
        .resolve(&[token(&photos)], None)
        .unwrap();

    assert_eq!(resolution.output_dir, dir.path().join("default_out"));
    assert!(resolution.output_dir.is_dir());
    assert_eq!(file_names(&resolution.work_items), vec!["a.png", "c.jpg"]);
}

#[test]
fn test_output_path_that_is_a_file_is_fatal() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("not_a_dir");
    touch(&blocker);
    let config = config_with(dir.path(), &["png"], false);

    let err = PathResolver::new(&config)
        .resolve(&["whatever.png".to_string()], Some(&blocker))
        .unwrap_err();
    assert!(matches!(err, ResolutionError::NotADirectory(_)));
}

#[test]
fn test_uncreatable_output_dir_is_fatal() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("file");
    touch(&blocker);
    let config = config_with(dir.path(), &["png"], false);

    let err = PathResolver::new(&config)
        .resolve(&["x.png".to_string()], Some(&blocker.join("child")))
        .unwrap_err();
    assert!(matches!(err, ResolutionError::CreateDir { .. }));
}

#[test]
fn test_no_tokens() {
    let config = Config::default();
    let err = PathResolver::new(&config).resolve(&[], None).unwrap_err();
    assert!(matches!(err, ResolutionError::NoInputs));
}

// ========================================================================
// Expansion Tests
// ========================================================================

#[test]
fn test_extension_filtering() {
    let (dir, photos) = photo_tree();
    let config = config_with(dir.path(), &["png", "jpg"], false);

    let resolution = PathResolver::new(&config)
        .resolve(&[token(&photos)], Some(&dir.path().join("out")))
        .unwrap();

    assert_eq!(file_names(&resolution.work_items), vec!["a.png", "c.jpg"]);
}

#[test]
fn test_recursive_policy() {
    let (dir, photos) = photo_tree();
    let out = dir.path().join("out");

    let flat = config_with(dir.path(), &["png", "jpg"], false);
    let resolution = PathResolver::new(&flat)
        .resolve(&[token(&photos)], Some(&out))
        .unwrap();
    assert!(!file_names(&resolution.work_items).contains(&"d.png".to_string()));

    let deep = config_with(dir.path(), &["png", "jpg"], true);
    let resolution = PathResolver::new(&deep)
        .resolve(&[token(&photos)], Some(&out))
        .unwrap();
    assert_eq!(
        file_names(&resolution.work_items),
        vec!["a.png", "c.jpg", "d.png"]
    );
    assert_eq!(resolution.work_items[2].source_file, photos.join("sub/d.png"));
}

#[test]
fn test_traversal_is_lexicographic_by_path() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("root");
    for name in ["z.png", "b/y.png", "a.png", "b/a/x.png", "c.png"] {
        touch(&root.join(name));
    }
    let config = config_with(dir.path(), &["png"], true);

    let found: Vec<PathBuf> = Candidates::new(&root, &config).iter().collect();
    let mut sorted = found.clone();
    sorted.sort();

    assert_eq!(found.len(), 5);
    assert_eq!(found, sorted);
}

#[test]
fn test_traversal_orders_by_component_not_string() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("root");
    touch(&root.join("b.png"));
    touch(&root.join("b").join("x.png"));
    let config = config_with(dir.path(), &["png"], true);

    let found: Vec<PathBuf> = Candidates::new(&root, &config).iter().collect();

    // "b" sorts before "b.png", so the directory's contents come first
    assert_eq!(found, vec![root.join("b").join("x.png"), root.join("b.png")]);
}

#[test]
fn test_candidates_are_restartable() {
    let (dir, photos) = photo_tree();
    let config = config_with(dir.path(), &["png", "jpg"], false);
    let candidates = Candidates::new(&photos, &config).recursive(true);

    let first: Vec<PathBuf> = candidates.iter().collect();
    let second: Vec<PathBuf> = (&candidates).into_iter().collect();
    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
}

#[test]
fn test_extension_match_ignores_case() {
    let dir = tempdir().unwrap();
    let upper = dir.path().join("SHOUT.PNG");
    touch(&upper);
    let config = config_with(dir.path(), &["png"], false);

    let resolution = PathResolver::new(&config)
        .resolve(&[token(&upper)], Some(&dir.path().join("out")))
        .unwrap();
    assert_eq!(file_names(&resolution.work_items), vec!["SHOUT.PNG"]);
}

#[test]
fn test_disallowed_file_token_is_filtered_not_unresolved() {
    let dir = tempdir().unwrap();
    let notes = dir.path().join("notes.txt");
    touch(&notes);
    let config = config_with(dir.path(), &["png"], false);

    let resolution = PathResolver::new(&config)
        .resolve(&[token(&notes)], Some(&dir.path().join("out")))
        .unwrap();
    assert!(resolution.work_items.is_empty());
    assert!(resolution.unresolved.is_empty());
}

#[test]
fn test_duplicates_keep_first_occurrence() {
    let (dir, photos) = photo_tree();
    let config = config_with(dir.path(), &["png", "jpg"], false);
    let dotted = photos.join(".").join("a.png");

    let resolution = PathResolver::new(&config)
        .resolve(
            &[token(&photos.join("c.jpg")), token(&photos), token(&dotted)],
            Some(&dir.path().join("out")),
        )
        .unwrap();

    assert_eq!(file_names(&resolution.work_items), vec!["c.jpg", "a.png"]);
    assert_eq!(resolution.work_items[0].source_file, photos.join("c.jpg"));
}

#[test]
fn test_missing_paths_are_reported_and_skipped() {
    let (dir, photos) = photo_tree();
    let config = config_with(dir.path(), &["png", "jpg"], false);
    let missing = dir.path().join("nope.png");

    let resolution = PathResolver::new(&config)
        .resolve(
            &[token(&missing), token(&photos.join("a.png"))],
            Some(&dir.path().join("out")),
        )
        .unwrap();

    assert_eq!(file_names(&resolution.work_items), vec!["a.png"]);
    assert_eq!(resolution.unresolved.len(), 1);
    assert_eq!(resolution.unresolved[0].token, token(&missing));
}

#[cfg(not(feature = "net"))]
#[test]
fn test_remote_token_without_net_is_unresolved() {
    let dir = tempdir().unwrap();
    let config = config_with(dir.path(), &["png"], false);

    let resolution = PathResolver::new(&config)
        .resolve(
            &["https://example.com/grid.png".to_string()],
            Some(&dir.path().join("out")),
        )
        .unwrap();

    assert!(resolution.work_items.is_empty());
    assert_eq!(resolution.unresolved.len(), 1);
    assert!(resolution.unresolved[0].reason.contains("net"));
}

#[cfg(unix)]
#[test]
fn test_output_dir_check_agrees_with_a_real_write() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let locked = dir.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

    // Privileged users may still write here; the check must follow the
    // filesystem, not the mode bits.
    let can_write = fs::write(locked.join("canary.tmp"), b"x").is_ok();
    let _ = fs::remove_file(locked.join("canary.tmp"));

    let result = ensure_output_dir(&locked);
    assert_eq!(result.is_ok(), can_write, "{result:?}");
    if !can_write {
        assert!(matches!(result, Err(ResolutionError::ReadOnly { .. })));
    }

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
}

#[cfg(target_os = "linux")]
#[test]
fn test_unwritable_existing_dir_is_fatal() {
    // procfs refuses new files for every user, root included
    let proc_dir = Path::new("/proc/self");
    if !proc_dir.is_dir() {
        return;
    }

    let err = ensure_output_dir(proc_dir).unwrap_err();
    assert!(matches!(err, ResolutionError::ReadOnly { .. }), "{err:?}");
}

#[test]
fn test_writable_check_leaves_no_files_behind() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out");

    ensure_output_dir(&out).unwrap();
    ensure_output_dir(&out).unwrap();

    assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
}
