//! Integration Tests for the Executable Locator
//!
//! Real directory trees in a temp dir. Base directories sit deep enough
//! that the walk never climbs out of the temp dir.

#[path = "../test_utils/mod.rs"]
mod test_utils;

use engine_console::{ExecutableLocator, LocatorConfig};
use tempfile::TempDir;
use test_utils::{deep_dir, engine_name, touch};

#[test]
fn test_finds_release_build_three_levels_up() {
    let temp = TempDir::new().unwrap();
    let base = deep_dir(temp.path(), 6);
    let level3 = base.parent().unwrap().parent().unwrap();
    let engine = level3.join("Release").join(engine_name());
    touch(&engine);

    let found = ExecutableLocator::default().locate_from(&base);
    assert_eq!(found, Some(engine));
}

#[test]
fn test_nothing_within_five_levels() {
    let temp = TempDir::new().unwrap();
    let base = deep_dir(temp.path(), 6);
    // l1 is the sixth level counting the base; it is never searched
    touch(&temp.path().join("l1").join("Release").join(engine_name()));

    assert_eq!(ExecutableLocator::default().locate_from(&base), None);
}

#[test]
fn test_sub_paths_beat_recursive_search() {
    let temp = TempDir::new().unwrap();
    let base = deep_dir(temp.path(), 6);
    touch(&base.join("nested").join("deeper").join(engine_name()));
    let conventional = base.join("Db engine").join("Release").join(engine_name());
    touch(&conventional);

    assert_eq!(
        ExecutableLocator::default().locate_from(&base),
        Some(conventional)
    );
}

#[test]
fn test_closer_level_wins() {
    let temp = TempDir::new().unwrap();
    let base = deep_dir(temp.path(), 6);
    let near = base.parent().unwrap().join("Debug").join(engine_name());
    let far = base
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("Debug")
        .join(engine_name());
    touch(&near);
    touch(&far);

    assert_eq!(ExecutableLocator::default().locate_from(&base), Some(near));
}

#[test]
fn test_sibling_tree_found_recursively() {
    let temp = TempDir::new().unwrap();
    let base = deep_dir(temp.path(), 6);
    let sibling = base
        .parent()
        .unwrap()
        .join("tools")
        .join("x64")
        .join(engine_name());
    touch(&sibling);

    assert_eq!(ExecutableLocator::default().locate_from(&base), Some(sibling));
}

#[test]
fn test_custom_names_and_depth() {
    let temp = TempDir::new().unwrap();
    let base = deep_dir(temp.path(), 6);
    let engine = base.parent().unwrap().join("bin").join("dbd");
    touch(&engine);

    let config = LocatorConfig {
        file_names: vec!["dbd".to_string()],
        sub_dirs: vec!["bin".into()],
        max_parent_levels: 2,
        base_dir: Some(base.clone()),
    };
    let locator = ExecutableLocator::new(config.clone());
    assert_eq!(locator.locate(), Some(engine));

    let shallow = ExecutableLocator::new(LocatorConfig {
        max_parent_levels: 1,
        ..config
    });
    assert_eq!(shallow.locate(), None);
}

#[cfg(unix)]
#[test]
fn test_unreadable_directories_do_not_stop_the_walk() {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let base = deep_dir(temp.path(), 6);
    let level3 = base.parent().unwrap().parent().unwrap();
    let engine = level3.join("Release").join(engine_name());
    touch(&engine);

    // One locked directory on a conventional sub-path, one inside the
    // recursively searched tree
    let locked = [base.join("Debug"), base.join("nested").join("locked")];
    for dir in &locked {
        fs::create_dir_all(dir).unwrap();
        fs::set_permissions(dir, fs::Permissions::from_mode(0o000)).unwrap();
    }

    // Permission bits do not apply to root
    let enforced = fs::read_dir(&locked[1]).is_err();

    let found = ExecutableLocator::default().locate_from(&base);

    for dir in &locked {
        fs::set_permissions(dir, fs::Permissions::from_mode(0o755)).unwrap();
    }
    if !enforced {
        eprintln!("skipping: directory permissions are not enforced for this user");
        return;
    }
    assert_eq!(found, Some(engine));
}
