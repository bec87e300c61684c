// Unit tests for the scratch directory

use std::fs;

use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_clear_removes_all_files() {
    let dir = tempfile::tempdir().unwrap();
    let workdir = Workdir::new(dir.path().to_path_buf()).unwrap();

    fs::write(dir.path().join("home_page_20240101_000000.png"), b"png").unwrap();
    fs::write(dir.path().join("match_home.png"), b"png").unwrap();
    workdir.clear();

    let remaining: Vec<_> = fs::read_dir(dir.path()).unwrap().flatten().collect();
    assert!(remaining.is_empty(), "files survived clear: {remaining:?}");
}

#[test]
fn test_clear_leaves_subdirectories_alone() {
    let dir = tempfile::tempdir().unwrap();
    let workdir = Workdir::new(dir.path().to_path_buf()).unwrap();

    fs::create_dir(dir.path().join("nested")).unwrap();
    fs::write(dir.path().join("capture.png"), b"png").unwrap();
    workdir.clear();

    assert!(dir.path().join("nested").is_dir());
    assert!(!dir.path().join("capture.png").exists());
}

#[test]
fn test_clear_on_empty_directory_is_noop() {
    let dir = tempfile::tempdir().unwrap();
    let workdir = Workdir::new(dir.path().to_path_buf()).unwrap();
    workdir.clear();
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_timestamped_name_format() {
    let dir = tempfile::tempdir().unwrap();
    let workdir = Workdir::new(dir.path().to_path_buf()).unwrap();

    let path = workdir.timestamped("home_page");
    let name = path.file_name().unwrap().to_str().unwrap();

    assert_eq!(path.parent().unwrap(), dir.path());
    assert!(name.starts_with("home_page_"), "unexpected name {name}");
    assert!(name.ends_with(".png"), "unexpected name {name}");
    // stem + '_' + YYYYMMDD_HHMMSS + .png
    assert_eq!(name.len(), "home_page_".len() + 15 + ".png".len());
}

#[test]
fn test_save_writes_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let workdir = Workdir::new(dir.path().to_path_buf()).unwrap();

    let path = workdir.save("after_click", b"fake png bytes").unwrap();
    assert_eq!(fs::read(&path).unwrap(), b"fake png bytes");
}

#[test]
fn test_new_creates_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("tmp");
    let workdir = Workdir::new(target.clone()).unwrap();
    assert!(target.is_dir());
    assert_eq!(workdir.path(), target);
}
