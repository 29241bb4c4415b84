/*!
 * Tests for file utility functions
 */

use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use chrono::{Local, TimeZone};
use subvoice::file_utils::FileManager;

use crate::common;

#[test]
fn test_file_exists_withFileAndDirectory_shouldOnlyAcceptFiles() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let file = common::create_test_file(temp_dir.path(), "a.srt", "x")?;

    assert!(FileManager::file_exists(&file));
    assert!(!FileManager::file_exists(temp_dir.path()));
    assert!(!FileManager::file_exists(temp_dir.path().join("missing.srt")));
    Ok(())
}

#[test]
fn test_ensure_dir_withNestedPath_shouldCreateParents() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("a").join("b");

    FileManager::ensure_dir(&nested)?;
    FileManager::ensure_dir(&nested)?;

    assert!(nested.is_dir());
    Ok(())
}

#[test]
fn test_generate_output_path_shouldUseStemAndTimestamp() {
    let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();

    let path = FileManager::generate_output_path("/scripts/episode.1.srt", at, "wav");
    assert_eq!(path, PathBuf::from("/scripts/episode.1_2024-03-09-14-05-07.wav"));

    let bare = FileManager::generate_output_path("scene.vtt", at, "wav");
    assert_eq!(bare, PathBuf::from("scene_2024-03-09-14-05-07.wav"));
}

#[test]
fn test_write_atomic_shouldReplaceContentAndLeaveNoTempFiles() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("clip.bin");

    FileManager::write_atomic(&path, b"first")?;
    FileManager::write_atomic(&path, b"second")?;

    assert_eq!(fs::read(&path)?, b"second");
    assert_eq!(fs::read_dir(temp_dir.path())?.count(), 1);
    Ok(())
}
