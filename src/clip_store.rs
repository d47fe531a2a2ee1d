// src/clip_store.rs

use crate::error::Result;
use log::warn;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const CLIP_EXTENSIONS: &[&str] = &["wav"];

/// A stored clip on disk. The file is only opened when the clip is played or mixed.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct ClipRef {
    pub name: String,
    pub path: PathBuf,
}

impl ClipRef {
    pub fn new(path: PathBuf) -> Option<Self> {
        let name = path.file_stem()?.to_string_lossy().to_string();
        Some(Self { name, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub fn is_clip_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |ext| {
            CLIP_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Lists the clips directly inside `dir`, creating the directory first if needed.
/// Order follows the filesystem and is not sorted.
pub fn list_clips(dir: &Path) -> Result<Vec<ClipRef>> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }

    let mut clips = Vec::new();
    for entry in WalkDir::new(dir)
        .follow_links(true)
        .min_depth(1)
        .max_depth(1)
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        if entry.file_type().is_file() && is_clip_file(entry.path()) {
            if let Some(clip) = ClipRef::new(entry.path().to_path_buf()) {
                clips.push(clip);
            }
        }
    }
    Ok(clips)
}
