//! Frame discovery: `<unix_millis>.png` files under a directory, oldest first.

use std::path::Path;

use deltacast_core::FrameFile;
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::warn;
use walkdir::WalkDir;

fn build_set(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut b = GlobSetBuilder::new();
    for pat in patterns {
        b.add(Glob::new(pat)?);
    }
    Ok(Some(b.build()?))
}

fn should_skip(p: &Path, include: Option<&GlobSet>, exclude: Option<&GlobSet>) -> bool {
    let s = p.to_string_lossy().replace('\\', "/");
    if exclude.is_some_and(|ex| ex.is_match(&s)) {
        return true;
    }
    include.is_some_and(|inc| !inc.is_match(&s))
}

fn is_png(p: &Path) -> bool {
    p.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("png"))
}

/// Timestamp encoded in the file stem, if it is a plain integer.
pub fn parse_timestamp(p: &Path) -> Option<u64> {
    p.file_stem()?.to_str()?.parse().ok()
}

/// Collect frame files under `path` (or `path` itself), sorted by timestamp.
///
/// PNG files whose stem is not an integer are skipped with a warning.
pub fn gather_frames(
    path: &Path,
    include: &[String],
    exclude: &[String],
) -> anyhow::Result<Vec<FrameFile>> {
    let inc_set = build_set(include)?;
    let exc_set = build_set(exclude)?;
    let mut list: Vec<FrameFile> = Vec::new();
    let mut consider = |p: &Path| {
        if should_skip(p, inc_set.as_ref(), exc_set.as_ref()) || !is_png(p) {
            return;
        }
        match parse_timestamp(p) {
            Some(ts) => list.push(FrameFile::new(p, ts)),
            None => warn!(path = %p.display(), "skip frame: file name is not a timestamp"),
        }
    };
    if path.is_file() {
        consider(path);
    } else {
        for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_file() {
                consider(entry.path());
            }
        }
    }
    list.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.path.cmp(&b.path)));
    Ok(list)
}
