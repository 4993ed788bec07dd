use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::CommandTemplate;
use crate::types::{ApplicationCollection, ApplicationEntry};

// Core/business logic: reading catalog files, resolving icons and launching
// installed applications.

/// Returned by `resolve_icon_url` when no icon file can be found.
pub const PLACEHOLDER_ICON: &str = "icon://application-x-executable";

const ICON_EXTENSIONS: [&str; 3] = ["png", "svg", "xpm"];

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    components: Vec<ApplicationEntry>,
}

/// Collect `*.json` catalog files below the given directories, sorted.
///
/// Directories that do not exist are skipped; one that exists but cannot be
/// read is an error.
pub fn catalog_files(dirs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut res = Vec::new();
    for dir in dirs {
        if !dir.is_dir() {
            debug!("catalog dir {:?} missing, skipping", dir);
            continue;
        }
        for ent in WalkDir::new(dir).max_depth(2).min_depth(1) {
            let ent = ent.with_context(|| format!("Read catalog directory {:?}", dir))?;
            let p = ent.path();
            if ent.file_type().is_file() && p.extension().and_then(|s| s.to_str()) == Some("json") {
                res.push(p.to_path_buf());
            }
        }
    }
    res.sort();
    res.dedup();
    Ok(res)
}

/// Parse one catalog file into entries, deriving `installed` from whether
/// the entry's owned file exists.
pub fn read_catalog_file(path: &Path) -> Result<Vec<ApplicationEntry>> {
    let text = fs::read_to_string(path).with_context(|| format!("Read catalog {:?}", path))?;
    let catalog: CatalogFile =
        serde_json::from_str(&text).with_context(|| format!("Parse catalog {:?}", path))?;
    Ok(catalog
        .components
        .into_iter()
        .map(|mut e| {
            e.installed = e.file.exists();
            e
        })
        .collect())
}

/// Load every catalog file found in `dirs` into a fresh collection.
///
/// Files that fail to parse are skipped and the collection is marked ready;
/// an unreadable catalog directory fails the whole load.
pub fn load_catalog(dirs: &[PathBuf]) -> Result<ApplicationCollection> {
    let mut collection = ApplicationCollection::default();
    for file in catalog_files(dirs)? {
        match read_catalog_file(&file) {
            Ok(entries) => {
                for entry in entries {
                    let id = entry.id.clone();
                    if collection.insert(entry) {
                        warn!(id = %id, file = ?file, "duplicate catalog entry replaced");
                    }
                }
                collection.origin_files.push(file);
            }
            Err(e) => warn!("skipping catalog file: {e:#}"),
        }
    }
    collection.ready = true;
    info!(
        entries = collection.len(),
        files = collection.origin_files.len(),
        "catalog loaded"
    );
    Ok(collection)
}

/// Resolve an icon reference to a `file://` URL, or `PLACEHOLDER_ICON`.
///
/// Absolute paths are used as-is when they exist; bare names are looked up
/// in `icon_dirs` with the usual image extensions.
pub fn resolve_icon_url(icon: Option<&str>, icon_dirs: &[PathBuf]) -> String {
    let Some(icon) = icon.filter(|s| !s.is_empty()) else {
        return PLACEHOLDER_ICON.to_string();
    };
    let as_path = Path::new(icon);
    if as_path.is_absolute() {
        if as_path.exists() {
            return format!("file://{}", as_path.display());
        }
        return PLACEHOLDER_ICON.to_string();
    }
    for dir in icon_dirs {
        for ext in ICON_EXTENSIONS {
            let candidate = dir.join(format!("{icon}.{ext}"));
            if candidate.is_file() {
                return format!("file://{}", candidate.display());
            }
        }
    }
    PLACEHOLDER_ICON.to_string()
}

/// Start an installed application detached from this process.
pub fn launch_application(template: &CommandTemplate, target: &str) -> Result<()> {
    let argv = template.render(&[target]);
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| anyhow::anyhow!("No launch command configured"))?;
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("Failed to run {program}"))?;
    info!(target = target, "launched application");
    Ok(())
}
