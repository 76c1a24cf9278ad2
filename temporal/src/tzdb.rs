//! A lazy registry over a directory of TZif files (`/usr/share/zoneinfo`
//! style). Each zone's rules are parsed on first request and cached; no
//! file is opened until its identifier is first looked up.

use crate::tzif;
use crate::zone::ZoneRules;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("zone '{0}' is not present in this database")]
    NotFound(String),
    #[error("failed reading zone file for '{id}': {detail}")]
    Io { id: String, detail: String },
    #[error("failed parsing zone file for '{id}': {detail}")]
    Parse { id: String, detail: String },
}

enum State {
    Unloaded,
    Loaded(ZoneRules),
    Failed(String),
}

struct ZoneEntry {
    path: PathBuf,
    state: Mutex<State>,
}

/// A lazy, read-mostly registry over a zoneinfo directory tree. Safe to
/// share across threads: the per-entry mutex is only ever held while
/// populating the cache, never while reading it back.
pub struct TzDb {
    root: PathBuf,
    entries: HashMap<String, ZoneEntry>,
    version: Option<String>,
}

impl TzDb {
    /// Discovers zone identifiers under `root` (non-hidden files, no
    /// extension, containing at least one uppercase character, per the
    /// zoneinfo naming convention) without reading any of their contents.
    pub fn open(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let mut entries = HashMap::new();
        collect_zone_files(&root, &root, &mut entries)?;

        let version = fs::read_to_string(root.join("tzdata.zi"))
            .ok()
            .and_then(|s| s.lines().next().map(|l| l.to_string()))
            .or_else(|| fs::read_to_string(root.join("+VERSION")).ok().map(|s| s.trim().to_string()));

        Ok(TzDb { root, entries, version })
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn zone_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|s| s.as_str())
    }

    /// Fetches the zone rules for `id`, parsing the underlying file on the
    /// first request only. Subsequent calls observe the cached result
    /// without locking beyond the initial double-check.
    pub fn rules(&self, id: &str) -> Result<ZoneRules, Error> {
        let entry = self.entries.get(id).ok_or_else(|| Error::NotFound(id.to_string()))?;

        {
            let guard = entry.state.lock().unwrap();
            match &*guard {
                State::Loaded(rules) => return Ok(rules.clone()),
                State::Failed(detail) => {
                    return Err(Error::Parse { id: id.to_string(), detail: detail.clone() })
                }
                State::Unloaded => {}
            }
        }

        tracing::debug!(zone = id, path = %entry.path.display(), "loading zone file");
        let load_result = fs::read(&entry.path)
            .map_err(|e| Error::Io { id: id.to_string(), detail: e.to_string() })
            .and_then(|bytes| {
                let parsed = tzif::parse(&bytes)
                    .map_err(|e| Error::Parse { id: id.to_string(), detail: e.to_string() })?;
                ZoneRules::from_parsed(&parsed)
                    .map_err(|e| Error::Parse { id: id.to_string(), detail: e.to_string() })
            });

        let mut guard = entry.state.lock().unwrap();
        if let State::Unloaded = &*guard {
            match &load_result {
                Ok(rules) => *guard = State::Loaded(rules.clone()),
                Err(e) => *guard = State::Failed(e.to_string()),
            }
        }
        load_result
    }
}

fn collect_zone_files(root: &Path, dir: &Path, out: &mut HashMap<String, ZoneEntry>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();

        if name.starts_with('.') || name.starts_with('+') || name.ends_with(".tab") || name.ends_with(".zi") {
            continue;
        }
        if path.is_dir() {
            collect_zone_files(root, &path, out)?;
            continue;
        }
        if !name.chars().any(|c| c.is_ascii_uppercase()) {
            continue;
        }
        let id = path
            .strip_prefix(root)
            .unwrap()
            .to_string_lossy()
            .replace(std::path::MAIN_SEPARATOR, "/");
        out.insert(
            id,
            ZoneEntry {
                path,
                state: Mutex::new(State::Unloaded),
            },
        );
    }
    Ok(())
}

static DEFAULT: OnceLock<Option<TzDb>> = OnceLock::new();

/// The process-wide default zone database, lazily opened from the
/// conventional `/usr/share/zoneinfo` location. `None` if no zoneinfo
/// directory is present on this system.
pub fn default_tzdb() -> Option<&'static TzDb> {
    DEFAULT
        .get_or_init(|| TzDb::open("/usr/share/zoneinfo").ok())
        .as_ref()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_zone_discovery_ignores_metadata_files() {
        let dir = tempdir();
        fs::write(dir.join("UTC"), b"not a real tzif").unwrap();
        fs::write(dir.join("zone.tab"), b"ignored").unwrap();
        fs::write(dir.join(".hidden"), b"ignored").unwrap();

        let db = TzDb::open(&dir).unwrap();
        let ids: Vec<_> = db.zone_ids().collect();
        assert_eq!(ids, vec!["UTC"]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    fn tempdir() -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("solid-temporal-test-{}", std::process::id()));
        fs::create_dir_all(&p).unwrap();
        p
    }

    #[test]
    fn test_missing_zone_is_not_found() {
        let dir = tempdir();
        let db = TzDb::open(&dir).unwrap();
        assert!(matches!(db.rules("Nowhere/Place"), Err(Error::NotFound(_))));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
