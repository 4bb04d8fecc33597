//! Durable store of raw vendor results, one JSON document per (image, vendor).
//!
//! An entry's presence means "already fetched": it is never revalidated and
//! never rewritten, so repeated runs are free and byte-stable.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::error::CacheError;
use crate::types::RawVendorResult;

/// File-backed result cache rooted at a directory.
#[derive(Debug, Clone)]
pub struct ResultCache {
    root: PathBuf,
}

impl ResultCache {
    /// Open (creating if needed) a cache rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|source| CacheError::Root {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Entry file name: `<image_filename>.<vendor>.json`.
    pub fn key(image_filename: &str, vendor: &str) -> String {
        format!("{image_filename}.{vendor}.json")
    }

    pub fn path(&self, image_filename: &str, vendor: &str) -> PathBuf {
        self.root.join(Self::key(image_filename, vendor))
    }

    pub fn contains(&self, image_filename: &str, vendor: &str) -> bool {
        self.path(image_filename, vendor).is_file()
    }

    /// Fetch a stored raw result, if present.
    pub fn lookup(
        &self,
        image_filename: &str,
        vendor: &str,
    ) -> Result<Option<RawVendorResult>, CacheError> {
        let path = self.path(image_filename, vendor);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CacheError::Read { path, source }),
        };
        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(Some(RawVendorResult::new(map))),
            Ok(_) => Err(CacheError::Corrupt {
                path,
                message: "entry is not a JSON object".to_string(),
            }),
            Err(e) => Err(CacheError::Corrupt {
                path,
                message: e.to_string(),
            }),
        }
    }

    /// Persist a raw result. An existing entry is left untouched.
    ///
    /// Written to a temporary sibling and renamed into place.
    pub fn store(
        &self,
        image_filename: &str,
        vendor: &str,
        raw: &RawVendorResult,
    ) -> Result<PathBuf, CacheError> {
        let path = self.path(image_filename, vendor);
        if path.exists() {
            tracing::debug!("Cache entry {:?} already present, not rewriting", path);
            return Ok(path);
        }

        let bytes = encode(raw).map_err(|e| CacheError::Write {
            path: path.clone(),
            source: std::io::Error::other(e),
        })?;
        let tmp = self
            .root
            .join(format!(".{}.tmp", Self::key(image_filename, vendor)));
        std::fs::write(&tmp, &bytes)
            .and_then(|()| std::fs::rename(&tmp, &path))
            .map_err(|source| {
                let _ = std::fs::remove_file(&tmp);
                CacheError::Write {
                    path: path.clone(),
                    source,
                }
            })?;
        Ok(path)
    }
}

/// Keys sorted at every level, whatever map ordering serde_json was built with.
fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), sort_keys(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

/// Pretty JSON with 4-space indentation.
fn encode(raw: &RawVendorResult) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    sort_keys(&raw.as_value()).serialize(&mut ser)?;
    Ok(buf)
}
