use chrono::NaiveDate;
use eyre::{Context, Result, eyre};
use serde_json::{Map, Value};
use std::fs::{self, File, Permissions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::fields::clean_value;
use crate::record::Record;
use crate::utils::format_json_pretty;

const KEY_SOURCE: &str = "source";
const KEY_UPDATED_AT: &str = "updatedAt";
const KEY_ITEMS: &str = "items";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Where a new record goes in `items`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    #[default]
    Append,
    Prepend,
}

/// The persisted partner collection:
/// `{ "source": string, "updatedAt": "YYYY-MM-DD", "items": [ ... ] }`.
///
/// Existing items are kept as opaque JSON so that entries written by hand or by
/// older versions survive a rewrite untouched. Any other top-level keys are carried
/// along in their original position.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    /// `None` when the stored value is missing, null, blank or not a string.
    pub source: Option<String>,
    /// A stored `source` that is not a string (a number, an object). It stays in
    /// `document` as is and is never replaced by the default.
    foreign_source: bool,
    /// `None` when the stored value is missing or not a calendar date.
    pub updated_at: Option<NaiveDate>,
    pub items: Vec<Value>,
    /// The whole top-level object, in original key order. Typed fields above take
    /// precedence over whatever is stored here for their keys.
    document: Map<String, Value>,
}

impl Collection {
    /// An empty collection, as used when the file does not exist yet.
    pub fn new(source: &str, today: NaiveDate) -> Self {
        let mut document = Map::new();
        document.insert(KEY_SOURCE.into(), Value::Null);
        document.insert(KEY_UPDATED_AT.into(), Value::Null);
        document.insert(KEY_ITEMS.into(), Value::Null);
        Self {
            source: Some(source.to_string()),
            foreign_source: false,
            updated_at: Some(today),
            items: Vec::new(),
            document,
        }
    }

    /// Validate and coerce a loosely shaped JSON document.
    ///
    /// A non-object top level is an error. A missing or non-list `items` is
    /// repaired to an empty list.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut document) = value else {
            return Err(eyre!("collection must contain JSON object"));
        };

        let items = match document.get_mut(KEY_ITEMS).map(Value::take) {
            Some(Value::Array(items)) => items,
            Some(other) => {
                debug!(found = json_type_name(&other), "replacing non-list items with []");
                Vec::new()
            }
            None => {
                debug!("collection has no items, starting with []");
                Vec::new()
            }
        };

        let (source, foreign_source) = match document.get(KEY_SOURCE) {
            Some(Value::String(s)) if !clean_value(s).is_empty() => (Some(s.clone()), false),
            None | Some(Value::Null) | Some(Value::String(_)) => (None, false),
            Some(_) => (None, true),
        };

        let updated_at = match document.get(KEY_UPDATED_AT) {
            Some(Value::String(s)) => NaiveDate::parse_from_str(s, DATE_FORMAT).ok(),
            _ => None,
        };

        Ok(Self {
            source,
            foreign_source,
            updated_at,
            items,
            document,
        })
    }

    /// Load the collection at `path`, or start a fresh one if the file is absent.
    pub fn load(path: &Path, default_source: &str, today: NaiveDate) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "collection file not found, starting fresh");
            return Ok(Self::new(default_source, today));
        }
        let content = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read collection: {}", path.display()))?;
        let value: Value = serde_json::from_str(&content)
            .wrap_err_with(|| format!("Failed to parse collection: {}", path.display()))?;
        Self::from_value(value).wrap_err_with(|| format!("Invalid collection: {}", path.display()))
    }

    pub fn insert(&mut self, record: &Record, placement: Placement) -> Result<()> {
        let item = serde_json::to_value(record).wrap_err("Failed to serialize record")?;
        match placement {
            Placement::Append => self.items.push(item),
            Placement::Prepend => self.items.insert(0, item),
        }
        Ok(())
    }

    /// Mark the collection as changed today, filling in `source` if it is blank.
    pub fn touch(&mut self, today: NaiveDate, default_source: &str) {
        self.updated_at = Some(today);
        if self.source.is_none() && !self.foreign_source {
            self.source = Some(default_source.to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn to_value(&self) -> Value {
        let mut document = self.document.clone();
        document.insert(KEY_ITEMS.into(), Value::Array(self.items.clone()));
        if let Some(date) = self.updated_at {
            document.insert(
                KEY_UPDATED_AT.into(),
                Value::String(date.format(DATE_FORMAT).to_string()),
            );
        }
        if let Some(source) = &self.source {
            document.insert(KEY_SOURCE.into(), Value::String(source.clone()));
        }
        Value::Object(document)
    }

    /// Rewrite the whole file. The content goes to a sibling temp file first and is
    /// renamed over the target, so readers never see a partial write.
    ///
    /// A symlinked `path` is followed and the link itself is left in place. The
    /// rewritten file keeps the permissions of the one it replaces.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut content = format_json_pretty(&self.to_value())?;
        content.push('\n');

        let target = resolve_target(path)?;
        let path = target.as_path();
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)
            .wrap_err_with(|| format!("Failed to create directory: {}", parent.display()))?;

        let mut tmp = NamedTempFile::new_in(parent).wrap_err("Failed to create temporary file")?;
        tmp.write_all(content.as_bytes())
            .wrap_err("Failed to write temporary file")?;
        let permissions = target_permissions(path, tmp.as_file())?;
        tmp.as_file()
            .set_permissions(permissions)
            .wrap_err("Failed to set permissions on temporary file")?;
        tmp.persist(path)
            .map_err(|e| e.error)
            .wrap_err_with(|| format!("Failed to write collection: {}", path.display()))?;
        Ok(())
    }
}

/// Load, insert, stamp and rewrite in one go. Returns the new item count.
pub fn merge_into_file(
    path: &Path,
    record: &Record,
    placement: Placement,
    default_source: &str,
    today: NaiveDate,
) -> Result<usize> {
    let mut collection = Collection::load(path, default_source, today)?;
    collection.insert(record, placement)?;
    collection.touch(today, default_source);
    collection.save(path)?;
    info!(
        path = %path.display(),
        items = collection.len(),
        ?placement,
        "merged record into collection"
    );
    Ok(collection.len())
}

/// Follow a symlinked collection path to the file it points at.
fn resolve_target(path: &Path) -> Result<PathBuf> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => fs::canonicalize(path)
            .wrap_err_with(|| format!("Failed to resolve symlink: {}", path.display())),
        _ => Ok(path.to_path_buf()),
    }
}

/// Permissions of the existing file, or `rw-r--r--` for a new one.
fn target_permissions(path: &Path, tmp: &File) -> Result<Permissions> {
    if path.exists() {
        return fs::metadata(path)
            .map(|meta| meta.permissions())
            .wrap_err_with(|| format!("Failed to read metadata: {}", path.display()));
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = tmp;
        Ok(Permissions::from_mode(0o644))
    }
    #[cfg(not(unix))]
    {
        tmp.metadata()
            .map(|meta| meta.permissions())
            .wrap_err("Failed to read temporary file metadata")
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
