//! Local item records and the loader that reads them from disk.
//!
//! The items directory holds one subdirectory per scraped item:
//!
//! ```text
//! items/
//!   A42/
//!     A42.json   item record
//!     p1.jpg     pictures referenced by the record
//!     .skip      optional, presence skips the directory
//!     .index     optional, integer overriding `photo_index`
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};
use tracing::{debug, info, warn};

use crate::error::LoadError;

/// Marker file whose presence skips a directory.
pub const SKIP_MARKER: &str = ".skip";
/// Marker file holding the primary-photo index.
pub const INDEX_MARKER: &str = ".index";

/// One scraped item as written by the scraper.
///
/// Missing fields and explicit `null`s both decode to the empty value.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ItemRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    /// Listing id on the marketplace the item was scraped from.
    #[serde(rename = "id", deserialize_with = "null_as_default")]
    pub ebay_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub price_original: String,
    #[serde(deserialize_with = "null_as_default")]
    pub price_converted: String,
    #[serde(deserialize_with = "null_as_default")]
    pub seller_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub seller_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub photos: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub description_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description_text: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description_html: String,
    #[serde(deserialize_with = "null_as_default")]
    pub features: BTreeMap<String, String>,
    #[serde(deserialize_with = "null_as_default")]
    pub picture_data: Vec<PictureData>,
    #[serde(deserialize_with = "null_as_default")]
    pub skip: bool,
    /// Signed so a bad index reaches the importer as a per-item error
    /// instead of failing the whole load.
    #[serde(deserialize_with = "null_as_default")]
    pub photo_index: i64,
    /// Directory the record was loaded from; picture files live here.
    #[serde(skip)]
    pub dir: PathBuf,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct PictureData {
    #[serde(rename = "original_URLs", deserialize_with = "null_as_default")]
    pub original_urls: Vec<String>,
    #[serde(rename = "URL", deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub ext: String,
    #[serde(deserialize_with = "null_as_default")]
    pub checksum: String,
    #[serde(deserialize_with = "null_as_default")]
    pub filename: String,
    #[serde(deserialize_with = "null_as_default")]
    pub basename: String,
    #[serde(rename = "itemid", deserialize_with = "null_as_default")]
    pub item_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub resolution: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ItemRecord {
    /// Path of a picture file, relative to the record's directory.
    pub fn picture_path(&self, picture: &PictureData) -> PathBuf {
        self.dir.join(&picture.filename)
    }

    /// Name used in console output: the listing id when there is one.
    pub fn display_id(&self) -> &str {
        if self.ebay_id.is_empty() {
            &self.name
        } else {
            &self.ebay_id
        }
    }
}

/// Read every eligible record under `root`, in directory order.
///
/// A subdirectory without its `<name>/<name>.json` file is skipped with a
/// notice. Malformed JSON in any record aborts the whole load.
pub fn load_records(root: &Path) -> Result<Vec<ItemRecord>, LoadError> {
    let entries = fs::read_dir(root).map_err(|source| LoadError::Io {
        path: root.to_path_buf(),
        source,
    })?;

    let mut records = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| LoadError::Io {
            path: root.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_dir() || is_vcs_dir(&path) {
            continue;
        }
        if let Some(record) = load_record_dir(&path)? {
            records.push(record);
        }
    }
    Ok(records)
}

fn is_vcs_dir(path: &Path) -> bool {
    matches!(
        path.file_name().and_then(|n| n.to_str()),
        Some(".git") | Some(".hg") | Some(".svn")
    )
}

/// Load the record in one item directory, or `None` if it is skipped or has
/// no record file.
pub fn load_record_dir(dir: &Path) -> Result<Option<ItemRecord>, LoadError> {
    let Some(base) = dir.file_name().and_then(|n| n.to_str()) else {
        return Ok(None);
    };

    if dir.join(SKIP_MARKER).exists() {
        info!("Skipping {base} because {SKIP_MARKER} file in directory");
        return Ok(None);
    }

    let json_path = dir.join(format!("{base}.json"));
    let data = match fs::read(&json_path) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("JSON file not found: {}", json_path.display());
            return Ok(None);
        }
        Err(source) => {
            return Err(LoadError::Io {
                path: json_path,
                source,
            })
        }
    };

    let mut record: ItemRecord =
        serde_json::from_slice(&data).map_err(|source| LoadError::Decode {
            path: json_path.clone(),
            source,
        })?;
    record.dir = dir.to_path_buf();
    debug!("Successfully decoded {}", json_path.display());

    if let Some(index) = read_index_marker(&dir.join(INDEX_MARKER)) {
        record.photo_index = index;
    }
    Ok(Some(record))
}

/// Parse the `.index` marker. Missing or unparsable markers are ignored;
/// negative values are kept so the importer can reject them.
fn read_index_marker(path: &Path) -> Option<i64> {
    let content = fs::read_to_string(path).ok()?;
    match content.trim().parse() {
        Ok(index) => Some(index),
        Err(e) => {
            warn!("ignoring {}: {e}", path.display());
            None
        }
    }
}
