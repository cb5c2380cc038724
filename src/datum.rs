// Mapping from a local item record to the data attached to its remote item.
// The table is plain code so the labels and types can be read and tested
// without talking to a server.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use crate::models::DatumType;
use crate::record::ItemRecord;

/// Feature values longer than this many characters become text areas.
pub const TEXTAREA_THRESHOLD: usize = 50;

/// Content of a planned datum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatumValue {
    /// Set inline with an update call.
    Inline(String),
    /// Uploaded from a local file.
    File(PathBuf),
}

impl DatumValue {
    /// The value as a local path, for upload.
    pub fn as_path(&self) -> &Path {
        match self {
            DatumValue::Inline(value) => Path::new(value),
            DatumValue::File(path) => path,
        }
    }

    /// The value as text, for an inline update.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            DatumValue::Inline(value) => Cow::Borrowed(value),
            DatumValue::File(path) => path.to_string_lossy(),
        }
    }
}

/// One datum to create on the remote item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatumSpec {
    pub kind: DatumType,
    pub label: String,
    pub value: DatumValue,
}

impl DatumSpec {
    fn inline(kind: DatumType, label: impl Into<String>, value: &str) -> Self {
        DatumSpec {
            kind,
            label: label.into(),
            value: DatumValue::Inline(value.to_owned()),
        }
    }
}

/// Datum type for a free-form feature value.
pub fn feature_kind(value: &str) -> DatumType {
    if value.chars().count() > TEXTAREA_THRESHOLD {
        DatumType::Textarea
    } else {
        DatumType::Text
    }
}

/// Every datum the record produces, in creation order: fixed fields, then
/// features in key order, then pictures. Empty values are left out.
pub fn datum_plan(record: &ItemRecord) -> Vec<DatumSpec> {
    let fixed = [
        (DatumType::Link, "URL", &record.url),
        (DatumType::Text, "eBay ID", &record.ebay_id),
        (DatumType::Text, "Original Price", &record.price_original),
        (DatumType::Text, "Seller Name", &record.seller_name),
        (DatumType::Text, "Seller URL", &record.seller_url),
        (DatumType::Textarea, "Description Text", &record.description_text),
    ];

    let mut plan: Vec<DatumSpec> = fixed
        .iter()
        .filter(|(_, _, value)| !value.is_empty())
        .map(|(kind, label, value)| DatumSpec::inline(*kind, *label, value))
        .collect();

    plan.extend(
        record
            .features
            .iter()
            .filter(|(k, v)| !k.is_empty() && !v.is_empty())
            .map(|(k, v)| DatumSpec::inline(feature_kind(v), k.as_str(), v)),
    );

    plan.extend(
        record
            .picture_data
            .iter()
            .enumerate()
            .filter(|(_, pic)| !pic.filename.is_empty())
            .map(|(idx, pic)| DatumSpec {
                kind: DatumType::Image,
                label: format!("Picture {}", idx + 1),
                value: DatumValue::File(record.picture_path(pic)),
            }),
    );

    plan
}
