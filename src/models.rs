// Resource shapes exchanged with the collection service. Only the fields the
// importer reads or writes are modelled; everything else in a response is
// ignored by serde.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Who can see a collection.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Internal,
    Private,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub visibility: Option<Visibility>,
}

impl Collection {
    /// Reference used when another resource points at this collection.
    pub fn iri(&self) -> String {
        format!("/api/collections/{}", self.id)
    }
}

/// Body of a create-collection request.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct NewCollection {
    pub title: String,
    pub visibility: Visibility,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl Item {
    pub fn iri(&self) -> String {
        format!("/api/items/{}", self.id)
    }

    /// One-line description used by the item listing.
    pub fn summary(&self) -> String {
        format!("{:<40} {:<36}", truncate(&self.name, 40), self.id)
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_owned()
    } else {
        let mut out: String = s.chars().take(max - 1).collect();
        out.push('…');
        out
    }
}

/// Body of a create-item request; `collection` is the collection IRI.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub name: String,
    pub collection: String,
}

/// Kind of value a datum holds.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DatumType {
    Text,
    Textarea,
    Link,
    Image,
    File,
    Video,
    Sign,
}

/// Where the binary payload of a datum is posted, and the multipart field
/// the server expects it in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadTarget {
    pub segment: &'static str,
    pub field: &'static str,
}

impl DatumType {
    pub fn as_str(self) -> &'static str {
        match self {
            DatumType::Text => "text",
            DatumType::Textarea => "textarea",
            DatumType::Link => "link",
            DatumType::Image => "image",
            DatumType::File => "file",
            DatumType::Video => "video",
            DatumType::Sign => "sign",
        }
    }

    /// `Some` for types whose content is uploaded rather than set inline.
    /// Signatures are stored through the file endpoint.
    pub fn upload_target(self) -> Option<UploadTarget> {
        match self {
            DatumType::Image => Some(UploadTarget {
                segment: "image",
                field: "fileImage",
            }),
            DatumType::File | DatumType::Sign => Some(UploadTarget {
                segment: "file",
                field: "fileFile",
            }),
            DatumType::Video => Some(UploadTarget {
                segment: "video",
                field: "fileVideo",
            }),
            DatumType::Text | DatumType::Textarea | DatumType::Link => None,
        }
    }

    pub fn is_binary(self) -> bool {
        self.upload_target().is_some()
    }
}

impl fmt::Display for DatumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Datum {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: DatumType,
    pub label: String,
    #[serde(default)]
    pub value: Option<String>,
}

/// Body of a create-datum request; `item` is the item IRI.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct NewDatum {
    pub item: String,
    #[serde(rename = "type")]
    pub kind: DatumType,
    pub label: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub id: String,
    pub name: String,
}

/// A field definition belonging to a template.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}
