// Publishing one local record as a remote item with its data and featured
// image. Each step runs only after the previous one succeeded; the first
// failure abandons the item.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::api::KoiApi;
use crate::datum::{datum_plan, DatumSpec};
use crate::error::{ApiError, ImportError};
use crate::models::{Collection, Datum, Item, NewDatum, NewItem};
use crate::record::ItemRecord;

/// Result of a completed import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedItem {
    pub item: Item,
    pub datums: usize,
}

/// Local file of the record's primary photo.
///
/// Checked before anything is created remotely, so a bad index never leaves
/// a half-imported item behind.
pub fn primary_photo(record: &ItemRecord) -> Result<PathBuf, ImportError> {
    if record.picture_data.is_empty() {
        return Err(ImportError::NoPictures);
    }
    let (index, picture) = usize::try_from(record.photo_index)
        .ok()
        .and_then(|i| Some((i, record.picture_data.get(i)?)))
        .ok_or(ImportError::PhotoIndexOutOfRange {
            index: record.photo_index,
            count: record.picture_data.len(),
        })?;
    if picture.filename.is_empty() {
        return Err(ImportError::PhotoWithoutFilename { index });
    }
    Ok(record.picture_path(picture))
}

/// Create the item in `collection`, attach one datum per populated field and
/// picture, then set its featured image.
pub fn import_item<A: KoiApi + ?Sized>(
    api: &A,
    collection: &Collection,
    record: &ItemRecord,
) -> Result<ImportedItem, ImportError> {
    let photo = primary_photo(record)?;

    let new = NewItem {
        name: record.name.clone(),
        collection: collection.iri(),
    };
    let item = api
        .create_item(&new)
        .map_err(|e| ImportError::remote(format!("create item '{}'", record.name), e))?;
    info!(id = %item.id, "created item {}", record.display_id());

    let plan = datum_plan(record);
    for spec in &plan {
        let datum = add_datum(api, &item, spec).map_err(|e| {
            ImportError::on_item(&item.id, format!("add datum '{}'", spec.label), e)
        })?;
        debug!(
            "added datum to item {}: type {}, id {}, label {}",
            record.display_id(),
            spec.kind,
            datum.id,
            spec.label
        );
    }

    let item = api
        .upload_item_image(&item.id, &photo)
        .map_err(|e| ImportError::on_item(&item.id, "upload primary photo", e))?;

    Ok(ImportedItem {
        item,
        datums: plan.len(),
    })
}

/// Create a datum on `item`, then upload its file or set its value depending
/// on the datum type.
fn add_datum<A: KoiApi + ?Sized>(
    api: &A,
    item: &Item,
    spec: &DatumSpec,
) -> Result<Datum, ApiError> {
    let new = NewDatum {
        item: item.iri(),
        kind: spec.kind,
        label: spec.label.clone(),
    };
    let datum = api.create_datum(&new)?;
    if spec.kind.is_binary() {
        api.upload_datum_content(&datum.id, spec.kind, spec.value.as_path())
    } else {
        api.update_datum(&datum.id, &spec.value.as_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::DatumValue;
    use crate::models::DatumType;
    use crate::record::PictureData;
    use crate::testing::{Call, FakeKoi};

    fn maps() -> Collection {
        Collection {
            id: "col-1".into(),
            title: "Maps".into(),
            visibility: None,
        }
    }

    fn a42() -> ItemRecord {
        let mut record: ItemRecord = serde_json::from_str(
            r#"{"id":"A42","name":"Old Map","url":"http://x","price_original":"$10","features":{"Condition":"Good"},"picture_data":[{"filename":"p1.jpg"}],"photo_index":0}"#,
        )
        .unwrap();
        record.dir = PathBuf::from("items/A42");
        record
    }

    #[test]
    fn imports_scraped_map() {
        let fake = FakeKoi::new();
        let imported = import_item(&fake, &maps(), &a42()).unwrap();
        assert_eq!(imported.datums, 5);

        let calls = fake.calls();
        assert_eq!(
            calls[0],
            Call::CreateItem {
                name: "Old Map".into(),
                collection: "/api/collections/col-1".into(),
            }
        );
        let created: Vec<_> = calls
            .iter()
            .filter_map(|c| match c {
                Call::CreateDatum { kind, label } => Some((*kind, label.as_str())),
                _ => None,
            })
            .collect();
        assert_eq!(
            created,
            [
                (DatumType::Link, "URL"),
                (DatumType::Text, "eBay ID"),
                (DatumType::Text, "Original Price"),
                (DatumType::Text, "Condition"),
                (DatumType::Image, "Picture 1"),
            ]
        );
        assert_eq!(
            fake.count(|c| matches!(c, Call::UploadItemImage { .. })),
            1
        );
        assert_eq!(
            calls.last(),
            Some(&Call::UploadItemImage {
                item: imported.item.id.clone(),
                path: PathBuf::from("items/A42/p1.jpg"),
            })
        );
    }

    #[test]
    fn text_values_are_set_and_images_uploaded() {
        let fake = FakeKoi::new();
        import_item(&fake, &maps(), &a42()).unwrap();

        assert!(fake.calls().contains(&Call::UpdateDatum {
            id: "datum-4".into(),
            value: "$10".into(),
        }));
        let uploads: Vec<_> = fake
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::UploadDatum { .. }))
            .collect();
        assert_eq!(
            uploads,
            [Call::UploadDatum {
                id: "datum-6".into(),
                kind: DatumType::Image,
                path: PathBuf::from("items/A42/p1.jpg"),
            }]
        );
        assert_eq!(fake.count(|c| matches!(c, Call::UpdateDatum { .. })), 4);
    }

    #[test]
    fn out_of_range_index_fails_before_any_call() {
        let fake = FakeKoi::new();
        let mut record = a42();
        record.photo_index = 3;

        let err = import_item(&fake, &maps(), &record).unwrap_err();
        assert!(matches!(
            err,
            ImportError::PhotoIndexOutOfRange { index: 3, count: 1 }
        ));
        assert!(err.is_config());
        assert!(fake.calls().is_empty());
    }

    #[test]
    fn negative_index_fails_before_any_call() {
        let fake = FakeKoi::new();
        let mut record = a42();
        record.photo_index = -1;

        let err = import_item(&fake, &maps(), &record).unwrap_err();
        assert!(matches!(
            err,
            ImportError::PhotoIndexOutOfRange { index: -1, count: 1 }
        ));
        assert!(err.is_config());
        assert!(fake.calls().is_empty());
    }

    #[test]
    fn datum_type_decides_upload_or_update() {
        let fake = FakeKoi::new();
        let item = Item {
            id: "item-9".into(),
            name: "Old Map".into(),
            collection: None,
            image: None,
        };
        let video = DatumSpec {
            kind: DatumType::Video,
            label: "Walkthrough".into(),
            value: DatumValue::Inline("items/A42/clip.mp4".into()),
        };
        let text = DatumSpec {
            kind: DatumType::Text,
            label: "Scan".into(),
            value: DatumValue::File(PathBuf::from("items/A42/scan.txt")),
        };
        add_datum(&fake, &item, &video).unwrap();
        add_datum(&fake, &item, &text).unwrap();

        let calls = fake.calls();
        assert_eq!(
            calls[1],
            Call::UploadDatum {
                id: "datum-1".into(),
                kind: DatumType::Video,
                path: PathBuf::from("items/A42/clip.mp4"),
            }
        );
        assert_eq!(
            calls[3],
            Call::UpdateDatum {
                id: "datum-2".into(),
                value: "items/A42/scan.txt".into(),
            }
        );
    }

    #[test]
    fn record_without_pictures_is_rejected() {
        let fake = FakeKoi::new();
        let mut record = a42();
        record.picture_data.clear();
        assert!(matches!(
            import_item(&fake, &maps(), &record),
            Err(ImportError::NoPictures)
        ));

        record.picture_data = vec![PictureData::default()];
        assert!(matches!(
            import_item(&fake, &maps(), &record),
            Err(ImportError::PhotoWithoutFilename { index: 0 })
        ));
        assert!(fake.calls().is_empty());
    }

    #[test]
    fn datum_failure_stops_the_item() {
        let fake = FakeKoi {
            fail_datum_label: Some("Original Price".into()),
            ..FakeKoi::new()
        };
        let err = import_item(&fake, &maps(), &a42()).unwrap_err();

        assert_eq!(err.orphan(), Some("item-1"));
        assert!(err.to_string().contains("add datum 'Original Price'"));
        assert_eq!(fake.count(|c| matches!(c, Call::CreateDatum { .. })), 3);
        assert_eq!(fake.count(|c| matches!(c, Call::UploadItemImage { .. })), 0);
    }

    #[test]
    fn item_failure_leaves_no_orphan() {
        let fake = FakeKoi {
            fail_item_name: Some("Old Map".into()),
            ..FakeKoi::new()
        };
        let err = import_item(&fake, &maps(), &a42()).unwrap_err();
        assert_eq!(err.orphan(), None);
        assert_eq!(fake.calls().len(), 1);
    }
}
