// In-memory stand-in for the collection service that records every call.

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};

use reqwest::StatusCode;

use crate::api::KoiApi;
use crate::error::ApiError;
use crate::models::{
    Collection, Datum, DatumType, Field, Item, NewCollection, NewDatum, NewItem, Template,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Authenticate(String),
    ListCollections(u32),
    CreateCollection(String),
    ListItems(u32),
    CreateItem { name: String, collection: String },
    UploadItemImage { item: String, path: PathBuf },
    CreateDatum { kind: DatumType, label: String },
    UpdateDatum { id: String, value: String },
    UploadDatum { id: String, kind: DatumType, path: PathBuf },
    DeleteAll,
}

#[derive(Default)]
pub struct FakeKoi {
    pub calls: RefCell<Vec<Call>>,
    /// Remote collections, served `page_size` per page.
    pub collections: RefCell<Vec<Collection>>,
    pub items: RefCell<Vec<Item>>,
    pub page_size: usize,
    pub reject_login: bool,
    /// Fail the create-datum call whose label matches.
    pub fail_datum_label: Option<String>,
    /// Fail item creation for items with this name.
    pub fail_item_name: Option<String>,
    pub next_id: Cell<u32>,
}

impl FakeKoi {
    pub fn new() -> Self {
        FakeKoi {
            page_size: 2,
            ..Default::default()
        }
    }

    pub fn with_collections(titles: &[(&str, &str)]) -> Self {
        let fake = FakeKoi::new();
        *fake.collections.borrow_mut() = titles
            .iter()
            .map(|(id, title)| Collection {
                id: (*id).into(),
                title: (*title).into(),
                visibility: None,
            })
            .collect();
        fake
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| pred(*c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn id(&self, prefix: &str) -> String {
        let n = self.next_id.get() + 1;
        self.next_id.set(n);
        format!("{prefix}-{n}")
    }

    fn page<T: Clone>(&self, all: &[T], page: u32) -> Vec<T> {
        let start = (page.saturating_sub(1) as usize) * self.page_size;
        all.iter().skip(start).take(self.page_size).cloned().collect()
    }

    fn rejected(detail: &str) -> ApiError {
        ApiError::Status {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            detail: detail.into(),
        }
    }
}

impl KoiApi for FakeKoi {
    fn authenticate(&mut self, username: &str, _password: &str) -> Result<String, ApiError> {
        self.record(Call::Authenticate(username.into()));
        if self.reject_login {
            return Err(ApiError::Status {
                status: StatusCode::UNAUTHORIZED,
                detail: "Invalid credentials.".into(),
            });
        }
        Ok("token".into())
    }

    fn list_collections(&self, page: u32) -> Result<Vec<Collection>, ApiError> {
        self.record(Call::ListCollections(page));
        Ok(self.page(&self.collections.borrow(), page))
    }

    fn create_collection(&self, new: &NewCollection) -> Result<Collection, ApiError> {
        self.record(Call::CreateCollection(new.title.clone()));
        let created = Collection {
            id: self.id("col"),
            title: new.title.clone(),
            visibility: Some(new.visibility),
        };
        self.collections.borrow_mut().push(created.clone());
        Ok(created)
    }

    fn delete_collection(&self, id: &str) -> Result<(), ApiError> {
        self.collections.borrow_mut().retain(|c| c.id != id);
        Ok(())
    }

    fn list_items(&self, page: u32) -> Result<Vec<Item>, ApiError> {
        self.record(Call::ListItems(page));
        Ok(self.page(&self.items.borrow(), page))
    }

    fn create_item(&self, new: &NewItem) -> Result<Item, ApiError> {
        self.record(Call::CreateItem {
            name: new.name.clone(),
            collection: new.collection.clone(),
        });
        if self.fail_item_name.as_deref() == Some(new.name.as_str()) {
            return Err(Self::rejected("name: This value is too long."));
        }
        let item = Item {
            id: self.id("item"),
            name: new.name.clone(),
            collection: Some(new.collection.clone()),
            image: None,
        };
        self.items.borrow_mut().push(item.clone());
        Ok(item)
    }

    fn upload_item_image(&self, item_id: &str, path: &Path) -> Result<Item, ApiError> {
        self.record(Call::UploadItemImage {
            item: item_id.into(),
            path: path.to_path_buf(),
        });
        self.items
            .borrow()
            .iter()
            .find(|i| i.id == item_id)
            .cloned()
            .ok_or_else(|| Self::rejected("item not found"))
    }

    fn create_datum(&self, new: &NewDatum) -> Result<Datum, ApiError> {
        self.record(Call::CreateDatum {
            kind: new.kind,
            label: new.label.clone(),
        });
        if self.fail_datum_label.as_deref() == Some(new.label.as_str()) {
            return Err(Self::rejected("label: invalid"));
        }
        Ok(Datum {
            id: self.id("datum"),
            kind: new.kind,
            label: new.label.clone(),
            value: None,
        })
    }

    fn update_datum(&self, datum_id: &str, value: &str) -> Result<Datum, ApiError> {
        self.record(Call::UpdateDatum {
            id: datum_id.into(),
            value: value.into(),
        });
        Ok(Datum {
            id: datum_id.into(),
            kind: DatumType::Text,
            label: String::new(),
            value: Some(value.into()),
        })
    }

    fn upload_datum_content(
        &self,
        datum_id: &str,
        kind: DatumType,
        path: &Path,
    ) -> Result<Datum, ApiError> {
        self.record(Call::UploadDatum {
            id: datum_id.into(),
            kind,
            path: path.to_path_buf(),
        });
        Ok(Datum {
            id: datum_id.into(),
            kind,
            label: String::new(),
            value: None,
        })
    }

    fn list_templates(&self, _page: u32) -> Result<Vec<Template>, ApiError> {
        Ok(Vec::new())
    }

    fn list_template_fields(&self, _template_id: &str) -> Result<Vec<Field>, ApiError> {
        Ok(Vec::new())
    }

    fn delete_template(&self, _id: &str) -> Result<(), ApiError> {
        Ok(())
    }

    fn delete_field(&self, _id: &str) -> Result<(), ApiError> {
        Ok(())
    }

    fn delete_all_data(&self) -> Result<(), ApiError> {
        self.record(Call::DeleteAll);
        self.collections.borrow_mut().clear();
        self.items.borrow_mut().clear();
        Ok(())
    }
}
