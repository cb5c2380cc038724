// API client module: a small blocking HTTP client for the collection
// service, plus the `KoiApi` trait the rest of the crate programs against so
// the import flow can run against an in-memory fake in tests.

use std::collections::HashSet;
use std::fs::File;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::{multipart, Client, RequestBuilder};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;
use crate::models::{
    Collection, Datum, DatumType, Field, Item, NewCollection, NewDatum, NewItem, Template,
};

/// Operations the importer needs from the remote service.
///
/// Paginated listings start at page 1 and return an empty vector past the
/// last page.
pub trait KoiApi {
    /// Log in and keep the returned token for every later call.
    fn authenticate(&mut self, username: &str, password: &str) -> Result<String, ApiError>;

    fn list_collections(&self, page: u32) -> Result<Vec<Collection>, ApiError>;
    fn create_collection(&self, new: &NewCollection) -> Result<Collection, ApiError>;
    fn delete_collection(&self, id: &str) -> Result<(), ApiError>;

    fn list_items(&self, page: u32) -> Result<Vec<Item>, ApiError>;
    fn create_item(&self, new: &NewItem) -> Result<Item, ApiError>;
    /// Set the item's featured image from a local file.
    fn upload_item_image(&self, item_id: &str, path: &Path) -> Result<Item, ApiError>;

    fn create_datum(&self, new: &NewDatum) -> Result<Datum, ApiError>;
    /// Set the inline value of a text-like datum.
    fn update_datum(&self, datum_id: &str, value: &str) -> Result<Datum, ApiError>;
    /// Upload the content of an image/file/video/sign datum.
    fn upload_datum_content(
        &self,
        datum_id: &str,
        kind: DatumType,
        path: &Path,
    ) -> Result<Datum, ApiError>;

    fn list_templates(&self, page: u32) -> Result<Vec<Template>, ApiError>;
    fn list_template_fields(&self, template_id: &str) -> Result<Vec<Field>, ApiError>;
    fn delete_template(&self, id: &str) -> Result<(), ApiError>;
    fn delete_field(&self, id: &str) -> Result<(), ApiError>;

    /// Remove every template and collection the account owns. Items and
    /// their data go with their collection.
    ///
    /// Page 1 is re-read until it comes back empty. A resource that is still
    /// listed after its delete succeeded is an error; a 404 on delete counts
    /// as already gone.
    fn delete_all_data(&self) -> Result<(), ApiError> {
        let mut deleted = HashSet::new();
        loop {
            let templates = self.list_templates(1)?;
            if templates.is_empty() {
                break;
            }
            for template in &templates {
                if !deleted.insert(template.id.clone()) {
                    return Err(ApiError::NotDeleted {
                        what: "template",
                        id: template.id.clone(),
                    });
                }
                for field in self.list_template_fields(&template.id)? {
                    already_gone(self.delete_field(&field.id))?;
                }
                already_gone(self.delete_template(&template.id))?;
                debug!(id = %template.id, name = %template.name, "deleted template");
            }
        }

        let mut deleted = HashSet::new();
        loop {
            let collections = self.list_collections(1)?;
            if collections.is_empty() {
                break;
            }
            for collection in &collections {
                if !deleted.insert(collection.id.clone()) {
                    return Err(ApiError::NotDeleted {
                        what: "collection",
                        id: collection.id.clone(),
                    });
                }
                already_gone(self.delete_collection(&collection.id))?;
                debug!(id = %collection.id, title = %collection.title, "deleted collection");
            }
        }
        Ok(())
    }
}

// Child collections vanish with their parent, so they may 404 by the time
// their own delete is sent.
fn already_gone(result: Result<(), ApiError>) -> Result<(), ApiError> {
    match result {
        Err(e) if e.is_not_found() => Ok(()),
        other => other,
    }
}

/// Collect every page of a listing, stopping at the first empty page.
pub fn all_pages<T>(
    mut fetch: impl FnMut(u32) -> Result<Vec<T>, ApiError>,
) -> Result<Vec<T>, ApiError> {
    let mut all = Vec::new();
    for page in 1.. {
        let batch = fetch(page)?;
        if batch.is_empty() {
            break;
        }
        all.extend(batch);
    }
    Ok(all)
}

/// Blocking client that holds the reqwest client, the base URL of the
/// service and the token obtained at login.
#[derive(Clone)]
pub struct KoiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

/// Login request payload.
#[derive(Serialize, Debug)]
struct AuthRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize, Debug)]
struct AuthResponse {
    token: String,
}

impl KoiClient {
    /// Create a client for `base_url`. `timeout` bounds every request made
    /// through this client.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let trimmed = base_url.trim_end_matches('/');
        Url::parse(trimmed).map_err(|_| ApiError::BaseUrl(base_url.to_owned()))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .user_agent(concat!("koi-import/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(KoiClient {
            client,
            base_url: trimmed.to_owned(),
            token: None,
        })
    }

    /// Store a token for subsequent authenticated requests.
    pub fn set_token(&mut self, token: &str) {
        self.token = Some(token.to_owned());
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(t) => req.bearer_auth(t),
            None => req,
        }
    }

    /// Send a request and decode a JSON body, turning non-success statuses
    /// into `ApiError::Status` with the server's message.
    fn send_json<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        what: &'static str,
    ) -> Result<T, ApiError> {
        let res = self.authorized(req).send()?;
        let status = res.status();
        let body = res.text()?;
        if !status.is_success() {
            return Err(ApiError::from_response(status, &body));
        }
        serde_json::from_str(&body).map_err(|source| ApiError::Decode { what, source })
    }

    fn send_empty(&self, req: RequestBuilder) -> Result<(), ApiError> {
        let res = self.authorized(req).send()?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().unwrap_or_default();
            return Err(ApiError::from_response(status, &body));
        }
        Ok(())
    }

    fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        page: u32,
        what: &'static str,
    ) -> Result<Vec<T>, ApiError> {
        debug!(path, page, "listing");
        let req = self.client.get(self.url(path)).query(&[("page", page)]);
        self.send_json(req, what)
    }

    fn delete(&self, path: &str) -> Result<(), ApiError> {
        debug!(path, "deleting");
        self.send_empty(self.client.delete(self.url(path)))
    }

    /// POST a local file as multipart/form-data under `field`.
    fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        field: &'static str,
        file_path: &Path,
        what: &'static str,
    ) -> Result<T, ApiError> {
        let file = File::open(file_path).map_err(|source| ApiError::Upload {
            path: file_path.to_path_buf(),
            source,
        })?;
        let file_name = file_path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("upload")
            .to_owned();
        let part = multipart::Part::reader(file)
            .file_name(file_name)
            .mime_str(mime_for(file_path))?;
        let form = multipart::Form::new().part(field, part);

        debug!(path, file = %file_path.display(), "uploading");
        let req = self.client.post(self.url(path)).multipart(form);
        self.send_json(req, what)
    }
}

/// Content type from the file extension; the server sniffs anything else.
fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

impl KoiApi for KoiClient {
    fn authenticate(&mut self, username: &str, password: &str) -> Result<String, ApiError> {
        let req = self
            .client
            .post(self.url("/api/authentication_token"))
            .json(&AuthRequest { username, password });
        let resp: AuthResponse = self.send_json(req, "authentication")?;
        self.set_token(&resp.token);
        Ok(resp.token)
    }

    fn list_collections(&self, page: u32) -> Result<Vec<Collection>, ApiError> {
        self.get_page("/api/collections", page, "collection list")
    }

    fn create_collection(&self, new: &NewCollection) -> Result<Collection, ApiError> {
        let req = self.client.post(self.url("/api/collections")).json(new);
        self.send_json(req, "collection")
    }

    fn delete_collection(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/api/collections/{id}"))
    }

    fn list_items(&self, page: u32) -> Result<Vec<Item>, ApiError> {
        self.get_page("/api/items", page, "item list")
    }

    fn create_item(&self, new: &NewItem) -> Result<Item, ApiError> {
        let req = self.client.post(self.url("/api/items")).json(new);
        self.send_json(req, "item")
    }

    fn upload_item_image(&self, item_id: &str, path: &Path) -> Result<Item, ApiError> {
        self.upload(&format!("/api/items/{item_id}/image"), "fileImage", path, "item")
    }

    fn create_datum(&self, new: &NewDatum) -> Result<Datum, ApiError> {
        let req = self.client.post(self.url("/api/data")).json(new);
        self.send_json(req, "datum")
    }

    fn update_datum(&self, datum_id: &str, value: &str) -> Result<Datum, ApiError> {
        let req = self
            .client
            .patch(self.url(&format!("/api/data/{datum_id}")))
            .header(CONTENT_TYPE, "application/merge-patch+json")
            .body(serde_json::json!({ "value": value }).to_string());
        self.send_json(req, "datum")
    }

    fn upload_datum_content(
        &self,
        datum_id: &str,
        kind: DatumType,
        path: &Path,
    ) -> Result<Datum, ApiError> {
        let Some(target) = kind.upload_target() else {
            return Err(ApiError::Upload {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("{kind} datums take an inline value"),
                ),
            });
        };
        self.upload(
            &format!("/api/data/{datum_id}/{}", target.segment),
            target.field,
            path,
            "datum",
        )
    }

    fn list_templates(&self, page: u32) -> Result<Vec<Template>, ApiError> {
        self.get_page("/api/templates", page, "template list")
    }

    fn list_template_fields(&self, template_id: &str) -> Result<Vec<Field>, ApiError> {
        let req = self
            .client
            .get(self.url(&format!("/api/templates/{template_id}/fields")));
        self.send_json(req, "template field list")
    }

    fn delete_template(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/api/templates/{id}"))
    }

    fn delete_field(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/api/fields/{id}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_base_url() {
        let err = KoiClient::new("not a url", Duration::from_secs(1)).err();
        assert!(matches!(err, Some(ApiError::BaseUrl(_))));
    }

    #[test]
    fn trims_trailing_slash() {
        let client = KoiClient::new("http://koi.local/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.url("/api/items"), "http://koi.local/api/items");
        assert!(!client.has_token());
    }

    #[test]
    fn mime_from_extension() {
        assert_eq!(mime_for(Path::new("a/p1.JPG")), "image/jpeg");
        assert_eq!(mime_for(Path::new("clip.webm")), "video/webm");
        assert_eq!(mime_for(Path::new("noext")), "application/octet-stream");
    }
}
