// Finding the target collection by name, or creating it.

use tracing::{info, warn};

use crate::api::{all_pages, KoiApi};
use crate::error::ApiError;
use crate::models::{Collection, NewCollection, Visibility};

/// Return the remote collection titled `name` (ignoring case), creating a
/// public one if none exists.
///
/// Every page of collections is read before deciding. When several titles
/// match, the collection with the smallest id wins so repeated runs agree
/// on the same one.
pub fn find_or_create_collection<A: KoiApi + ?Sized>(
    api: &A,
    name: &str,
) -> Result<Collection, ApiError> {
    let wanted = name.to_lowercase();
    let mut matches: Vec<Collection> = all_pages(|page| api.list_collections(page))?
        .into_iter()
        .filter(|c| c.title.to_lowercase() == wanted)
        .collect();
    matches.sort_by(|a, b| a.id.cmp(&b.id));

    if matches.len() > 1 {
        let ids: Vec<&str> = matches.iter().map(|c| c.id.as_str()).collect();
        warn!(
            "{} collections are titled '{name}' ({}); using {}",
            matches.len(),
            ids.join(", "),
            ids[0]
        );
    }
    if let Some(found) = matches.into_iter().next() {
        return Ok(found);
    }

    let new = NewCollection {
        title: name.to_owned(),
        visibility: Visibility::Public,
    };
    let created = api.create_collection(&new)?;
    info!(id = %created.id, "created collection '{}'", created.title);
    Ok(created)
}

/// Capitalise the first letter of each word and lowercase the rest.
pub fn title_case(name: &str) -> String {
    name.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
