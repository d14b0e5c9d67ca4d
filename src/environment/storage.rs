use im::{HashMap, HashSet};
use serde_json::Value;

use super::model::EntityUpdates;
use super::types::VariantSearchDisplay;

pub const SEARCHES_BY_HASH: &str = "searchesByHash";
pub const SAVED_SEARCHES_BY_GUID: &str = "savedSearchesByGuid";

/// Objects of one kind, keyed by their guid / hash
pub type ObjectsById = HashMap<String, Value>;

/// Idle or loading. A finished request leaves its error message here.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LoadingState {
    pub is_loading: bool,
    pub error: Option<String>,
}

impl LoadingState {
    pub fn request(&mut self) {
        self.is_loading = true;
        self.error = None;
    }

    pub fn receive(&mut self, error: Option<String>) {
        self.is_loading = false;
        self.error = error;
    }
}

#[derive(Clone, Default)]
pub struct Data {
    /// Normalized collections received from the server, e.g.
    /// `projectsByGuid` or `familiesByGuid`
    pub entities: HashMap<String, ObjectsById>,
    pub project_details_loading: LoadingState,
    /// Projects whose details were requested during this session.
    /// Failed requests are removed again.
    pub project_details_requested: HashSet<String>,

    pub current_search_hash: Option<String>,
    /// Bumped whenever the current search changes. Search responses for
    /// an older generation are dropped.
    pub search_generation: u64,
    pub searched_variants: Vec<Value>,
    pub searched_variants_loading: LoadingState,
    pub variant_search_display: VariantSearchDisplay,

    pub searches_by_hash: ObjectsById,
    pub saved_searches_by_guid: ObjectsById,
    pub saved_searches_loading: LoadingState,
}

impl std::fmt::Debug for Data {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Data")
            .field("entities", &self.entities.keys().collect::<Vec<_>>())
            .field("project_details_loading", &self.project_details_loading)
            .field(
                "project_details_requested",
                &self.project_details_requested.len(),
            )
            .field("current_search_hash", &self.current_search_hash)
            .field("search_generation", &self.search_generation)
            .field("searched_variants", &self.searched_variants.len())
            .field("searched_variants_loading", &self.searched_variants_loading)
            .field("variant_search_display", &self.variant_search_display)
            .field("searches_by_hash", &self.searches_by_hash.len())
            .field("saved_searches_by_guid", &self.saved_searches_by_guid.len())
            .field("saved_searches_loading", &self.saved_searches_loading)
            .finish()
    }
}

// Data Operations

impl Data {
    pub fn entity(&self, collection: &str, id: &str) -> Option<&Value> {
        self.entities.get(collection)?.get(id)
    }

    /// Merge every object-valued collection of a server response.
    /// The saved-search collections and plain values such as
    /// `searchedVariants` are left alone.
    pub fn merge_entities(&mut self, updates: &EntityUpdates) {
        for (collection, objects) in updates {
            if collection == SEARCHES_BY_HASH || collection == SAVED_SEARCHES_BY_GUID {
                continue;
            }
            let Value::Object(objects) = objects else {
                continue;
            };
            let into = self.entities.entry(collection.clone()).or_default();
            merge_objects_by_id(into, objects);
        }
    }

    pub fn merge_saved_searches(&mut self, updates: &EntityUpdates) {
        if let Some(Value::Object(searches)) = updates.get(SEARCHES_BY_HASH) {
            merge_objects_by_id(&mut self.searches_by_hash, searches);
        }
        if let Some(Value::Object(saved)) = updates.get(SAVED_SEARCHES_BY_GUID) {
            merge_objects_by_id(&mut self.saved_searches_by_guid, saved);
        }
    }

    /// Projects recorded for an already known search hash. `None` if the
    /// hash is unknown or its search has no project list; an empty list
    /// is still `Some`.
    pub fn project_families(&self, search_hash: &str) -> Option<Vec<String>> {
        let families = self
            .searches_by_hash
            .get(search_hash)?
            .get("projectFamilies")?
            .as_array()?;
        Some(
            families
                .iter()
                .filter_map(|context| context.get("projectGuid")?.as_str())
                .map(str::to_string)
                .collect(),
        )
    }

    /// The `projectGuid` field of a family or analysis group
    pub fn parent_project(&self, collection: &str, id: &str) -> Option<String> {
        self.entity(collection, id)?
            .get("projectGuid")?
            .as_str()
            .map(str::to_string)
    }
}

/// `null` removes an entry, objects are shallow-merged into the
/// existing object and anything else replaces it.
pub fn merge_objects_by_id(into: &mut ObjectsById, updates: &serde_json::Map<String, Value>) {
    for (id, update) in updates {
        match update {
            Value::Null => {
                into.remove(id);
            }
            Value::Object(fields) => match into.get_mut(id) {
                Some(Value::Object(existing)) => {
                    for (key, value) in fields {
                        existing.insert(key.clone(), value.clone());
                    }
                }
                _ => {
                    into.insert(id.clone(), update.clone());
                }
            },
            other => {
                into.insert(id.clone(), other.clone());
            }
        }
    }
}
