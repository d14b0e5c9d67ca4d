use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;

use super::transport::{HttpTransport, Transport, TransportError};
use super::types::{ApiConfig, SortKey};

/// Collections of entities keyed by collection name (`projectsByGuid`, ...)
/// and then by id. This is the shape every endpoint answers with.
pub type EntityUpdates = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchResponse {
    #[serde(rename = "searchedVariants", default, deserialize_with = "null_as_empty")]
    pub searched_variants: Vec<Value>,
    #[serde(flatten)]
    pub updates: EntityUpdates,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Clone)]
pub struct Model {
    client: Arc<dyn Transport>,
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model").finish()
    }
}

impl Model {
    pub fn new(config: &ApiConfig) -> Result<Self, String> {
        let transport = HttpTransport::new(config).string_error("setup")?;
        Ok(Self::with_transport(transport))
    }

    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        Self {
            client: Arc::new(transport),
        }
    }

    pub async fn search_context(&self, search_hash: String) -> Result<EntityUpdates, String> {
        log::trace!("Search Context {search_hash}");
        let path = format!("/api/search_context/{}", urlencoding::encode(&search_hash));
        let response = self.client.get(&path).await.string_error("search_context")?;
        entity_updates(response).string_error("search_context")
    }

    /// Runs the stored search definition. `search` is sent as the body,
    /// an unknown definition is sent as `null`.
    pub async fn search_variants(
        &self,
        search_hash: String,
        sort: SortKey,
        page: u32,
        search: Option<Value>,
    ) -> Result<SearchResponse, String> {
        log::trace!("Search Variants {search_hash} page {page}");
        let path = format!(
            "/api/search/{}?sort={}&page={page}",
            urlencoding::encode(&search_hash),
            sort.query_value()
        );
        let body = search.unwrap_or(Value::Null);
        let response = self
            .client
            .post(&path, &body)
            .await
            .string_error("search_variants")?;
        serde_json::from_value(response)
            .map_err(|e| TransportError::Decode(e.to_string()))
            .string_error("search_variants")
    }

    pub async fn saved_searches(&self) -> Result<EntityUpdates, String> {
        log::trace!("Saved Searches");
        let response = self
            .client
            .get("/api/saved_search/all")
            .await
            .string_error("saved_searches")?;
        entity_updates(response).string_error("saved_searches")
    }

    pub async fn create_saved_search(&self, search: Value) -> Result<EntityUpdates, String> {
        log::trace!("Create Saved Search");
        self.post_saved_search("/api/saved_search".to_string(), search, "create_saved_search")
            .await
    }

    pub async fn update_saved_search(
        &self,
        guid: String,
        search: Value,
    ) -> Result<EntityUpdates, String> {
        log::trace!("Update Saved Search {guid}");
        let path = format!("/api/saved_search/{}/update", urlencoding::encode(&guid));
        self.post_saved_search(path, search, "update_saved_search")
            .await
    }

    pub async fn delete_saved_search(&self, guid: String) -> Result<EntityUpdates, String> {
        log::trace!("Delete Saved Search {guid}");
        let path = format!("/api/saved_search/{}/delete", urlencoding::encode(&guid));
        let mut updates = self
            .post_saved_search(path, Value::Object(Map::new()), "delete_saved_search")
            .await?;
        // The server answers with an empty object, make the removal explicit
        if !updates.contains_key("savedSearchesByGuid") {
            let mut removed = Map::new();
            removed.insert(guid, Value::Null);
            updates.insert("savedSearchesByGuid".to_string(), Value::Object(removed));
        }
        Ok(updates)
    }

    async fn post_saved_search(
        &self,
        path: String,
        search: Value,
        call: &'static str,
    ) -> Result<EntityUpdates, String> {
        let response = self.client.post(&path, &search).await.string_error(call)?;
        entity_updates(response).string_error(call)
    }

    pub async fn project_details(&self, project_guid: String) -> Result<EntityUpdates, String> {
        log::trace!("Project Details {project_guid}");
        self.details("project", &project_guid, "project_details")
            .await
    }

    pub async fn family_details(&self, family_guid: String) -> Result<EntityUpdates, String> {
        log::trace!("Family Details {family_guid}");
        self.details("family", &family_guid, "family_details").await
    }

    pub async fn analysis_group_details(
        &self,
        analysis_group_guid: String,
    ) -> Result<EntityUpdates, String> {
        log::trace!("Analysis Group Details {analysis_group_guid}");
        self.details(
            "analysis_group",
            &analysis_group_guid,
            "analysis_group_details",
        )
        .await
    }

    async fn details(
        &self,
        kind: &str,
        guid: &str,
        call: &'static str,
    ) -> Result<EntityUpdates, String> {
        let path = format!("/api/{kind}/{}/details", urlencoding::encode(guid));
        let response = self.client.get(&path).await.string_error(call)?;
        entity_updates(response).string_error(call)
    }
}

fn entity_updates(response: Value) -> Result<EntityUpdates, TransportError> {
    match response {
        Value::Object(updates) => Ok(updates),
        other => Err(TransportError::Decode(format!(
            "expected an object, got {other}"
        ))),
    }
}

trait ResultExt {
    type Output;
    fn string_error(self, call: &'static str) -> Result<Self::Output, String>;
}

impl<T, E: std::fmt::Display> ResultExt for Result<T, E> {
    type Output = T;
    fn string_error(self, call: &'static str) -> Result<T, String> {
        self.map_err(|e| {
            let string_error = e.to_string();
            log::error!("API Error: {call} {string_error}");
            string_error
        })
    }
}
