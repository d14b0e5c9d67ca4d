use serde_json::{Map, Value};
use std::sync::Arc;
use strum_macros::IntoStaticStr;

use crate::effect::Effect;
use crate::environment::model::{EntityUpdates, SearchResponse};
use crate::environment::storage::{Data, SEARCHES_BY_HASH};
use crate::environment::types::{
    ContextDescriptor, DisplayUpdate, DisplayUpdates, QueryParams, SearchContext,
};
use crate::environment::Environment;

/// Keeps the page url in sync with the display state
#[derive(Clone)]
pub struct QueryParamsUpdater(Arc<dyn Fn(QueryParams) + Send + Sync>);

impl QueryParamsUpdater {
    pub fn new(updater: impl Fn(QueryParams) + Send + Sync + 'static) -> Self {
        Self(Arc::new(updater))
    }

    pub fn noop() -> Self {
        Self::new(|_| ())
    }

    fn call(&self, params: QueryParams) {
        (self.0)(params)
    }
}

impl Default for QueryParamsUpdater {
    fn default() -> Self {
        Self::noop()
    }
}

impl std::fmt::Debug for QueryParamsUpdater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("QueryParamsUpdater").finish()
    }
}

#[derive(Clone, Debug, Default)]
pub struct SearchRequest {
    pub search_hash: String,
    pub display_updates: Option<DisplayUpdates>,
    pub query_params: Option<QueryParams>,
    pub update_query_params: QueryParamsUpdater,
}

impl SearchRequest {
    pub fn new(search_hash: impl Into<String>) -> Self {
        Self {
            search_hash: search_hash.into(),
            ..Default::default()
        }
    }

    /// `display_updates` win over `query_params` as a whole. A missing
    /// page is the first page, a missing sort keeps the current sort.
    pub fn resolve_display(&self, state: &Data) -> DisplayUpdate {
        let (sort, page) = match (&self.display_updates, &self.query_params) {
            (Some(updates), _) => (updates.sort, updates.page),
            (None, Some(params)) => (params.sort, params.page),
            (None, None) => (None, None),
        };
        DisplayUpdate {
            sort: sort.unwrap_or(state.variant_search_display.sort),
            page: page.filter(|page| *page > 0).unwrap_or(1),
        }
    }
}

/// Entities that point at the project they belong to
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ProjectParent {
    Family,
    AnalysisGroup,
}

impl ProjectParent {
    pub fn collection(&self) -> &'static str {
        match self {
            ProjectParent::Family => "familiesByGuid",
            ProjectParent::AnalysisGroup => "analysisGroupsByGuid",
        }
    }
}

#[allow(clippy::large_enum_variant)]
#[derive(Clone, IntoStaticStr)]
pub enum Action {
    // Operations
    LoadProjectFamiliesContext(ContextDescriptor),
    LoadSearchedVariants(SearchRequest),
    UnloadSearchResults,
    LoadSavedSearches,
    SaveHashedSearch(String, Value),
    SaveSearch(Value),
    UpdateSavedSearch(String, Value),
    DeleteSavedSearch(String),
    LoadProject(String),
    LoadFamilyProject(String),
    LoadAnalysisGroupProject(String),

    // Store updates
    UpdateCurrentSearch(Option<String>),
    RequestSearchedVariants,
    ReceiveSearchedVariants(Result<Vec<Value>, String>),
    UpdateSearchedVariantDisplay(DisplayUpdate),
    RequestSavedSearches,
    ReceiveSavedSearches(Result<EntityUpdates, String>),
    RequestProjectDetails,
    ReceiveData(Result<EntityUpdates, String>),

    // Intermediate steps and responses
    ResolveSearchDisplay(SearchRequest),
    FetchSearchedVariants(SearchRequest, DisplayUpdate),
    LoadedSearchedVariants {
        generation: u64,
        search_hash: String,
        search: Option<Value>,
        result: Result<SearchResponse, String>,
    },
    LoadedSearchContext(Result<EntityUpdates, String>),
    LoadedSavedSearches(Result<EntityUpdates, String>),
    LoadedProjectDetails(String, Result<EntityUpdates, String>),
    LoadedParentDetails(ProjectParent, String, Result<EntityUpdates, String>),
}

impl Action {
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LoadProjectFamiliesContext(arg0) => f
                .debug_tuple("LoadProjectFamiliesContext")
                .field(arg0)
                .finish(),
            Self::LoadSearchedVariants(arg0) => {
                f.debug_tuple("LoadSearchedVariants").field(arg0).finish()
            }
            Self::SaveHashedSearch(arg0, _arg1) => {
                f.debug_tuple("SaveHashedSearch").field(arg0).finish()
            }
            Self::UpdateSavedSearch(arg0, _arg1) => {
                f.debug_tuple("UpdateSavedSearch").field(arg0).finish()
            }
            Self::DeleteSavedSearch(arg0) => f.debug_tuple("DeleteSavedSearch").field(arg0).finish(),
            Self::LoadProject(arg0) => f.debug_tuple("LoadProject").field(arg0).finish(),
            Self::LoadFamilyProject(arg0) => f.debug_tuple("LoadFamilyProject").field(arg0).finish(),
            Self::LoadAnalysisGroupProject(arg0) => f
                .debug_tuple("LoadAnalysisGroupProject")
                .field(arg0)
                .finish(),
            Self::UpdateCurrentSearch(arg0) => {
                f.debug_tuple("UpdateCurrentSearch").field(arg0).finish()
            }
            Self::ReceiveSearchedVariants(arg0) => f
                .debug_tuple("ReceiveSearchedVariants")
                .field(&arg0.as_ref().map(Vec::len))
                .finish(),
            Self::UpdateSearchedVariantDisplay(arg0) => f
                .debug_tuple("UpdateSearchedVariantDisplay")
                .field(arg0)
                .finish(),
            Self::ReceiveSavedSearches(arg0) => f
                .debug_tuple("ReceiveSavedSearches")
                .field(&arg0.as_ref().map(Map::len))
                .finish(),
            Self::ReceiveData(arg0) => f
                .debug_tuple("ReceiveData")
                .field(&arg0.as_ref().map(Map::len))
                .finish(),
            Self::ResolveSearchDisplay(arg0) => {
                f.debug_tuple("ResolveSearchDisplay").field(arg0).finish()
            }
            Self::FetchSearchedVariants(arg0, arg1) => f
                .debug_tuple("FetchSearchedVariants")
                .field(arg0)
                .field(arg1)
                .finish(),
            Self::LoadedSearchedVariants {
                generation,
                search_hash,
                result,
                ..
            } => f
                .debug_struct("LoadedSearchedVariants")
                .field("generation", generation)
                .field("search_hash", search_hash)
                .field("ok", &result.is_ok())
                .finish(),
            Self::LoadedProjectDetails(arg0, _arg1) => {
                f.debug_tuple("LoadedProjectDetails").field(arg0).finish()
            }
            Self::LoadedParentDetails(arg0, arg1, _arg2) => f
                .debug_tuple("LoadedParentDetails")
                .field(arg0)
                .field(arg1)
                .finish(),
            other => write!(f, "{}", other.name()),
        }
    }
}

pub fn reduce(action: Action, state: &mut Data, environment: &Environment) -> Effect<Action> {
    log::trace!("{action:?}");
    let model = environment.model.clone();
    match action {
        Action::LoadProjectFamiliesContext(descriptor) => match descriptor.resolve() {
            Some(SearchContext::Project(guid)) => Effect::action(Action::LoadProject(guid)),
            Some(SearchContext::Family(guid)) => Effect::action(Action::LoadFamilyProject(guid)),
            Some(SearchContext::AnalysisGroup(guid)) => {
                Effect::action(Action::LoadAnalysisGroupProject(guid))
            }
            Some(SearchContext::SearchHash(search_hash)) => {
                match state.project_families(&search_hash) {
                    // Each load sees the state left behind by the previous one
                    Some(projects) => Effect::merge(
                        projects
                            .into_iter()
                            .map(|guid| Effect::action(Action::LoadProject(guid))),
                    ),
                    None => Effect::merge2(
                        Effect::action(Action::RequestProjectDetails),
                        Effect::future(
                            async move { model.search_context(search_hash).await },
                            Action::LoadedSearchContext,
                        ),
                    ),
                }
            }
            None => Effect::NONE,
        },
        Action::LoadedSearchContext(result) => match result {
            Ok(updates) => Effect::merge2(
                Effect::action(Action::ReceiveData(Ok(updates.clone()))),
                Effect::action(Action::ReceiveSavedSearches(Ok(updates))),
            ),
            Err(e) => Effect::action(Action::ReceiveData(Err(e))),
        },

        Action::LoadSearchedVariants(request) => Effect::merge3(
            Effect::action(Action::UpdateCurrentSearch(Some(
                request.search_hash.clone(),
            ))),
            Effect::action(Action::RequestSearchedVariants),
            Effect::action(Action::ResolveSearchDisplay(request)),
        ),
        Action::ResolveSearchDisplay(request) => {
            let update = request.resolve_display(state);
            Effect::merge2(
                Effect::action(Action::UpdateSearchedVariantDisplay(update)),
                Effect::action(Action::FetchSearchedVariants(request, update)),
            )
        }
        Action::FetchSearchedVariants(request, update) => {
            request.update_query_params.call(update.query_params());

            let search_hash = request.search_hash;
            let search = state.searches_by_hash.get(&search_hash).cloned();
            if search.is_none() {
                log::warn!("No search definition stored for {search_hash}");
            }
            let generation = state.search_generation;
            let body = search.clone();
            let hash = search_hash.clone();
            Effect::future(
                async move {
                    model
                        .search_variants(hash, update.sort, update.page, body)
                        .await
                },
                move |result| Action::LoadedSearchedVariants {
                    generation,
                    search_hash,
                    search,
                    result,
                },
            )
        }
        Action::LoadedSearchedVariants {
            generation,
            search_hash,
            search,
            result,
        } => {
            if generation != state.search_generation {
                log::debug!("Dropping stale results for search {search_hash}");
                return Effect::NONE;
            }
            match result {
                Ok(response) => {
                    let mut effects = vec![
                        Effect::action(Action::ReceiveData(Ok(response.updates))),
                        Effect::action(Action::ReceiveSearchedVariants(Ok(
                            response.searched_variants,
                        ))),
                    ];
                    if let Some(search) = search {
                        effects.push(Effect::action(Action::ReceiveSavedSearches(Ok(
                            searches_by_hash(search_hash, search),
                        ))));
                    }
                    Effect::merge(effects)
                }
                Err(e) => Effect::action(Action::ReceiveSearchedVariants(Err(e))),
            }
        }
        Action::UnloadSearchResults => Effect::merge2(
            Effect::action(Action::UpdateCurrentSearch(None)),
            Effect::action(Action::ReceiveSearchedVariants(Ok(Vec::new()))),
        ),

        Action::LoadSavedSearches => {
            if !state.saved_searches_by_guid.is_empty() {
                return Effect::NONE;
            }
            Effect::merge2(
                Effect::action(Action::RequestSavedSearches),
                Effect::future(
                    async move { model.saved_searches().await },
                    Action::LoadedSavedSearches,
                ),
            )
        }
        Action::LoadedSavedSearches(result) => Effect::action(Action::ReceiveSavedSearches(result)),
        Action::SaveHashedSearch(search_hash, search) => Effect::action(
            Action::ReceiveSavedSearches(Ok(searches_by_hash(search_hash, search))),
        ),
        Action::SaveSearch(search) => Effect::future(
            async move { model.create_saved_search(search).await },
            Action::ReceiveSavedSearches,
        ),
        Action::UpdateSavedSearch(guid, search) => Effect::future(
            async move { model.update_saved_search(guid, search).await },
            Action::ReceiveSavedSearches,
        ),
        Action::DeleteSavedSearch(guid) => Effect::future(
            async move { model.delete_saved_search(guid).await },
            Action::ReceiveSavedSearches,
        ),

        Action::LoadProject(guid) => {
            if state.project_details_requested.contains(&guid) {
                return Effect::NONE;
            }
            state.project_details_requested.insert(guid.clone());
            Effect::merge2(
                Effect::action(Action::RequestProjectDetails),
                Effect::future(
                    async move {
                        let result = model.project_details(guid.clone()).await;
                        (guid, result)
                    },
                    |(guid, result)| Action::LoadedProjectDetails(guid, result),
                ),
            )
        }
        Action::LoadedProjectDetails(guid, result) => {
            if result.is_err() {
                // allow another attempt
                state.project_details_requested.remove(&guid);
            }
            Effect::action(Action::ReceiveData(result))
        }
        Action::LoadFamilyProject(guid) => {
            load_parent_project(ProjectParent::Family, guid, state, environment)
        }
        Action::LoadAnalysisGroupProject(guid) => {
            load_parent_project(ProjectParent::AnalysisGroup, guid, state, environment)
        }
        Action::LoadedParentDetails(parent, guid, result) => {
            let updates = match result {
                Ok(updates) => updates,
                Err(e) => return Effect::action(Action::ReceiveData(Err(e))),
            };
            let project = updates
                .get(parent.collection())
                .and_then(|objects| objects.get(&guid))
                .and_then(|object| object.get("projectGuid"))
                .and_then(Value::as_str)
                .map(str::to_string);
            let receive = Effect::action(Action::ReceiveData(Ok(updates)));
            match project {
                Some(project) => {
                    Effect::merge2(receive, Effect::action(Action::LoadProject(project)))
                }
                None => {
                    log::warn!("No project found for {parent:?} {guid}");
                    receive
                }
            }
        }

        Action::UpdateCurrentSearch(search_hash) => {
            state.current_search_hash = search_hash;
            state.search_generation = state.search_generation.wrapping_add(1);
            Effect::NONE
        }
        Action::RequestSearchedVariants => {
            state.searched_variants_loading.request();
            Effect::NONE
        }
        Action::ReceiveSearchedVariants(result) => {
            match result {
                Ok(variants) => {
                    state.searched_variants = variants;
                    state.searched_variants_loading.receive(None);
                }
                Err(e) => {
                    state.searched_variants = Vec::new();
                    state.searched_variants_loading.receive(Some(e));
                }
            }
            Effect::NONE
        }
        Action::UpdateSearchedVariantDisplay(update) => {
            state.variant_search_display.apply(&update);
            Effect::NONE
        }
        Action::RequestSavedSearches => {
            state.saved_searches_loading.request();
            Effect::NONE
        }
        Action::ReceiveSavedSearches(result) => {
            match result {
                Ok(updates) => {
                    state.merge_saved_searches(&updates);
                    state.saved_searches_loading.receive(None);
                }
                Err(e) => state.saved_searches_loading.receive(Some(e)),
            }
            Effect::NONE
        }
        Action::RequestProjectDetails => {
            state.project_details_loading.request();
            Effect::NONE
        }
        Action::ReceiveData(result) => {
            match result {
                Ok(updates) => {
                    state.merge_entities(&updates);
                    state.project_details_loading.receive(None);
                }
                Err(e) => state.project_details_loading.receive(Some(e)),
            }
            Effect::NONE
        }
    }
}

/// Use the stored `projectGuid` if the family / analysis group is known,
/// otherwise fetch it first
fn load_parent_project(
    parent: ProjectParent,
    guid: String,
    state: &Data,
    environment: &Environment,
) -> Effect<Action> {
    if let Some(project) = state.parent_project(parent.collection(), &guid) {
        return Effect::action(Action::LoadProject(project));
    }
    let model = environment.model.clone();
    Effect::merge2(
        Effect::action(Action::RequestProjectDetails),
        Effect::future(
            async move {
                let result = match parent {
                    ProjectParent::Family => model.family_details(guid.clone()).await,
                    ProjectParent::AnalysisGroup => {
                        model.analysis_group_details(guid.clone()).await
                    }
                };
                (guid, result)
            },
            move |(guid, result)| Action::LoadedParentDetails(parent, guid, result),
        ),
    )
}

fn searches_by_hash(search_hash: String, search: Value) -> EntityUpdates {
    let mut searches = Map::new();
    searches.insert(search_hash, search);
    let mut updates = Map::new();
    updates.insert(SEARCHES_BY_HASH.to_string(), Value::Object(searches));
    updates
}
