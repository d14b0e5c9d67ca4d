mod reducer;

pub use reducer::{reduce, Action, ProjectParent, QueryParamsUpdater, SearchRequest};

use serde_json::Value;

use crate::effect::Effect;
use crate::environment::storage::Data;
use crate::environment::types::ContextDescriptor;
use crate::environment::Environment;
use crate::store::{Reducer, Store};

pub struct SearchReducer;

impl Reducer for SearchReducer {
    type Action = Action;

    type State = Data;

    type Environment = Environment;

    fn reduce(
        action: Self::Action,
        state: &mut Self::State,
        environment: &Self::Environment,
    ) -> Effect<Self::Action> {
        reducer::reduce(action, state, environment)
    }
}

pub type SearchStore = Store<SearchReducer>;

impl Store<SearchReducer> {
    pub fn load_project_families_context(&mut self, descriptor: ContextDescriptor) {
        self.send(Action::LoadProjectFamiliesContext(descriptor));
    }

    pub fn load_searched_variants(&mut self, request: SearchRequest) {
        self.send(Action::LoadSearchedVariants(request));
    }

    pub fn unload_search_results(&mut self) {
        self.send(Action::UnloadSearchResults);
    }

    pub fn load_saved_searches(&mut self) {
        self.send(Action::LoadSavedSearches);
    }

    pub fn save_hashed_search(&mut self, search_hash: impl Into<String>, search: Value) {
        self.send(Action::SaveHashedSearch(search_hash.into(), search));
    }

    pub fn save_search(&mut self, search: Value) {
        self.send(Action::SaveSearch(search));
    }

    pub fn update_saved_search(&mut self, guid: impl Into<String>, search: Value) {
        self.send(Action::UpdateSavedSearch(guid.into(), search));
    }

    pub fn delete_saved_search(&mut self, guid: impl Into<String>) {
        self.send(Action::DeleteSavedSearch(guid.into()));
    }

    pub fn load_project(&mut self, project_guid: impl Into<String>) {
        self.send(Action::LoadProject(project_guid.into()));
    }
}
