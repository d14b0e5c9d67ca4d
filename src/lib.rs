mod app;
pub mod components;
pub mod effect;
pub mod environment;
pub mod store;

pub use app::{init_logging, run};
pub use components::search::{
    Action, ProjectParent, QueryParamsUpdater, SearchReducer, SearchRequest, SearchStore,
};
pub use effect::Effect;
pub use environment::storage::{Data, LoadingState};
pub use environment::types::{
    ApiConfig, ContextDescriptor, DisplayUpdate, DisplayUpdates, QueryParams, SearchContext,
    SortKey, VariantSearchDisplay, RECORDS_PER_PAGE,
};
pub use environment::{Environment, Model, Repository};
pub use store::{Reducer, Store};
