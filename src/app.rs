use crate::components::search::{QueryParamsUpdater, SearchRequest, SearchStore};
use crate::environment::storage::Data;
use crate::environment::types::{ContextDescriptor, QueryParams};
use crate::environment::{Environment, Repository};

const USAGE: &str = "usage: variant-search <search-hash> [query-string]";

pub fn init_logging() {
    use env_logger::Env;
    use std::io::Write;
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "{}:{} {} [{}] - {}",
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .target(env_logger::Target::Stderr)
        .try_init();
}

/// Resolve the context of a search hash, run the search and print the
/// variants as json
pub fn run() -> Result<(), String> {
    init_logging();

    let mut args = std::env::args().skip(1);
    let Some(search_hash) = args.next() else {
        return Err(USAGE.to_string());
    };
    let query_params = args.next().map(|query| QueryParams::parse(&query));

    let environment = Environment::from_repository(Repository::new())?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Could not start runtime: {e:?}"))?;

    runtime.block_on(async move {
        let mut store = SearchStore::new(Data::default(), environment);
        store.load_project_families_context(ContextDescriptor {
            search_hash: Some(search_hash.clone()),
            ..Default::default()
        });
        store.settle().await;

        store.load_searched_variants(SearchRequest {
            query_params,
            update_query_params: QueryParamsUpdater::new(|params| {
                log::info!("Search url ?{}", params.to_query_string())
            }),
            ..SearchRequest::new(search_hash)
        });
        store.settle().await;

        let state = store.state();
        if let Some(e) = &state.searched_variants_loading.error {
            return Err(e.clone());
        }
        log::info!(
            "{} variants, page {} sorted by {}",
            state.searched_variants.len(),
            state.variant_search_display.page,
            state.variant_search_display.sort
        );
        let output = serde_json::to_string_pretty(&state.searched_variants)
            .map_err(|e| format!("Could not encode variants: {e:?}"))?;
        println!("{output}");
        Ok(())
    })
}
