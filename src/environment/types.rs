use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// Fixed page size of the variant search results
pub const RECORDS_PER_PAGE: u32 = 100;

// Display Types

#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortKey {
    #[default]
    Xpos,
    Pathogenicity,
    InOmim,
    ProteinConsequence,
    Gnomad,
    Exac,
    #[strum(serialize = "1KG")]
    #[serde(rename = "1KG")]
    OneKg,
    Constraint,
    Cadd,
    Revel,
    Eigen,
    Mpc,
    PrimateAi,
}

impl SortKey {
    /// The form used in display state
    pub fn display_value(&self) -> &'static str {
        self.into()
    }

    /// The form used in query strings and API urls
    pub fn query_value(&self) -> String {
        self.display_value().to_lowercase()
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantSearchDisplay {
    pub sort: SortKey,
    pub page: u32,
    pub records_per_page: u32,
}

impl Default for VariantSearchDisplay {
    fn default() -> Self {
        Self {
            sort: SortKey::default(),
            page: 1,
            records_per_page: RECORDS_PER_PAGE,
        }
    }
}

impl VariantSearchDisplay {
    pub fn apply(&mut self, update: &DisplayUpdate) {
        self.sort = update.sort;
        self.page = update.page;
    }
}

/// A fully resolved sort / page pair
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DisplayUpdate {
    pub sort: SortKey,
    pub page: u32,
}

impl DisplayUpdate {
    pub fn query_params(&self) -> QueryParams {
        QueryParams {
            sort: Some(self.sort),
            page: Some(self.page),
        }
    }
}

/// Sort / page changes requested by the result table
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct DisplayUpdates {
    pub sort: Option<SortKey>,
    pub page: Option<u32>,
}

/// Sort / page as they appear in the page url
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct QueryParams {
    pub sort: Option<SortKey>,
    pub page: Option<u32>,
}

impl QueryParams {
    /// Parse `sort=...&page=...`. A leading `?` is ignored, unknown sort
    /// keys and pages below 1 count as absent.
    pub fn parse(query: &str) -> Self {
        let query = query.trim_start_matches('?');
        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "sort" => match SortKey::from_str(&value) {
                    Ok(sort) => params.sort = Some(sort),
                    Err(_) => log::warn!("Ignoring unknown sort key {value}"),
                },
                "page" => params.page = value.parse().ok().filter(|page| *page > 0),
                _ => (),
            }
        }
        params
    }

    pub fn to_query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        if let Some(sort) = self.sort {
            serializer.append_pair("sort", &sort.query_value());
        }
        if let Some(page) = self.page {
            serializer.append_pair("page", &page.to_string());
        }
        serializer.finish()
    }
}

// Context Types

/// The identifiers a search page can be opened with
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextDescriptor {
    pub project_guid: Option<String>,
    pub family_guid: Option<String>,
    pub analysis_group_guid: Option<String>,
    pub search_hash: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SearchContext {
    Project(String),
    Family(String),
    AnalysisGroup(String),
    SearchHash(String),
}

impl ContextDescriptor {
    /// Project wins over family, family over analysis group and
    /// analysis group over the search hash. Empty ids count as absent.
    pub fn resolve(&self) -> Option<SearchContext> {
        fn given(id: &Option<String>) -> Option<String> {
            id.as_ref().filter(|id| !id.is_empty()).cloned()
        }
        given(&self.project_guid)
            .map(SearchContext::Project)
            .or_else(|| given(&self.family_guid).map(SearchContext::Family))
            .or_else(|| given(&self.analysis_group_guid).map(SearchContext::AnalysisGroup))
            .or_else(|| given(&self.search_hash).map(SearchContext::SearchHash))
    }
}

// Config Types

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub csrf_token: Option<String>,
}

fn default_timeout() -> u64 {
    60
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: default_timeout(),
            csrf_token: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn sort_keys_have_upper_and_lower_forms() {
        assert_eq!(SortKey::InOmim.display_value(), "IN_OMIM");
        assert_eq!(SortKey::InOmim.query_value(), "in_omim");
        assert_eq!(SortKey::OneKg.to_string(), "1KG");
        assert_eq!(SortKey::from_str("protein_consequence"), Ok(SortKey::ProteinConsequence));
        assert_eq!(SortKey::from_str("1kg"), Ok(SortKey::OneKg));
        for key in SortKey::iter() {
            assert_eq!(SortKey::from_str(&key.query_value()), Ok(key));
        }
    }

    #[test]
    fn query_params_parse_and_print() {
        let params = QueryParams::parse("?sort=cadd&page=3&other=1");
        assert_eq!(
            params,
            QueryParams {
                sort: Some(SortKey::Cadd),
                page: Some(3)
            }
        );
        assert_eq!(params.to_query_string(), "sort=cadd&page=3");

        let params = QueryParams::parse("sort=nonsense&page=0");
        assert_eq!(params, QueryParams::default());
        assert_eq!(params.to_query_string(), "");
    }

    #[test]
    fn context_resolution_order() {
        let all = ContextDescriptor {
            project_guid: Some("R1".into()),
            family_guid: Some("F1".into()),
            analysis_group_guid: Some("AG1".into()),
            search_hash: Some("h".into()),
        };
        assert_eq!(all.resolve(), Some(SearchContext::Project("R1".into())));

        let no_project = ContextDescriptor {
            project_guid: Some(String::new()),
            ..all.clone()
        };
        assert_eq!(no_project.resolve(), Some(SearchContext::Family("F1".into())));

        let group_and_hash = ContextDescriptor {
            analysis_group_guid: Some("AG1".into()),
            search_hash: Some("h".into()),
            ..Default::default()
        };
        assert_eq!(
            group_and_hash.resolve(),
            Some(SearchContext::AnalysisGroup("AG1".into()))
        );

        let hash = ContextDescriptor {
            search_hash: Some("h".into()),
            ..Default::default()
        };
        assert_eq!(hash.resolve(), Some(SearchContext::SearchHash("h".into())));
        assert_eq!(ContextDescriptor::default().resolve(), None);
    }

    #[test]
    fn config_defaults_missing_fields() {
        let config: ApiConfig =
            serde_json::from_str(r#"{"base_url": "https://seqr.example.org/"}"#).unwrap();
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.csrf_token, None);
    }
}
