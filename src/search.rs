// Activity/Location Search Adapter
// Asks the model for a bounded list of points of interest for a free-text query

use std::sync::Arc;

use reqwest::Url;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::config::GenerationConfig;
use crate::error::{GenerationError, Operation};
use crate::ids::{generate_id, IdPrefix};
use crate::itinerary::strip_code_fence;
use crate::llm::{GenerateRequest, GenerativeModel};
use crate::model::{ActivityCategory, SearchResult, SearchResultItem};
use crate::schema::search_response_schema;

const IMAGE_BASE_URL: &str = "https://source.unsplash.com/400x300/";

pub fn build_search_prompt(query: &str, max_results: usize) -> String {
    format!(
        "You are a travel discovery assistant. Your goal is to find popular and interesting activities, points of interest, and restaurants for a given location.
Return a JSON object containing a 'results' array with up to {} items that strictly follows the provided schema.
Do not include any extra text or markdown formatting.

Search Query:
- Location: \"{}\"

Return JSON only.",
        max_results, query
    )
}

fn parse_search_response(text: &str) -> Result<Vec<SearchResult>, String> {
    let value: Value = serde_json::from_str(strip_code_fence(text)).map_err(|e| e.to_string())?;
    let results: Vec<SearchResult> = match value.get("results") {
        Some(results @ Value::Array(_)) => {
            serde_json::from_value(results.clone()).map_err(|e| e.to_string())?
        }
        Some(_) => return Err("'results' is not an array".to_string()),
        None => return Err("'results' is missing".to_string()),
    };

    if let Some(item) = results
        .iter()
        .find(|r| !ActivityCategory::SEARCHABLE.contains(&r.category))
    {
        return Err(format!(
            "'{}' has category {} which search does not offer",
            item.title,
            item.category.label()
        ));
    }
    Ok(results)
}

/// Stamps an id and a preview image URL on each result.
pub fn attach_presentation(results: Vec<SearchResult>) -> Vec<SearchResultItem> {
    results
        .into_iter()
        .map(|result| SearchResultItem {
            id: generate_id(IdPrefix::Search),
            image_url: image_url_for(&result.title),
            title: result.title,
            description: result.description,
            category: result.category,
        })
        .collect()
}

fn image_url_for(title: &str) -> String {
    match Url::parse(IMAGE_BASE_URL) {
        Ok(mut url) => {
            url.set_query(Some(title));
            url.to_string()
        }
        Err(_) => IMAGE_BASE_URL.to_string(),
    }
}

pub struct ActivitySearch {
    model: Arc<dyn GenerativeModel>,
    config: GenerationConfig,
}

impl ActivitySearch {
    pub fn new(model: Arc<dyn GenerativeModel>, config: GenerationConfig) -> Self {
        Self { model, config }
    }

    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>, GenerationError> {
        let op = Operation::Search;
        let query = query.trim();
        if query.is_empty() {
            return Err(op.invalid_request("Please enter a destination to search for."));
        }

        let max_results = self.config.max_search_results;
        let request = GenerateRequest::json(
            self.config.model.as_str(),
            build_search_prompt(query, max_results),
            self.config.search_temperature,
            search_response_schema(),
        );

        info!(query, "searching activities");
        let text = self.model.generate(request).await.map_err(|e| {
            error!(operation = op.name(), error = %e, "activity search failed");
            op.classify(&e)
        })?;

        let mut results = parse_search_response(&text).map_err(|problem| {
            warn!(operation = op.name(), %problem, "model returned malformed search data");
            op.data()
        })?;
        results.truncate(max_results);

        info!(query, results = results.len(), "activity search finished");
        Ok(results)
    }
}
