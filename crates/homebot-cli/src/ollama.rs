//! Ollama discovery helpers.
//!
//! Pings the configured server's `/api/tags` endpoint before the loop starts
//! so the operator learns early whether the chat model is there.

use std::time::Duration;

use serde::Deserialize;

const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// A single model entry returned by Ollama's `/api/tags` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaModel {
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    models: Vec<OllamaModel>,
}

fn tags_url(base_url: &str) -> String {
    format!("{}/api/tags", base_url.trim_end_matches('/'))
}

/// Ping the Ollama server and return the list of available models.
pub fn fetch_models(base_url: &str) -> Result<Vec<OllamaModel>, String> {
    let url = tags_url(base_url);
    let client = reqwest::blocking::Client::builder()
        .timeout(PROBE_TIMEOUT)
        .build()
        .map_err(|e| format!("Failed to build HTTP client: {}", e))?;
    let response = client
        .get(&url)
        .send()
        .map_err(|e| format!("Ollama unreachable at {}: {}", url, e))?;

    if !response.status().is_success() {
        return Err(format!("Ollama returned HTTP {}", response.status()));
    }

    let tags: TagsResponse = response
        .json()
        .map_err(|e| format!("Failed to parse Ollama response: {}", e))?;

    Ok(tags.models)
}

/// `true` if `wanted` is among `models`.  A bare name such as `llama3`
/// matches any tag of it (`llama3:latest`, `llama3:8b`).
pub fn model_available(models: &[OllamaModel], wanted: &str) -> bool {
    models.iter().any(|m| {
        m.name == wanted
            || m.name
                .strip_prefix(wanted)
                .is_some_and(|rest| rest.starts_with(':'))
    })
}
