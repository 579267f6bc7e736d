//! Ollama-backed planner.
//!
//! Talks to a local Ollama server over its blocking HTTP API and asks the
//! model for a JSON plan. Transport and HTTP failures surface as `LLM_ERROR`;
//! responses that do not decode into known capability calls surface as
//! `PLAN_PARSE_ERROR`. Requires the `ollama` feature.

use crate::planner::{PlanResult, Planner};
use serde::{Deserialize, Serialize};
use serde_json::json;
use substrate_core::{CapabilityCall, Result, SubstrateError};
use substrate_session::Snapshot;
use tracing::debug;

/// Configuration for the Ollama planner.
///
/// # Example
///
/// ```rust,ignore
/// use substrate_planner::ollama::{OllamaConfig, OllamaPlanner};
///
/// let planner = OllamaPlanner::new(
///     OllamaConfig::new("llama3.2").with_base_url("http://localhost:11434"),
/// ).unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Model name (e.g. "llama3.2", "mistral").
    pub model: String,
    /// Server base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Sampling temperature; planning wants determinism, so default 0.0.
    #[serde(default)]
    pub temperature: f32,
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

impl OllamaConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self { model: model.into(), base_url: default_base_url(), temperature: 0.0 }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

pub struct OllamaPlanner {
    config: OllamaConfig,
    client: reqwest::blocking::Client,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaPlanner {
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| SubstrateError::Llm(format!("client build failed: {}", e)))?;
        Ok(Self { config, client })
    }

    fn generate(
        &self,
        prompt: &str,
        snapshot: &Snapshot,
        capabilities: &[String],
    ) -> Result<Vec<CapabilityCall>> {
        let full_prompt = build_prompt(prompt, snapshot, capabilities);
        let body = json!({
            "model": self.config.model,
            "prompt": full_prompt,
            "stream": false,
            "format": "json",
            "options": { "temperature": self.config.temperature },
        });

        let url = format!("{}/api/generate", self.config.base_url.trim_end_matches('/'));
        debug!(model = %self.config.model, url = %url, "requesting plan");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| SubstrateError::Llm(format!("request failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(SubstrateError::Llm(format!(
                "ollama returned status {}",
                response.status()
            )));
        }
        let payload: GenerateResponse = response
            .json()
            .map_err(|e| SubstrateError::Llm(format!("response decode failed: {}", e)))?;

        let calls = parse_calls(&payload.response)?;
        for call in &calls {
            if !capabilities.contains(&call.capability) {
                return Err(SubstrateError::PlanParse(format!(
                    "plan references unknown capability '{}'",
                    call.capability
                )));
            }
        }
        Ok(calls)
    }
}

impl Planner for OllamaPlanner {
    fn name(&self) -> &str {
        &self.config.model
    }

    fn plan(&self, prompt: &str, snapshot: &Snapshot, capabilities: &[String]) -> PlanResult {
        match self.generate(prompt, snapshot, capabilities) {
            Ok(calls) => PlanResult::ok(calls),
            Err(err) => PlanResult::fail(err.info()),
        }
    }
}

fn build_prompt(prompt: &str, snapshot: &Snapshot, capabilities: &[String]) -> String {
    let state = serde_json::to_string(&snapshot.state).unwrap_or_else(|_| "{}".to_string());
    format!(
        "You plan work for a session of cooperating agents.\n\
         Available capabilities: {}.\n\
         Session state (version {}): {}\n\
         Task: {}\n\
         Respond with a JSON object of the form \
         {{\"calls\": [{{\"capability\": \"<name>\", \"params\": {{...}}}}]}} \
         using only the available capabilities, and nothing else.",
        capabilities.join(", "),
        snapshot.state_version,
        state,
        prompt,
    )
}

/// Decode a model response into capability calls.
///
/// Accepts a bare JSON array, an object with a `calls` array, and either
/// form wrapped in a markdown code fence.
fn parse_calls(text: &str) -> Result<Vec<CapabilityCall>> {
    let trimmed = strip_code_fence(text.trim());
    let value: serde_json::Value = serde_json::from_str(trimmed)
        .map_err(|e| SubstrateError::PlanParse(format!("plan is not valid JSON: {}", e)))?;

    let calls = match value {
        serde_json::Value::Array(_) => value,
        serde_json::Value::Object(mut object) => object
            .remove("calls")
            .ok_or_else(|| {
                SubstrateError::PlanParse("plan object has no 'calls' array".to_string())
            })?,
        _ => {
            return Err(SubstrateError::PlanParse(
                "plan is neither an array nor an object".to_string(),
            ));
        }
    };
    serde_json::from_value(calls)
        .map_err(|e| SubstrateError::PlanParse(format!("malformed capability call: {}", e)))
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // drop the language tag on the opening fence line
    let rest = rest.split_once('\n').map_or(rest, |(_, body)| body);
    rest.rsplit_once("```").map_or(rest, |(body, _)| body).trim()
}
