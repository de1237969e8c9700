use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::reply::OracleReply;
use crate::schema::{movements_schema, pages_schema, MovementsReply, PagesReply, SchemaSpec};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/responses";
pub const DEFAULT_MODEL: &str = "gpt-5-mini";

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,
    #[error("oracle request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("oracle returned HTTP {status}: {body}")]
    Api { status: u16, body: String },
    #[error("could not decode oracle reply: {detail}; reply was: {raw}")]
    Decode { detail: String, raw: String },
}

/// A rendered page ready to attach to an oracle request.
#[derive(Debug, Clone)]
pub struct PngImage {
    pub page: u32,
    pub bytes: Vec<u8>,
}

impl PngImage {
    pub fn new(page: u32, bytes: Vec<u8>) -> Self {
        Self { page, bytes }
    }

    pub fn data_uri(&self) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(&self.bytes))
    }
}

/// Abstraction over the image-understanding service.
/// Implementations take an instruction plus page images and return
/// schema-shaped JSON replies.
#[async_trait]
pub trait VisionOracle: Send + Sync {
    /// Which of the submitted pages carry a movements table?
    async fn relevant_pages(
        &self,
        instruction: &str,
        images: &[PngImage],
    ) -> Result<PagesReply, OracleError>;

    /// Read statement rows off the submitted pages.
    async fn extract_movements(
        &self,
        instruction: &str,
        images: &[PngImage],
    ) -> Result<MovementsReply, OracleError>;
}

// Shared oracles delegate through the Arc.
#[async_trait]
impl<T: VisionOracle + ?Sized> VisionOracle for std::sync::Arc<T> {
    async fn relevant_pages(
        &self,
        instruction: &str,
        images: &[PngImage],
    ) -> Result<PagesReply, OracleError> {
        (**self).relevant_pages(instruction, images).await
    }

    async fn extract_movements(
        &self,
        instruction: &str,
        images: &[PngImage],
    ) -> Result<MovementsReply, OracleError> {
        (**self).extract_movements(instruction, images).await
    }
}

// ── OpenAI Responses API backend ─────────────────────────────────────────────

/// Client for the OpenAI Responses API with strict JSON-schema output.
///
/// A missing key does not prevent construction; it surfaces as
/// `MissingApiKey` on the first call. The server stays up without
/// credentials and reports the problem per request.
pub struct OpenAiOracle {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl OpenAiOracle {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: Some(api_key.into()),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Build from `OPENAI_API_KEY` (and optionally `OPENAI_MODEL`).
    pub fn from_env() -> Self {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            tracing::warn!("OPENAI_API_KEY is not set; oracle calls will fail");
        }
        let model = std::env::var("OPENAI_MODEL")
            .ok()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Self {
            http: reqwest::Client::new(),
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point at a different endpoint (test servers, proxies).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn structured(
        &self,
        instruction: &str,
        images: &[PngImage],
        schema: &SchemaSpec,
    ) -> Result<OracleReply, OracleError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(OracleError::MissingApiKey)?;
        let payload = build_payload(&self.model, instruction, images, schema);
        tracing::debug!(schema = schema.name, images = images.len(), "oracle request");

        let resp = self
            .http
            .post(&self.base_url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(OracleError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let data: ApiResponse = resp.json().await?;
        Ok(reply_from_response(data))
    }
}

#[async_trait]
impl VisionOracle for OpenAiOracle {
    async fn relevant_pages(
        &self,
        instruction: &str,
        images: &[PngImage],
    ) -> Result<PagesReply, OracleError> {
        self.structured(instruction, images, &pages_schema())
            .await?
            .decode()
    }

    async fn extract_movements(
        &self,
        instruction: &str,
        images: &[PngImage],
    ) -> Result<MovementsReply, OracleError> {
        self.structured(instruction, images, &movements_schema())
            .await?
            .decode()
    }
}

// ── Wire shapes ──────────────────────────────────────────────────────────────

fn build_payload(
    model: &str,
    instruction: &str,
    images: &[PngImage],
    schema: &SchemaSpec,
) -> serde_json::Value {
    let mut content = vec![json!({ "type": "input_text", "text": instruction })];
    for img in images {
        content.push(json!({ "type": "input_image", "image_url": img.data_uri() }));
    }
    json!({
        "model": model,
        "input": [{ "role": "user", "content": content }],
        "text": {
            "format": {
                "type": "json_schema",
                "name": schema.name,
                "schema": schema.schema.clone(),
                "strict": true,
            }
        }
    })
}

/// The slice of the Responses API reply we care about. Unknown fields are
/// ignored on purpose; the API ships plenty.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    output_parsed: Option<serde_json::Value>,
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<OutputPart>,
}

#[derive(Debug, Deserialize)]
struct OutputPart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    output_text: Option<String>,
}

/// Prefer the provider-parsed value; otherwise assemble raw text from
/// `output_text` or the concatenated content fragments.
fn reply_from_response(data: ApiResponse) -> OracleReply {
    if let Some(v) = data.output_parsed {
        return OracleReply::Parsed(v);
    }
    if let Some(t) = data.output_text {
        if !t.trim().is_empty() {
            return OracleReply::RawText(t);
        }
    }
    let joined: String = data
        .output
        .iter()
        .flat_map(|item| item.content.iter())
        .filter_map(|part| {
            part.text
                .as_deref()
                .filter(|t| !t.is_empty())
                .or_else(|| part.output_text.as_deref().filter(|t| !t.is_empty()))
        })
        .collect();
    OracleReply::RawText(joined)
}
