use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use enhancer_contracts::providers::ClientKind;
use enhancer_contracts::runs::{OutputImage, ProcessResult, TokenUsage, OUTPUT_MIME};
use reqwest::blocking::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::EnhancerConfig;
use crate::error::{EnhanceError, Result};
use crate::imaging::{contain_fit_square, reencode_png};
use crate::provider::{ImageProvider, ProcessRequest};
use crate::storage::{mime_for_path, timestamped_filename, OutputStorage};
use crate::usage::{estimate_price_usd, normalize_usage};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const FALLBACK_MIME: &str = "image/jpeg";

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    InlineData { inline_data: InlineBlob<'a> },
    Text { text: &'a str },
}

#[derive(Debug, Serialize)]
struct InlineBlob<'a> {
    mime_type: &'a str,
    data: String,
}

/// Candidate subset this client reads. The API answers in camelCase but
/// snake_case keys are accepted for the same fields, so extraction never
/// has to branch on key style.
#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponsePart {
    #[serde(default, rename = "inlineData", alias = "inline_data")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Default, Deserialize)]
struct InlineData {
    #[serde(default)]
    data: Option<String>,
}

#[derive(Debug, Default)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
    usage: TokenUsage,
}

impl GenerateContentResponse {
    /// Candidates and usage are read independently; a malformed section
    /// reads as empty without affecting the other.
    fn from_value(value: &Value) -> Self {
        let candidates = value
            .get("candidates")
            .and_then(|candidates| serde_json::from_value(candidates.clone()).ok())
            .unwrap_or_default();

        let meta = value
            .get("usageMetadata")
            .or_else(|| value.get("usage_metadata"))
            .filter(|meta| meta.is_object());
        let count = |camel: &str, snake: &str| {
            meta.and_then(|meta| meta.get(camel).or_else(|| meta.get(snake)))
                .and_then(loose_token_count)
        };
        let usage = normalize_usage(
            count("promptTokenCount", "prompt_token_count"),
            count("candidatesTokenCount", "candidates_token_count"),
            count("totalTokenCount", "total_token_count"),
        );

        Self { candidates, usage }
    }

    /// First non-empty inline payload of the first candidate.
    fn first_inline_image(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .filter_map(|part| part.inline_data.as_ref())
            .filter_map(|inline| inline.data.as_deref())
            .find(|data| !data.trim().is_empty())
    }

    fn usage(&self) -> TokenUsage {
        self.usage
    }
}

/// Integer, float (truncated) or numeric string; anything else is missing.
fn loose_token_count(value: &Value) -> Option<u64> {
    let as_count = |number: f64| (number.is_finite() && number >= 0.0).then(|| number as u64);
    match value {
        Value::Number(number) => number.as_u64().or_else(|| number.as_f64().and_then(as_count)),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<u64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(as_count))
        }
        _ => None,
    }
}

pub struct GeminiProvider {
    api_base: String,
    http: HttpClient,
    timeout: Duration,
    storage: OutputStorage,
}

impl GeminiProvider {
    pub fn new(api_base: impl Into<String>, storage: OutputStorage) -> Self {
        Self {
            api_base: api_base.into().trim().trim_end_matches('/').to_string(),
            http: HttpClient::new(),
            timeout: REQUEST_TIMEOUT,
            storage,
        }
    }

    pub fn from_config(config: &EnhancerConfig) -> Self {
        Self::new(
            config.api_base.clone(),
            OutputStorage::new(config.output_dir.clone(), config.site.clone()),
        )
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint_for_model(&self, model: &str) -> String {
        let trimmed = model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }

    fn request_generate_content(
        &self,
        model: &str,
        api_key: &str,
        payload: &GenerateContentRequest<'_>,
    ) -> Result<Value> {
        let endpoint = self.endpoint_for_model(model);
        tracing::debug!(provider = "gemini", %model, "sending generateContent request");

        let response = self
            .http
            .post(&endpoint)
            .query(&[("key", api_key)])
            .timeout(self.timeout)
            .json(payload)
            .send()
            .map_err(|err| {
                // The request URL carries the API key.
                let err = err.without_url();
                tracing::error!(provider = "gemini", error = %err, "generateContent request failed");
                EnhanceError::Transport(err.to_string())
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|err| EnhanceError::Transport(err.without_url().to_string()))?;
        let parsed = serde_json::from_str::<Value>(&body).ok();

        if status >= 400 {
            let message = parsed
                .as_ref()
                .and_then(|value| value.pointer("/error/message"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| body.clone());
            tracing::error!(provider = "gemini", status, "Gemini API error");
            return Err(EnhanceError::Upstream { status, message });
        }

        Ok(match parsed {
            Some(value) if !is_falsy_json(&value) => value,
            _ => json!({ "raw": body }),
        })
    }
}

impl ImageProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn client(&self) -> ClientKind {
        ClientKind::Gemini
    }

    fn process_image(&self, request: &ProcessRequest) -> Result<ProcessResult> {
        let input_path = self.storage.resolve_input_path(&request.input_path);
        let image_bytes = read_input(&input_path)?;
        let mime_type = mime_for_path(&input_path).unwrap_or(FALLBACK_MIME);

        let payload = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![
                    RequestPart::InlineData {
                        inline_data: InlineBlob {
                            mime_type,
                            data: BASE64.encode(&image_bytes),
                        },
                    },
                    RequestPart::Text {
                        text: &request.prompt,
                    },
                ],
            }],
        };

        let raw_response = self.request_generate_content(&request.model, &request.api_key, &payload)?;
        let response = GenerateContentResponse::from_value(&raw_response);

        let Some(encoded) = response.first_inline_image() else {
            return Err(EnhanceError::NoImageReturned {
                response: serde_json::to_string(&raw_response).unwrap_or_default(),
            });
        };

        let compact: String = encoded.chars().filter(|ch| !ch.is_ascii_whitespace()).collect();
        let model_binary = BASE64.decode(compact.as_bytes()).map_err(|_| EnhanceError::Decode)?;
        if model_binary.is_empty() {
            return Err(EnhanceError::Decode);
        }

        let rendered = if request.options.resize {
            contain_fit_square(&model_binary, request.options.size)?
        } else {
            reencode_png(&model_binary)?
        };

        let final_filename =
            timestamped_filename(&input_path, "png", chrono::Utc::now().timestamp());
        let final_path = self.storage.write(&final_filename, &rendered.png)?;
        let final_url = self.storage.public_url(&final_path);
        tracing::info!(
            provider = "gemini",
            path = %final_path.display(),
            width = rendered.width,
            height = rendered.height,
            "saved enhanced image"
        );

        let usage = response.usage();
        Ok(ProcessResult {
            tokens_spent: usage.total_tokens,
            approx_price_usd: estimate_price_usd(usage.prompt_tokens, usage.output_tokens),
            usage,
            data: OutputImage {
                final_url,
                final_path: final_path.to_string_lossy().into_owned(),
                final_filename,
                final_mime: OUTPUT_MIME.to_string(),
                final_width: rendered.width,
                final_height: rendered.height,
            },
        })
    }
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    let not_found = || EnhanceError::FileNotFound {
        path: PathBuf::from(path),
    };
    let is_file = fs::metadata(path).map(|meta| meta.is_file()).unwrap_or(false);
    if !is_file {
        return Err(not_found());
    }
    let bytes = fs::read(path).map_err(|_| not_found())?;
    if bytes.is_empty() {
        return Err(EnhanceError::EmptyInput {
            path: PathBuf::from(path),
        });
    }
    Ok(bytes)
}

fn is_falsy_json(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty() || text == "0",
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}
