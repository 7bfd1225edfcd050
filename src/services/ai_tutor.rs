use async_trait::async_trait;
use lazy_regex::regex;
use reqwest::StatusCode;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{HintReply, PedagogicalAnalysis};
use crate::services::ai_parser::{PedagogicalResponseParser, extract_json_candidate};
use crate::services::hints::HintProvider;
use crate::services::retry::{RetryConfig, RetryDecision, retry_with_policy};

/// Text-in, text-out language model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> AppResult<String>;
    fn name(&self) -> &'static str;
}

/// Analysis and hints on top of a [`LanguageModel`].
#[derive(Clone)]
pub struct Tutor {
    model: Arc<dyn LanguageModel>,
    parser: PedagogicalResponseParser,
}

impl Tutor {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            parser: PedagogicalResponseParser::new(),
        }
    }

    /// Gemini when a key is configured, the offline stub otherwise.
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let model: Arc<dyn LanguageModel> = match &config.gemini_api_key {
            Some(key) => Arc::new(GeminiProvider::new(
                key.clone(),
                config.gemini_model.clone(),
                config.llm_timeout,
                RetryConfig::with_max_attempts(config.llm_max_attempts),
            )?),
            None => {
                log::warn!("⚠️ GOOGLE_AI_API_KEY not set, using simulated responses");
                Arc::new(StubModel)
            }
        };
        log::info!("Tutor model: {}", model.name());
        Ok(Self::new(model))
    }

    pub fn model_name(&self) -> &'static str {
        self.model.name()
    }

    pub async fn analyze(&self, problem_text: &str) -> AppResult<PedagogicalAnalysis> {
        let prompt = build_pedagogical_prompt(problem_text);
        let raw = self.model.generate(&prompt).await?;
        Ok(self.parser.parse(&raw, problem_text))
    }

    pub fn hint_provider(&self) -> Arc<dyn HintProvider> {
        Arc::new(LlmHintProvider::new(self.model.clone()))
    }
}

/// Google Gemini `generateContent`.
pub struct GeminiProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
    retry: RetryConfig,
}

impl GeminiProvider {
    pub fn new(
        api_key: String,
        model: String,
        timeout: Duration,
        retry: RetryConfig,
    ) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("HTTP client: {}", e)))?;
        Ok(Self {
            api_key,
            model,
            client,
            retry,
        })
    }

    async fn generate_once(&self, prompt: &str) -> Result<String, CallError> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            urlencoding::encode(&self.model)
        );
        let request_body = serde_json::json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [{ "text": prompt }]
                }
            ],
            "generationConfig": {
                "temperature": 0.3,
                "maxOutputTokens": 2048
            },
            "safetySettings": [
                { "category": "HARM_CATEGORY_HARASSMENT", "threshold": "BLOCK_NONE" },
                { "category": "HARM_CATEGORY_HATE_SPEECH", "threshold": "BLOCK_NONE" },
                { "category": "HARM_CATEGORY_SEXUALLY_EXPLICIT", "threshold": "BLOCK_NONE" },
                { "category": "HARM_CATEGORY_DANGEROUS_CONTENT", "threshold": "BLOCK_NONE" }
            ]
        });

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request_body)
            .send()
            .await
            .map_err(CallError::Network)?;

        let status = response.status();
        let body: Value = response.json().await.map_err(CallError::Network)?;
        if !status.is_success() {
            let message = body["error"]["message"]
                .as_str()
                .unwrap_or("Gemini request failed")
                .to_string();
            return Err(CallError::Status(status, message));
        }

        Ok(extract_gemini_text(&body))
    }
}

#[async_trait]
impl LanguageModel for GeminiProvider {
    async fn generate(&self, prompt: &str) -> AppResult<String> {
        retry_with_policy(
            &self.retry,
            "Gemini generateContent",
            || self.generate_once(prompt),
            CallError::retry_decision,
        )
        .await
        .map_err(|e| AppError::Transport(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[derive(Debug)]
enum CallError {
    Network(reqwest::Error),
    Status(StatusCode, String),
}

impl CallError {
    /// 429 means the quota is gone; retrying only burns more of it.
    fn retry_decision(&self) -> RetryDecision {
        match self {
            CallError::Network(_) => RetryDecision::Retry,
            CallError::Status(status, _) if status.is_server_error() => RetryDecision::Retry,
            CallError::Status(..) => RetryDecision::Abort,
        }
    }
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallError::Network(e) => write!(f, "{}", e),
            CallError::Status(status, message) => write!(f, "{} ({})", message, status),
        }
    }
}

/// Newline-joined text parts of the first candidate.
pub fn extract_gemini_text(response: &Value) -> String {
    let Some(parts) = response["candidates"][0]["content"]["parts"].as_array() else {
        return String::new();
    };
    parts
        .iter()
        .filter_map(|part| part["text"].as_str())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Deterministic offline model used when no API key is configured.
pub struct StubModel;

#[async_trait]
impl LanguageModel for StubModel {
    async fn generate(&self, prompt: &str) -> AppResult<String> {
        if let Some(caps) = regex!(r"Indiciul nr\. (\d+)").captures(prompt) {
            let number: usize = caps[1].parse().unwrap_or(1);
            return Ok(stub_hint(number));
        }
        Ok(STUB_ANALYSIS.to_string())
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

const STUB_ANALYSIS: &str = r#"```json
{
  "steps": [
    { "title": "Identifică datele", "explanation": "Extrage coeficienții ecuației." },
    { "title": "Alege metoda", "explanation": "Folosește formula pentru ecuații de gradul II." }
  ],
  "finalAnswer": "Răspuns simulativ. Adaugă GOOGLE_AI_API_KEY pentru analiză reală.",
  "caveats": ["GOOGLE_AI_API_KEY lipsește; răspuns simulat."]
}
```"#;

fn stub_hint(number: usize) -> String {
    let (content, is_final) = match number {
        1 => ("Citește cu atenție ce se cere și notează datele cunoscute.", false),
        2 => ("Gândește-te ce formulă leagă datele de necunoscută.", false),
        _ => ("Aplică formula pas cu pas și verifică rezultatul.", true),
    };
    serde_json::json!({ "content": content, "isFinal": is_final }).to_string()
}

pub fn build_pedagogical_prompt(problem_text: &str) -> String {
    format!(
        r#"Ești un tutor de matematică pentru elevi. Explică rezolvarea în pași clari și progresivi.

Problemă:
{}

Răspunde DOAR cu un obiect JSON, fără alt text, cu structura:
{{
  "steps": [{{ "title": "<titlu scurt>", "explanation": "<explicație succintă>" }}],
  "finalAnswer": "<rezultatul>",
  "keyConcepts": ["<concept>"],
  "difficulty": "easy | medium | hard",
  "timeEstimate": "<ex. 5-10 minute>",
  "caveats": ["<observații, dacă există>"]
}}

Cerințe:
1. Fiecare pas are un titlu scurt și o explicație pe înțelesul unui elev
2. Folosește LaTeX pentru expresii matematice ($...$)
3. Scrie în limba română"#,
        problem_text.trim()
    )
}

/// Hint prompt; later steps ask for more specific help.
pub fn build_hint_prompt(problem_text: &str, step_index: usize) -> String {
    let level = match step_index {
        0 => "Oferă un indiciu foarte scurt: doar direcția, fără calcule.",
        1 => "Oferă un indiciu moderat: metoda sau formula potrivită.",
        _ => "Oferă un indiciu puternic: schițează pașii, dar fără rezultatul final.",
    };

    format!(
        r#"Ești un tutor de matematică. Indiciul nr. {} pentru problema de mai jos. {}

Problemă:
{}

Nu da soluția completă. Răspunde DOAR cu JSON:
{{ "content": "<indiciul>", "isFinal": <true dacă elevul are acum tot ce îi trebuie, altfel false> }}"#,
        step_index + 1,
        level,
        problem_text.trim()
    )
}

/// Reads `{content, isFinal}` (fenced or bare); anything else is taken as plain hint text.
pub fn parse_hint_reply(raw: &str) -> AppResult<HintReply> {
    if let Ok(reply) = serde_json::from_str::<HintReply>(extract_json_candidate(raw)) {
        if !reply.content.trim().is_empty() {
            return Ok(HintReply {
                content: reply.content.trim().to_string(),
                ..reply
            });
        }
    }

    let text = raw.trim();
    if text.is_empty() {
        return Err(AppError::Transport("model returned an empty hint".to_string()));
    }
    Ok(HintReply::new(text))
}

/// [`HintProvider`] that asks the language model for each step.
pub struct LlmHintProvider {
    model: Arc<dyn LanguageModel>,
}

impl LlmHintProvider {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl HintProvider for LlmHintProvider {
    async fn generate_hint(&self, problem_text: &str, step_index: usize) -> AppResult<HintReply> {
        let raw = self
            .model
            .generate(&build_hint_prompt(problem_text, step_index))
            .await?;
        parse_hint_reply(&raw)
    }
}
