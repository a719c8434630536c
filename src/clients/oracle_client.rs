//! Chat-completions client backing both oracles.
//!
//! Works with OpenAI or any service implementing the chat completions
//! API. Suggestions and scoring use separate models since scoring runs
//! over much larger batches.

use crate::config::OracleSettings;
use crate::rotation::{ScoringCandidate, ScoringOracle, SuggestionOracle, SuggestionRequest};
use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

/// Excluded performers passed to the prompt are capped to keep it short.
const MAX_EXCLUDED_IN_PROMPT: usize = 60;
const SCORING_TEMPERATURE: f32 = 0.3;
const SCORING_MAX_TOKENS: u32 = 4000;

const SUGGESTION_SYSTEM_PROMPT: &str =
    "You are a music expert. Reply only with lines in the requested syntax.";
const SCORING_SYSTEM_PROMPT: &str = "You are a music expert rating tracks against \
     someone's taste profile. Reply only with JSON.";

pub struct ChatOracle {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    suggestion_model: String,
    scoring_model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ScoreEntry {
    #[serde(alias = "index")]
    i: Option<usize>,
    #[serde(alias = "score")]
    s: Option<i64>,
}

impl ChatOracle {
    pub fn new(settings: &OracleSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_sec))
            .build()?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            suggestion_model: settings.suggestion_model.clone(),
            scoring_model: settings.scoring_model.clone(),
        })
    }

    fn complete(
        &self,
        model: &str,
        system: &str,
        user: &str,
        temperature: Option<f32>,
        max_tokens: Option<u32>,
    ) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature,
            max_tokens,
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().context("Chat completion request failed")?;
        if !response.status().is_success() {
            bail!("Chat completion returned status {}", response.status());
        }
        let body: ChatResponse = response
            .json()
            .context("Invalid chat completion response")?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();
        if content.trim().is_empty() {
            bail!("Chat completion returned empty content");
        }
        Ok(content)
    }
}

impl SuggestionOracle for ChatOracle {
    fn suggest(&self, request: &SuggestionRequest) -> Result<Vec<String>> {
        let prompt = build_suggestion_prompt(request);
        debug!(model = %self.suggestion_model, prompt_len = prompt.len(), "Requesting suggestions");
        let content = self.complete(
            &self.suggestion_model,
            SUGGESTION_SYSTEM_PROMPT,
            &prompt,
            None,
            None,
        )?;
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}

impl ScoringOracle for ChatOracle {
    fn score(
        &self,
        candidates: &[ScoringCandidate],
        profile: &str,
    ) -> Result<HashMap<usize, u8>> {
        let prompt = build_scoring_prompt(candidates, profile);
        info!(model = %self.scoring_model, candidates = candidates.len(), "Requesting scores");
        let content = self.complete(
            &self.scoring_model,
            SCORING_SYSTEM_PROMPT,
            &prompt,
            Some(SCORING_TEMPERATURE),
            Some(SCORING_MAX_TOKENS),
        )?;
        parse_scores(&content, candidates.len())
    }
}

fn build_suggestion_prompt(request: &SuggestionRequest) -> String {
    let categories_line = request
        .categories
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {}", i + 1, c))
        .collect::<Vec<_>>()
        .join(", ");
    let total = request.categories.len() * request.per_category;

    let mut prompt = format!(
        "Give {} music suggestions per category, {} lines in total.\n\
         Categories: {}\n",
        request.per_category, total, categories_line
    );
    if !request.forbidden_performers.is_empty() {
        prompt.push_str(&format!(
            "FORBIDDEN performers (per-performer limit reached, DO NOT USE): {}.\n",
            request.forbidden_performers.join(", ")
        ));
    }
    if !request.excluded_performers.is_empty() {
        let shown: Vec<&str> = request
            .excluded_performers
            .iter()
            .take(MAX_EXCLUDED_IN_PROMPT)
            .map(String::as_str)
            .collect();
        prompt.push_str(&format!(
            "Prefer to avoid (already in the playlist): {}.\n",
            shown.join(", ")
        ));
    }
    if !request.rejections.is_empty() {
        prompt.push_str("These earlier suggestions were rejected, do not repeat them:\n");
        for rejection in &request.rejections {
            prompt.push_str(&format!("- {}\n", rejection));
        }
    }
    prompt.push_str(
        "Be creative and do NOT pick the obvious choices. \
         Think of lesser known but real tracks.\n\
         Make sure all performers are different.\n\
         Syntax per line: category | performer | title\n\
         Return ONLY the lines, no extra text.",
    );
    prompt
}

fn build_scoring_prompt(candidates: &[ScoringCandidate], profile: &str) -> String {
    let mut lines = Vec::with_capacity(candidates.len());
    for (i, candidate) in candidates.iter().enumerate() {
        let overlap_text = if candidate.overlap_count > 1 {
            format!(" [{}x in source lists]", candidate.overlap_count)
        } else {
            String::new()
        };
        lines.push(format!(
            "{}. {} - {} ({}){}",
            i, candidate.performer, candidate.title, candidate.album, overlap_text
        ));
    }

    format!(
        "{}\n\n\
         === TASK ===\n\
         Rate the tracks below against the taste profile above.\n\
         Give each track a score from 1-10 (10 = perfect match).\n\n\
         Notes:\n\
         - Focus on genre, style and comparable performers\n\
         - Tracks by performers present in the profile score higher\n\
         - Be critical but fair\n\n\
         Tracks to rate:\n{}\n\n\
         Reply ONLY with a JSON array, no other text:\n\
         [{{\"i\": 0, \"s\": 8}}, {{\"i\": 1, \"s\": 5}}, ...]",
        profile,
        lines.join("\n")
    )
}

/// Parse the scoring response into an index-to-score map.
///
/// Tolerates a code fence around the JSON and `index`/`score` key
/// variants; out-of-range indices are dropped and scores clamped to
/// 1..=10.
fn parse_scores(content: &str, candidate_count: usize) -> Result<HashMap<usize, u8>> {
    let json = strip_code_fence(content);
    let entries: Vec<ScoreEntry> =
        serde_json::from_str(json).context("Unparsable scoring response")?;

    let mut scores = HashMap::new();
    for entry in entries {
        let Some(index) = entry.i else { continue };
        if index >= candidate_count {
            continue;
        }
        let score = entry.s.unwrap_or(5).clamp(1, 10) as u8;
        scores.insert(index, score);
    }
    Ok(scores)
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.split_once('\n').map_or(rest, |(_, body)| body);
    let rest = rest.rsplit_once("```").map_or(rest, |(body, _)| body);
    rest.trim()
}
