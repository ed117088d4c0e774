use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::models::{Briefing, Category, CategorySection, CategoryStory, NewsItem, TopStory};
use crate::text::truncate_chars;

const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Prompt input caps.
const MAX_PROMPT_ITEMS: usize = 60;
const PROMPT_SUMMARY_CHARS: usize = 300;

/// Fallback briefing shape when the model response cannot be parsed.
const FALLBACK_TOP_STORIES: usize = 5;
const FALLBACK_CATEGORY_ITEMS: usize = 40;
const FALLBACK_REASON_CHARS: usize = 150;

const EMPTY_SUMMARY: &str = "No news items were available this week.";
const MISSING_SUMMARY: &str = "No summary available.";
const FALLBACK_SUMMARY: &str = "This week's briefing contains the latest AI and tech news. \
    Automated summarization encountered an issue; stories are listed below.";

#[derive(Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<Content>,
}

#[derive(Deserialize)]
struct Content {
    text: String,
}

/// Sends aggregated items to the Claude API and turns the response into a
/// structurally valid [`Briefing`], no matter what comes back.
pub struct BriefingSummarizer {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
}

impl BriefingSummarizer {
    pub fn new(api_key: String, model: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            api_url: DEFAULT_API_URL.to_string(),
            model,
        })
    }

    /// Override the API endpoint (used by tests).
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Categorize and summarize the given items.
    ///
    /// Transport and API-level failures are returned as errors; an
    /// unparsable response body degrades to the deterministic fallback
    /// briefing instead.
    pub async fn summarize(&self, items: &[NewsItem]) -> Result<Briefing> {
        if items.is_empty() {
            warn!("No news items to summarize");
            return Ok(Briefing::empty(EMPTY_SUMMARY));
        }

        let prompt = build_prompt(items);

        info!("Calling Claude API ({}) to analyze {} stories", self.model, items.len());
        let request = ClaudeRequest {
            model: self.model.clone(),
            max_tokens: 4096,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Claude API")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            anyhow::bail!("Claude API error: {} - {}", status, error_text);
        }

        let claude_response = response
            .json::<ClaudeResponse>()
            .await
            .context("Failed to parse Claude API response")?;

        let raw = claude_response
            .content
            .first()
            .map(|c| c.text.trim())
            .unwrap_or("");
        debug!("Claude raw response length: {} chars", raw.len());

        match serde_json::from_str::<Value>(strip_code_fences(raw)) {
            Ok(value) => {
                info!("Successfully parsed Claude response");
                Ok(normalize_briefing(value))
            }
            Err(e) => {
                error!("Failed to parse Claude JSON response: {}", e);
                Ok(fallback_briefing(items))
            }
        }
    }
}

/// Format news items into a compact text block for the prompt.
fn build_news_text(items: &[NewsItem]) -> String {
    items
        .iter()
        .take(MAX_PROMPT_ITEMS)
        .enumerate()
        .map(|(i, item)| {
            format!(
                "[{}] SOURCE: {}\n    TITLE: {}\n    URL: {}\n    SUMMARY: {}\n",
                i + 1,
                item.source,
                item.title,
                item.url,
                truncate_chars(&item.summary, PROMPT_SUMMARY_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn build_prompt(items: &[NewsItem]) -> String {
    let news_text = build_news_text(items);
    let categories_list = Category::all()
        .iter()
        .map(|c| format!("- {}: {}", c.name(), c.description()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are an expert AI/tech journalist creating a weekly briefing.

Below are {count} news items from the past 7 days across AI and technology.

NEWS ITEMS:
{news_text}

TASK:
Analyze these stories and return a JSON object with EXACTLY this structure:

{{
  "executive_summary": "A 3-5 sentence executive summary of the most important AI and tech developments this week. Be concrete and specific.",
  "top_stories": [
    {{
      "title": "exact title from the list",
      "url": "exact url from the list",
      "source": "exact source from the list",
      "reason": "1-2 sentences explaining why this is a top story"
    }}
  ],
  "categories": {{
    "Research Breakthroughs": [
      {{
        "title": "exact title",
        "url": "exact url",
        "source": "exact source",
        "summary": "2-3 sentence description of what this is about and why it matters"
      }}
    ],
    "Product Launches & Updates": [],
    "Industry News & Business": [],
    "Policy, Safety & Ethics": [],
    "Open Source & Developer Tools": [],
    "Robotics & Autonomous Systems": [],
    "Other AI & Tech News": []
  }}
}}

RULES:
- top_stories: pick the 5 most important/impactful stories across all categories
- Place EVERY story into exactly ONE category; do not omit stories
- Summaries must be original, informative, and specific - avoid vague language
- Return ONLY valid JSON, no markdown fences, no extra text

Categories:
{categories_list}
"#,
        count = items.len(),
        news_text = news_text,
        categories_list = categories_list,
    )
}

/// Remove an optional markdown code fence (```json ... ```) around a model
/// response before it is parsed.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = match rest.rfind("```") {
        Some(idx) => &rest[..idx],
        None => rest,
    };
    rest.trim()
}

/// Coerce a parsed response into a briefing: default missing fields, force
/// all fixed categories to exist (canonical order first, unknown extras
/// after), and fill in per-story defaults.
fn normalize_briefing(value: Value) -> Briefing {
    let executive_summary = value
        .get("executive_summary")
        .and_then(Value::as_str)
        .unwrap_or(MISSING_SUMMARY)
        .to_string();

    let top_stories = value
        .get("top_stories")
        .and_then(Value::as_array)
        .map(|stories| stories.iter().map(top_story_from_value).collect())
        .unwrap_or_default();

    let mut raw_categories = value
        .get("categories")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    let mut categories = Vec::new();
    for category in Category::all() {
        let stories = raw_categories
            .remove(category.name())
            .map(|v| category_stories_from_value(&v))
            .unwrap_or_default();
        categories.push(CategorySection {
            name: category.name().to_string(),
            stories,
        });
    }
    for (name, v) in raw_categories {
        categories.push(CategorySection {
            name,
            stories: category_stories_from_value(&v),
        });
    }

    Briefing {
        executive_summary,
        top_stories,
        categories,
    }
}

fn category_stories_from_value(value: &Value) -> Vec<CategoryStory> {
    value
        .as_array()
        .map(|stories| stories.iter().map(category_story_from_value).collect())
        .unwrap_or_default()
}

fn top_story_from_value(value: &Value) -> TopStory {
    TopStory {
        title: str_field(value, "title", "Untitled"),
        url: str_field(value, "url", "#"),
        source: str_field(value, "source", "Unknown"),
        reason: str_field(value, "reason", ""),
    }
}

fn category_story_from_value(value: &Value) -> CategoryStory {
    CategoryStory {
        title: str_field(value, "title", "Untitled"),
        url: str_field(value, "url", "#"),
        source: str_field(value, "source", "Unknown"),
        summary: str_field(value, "summary", ""),
    }
}

fn str_field(value: &Value, key: &str, default: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

/// Best-effort deterministic briefing used when the model response cannot
/// be parsed: first items go verbatim into the catch-all category, the
/// first few become top stories.
fn fallback_briefing(items: &[NewsItem]) -> Briefing {
    warn!("Using fallback briefing - Claude response could not be parsed");

    let top_stories = items
        .iter()
        .take(FALLBACK_TOP_STORIES)
        .map(|item| TopStory {
            title: item.title.clone(),
            url: item.url.clone(),
            source: item.source.clone(),
            reason: truncate_chars(&item.summary, FALLBACK_REASON_CHARS),
        })
        .collect();

    let catch_all: Vec<CategoryStory> = items
        .iter()
        .take(FALLBACK_CATEGORY_ITEMS)
        .map(|item| CategoryStory {
            title: item.title.clone(),
            url: item.url.clone(),
            source: item.source.clone(),
            summary: item.summary.clone(),
        })
        .collect();

    let mut briefing = Briefing::empty(FALLBACK_SUMMARY);
    briefing.top_stories = top_stories;
    if let Some(section) = briefing
        .categories
        .iter_mut()
        .find(|c| c.name == Category::Other.name())
    {
        section.stories = catch_all;
    }
    briefing
}
