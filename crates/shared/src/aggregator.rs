use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use feed_rs::model::Feed;
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{error, info};

use crate::models::NewsItem;
use crate::text::clean_feed_summary;

/// Keywords searched against the Hacker News Algolia API. Only the first
/// `HN_QUERY_KEYWORDS` are queried to bound call volume.
const HN_KEYWORDS: &[&str] = &[
    "artificial intelligence",
    "machine learning",
    "LLM",
    "GPT",
    "Claude",
    "OpenAI",
    "Anthropic",
    "deep learning",
    "neural network",
    "AI",
    "robotics",
    "autonomous",
    "transformer",
    "diffusion",
    "model",
];
const HN_QUERY_KEYWORDS: usize = 6;
const HN_QUERY_DELAY_MS: u64 = 300;

const ARXIV_FEEDS: &[(&str, &str)] = &[
    ("https://rss.arxiv.org/rss/cs.AI", "ArXiv cs.AI"),
    ("https://rss.arxiv.org/rss/cs.LG", "ArXiv cs.LG"),
    ("https://rss.arxiv.org/rss/cs.CL", "ArXiv cs.CL"),
];

/// A general-purpose feed narrowed down by a relevance keyword list.
/// Keywords are lowercase; matching is case-insensitive substring search
/// over title and summary. An empty list keeps every entry.
struct FeedSpec {
    name: &'static str,
    url: &'static str,
    scan_limit: usize,
    limit: usize,
    keywords: &'static [&'static str],
}

const TECHCRUNCH: FeedSpec = FeedSpec {
    name: "TechCrunch AI",
    url: "https://techcrunch.com/feed/",
    scan_limit: 40,
    limit: 15,
    keywords: &[
        "ai", "artificial intelligence", "machine learning", "openai", "anthropic",
        "google deepmind", "llm", "chatgpt", "claude", "gemini", "gpt",
        "deep learning", "neural", "robot", "automation", "generative",
    ],
};

const VERGE: FeedSpec = FeedSpec {
    name: "The Verge AI",
    url: "https://www.theverge.com/rss/index.xml",
    scan_limit: 60,
    limit: 15,
    keywords: &[
        "ai", "artificial intelligence", "openai", "anthropic", "chatgpt",
        "claude", "gemini", "llm", "machine learning", "deep learning",
        "robot", "automation", "generative", "gpt", "neural",
    ],
};

const MIT_TECH_REVIEW: FeedSpec = FeedSpec {
    name: "MIT Tech Review",
    url: "https://www.technologyreview.com/feed/",
    scan_limit: 30,
    limit: 10,
    keywords: &[
        "ai", "artificial intelligence", "machine learning", "deep learning",
        "neural", "llm", "robot", "automation", "generative", "openai",
        "anthropic", "chatgpt", "algorithm",
    ],
};

const VENTUREBEAT: FeedSpec = FeedSpec {
    name: "VentureBeat AI",
    url: "https://venturebeat.com/feed/",
    scan_limit: 40,
    limit: 15,
    keywords: &[
        "ai", "artificial intelligence", "machine learning", "llm", "generative",
        "openai", "anthropic", "deep learning", "neural", "robot", "gpt",
        "chatgpt", "claude", "gemini", "automation",
    ],
};

const WIRED: FeedSpec = FeedSpec {
    name: "Wired AI",
    url: "https://www.wired.com/feed/tag/artificial-intelligence/latest/rss",
    scan_limit: 20,
    limit: 10,
    keywords: &[],
};

#[derive(Deserialize)]
struct AlgoliaResponse {
    #[serde(default)]
    hits: Vec<AlgoliaHit>,
}

#[derive(Deserialize)]
struct AlgoliaHit {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(rename = "objectID")]
    object_id: String,
    #[serde(default)]
    points: i64,
    #[serde(default)]
    num_comments: i64,
    #[serde(default)]
    created_at: String,
}

/// Fetches news from all configured sources and deduplicates the result.
pub struct NewsAggregator {
    client: Client,
}

impl NewsAggregator {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (compatible; NewsBriefing/1.0)")
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Aggregate news from every source, newest `max_age_days` days only.
    ///
    /// Fetchers run independently; one failing source degrades to an empty
    /// list and never aborts the run. Output order is fetcher order, then
    /// per-fetcher encounter order (not recency), and deduplication by
    /// normalized title keeps the first occurrence.
    pub async fn aggregate(&self, max_age_days: i64) -> Vec<NewsItem> {
        info!("Starting news aggregation (last {} days)", max_age_days);

        let fetchers: Vec<(&str, BoxFuture<'_, Result<Vec<NewsItem>>>)> = vec![
            ("Hacker News", self.fetch_hacker_news(max_age_days, 30).boxed()),
            ("ArXiv", self.fetch_arxiv(max_age_days, 20).boxed()),
            ("TechCrunch", self.fetch_keyword_feed(&TECHCRUNCH, max_age_days).boxed()),
            ("The Verge", self.fetch_keyword_feed(&VERGE, max_age_days).boxed()),
            ("MIT Tech Review", self.fetch_keyword_feed(&MIT_TECH_REVIEW, max_age_days).boxed()),
            ("VentureBeat", self.fetch_keyword_feed(&VENTUREBEAT, max_age_days).boxed()),
            ("Wired", self.fetch_keyword_feed(&WIRED, max_age_days).boxed()),
        ];

        let (names, futures): (Vec<_>, Vec<_>) = fetchers.into_iter().unzip();
        let results = join_all(futures).await;

        let mut all_items = Vec::new();
        for (name, result) in names.into_iter().zip(results) {
            match result {
                Ok(items) => all_items.extend(items),
                Err(e) => error!("Fetcher {} failed: {:#}", name, e),
            }
        }

        let unique = dedupe_by_title(all_items);
        info!("Aggregated {} unique stories total", unique.len());
        unique
    }

    /// Top AI/tech stories from the Hacker News Algolia search API.
    async fn fetch_hacker_news(&self, max_age_days: i64, limit: usize) -> Result<Vec<NewsItem>> {
        info!("Fetching Hacker News stories");
        let cutoff_ts = (Utc::now() - Duration::days(max_age_days)).timestamp();

        let mut results = Vec::new();
        let mut seen = HashSet::new();

        for keyword in HN_KEYWORDS.iter().take(HN_QUERY_KEYWORDS) {
            let url = hn_query_url(keyword, cutoff_ts);
            match self.fetch_hn_page(&url).await {
                Ok(response) => {
                    for hit in response.hits {
                        let story_url = match hit.url {
                            Some(ref u) if !u.is_empty() => u.clone(),
                            _ => format!("https://news.ycombinator.com/item?id={}", hit.object_id),
                        };
                        if !seen.insert(story_url.clone()) {
                            continue;
                        }
                        results.push(NewsItem {
                            title: hit.title.trim().to_string(),
                            url: story_url,
                            summary: format!(
                                "HN points: {} | comments: {}",
                                hit.points, hit.num_comments
                            ),
                            published: hit.created_at,
                            source: "Hacker News".to_string(),
                        });
                    }
                }
                Err(e) => error!("HN fetch error for '{}': {:#}", keyword, e),
            }
            tokio::time::sleep(std::time::Duration::from_millis(HN_QUERY_DELAY_MS)).await;
        }

        results.truncate(limit);
        info!("Fetched {} unique HN stories", results.len());
        Ok(results)
    }

    async fn fetch_hn_page(&self, url: &str) -> Result<AlgoliaResponse> {
        let response = self
            .client
            .get(url)
            .timeout(std::time::Duration::from_secs(10))
            .send()
            .await
            .context("Failed to query HN Algolia API")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("HN Algolia API returned error: {}", status);
        }

        response
            .json::<AlgoliaResponse>()
            .await
            .context("Failed to parse HN Algolia response")
    }

    /// Recent AI papers from the ArXiv RSS feeds, URL-deduplicated.
    async fn fetch_arxiv(&self, max_age_days: i64, limit: usize) -> Result<Vec<NewsItem>> {
        info!("Fetching ArXiv papers");
        let mut all_items = Vec::new();
        let mut seen = HashSet::new();

        for (feed_url, label) in ARXIV_FEEDS {
            match self.fetch_feed(feed_url, max_age_days, 15).await {
                Ok(items) => {
                    for mut item in items {
                        if seen.insert(item.url.clone()) {
                            item.source = label.to_string();
                            all_items.push(item);
                        }
                    }
                }
                Err(e) => error!("ArXiv feed {} failed: {:#}", feed_url, e),
            }
        }

        all_items.truncate(limit);
        info!("Fetched {} ArXiv papers", all_items.len());
        Ok(all_items)
    }

    /// Fetch a general feed and keep only keyword-relevant entries.
    async fn fetch_keyword_feed(&self, spec: &FeedSpec, max_age_days: i64) -> Result<Vec<NewsItem>> {
        info!("Fetching {}", spec.name);
        let mut items = self.fetch_feed(spec.url, max_age_days, spec.scan_limit).await?;
        if !spec.keywords.is_empty() {
            items.retain(|item| matches_keywords(item, spec.keywords));
        }
        items.truncate(spec.limit);
        info!("Fetched {} {} items", items.len(), spec.name);
        Ok(items)
    }

    /// Fetch and parse one RSS/Atom feed into recent news items.
    async fn fetch_feed(&self, url: &str, max_age_days: i64, limit: usize) -> Result<Vec<NewsItem>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch feed {}", url))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Feed {} returned error: {}", url, status);
        }

        let body = response
            .bytes()
            .await
            .context("Failed to read feed body")?;
        let feed = feed_rs::parser::parse(body.as_ref())
            .with_context(|| format!("Failed to parse feed {}", url))?;

        let items = items_from_feed(&feed, url, max_age_days, limit, Utc::now());
        info!("Fetched {} items from {}", items.len(), url);
        Ok(items)
    }
}

fn hn_query_url(keyword: &str, cutoff_ts: i64) -> String {
    format!(
        "https://hn.algolia.com/api/v1/search?query={}&tags=story&numericFilters=created_at_i>{},points>10&hitsPerPage=15",
        urlencoding::encode(keyword),
        cutoff_ts
    )
}

/// Convert parsed feed entries into news items, dropping entries older than
/// the cutoff. Entries without a publish timestamp are kept. Scans at most
/// `2 * limit` entries and returns at most `limit` items.
fn items_from_feed(
    feed: &Feed,
    feed_url: &str,
    max_age_days: i64,
    limit: usize,
    now: DateTime<Utc>,
) -> Vec<NewsItem> {
    let source = feed
        .title
        .as_ref()
        .map(|t| t.content.clone())
        .unwrap_or_else(|| feed_url.to_string());

    let mut items = Vec::new();
    for entry in feed.entries.iter().take(limit * 2) {
        let published = entry.published.or(entry.updated);
        if let Some(published) = published {
            if age_days(published, now) > max_age_days as f64 {
                continue;
            }
        }
        items.push(NewsItem {
            title: entry
                .title
                .as_ref()
                .map(|t| t.content.trim().to_string())
                .unwrap_or_default(),
            url: entry.links.first().map(|l| l.href.clone()).unwrap_or_default(),
            summary: entry
                .summary
                .as_ref()
                .map(|t| clean_feed_summary(&t.content))
                .unwrap_or_default(),
            published: published.map(|d| d.to_rfc3339()).unwrap_or_default(),
            source: source.clone(),
        });
        if items.len() >= limit {
            break;
        }
    }
    items
}

fn age_days(published: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - published).num_seconds() as f64 / 86_400.0
}

/// Case-insensitive substring match of any keyword against title or summary.
/// Keywords must already be lowercase.
fn matches_keywords(item: &NewsItem, keywords: &[&str]) -> bool {
    let title = item.title.to_lowercase();
    let summary = item.summary.to_lowercase();
    keywords
        .iter()
        .any(|kw| title.contains(kw) || summary.contains(kw))
}

/// Global dedup by normalized title: first occurrence wins, items with an
/// empty normalized title are dropped.
fn dedupe_by_title(items: Vec<NewsItem>) -> Vec<NewsItem> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for item in items {
        let key = item.title.trim().to_lowercase();
        if key.is_empty() {
            continue;
        }
        if seen.insert(key) {
            unique.push(item);
        }
    }
    unique
}
