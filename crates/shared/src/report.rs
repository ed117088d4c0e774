use chrono::{DateTime, Duration, Utc};
use std::path::PathBuf;

use crate::models::{Briefing, CategorySection, CategoryStory, TopStory};
use crate::text::{escape_html, truncate_chars, truncate_with_ellipsis};

/// Card text caps. Titles and summaries get an ellipsis exactly when they
/// were shortened.
const CARD_TITLE_CHARS: usize = 120;
const CARD_SUMMARY_CHARS: usize = 280;
const CARD_BADGE_CHARS: usize = 22;
const TOP_BADGE_CHARS: usize = 20;
const TOP_STORY_LIMIT: usize = 5;

/// A text color over a badge/background color, both CSS hex values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorPair {
    pub text: &'static str,
    pub background: &'static str,
}

/// One row of the sources & methodology table.
#[derive(Debug, Clone, Copy)]
pub struct SourceInfo {
    pub name: &'static str,
    pub url: &'static str,
    pub description: &'static str,
}

const CATEGORY_GRADIENTS: &[(&str, (&str, &str))] = &[
    ("Research Breakthroughs", ("#7C3AED", "#A78BFA")),
    ("Product Launches & Updates", ("#0369A1", "#38BDF8")),
    ("Industry News & Business", ("#065F46", "#34D399")),
    ("Policy, Safety & Ethics", ("#9D174D", "#F472B6")),
    ("Open Source & Developer Tools", ("#92400E", "#FBBF24")),
    ("Robotics & Autonomous Systems", ("#1E40AF", "#60A5FA")),
    ("Other AI & Tech News", ("#374151", "#9CA3AF")),
];

const CATEGORY_ICONS: &[(&str, &str)] = &[
    ("Research Breakthroughs", "🔬"),
    ("Product Launches & Updates", "🚀"),
    ("Industry News & Business", "💼"),
    ("Policy, Safety & Ethics", "⚖️"),
    ("Open Source & Developer Tools", "🛠️"),
    ("Robotics & Autonomous Systems", "🤖"),
    ("Other AI & Tech News", "📰"),
];

const SOURCE_COLORS: &[(&str, ColorPair)] = &[
    ("Hacker News", ColorPair { text: "#FF6600", background: "#FFE5CC" }),
    ("ArXiv", ColorPair { text: "#0066CC", background: "#CCE5FF" }),
    ("ArXiv cs.AI", ColorPair { text: "#0066CC", background: "#CCE5FF" }),
    ("ArXiv cs.LG", ColorPair { text: "#0066CC", background: "#CCE5FF" }),
    ("ArXiv cs.CL", ColorPair { text: "#0066CC", background: "#CCE5FF" }),
    ("TechCrunch", ColorPair { text: "#00CC66", background: "#CCFFDD" }),
    ("The Verge", ColorPair { text: "#9966CC", background: "#E5CCFF" }),
    ("MIT Technology Review", ColorPair { text: "#CC3333", background: "#FFCCCC" }),
    ("VentureBeat", ColorPair { text: "#FFAA00", background: "#FFF5CC" }),
    ("Wired", ColorPair { text: "#0099AA", background: "#CCFFFF" }),
];

/// Rank colors for the top-5 cards, cycled by position.
const TOP_STORY_COLORS: &[ColorPair] = &[
    ColorPair { text: "#B45309", background: "#FEF3C7" },
    ColorPair { text: "#4338CA", background: "#EDE9FE" },
    ColorPair { text: "#065F46", background: "#D1FAE5" },
    ColorPair { text: "#C2410C", background: "#FFEDD5" },
    ColorPair { text: "#6B21A8", background: "#F3E8FF" },
];

const SOURCE_TABLE: &[SourceInfo] = &[
    SourceInfo {
        name: "Hacker News",
        url: "https://news.ycombinator.com",
        description: "AI/tech stories via Algolia search API, filtered for relevance",
    },
    SourceInfo {
        name: "ArXiv",
        url: "https://arxiv.org",
        description: "Research papers from cs.AI, cs.LG, cs.CL categories via RSS",
    },
    SourceInfo {
        name: "TechCrunch",
        url: "https://techcrunch.com",
        description: "AI section coverage via RSS feed",
    },
    SourceInfo {
        name: "The Verge",
        url: "https://www.theverge.com",
        description: "AI technology coverage via RSS feed",
    },
    SourceInfo {
        name: "MIT Technology Review",
        url: "https://www.technologyreview.com",
        description: "AI research and analysis via RSS feed",
    },
    SourceInfo {
        name: "VentureBeat",
        url: "https://venturebeat.com",
        description: "AI business and product news via RSS feed",
    },
    SourceInfo {
        name: "Wired",
        url: "https://www.wired.com",
        description: "AI coverage via topic RSS feed",
    },
];

const METHODOLOGY: &str = "Stories are aggregated automatically every Saturday from 7 curated \
    sources covering AI research, technology products, industry news, and policy. Each article \
    is analyzed and summarized by Claude AI (Anthropic), which also categorizes stories into \
    thematic sections and identifies the week's most significant developments. The pipeline \
    runs unattended and requires no manual intervention.";

/// Immutable palette and lookup tables for the report. Every lookup is a
/// total function with an explicit default.
#[derive(Debug, Clone)]
pub struct ReportTheme {
    pub category_gradients: &'static [(&'static str, (&'static str, &'static str))],
    pub category_icons: &'static [(&'static str, &'static str)],
    pub source_colors: &'static [(&'static str, ColorPair)],
    pub top_story_colors: &'static [ColorPair],
    pub default_source_colors: ColorPair,
    pub default_gradient: (&'static str, &'static str),
    pub default_icon: &'static str,
    pub sources: &'static [SourceInfo],
}

impl Default for ReportTheme {
    fn default() -> Self {
        Self {
            category_gradients: CATEGORY_GRADIENTS,
            category_icons: CATEGORY_ICONS,
            source_colors: SOURCE_COLORS,
            top_story_colors: TOP_STORY_COLORS,
            default_source_colors: ColorPair { text: "#374151", background: "#E5E7EB" },
            default_gradient: ("#2D3192", "#1A56DB"),
            default_icon: "📌",
            sources: SOURCE_TABLE,
        }
    }
}

impl ReportTheme {
    pub fn source_colors(&self, source: &str) -> ColorPair {
        self.source_colors
            .iter()
            .find(|(name, _)| *name == source)
            .map(|(_, colors)| *colors)
            .unwrap_or(self.default_source_colors)
    }

    pub fn top_story_colors(&self, rank: usize) -> ColorPair {
        self.top_story_colors[rank % self.top_story_colors.len()]
    }

    pub fn category_gradient(&self, category: &str) -> (&'static str, &'static str) {
        self.category_gradients
            .iter()
            .find(|(name, _)| *name == category)
            .map(|(_, gradient)| *gradient)
            .unwrap_or(self.default_gradient)
    }

    pub fn category_icon(&self, category: &str) -> &'static str {
        self.category_icons
            .iter()
            .find(|(name, _)| *name == category)
            .map(|(_, icon)| *icon)
            .unwrap_or(self.default_icon)
    }
}

const REPORT_CSS: &str = r#"
    * { margin: 0; padding: 0; box-sizing: border-box; }
    body { font-family: Helvetica, Arial, sans-serif; background: #9CA3AF; color: #111827; }
    a { color: #1A56DB; text-decoration: none; }
    .page { width: 8.5in; min-height: 11in; margin: 0 auto 12px auto; padding: 0.75in 0.75in 1in 0.75in; background: #FFFFFF; position: relative; page-break-after: always; }
    @page { size: letter; margin: 0; }
    @media print { body { background: none; } .page { margin: 0; } }
    .page-footer { position: absolute; bottom: 0.35in; left: 0.75in; right: 0.75in; display: flex; justify-content: space-between; border-top: 0.5pt solid #E5E7EB; padding-top: 6px; font-size: 8pt; color: #9CA3AF; }
    .page.cover { background: linear-gradient(160deg, #0D1B2A, #1B0D2A); color: #FFFFFF; text-align: center; padding-top: 2.2in; }
    .cover-title { font-size: 36pt; font-weight: 800; line-height: 1.2; }
    .cover-subtitle { font-size: 15pt; color: #CBD5E1; margin-top: 14px; }
    .cover-stats { display: flex; justify-content: center; gap: 2px; margin-top: 48px; }
    .cover-stat { background: rgba(255, 255, 255, 0.09); border-top: 0.5pt solid rgba(255, 255, 255, 0.19); border-bottom: 0.5pt solid rgba(255, 255, 255, 0.19); padding: 16px 28px; min-width: 1.6in; }
    .cover-stat-num { font-size: 40pt; font-weight: 800; }
    .cover-stat-label { font-size: 11pt; color: #CBD5E1; margin-top: 4px; }
    .cover-footer { font-size: 10pt; color: #94A3B8; margin-top: 1.6in; }
    .section-title { font-size: 20pt; font-weight: 800; color: #111827; margin-bottom: 8px; }
    .rule { height: 2pt; background: #1A56DB; border: none; margin-bottom: 12px; }
    .rule.gold { background: #F59E0B; }
    .toc-row { display: flex; align-items: center; padding: 7px 4px; border-bottom: 0.5pt solid #E5E7EB; font-size: 12pt; }
    .toc-num { width: 36px; color: #94A3B8; }
    .toc-title { flex: 1; font-weight: bold; color: #111827; }
    .toc-page { color: #9CA3AF; }
    .callout { background: #E8F0FE; border-radius: 6px; padding: 14px 16px; font-size: 11.5pt; line-height: 1.65; color: #374151; text-align: justify; }
    .glance { background: #EEF2FF; border-right: 3pt solid #2D3192; padding: 10px 14px; margin-top: 20px; }
    .glance-title { font-size: 12pt; font-weight: bold; color: #2D3192; margin-bottom: 6px; }
    .glance-item { font-size: 10.5pt; color: #374151; line-height: 1.6; }
    .top-card { display: flex; gap: 12px; background: #FAFAFA; border: 0.5pt solid #E2E8F0; border-radius: 6px; padding: 10px 12px; margin-bottom: 8px; }
    .top-rank { width: 44px; height: 44px; border-radius: 8px; font-size: 24pt; font-weight: 800; display: flex; align-items: center; justify-content: center; flex-shrink: 0; }
    .top-content { flex: 1; }
    .top-title { font-size: 14pt; font-weight: bold; margin: 4px 0; }
    .top-reason { font-size: 11pt; color: #374151; line-height: 1.6; text-align: justify; }
    .top-link { font-size: 10pt; margin-top: 4px; }
    .badge { display: inline-block; border-radius: 3px; padding: 3px 6px; font-size: 8pt; font-weight: bold; }
    .category-header { border-radius: 6px; padding: 12px 16px; display: flex; justify-content: space-between; align-items: center; color: #FFFFFF; margin-bottom: 10px; }
    .category-name { font-size: 19pt; font-weight: bold; }
    .category-count { font-size: 11pt; color: #E2E8F0; }
    .card-row { display: flex; gap: 10px; margin-bottom: 8px; }
    .card { flex: 1; background: #FAFAFA; border: 0.5pt solid #E2E8F0; border-radius: 6px; padding: 10px; }
    .card.blank { background: none; border: none; }
    .card-title { font-size: 13pt; font-weight: bold; margin: 4px 0 3px 0; line-height: 1.35; }
    .card-summary { font-size: 10.5pt; color: #374151; line-height: 1.5; text-align: justify; }
    .card-link { font-size: 9.5pt; margin-top: 5px; }
    .source-row { display: flex; gap: 10px; align-items: flex-start; padding: 7px 6px; border-bottom: 0.5pt solid #E5E7EB; }
    .source-badge-cell { width: 1.6in; flex-shrink: 0; }
    .source-url { width: 2.4in; flex-shrink: 0; font-size: 10pt; }
    .source-desc { flex: 1; font-size: 10.5pt; color: #374151; }
    .methodology { background: #F8F9FA; border: 0.5pt solid #E2E8F0; border-radius: 6px; padding: 14px 16px; margin-top: 22px; font-size: 10.5pt; color: #374151; line-height: 1.6; text-align: justify; }
    .generated { font-size: 9pt; color: #9CA3AF; text-align: center; margin-top: 16px; }
"#;

/// Renders a briefing as a single self-contained, print-paginated HTML
/// document: cover, table of contents, executive summary with the top five
/// stories, one page per non-empty category, and a closing sources page.
pub struct ReportGenerator {
    theme: ReportTheme,
}

impl ReportGenerator {
    pub fn new(theme: ReportTheme) -> Self {
        Self { theme }
    }

    /// Default artifact path, derived from the run date.
    pub fn default_path(now: DateTime<Utc>) -> PathBuf {
        PathBuf::from(format!("AI-Tech-Briefing-{}.html", now.format("%Y-%m-%d")))
    }

    pub fn generate(&self, briefing: &Briefing, days: i64, now: DateTime<Utc>) -> String {
        let date_range = date_range_label(now, days);
        let non_empty = briefing.non_empty_categories();

        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
        html.push_str("  <meta charset=\"UTF-8\">\n");
        html.push_str(&format!(
            "  <title>AI &amp; Tech Weekly Briefing — {}</title>\n",
            escape_html(&date_range)
        ));
        html.push_str("  <style>");
        html.push_str(REPORT_CSS);
        html.push_str("  </style>\n</head>\n<body>\n");

        self.push_cover(&mut html, briefing, &date_range, &non_empty);
        self.push_toc(&mut html, &non_empty, now);
        self.push_summary_page(&mut html, briefing, &date_range, &non_empty, now);
        for (index, section) in non_empty.iter().enumerate() {
            self.push_category_page(&mut html, section, 4 + index, now);
        }
        self.push_sources_page(&mut html, 4 + non_empty.len(), now);

        html.push_str("</body>\n</html>");
        html
    }

    fn push_cover(
        &self,
        html: &mut String,
        briefing: &Briefing,
        date_range: &str,
        non_empty: &[&CategorySection],
    ) {
        html.push_str("<div class=\"page cover\">\n");
        html.push_str("  <div class=\"cover-title\">AI &amp; Tech<br>Weekly Briefing</div>\n");
        html.push_str(&format!(
            "  <div class=\"cover-subtitle\">{}</div>\n",
            escape_html(date_range)
        ));
        html.push_str("  <div class=\"cover-stats\">\n");
        for (value, label) in [
            (briefing.total_stories(), "Total Stories"),
            (briefing.distinct_sources(), "Sources"),
            (non_empty.len(), "Categories"),
        ] {
            html.push_str(&format!(
                "    <div class=\"cover-stat\"><div class=\"cover-stat-num\">{}</div><div class=\"cover-stat-label\">{}</div></div>\n",
                value, label
            ));
        }
        html.push_str("  </div>\n");
        html.push_str("  <div class=\"cover-footer\">Curated by Claude AI  •  Automated weekly pipeline</div>\n");
        html.push_str("</div>\n");
    }

    fn push_toc(&self, html: &mut String, non_empty: &[&CategorySection], now: DateTime<Utc>) {
        html.push_str("<div class=\"page toc\">\n");
        html.push_str("  <div class=\"section-title\">Table of Contents</div>\n");
        html.push_str("  <hr class=\"rule\">\n");

        let mut entries: Vec<(String, usize)> = vec![
            ("Executive Summary".to_string(), 3),
            ("Top 5 Stories".to_string(), 3),
        ];
        // One page per non-empty category, starting right after the summary.
        let mut page = 4;
        for section in non_empty {
            entries.push((section.name.clone(), page));
            page += 1;
        }
        entries.push(("Sources & Methodology".to_string(), page));

        for (index, (title, page)) in entries.iter().enumerate() {
            html.push_str(&format!(
                "  <div class=\"toc-row\"><span class=\"toc-num\">{:02}</span><span class=\"toc-title\">{}</span><span class=\"toc-page\">p. {}</span></div>\n",
                index + 1,
                escape_html(title),
                page
            ));
        }
        push_page_footer(html, 2, now);
        html.push_str("</div>\n");
    }

    fn push_summary_page(
        &self,
        html: &mut String,
        briefing: &Briefing,
        date_range: &str,
        non_empty: &[&CategorySection],
        now: DateTime<Utc>,
    ) {
        html.push_str("<div class=\"page summary\">\n");
        html.push_str("  <div class=\"section-title\">📊  Executive Summary</div>\n");
        html.push_str("  <hr class=\"rule\">\n");
        html.push_str(&format!(
            "  <div class=\"callout\">{}</div>\n",
            escape_html(&briefing.executive_summary)
        ));

        html.push_str("  <div class=\"glance\">\n");
        html.push_str("    <div class=\"glance-title\">Week at a Glance</div>\n");
        let glance_items = [
            format!("📅  {}", date_range),
            format!(
                "📰  {} stories aggregated from {} sources",
                briefing.total_stories(),
                briefing.distinct_sources()
            ),
            format!("🗂️  {} active categories covered", non_empty.len()),
            format!(
                "⭐  {} top stories selected by Claude AI",
                briefing.top_stories.len()
            ),
        ];
        for item in &glance_items {
            html.push_str(&format!(
                "    <div class=\"glance-item\">{}</div>\n",
                escape_html(item)
            ));
        }
        html.push_str("  </div>\n");

        html.push_str("  <div class=\"section-title\" style=\"margin-top: 26px;\">⭐  Top 5 Stories of the Week</div>\n");
        html.push_str("  <hr class=\"rule gold\">\n");
        for (rank, story) in briefing.top_stories.iter().take(TOP_STORY_LIMIT).enumerate() {
            self.push_top_story_card(html, story, rank);
        }

        push_page_footer(html, 3, now);
        html.push_str("</div>\n");
    }

    fn push_top_story_card(&self, html: &mut String, story: &TopStory, rank: usize) {
        let rank_colors = self.theme.top_story_colors(rank);
        let source_colors = self.theme.source_colors(&story.source);
        let badge_text = truncate_chars(&story.source, TOP_BADGE_CHARS);

        html.push_str("  <div class=\"top-card\">\n");
        html.push_str(&format!(
            "    <div class=\"top-rank\" style=\"color: {}; background: {};\">{}</div>\n",
            rank_colors.text,
            rank_colors.background,
            rank + 1
        ));
        html.push_str("    <div class=\"top-content\">\n");
        html.push_str(&format!(
            "      <span class=\"badge\" style=\"color: {}; background: {};\">{}</span>\n",
            source_colors.text,
            source_colors.background,
            escape_html(&badge_text)
        ));
        html.push_str(&format!(
            "      <div class=\"top-title\">{}</div>\n",
            escape_html(&truncate_with_ellipsis(&story.title, CARD_TITLE_CHARS))
        ));
        html.push_str(&format!(
            "      <div class=\"top-reason\">{}</div>\n",
            escape_html(&story.reason)
        ));
        html.push_str(&format!(
            "      <div class=\"top-link\"><a href=\"{}\">Read full article →</a></div>\n",
            escape_html(&story.url)
        ));
        html.push_str("    </div>\n  </div>\n");
    }

    fn push_category_page(
        &self,
        html: &mut String,
        section: &CategorySection,
        page: usize,
        now: DateTime<Utc>,
    ) {
        let (gradient_from, gradient_to) = self.theme.category_gradient(&section.name);
        let icon = self.theme.category_icon(&section.name);

        html.push_str("<div class=\"page category\">\n");
        html.push_str(&format!(
            "  <div class=\"category-header\" style=\"background: linear-gradient(90deg, {}, {});\">\n",
            gradient_from, gradient_to
        ));
        html.push_str(&format!(
            "    <span class=\"category-name\">{}  {}</span>\n",
            icon,
            escape_html(&section.name)
        ));
        html.push_str(&format!(
            "    <span class=\"category-count\">{} stories</span>\n",
            section.stories.len()
        ));
        html.push_str("  </div>\n");

        // Cards go alternately into the left and right column, then pair
        // up row by row.
        let mut left = Vec::new();
        let mut right = Vec::new();
        for (index, story) in section.stories.iter().enumerate() {
            if index % 2 == 0 {
                left.push(story);
            } else {
                right.push(story);
            }
        }
        for row in 0..left.len() {
            html.push_str("  <div class=\"card-row\">\n");
            self.push_story_card(html, left[row]);
            match right.get(row) {
                Some(story) => self.push_story_card(html, story),
                None => html.push_str("    <div class=\"card blank\"></div>\n"),
            }
            html.push_str("  </div>\n");
        }

        push_page_footer(html, page, now);
        html.push_str("</div>\n");
    }

    fn push_story_card(&self, html: &mut String, story: &CategoryStory) {
        let source_colors = self.theme.source_colors(&story.source);
        let badge_text = truncate_chars(&story.source, CARD_BADGE_CHARS);

        html.push_str("    <div class=\"card\">\n");
        html.push_str(&format!(
            "      <span class=\"badge\" style=\"color: {}; background: {};\">{}</span>\n",
            source_colors.text,
            source_colors.background,
            escape_html(&badge_text)
        ));
        html.push_str(&format!(
            "      <div class=\"card-title\">{}</div>\n",
            escape_html(&truncate_with_ellipsis(&story.title, CARD_TITLE_CHARS))
        ));
        html.push_str(&format!(
            "      <div class=\"card-summary\">{}</div>\n",
            escape_html(&truncate_with_ellipsis(&story.summary, CARD_SUMMARY_CHARS))
        ));
        html.push_str(&format!(
            "      <div class=\"card-link\"><a href=\"{}\">Read more →</a></div>\n",
            escape_html(&story.url)
        ));
        html.push_str("    </div>\n");
    }

    fn push_sources_page(&self, html: &mut String, page: usize, now: DateTime<Utc>) {
        html.push_str("<div class=\"page sources\">\n");
        html.push_str("  <div class=\"section-title\">📚  Sources &amp; Methodology</div>\n");
        html.push_str("  <hr class=\"rule\">\n");

        for source in self.theme.sources {
            let colors = self.theme.source_colors(source.name);
            html.push_str("  <div class=\"source-row\">\n");
            html.push_str(&format!(
                "    <span class=\"source-badge-cell\"><span class=\"badge\" style=\"color: {}; background: {};\">{}</span></span>\n",
                colors.text,
                colors.background,
                escape_html(source.name)
            ));
            html.push_str(&format!(
                "    <span class=\"source-url\"><a href=\"{url}\">{url}</a></span>\n",
                url = source.url
            ));
            html.push_str(&format!(
                "    <span class=\"source-desc\">{}</span>\n",
                escape_html(source.description)
            ));
            html.push_str("  </div>\n");
        }

        html.push_str(&format!(
            "  <div class=\"methodology\"><b>Methodology</b><br><br>{}</div>\n",
            escape_html(METHODOLOGY)
        ));
        html.push_str(&format!(
            "  <div class=\"generated\">Generated: {}</div>\n",
            now.format("%A, %B %d, %Y at %H:%M UTC")
        ));

        push_page_footer(html, page, now);
        html.push_str("</div>\n");
    }
}

fn push_page_footer(html: &mut String, page: usize, now: DateTime<Utc>) {
    html.push_str(&format!(
        "  <div class=\"page-footer\"><span>AI &amp; Tech Weekly Briefing  •  {}</span><span>— {} —</span><span>Curated by Claude AI</span></div>\n",
        now.format("%B %d, %Y"),
        page
    ));
}

/// Human-readable label for the look-back window ending now.
pub fn date_range_label(now: DateTime<Utc>, days: i64) -> String {
    let start = now - Duration::days(days);
    format!("{} – {}", start.format("%B %d"), now.format("%B %d, %Y"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Briefing;
    use chrono::TimeZone;

    fn story(title: &str, source: &str, summary: &str) -> CategoryStory {
        CategoryStory {
            title: title.to_string(),
            url: "https://example.com/story".to_string(),
            source: source.to_string(),
            summary: summary.to_string(),
        }
    }

    fn sample_briefing() -> Briefing {
        let mut briefing = Briefing::empty("A very busy week in AI.");
        briefing.top_stories = vec![TopStory {
            title: "The big one".to_string(),
            url: "https://example.com/top".to_string(),
            source: "Hacker News".to_string(),
            reason: "Everyone talked about it.".to_string(),
        }];
        briefing.categories[0].stories = vec![
            story("Paper A", "ArXiv cs.AI", "findings"),
            story("Paper B", "ArXiv cs.LG", "more findings"),
            story("Paper C", "ArXiv cs.CL", "even more"),
        ];
        briefing.categories[2].stories = vec![story("Funding news", "TechCrunch", "a round")];
        briefing
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 5, 12, 0, 0).unwrap()
    }

    fn generate(briefing: &Briefing) -> String {
        ReportGenerator::new(ReportTheme::default()).generate(briefing, 7, now())
    }

    // ==================== Theme Tests ====================

    #[test]
    fn test_source_colors_falls_back_to_default() {
        let theme = ReportTheme::default();
        assert_eq!(theme.source_colors("Wired").text, "#0099AA");
        let unknown = theme.source_colors("Some Blog");
        assert_eq!(unknown, theme.default_source_colors);
    }

    #[test]
    fn test_top_story_colors_cycle_by_rank() {
        let theme = ReportTheme::default();
        assert_eq!(theme.top_story_colors(0), theme.top_story_colors(5));
        assert_ne!(theme.top_story_colors(0).text, theme.top_story_colors(1).text);
    }

    #[test]
    fn test_category_gradient_default() {
        let theme = ReportTheme::default();
        assert_eq!(theme.category_gradient("Nonexistent"), ("#2D3192", "#1A56DB"));
    }

    // ==================== Page Inventory Tests ====================

    #[test]
    fn test_report_page_inventory() {
        let html = generate(&sample_briefing());
        // Cover, TOC, summary, 2 category pages, sources.
        assert_eq!(html.matches("<div class=\"page ").count(), 6);
        assert_eq!(html.matches("<div class=\"page category\">").count(), 2);
        assert_eq!(html.matches("<div class=\"page cover\">").count(), 1);
        assert_eq!(html.matches("<div class=\"page sources\">").count(), 1);
    }

    #[test]
    fn test_toc_page_numbers_assume_one_page_per_category() {
        let html = generate(&sample_briefing());
        assert!(html.contains("<span class=\"toc-title\">Executive Summary</span><span class=\"toc-page\">p. 3</span>"));
        assert!(html.contains("<span class=\"toc-title\">Research Breakthroughs</span><span class=\"toc-page\">p. 4</span>"));
        assert!(html.contains("<span class=\"toc-title\">Industry News &amp; Business</span><span class=\"toc-page\">p. 5</span>"));
        assert!(html.contains("<span class=\"toc-title\">Sources &amp; Methodology</span><span class=\"toc-page\">p. 6</span>"));
    }

    #[test]
    fn test_cover_stats() {
        let html = generate(&sample_briefing());
        // 4 stories across 4 distinct sources in 2 non-empty categories.
        assert!(html.contains("<div class=\"cover-stat-num\">4</div><div class=\"cover-stat-label\">Total Stories</div>"));
        assert!(html.contains("<div class=\"cover-stat-num\">4</div><div class=\"cover-stat-label\">Sources</div>"));
        assert!(html.contains("<div class=\"cover-stat-num\">2</div><div class=\"cover-stat-label\">Categories</div>"));
    }

    // ==================== Card Contract Tests ====================

    #[test]
    fn test_card_title_truncated_with_ellipsis() {
        let long_title = "t".repeat(200);
        let mut briefing = Briefing::empty("s");
        briefing.categories[0].stories = vec![story(&long_title, "Wired", "short")];
        let html = generate(&briefing);

        let expected = format!("{}…", "t".repeat(120));
        assert!(html.contains(&expected));
        assert!(!html.contains(&"t".repeat(121)));
    }

    #[test]
    fn test_card_summary_truncated_with_ellipsis() {
        let long_summary = "s".repeat(400);
        let mut briefing = Briefing::empty("s");
        briefing.categories[0].stories = vec![story("Title", "Wired", &long_summary)];
        let html = generate(&briefing);

        let expected = format!("{}…", "s".repeat(280));
        assert!(html.contains(&expected));
        assert!(!html.contains(&"s".repeat(281)));
    }

    #[test]
    fn test_exact_length_title_gets_no_ellipsis() {
        let exact_title = "e".repeat(120);
        let mut briefing = Briefing::empty("s");
        briefing.categories[0].stories = vec![story(&exact_title, "Wired", "short")];
        let html = generate(&briefing);

        assert!(html.contains(&exact_title));
        assert!(!html.contains(&format!("{}…", exact_title)));
    }

    #[test]
    fn test_unknown_source_gets_default_badge_colors() {
        let mut briefing = Briefing::empty("s");
        briefing.categories[0].stories = vec![story("Title", "Some Blog", "short")];
        let html = generate(&briefing);
        assert!(html.contains("color: #374151; background: #E5E7EB;"));
    }

    #[test]
    fn test_cards_pair_into_rows() {
        let mut briefing = Briefing::empty("s");
        briefing.categories[0].stories = vec![
            story("One", "Wired", "a"),
            story("Two", "Wired", "b"),
            story("Three", "Wired", "c"),
        ];
        let html = generate(&briefing);
        // Three cards make two rows, the second padded with a blank cell.
        assert_eq!(html.matches("<div class=\"card-row\">").count(), 2);
        assert_eq!(html.matches("<div class=\"card blank\">").count(), 1);
    }

    #[test]
    fn test_top_story_rank_and_source_colors() {
        let html = generate(&sample_briefing());
        // Rank 1 uses the first cycle color; Hacker News uses its palette.
        assert!(html.contains("color: #B45309; background: #FEF3C7;"));
        assert!(html.contains("color: #FF6600; background: #FFE5CC;"));
    }

    // ==================== Sources Page Tests ====================

    #[test]
    fn test_sources_page_lists_all_seven() {
        let html = generate(&Briefing::empty("s"));
        for source in SOURCE_TABLE {
            assert!(html.contains(source.url));
        }
        assert!(html.contains("Methodology"));
    }

    // ==================== Misc Tests ====================

    #[test]
    fn test_date_range_uses_lookback_window() {
        let label = date_range_label(now(), 14);
        assert_eq!(label, "July 22 – August 05, 2026");
    }

    #[test]
    fn test_default_path_derives_from_date() {
        assert_eq!(
            ReportGenerator::default_path(now()),
            PathBuf::from("AI-Tech-Briefing-2026-08-05.html")
        );
    }

    #[test]
    fn test_report_escapes_story_text() {
        let mut briefing = Briefing::empty("s");
        briefing.categories[0].stories = vec![story("<script>alert(1)</script>", "Wired", "x & y")];
        let html = generate(&briefing);
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
