use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;

/// A single normalized news item produced by a source fetcher.
///
/// Identity for deduplication is the lowercased, trimmed title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub url: String,
    pub summary: String,
    pub published: String,
    pub source: String,
}

/// The fixed set of briefing categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Research,
    Products,
    Industry,
    Policy,
    OpenSource,
    Robotics,
    Other,
}

impl Category {
    /// All categories, in the order they appear in the briefing.
    pub fn all() -> &'static [Category] {
        &[
            Category::Research,
            Category::Products,
            Category::Industry,
            Category::Policy,
            Category::OpenSource,
            Category::Robotics,
            Category::Other,
        ]
    }

    /// The category name used as a JSON key and section heading.
    pub fn name(&self) -> &'static str {
        match self {
            Category::Research => "Research Breakthroughs",
            Category::Products => "Product Launches & Updates",
            Category::Industry => "Industry News & Business",
            Category::Policy => "Policy, Safety & Ethics",
            Category::OpenSource => "Open Source & Developer Tools",
            Category::Robotics => "Robotics & Autonomous Systems",
            Category::Other => "Other AI & Tech News",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Category::Research => "New papers, model capabilities, benchmarks, scientific discoveries",
            Category::Products => "New AI products, feature releases, version updates",
            Category::Industry => "Funding rounds, acquisitions, partnerships, company news",
            Category::Policy => "Regulations, safety research, alignment, governance",
            Category::OpenSource => "Open-source releases, APIs, frameworks, developer resources",
            Category::Robotics => "Robots, autonomous vehicles, physical AI",
            Category::Other => "General tech news, miscellaneous",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One of the (at most five) highlighted stories of the week.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopStory {
    pub title: String,
    pub url: String,
    pub source: String,
    pub reason: String,
}

/// A story as it appears inside a category section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryStory {
    pub title: String,
    pub url: String,
    pub source: String,
    pub summary: String,
}

/// A named, ordered category section of the briefing.
#[derive(Debug, Clone)]
pub struct CategorySection {
    pub name: String,
    pub stories: Vec<CategoryStory>,
}

/// The complete structured output of one pipeline run.
///
/// `categories` keeps its section order; it serializes as the
/// `{name: [stories]}` map of the external JSON contract.
#[derive(Debug, Clone, Serialize)]
pub struct Briefing {
    pub executive_summary: String,
    pub top_stories: Vec<TopStory>,
    #[serde(serialize_with = "categories_as_map")]
    pub categories: Vec<CategorySection>,
}

fn categories_as_map<S>(sections: &[CategorySection], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(sections.len()))?;
    for section in sections {
        map.serialize_entry(&section.name, &section.stories)?;
    }
    map.end()
}

impl Briefing {
    /// A briefing with no stories and all fixed categories present but empty.
    pub fn empty(executive_summary: impl Into<String>) -> Self {
        Self {
            executive_summary: executive_summary.into(),
            top_stories: Vec::new(),
            categories: Category::all()
                .iter()
                .map(|category| CategorySection {
                    name: category.name().to_string(),
                    stories: Vec::new(),
                })
                .collect(),
        }
    }

    /// Total number of categorized stories.
    pub fn total_stories(&self) -> usize {
        self.categories.iter().map(|c| c.stories.len()).sum()
    }

    /// Number of distinct sources across all categorized stories.
    pub fn distinct_sources(&self) -> usize {
        self.categories
            .iter()
            .flat_map(|c| &c.stories)
            .map(|s| s.source.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn non_empty_categories(&self) -> Vec<&CategorySection> {
        self.categories.iter().filter(|c| !c.stories.is_empty()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story(source: &str) -> CategoryStory {
        CategoryStory {
            title: "A story".to_string(),
            url: "https://example.com".to_string(),
            source: source.to_string(),
            summary: String::new(),
        }
    }

    #[test]
    fn test_category_set_is_fixed() {
        assert_eq!(Category::all().len(), 7);
        assert_eq!(Category::all().last().unwrap().name(), "Other AI & Tech News");
    }

    #[test]
    fn test_empty_briefing_has_all_categories() {
        let briefing = Briefing::empty("nothing this week");
        assert_eq!(briefing.categories.len(), 7);
        assert!(briefing.categories.iter().all(|c| c.stories.is_empty()));
        assert_eq!(briefing.total_stories(), 0);
    }

    #[test]
    fn test_stats_count_category_stories() {
        let mut briefing = Briefing::empty("summary");
        briefing.categories[0].stories = vec![story("Wired"), story("Wired")];
        briefing.categories[2].stories = vec![story("ArXiv cs.AI")];
        assert_eq!(briefing.total_stories(), 3);
        assert_eq!(briefing.distinct_sources(), 2);
        assert_eq!(briefing.non_empty_categories().len(), 2);
    }

    #[test]
    fn test_briefing_serializes_categories_as_map() {
        let mut briefing = Briefing::empty("summary");
        briefing.categories[6].stories = vec![story("Wired")];
        let json = serde_json::to_value(&briefing).unwrap();
        assert!(json["categories"].is_object());
        assert_eq!(json["categories"]["Other AI & Tech News"].as_array().unwrap().len(), 1);
        assert!(json["categories"]["Research Breakthroughs"].as_array().unwrap().is_empty());
    }
}
