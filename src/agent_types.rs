//! Agent types classified by the Known Agents API.

pub const AI_ASSISTANT: &str = "AI Assistant";
pub const AI_DATA_SCRAPER: &str = "AI Data Scraper";
pub const AI_SEARCH_CRAWLER: &str = "AI Search Crawler";
pub const ARCHIVER: &str = "Archiver";
pub const DEVELOPER_HELPER: &str = "Developer Helper";
pub const FETCHER: &str = "Fetcher";
pub const HEADLESS_BROWSER: &str = "Headless Browser";
pub const INTELLIGENCE_GATHERER: &str = "Intelligence Gatherer";
pub const SCRAPER: &str = "Scraper";
pub const SEARCH_ENGINE_CRAWLER: &str = "Search Engine Crawler";
pub const SEO_CRAWLER: &str = "SEO Crawler";
pub const UNCATEGORIZED: &str = "Uncategorized";
pub const UNDOCUMENTED_AI_AGENT: &str = "Undocumented AI Agent";

/// Every documented agent type, in the order `agent_types *` expands to.
pub const ALL_AGENT_TYPES: [&str; 13] = [
    AI_ASSISTANT,
    AI_DATA_SCRAPER,
    AI_SEARCH_CRAWLER,
    ARCHIVER,
    DEVELOPER_HELPER,
    FETCHER,
    HEADLESS_BROWSER,
    INTELLIGENCE_GATHERER,
    SCRAPER,
    SEARCH_ENGINE_CRAWLER,
    SEO_CRAWLER,
    UNCATEGORIZED,
    UNDOCUMENTED_AI_AGENT,
];

/// Token that expands to [`ALL_AGENT_TYPES`].
pub const WILDCARD: &str = "*";

pub fn is_known(label: &str) -> bool {
    ALL_AGENT_TYPES.contains(&label)
}

pub fn all() -> Vec<String> {
    ALL_AGENT_TYPES.iter().map(|s| s.to_string()).collect()
}
