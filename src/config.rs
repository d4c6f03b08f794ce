use std::env;
use std::path::PathBuf;
use std::time::Duration;

use log::warn;

/// Immutable run configuration, read once at startup and passed by
/// reference everywhere. Nothing in here changes during a run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Portal landing page; also the base for relative hrefs.
    pub base_url: String,
    pub output_dir: PathBuf,
    /// Output files are named `<file_prefix>_<sanitized court name>.json`.
    pub file_prefix: String,
    pub source_name: String,
    pub headless: bool,
    /// Hard bound on pages walked per sub-court, even when a "next"
    /// control keeps appearing.
    pub max_pages_per_sub_court: u32,
    /// Optional allow-list of court names. None means process everything.
    pub court_filter: Option<Vec<String>>,
    pub page_load_timeout: Duration,
    /// How long to wait for a results table before giving up on a page.
    pub table_wait: Duration,
    /// Settle delay after navigation, letting page scripts initialize.
    pub nav_settle: Duration,
    /// Settle delay after dropdown selections and pagination clicks.
    pub interaction_settle: Duration,
    /// Settle delay after opening a detail page in the secondary tab.
    pub detail_settle: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: "https://cases.shc.gov.pk/".to_string(),
            output_dir: PathBuf::from("court_scraper_output"),
            file_prefix: "SindhCourt".to_string(),
            source_name: "Sindh High Court Case Search Portal".to_string(),
            headless: true,
            max_pages_per_sub_court: 50,
            court_filter: None,
            page_load_timeout: Duration::from_secs(30),
            table_wait: Duration::from_secs(8),
            nav_settle: Duration::from_millis(1000),
            interaction_settle: Duration::from_millis(600),
            detail_settle: Duration::from_millis(800),
        }
    }
}

impl Config {
    /// Build a config from environment variables, falling back to the
    /// defaults above. Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Config::default();
        if let Ok(v) = env::var("COURT_SCRAPER_BASE_URL") {
            if !v.trim().is_empty() {
                config.base_url = v;
            }
        }
        if let Ok(v) = env::var("COURT_SCRAPER_OUTPUT_DIR") {
            if !v.trim().is_empty() {
                config.output_dir = PathBuf::from(v);
            }
        }
        if let Ok(v) = env::var("COURT_SCRAPER_HEADLESS") {
            config.headless = !matches!(v.to_lowercase().as_str(), "0" | "false" | "no");
        }
        if let Ok(v) = env::var("COURT_SCRAPER_MAX_PAGES") {
            match v.parse::<u32>() {
                Ok(n) if n > 0 => config.max_pages_per_sub_court = n,
                _ => warn!("Ignoring invalid COURT_SCRAPER_MAX_PAGES value: {}", v),
            }
        }
        if let Ok(v) = env::var("COURT_SCRAPER_COURTS") {
            let list: Vec<String> = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
            if !list.is_empty() {
                config.court_filter = Some(list);
            }
        }
        config
    }

    pub fn selects_court(&self, court_name: &str) -> bool {
        court_allowed(self.court_filter.as_deref(), court_name)
    }
}

/// Allow-list predicate: a court passes if no list is configured, or if
/// some entry and the court name contain each other case-insensitively
/// (either direction).
pub fn court_allowed(allow: Option<&[String]>, court_name: &str) -> bool {
    let Some(allow) = allow else {
        return true;
    };
    let name = court_name.to_lowercase();
    allow.iter().any(|entry| {
        let entry = entry.to_lowercase();
        name.contains(&entry) || entry.contains(&name)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_filter_selects_everything() {
        assert!(court_allowed(None, "Karachi"));
        assert!(court_allowed(None, ""));
    }

    #[test]
    fn filter_matches_substring_both_ways() {
        let allow = vec!["Hyderabad".to_string()];
        assert!(court_allowed(Some(&allow), "Hyderabad Circuit"));
        assert!(court_allowed(Some(&allow), "hyderabad"));
        assert!(!court_allowed(Some(&allow), "Karachi"));

        // Entry longer than the name also matches (reverse containment).
        let allow = vec!["Sukkur Bench at Sukkur".to_string()];
        assert!(court_allowed(Some(&allow), "Sukkur"));
    }

    #[test]
    fn empty_list_never_built_but_rejects() {
        let allow: Vec<String> = Vec::new();
        assert!(!court_allowed(Some(&allow), "Larkana"));
    }
}
