use chrono::Utc;
use log::{debug, info, warn};
use scraper::{Html, Selector};
use url::Url;

use crate::browser::{Locator, Session};
use crate::config::Config;
use crate::extractor::collapsed_text;
use crate::pagination::harvest_sub_court;
use crate::records::{
    absolutize, CaseRecord, CourtMetadata, CourtResult, CourtTarget, SubCourt,
};
use crate::discovery;
use crate::storage::sanitize_filename;

/// Initial submit control on a court landing page.
const SEARCH_SUBMIT_LOCATORS: &[Locator] = &[Locator::Css("button[type='submit'].btn-success")];

/// Per-sub-court search control; id first, visible text as fallback.
const SEARCH_BUTTON_LOCATORS: &[Locator] =
    &[Locator::Css("#btnSearch"), Locator::ButtonText("search")];

/// Sub-court dropdown; the portal's id first, any select as fallback.
const SUB_COURT_SELECTORS: &[&str] = &["select#ddlCourt", "select"];

const SELECT_FAILED_NOTE: &str = "Could not select sub-court; needs manual handling.";
const JS_ONLY_NOTE: &str =
    "Sub-court results appear via JS/AJAX and were not available as static HTML.";

/// Drives one whole portal run: scope discovery once, then per-court
/// sub-court enumeration and pagination. Owns nothing but borrows the
/// single sequential browsing session.
pub struct CourtScraper<'a> {
    session: &'a mut dyn Session,
    config: &'a Config,
    base: Url,
}

impl<'a> CourtScraper<'a> {
    pub fn new(session: &'a mut dyn Session, config: &'a Config) -> Result<Self, url::ParseError> {
        let base = Url::parse(&config.base_url)?;
        Ok(CourtScraper {
            session,
            config,
            base,
        })
    }

    /// Open the landing page and enumerate the court cards.
    pub fn discover_courts(&mut self) -> Result<Vec<CourtTarget>, crate::browser::SessionError> {
        self.session.navigate(self.base.as_str())?;
        self.session.settle(self.config.nav_settle);
        let markup = self.session.markup()?;
        Ok(discovery::discover_courts(&markup, &self.base))
    }

    /// Scrape one court end to end. Never fails: a navigation failure is
    /// recorded in the metadata and yields an empty case list, so every
    /// selected court still produces an output artifact.
    pub fn scrape_court(&mut self, court: &CourtTarget) -> CourtResult {
        info!("Processing court: {} (href={})", court.name, court.href);
        let url = absolutize(&self.base, &court.href);

        if let Err(e) = self.session.navigate(&url) {
            warn!("Could not navigate to court page for {}: {}", court.name, e);
            return CourtResult {
                metadata: self.metadata(
                    &court.name,
                    &url,
                    format!("Failed to open court: {}", e),
                ),
                cases: Vec::new(),
            };
        }
        self.session.settle(self.config.nav_settle);

        // Best effort: the cases table only renders after the submit
        // button fires. Its absence degrades to parsing the page as-is.
        if self.session.click_first(SEARCH_SUBMIT_LOCATORS) {
            self.session.settle(self.config.nav_settle);
        } else {
            warn!("Could not find or click search button for {}.", court.name);
        }

        let markup = self.session.markup().unwrap_or_else(|e| {
            warn!("Could not read court page for {}: {}", court.name, e);
            String::new()
        });
        let sub_courts = enumerate_sub_courts(&markup);

        let mut cases: Vec<CaseRecord> = Vec::new();
        let mut sr = 1u32;

        if sub_courts.is_empty() {
            info!("No sub-court select found; parsing page table directly.");
            let harvest = harvest_sub_court(
                self.session,
                self.config,
                &self.base,
                &court.name,
                None,
                sr,
            );
            cases.extend(harvest.cases);
        } else {
            for sub in &sub_courts {
                info!(" Sub-court: {} (value={})", sub.label, sub.value);
                // The dropdown is re-rendered between searches, so the
                // control is re-acquired on every selection.
                if !self
                    .session
                    .select_option(SUB_COURT_SELECTORS, &sub.label, &sub.value)
                {
                    warn!("Couldn't select sub-court {}; skipping.", sub.label);
                    cases.push(CaseRecord::placeholder(
                        sr,
                        &court.name,
                        &sub.label,
                        SELECT_FAILED_NOTE,
                    ));
                    sr += 1;
                    continue;
                }
                self.session.settle(self.config.interaction_settle);

                if !self.session.click_first(SEARCH_BUTTON_LOCATORS) {
                    debug!("Search button not found; parsing page as-is.");
                }

                let harvest = harvest_sub_court(
                    self.session,
                    self.config,
                    &self.base,
                    &court.name,
                    Some(&sub.label),
                    sr,
                );
                if harvest.cases.is_empty() {
                    info!(
                        "  No static cases found for sub-court {}; likely rendered via JS.",
                        sub.label
                    );
                    cases.push(CaseRecord::placeholder(
                        sr,
                        &court.name,
                        &sub.label,
                        JS_ONLY_NOTE,
                    ));
                    sr += 1;
                } else {
                    sr = harvest.next_sr;
                    cases.extend(harvest.cases);
                }
            }
        }

        CourtResult {
            metadata: self.metadata(
                &court.name,
                self.base.as_str(),
                format!("Cases extracted for court: {}", court.name),
            ),
            cases,
        }
    }

    fn metadata(&self, court_name: &str, url: &str, description: String) -> CourtMetadata {
        CourtMetadata {
            file_name: format!(
                "{}_{}.json",
                self.config.file_prefix,
                sanitize_filename(court_name)
            ),
            created_on: Utc::now().format("%Y-%m-%d").to_string(),
            source: self.config.source_name.clone(),
            url: url.to_string(),
            description,
        }
    }
}

/// Read the sub-court dropdown options out of the page markup,
/// excluding empty and "Select..." placeholder entries.
pub fn enumerate_sub_courts(markup: &str) -> Vec<SubCourt> {
    let document = Html::parse_document(markup);
    let option_sel = Selector::parse("option").unwrap();

    let select = SUB_COURT_SELECTORS.iter().find_map(|css| {
        let sel = Selector::parse(css).unwrap();
        document.select(&sel).next()
    });
    let Some(select) = select else {
        return Vec::new();
    };

    select
        .select(&option_sel)
        .filter_map(|opt| {
            let label = collapsed_text(&opt);
            if label.is_empty() || label.contains("Select") {
                return None;
            }
            let value = opt.value().attr("value").unwrap_or("").to_string();
            Some(SubCourt { label, value })
        })
        .collect()
}
