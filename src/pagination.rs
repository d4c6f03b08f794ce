use log::{debug, info, warn};
use url::Url;

use crate::browser::{Locator, Session};
use crate::config::Config;
use crate::detail::resolve_detail;
use crate::extractor::extract_listing;
use crate::records::{absolutize, CaseRecord};

/// Locator strategies for an enabled "next page" control, most specific
/// first. Disabled controls are excluded at the selector level.
const NEXT_LOCATORS: &[Locator] = &[
    Locator::Css(".pagination li.next:not(.disabled) a[data-page]"),
    Locator::Css(".pagination li.next:not(.disabled) a"),
    Locator::Css("a.next:not(.disabled)"),
    Locator::Css("button.next:not(.disabled)"),
    Locator::Css("li.next:not(.disabled) a"),
];

/// Accumulated output of one sub-court walk. `next_sr` threads the
/// sequence number into the following sub-court of the same court.
#[derive(Debug)]
pub struct Harvest {
    pub cases: Vec<CaseRecord>,
    pub next_sr: u32,
}

/// Walk the result pages of one sub-court: wait for the table, extract
/// the page, resolve each record's detail page, then seek the next-page
/// control. Terminates on a missing table, an empty page, a missing or
/// stuck "next" control, or the hard page bound. Never loops: forward
/// progress is verified structurally by comparing the first row of each
/// page against the previous page, so a "next" control that stays on the
/// same page costs at most one extra extraction.
pub fn harvest_sub_court(
    session: &mut dyn Session,
    config: &Config,
    base: &Url,
    court: &str,
    sub_court: Option<&str>,
    start_sr: u32,
) -> Harvest {
    let mut cases = Vec::new();
    let mut sr = start_sr;
    let mut pages_walked: u32 = 0;
    let mut prev_fingerprint: Option<String> = None;
    let scope = sub_court.unwrap_or(court);

    loop {
        if pages_walked >= config.max_pages_per_sub_court {
            warn!(
                "Reached page bound ({}) for {}; stopping traversal.",
                config.max_pages_per_sub_court, scope
            );
            break;
        }
        if !session.wait_for("table", config.table_wait) {
            debug!("No results table appeared for {}.", scope);
            break;
        }
        let markup = match session.markup() {
            Ok(m) => m,
            Err(e) => {
                warn!("Could not read page markup for {}: {}", scope, e);
                break;
            }
        };
        let listing = extract_listing(&markup, court, sub_court);
        if listing.is_empty() {
            debug!("Results table for {} has no rows.", scope);
            break;
        }

        let fingerprint = row_fingerprint(&listing.records[0]);
        if prev_fingerprint.as_deref() == Some(fingerprint.as_str()) {
            // The "next" control reported a click but the page did not
            // change. Stop instead of re-emitting the same rows.
            info!("Pagination did not advance for {}; stopping.", scope);
            break;
        }
        prev_fingerprint = Some(fingerprint);
        pages_walked += 1;

        let page_len = listing.records.len();
        for (mut record, link) in listing
            .records
            .into_iter()
            .zip(listing.detail_links.into_iter())
        {
            if let Some(link) = link {
                let detail_url = absolutize(base, &link);
                match session.open_secondary(&detail_url) {
                    Ok(detail_markup) => {
                        let resolved = resolve_detail(&detail_markup, base);
                        record.tagline = resolved.tagline;
                        record.details = resolved.detail;
                    }
                    Err(e) => {
                        // Degrade this record only; defaults stay in place.
                        debug!("Failed to fetch detail page {}: {}", detail_url, e);
                    }
                }
                session.close_secondary();
            }
            record.sr_no = sr;
            sr += 1;
            cases.push(record);
        }
        debug!("Collected {} records on page {} of {}.", page_len, pages_walked, scope);

        if !session.click_first(NEXT_LOCATORS) {
            debug!("No further pages for {}.", scope);
            break;
        }
        session.settle(config.interaction_settle);
    }

    Harvest { cases, next_sr: sr }
}

/// Structural identity of a row, used as the forward-progress signal
/// between pages.
fn row_fingerprint(record: &CaseRecord) -> String {
    record
        .fields
        .values()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\u{1f}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::testing::ScriptedSession;
    use crate::records::NA;

    fn config() -> Config {
        Config::default()
    }

    fn base() -> Url {
        Url::parse("https://cases.example.test/").unwrap()
    }

    fn table_page(rows: &[&str]) -> String {
        let body: String = rows
            .iter()
            .map(|r| format!("<tr><td>{}</td><td>-</td></tr>", r))
            .collect();
        format!(
            "<html><body><table><thead><tr><th>Case No</th><th>Actions</th></tr></thead>\
             <tbody>{}</tbody></table></body></html>",
            body
        )
    }

    fn numbered_page(prefix: &str, count: usize) -> String {
        let rows: Vec<String> = (0..count).map(|i| format!("{}-{}", prefix, i)).collect();
        let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
        table_page(&refs)
    }

    #[test]
    fn walks_all_pages_and_numbers_contiguously() {
        let pages = [
            numbered_page("p1", 10),
            numbered_page("p2", 10),
            numbered_page("p3", 4),
        ];
        let mut session =
            ScriptedSession::with_pages(pages.iter().map(String::as_str).collect());
        let harvest = harvest_sub_court(&mut session, &config(), &base(), "Karachi", Some("Bench I"), 1);

        assert_eq!(harvest.cases.len(), 24);
        assert_eq!(harvest.next_sr, 25);
        let sr_nos: Vec<u32> = harvest.cases.iter().map(|c| c.sr_no).collect();
        assert_eq!(sr_nos, (1..=24).collect::<Vec<u32>>());
        assert_eq!(harvest.cases[0].circuit_code, "Bench I");
    }

    #[test]
    fn stuck_next_control_stops_after_one_extra_attempt() {
        let page = numbered_page("same", 10);
        let mut session = ScriptedSession::with_pages(vec![page.as_str(), page.as_str()]);
        session.next_is_stuck = true;
        let harvest = harvest_sub_court(&mut session, &config(), &base(), "Karachi", None, 1);

        // First page emitted once; the stale re-extraction is discarded.
        assert_eq!(harvest.cases.len(), 10);
        assert_eq!(harvest.next_sr, 11);
    }

    #[test]
    fn missing_table_yields_empty_harvest() {
        let mut session = ScriptedSession::with_pages(vec!["<html><body>loading…</body></html>"]);
        let harvest = harvest_sub_court(&mut session, &config(), &base(), "Karachi", Some("Bench II"), 5);
        assert!(harvest.cases.is_empty());
        assert_eq!(harvest.next_sr, 5);
    }

    #[test]
    fn hard_page_bound_terminates_runaway_pagination() {
        let pages: Vec<String> = (0..6).map(|i| numbered_page(&format!("p{}", i), 2)).collect();
        let mut session =
            ScriptedSession::with_pages(pages.iter().map(String::as_str).collect());
        let mut cfg = config();
        cfg.max_pages_per_sub_court = 3;
        let harvest = harvest_sub_court(&mut session, &cfg, &base(), "Karachi", None, 1);
        assert_eq!(harvest.cases.len(), 6);
    }

    #[test]
    fn detail_pages_are_resolved_and_contexts_released() {
        let page = "<html><body><table>\
            <thead><tr><th>Case No</th><th>Actions</th></tr></thead>\
            <tbody>\
            <tr><td>CP 1</td><td><a href=\"/detail/1\">View</a></td></tr>\
            <tr><td>CP 2</td><td><a href=\"/detail/2\">View</a></td></tr>\
            <tr><td>CP 3</td><td>-</td></tr>\
            </tbody></table></body></html>";
        let mut session = ScriptedSession::with_pages(vec![page]);
        session.details.insert(
            "https://cases.example.test/detail/1".to_string(),
            "<span class=\"tagline\">Bail application</span>".to_string(),
        );
        // /detail/2 has no scripted markup: the fetch fails and the
        // record keeps its defaults.
        let harvest = harvest_sub_court(&mut session, &config(), &base(), "Karachi", None, 1);

        assert_eq!(harvest.cases.len(), 3);
        assert_eq!(harvest.cases[0].tagline, "Bail application");
        assert_eq!(harvest.cases[1].tagline, NA);
        assert_eq!(harvest.cases[2].tagline, NA);
        // Every opened secondary context was released, failures included.
        assert_eq!(session.open_count, 2);
        assert_eq!(session.close_count, 2);
    }
}
