use std::collections::HashSet;

use scraper::{Html, Selector};
use url::Url;

use crate::extractor::collapsed_text;
use crate::records::{absolutize, CourtTarget};

/// Find the court cards on the portal landing page.
///
/// Returns plain (name, href) data — never live element handles — so the
/// caller can navigate away and back without staleness. The name is the
/// first card-body text line that is not the "Select Location" button
/// label, falling back to the last path segment of the href. Cards are
/// deduplicated by (href, name) in first-seen order; cards without an
/// href are dropped.
pub fn discover_courts(markup: &str, base: &Url) -> Vec<CourtTarget> {
    let document = Html::parse_document(markup);
    let card_sel = Selector::parse("div.col-md-2.mb-3").unwrap();
    let anchor_sel = Selector::parse("a[href]").unwrap();
    let body_sel = Selector::parse("div.card-body").unwrap();

    let mut seen = HashSet::new();
    let mut courts = Vec::new();
    for card in document.select(&card_sel) {
        let Some(anchor) = card.select(&anchor_sel).next() else {
            continue;
        };
        let href = anchor.value().attr("href").unwrap_or("").to_string();
        if href.is_empty() {
            continue;
        }

        let name_source = card.select(&body_sel).next().unwrap_or(anchor);
        let name = name_source
            .text()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .find(|line| {
                let low = line.to_lowercase();
                !(low.contains("select") && low.contains("location"))
            })
            .map(str::to_string)
            .unwrap_or_else(|| last_path_segment(base, &href));

        if seen.insert((href.clone(), name.clone())) {
            courts.push(CourtTarget { name, href });
        }
    }
    courts
}

fn last_path_segment(base: &Url, href: &str) -> String {
    let absolute = absolutize(base, href);
    let trimmed = absolute.trim_end_matches('/');
    let segment = trimmed.rsplit('/').next().unwrap_or(trimmed);
    if segment.is_empty() {
        absolute
    } else {
        segment.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://cases.example.test/").unwrap()
    }

    fn card(name_lines: &str, href: &str) -> String {
        format!(
            r#"<div class="col-md-2 mb-3"><div class="card">
                 <a href="{}"><div class="card-body">{}</div></a>
               </div></div>"#,
            href, name_lines
        )
    }

    #[test]
    fn reads_name_from_first_meaningful_line() {
        let markup = card("<span>Karachi</span><button>Select Location</button>", "/khi");
        let courts = discover_courts(&markup, &base());
        assert_eq!(courts.len(), 1);
        assert_eq!(courts[0].name, "Karachi");
        assert_eq!(courts[0].href, "/khi");
    }

    #[test]
    fn skips_select_location_label_line() {
        let markup = card("<button>Select Location...</button><span>Hyderabad</span>", "/hyd");
        let courts = discover_courts(&markup, &base());
        assert_eq!(courts[0].name, "Hyderabad");
    }

    #[test]
    fn falls_back_to_last_path_segment() {
        let markup = card("<button>Select Location</button>", "/suk/");
        let courts = discover_courts(&markup, &base());
        assert_eq!(courts[0].name, "suk");
    }

    #[test]
    fn dedupes_by_href_and_name_pair() {
        let markup = format!(
            "{}{}{}",
            card("<span>Karachi</span>", "/khi"),
            card("<span>Karachi</span>", "/khi"),
            card("<span>Karachi Bench</span>", "/khi")
        );
        let courts = discover_courts(&markup, &base());
        assert_eq!(courts.len(), 2);
        assert_eq!(courts[0].name, "Karachi");
        assert_eq!(courts[1].name, "Karachi Bench");
    }

    #[test]
    fn cards_without_href_are_dropped() {
        let markup = r#"<div class="col-md-2 mb-3"><div class="card-body">Orphan</div></div>"#;
        assert!(discover_courts(markup, &base()).is_empty());
    }
}
