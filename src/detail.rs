use std::collections::BTreeMap;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::extractor::collapsed_text;
use crate::records::{absolutize, CaseDetail, Documents, LastHearing, Party, NA};

/// What the resolver hands back for merging into a CaseRecord.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDetail {
    pub tagline: String,
    pub detail: CaseDetail,
}

const SUMMARY_SELECTORS: &[&str] = &[
    "div#Summary",
    ".summary",
    "p.summary",
    ".case-summary",
    "#divSummary",
];
const TAGLINE_SELECTORS: &[&str] = &[".tagline", "span.tagline", "p.tagline", "#Tagline"];

const HEARING_DATE_SELECTORS: &[&str] = &[
    ".last-hearing .date",
    ".last-hearing",
    ".hearing-date",
    "li.hearing-date",
];
const HEARING_LIST_SELECTORS: &[&str] = &[".last-hearing .list", ".hearing-list"];
const HEARING_STAGE_SELECTORS: &[&str] = &[".last-hearing .stage", ".hearing-stage"];
const HEARING_BENCH_SELECTORS: &[&str] = &[".last-hearing .bench", ".hearing-bench"];
const HEARING_REMARKS_SELECTORS: &[&str] = &[".last-hearing .remarks", ".remarks"];

const PARTY_KEYWORDS: &[&str] = &["Petitioner", "Respondent", "Appellant"];
const PROFILE_LABELS: &[&str] = &[
    "Case ID",
    "Institution Date",
    "Disposal Date",
    "Disposal Bench",
    "Nature Of Disposal",
];

/// Resolve a case detail page into a nested structure.
///
/// Pure best-effort function of the markup: every field is located by an
/// ordered candidate list, and anything not found degrades to "NA". This
/// never fails — a page with nothing recognizable yields an all-"NA"
/// detail structure.
pub fn resolve_detail(markup: &str, base: &Url) -> ResolvedDetail {
    let document = Html::parse_document(markup);

    let summary = pick_one(&document, SUMMARY_SELECTORS);
    let tagline = pick_one(&document, TAGLINE_SELECTORS);

    let detail = CaseDetail {
        summary,
        profile: extract_profile(&document),
        last_hearing: LastHearing {
            date: pick_one(&document, HEARING_DATE_SELECTORS),
            list: pick_one(&document, HEARING_LIST_SELECTORS),
            stage: pick_one(&document, HEARING_STAGE_SELECTORS),
            bench: pick_one(&document, HEARING_BENCH_SELECTORS),
            remarks: pick_one(&document, HEARING_REMARKS_SELECTORS),
        },
        parties: extract_parties(&document),
        advocates: Default::default(),
        documents: extract_documents(&document, base),
        note: None,
    };

    ResolvedDetail { tagline, detail }
}

/// First selector whose first match carries non-empty text wins.
fn pick_one(document: &Html, selectors: &[&str]) -> String {
    for css in selectors {
        let sel = Selector::parse(css).unwrap();
        if let Some(el) = document.select(&sel).next() {
            let text = collapsed_text(&el);
            if !text.is_empty() {
                return text;
            }
        }
    }
    NA.to_string()
}

/// Scan tables for the first whose visible text mentions a party role,
/// then read one party per row. Later matching tables are ignored.
fn extract_parties(document: &Html) -> Vec<Party> {
    let table_sel = Selector::parse("table").unwrap();
    let tr_sel = Selector::parse("tr").unwrap();
    let td_sel = Selector::parse("td").unwrap();

    let mut parties = Vec::new();
    for table in document.select(&table_sel) {
        let text = collapsed_text(&table);
        if !PARTY_KEYWORDS.iter().any(|k| text.contains(k)) {
            continue;
        }
        for tr in table.select(&tr_sel) {
            let cells: Vec<String> = tr
                .select(&td_sel)
                .map(|td| collapsed_text(&td))
                .filter(|t| !t.is_empty())
                .collect();
            if cells.is_empty() {
                continue;
            }
            parties.push(Party {
                name: cells.join(" - "),
            });
        }
        break;
    }
    parties
}

/// Label heuristics for the small profile fields: find a text node that
/// contains the label (case-insensitive), then read the first non-empty
/// text among its parent's following siblings, else the parent's own
/// text. Labels not present on the page stay absent from the map.
fn extract_profile(document: &Html) -> BTreeMap<String, String> {
    let mut profile = BTreeMap::new();
    for label in PROFILE_LABELS {
        let needle = label.to_lowercase();
        let found = document
            .tree
            .nodes()
            .find(|node| {
                node.value()
                    .as_text()
                    .map_or(false, |t| t.to_lowercase().contains(&needle))
            })
            .and_then(|node| node.parent());
        let Some(parent) = found else {
            continue;
        };
        let value = parent
            .next_siblings()
            .filter_map(|sib| sib.value().as_text().map(|t| t.trim().to_string()))
            .find(|t| !t.is_empty())
            .or_else(|| ElementRef::wrap(parent).map(|el| collapsed_text(&el)))
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| NA.to_string());
        profile.insert(needle.replace(' ', "_"), value);
    }
    profile
}

/// Classify PDF links by the anchor's own text. First match per
/// category wins; hrefs are absolutized against the portal base.
fn extract_documents(document: &Html, base: &Url) -> Documents {
    let link_sel = Selector::parse("a[href]").unwrap();
    let mut documents = Documents::default();
    for a in document.select(&link_sel) {
        let href = a.value().attr("href").unwrap_or("");
        if !href.to_lowercase().ends_with(".pdf") {
            continue;
        }
        let text = collapsed_text(&a).to_lowercase();
        if text.contains("memo") || text.contains("petition") {
            if documents.petition_memo == NA {
                documents.petition_memo = absolutize(base, href);
            }
        } else if text.contains("judgement") || text.contains("judgment") || text.contains("order")
        {
            if documents.judgement_order == NA {
                documents.judgement_order = absolutize(base, href);
            }
        }
    }
    documents
}
