use std::collections::BTreeMap;

use serde::Serialize;
use url::Url;

/// Sentinel for any field the portal did not expose.
pub const NA: &str = "NA";

/// Tag prefix for placeholder rows standing in for a sub-court whose
/// results could not be obtained as static HTML.
pub const SUBCOURT_NEEDS_JS_TAG: &str = "__SUBCOURT_NEEDS_JS__";

/// One clickable court card on the portal landing page.
///
/// Plain data only (name + href), so callers can navigate away and back
/// without holding stale element handles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourtTarget {
    pub name: String,
    pub href: String,
}

/// One non-placeholder option of a court's sub-court dropdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubCourt {
    pub label: String,
    pub value: String,
}

/// One row of a results table, keyed by the live header texts
/// (or `col_<i>` where the header row is missing or short).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseRecord {
    pub sr_no: u32,
    pub court: String,
    pub circuit_code: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
    pub tagline: String,
    pub details: CaseDetail,
}

impl CaseRecord {
    /// A freshly extracted row. `sr_no` stays 0 until the record is
    /// finalized into a court's case list.
    pub fn new(court: &str, circuit_code: &str, fields: BTreeMap<String, String>) -> Self {
        CaseRecord {
            sr_no: 0,
            court: court.to_string(),
            circuit_code: circuit_code.to_string(),
            fields,
            tagline: NA.to_string(),
            details: CaseDetail::default(),
        }
    }

    /// Synthetic row marking a sub-court whose results were not reachable.
    /// Keeps the sr_no sequence contiguous and makes the gap visible in
    /// the output file.
    pub fn placeholder(sr_no: u32, court: &str, sub_court: &str, note: &str) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(
            "case_name".to_string(),
            format!("{}:{}", SUBCOURT_NEEDS_JS_TAG, sub_court),
        );
        for key in [
            "case_no",
            "case_year",
            "bench",
            "case_title",
            "matter",
            "status",
            "last_hearing",
            "next_date",
            "disposal_date",
        ] {
            fields.insert(key.to_string(), NA.to_string());
        }
        CaseRecord {
            sr_no,
            court: court.to_string(),
            circuit_code: sub_court.to_string(),
            fields,
            tagline: NA.to_string(),
            details: CaseDetail {
                note: Some(note.to_string()),
                ..CaseDetail::default()
            },
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.fields
            .get("case_name")
            .map_or(false, |v| v.starts_with(SUBCOURT_NEEDS_JS_TAG))
    }
}

/// Nested structure resolved from a case's detail page. Every leaf
/// defaults to the "NA" sentinel; the resolver never errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseDetail {
    pub summary: String,
    pub profile: BTreeMap<String, String>,
    pub last_hearing: LastHearing,
    pub parties: Vec<Party>,
    pub advocates: Advocates,
    pub documents: Documents,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Default for CaseDetail {
    fn default() -> Self {
        CaseDetail {
            summary: NA.to_string(),
            profile: BTreeMap::new(),
            last_hearing: LastHearing::default(),
            parties: Vec::new(),
            advocates: Advocates::default(),
            documents: Documents::default(),
            note: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LastHearing {
    pub date: String,
    pub list: String,
    pub stage: String,
    pub bench: String,
    pub remarks: String,
}

impl Default for LastHearing {
    fn default() -> Self {
        LastHearing {
            date: NA.to_string(),
            list: NA.to_string(),
            stage: NA.to_string(),
            bench: NA.to_string(),
            remarks: NA.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Party {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Advocates {
    pub applicant: Vec<String>,
    pub respondent: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Documents {
    pub petition_memo: String,
    pub judgement_order: String,
}

impl Default for Documents {
    fn default() -> Self {
        Documents {
            petition_memo: NA.to_string(),
            judgement_order: NA.to_string(),
        }
    }
}

/// Run metadata written alongside the case list, one per court.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourtMetadata {
    pub file_name: String,
    pub created_on: String,
    pub source: String,
    pub url: String,
    pub description: String,
}

/// The per-court output artifact: metadata plus the ordered case list.
/// Written once; independent of every other court.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourtResult {
    pub metadata: CourtMetadata,
    pub cases: Vec<CaseRecord>,
}

/// Resolve a possibly-relative href against the portal base URL.
pub fn absolutize(base: &Url, href: &str) -> String {
    if href.starts_with("http") {
        return href.to_string();
    }
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}
