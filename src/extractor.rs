use std::collections::BTreeMap;

use scraper::{ElementRef, Html, Selector};

use crate::records::CaseRecord;

/// One listing page's extraction result: records and their detail-page
/// hrefs as parallel sequences of equal length.
#[derive(Debug, Default)]
pub struct ListingPage {
    pub records: Vec<CaseRecord>,
    pub detail_links: Vec<Option<String>>,
}

impl ListingPage {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Whitespace-collapsed text of an element, spans and all.
pub(crate) fn collapsed_text(el: &ElementRef) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract the case table from one rendered listing page.
///
/// Pure function of the markup; no navigation side effects. A page with
/// no `<table>` yields an empty result, which is a normal termination
/// signal for pagination rather than an error. Column keys come from the
/// header row; cells beyond the header (or all cells when no header row
/// exists) get positional `col_<i>` keys. Rows without a single `<td>`
/// are skipped.
pub fn extract_listing(markup: &str, court: &str, sub_court: Option<&str>) -> ListingPage {
    let document = Html::parse_document(markup);
    let table_sel = Selector::parse("table").unwrap();
    let thead_tr_sel = Selector::parse("thead tr").unwrap();
    let tbody_tr_sel = Selector::parse("tbody tr").unwrap();
    let tr_sel = Selector::parse("tr").unwrap();
    let th_sel = Selector::parse("th").unwrap();
    let td_sel = Selector::parse("td").unwrap();
    let link_sel = Selector::parse("a[href]").unwrap();

    let mut page = ListingPage::default();
    let Some(table) = document.select(&table_sel).next() else {
        return page;
    };

    // Header texts become record keys. Sites without a <thead> put the
    // header cells in the first row, so that row is never treated as data.
    // The parser inserts <tbody> implicitly, so branching happens on
    // <thead> presence rather than on <tbody>.
    let has_thead = table.select(&thead_tr_sel).next().is_some();
    let header_row = if has_thead {
        table.select(&thead_tr_sel).next()
    } else {
        table.select(&tr_sel).next()
    };
    let header_cells: Vec<String> = header_row
        .map(|row| row.select(&th_sel).map(|th| collapsed_text(&th)).collect())
        .unwrap_or_default();

    let rows: Vec<ElementRef> = if has_thead {
        table.select(&tbody_tr_sel).collect()
    } else {
        table.select(&tr_sel).skip(1).collect()
    };

    let circuit = sub_court.unwrap_or(court);
    for row in rows {
        let cells: Vec<ElementRef> = row.select(&td_sel).collect();
        if cells.is_empty() {
            continue;
        }
        let mut fields = BTreeMap::new();
        for (i, cell) in cells.iter().enumerate() {
            let key = header_cells
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("col_{}", i));
            fields.insert(key, collapsed_text(cell));
        }
        // Detail link lives in the Actions column, usually the last one.
        let detail_link = cells
            .last()
            .and_then(|cell| cell.select(&link_sel).next())
            .and_then(|a| a.value().attr("href"))
            .map(str::to_string);

        page.records.push(CaseRecord::new(court, circuit, fields));
        page.detail_links.push(detail_link);
    }
    page
}
