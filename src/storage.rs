use std::fs;
use std::io;
use std::path::Path;

use log::info;

use crate::records::CourtResult;

/// Deterministic file name from a court name: alphanumerics, space,
/// underscore and hyphen survive, everything else becomes an
/// underscore, then spaces become underscores too.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == ' ' || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .replace(' ', "_")
}

/// Write one court's result file. Failed or empty courts still get a
/// file so gaps are visible in the output set.
pub fn write_court_result(output_dir: &Path, result: &CourtResult) -> io::Result<()> {
    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(&result.metadata.file_name);
    let json = serde_json::to_string_pretty(result)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    fs::write(&path, json)?;
    info!(
        "Wrote {} case entries to {:?}",
        result.cases.len(),
        path
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{CaseRecord, CourtMetadata};

    #[test]
    fn sanitize_keeps_safe_chars_and_underscores_the_rest() {
        assert_eq!(sanitize_filename("Karachi"), "Karachi");
        assert_eq!(
            sanitize_filename("Karachi (Principal Seat)"),
            "Karachi__Principal_Seat_"
        );
        assert_eq!(sanitize_filename("Bench-II at Sukkur"), "Bench-II_at_Sukkur");
        assert_eq!(sanitize_filename("a/b\\c"), "a_b_c");
    }

    #[test]
    fn writes_round_trippable_json() {
        let dir = std::env::temp_dir().join("court_scraper_storage_test");
        let result = CourtResult {
            metadata: CourtMetadata {
                file_name: "Test_Court.json".to_string(),
                created_on: "2026-01-01".to_string(),
                source: "test".to_string(),
                url: "https://example.test/".to_string(),
                description: "Cases extracted for court: Test".to_string(),
            },
            cases: vec![CaseRecord::placeholder(1, "Test", "Bench", "note")],
        };
        write_court_result(&dir, &result).unwrap();

        let written = fs::read_to_string(dir.join("Test_Court.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["metadata"]["file_name"], "Test_Court.json");
        assert_eq!(value["cases"][0]["sr_no"], 1);
        assert_eq!(value["cases"][0]["case_name"], "__SUBCOURT_NEEDS_JS__:Bench");
        fs::remove_dir_all(&dir).ok();
    }
}
