pub mod browser;
pub mod config;
pub mod delay_manager;
pub mod detail;
pub mod discovery;
pub mod extractor;
pub mod logger;
pub mod pagination;
pub mod records;
pub mod scraper;
pub mod storage;

// Exporting types for convenience
pub use browser::{ChromeSession, Locator, Session, SessionError};
pub use config::Config;
pub use records::{CaseDetail, CaseRecord, CourtResult, CourtTarget, SubCourt};
pub use scraper::CourtScraper;
