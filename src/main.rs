use std::error::Error;

use log::{error, info};

use court_scraper_lib::{logger, storage, ChromeSession, Config, CourtScraper};

fn main() -> Result<(), Box<dyn Error>> {
    logger::init();
    let config = Config::from_env();
    info!(
        "Starting court case scraper (base={}, headless={})",
        config.base_url, config.headless
    );

    let mut session = ChromeSession::launch(&config)?;
    let mut court_scraper = CourtScraper::new(&mut session, &config)?;

    let courts = court_scraper.discover_courts()?;
    info!(
        "Found courts: {:?}",
        courts.iter().map(|c| c.name.as_str()).collect::<Vec<_>>()
    );

    let mut written = 0usize;
    for court in &courts {
        if !config.selects_court(&court.name) {
            info!("Skipping {} (not in allow-list).", court.name);
            continue;
        }
        let result = court_scraper.scrape_court(court);
        match storage::write_court_result(&config.output_dir, &result) {
            Ok(()) => written += 1,
            Err(e) => error!("Failed to write output for {}: {}", court.name, e),
        }
    }

    info!("All done. Wrote {} court files.", written);
    Ok(())
}
