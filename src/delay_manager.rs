use log::debug;
use std::thread;
use std::time::Duration;

/// Fixed settle delay. The portal renders results through page scripts,
/// so interactions need a short pause before the DOM is worth reading.
pub fn settle(wait: Duration) {
    debug!("Settling for {:?}...", wait);
    thread::sleep(wait);
}
