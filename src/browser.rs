use std::sync::Arc;
use std::time::Duration;

use headless_chrome::{Browser, LaunchOptions, Tab};
use log::{debug, warn};
use thiserror::Error;

use crate::config::Config;
use crate::delay_manager;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("could not launch browser: {0}")]
    Launch(String),
    #[error("navigation to {url} failed: {source}")]
    Navigation {
        url: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("browser error: {0}")]
    Browser(#[from] anyhow::Error),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// One strategy for locating a clickable control. Strategies are tried
/// in order until one matches (portal controls move around between
/// renders, so no single selector is reliable).
#[derive(Debug, Clone, Copy)]
pub enum Locator {
    Css(&'static str),
    /// Case-insensitive match on a button's visible text.
    ButtonText(&'static str),
}

/// Capability interface over the shared, exclusively-owned browsing
/// session. The extraction core depends only on this trait, never on a
/// concrete automation library. Drive it strictly sequentially.
pub trait Session {
    fn navigate(&mut self, url: &str) -> SessionResult<()>;
    fn current_url(&mut self) -> String;
    /// Full markup of the primary context's current page.
    fn markup(&mut self) -> SessionResult<String>;
    /// Bounded wait for an element; a timeout means "not present".
    fn wait_for(&mut self, css: &str, timeout: Duration) -> bool;
    /// Click the first locator strategy that matches an element.
    fn click_first(&mut self, locators: &[Locator]) -> bool;
    /// Re-acquire a select control (fresh lookup every call — the portal
    /// re-renders dropdowns between interactions) and choose the option
    /// matching the visible label or the value attribute.
    fn select_option(&mut self, select_css: &[&str], label: &str, value: &str) -> bool;
    /// Open the isolated secondary context on `url` and return its
    /// markup. At most one secondary context exists at a time; callers
    /// must pair every call with `close_secondary` on all paths.
    fn open_secondary(&mut self, url: &str) -> SessionResult<String>;
    fn close_secondary(&mut self);
    fn settle(&mut self, wait: Duration);
}

const LOWERCASE_XLAT: &str =
    "translate(., 'ABCDEFGHIJKLMNOPQRSTUVWXYZ', 'abcdefghijklmnopqrstuvwxyz')";

/// Headless-Chrome backed session. The `Browser` handle must outlive
/// every tab, so it is kept alive for the whole run.
pub struct ChromeSession {
    browser: Browser,
    tab: Arc<Tab>,
    secondary: Option<Arc<Tab>>,
    detail_settle: Duration,
}

impl ChromeSession {
    pub fn launch(config: &Config) -> SessionResult<Self> {
        let options = LaunchOptions::default_builder()
            .headless(config.headless)
            .window_size(Some((1920, 1080)))
            .ignore_certificate_errors(true)
            .build()
            .map_err(|e| SessionError::Launch(e.to_string()))?;
        let browser = Browser::new(options)?;
        let tab = browser.new_tab()?;
        tab.set_default_timeout(config.page_load_timeout);
        Ok(ChromeSession {
            browser,
            tab,
            secondary: None,
            detail_settle: config.detail_settle,
        })
    }

}

impl Session for ChromeSession {
    fn navigate(&mut self, url: &str) -> SessionResult<()> {
        self.tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map(|_| ())
            .map_err(|e| SessionError::Navigation {
                url: url.to_string(),
                source: e,
            })
    }

    fn current_url(&mut self) -> String {
        self.tab.get_url()
    }

    fn markup(&mut self) -> SessionResult<String> {
        self.tab.get_content().map_err(Into::into)
    }

    fn wait_for(&mut self, css: &str, timeout: Duration) -> bool {
        self.tab
            .wait_for_element_with_custom_timeout(css, timeout)
            .is_ok()
    }

    fn click_first(&mut self, locators: &[Locator]) -> bool {
        for locator in locators {
            let found = match locator {
                Locator::Css(css) => self.tab.find_element(css),
                Locator::ButtonText(text) => {
                    let xpath = format!(
                        "//button[contains({}, '{}')]",
                        LOWERCASE_XLAT,
                        text.to_lowercase()
                    );
                    self.tab.find_element_by_xpath(&xpath)
                }
            };
            let Ok(element) = found else {
                continue;
            };
            // Script click first; the portal overlays intercept a fair
            // share of native clicks.
            if element
                .call_js_fn("function() { this.click(); }", vec![], false)
                .is_ok()
                || element.click().is_ok()
            {
                debug!("Clicked control via {:?}", locator);
                return true;
            }
        }
        false
    }

    fn select_option(&mut self, select_css: &[&str], label: &str, value: &str) -> bool {
        // serde_json escaping keeps arbitrary option labels safe inside
        // the injected script.
        let label_js = serde_json::to_string(label).unwrap_or_default();
        let value_js = serde_json::to_string(value).unwrap_or_default();
        for css in select_css {
            let css_js = serde_json::to_string(css).unwrap_or_default();
            let script = format!(
                "(() => {{ const sel = document.querySelector({css}); \
                 if (!sel) return false; \
                 for (const opt of sel.options) {{ \
                   if (opt.text.trim() === {label} || opt.value === {value}) {{ \
                     sel.value = opt.value; \
                     sel.dispatchEvent(new Event('change', {{ bubbles: true }})); \
                     return true; \
                   }} \
                 }} \
                 return false; }})()",
                css = css_js,
                label = label_js,
                value = value_js
            );
            match self.tab.evaluate(&script, false) {
                Ok(result) => {
                    if matches!(result.value, Some(serde_json::Value::Bool(true))) {
                        return true;
                    }
                }
                Err(e) => debug!("select_option script failed on {}: {}", css, e),
            }
        }
        false
    }

    fn open_secondary(&mut self, url: &str) -> SessionResult<String> {
        // Invariant: one secondary context at a time.
        self.close_secondary();
        let tab = self.browser.new_tab()?;
        self.secondary = Some(tab.clone());
        tab.navigate_to(url)
            .and_then(|t| t.wait_until_navigated())
            .map_err(|e| SessionError::Navigation {
                url: url.to_string(),
                source: e,
            })?;
        delay_manager::settle(self.detail_settle);
        tab.get_content().map_err(Into::into)
    }

    fn close_secondary(&mut self) {
        if let Some(tab) = self.secondary.take() {
            if let Err(e) = tab.close(false) {
                warn!("Failed to close secondary tab: {}", e);
            }
        }
        // Focus stays with the primary tab handle; nothing to restore.
    }

    fn settle(&mut self, wait: Duration) {
        delay_manager::settle(wait);
    }
}

/// Scripted stand-in for pagination and orchestration tests. Pages are
/// pre-rendered markup; "next" clicks advance an index (or spin in place
/// when `next_is_stuck`), and detail fetches are answered from a map.
#[cfg(test)]
pub mod testing {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    pub struct ScriptedSession {
        pub pages: Vec<String>,
        pub index: usize,
        /// Simulates a "next" control that reports success but never
        /// actually changes the page.
        pub next_is_stuck: bool,
        pub navigate_fails: bool,
        /// Detail markup by absolute URL.
        pub details: HashMap<String, String>,
        /// Labels for which select_option succeeds.
        pub selectable: Vec<String>,
        pub visited: Vec<String>,
        pub selected: Vec<String>,
        pub open_count: usize,
        pub close_count: usize,
        secondary_open: bool,
    }

    impl ScriptedSession {
        pub fn with_pages(pages: Vec<&str>) -> Self {
            ScriptedSession {
                pages: pages.into_iter().map(String::from).collect(),
                ..Default::default()
            }
        }
    }

    impl Session for ScriptedSession {
        fn navigate(&mut self, url: &str) -> SessionResult<()> {
            if self.navigate_fails {
                return Err(SessionError::Navigation {
                    url: url.to_string(),
                    source: anyhow::anyhow!("connection refused"),
                });
            }
            self.visited.push(url.to_string());
            Ok(())
        }

        fn current_url(&mut self) -> String {
            format!("https://scripted.test/page/{}", self.index)
        }

        fn markup(&mut self) -> SessionResult<String> {
            Ok(self.pages.get(self.index).cloned().unwrap_or_default())
        }

        fn wait_for(&mut self, css: &str, _timeout: Duration) -> bool {
            self.pages
                .get(self.index)
                .map_or(false, |page| page.contains(&format!("<{}", css)))
        }

        fn click_first(&mut self, locators: &[Locator]) -> bool {
            let seeking_next = locators.iter().any(|l| match l {
                Locator::Css(css) => css.contains(".next") || css.contains("pagination"),
                Locator::ButtonText(_) => false,
            });
            if !seeking_next {
                // Search/submit buttons are a no-op for scripted pages.
                return true;
            }
            if self.next_is_stuck {
                return true;
            }
            if self.index + 1 < self.pages.len() {
                self.index += 1;
                true
            } else {
                false
            }
        }

        fn select_option(&mut self, _select_css: &[&str], label: &str, _value: &str) -> bool {
            self.selected.push(label.to_string());
            self.selectable.iter().any(|l| l == label)
        }

        fn open_secondary(&mut self, url: &str) -> SessionResult<String> {
            assert!(
                !self.secondary_open,
                "secondary context opened while one was already open"
            );
            self.secondary_open = true;
            self.open_count += 1;
            self.details
                .get(url)
                .cloned()
                .ok_or_else(|| SessionError::Navigation {
                    url: url.to_string(),
                    source: anyhow::anyhow!("no scripted detail page"),
                })
        }

        fn close_secondary(&mut self) {
            if self.secondary_open {
                self.secondary_open = false;
                self.close_count += 1;
            }
        }

        fn settle(&mut self, _wait: Duration) {}
    }
}
