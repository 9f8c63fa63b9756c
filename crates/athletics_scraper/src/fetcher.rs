//! Page loading. Every call gets its own browser process; nothing is pooled
//! or shared between concurrent calls.

use crate::config::{FetchBackend, SiteConfig};
use anyhow::{Context, Result};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use std::sync::Arc;
use std::time::Duration;
use tokio::task;
use tracing::{debug, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// How long to wait after navigation before the DOM is read.
#[derive(Debug, Clone, PartialEq)]
pub enum WaitStrategy {
    /// Server-rendered pages: wait for the load event, then a quiet period.
    NetworkIdle { settle: Duration },
    /// Client-rendered pages: wait until `selector` appears or `timeout` elapses.
    DomMarker { selector: String, timeout: Duration },
}

#[derive(Debug, Clone)]
pub struct PageRequest {
    pub url: String,
    pub wait: WaitStrategy,
    pub timeout: Duration,
}

/// Anything that can turn a [`PageRequest`] into the page's HTML.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn load(&self, request: &PageRequest) -> Result<String>;
}

pub fn build_page_source(config: &SiteConfig) -> Arc<dyn PageSource> {
    match config.backend {
        FetchBackend::Chrome => Arc::new(ChromeFetcher::new()),
        FetchBackend::Http => Arc::new(HttpFetcher::new(config.navigation_timeout)),
    }
}

// ── headless Chrome ──────────────────────────────────────────────────────────

/// The browser operations one page load needs.
trait PageDriver {
    fn navigate(&self, url: &str, timeout: Duration) -> Result<()>;
    fn wait_until_navigated(&self) -> Result<()>;
    fn wait_for_element(&self, selector: &str, timeout: Duration) -> Result<()>;
    fn content(&self) -> Result<String>;
}

/// A launched Chrome process and its single tab. Dropping it closes Chrome.
struct ChromeDriver {
    _browser: Browser,
    tab: Arc<Tab>,
}

impl ChromeDriver {
    fn launch(idle_timeout: Duration) -> Result<Self> {
        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .idle_browser_timeout(idle_timeout + Duration::from_secs(30))
            .build()
            .context("Failed to build Chrome launch options")?;

        let browser = Browser::new(options).context("Failed to launch Chrome")?;
        let tab = browser.new_tab().context("Failed to create browser tab")?;
        Ok(Self { _browser: browser, tab })
    }
}

impl PageDriver for ChromeDriver {
    fn navigate(&self, url: &str, timeout: Duration) -> Result<()> {
        self.tab.set_default_timeout(timeout);
        self.tab
            .navigate_to(url)
            .with_context(|| format!("Chrome navigate failed for {}", url))?;
        Ok(())
    }

    fn wait_until_navigated(&self) -> Result<()> {
        self.tab.wait_until_navigated()?;
        Ok(())
    }

    fn wait_for_element(&self, selector: &str, timeout: Duration) -> Result<()> {
        self.tab.wait_for_element_with_custom_timeout(selector, timeout)?;
        Ok(())
    }

    fn content(&self) -> Result<String> {
        self.tab.get_content().context("Failed to read HTML from browser tab")
    }
}

/// One browser session. Released explicitly via [`BrowserSession::release`]
/// and, on any early exit, by `Drop`.
struct BrowserSession<D: PageDriver> {
    driver: Option<D>,
}

impl<D: PageDriver> BrowserSession<D> {
    fn acquire(launch: impl FnOnce() -> Result<D>) -> Result<Self> {
        let driver = launch()?;
        debug!("browser session acquired");
        Ok(Self { driver: Some(driver) })
    }

    fn load(&self, request: &PageRequest) -> Result<String> {
        let driver = self
            .driver
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("browser session already released"))?;

        driver.navigate(&request.url, request.timeout)?;

        // Timeouts below are not fatal: extraction runs on whatever DOM exists.
        match &request.wait {
            WaitStrategy::NetworkIdle { settle } => {
                if let Err(e) = driver.wait_until_navigated() {
                    warn!(url = %request.url, "load did not settle: {}", e);
                }
                std::thread::sleep(*settle);
            }
            WaitStrategy::DomMarker { selector, timeout } => {
                if let Err(e) = driver.wait_for_element(selector, *timeout) {
                    warn!(url = %request.url, selector = %selector, "marker wait timed out: {}", e);
                }
            }
        }

        driver.content()
    }

    fn release(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(driver) = self.driver.take() {
            drop(driver);
            debug!("browser session released");
        }
    }
}

impl<D: PageDriver> Drop for BrowserSession<D> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Acquire, load, release. Release runs whether or not the load succeeded.
fn load_in_session<D: PageDriver>(launch: impl FnOnce() -> Result<D>, request: &PageRequest) -> Result<String> {
    let session = BrowserSession::acquire(launch)?;
    let html = session.load(request);
    session.release();
    html
}

#[derive(Debug, Default, Clone)]
pub struct ChromeFetcher;

impl ChromeFetcher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PageSource for ChromeFetcher {
    async fn load(&self, request: &PageRequest) -> Result<String> {
        let request = request.clone();

        let html = task::spawn_blocking(move || {
            load_in_session(|| ChromeDriver::launch(request.timeout), &request)
        })
        .await??;

        Ok(html)
    }
}

// ── plain HTTP ───────────────────────────────────────────────────────────────

/// GET-only loader for server-rendered markup. Wait strategies collapse to
/// "response body received".
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        Self {
            client: reqwest::Client::builder()
                .default_headers(headers)
                .user_agent(USER_AGENT)
                .timeout(timeout)
                .gzip(true)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }
}

#[async_trait]
impl PageSource for HttpFetcher {
    async fn load(&self, request: &PageRequest) -> Result<String> {
        let resp = self
            .client
            .get(&request.url)
            .timeout(request.timeout)
            .send()
            .await
            .with_context(|| format!("request failed for {}", request.url))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!("HTTP {} for {}", status, request.url));
        }

        Ok(resp.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedDriver {
        fail_navigate: bool,
        fail_wait: bool,
        navigations: Arc<AtomicUsize>,
        closed: Arc<AtomicUsize>,
    }

    impl PageDriver for ScriptedDriver {
        fn navigate(&self, url: &str, _timeout: Duration) -> Result<()> {
            self.navigations.fetch_add(1, Ordering::SeqCst);
            if self.fail_navigate {
                anyhow::bail!("navigation failed for {}: net::ERR_NAME_NOT_RESOLVED", url);
            }
            Ok(())
        }

        fn wait_until_navigated(&self) -> Result<()> {
            if self.fail_wait {
                anyhow::bail!("load event timed out");
            }
            Ok(())
        }

        fn wait_for_element(&self, selector: &str, _timeout: Duration) -> Result<()> {
            if self.fail_wait {
                anyhow::bail!("no element matched {}", selector);
            }
            Ok(())
        }

        fn content(&self) -> Result<String> {
            Ok("<html><body><p>partial</p></body></html>".to_string())
        }
    }

    /// Returns the driver plus its navigation and close counters.
    fn scripted(fail_navigate: bool, fail_wait: bool) -> (ScriptedDriver, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let navigations = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(AtomicUsize::new(0));
        let driver = ScriptedDriver {
            fail_navigate,
            fail_wait,
            navigations: Arc::clone(&navigations),
            closed: Arc::clone(&closed),
        };
        (driver, navigations, closed)
    }

    impl Drop for ScriptedDriver {
        fn drop(&mut self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn request(wait: WaitStrategy) -> PageRequest {
        PageRequest {
            url: "https://athletics.example.edu/sports/softball/roster".to_string(),
            wait,
            timeout: Duration::from_millis(50),
        }
    }

    fn settled() -> WaitStrategy {
        WaitStrategy::NetworkIdle { settle: Duration::ZERO }
    }

    #[test]
    fn session_is_released_after_a_successful_load() {
        let (driver, _, closed) = scripted(false, false);

        let html = load_in_session(|| Ok(driver), &request(settled())).unwrap();
        assert!(html.contains("partial"));
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn session_is_released_when_navigation_fails() {
        let (driver, _, closed) = scripted(true, false);

        let err = load_in_session(|| Ok(driver), &request(settled())).unwrap_err();
        assert!(err.to_string().contains("ERR_NAME_NOT_RESOLVED"));
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropped_session_releases_its_browser() {
        let (driver, _, closed) = scripted(false, false);

        let session = BrowserSession::acquire(|| Ok(driver)).unwrap();
        drop(session);
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_launch_is_reported() {
        let result = load_in_session(
            || -> Result<ScriptedDriver> { Err(anyhow::anyhow!("Failed to launch Chrome")) },
            &request(settled()),
        );
        assert!(result.unwrap_err().to_string().contains("launch"));
    }

    #[test]
    fn wait_timeouts_still_return_the_page() {
        for wait in [
            settled(),
            WaitStrategy::DomMarker { selector: "a[href*='/news/']".to_string(), timeout: Duration::from_millis(10) },
        ] {
            let (driver, navigations, closed) = scripted(false, true);

            let html = load_in_session(|| Ok(driver), &request(wait)).unwrap();
            assert!(html.contains("partial"));
            assert_eq!(navigations.load(Ordering::SeqCst), 1);
            assert_eq!(closed.load(Ordering::SeqCst), 1);
        }
    }
}
