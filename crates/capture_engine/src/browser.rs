use std::future::Future;
use std::time::Duration;

use capture_logging::{capture_debug, capture_info, capture_warn};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::fetch::FetchSettings;
use crate::{FailureKind, FetchError, Stage};

const CLOSE_TIMEOUT: Duration = Duration::from_secs(10);

/// One running browser with a single tab. Dropping it without `close` leaks
/// the browser process until the runtime shuts down, so callers always close.
pub(crate) struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Page,
}

impl BrowserSession {
    pub(crate) async fn launch(settings: &FetchSettings) -> Result<Self, FetchError> {
        let launch_err = |message: String| FetchError::new(FailureKind::Launch, Stage::Launch, message);

        let mut builder = BrowserConfig::builder()
            .window_size(settings.window_size.0, settings.window_size.1)
            .request_timeout(settings.page_load_timeout)
            .arg(format!("--user-agent={}", settings.user_agent));
        if !settings.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &settings.browser_executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(launch_err)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|err| launch_err(err.to_string()))?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(err) => {
                let session_err = launch_err(err.to_string());
                close_browser(browser, handler).await;
                return Err(session_err);
            }
        };
        capture_info!("Browser session started");
        Ok(Self {
            browser,
            handler,
            page,
        })
    }

    pub(crate) fn page(&self) -> &Page {
        &self.page
    }

    pub(crate) async fn close(self) {
        if let Err(err) = self.page.close().await {
            capture_debug!("Closing tab failed: {}", err);
        }
        close_browser(self.browser, self.handler).await;
        capture_info!("Browser session closed");
    }
}

async fn close_browser(mut browser: Browser, handler: JoinHandle<()>) {
    let closed = match tokio::time::timeout(CLOSE_TIMEOUT, browser.close()).await {
        Ok(Ok(_)) => true,
        Ok(Err(err)) => {
            capture_warn!("Browser close failed: {}", err);
            false
        }
        Err(_) => {
            capture_warn!("Browser close timed out after {:?}", CLOSE_TIMEOUT);
            false
        }
    };
    let exited = closed
        && matches!(
            tokio::time::timeout(CLOSE_TIMEOUT, browser.wait()).await,
            Ok(Ok(_))
        );
    if !exited {
        if let Some(Err(err)) = browser.kill().await {
            capture_debug!("Browser process kill failed: {}", err);
        }
    }
    handler.abort();
}

/// Whether the element with `id` exists and is rendered.
pub(crate) async fn is_displayed(page: &Page, id: &str) -> bool {
    let script = format!(
        "(() => {{ const el = document.getElementById('{id}'); \
         return !!el && el.getClientRects().length > 0 && \
         getComputedStyle(el).visibility !== 'hidden'; }})()"
    );
    match page.evaluate(script).await {
        Ok(result) => result.into_value::<bool>().unwrap_or(false),
        Err(_) => false,
    }
}

/// Poll `probe` every `interval` until it yields true or `timeout` elapses.
/// A probe still pending at the deadline counts as false.
pub(crate) async fn wait_until<F, Fut>(timeout: Duration, interval: Duration, mut probe: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if let Ok(true) = tokio::time::timeout(remaining, probe()).await {
            return true;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return false;
        }
        tokio::time::sleep(interval.min(remaining)).await;
    }
}


/// Stop any in-progress load so the next navigation starts clean.
pub(crate) async fn stop_loading(page: &Page) {
    let stop = page.evaluate("window.stop()");
    if tokio::time::timeout(Duration::from_secs(5), stop).await.is_err() {
        capture_debug!("window.stop() did not return");
    }
}

pub(crate) async fn screenshot(page: &Page) -> Option<Vec<u8>> {
    let params = ScreenshotParams::builder().full_page(true).build();
    match tokio::time::timeout(Duration::from_secs(30), page.screenshot(params)).await {
        Ok(Ok(png)) => Some(png),
        Ok(Err(err)) => {
            capture_warn!("Screenshot failed: {}", err);
            None
        }
        Err(_) => {
            capture_warn!("Screenshot timed out");
            None
        }
    }
}

pub(crate) async fn page_markup(page: &Page) -> Option<String> {
    match tokio::time::timeout(Duration::from_secs(30), page.content()).await {
        Ok(Ok(html)) => Some(html),
        Ok(Err(err)) => {
            capture_warn!("Reading page markup failed: {}", err);
            None
        }
        Err(_) => None,
    }
}
