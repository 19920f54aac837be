use std::path::PathBuf;
use std::time::Duration;

use capture_core::PageKey;
use capture_logging::{capture_debug, capture_info, capture_warn};
use chromiumoxide::Page;
use chrono::Utc;

use crate::browser::{self, BrowserSession};
use crate::diagnostics::DebugSnapshots;
use crate::retry::RetryPolicy;
use crate::{FailureKind, FetchError, Stage};

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// The archive's one-time terms-of-service overlay.
#[derive(Debug, Clone)]
pub struct ConsentSettings {
    pub prompt_id: String,
    /// Element ids clicked in order to accept.
    pub accept_ids: Vec<String>,
    /// How long to look for the prompt after navigation.
    pub probe: Duration,
    pub dismiss_timeout: Duration,
}

impl Default for ConsentSettings {
    fn default() -> Self {
        Self {
            prompt_id: "tos_prompt".to_string(),
            accept_ids: vec![
                "tos_agree".to_string(),
                "data_processing_agree".to_string(),
                "accept_tos".to_string(),
            ],
            probe: Duration::from_secs(2),
            dismiss_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub user_agent: String,
    pub window_size: (u32, u32),
    pub headless: bool,
    /// Explicit browser binary; auto-detected when `None`.
    pub browser_executable: Option<PathBuf>,
    /// Ceiling for one navigation attempt.
    pub navigation_timeout: Duration,
    /// Ceiling for any single browser protocol request.
    pub page_load_timeout: Duration,
    pub consent: ConsentSettings,
    /// CSS selector that confirms the listing rendered.
    pub render_marker: String,
    pub render_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            window_size: (1920, 1080),
            headless: true,
            browser_executable: None,
            navigation_timeout: Duration::from_secs(60),
            page_load_timeout: Duration::from_secs(60),
            consent: ConsentSettings::default(),
            render_marker: ".work".to_string(),
            render_timeout: Duration::from_secs(20),
            poll_interval: Duration::from_millis(250),
        }
    }
}

/// Source of rendered listing markup.
#[async_trait::async_trait]
pub trait PageFetcher: Send {
    /// Return the fully rendered markup of `url`.
    async fn fetch(&mut self, key: PageKey, url: &str) -> Result<String, FetchError>;

    /// Release the underlying session so the next fetch starts a fresh one.
    async fn recycle(&mut self) -> Result<(), FetchError>;

    /// Release the underlying session. Safe to call more than once.
    async fn shutdown(&mut self);
}

/// Fetches pages through a headless browser. The session is launched on the
/// first fetch, so runs served entirely from checkpoints never start one.
pub struct BrowserFetcher {
    settings: FetchSettings,
    retry: RetryPolicy,
    snapshots: Option<DebugSnapshots>,
    session: Option<BrowserSession>,
}

impl BrowserFetcher {
    pub fn new(settings: FetchSettings, retry: RetryPolicy, snapshots: Option<DebugSnapshots>) -> Self {
        Self {
            settings,
            retry,
            snapshots,
            session: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }
}

#[async_trait::async_trait]
impl PageFetcher for BrowserFetcher {
    async fn fetch(&mut self, key: PageKey, url: &str) -> Result<String, FetchError> {
        let session = match self.session.take() {
            Some(session) => session,
            None => BrowserSession::launch(&self.settings).await?,
        };
        let page = self.session.insert(session).page().clone();

        let visit = Visit {
            key,
            settings: &self.settings,
            retry: &self.retry,
            snapshots: self.snapshots.as_ref(),
            page: &page,
        };
        visit.navigate(url).await?;
        visit.dismiss_consent().await;
        visit.await_render().await?;
        visit.capture().await
    }

    /// Close the running session; the next fetch launches a fresh one.
    async fn recycle(&mut self) -> Result<(), FetchError> {
        if let Some(session) = self.session.take() {
            capture_info!("Restarting browser session for stability");
            session.close().await;
        }
        Ok(())
    }

    async fn shutdown(&mut self) {
        if let Some(session) = self.session.take() {
            session.close().await;
        }
    }
}

/// One page load on an open tab.
struct Visit<'a> {
    key: PageKey,
    settings: &'a FetchSettings,
    retry: &'a RetryPolicy,
    snapshots: Option<&'a DebugSnapshots>,
    page: &'a Page,
}

impl Visit<'_> {
    fn context(&self, stage: Stage) -> String {
        format!("year={} page={} stage={}", self.key.year, self.key.page, stage)
    }

    async fn navigate(&self, url: &str) -> Result<(), FetchError> {
        let timeout = self.settings.navigation_timeout;
        let page = self.page;
        let label = self.context(Stage::Navigate);

        let result = self
            .retry
            .run(
                &label,
                |attempt| async move {
                    capture_debug!("navigate attempt {} to {}", attempt, url);
                    match tokio::time::timeout(timeout, page.goto(url)).await {
                        Ok(Ok(_)) => Ok(()),
                        Ok(Err(err)) => Err(FetchError::new(
                            FailureKind::Navigation,
                            Stage::Navigate,
                            err.to_string(),
                        )),
                        Err(_) => Err(FetchError::new(
                            FailureKind::Timeout,
                            Stage::Navigate,
                            format!("page did not load within {timeout:?}"),
                        )),
                    }
                },
                |_| browser::stop_loading(page),
            )
            .await;

        match result {
            Ok(()) => Ok(()),
            Err(exhausted) => {
                self.snapshot(Stage::Navigate).await;
                Err(FetchError::new(
                    FailureKind::NavigationExhausted {
                        attempts: exhausted.attempts,
                    },
                    Stage::Navigate,
                    exhausted.last_error.to_string(),
                ))
            }
        }
    }

    /// Accept the terms overlay if it shows up. Never fails the fetch: the
    /// session may already have accepted.
    async fn dismiss_consent(&self) {
        let consent = &self.settings.consent;
        let interval = self.settings.poll_interval;
        let page = self.page;
        let prompt = consent.prompt_id.as_str();

        let shown = browser::wait_until(consent.probe, interval, || {
            browser::is_displayed(page, prompt)
        })
        .await;
        if !shown {
            capture_debug!("{}: no consent prompt", self.context(Stage::Consent));
            return;
        }

        capture_info!(
            "{}: consent prompt detected, accepting terms",
            self.context(Stage::Consent)
        );
        for id in &consent.accept_ids {
            let selector = format!("#{id}");
            let clicked = match page.find_element(selector.as_str()).await {
                Ok(element) => element.click().await.map(|_| ()),
                Err(err) => Err(err),
            };
            if let Err(err) = clicked {
                capture_warn!(
                    "{}: could not click {} (terms may already be accepted): {}",
                    self.context(Stage::Consent),
                    selector,
                    err
                );
                return;
            }
        }

        let dismissed = browser::wait_until(consent.dismiss_timeout, interval, || async move {
            !browser::is_displayed(page, prompt).await
        })
        .await;
        if dismissed {
            capture_info!("{}: terms accepted", self.context(Stage::Consent));
        } else {
            capture_warn!(
                "{}: consent prompt still visible after {:?}",
                self.context(Stage::Consent),
                consent.dismiss_timeout
            );
        }
    }

    async fn await_render(&self) -> Result<(), FetchError> {
        let page = self.page;
        let marker = self.settings.render_marker.as_str();
        let rendered = browser::wait_until(
            self.settings.render_timeout,
            self.settings.poll_interval,
            || async move { page.find_element(marker).await.is_ok() },
        )
        .await;
        if rendered {
            return Ok(());
        }
        self.snapshot(Stage::Render).await;
        Err(FetchError::new(
            FailureKind::RenderTimeout,
            Stage::Render,
            format!(
                "no {marker:?} element within {:?}; possibly rate limited or markup changed",
                self.settings.render_timeout
            ),
        ))
    }

    async fn capture(&self) -> Result<String, FetchError> {
        let html = self
            .page
            .content()
            .await
            .map_err(|err| FetchError::new(FailureKind::Browser, Stage::Capture, err.to_string()))?;
        if html.trim().is_empty() {
            return Err(FetchError::new(
                FailureKind::Browser,
                Stage::Capture,
                "page markup is empty",
            ));
        }
        Ok(html)
    }

    async fn snapshot(&self, stage: Stage) {
        let Some(snapshots) = self.snapshots else {
            return;
        };
        let png = browser::screenshot(self.page).await;
        let html = browser::page_markup(self.page).await;
        match snapshots.save(self.key, stage, Utc::now(), png.as_deref(), html.as_deref()) {
            Ok(paths) => capture_info!(
                "{}: debug snapshot saved (image={:?}, markup={:?})",
                self.context(stage),
                paths.image,
                paths.markup
            ),
            Err(err) => capture_warn!("{}: debug snapshot failed: {}", self.context(stage), err),
        }
    }
}
