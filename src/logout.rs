use std::sync::Arc;

use secrecy::SecretString;
use tokio::task::JoinHandle;

use crate::cookies::{get_cookie, CookieSource};
use crate::logout_client::{LogoutClient, LogoutError};
use crate::page::{Browser, ClickEvent, Page};
use crate::storage::TokenStore;

/// Names and paths the logout control works with
#[derive(Debug, Clone)]
pub struct LogoutSettings {
    pub control_id: String,
    pub csrf_cookie: String,
    pub login_page: String,
    pub token_keys: Vec<String>,
    pub alert_prefix: String,
}

impl Default for LogoutSettings {
    fn default() -> Self {
        Self {
            control_id: "logout-button".into(),
            csrf_cookie: "csrftoken".into(),
            login_page: "/accounts/login/".into(),
            token_keys: vec!["access_token".into(), "refresh_token".into()],
            alert_prefix: "An error occurred during logout: ".into(),
        }
    }
}

struct Inner {
    client: LogoutClient,
    cookies: Arc<dyn CookieSource>,
    store: Arc<dyn TokenStore>,
    browser: Arc<dyn Browser>,
    settings: LogoutSettings,
}

/// Logout control handler
///
/// Cloning is cheap and every clone drives the same capabilities. Nothing is shared
/// between two logout attempts, so overlapping clicks run independently.
#[derive(Clone)]
pub struct LogoutHandler {
    inner: Arc<Inner>,
}

impl LogoutHandler {
    pub fn new(
        client: LogoutClient,
        cookies: Arc<dyn CookieSource>,
        store: Arc<dyn TokenStore>,
        browser: Arc<dyn Browser>,
        settings: LogoutSettings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                cookies,
                store,
                browser,
                settings,
            }),
        }
    }

    pub fn settings(&self) -> &LogoutSettings {
        &self.inner.settings
    }

    /// React to an activation of the control: suppress its default, then log out in the background
    pub fn handle_click(&self, event: &mut ClickEvent) -> JoinHandle<()> {
        event.prevent_default();
        let handler = self.clone();
        tokio::spawn(async move {
            // Failures have already been surfaced to the user
            let _ = handler.logout().await;
        })
    }

    /// Perform one logout attempt
    ///
    /// On success the persisted tokens are removed and the browser goes to the login page.
    /// On failure the user gets an alert and nothing else changes.
    #[tracing::instrument(name = "Logout", skip(self))]
    pub async fn logout(&self) -> Result<(), LogoutError> {
        let csrf_token = self.csrf_token();
        match self.inner.client.logout(csrf_token.as_ref()).await {
            Ok(()) => {
                self.clear_tokens();
                self.inner.browser.navigate(&self.inner.settings.login_page);
                tracing::info!("Logged out");
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    status = ?e.status(),
                    "Logout request failed"
                );
                self.inner
                    .browser
                    .alert(&format!("{}{e}", self.inner.settings.alert_prefix));
                Err(e)
            }
        }
    }

    /// Read the anti-forgery token from the current cookies
    fn csrf_token(&self) -> Option<SecretString> {
        let name = &self.inner.settings.csrf_cookie;
        let token = self
            .inner
            .cookies
            .cookie_string()
            .and_then(|cookies| get_cookie(&cookies, name))
            .map(SecretString::from);
        if token.is_none() {
            tracing::warn!(cookie = %name, "No anti-forgery cookie, sending an empty token");
        }
        token
    }

    /// Remove every persisted token; a failed removal does not stop the others
    fn clear_tokens(&self) {
        for key in &self.inner.settings.token_keys {
            if let Err(e) = self.inner.store.remove(key) {
                tracing::error!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    "Failed to remove {} from the token store", key
                );
            }
        }
    }
}

/// Bind `handler` to its control on `page`
///
/// Returns `false` when the page has no such control, in which case the handler never fires.
pub fn init(page: &mut Page, handler: &LogoutHandler) -> bool {
    let id = handler.settings().control_id.clone();
    let handler = handler.clone();
    let bound = page.add_listener(
        &id,
        Box::new(move |event: &mut ClickEvent| handler.handle_click(event)),
    );
    if bound {
        tracing::debug!(control = %id, "Logout handler bound");
    } else {
        tracing::debug!(control = %id, "No logout control on the page");
    }
    bound
}
