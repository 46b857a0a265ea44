use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::{JoinError, JoinHandle};

/// Navigation and user notification capabilities of the hosting browser
pub trait Browser: Send + Sync {
    /// Current location path
    fn location(&self) -> String;
    /// Navigate away to `path`
    fn navigate(&self, path: &str);
    /// Show a blocking notification to the user
    fn alert(&self, message: &str);
}

#[derive(Debug, Default)]
struct BrowserState {
    location: String,
    navigations: Vec<String>,
    alerts: Vec<String>,
}

/// Headless browser that records what happens to it
#[derive(Debug, Default)]
pub struct RecordingBrowser {
    state: Mutex<BrowserState>,
}

impl RecordingBrowser {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(BrowserState {
                location: location.into(),
                ..BrowserState::default()
            }),
        }
    }

    /// Every location navigated to, in order
    pub fn navigations(&self) -> Vec<String> {
        self.state().navigations.clone()
    }

    /// Every alert shown, in order
    pub fn alerts(&self) -> Vec<String> {
        self.state().alerts.clone()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, BrowserState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Browser for RecordingBrowser {
    fn location(&self) -> String {
        self.state().location.clone()
    }

    fn navigate(&self, path: &str) {
        tracing::info!(location = %path, "Navigating");
        let mut state = self.state();
        state.location = path.to_string();
        state.navigations.push(path.to_string());
    }

    fn alert(&self, message: &str) {
        tracing::warn!(%message, "Alert shown to the user");
        self.state().alerts.push(message.to_string());
    }
}

/// Activation event delivered to click listeners
#[derive(Debug, Default)]
pub struct ClickEvent {
    default_prevented: bool,
}

impl ClickEvent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop the control's native action from running after dispatch
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub const fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Click listener; the returned task is whatever asynchronous work the click started
pub type Listener = Box<dyn Fn(&mut ClickEvent) -> JoinHandle<()> + Send + Sync>;

/// Interactive element addressable by id
struct Control {
    href: Option<String>,
    listeners: Vec<Listener>,
}

/// Outcome of dispatching one click
#[derive(Debug)]
pub struct Activation {
    event: ClickEvent,
    tasks: Vec<JoinHandle<()>>,
}

impl Activation {
    pub const fn default_prevented(&self) -> bool {
        self.event.default_prevented()
    }

    /// Number of asynchronous tasks started by listeners
    pub fn started(&self) -> usize {
        self.tasks.len()
    }

    /// Wait for every task started by this click to finish
    pub async fn settled(self) -> Result<(), JoinError> {
        for task in self.tasks {
            task.await?;
        }
        Ok(())
    }
}

/// Hosting page: a set of controls and the browser they live in
pub struct Page {
    browser: Arc<dyn Browser>,
    controls: HashMap<String, Control>,
}

impl Page {
    pub fn new(browser: Arc<dyn Browser>) -> Self {
        Self {
            browser,
            controls: HashMap::new(),
        }
    }

    /// Add a control; `href` is the location its native action navigates to
    #[must_use]
    pub fn with_control(mut self, id: &str, href: Option<&str>) -> Self {
        self.controls.insert(
            id.to_string(),
            Control {
                href: href.map(String::from),
                listeners: Vec::new(),
            },
        );
        self
    }

    /// Attach a listener to the control `id`, returning `false` if there is no such control
    pub fn add_listener(&mut self, id: &str, listener: Listener) -> bool {
        self.controls.get_mut(id).is_some_and(|control| {
            control.listeners.push(listener);
            true
        })
    }

    /// Dispatch a click on the control `id`
    ///
    /// Listeners run in registration order. If none of them prevented the default, the
    /// control's native action navigates the browser to its `href`. Clicking an unknown
    /// control does nothing. Must be called from within a tokio runtime.
    pub fn click(&self, id: &str) -> Activation {
        let mut event = ClickEvent::new();
        let Some(control) = self.controls.get(id) else {
            return Activation {
                event,
                tasks: Vec::new(),
            };
        };

        let tasks = control
            .listeners
            .iter()
            .map(|listener| listener(&mut event))
            .collect();

        if !event.default_prevented() {
            if let Some(href) = &control.href {
                self.browser.navigate(href);
            }
        }

        Activation { event, tasks }
    }
}
