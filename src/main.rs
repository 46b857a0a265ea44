use std::sync::Arc;
use std::{env, io, process};

use anyhow::Context;
use reqwest::cookie::Jar;

use session_logout::configuration::Settings;
use session_logout::cookies::JarCookies;
use session_logout::logout::{init, LogoutHandler};
use session_logout::page::{Browser, Page, RecordingBrowser};
use session_logout::storage::FileStore;
use session_logout::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
#[allow(clippy::redundant_pub_crate)]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = get_subscriber("session-logout".into(), "info".into(), io::stderr);
    init_subscriber(subscriber);

    // Retrieve settings
    let config = Settings::get_config().context("Failed to load configuration")?;
    let base_url = config
        .application
        .base_url()
        .context("Invalid base URL")?;

    // Load the session cookies, shaped like `csrftoken=...; sessionid=...`
    let jar = Arc::new(Jar::default());
    if let Ok(cookies) = env::var("SESSION_LOGOUT_COOKIES") {
        for cookie in cookies.split(';').map(str::trim).filter(|c| !c.is_empty()) {
            jar.add_cookie_str(cookie, &base_url);
        }
    }

    // Prepare the capabilities and the handler
    let client = config
        .logout_client(Some(jar.clone()))
        .context("Failed to build the logout client")?;
    let browser = Arc::new(RecordingBrowser::new("/"));
    let handler = LogoutHandler::new(
        client,
        Arc::new(JarCookies::new(jar, base_url)),
        Arc::new(FileStore::open(&config.storage.token_file)),
        browser.clone(),
        config.logout_settings(),
    );

    // Bind the handler and activate the control once
    let control_id = config.logout.control_id.clone();
    let mut page = Page::new(browser.clone()).with_control(&control_id, None);
    init(&mut page, &handler);
    page.click(&control_id)
        .settled()
        .await
        .context("Logout task failed")?;

    if let Some(alert) = browser.alerts().last() {
        eprintln!("{alert}");
        process::exit(1);
    }
    println!("{}", browser.location());

    Ok(())
}
