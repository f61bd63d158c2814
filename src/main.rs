use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::EnvFilter;

use social_signin::auth::{LoopbackAuthorizer, Platform, PlatformAuthAdapter};
use social_signin::config::{AppConfig, ConfigError};
use social_signin::identity::firebase::FirebaseIdentityClient;
use social_signin::routes::{Navigator, ReplaceNavigator, Screen};
use social_signin::screens::{AdminScreen, HomeScreen};
use social_signin::state::SessionStore;

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("terminal i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "social-signin", about = "Google sign-in demo with an entry and an admin screen")]
struct Cli {
    /// Force the sign-in strategy: `web` (popup) or `native` (browser + loopback).
    #[arg(long, env = "SIGNIN_PLATFORM")]
    platform: Option<Platform>,

    /// Loopback port for the authorization redirect.
    #[arg(long, env = "SIGNIN_LOOPBACK_PORT")]
    port: Option<u16>,

    /// Print the authorization URL instead of opening a browser.
    #[arg(long)]
    no_browser: bool,
}

#[tokio::main]
async fn main() -> Result<(), DemoError> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("social_signin=info")))
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env()?;
    if cli.platform.is_some() {
        config.platform = cli.platform;
    }
    if let Some(port) = cli.port {
        config.loopback_port = port;
    }
    if cli.no_browser {
        config.open_browser = false;
    }

    run(config).await
}

async fn run(config: AppConfig) -> Result<(), DemoError> {
    let platform = Platform::detect(config.platform);
    tracing::info!(%platform, port = config.loopback_port, "starting sign-in demo");

    let identity = Arc::new(
        FirebaseIdentityClient::new(config.firebase_api_key.clone())
            .with_base_url(config.identity_toolkit_base_url.clone()),
    );
    let authorizer = Arc::new(
        LoopbackAuthorizer::new(config.google_client_id.clone())
            .with_client_secret(config.google_client_secret.clone())
            .with_port(config.loopback_port)
            .with_open_browser(config.open_browser),
    );
    let adapter = Arc::new(PlatformAuthAdapter::new(platform, identity.clone(), authorizer));

    let store = Arc::new(SessionStore::new());
    store.attach(identity.as_ref());
    store.initialized().await;

    let navigator: Arc<dyn Navigator> = Arc::new(ReplaceNavigator::new(Screen::Entry));
    let home = HomeScreen::new(store.clone(), adapter.clone(), navigator.clone());
    let admin = AdminScreen::new(store.clone(), adapter, navigator.clone());
    home.on_mount();
    admin.on_mount();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let screen = navigator.current();
        println!();
        println!("== {} ({}) ==", screen.title(), screen.path());
        match screen {
            Screen::Entry => println!("{}", home.view()),
            Screen::Authenticated => println!("{}", admin.view()),
        }
        println!("[enter] primary action, [q] quit");

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().eq_ignore_ascii_case("q") {
            break;
        }

        // Failures are already rendered by the screen on the next pass.
        match navigator.current() {
            Screen::Entry => sign_in_or_cancel(&home, &mut lines).await?,
            Screen::Authenticated => {
                let _ = admin.press_sign_out().await;
            }
        }
    }

    home.on_unmount();
    admin.on_unmount();
    store.detach();
    Ok(())
}

/// Start a sign-in and wait for it or for the next line of input, whichever
/// comes first. Input drops the attempt, which resets the flow and stops any
/// loopback listener.
async fn sign_in_or_cancel(home: &HomeScreen, lines: &mut Lines<BufReader<Stdin>>) -> Result<(), DemoError> {
    let mut press = Box::pin(home.press_sign_in());

    // One poll claims the flow, so the pending view below is accurate.
    let finished = tokio::select! {
        biased;
        _ = &mut press => true,
        () = std::future::ready(()) => false,
    };
    if finished {
        return Ok(());
    }

    println!("{}", home.view());
    println!("[enter] cancel");
    let cancelled = tokio::select! {
        _ = &mut press => false,
        line = lines.next_line() => {
            line?;
            true
        }
    };
    drop(press);
    if cancelled {
        home.abandon_sign_in();
    }
    Ok(())
}
