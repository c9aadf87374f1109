//! ClubVote - Terminal Club Voting
//!
//! Connect a wallet, propose ideas for the club and vote on them. Votes and
//! proposals go through a short simulated confirmation before they land.

use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use color_eyre::Result;
use crossterm::event::{Event, EventStream, KeyEventKind};
use futures::StreamExt;
use ratatui::{backend::Backend, Terminal};
use tokio::sync::mpsc;
use tracing::info;

use clubvote::application::{App, AppOptions};
use clubvote::cli::Cli;
use clubvote::infrastructure::{logging, Settings, WalletProvider};
use clubvote::presentation::{render_ui, InputHandler};
use clubvote::{errors, tui};

/// Entry point for the ClubVote terminal application.
///
/// The runtime is built by hand: the rpc provider owns a blocking HTTP client
/// that has to be created and dropped outside of async context.
///
/// # Errors
///
/// Returns an error if settings are invalid, the provider cannot be created,
/// or the terminal fails during runtime.
fn main() -> Result<()> {
    errors::init()?;
    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;
    cli.apply(&mut settings);
    let _guard = logging::init(&settings)?;
    info!(provider = ?settings.provider.kind, "starting clubvote");

    let provider = settings.provider.build()?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let mut terminal = tui::enter()?;
    let res = runtime.block_on(run_app(&mut terminal, &settings, provider.clone()));
    tui::restore()?;
    terminal.show_cursor()?;

    runtime.shutdown_background();
    drop(provider);

    if let Err(ref err) = res {
        tracing::error!(error = %err, "clubvote stopped");
    }
    res
}

/// Main application event loop.
///
/// Redraws after every input event, background result, provider event or
/// tick. A network change tears the whole state down and starts over with a
/// fresh [`App`]; dropping the old one releases its provider subscription.
async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    settings: &Settings,
    provider: Option<Arc<dyn WalletProvider>>,
) -> Result<()> {
    let mut input = EventStream::new();
    let mut ticker = tokio::time::interval(settings.ui.tick_rate());

    loop {
        let (message_tx, mut messages) = mpsc::unbounded_channel();
        let (event_tx, mut provider_events) = mpsc::unbounded_channel();
        let mut app = App::new(
            AppOptions::from_settings(settings, provider.clone()),
            message_tx,
            event_tx,
        );
        app.start();

        loop {
            terminal.draw(|f| render_ui(f, &app))?;

            tokio::select! {
                event = input.next() => match event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        InputHandler::handle_key_event(&mut app, key.code, key.modifiers);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                    None => return Ok(()),
                },
                Some(message) = messages.recv() => app.handle_message(message),
                Some(event) = provider_events.recv() => app.handle_provider_event(event),
                _ = ticker.tick() => app.tick(Instant::now()),
            }

            if app.should_quit {
                return Ok(());
            }
            if app.reload_requested {
                break;
            }
        }
        info!("network changed, reloading");
    }
}
