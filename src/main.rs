mod audio;
mod config;
mod controller;
mod error;
mod logging;
mod model;
mod view;

use std::io;
use std::sync::Arc;
use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use view::AppView;
use audio::{AmbientSound, AudioBackend, AudioElement, NullElement, VersePlayer};
use config::Config;
use controller::{AppController, AudioSlots};
use model::{AppModel, PlaybackSession, PreferencesStore, QuranApiClient};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    config.validate().context("invalid configuration")?;

    if let Err(e) = logging::init_logging(&config.log_dir) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    tracing::info!("=== tadabbur-rs Starting ===");

    let preferences = PreferencesStore::new(&config.cache_dir);
    if let Err(e) = preferences.load_from_disk().await {
        tracing::warn!(error = %e, "Could not load preferences, using defaults");
    }

    let client = QuranApiClient::new(&config.api_base_url, config.http_timeout())?;

    // The stream has to outlive every element playing through it
    let (verse_tx, verse_rx) = mpsc::unbounded_channel();
    let (audio_backend, verse_element, ambience_element, audio_error) = match AudioBackend::open() {
        Ok(backend) => {
            let verse: Box<dyn AudioElement> =
                Box::new(backend.element("verse", client.http().clone(), Some(verse_tx)));
            let ambience: Box<dyn AudioElement> =
                Box::new(backend.element("ambience", client.http().clone(), None));
            (Some(backend), verse, ambience, None)
        }
        Err(e) => {
            tracing::error!(error = %e, "Audio output unavailable, continuing without sound");
            let verse: Box<dyn AudioElement> = Box::new(NullElement::default());
            let ambience: Box<dyn AudioElement> = Box::new(NullElement::default());
            (None, verse, ambience, Some(format!("Audio output unavailable: {}", e)))
        }
    };

    let stored = preferences.get().await;
    let session = PlaybackSession::new(
        config.reciter.or(stored.reciter_id),
        config.translation.or(stored.translation_id),
    );
    let model = Arc::new(Mutex::new(AppModel::new(session)));

    if let Some(message) = audio_error {
        model.lock().await.set_error(message).await;
    }

    let controller = AppController::new(
        model.clone(),
        Arc::new(client.clone()),
        AudioSlots {
            verse: VersePlayer::new(verse_element),
            ambience: AmbientSound::new(ambience_element, config.ambience.clone(), config.ambience_volume),
        },
        preferences,
    )
    .with_placeholder_delay(config.missing_audio_delay());

    controller.start_media_event_listener(verse_rx);

    let controller_for_init = controller.clone();
    let overrides = config.overrides();
    tokio::spawn(async move {
        controller_for_init.load_catalog(&client, overrides).await;
    });

    tracing::info!("Starting TUI...");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, model.clone(), controller.clone()).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = ?err, "Application error");
    }

    controller.close_pleasantly().await;
    drop(audio_backend);

    tracing::info!("tadabbur-rs shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    model: Arc<Mutex<AppModel>>,
    controller: AppController,
) -> io::Result<()> {
    loop {
        // Get current state
        let (ui_state, catalog, pleasantly, should_quit) = {
            let model_guard = model.lock().await;

            // Auto-clear old errors (after 5 seconds)
            model_guard.auto_clear_old_errors().await;

            (
                model_guard.get_ui_state().await,
                model_guard.get_catalog().await,
                model_guard.get_pleasantly_view().await,
                model_guard.should_quit().await,
            )
        };

        // Draw UI
        terminal.draw(|f| {
            AppView::render(f, &ui_state, &catalog, &pleasantly);
        })?;

        // Short poll keeps audio state changes visible without input
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if let Err(e) = controller.handle_key_event(key).await {
                    tracing::warn!(error = %e, "Key handling failed");
                }
            }
        }

        if should_quit {
            break;
        }
    }

    Ok(())
}
