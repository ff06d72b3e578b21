//! Media event listener for the verse audio element

use tokio::sync::mpsc::UnboundedReceiver;

use crate::audio::{MediaEvent, MediaEventKind, VerseSignal};
use super::AppController;

impl AppController {
    pub fn start_media_event_listener(&self, mut events: UnboundedReceiver<MediaEvent>) {
        let controller = self.clone();
        tracing::info!("Starting verse media event listener");

        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if controller.model.lock().await.should_quit().await {
                    tracing::debug!("Media event listener shutting down");
                    break;
                }
                controller.handle_media_event(event).await;
            }
        });
    }

    pub async fn handle_media_event(&self, event: MediaEvent) {
        match &event.kind {
            MediaEventKind::Error(e) => {
                tracing::debug!(generation = event.generation, error = %e, "MediaEvent::Error")
            }
            kind => tracing::trace!(generation = event.generation, ?kind, "MediaEvent"),
        }

        let signal = {
            let mut verse = self.verse.lock().await;
            let signal = verse.on_event(&event);
            let status = verse.status();
            drop(verse);

            let model = self.model.lock().await;
            model.set_audio_status(status.loading, status.playing).await;
            signal
        };

        if signal == Some(VerseSignal::Advance) {
            self.advance().await;
        }
    }
}
