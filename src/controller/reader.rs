//! Surah and juz reader: opening, loading and playing from a verse

use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::model::{load_passage, BrowserTab, PlaybackRequest, ReaderState, ReaderStatus};
use super::navigation::surah_request;
use super::AppController;

impl AppController {
    /// Open the reader on the surah or juz highlighted in the browser.
    pub async fn read_selected(&self) -> Option<JoinHandle<()>> {
        let passage = {
            let model = self.model.lock().await;
            match model.current_tab().await {
                BrowserTab::Surahs => model.selected_surah().await.map(|s| surah_request(&s)),
                BrowserTab::Juz => {
                    let catalog = model.get_catalog().await;
                    model.selected_juz().await.map(|juz| juz.request(&catalog))
                }
            }
        }?;
        Some(self.open_reader(passage).await)
    }

    /// Show `passage` in the reader, in the session's translation.
    pub async fn open_reader(&self, passage: PlaybackRequest) -> JoinHandle<()> {
        let model = self.model.lock().await;
        let translation_id = model.get_session().await.translation_id();
        let reader = ReaderState::open(passage, translation_id);
        let passage = Arc::clone(&reader.passage);
        let token = model.open_reader(reader).await;
        drop(model);

        tracing::info!(title = %passage.title, ?translation_id, "Reader opened");
        self.spawn_reader_load(passage, translation_id, token)
    }

    /// Reload the open reader when the translation changed or the last load
    /// failed.
    pub async fn refresh_reader(&self) -> Option<JoinHandle<()>> {
        let model = self.model.lock().await;
        let translation_id = model.get_session().await.translation_id();
        let (passage, token) = model
            .with_reader(|reader| {
                let stale = reader.translation_id != translation_id
                    || matches!(reader.status, ReaderStatus::Failed(_));
                stale.then(|| (Arc::clone(&reader.passage), reader.reload(translation_id)))
            })
            .await
            .flatten()?;
        drop(model);

        tracing::debug!(?translation_id, token, "Reloading reader");
        Some(self.spawn_reader_load(passage, translation_id, token))
    }

    fn spawn_reader_load(
        &self,
        passage: Arc<PlaybackRequest>,
        translation_id: Option<u32>,
        token: u64,
    ) -> JoinHandle<()> {
        let controller = self.clone();
        tokio::spawn(async move {
            let result = load_passage(
                controller.content.as_ref(),
                &controller.caches,
                &passage,
                translation_id,
            )
            .await;
            if let Err(e) = &result {
                tracing::warn!(title = %passage.title, error = %e, "Reader load failed");
            }

            let applied = controller.model.lock().await.finish_reader(token, result).await;
            if !applied {
                tracing::debug!(token, "Discarding stale reader load");
            }
        })
    }

    pub async fn close_reader(&self) {
        self.model.lock().await.close_reader().await;
    }

    pub async fn move_reader_selection(&self, delta: isize) {
        self.model
            .lock()
            .await
            .with_reader(|reader| reader.move_selection(delta))
            .await;
    }

    pub async fn reader_select_last(&self) {
        self.model.lock().await.with_reader(ReaderState::select_last).await;
    }

    /// Start Play Pleasantly at the selected verse. The reader stays open
    /// underneath the overlay.
    pub async fn play_from_reader(&self) -> Option<JoinHandle<()>> {
        let request = self
            .model
            .lock()
            .await
            .with_reader(|reader| reader.request_from_selected())
            .await
            .flatten()?;
        self.start_pleasantly(request).await
    }
}
