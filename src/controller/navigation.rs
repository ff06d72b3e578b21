//! Catalogue loading and surah browser actions

use crate::error::SessionError;
use crate::model::{
    BrowserTab, Catalog, PlaybackRequest, QuranApiClient, RangeTarget, Segment, SurahSummary,
};
use super::AppController;

const NO_RECITERS: &str = "Unable to load reciters";

/// Selections forced from the command line, taking precedence over stored ones
#[derive(Clone, Copy, Debug, Default)]
pub struct SelectionOverrides {
    pub reciter_id: Option<u32>,
    pub translation_id: Option<u32>,
}

impl AppController {
    /// Fetch surahs, reciters and translations concurrently. Failures are
    /// reported to the user but never abort startup.
    pub async fn load_catalog(&self, client: &QuranApiClient, overrides: SelectionOverrides) {
        tracing::debug!("Loading catalogue");
        let (surahs, reciters, translations) = tokio::join!(
            client.list_surahs(),
            client.list_reciters(),
            client.list_translations()
        );

        let mut catalog = Catalog::default();
        let mut first_error = None;

        match surahs {
            Ok(list) => catalog.surahs = list,
            Err(e) => first_error = first_error.or(Some(e)),
        }
        match reciters {
            Ok(list) => catalog.reciters = list,
            Err(e) => first_error = first_error.or(Some(e)),
        }
        match translations {
            Ok(list) => catalog.translations = list,
            Err(e) => first_error = first_error.or(Some(e)),
        }

        tracing::info!(
            surahs = catalog.surahs.len(),
            reciters = catalog.reciters.len(),
            translations = catalog.translations.len(),
            "Catalogue loaded"
        );

        if let Some(e) = first_error {
            let model = self.model.lock().await;
            model.set_error(Self::format_error(&anyhow::Error::new(e))).await;
        }

        self.apply_catalog(catalog, overrides).await;
    }

    /// Store the catalogue and settle the reciter and translation selections.
    pub async fn apply_catalog(&self, catalog: Catalog, overrides: SelectionOverrides) {
        let stored = self.preferences.get().await;
        let reciter_id = catalog
            .default_reciter(overrides.reciter_id.or(stored.reciter_id))
            .or(overrides.reciter_id);
        let translation_id = catalog
            .default_translation(overrides.translation_id.or(stored.translation_id))
            .or(overrides.translation_id);

        {
            let model = self.model.lock().await;
            model.set_catalog(catalog).await;
        }

        tracing::debug!(?reciter_id, ?translation_id, "Initial selections");

        // A session opened before the catalogue arrived is rebuilt here
        if let Some(id) = translation_id {
            self.change_translation(id).await;
        }
        if let Some(id) = reciter_id {
            self.change_reciter(id).await;
            return;
        }

        // Without any reciter a waiting session could never be built
        let failed = {
            let model = self.model.lock().await;
            model
                .with_session(|session| {
                    session.fail_unbuildable(SessionError::Network(NO_RECITERS.to_string()))
                })
                .await
        };
        if failed {
            tracing::warn!("No reciters available, failing the waiting session");
        }
    }

    /// Play the surah or juz highlighted in the browser.
    pub async fn play_selected(&self) {
        let request = {
            let model = self.model.lock().await;
            match model.current_tab().await {
                BrowserTab::Surahs => model.selected_surah().await.map(|s| surah_request(&s)),
                BrowserTab::Juz => {
                    let catalog = model.get_catalog().await;
                    model.selected_juz().await.map(|juz| juz.request(&catalog))
                }
            }
        };
        if let Some(request) = request {
            self.start_pleasantly(request).await;
        }
    }

    /// Close the ayah range prompt and play or read what was typed.
    pub async fn submit_range_prompt(&self) {
        let (input, target, surah) = {
            let model = self.model.lock().await;
            (
                model.take_range_prompt().await,
                model.range_target().await,
                model.selected_surah().await,
            )
        };
        let (Some(input), Some(surah)) = (input, surah) else {
            return;
        };

        let Some(segment) = Segment::parse_range(surah.id, &input) else {
            tracing::debug!(input = %input, "Rejected ayah range");
            let model = self.model.lock().await;
            model
                .set_error(format!("Invalid ayah range \"{}\". Use 255, 1-7 or 100-.", input.trim()))
                .await;
            return;
        };

        let label = match input.trim() {
            "" => surah_label(&surah),
            range => format!("{} {}", surah_label(&surah), range),
        };
        let request = with_surah_subtitle(
            PlaybackRequest::new(surah.name_simple.clone(), vec![segment.with_label(label)]),
            &surah,
        );
        match target {
            RangeTarget::Play => {
                self.start_pleasantly(request).await;
            }
            RangeTarget::Read => {
                self.open_reader(request).await;
            }
        }
    }
}

/// The whole of `surah` as a labelled request.
pub(super) fn surah_request(surah: &SurahSummary) -> PlaybackRequest {
    let segment = Segment::surah(surah.id).with_label(surah_label(surah));
    with_surah_subtitle(PlaybackRequest::new(surah.name_simple.clone(), vec![segment]), surah)
}

fn surah_label(surah: &SurahSummary) -> String {
    format!("Surah {} - {}", surah.id, surah.name_simple)
}

fn with_surah_subtitle(request: PlaybackRequest, surah: &SurahSummary) -> PlaybackRequest {
    match surah.translated_name.as_ref().filter(|t| !t.name.is_empty()) {
        Some(name) => request.with_subtitle(name.name.clone()),
        None if !surah.name_arabic.is_empty() => request.with_subtitle(surah.name_arabic.clone()),
        None => request,
    }
}
