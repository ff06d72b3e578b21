//! Play Pleasantly session control: starting, building, navigating and
//! keeping the verse audio bound to the current slide

use futures::future::{BoxFuture, FutureExt};
use tokio::task::JoinHandle;

use crate::audio::CueAction;
use crate::model::{build_slides, Advance, BuildJob, CueKey, PlaybackRequest};

use super::AppController;

impl AppController {
    /// Open the overlay for `request` and kick off the slide build.
    ///
    /// Requests without segments are logged and ignored. The returned handle
    /// tracks the spawned build, if one was started.
    pub async fn start_pleasantly(&self, request: PlaybackRequest) -> Option<JoinHandle<()>> {
        let title = request.title.clone();
        let result = {
            let model = self.model.lock().await;
            model.with_session(|session| session.start(request)).await
        };

        let job = match result {
            Ok(job) => job,
            Err(e) => {
                tracing::warn!(title = %title, error = %e, "Ignoring playback request");
                return None;
            }
        };

        tracing::info!(title = %title, "Play Pleasantly started");
        self.sync_audio().await;
        self.start_ambience().await;

        match job {
            Some(job) => Some(self.spawn_build(job)),
            None => {
                tracing::warn!("No reciter selected yet, build deferred until the catalogue loads");
                None
            }
        }
    }

    pub(crate) fn spawn_build(&self, job: BuildJob) -> JoinHandle<()> {
        let controller = self.clone();
        tokio::spawn(async move {
            controller.run_build(job).await;
        })
    }

    /// Build slides for `job` and apply them if the job is still current.
    pub(crate) async fn run_build(&self, job: BuildJob) {
        let started = std::time::Instant::now();
        let result = build_slides(
            self.content.as_ref(),
            &self.caches,
            &job.request,
            job.reciter_id,
            job.translation_id,
        )
        .await;

        let outcome = match &result {
            Ok(slides) => Ok(slides.len()),
            Err(e) => Err(e.to_string()),
        };

        let applied = {
            let model = self.model.lock().await;
            model
                .with_session(|session| session.finish_build(job.token, result))
                .await
        };

        if !applied {
            tracing::debug!(token = job.token, "Discarding stale slide build");
            return;
        }

        match outcome {
            Ok(count) => tracing::info!(
                token = job.token,
                slides = count,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Slides ready"
            ),
            Err(e) => tracing::error!(token = job.token, error = %e, "Slide build failed"),
        }

        self.sync_audio().await;
    }

    /// Bind the verse audio to whatever the session currently cues.
    pub(crate) async fn sync_audio(&self) {
        let mut verse = self.verse.lock().await;
        let cue = {
            let model = self.model.lock().await;
            model.with_session(|session| session.cue()).await
        };

        if let CueAction::Placeholder(key) = verse.sync(cue.as_ref()) {
            let controller = self.clone();
            let delay = self.placeholder_delay;
            verse.set_placeholder(tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                // Detached so that the cue change it causes cannot abort it midway
                tokio::spawn(controller.on_placeholder_elapsed(key));
            }));
        }

        let status = verse.status();
        drop(verse);

        let model = self.model.lock().await;
        model.set_audio_status(status.loading, status.playing).await;
    }

    // Boxed to break the advance -> sync_audio -> timer type cycle
    fn on_placeholder_elapsed(self, key: CueKey) -> BoxFuture<'static, ()> {
        async move {
            let still_current = {
                let model = self.model.lock().await;
                model
                    .with_session(|session| {
                        !session.is_complete() && session.cue().map(|c| c.key) == Some(key)
                    })
                    .await
            };

            if still_current {
                tracing::debug!(index = key.index, "Placeholder delay elapsed");
                self.advance().await;
            }
        }
        .boxed()
    }

    pub async fn advance(&self) {
        let outcome = {
            let model = self.model.lock().await;
            model.with_session(|session| session.advance()).await
        };

        match outcome {
            Advance::Moved(index) => {
                tracing::debug!(index, "Advanced to next slide");
                self.sync_audio().await;
            }
            Advance::Completed => {
                tracing::info!("Reached the end of the selection");
                self.verse.lock().await.stop();
                self.refresh_audio_status().await;
            }
            Advance::Ignored => {}
        }
    }

    pub async fn retreat(&self) {
        let moved = {
            let model = self.model.lock().await;
            model.with_session(|session| session.retreat()).await
        };

        if let Some(index) = moved {
            tracing::debug!(index, "Moved to previous slide");
            self.sync_audio().await;
        }
    }

    pub async fn jump_to(&self, index: usize) {
        let moved = {
            let model = self.model.lock().await;
            model.with_session(|session| session.jump_to(index)).await
        };

        if moved.is_some() {
            self.sync_audio().await;
        }
    }

    pub async fn toggle_verse_playback(&self) {
        let playing = self.verse.lock().await.toggle();
        tracing::debug!(playing, "Verse playback toggled");
        self.refresh_audio_status().await;
    }

    /// Close the overlay, releasing both audio slots.
    pub async fn close_pleasantly(&self) {
        {
            let model = self.model.lock().await;
            model.with_session(|session| session.close()).await;
        }

        self.verse.lock().await.dispose();
        self.ambience.lock().await.dispose();
        self.refresh_audio_status().await;
        tracing::info!("Play Pleasantly closed");
    }

    pub async fn minimize_pleasantly(&self) {
        let model = self.model.lock().await;
        model.with_session(|session| session.minimize()).await;
    }

    pub async fn expand_pleasantly(&self) {
        let model = self.model.lock().await;
        model.with_session(|session| session.expand()).await;
    }

    pub async fn toggle_ambience(&self) {
        let enabled = self.ambience.lock().await.toggle();
        let model = self.model.lock().await;
        model.set_ambience_enabled(enabled).await;
    }

    async fn start_ambience(&self) {
        let enabled = {
            let mut ambience = self.ambience.lock().await;
            ambience.start();
            ambience.is_enabled()
        };
        let model = self.model.lock().await;
        model.set_ambience_enabled(enabled).await;
    }

    pub(crate) async fn refresh_audio_status(&self) {
        let status = self.verse.lock().await.status();
        let model = self.model.lock().await;
        model.set_audio_status(status.loading, status.playing).await;
    }

    // ========================================================================
    // Reciter and translation selection
    // ========================================================================

    pub async fn change_reciter(&self, reciter_id: u32) -> Option<JoinHandle<()>> {
        let job = {
            let model = self.model.lock().await;
            model
                .with_session(|session| session.change_reciter(reciter_id))
                .await
        };
        tracing::info!(reciter_id, rebuild = job.is_some(), "Reciter changed");
        self.after_selection_change(job).await
    }

    pub async fn change_translation(&self, translation_id: u32) -> Option<JoinHandle<()>> {
        let job = {
            let model = self.model.lock().await;
            model
                .with_session(|session| session.change_translation(translation_id))
                .await
        };
        tracing::info!(translation_id, rebuild = job.is_some(), "Translation changed");
        self.after_selection_change(job).await
    }

    pub async fn cycle_reciter(&self, forward: bool) -> Option<JoinHandle<()>> {
        let next = {
            let model = self.model.lock().await;
            let current = model.with_session(|session| session.reciter_id()).await;
            model.get_catalog().await.cycle_reciter(current, forward)
        };
        self.change_reciter(next?).await
    }

    pub async fn cycle_translation(&self, forward: bool) -> Option<JoinHandle<()>> {
        let next = {
            let model = self.model.lock().await;
            let current = model.with_session(|session| session.translation_id()).await;
            model.get_catalog().await.cycle_translation(current, forward)
        };
        self.change_translation(next?).await
    }

    async fn after_selection_change(&self, job: Option<BuildJob>) -> Option<JoinHandle<()>> {
        self.persist_selections().await;
        let job = job?;
        self.sync_audio().await;
        Some(self.spawn_build(job))
    }

    async fn persist_selections(&self) {
        let (reciter_id, translation_id) = {
            let model = self.model.lock().await;
            model
                .with_session(|session| (session.reciter_id(), session.translation_id()))
                .await
        };

        if let Err(e) = self.preferences.update(reciter_id, translation_id).await {
            tracing::warn!(error = %e, "Failed to save preferences");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::audio::{MediaEvent, MediaEventKind, AMBIENCE_VOLUME};
    use crate::controller::tests::{harness, silent_harness};
    use crate::model::{FakeContent, PlaybackRequest, Segment, SessionStatus};

    fn verses(surah: u16, start: u16, end: u16) -> PlaybackRequest {
        PlaybackRequest::new("Test", vec![Segment::range(surah, start, end)])
    }

    fn audio(reciter: u32, key: &str) -> Option<String> {
        Some(format!("https://audio.test/{}/{}.mp3", reciter, key))
    }

    #[tokio::test]
    async fn start_builds_slides_and_binds_the_first_one() {
        let h = harness(FakeContent::with_surahs(&[(1, 7), (2, 10)])).await;

        let build = h.controller.start_pleasantly(verses(2, 3, 5)).await.unwrap();
        build.await.unwrap();

        let view = h.controller.model.lock().await.get_pleasantly_view().await;
        assert_eq!(view.status, SessionStatus::Ready);
        assert_eq!(view.total, 3);
        assert_eq!(view.index, 0);
        assert_eq!(view.progress_text(), "Verse 1 of 3");
        assert_eq!(h.verse.source(), audio(7, "2:3"));
        assert!(view.audio_loading);

        let ambience = h.ambience.log.lock().unwrap();
        assert!(ambience.looping);
        assert_eq!(ambience.volume, AMBIENCE_VOLUME);
        assert_eq!(ambience.source.as_deref(), Some("rain.mp3"));
    }

    #[tokio::test]
    async fn requests_without_segments_are_ignored() {
        let h = harness(FakeContent::with_surahs(&[(2, 10)])).await;

        let build = h
            .controller
            .start_pleasantly(PlaybackRequest::new("Nothing", Vec::new()))
            .await;

        assert!(build.is_none());
        let view = h.controller.model.lock().await.get_pleasantly_view().await;
        assert_eq!(view.status, SessionStatus::Idle);
        assert_eq!(h.ambience.source(), None);
        assert!(h.content.calls().is_empty());
    }

    #[tokio::test]
    async fn ended_audio_moves_to_the_next_slide() {
        let h = harness(FakeContent::with_surahs(&[(2, 10)])).await;
        h.controller.start_pleasantly(verses(2, 3, 5)).await.unwrap().await.unwrap();

        let stale = h.verse.generation() - 1;
        h.controller
            .handle_media_event(MediaEvent {
                generation: stale,
                kind: MediaEventKind::Ended,
            })
            .await;
        let view = h.controller.model.lock().await.get_pleasantly_view().await;
        assert_eq!(view.index, 0);

        h.controller
            .handle_media_event(MediaEvent {
                generation: h.verse.generation(),
                kind: MediaEventKind::Ended,
            })
            .await;
        let view = h.controller.model.lock().await.get_pleasantly_view().await;
        assert_eq!(view.index, 1);
        assert_eq!(h.verse.source(), audio(7, "2:4"));
    }

    #[tokio::test]
    async fn finishing_the_last_slide_completes_and_pauses() {
        let h = harness(FakeContent::with_surahs(&[(2, 10)])).await;
        h.controller.start_pleasantly(verses(2, 3, 4)).await.unwrap().await.unwrap();

        h.controller.advance().await;
        h.controller.advance().await;

        let view = h.controller.model.lock().await.get_pleasantly_view().await;
        assert_eq!(view.index, 1);
        assert!(view.complete);
        assert!(!view.audio_playing);
        assert!(h.verse.log.lock().unwrap().paused);

        h.controller.retreat().await;
        let view = h.controller.model.lock().await.get_pleasantly_view().await;
        assert_eq!(view.index, 0);
        assert!(!view.complete);
        assert_eq!(h.verse.source(), audio(7, "2:3"));
    }

    #[tokio::test(start_paused = true)]
    async fn slides_without_audio_advance_after_two_seconds() {
        let mut content = FakeContent::with_surahs(&[(2, 10)]);
        content.missing_audio.insert("2:3".to_string());
        let h = harness(content).await;
        h.controller.start_pleasantly(verses(2, 3, 5)).await.unwrap().await.unwrap();
        assert_eq!(h.verse.source(), None);

        tokio::time::sleep(Duration::from_millis(1999)).await;
        let view = h.controller.model.lock().await.get_pleasantly_view().await;
        assert_eq!(view.index, 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        let view = h.controller.model.lock().await.get_pleasantly_view().await;
        assert_eq!(view.index, 1);
        assert_eq!(h.verse.source(), audio(7, "2:4"));
    }

    #[tokio::test(start_paused = true)]
    async fn without_audio_output_every_slide_is_timed() {
        let h = silent_harness(FakeContent::with_surahs(&[(2, 10)])).await;
        h.controller.start_pleasantly(verses(2, 3, 4)).await.unwrap().await.unwrap();

        tokio::time::sleep(Duration::from_millis(1999)).await;
        let view = h.controller.model.lock().await.get_pleasantly_view().await;
        assert_eq!(view.index, 0);
        assert!(!view.audio_playing);

        tokio::time::sleep(Duration::from_millis(2)).await;
        let view = h.controller.model.lock().await.get_pleasantly_view().await;
        assert_eq!(view.index, 1);

        tokio::time::sleep(Duration::from_millis(2000)).await;
        let view = h.controller.model.lock().await.get_pleasantly_view().await;
        assert_eq!(view.index, 1);
        assert!(view.complete);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_navigation_cancels_the_placeholder_timer() {
        let mut content = FakeContent::with_surahs(&[(2, 10)]);
        content.missing_audio.insert("2:3".to_string());
        content.missing_audio.insert("2:4".to_string());
        let h = harness(content).await;
        h.controller.start_pleasantly(verses(2, 3, 6)).await.unwrap().await.unwrap();

        tokio::time::sleep(Duration::from_millis(1500)).await;
        h.controller.advance().await;

        // The first timer would have fired at 2000 ms; the second is due at 3500 ms
        tokio::time::sleep(Duration::from_millis(1000)).await;
        let view = h.controller.model.lock().await.get_pleasantly_view().await;
        assert_eq!(view.index, 1);

        tokio::time::sleep(Duration::from_millis(1001)).await;
        let view = h.controller.model.lock().await.get_pleasantly_view().await;
        assert_eq!(view.index, 2);
    }

    #[tokio::test]
    async fn only_the_latest_build_is_applied() {
        let h = harness(FakeContent::with_surahs(&[(2, 10), (3, 10)])).await;

        let first = h.controller.start_pleasantly(verses(2, 1, 10)).await.unwrap();
        let second = h.controller.start_pleasantly(verses(3, 2, 3)).await.unwrap();
        first.await.unwrap();
        second.await.unwrap();

        let view = h.controller.model.lock().await.get_pleasantly_view().await;
        assert_eq!(view.total, 2);
        assert_eq!(view.slide.unwrap().id, "3:2");
        assert_eq!(h.verse.source(), audio(7, "3:2"));
    }

    #[tokio::test]
    async fn closing_during_a_build_discards_it() {
        let h = harness(FakeContent::with_surahs(&[(2, 10)])).await;

        let build = h.controller.start_pleasantly(verses(2, 3, 5)).await.unwrap();
        h.controller.close_pleasantly().await;
        build.await.unwrap();

        let view = h.controller.model.lock().await.get_pleasantly_view().await;
        assert_eq!(view.status, SessionStatus::Idle);
        assert_eq!(h.verse.source(), None);
        assert_eq!(h.ambience.source(), None);
    }

    #[tokio::test]
    async fn close_releases_both_audio_slots() {
        let h = harness(FakeContent::with_surahs(&[(2, 10)])).await;
        h.controller.start_pleasantly(verses(2, 3, 5)).await.unwrap().await.unwrap();

        h.controller.close_pleasantly().await;

        let view = h.controller.model.lock().await.get_pleasantly_view().await;
        assert!(!view.is_active());
        assert!(!view.audio_playing);
        assert_eq!(h.verse.source(), None);
        assert!(h.verse.log.lock().unwrap().paused);
        assert_eq!(h.ambience.source(), None);
        assert!(h.ambience.log.lock().unwrap().paused);
    }

    #[tokio::test]
    async fn changing_reciter_keeps_the_current_verse() {
        let h = harness(FakeContent::with_surahs(&[(2, 10)])).await;
        h.controller.start_pleasantly(verses(2, 3, 5)).await.unwrap().await.unwrap();
        h.controller.advance().await;

        let rebuild = h.controller.change_reciter(8).await.unwrap();
        let view = h.controller.model.lock().await.get_pleasantly_view().await;
        assert_eq!(view.status, SessionStatus::Loading);
        assert_eq!(h.verse.source(), None);

        rebuild.await.unwrap();
        let view = h.controller.model.lock().await.get_pleasantly_view().await;
        assert_eq!(view.index, 1);
        assert_eq!(view.reciter_label, "Reciter 8");
        assert_eq!(h.verse.source(), audio(8, "2:4"));
    }

    #[tokio::test]
    async fn selection_changes_are_persisted() {
        let h = harness(FakeContent::with_surahs(&[(2, 10)])).await;

        assert!(h.controller.cycle_translation(true).await.is_none());
        assert!(h.controller.cycle_reciter(false).await.is_none());

        let prefs = h.controller.preferences.get().await;
        assert_eq!(prefs.reciter_id, Some(8));
        assert_eq!(prefs.translation_id, Some(21));
        assert!(prefs.updated_at.is_some());
    }

    #[tokio::test]
    async fn build_failures_surface_in_the_overlay() {
        let mut content = FakeContent::with_surahs(&[(2, 10)]);
        content.fail_surah = Some(2);
        let h = harness(content).await;

        h.controller.start_pleasantly(verses(2, 3, 5)).await.unwrap().await.unwrap();

        let view = h.controller.model.lock().await.get_pleasantly_view().await;
        assert_eq!(view.status, SessionStatus::Error);
        assert_eq!(view.error.as_deref(), Some("Surah response format is invalid"));
        assert_eq!(h.verse.source(), None);
    }

    #[tokio::test]
    async fn rejected_playback_leaves_the_slide_paused() {
        let h = harness(FakeContent::with_surahs(&[(2, 10)])).await;
        h.verse.log.lock().unwrap().reject_play = true;

        h.controller.start_pleasantly(verses(2, 3, 5)).await.unwrap().await.unwrap();

        let view = h.controller.model.lock().await.get_pleasantly_view().await;
        assert!(!view.audio_loading);
        assert!(!view.audio_playing);
        assert_eq!(view.index, 0);

        h.verse.log.lock().unwrap().reject_play = false;
        h.controller.toggle_verse_playback().await;
        let view = h.controller.model.lock().await.get_pleasantly_view().await;
        assert!(view.audio_playing);
    }

    #[tokio::test]
    async fn ambience_toggle_is_mirrored_in_the_view() {
        let h = harness(FakeContent::with_surahs(&[(2, 10)])).await;
        h.controller.start_pleasantly(verses(2, 3, 5)).await.unwrap().await.unwrap();

        h.controller.toggle_ambience().await;

        let view = h.controller.model.lock().await.get_pleasantly_view().await;
        assert!(!view.ambience_enabled);
        assert_eq!(h.ambience.log.lock().unwrap().volume, 0.0);
    }

    #[tokio::test]
    async fn minimizing_keeps_audio_bound() {
        let h = harness(FakeContent::with_surahs(&[(2, 10)])).await;
        h.controller.start_pleasantly(verses(2, 3, 5)).await.unwrap().await.unwrap();

        h.controller.minimize_pleasantly().await;
        let view = h.controller.model.lock().await.get_pleasantly_view().await;
        assert!(view.minimized);
        assert_eq!(h.verse.source(), audio(7, "2:3"));

        h.controller.expand_pleasantly().await;
        let view = h.controller.model.lock().await.get_pleasantly_view().await;
        assert!(!view.minimized);
    }
}
