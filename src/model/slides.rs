//! Slide builder: turns a playback request into the ordered slide sequence

use std::collections::HashSet;
use std::sync::Arc;
use futures::future::try_join_all;

use crate::error::SlideError;
use super::cache::{AudioMap, IntroBase, SlideCaches};
use super::quran_client::{QuranContent, VerseRecord};
use super::request::{parse_verse_key, PlaybackRequest, Segment, Slide};

/// The surah that canonically opens with the bismillah as its first ayah
pub const OPENING_SURAH: u16 = 1;

/// Surahs that do not begin with the bismillah
pub const SURAHS_WITHOUT_BISMILLAH: &[u16] = &[9];

const INTRO_VERSE_KEY: &str = "1:1";
const BISMILLAH_FALLBACK_ARABIC: &str = "بِسْمِ ٱللَّهِ ٱلرَّحْمَـٰنِ ٱلرَّحِيمِ";
const BISMILLAH_FALLBACK_TRANSLATION: &str =
    "In the name of Allah, the Most Compassionate, the Most Merciful.";

/// Whether a segment gets an introductory recitation slide before its verses.
pub fn should_include_intro(segment: &Segment) -> bool {
    segment.effective_start() <= 1
        && segment.surah_id != OPENING_SURAH
        && !SURAHS_WITHOUT_BISMILLAH.contains(&segment.surah_id)
}

/// Build the slides for `request`.
///
/// Fails with the first collaborator error; never returns a partial sequence.
pub async fn build_slides(
    content: &dyn QuranContent,
    caches: &SlideCaches,
    request: &PlaybackRequest,
    reciter_id: u32,
    translation_id: Option<u32>,
) -> Result<Vec<Slide>, SlideError> {
    let mut seen = HashSet::new();
    let surah_ids: Vec<u16> = request
        .segments
        .iter()
        .map(|s| s.surah_id)
        .filter(|id| seen.insert(*id))
        .collect();

    tracing::debug!(
        surahs = ?surah_ids,
        reciter_id,
        translation_id = ?translation_id,
        "Building slides"
    );

    let verse_sets = try_join_all(
        surah_ids
            .iter()
            .map(|&id| verses_for(content, caches, id, translation_id)),
    )
    .await?;

    let audio_maps = try_join_all(
        surah_ids
            .iter()
            .map(|&id| audio_map_for(content, caches, id, reciter_id)),
    )
    .await?;

    let mut ordered: Vec<(usize, Slide)> = Vec::new();

    for (order, segment) in request.segments.iter().enumerate() {
        let index = surah_ids
            .iter()
            .position(|id| *id == segment.surah_id)
            .unwrap_or_default();
        let verses = &verse_sets[index];
        let audio = &audio_maps[index];

        if should_include_intro(segment) {
            let base = intro_base(content, caches, reciter_id, translation_id).await?;
            ordered.push((
                order,
                Slide {
                    id: format!("{}:{}:bismillah", segment.surah_id, order),
                    surah_id: segment.surah_id,
                    ayah_number: 0,
                    arabic_text: base.arabic_text,
                    translation: base.translation,
                    audio_url: base.audio_url,
                    segment_label: segment.label.clone(),
                },
            ));
        }

        for verse in verses.iter() {
            let Some((surah_id, ayah_number)) = parse_verse_key(&verse.key) else {
                tracing::warn!(key = %verse.key, "Skipping verse with malformed key");
                continue;
            };
            if !segment.contains(ayah_number) {
                continue;
            }

            ordered.push((
                order,
                Slide {
                    id: verse.key.clone(),
                    surah_id,
                    ayah_number,
                    arabic_text: verse.verse.clone(),
                    translation: verse.translation.clone().unwrap_or_default(),
                    audio_url: audio.get(&verse.key).cloned(),
                    segment_label: segment.label.clone(),
                },
            ));
        }
    }

    ordered.sort_by_key(|(order, slide)| (*order, slide.surah_id, slide.ayah_number));
    let slides: Vec<Slide> = ordered.into_iter().map(|(_, slide)| slide).collect();

    tracing::info!(count = slides.len(), title = %request.title, "Slides built");
    Ok(slides)
}

pub(crate) async fn verses_for(
    content: &dyn QuranContent,
    caches: &SlideCaches,
    surah_id: u16,
    translation_id: Option<u32>,
) -> Result<Arc<Vec<VerseRecord>>, SlideError> {
    if let Some(verses) = caches.verses(surah_id, translation_id).await {
        return Ok(verses);
    }
    let verses = content.fetch_verses(surah_id, translation_id).await?;
    Ok(caches.insert_verses(surah_id, translation_id, verses).await)
}

async fn audio_map_for(
    content: &dyn QuranContent,
    caches: &SlideCaches,
    surah_id: u16,
    reciter_id: u32,
) -> Result<Arc<AudioMap>, SlideError> {
    if let Some(map) = caches.audio_map(surah_id, reciter_id).await {
        return Ok(map);
    }
    let entries = content.fetch_recitation(surah_id, reciter_id).await?;
    let map: AudioMap = entries
        .into_iter()
        .filter_map(|entry| {
            let url = entry.audio_url.filter(|u| !u.is_empty())?;
            (!entry.verse_key.is_empty()).then_some((entry.verse_key, url))
        })
        .collect();
    Ok(caches.insert_audio_map(surah_id, reciter_id, map).await)
}

async fn intro_base(
    content: &dyn QuranContent,
    caches: &SlideCaches,
    reciter_id: u32,
    translation_id: Option<u32>,
) -> Result<IntroBase, SlideError> {
    if let Some(base) = caches.intro(reciter_id, translation_id).await {
        return Ok(base);
    }

    let verses = verses_for(content, caches, OPENING_SURAH, translation_id).await?;
    let audio = audio_map_for(content, caches, OPENING_SURAH, reciter_id).await?;
    let verse = verses.iter().find(|v| v.key == INTRO_VERSE_KEY);

    // Only a missing verse falls back; a present one is used even when blank
    let arabic_text = verse
        .map(|v| v.verse.trim())
        .unwrap_or(BISMILLAH_FALLBACK_ARABIC)
        .to_string();
    let translation = verse
        .and_then(|v| v.translation.as_deref())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(BISMILLAH_FALLBACK_TRANSLATION)
        .to_string();

    let base = IntroBase {
        arabic_text,
        translation,
        audio_url: audio.get(INTRO_VERSE_KEY).cloned(),
    };
    caches.insert_intro(reciter_id, translation_id, base.clone()).await;
    Ok(base)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use async_trait::async_trait;

    use super::*;
    use crate::error::ApiError;
    use crate::model::quran_client::RecitationEntry;

    /// In-memory content source recording every remote lookup
    #[derive(Default)]
    pub(crate) struct FakeContent {
        pub verse_counts: HashMap<u16, u16>,
        pub missing_audio: HashSet<String>,
        /// Verse keys served with empty Arabic text
        pub blank_arabic: HashSet<String>,
        pub fail_surah: Option<u16>,
        pub calls: Mutex<Vec<String>>,
    }

    impl FakeContent {
        pub(crate) fn with_surahs(surahs: &[(u16, u16)]) -> Self {
            Self {
                verse_counts: surahs.iter().copied().collect(),
                ..Default::default()
            }
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl QuranContent for FakeContent {
        async fn fetch_verses(
            &self,
            surah_id: u16,
            translation_id: Option<u32>,
        ) -> Result<Vec<VerseRecord>, ApiError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("verses:{}:{:?}", surah_id, translation_id));
            if self.fail_surah == Some(surah_id) {
                return Err(ApiError::InvalidPayload { operation: "Surah" });
            }
            let count = self.verse_counts.get(&surah_id).copied().unwrap_or(0);
            // Served in reverse to prove the builder orders by ayah itself
            Ok((1..=count)
                .rev()
                .map(|ayah| {
                    let key = format!("{}:{}", surah_id, ayah);
                    let verse = if self.blank_arabic.contains(&key) {
                        String::new()
                    } else {
                        format!("arabic {}", key)
                    };
                    VerseRecord {
                        translation: Some(format!("tr{:?} {}", translation_id, key)),
                        key,
                        verse,
                    }
                })
                .collect())
        }

        async fn fetch_recitation(
            &self,
            surah_id: u16,
            reciter_id: u32,
        ) -> Result<Vec<RecitationEntry>, ApiError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("recitation:{}:{}", surah_id, reciter_id));
            let count = self.verse_counts.get(&surah_id).copied().unwrap_or(0);
            Ok((1..=count)
                .map(|ayah| {
                    let key = format!("{}:{}", surah_id, ayah);
                    let audio_url = (!self.missing_audio.contains(&key))
                        .then(|| format!("https://audio.test/{}/{}.mp3", reciter_id, key));
                    RecitationEntry {
                        verse_key: key,
                        audio_url,
                    }
                })
                .collect())
        }
    }

    fn request(segments: Vec<Segment>) -> PlaybackRequest {
        PlaybackRequest::new("Test", segments)
    }

    #[test]
    fn intro_policy() {
        assert!(should_include_intro(&Segment::surah(2)));
        assert!(should_include_intro(&Segment::range(2, 1, 5)));
        assert!(!should_include_intro(&Segment::range(2, 255, 255)));
        assert!(!should_include_intro(&Segment::surah(1)));
        assert!(!should_include_intro(&Segment::surah(9)));
    }

    #[tokio::test]
    async fn single_ranged_verse_has_no_intro() {
        let content = FakeContent::with_surahs(&[(1, 7), (2, 286)]);
        let slides = build_slides(
            &content,
            &SlideCaches::new(),
            &request(vec![Segment::range(2, 255, 255)]),
            7,
            Some(20),
        )
        .await
        .unwrap();

        assert_eq!(slides.len(), 1);
        assert_eq!(slides[0].id, "2:255");
        assert_eq!(slides[0].ayah_number, 255);
        assert_eq!(
            slides[0].audio_url.as_deref(),
            Some("https://audio.test/7/2:255.mp3")
        );
    }

    #[tokio::test]
    async fn whole_surah_starts_with_intro_then_every_ayah() {
        let content = FakeContent::with_surahs(&[(1, 7), (2, 286)]);
        let slides = build_slides(
            &content,
            &SlideCaches::new(),
            &request(vec![Segment::surah(2)]),
            7,
            Some(20),
        )
        .await
        .unwrap();

        assert_eq!(slides.len(), 287);
        assert!(slides[0].is_intro());
        assert_eq!(slides[0].id, "2:0:bismillah");
        assert_eq!(slides[0].arabic_text, "arabic 1:1");
        assert_eq!(slides[0].translation, "trSome(20) 1:1");
        assert_eq!(
            slides[0].audio_url.as_deref(),
            Some("https://audio.test/7/1:1.mp3")
        );
        let ayahs: Vec<u16> = slides[1..].iter().map(|s| s.ayah_number).collect();
        assert_eq!(ayahs, (1..=286).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn surah_nine_gets_no_intro() {
        let content = FakeContent::with_surahs(&[(1, 7), (9, 129)]);
        let slides = build_slides(
            &content,
            &SlideCaches::new(),
            &request(vec![Segment::surah(9)]),
            7,
            None,
        )
        .await
        .unwrap();

        assert_eq!(slides.len(), 129);
        assert_eq!(slides[0].ayah_number, 1);
        assert!(!content.calls().iter().any(|c| c.starts_with("verses:1:")));
    }

    #[tokio::test]
    async fn opening_surah_is_not_doubled() {
        let content = FakeContent::with_surahs(&[(1, 7)]);
        let slides = build_slides(
            &content,
            &SlideCaches::new(),
            &request(vec![Segment::surah(1)]),
            7,
            None,
        )
        .await
        .unwrap();
        assert_eq!(slides.len(), 7);
        assert!(slides.iter().all(|s| !s.is_intro()));
    }

    #[tokio::test]
    async fn slides_follow_segment_declaration_order() {
        let content = FakeContent::with_surahs(&[(1, 7), (2, 286), (112, 4)]);
        let req = request(vec![
            Segment::surah(112).with_label("Ikhlas"),
            Segment::range(2, 255, 256).with_label("Kursi"),
            Segment::range(112, 1, 1),
        ]);
        let slides = build_slides(&content, &SlideCaches::new(), &req, 7, None)
            .await
            .unwrap();

        let ids: Vec<&str> = slides.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "112:0:bismillah", "112:1", "112:2", "112:3", "112:4",
                "2:255", "2:256",
                "112:2:bismillah", "112:1",
            ]
        );
        assert_eq!(slides[0].segment_label.as_deref(), Some("Ikhlas"));
        assert_eq!(slides[5].segment_label.as_deref(), Some("Kursi"));
        assert_eq!(slides[8].segment_label, None);
    }

    #[tokio::test]
    async fn missing_audio_becomes_none() {
        let mut content = FakeContent::with_surahs(&[(2, 286)]);
        content.missing_audio.insert("2:255".into());
        let slides = build_slides(
            &content,
            &SlideCaches::new(),
            &request(vec![Segment::range(2, 255, 256)]),
            7,
            None,
        )
        .await
        .unwrap();
        assert_eq!(slides[0].audio_url, None);
        assert!(slides[1].audio_url.is_some());
    }

    #[tokio::test]
    async fn intro_falls_back_when_opening_verse_is_missing() {
        // Surah 1 resolves to nothing at all
        let content = FakeContent::with_surahs(&[(36, 83)]);
        let slides = build_slides(
            &content,
            &SlideCaches::new(),
            &request(vec![Segment::range(36, 1, 3)]),
            7,
            None,
        )
        .await
        .unwrap();

        assert!(slides[0].is_intro());
        assert_eq!(slides[0].arabic_text, BISMILLAH_FALLBACK_ARABIC);
        assert_eq!(slides[0].translation, BISMILLAH_FALLBACK_TRANSLATION);
        assert_eq!(slides[0].audio_url, None);
    }

    #[tokio::test]
    async fn blank_opening_verse_is_kept_as_is() {
        let mut content = FakeContent::with_surahs(&[(1, 7), (36, 83)]);
        content.blank_arabic.insert("1:1".into());
        let slides = build_slides(
            &content,
            &SlideCaches::new(),
            &request(vec![Segment::range(36, 1, 3)]),
            7,
            Some(20),
        )
        .await
        .unwrap();

        assert!(slides[0].is_intro());
        assert_eq!(slides[0].arabic_text, "");
        assert_eq!(slides[0].translation, "trSome(20) 1:1");
    }

    #[tokio::test]
    async fn caches_prevent_repeat_fetches() {
        let content = FakeContent::with_surahs(&[(1, 7), (2, 286)]);
        let caches = SlideCaches::new();
        let req = request(vec![Segment::range(2, 1, 3)]);

        build_slides(&content, &caches, &req, 7, Some(20)).await.unwrap();
        let first = content.calls().len();
        assert_eq!(caches.sizes().await, (2, 2, 1));

        build_slides(&content, &caches, &req, 7, Some(20)).await.unwrap();
        assert_eq!(content.calls().len(), first);

        // A new reciter only refetches recitations
        build_slides(&content, &caches, &req, 8, Some(20)).await.unwrap();
        let new_calls: Vec<String> = content.calls()[first..].to_vec();
        assert!(new_calls.iter().all(|c| c.starts_with("recitation:")));
        assert_eq!(caches.sizes().await, (2, 4, 2));
    }

    #[tokio::test]
    async fn first_failure_aborts_the_build() {
        let mut content = FakeContent::with_surahs(&[(1, 7), (2, 286)]);
        content.fail_surah = Some(2);
        let err = build_slides(
            &content,
            &SlideCaches::new(),
            &request(vec![Segment::surah(2)]),
            7,
            None,
        )
        .await
        .unwrap_err();
        assert_eq!(err, SlideError::Network("Surah response format is invalid".into()));
    }

    #[tokio::test]
    async fn empty_surah_yields_no_slides_without_intro() {
        let content = FakeContent::with_surahs(&[(1, 7)]);
        let slides = build_slides(
            &content,
            &SlideCaches::new(),
            &request(vec![Segment::range(50, 3, 4)]),
            7,
            None,
        )
        .await
        .unwrap();
        assert!(slides.is_empty());
    }
}
