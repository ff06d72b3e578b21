//! Surah and juz reader: verse text with translation for a passage

use std::collections::HashSet;
use std::sync::Arc;
use futures::future::try_join_all;

use crate::error::SlideError;
use super::cache::SlideCaches;
use super::quran_client::QuranContent;
use super::request::{parse_verse_key, PlaybackRequest, Segment};
use super::slides::verses_for;

/// A verse as shown in the reader
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReaderVerse {
    pub surah_id: u16,
    pub ayah_number: u16,
    pub arabic_text: String,
    pub translation: String,
    /// Index of the passage segment the verse came from
    pub segment: usize,
}

impl ReaderVerse {
    pub fn key(&self) -> String {
        format!("{}:{}", self.surah_id, self.ayah_number)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReaderStatus {
    Loading,
    Ready(Arc<Vec<ReaderVerse>>),
    Failed(String),
}

/// An open reader. Loads are tagged so a reload discards older results.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReaderState {
    pub passage: Arc<PlaybackRequest>,
    pub translation_id: Option<u32>,
    pub status: ReaderStatus,
    pub selected: usize,
    token: u64,
}

impl ReaderState {
    pub fn open(passage: PlaybackRequest, translation_id: Option<u32>) -> Self {
        Self {
            passage: Arc::new(passage),
            translation_id,
            status: ReaderStatus::Loading,
            selected: 0,
            token: 1,
        }
    }

    pub fn token(&self) -> u64 {
        self.token
    }

    /// Start loading again in `translation_id`, keeping the selection.
    pub fn reload(&mut self, translation_id: Option<u32>) -> u64 {
        self.translation_id = translation_id;
        self.status = ReaderStatus::Loading;
        self.token += 1;
        self.token
    }

    /// Apply a load result. Returns false when `token` is stale.
    pub fn finish(&mut self, token: u64, result: Result<Vec<ReaderVerse>, SlideError>) -> bool {
        if token != self.token {
            return false;
        }
        self.status = match result {
            Ok(verses) => {
                self.selected = self.selected.min(verses.len().saturating_sub(1));
                ReaderStatus::Ready(Arc::new(verses))
            }
            Err(err) => ReaderStatus::Failed(err.to_string()),
        };
        true
    }

    pub fn verses(&self) -> &[ReaderVerse] {
        match &self.status {
            ReaderStatus::Ready(verses) => verses,
            _ => &[],
        }
    }

    pub fn move_selection(&mut self, delta: isize) {
        let len = self.verses().len();
        if len == 0 {
            return;
        }
        self.selected = self.selected.saturating_add_signed(delta).min(len - 1);
    }

    pub fn select_last(&mut self) {
        self.selected = self.verses().len().saturating_sub(1);
    }

    /// The passage trimmed to start at the selected verse.
    pub fn request_from_selected(&self) -> Option<PlaybackRequest> {
        let verse = self.verses().get(self.selected)?;
        let segments = &self.passage.segments;
        let first = segments.get(verse.segment)?;

        let mut trimmed: Vec<Segment> = vec![Segment {
            start_ayah: Some(verse.ayah_number),
            ..first.clone()
        }];
        trimmed.extend(segments.iter().skip(verse.segment + 1).cloned());

        Some(PlaybackRequest {
            title: self.passage.title.clone(),
            subtitle: Some(format!("From {}", verse.key())),
            segments: trimmed,
        })
    }
}

/// Fetch the verses of every segment of `passage`, in segment order.
pub async fn load_passage(
    content: &dyn QuranContent,
    caches: &SlideCaches,
    passage: &PlaybackRequest,
    translation_id: Option<u32>,
) -> Result<Vec<ReaderVerse>, SlideError> {
    let mut seen = HashSet::new();
    let surah_ids: Vec<u16> = passage
        .segments
        .iter()
        .map(|s| s.surah_id)
        .filter(|id| seen.insert(*id))
        .collect();
    let verse_sets = try_join_all(
        surah_ids
            .iter()
            .map(|&id| verses_for(content, caches, id, translation_id)),
    )
    .await?;

    let mut verses = Vec::new();
    for (index, segment) in passage.segments.iter().enumerate() {
        let Some(records) = surah_ids
            .iter()
            .position(|id| *id == segment.surah_id)
            .and_then(|i| verse_sets.get(i))
        else {
            continue;
        };
        let mut section: Vec<ReaderVerse> = records
            .iter()
            .filter_map(|record| {
                let (surah_id, ayah_number) = parse_verse_key(&record.key)?;
                segment.contains(ayah_number).then(|| ReaderVerse {
                    surah_id,
                    ayah_number,
                    arabic_text: strip_trailing_arabic_digits(&record.verse),
                    translation: record
                        .translation
                        .as_deref()
                        .map(strip_html)
                        .unwrap_or_default(),
                    segment: index,
                })
            })
            .collect();
        section.sort_by_key(|verse| verse.ayah_number);
        verses.extend(section);
    }

    tracing::debug!(count = verses.len(), title = %passage.title, "Reader passage loaded");
    Ok(verses)
}

/// Drop markup tags (footnote anchors and the like) and collapse whitespace.
pub fn strip_html(text: &str) -> String {
    let mut plain = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                plain.push(' ');
            }
            _ if !in_tag => plain.push(c),
            _ => {}
        }
    }
    plain.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove the Arabic-Indic verse number some texts end with.
///
/// Text made only of digits is kept as is.
pub fn strip_trailing_arabic_digits(text: &str) -> String {
    let trimmed = text.trim_end();
    let stripped = trimmed
        .trim_end_matches(|c: char| ('\u{0660}'..='\u{0669}').contains(&c))
        .trim();
    if stripped.is_empty() {
        text.trim().to_string()
    } else {
        stripped.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FakeContent;

    fn passage(segments: Vec<Segment>) -> PlaybackRequest {
        PlaybackRequest::new("Reading", segments)
    }

    #[test]
    fn markup_is_removed_from_translations() {
        assert_eq!(
            strip_html("Praise be to Allah<sup foot_note=\"77\">1</sup>, Lord of <i>all</i> worlds"),
            "Praise be to Allah 1 , Lord of all worlds"
        );
        assert_eq!(strip_html("plain"), "plain");
    }

    #[test]
    fn trailing_verse_numbers_are_removed() {
        assert_eq!(strip_trailing_arabic_digits("ٱلْحَمْدُ لِلَّهِ ٢ "), "ٱلْحَمْدُ لِلَّهِ");
        assert_eq!(strip_trailing_arabic_digits("بِسْمِ"), "بِسْمِ");
        assert_eq!(strip_trailing_arabic_digits("١٢"), "١٢");
    }

    #[tokio::test]
    async fn passage_verses_follow_segment_order() {
        let content = FakeContent::with_surahs(&[(2, 286), (112, 4)]);
        let verses = load_passage(
            &content,
            &SlideCaches::new(),
            &passage(vec![Segment::surah(112), Segment::range(2, 255, 256)]),
            Some(20),
        )
        .await
        .unwrap();

        let keys: Vec<String> = verses.iter().map(ReaderVerse::key).collect();
        assert_eq!(keys, vec!["112:1", "112:2", "112:3", "112:4", "2:255", "2:256"]);
        assert_eq!(verses[4].segment, 1);
        assert_eq!(verses[4].translation, "trSome(20) 2:255");
        // The reader never asks for recitations
        assert!(content.calls().iter().all(|c| c.starts_with("verses:")));
    }

    #[tokio::test]
    async fn reader_shares_the_verse_cache() {
        let content = FakeContent::with_surahs(&[(112, 4)]);
        let caches = SlideCaches::new();
        let request = passage(vec![Segment::surah(112)]);
        load_passage(&content, &caches, &request, None).await.unwrap();
        load_passage(&content, &caches, &request, None).await.unwrap();
        assert_eq!(content.calls().len(), 1);
    }

    #[tokio::test]
    async fn failed_fetch_fails_the_load() {
        let mut content = FakeContent::with_surahs(&[(2, 286)]);
        content.fail_surah = Some(2);
        let result = load_passage(&content, &SlideCaches::new(), &passage(vec![Segment::surah(2)]), None).await;
        assert!(result.is_err());
    }

    fn ready(segments: Vec<Segment>, verses: &[(u16, u16, usize)]) -> ReaderState {
        let mut state = ReaderState::open(passage(segments), None);
        let token = state.token();
        let verses = verses
            .iter()
            .map(|&(surah_id, ayah_number, segment)| ReaderVerse {
                surah_id,
                ayah_number,
                arabic_text: String::new(),
                translation: String::new(),
                segment,
            })
            .collect();
        assert!(state.finish(token, Ok(verses)));
        state
    }

    #[test]
    fn stale_loads_are_ignored() {
        let mut state = ReaderState::open(passage(vec![Segment::surah(1)]), Some(20));
        let first = state.token();
        let second = state.reload(Some(131));
        assert!(!state.finish(first, Ok(Vec::new())));
        assert_eq!(state.status, ReaderStatus::Loading);
        assert!(state.finish(second, Err(SlideError::Network("offline".into()))));
        assert_eq!(state.status, ReaderStatus::Failed("offline".into()));
        assert_eq!(state.translation_id, Some(131));
    }

    #[test]
    fn selection_stays_inside_the_passage() {
        let mut state = ready(vec![Segment::surah(112)], &[(112, 1, 0), (112, 2, 0), (112, 3, 0)]);
        state.move_selection(-1);
        assert_eq!(state.selected, 0);
        state.move_selection(10);
        assert_eq!(state.selected, 2);
    }

    #[test]
    fn playing_from_a_verse_drops_what_came_before() {
        let segments = vec![
            Segment::range(2, 250, 252).with_label("Juz 2"),
            Segment::surah(3).with_label("Juz 3"),
        ];
        let mut state = ready(segments, &[(2, 250, 0), (2, 251, 0), (2, 252, 0), (3, 1, 1)]);
        state.move_selection(1);

        let request = state.request_from_selected().unwrap();
        assert_eq!(request.subtitle.as_deref(), Some("From 2:251"));
        assert_eq!(
            request.segments,
            vec![
                Segment::range(2, 251, 252).with_label("Juz 2"),
                Segment::surah(3).with_label("Juz 3"),
            ]
        );

        state.select_last();
        let request = state.request_from_selected().unwrap();
        assert_eq!(request.segments, vec![Segment {
            start_ayah: Some(1),
            ..Segment::surah(3).with_label("Juz 3")
        }]);
    }
}
