//! Core type definitions for the application

use std::time::Instant;
use serde::{Deserialize, Serialize};

use super::reader::ReaderState;

/// Localised name attached to catalogue entries
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatedName {
    pub name: String,
    #[serde(default)]
    pub language_name: String,
}

/// A surah as listed by the content API
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurahSummary {
    pub id: u16,
    #[serde(default)]
    pub revelation_place: String,
    pub name_simple: String,
    #[serde(default)]
    pub name_arabic: String,
    pub verses_count: u16,
    #[serde(default)]
    pub translated_name: Option<TranslatedName>,
}

impl SurahSummary {
    /// Case-insensitive match on the simple, Arabic or translated name, or an
    /// exact match on the surah number.
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.id.to_string() == query
            || self.name_simple.to_lowercase().contains(&query)
            || self.name_arabic.contains(&query)
            || self
                .translated_name
                .as_ref()
                .is_some_and(|t| t.name.to_lowercase().contains(&query))
    }
}

/// Where a surah was revealed, as a browser filter
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RevelationFilter {
    #[default]
    All,
    Makkah,
    Madinah,
}

impl RevelationFilter {
    pub fn next(self) -> Self {
        match self {
            RevelationFilter::All => RevelationFilter::Makkah,
            RevelationFilter::Makkah => RevelationFilter::Madinah,
            RevelationFilter::Madinah => RevelationFilter::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RevelationFilter::All => "All",
            RevelationFilter::Makkah => "Makkah",
            RevelationFilter::Madinah => "Madinah",
        }
    }

    pub fn matches(self, surah: &SurahSummary) -> bool {
        match self {
            RevelationFilter::All => true,
            RevelationFilter::Makkah => surah.revelation_place.eq_ignore_ascii_case("makkah"),
            RevelationFilter::Madinah => surah.revelation_place.eq_ignore_ascii_case("madinah"),
        }
    }
}

/// A source of verse audio
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReciterSummary {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub translated_name: Option<TranslatedName>,
}

impl ReciterSummary {
    pub fn label(&self) -> String {
        let name = self
            .translated_name
            .as_ref()
            .map(|t| t.name.as_str())
            .filter(|n| !n.is_empty())
            .or_else(|| Some(self.name.as_str()).filter(|n| !n.is_empty()));

        match (name, self.style.as_deref()) {
            (Some(name), Some(style)) if !style.is_empty() => format!("{} ({})", name, style),
            (Some(name), _) => name.to_string(),
            (None, _) => format!("Reciter {}", self.id),
        }
    }
}

/// A verse translation available from the content API
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationSummary {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub language_name: String,
    #[serde(default)]
    pub translated_name: Option<TranslatedName>,
}

impl TranslationSummary {
    pub fn label(&self) -> String {
        let name = if !self.name.is_empty() {
            self.name.clone()
        } else if let Some(slug) = self.slug.as_deref().filter(|s| !s.is_empty()) {
            slug.to_string()
        } else {
            format!("Translation {}", self.id)
        };

        match self.author_name.as_deref() {
            Some(author) if !author.is_empty() => format!("{} - {}", name, author),
            _ => name,
        }
    }

    pub fn is_english(&self) -> bool {
        self.language_name.to_lowercase().contains("english")
    }
}

/// Reciters, translations and surahs loaded at startup
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    pub surahs: Vec<SurahSummary>,
    pub reciters: Vec<ReciterSummary>,
    pub translations: Vec<TranslationSummary>,
}

impl Catalog {
    pub fn surah(&self, id: u16) -> Option<&SurahSummary> {
        self.surahs.iter().find(|s| s.id == id)
    }

    pub fn reciter(&self, id: u32) -> Option<&ReciterSummary> {
        self.reciters.iter().find(|r| r.id == id)
    }

    pub fn translation(&self, id: u32) -> Option<&TranslationSummary> {
        self.translations.iter().find(|t| t.id == id)
    }

    /// Stored id if it still exists, otherwise the first reciter.
    pub fn default_reciter(&self, stored: Option<u32>) -> Option<u32> {
        stored
            .filter(|id| self.reciter(*id).is_some())
            .or_else(|| self.reciters.first().map(|r| r.id))
    }

    /// Stored id if it still exists, otherwise the first English translation,
    /// otherwise the first translation.
    pub fn default_translation(&self, stored: Option<u32>) -> Option<u32> {
        stored
            .filter(|id| self.translation(*id).is_some())
            .or_else(|| self.translations.iter().find(|t| t.is_english()).map(|t| t.id))
            .or_else(|| self.translations.first().map(|t| t.id))
    }

    /// Surahs passing the search query and revelation filter, in order.
    pub fn filtered_surahs(&self, query: &str, filter: RevelationFilter) -> Vec<&SurahSummary> {
        self.surahs
            .iter()
            .filter(|s| filter.matches(s) && s.matches_query(query))
            .collect()
    }

    /// Neighbouring reciter id, wrapping around.
    pub fn cycle_reciter(&self, current: Option<u32>, forward: bool) -> Option<u32> {
        let ids: Vec<u32> = self.reciters.iter().map(|r| r.id).collect();
        cycle(&ids, current, forward)
    }

    /// Neighbouring translation id, wrapping around.
    pub fn cycle_translation(&self, current: Option<u32>, forward: bool) -> Option<u32> {
        let ids: Vec<u32> = self.translations.iter().map(|t| t.id).collect();
        cycle(&ids, current, forward)
    }
}

fn cycle(ids: &[u32], current: Option<u32>, forward: bool) -> Option<u32> {
    if ids.is_empty() {
        return None;
    }
    let position = current.and_then(|c| ids.iter().position(|id| *id == c));
    let next = match (position, forward) {
        (None, _) => 0,
        (Some(i), true) => (i + 1) % ids.len(),
        (Some(i), false) => (i + ids.len() - 1) % ids.len(),
    };
    Some(ids[next])
}

/// Which list the browser shows
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BrowserTab {
    #[default]
    Surahs,
    Juz,
}

/// What a submitted ayah range is used for
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RangeTarget {
    #[default]
    Play,
    Read,
}

/// UI state for the application
#[derive(Clone, Debug, Default)]
pub struct UiState {
    pub tab: BrowserTab,
    /// Index into the filtered surah list
    pub surah_selected: usize,
    /// Index into the filtered juz list
    pub juz_selected: usize,
    pub search_query: String,
    /// Keys go to the search query while set
    pub search_editing: bool,
    pub revelation_filter: RevelationFilter,
    pub error_message: Option<String>,
    pub error_timestamp: Option<Instant>,
    pub show_help_popup: bool,
    /// Ayah range being typed for the selected surah, if the prompt is open
    pub range_prompt: Option<String>,
    pub range_target: RangeTarget,
    /// Open surah or juz reader
    pub reader: Option<ReaderState>,
}
