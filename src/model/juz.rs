//! The thirty juz divisions, expressed as playable segment lists

use super::request::{PlaybackRequest, Segment};
use super::types::Catalog;

pub const JUZ_COUNT: u8 = 30;

const LAST_SURAH: u16 = 114;

/// First verse of each juz, `(surah, ayah)`
const JUZ_STARTS: [(u16, u16); JUZ_COUNT as usize] = [
    (1, 1), (2, 142), (2, 253), (3, 93), (4, 24),
    (4, 148), (5, 82), (6, 111), (7, 88), (8, 41),
    (9, 93), (11, 6), (12, 53), (15, 1), (17, 1),
    (18, 75), (21, 1), (23, 1), (25, 21), (27, 56),
    (29, 46), (33, 31), (36, 28), (39, 32), (41, 47),
    (46, 1), (51, 31), (58, 1), (67, 1), (78, 1),
];

/// One juz and the surah sections it spans
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Juz {
    pub number: u8,
    pub sections: Vec<Segment>,
}

impl Juz {
    /// Juz `number` (1-based), or `None` outside 1..=30.
    pub fn new(number: u8) -> Option<Self> {
        let index = usize::from(number.checked_sub(1)?);
        let (first_surah, first_ayah) = *JUZ_STARTS.get(index)?;
        let (next_surah, next_ayah) = JUZ_STARTS
            .get(index + 1)
            .copied()
            .unwrap_or((LAST_SURAH + 1, 1));

        let mut sections = Vec::new();
        for surah_id in first_surah..=next_surah.min(LAST_SURAH) {
            let start = if surah_id == first_surah { first_ayah } else { 1 };
            let end = if surah_id == next_surah {
                // The next juz opens this surah, nothing of it belongs here
                if next_ayah == 1 {
                    break;
                }
                Some(next_ayah - 1)
            } else {
                None
            };
            sections.push(Segment {
                surah_id,
                start_ayah: Some(start),
                end_ayah: end,
                label: Some(format!("Juz {}", number)),
            });
        }

        Some(Self { number, sections })
    }

    pub fn all() -> Vec<Self> {
        (1..=JUZ_COUNT).filter_map(Self::new).collect()
    }

    pub fn title(&self) -> String {
        format!("Juz {}", self.number)
    }

    /// `"2:142 - 2:252"`, using catalogue verse counts for open-ended sections.
    pub fn range_label(&self, catalog: &Catalog) -> String {
        let (Some(first), Some(last)) = (self.sections.first(), self.sections.last()) else {
            return String::new();
        };
        let end = last
            .end_ayah
            .or_else(|| catalog.surah(last.surah_id).map(|s| s.verses_count))
            .map(|ayah| format!("{}:{}", last.surah_id, ayah))
            .unwrap_or_else(|| last.surah_id.to_string());
        format!("{}:{} - {}", first.surah_id, first.effective_start(), end)
    }

    /// Names of the surahs the juz touches, in order.
    pub fn surah_names(&self, catalog: &Catalog) -> Vec<String> {
        self.sections
            .iter()
            .map(|section| {
                catalog
                    .surah(section.surah_id)
                    .map(|s| s.name_simple.clone())
                    .unwrap_or_else(|| format!("Surah {}", section.surah_id))
            })
            .collect()
    }

    /// Matches the juz number, `"juz N"`, a verse key inside it, or the name
    /// or number of any surah it spans.
    pub fn matches_query(&self, query: &str, catalog: &Catalog) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        if self.number.to_string() == query || self.title().to_lowercase().contains(&query) {
            return true;
        }
        if let Some((surah, ayah)) = query.split_once(':') {
            if let (Ok(surah), Ok(ayah)) = (surah.trim().parse::<u16>(), ayah.trim().parse::<u16>()) {
                return self
                    .sections
                    .iter()
                    .any(|s| s.surah_id == surah && s.contains(ayah));
            }
        }
        self.sections.iter().any(|section| {
            section.surah_id.to_string() == query
                || catalog
                    .surah(section.surah_id)
                    .is_some_and(|s| s.matches_query(&query))
        })
    }

    pub fn request(&self, catalog: &Catalog) -> PlaybackRequest {
        PlaybackRequest::new(self.title(), self.sections.clone())
            .with_subtitle(self.range_label(catalog))
    }
}

/// Every juz matching `query`, in order.
pub fn matching_juz(query: &str, catalog: &Catalog) -> Vec<Juz> {
    Juz::all()
        .into_iter()
        .filter(|juz| juz.matches_query(query, catalog))
        .collect()
}
