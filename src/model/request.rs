//! Playback requests, segments and the slides derived from them

/// A surah plus an optional ayah range to include in a playback request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    pub surah_id: u16,
    pub start_ayah: Option<u16>,
    pub end_ayah: Option<u16>,
    pub label: Option<String>,
}

impl Segment {
    /// The whole surah.
    pub fn surah(surah_id: u16) -> Self {
        Self {
            surah_id,
            start_ayah: None,
            end_ayah: None,
            label: None,
        }
    }

    pub fn range(surah_id: u16, start_ayah: u16, end_ayah: u16) -> Self {
        Self {
            surah_id,
            start_ayah: Some(start_ayah),
            end_ayah: Some(end_ayah),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// First ayah included, defaulting to 1.
    pub fn effective_start(&self) -> u16 {
        self.start_ayah.unwrap_or(1)
    }

    /// Whether `ayah` falls inside the range. A missing end is unbounded.
    pub fn contains(&self, ayah: u16) -> bool {
        ayah >= self.effective_start() && self.end_ayah.is_none_or(|end| ayah <= end)
    }

    /// Parse a typed range such as `255` or `1-7` for `surah_id`.
    ///
    /// An empty input selects the whole surah.
    pub fn parse_range(surah_id: u16, input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Some(Self::surah(surah_id));
        }

        match input.split_once('-') {
            Some((start, end)) => {
                let start: u16 = start.trim().parse().ok()?;
                let end = end.trim();
                if end.is_empty() {
                    return (start > 0).then(|| Self {
                        start_ayah: Some(start),
                        ..Self::surah(surah_id)
                    });
                }
                let end: u16 = end.parse().ok()?;
                (start > 0 && start <= end).then(|| Self::range(surah_id, start, end))
            }
            None => {
                let ayah: u16 = input.parse().ok()?;
                (ayah > 0).then(|| Self::range(surah_id, ayah, ayah))
            }
        }
    }
}

/// What the caller hands to "start playback". Immutable once submitted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaybackRequest {
    pub title: String,
    pub subtitle: Option<String>,
    pub segments: Vec<Segment>,
}

impl PlaybackRequest {
    pub fn new(title: impl Into<String>, segments: Vec<Segment>) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            segments,
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }
}

/// One unit of the playback sequence: a verse, or an injected introductory
/// recitation (`ayah_number == 0`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Slide {
    pub id: String,
    pub surah_id: u16,
    pub ayah_number: u16,
    pub arabic_text: String,
    pub translation: String,
    pub audio_url: Option<String>,
    pub segment_label: Option<String>,
}

impl Slide {
    pub fn is_intro(&self) -> bool {
        self.ayah_number == 0
    }
}

/// Split a `"surah:ayah"` verse key.
pub fn parse_verse_key(key: &str) -> Option<(u16, u16)> {
    let (surah, ayah) = key.split_once(':')?;
    Some((surah.trim().parse().ok()?, ayah.trim().parse().ok()?))
}
