//! Session caches for slide building and the on-disk preferences store

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::quran_client::VerseRecord;

const PREFERENCES_FILE: &str = "preferences.json";

/// Verse key -> audio URL for one surah and reciter
pub type AudioMap = HashMap<String, String>;

/// Content of the introductory recitation slide for a (reciter, translation) pair
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntroBase {
    pub arabic_text: String,
    pub translation: String,
    pub audio_url: Option<String>,
}

/// Lookups made while building slides, kept for the life of the app.
///
/// Keys: `(surah, translation)` for verses, `(surah, reciter)` for audio maps
/// and `(reciter, translation)` for intro content.
#[derive(Clone, Default)]
pub struct SlideCaches {
    verses: Arc<RwLock<HashMap<(u16, Option<u32>), Arc<Vec<VerseRecord>>>>>,
    recitations: Arc<RwLock<HashMap<(u16, u32), Arc<AudioMap>>>>,
    intros: Arc<RwLock<HashMap<(u32, Option<u32>), IntroBase>>>,
}

impl SlideCaches {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn verses(&self, surah_id: u16, translation_id: Option<u32>) -> Option<Arc<Vec<VerseRecord>>> {
        self.verses.read().await.get(&(surah_id, translation_id)).cloned()
    }

    pub async fn insert_verses(
        &self,
        surah_id: u16,
        translation_id: Option<u32>,
        verses: Vec<VerseRecord>,
    ) -> Arc<Vec<VerseRecord>> {
        let verses = Arc::new(verses);
        self.verses
            .write()
            .await
            .insert((surah_id, translation_id), verses.clone());
        verses
    }

    pub async fn audio_map(&self, surah_id: u16, reciter_id: u32) -> Option<Arc<AudioMap>> {
        self.recitations.read().await.get(&(surah_id, reciter_id)).cloned()
    }

    pub async fn insert_audio_map(&self, surah_id: u16, reciter_id: u32, map: AudioMap) -> Arc<AudioMap> {
        let map = Arc::new(map);
        self.recitations
            .write()
            .await
            .insert((surah_id, reciter_id), map.clone());
        map
    }

    pub async fn intro(&self, reciter_id: u32, translation_id: Option<u32>) -> Option<IntroBase> {
        self.intros.read().await.get(&(reciter_id, translation_id)).cloned()
    }

    pub async fn insert_intro(&self, reciter_id: u32, translation_id: Option<u32>, base: IntroBase) {
        self.intros
            .write()
            .await
            .insert((reciter_id, translation_id), base);
    }

    /// Entry counts as (verses, recitations, intros)
    #[cfg(test)]
    pub async fn sizes(&self) -> (usize, usize, usize) {
        (
            self.verses.read().await.len(),
            self.recitations.read().await.len(),
            self.intros.read().await.len(),
        )
    }
}

/// Selections remembered across runs
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub reciter_id: Option<u32>,
    pub translation_id: Option<u32>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// JSON file holding [`Preferences`]
#[derive(Clone)]
pub struct PreferencesStore {
    path: PathBuf,
    current: Arc<RwLock<Preferences>>,
}

impl PreferencesStore {
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            path: cache_dir.join(PREFERENCES_FILE),
            current: Arc::new(RwLock::new(Preferences::default())),
        }
    }

    /// Load from disk. A missing file leaves the defaults in place.
    pub async fn load_from_disk(&self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        let content = tokio::fs::read_to_string(&self.path).await?;
        let prefs: Preferences = serde_json::from_str(&content)?;
        *self.current.write().await = prefs;
        Ok(())
    }

    pub async fn save_to_disk(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let content = serde_json::to_string_pretty(&*self.current.read().await)?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }

    pub async fn get(&self) -> Preferences {
        self.current.read().await.clone()
    }

    /// Record the selections and persist them.
    pub async fn update(&self, reciter_id: Option<u32>, translation_id: Option<u32>) -> Result<()> {
        {
            let mut prefs = self.current.write().await;
            if prefs.reciter_id == reciter_id && prefs.translation_id == translation_id {
                return Ok(());
            }
            prefs.reciter_id = reciter_id;
            prefs.translation_id = translation_id;
            prefs.updated_at = Some(Utc::now());
        }
        self.save_to_disk().await
    }
}
