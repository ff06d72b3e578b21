//! Content API client: surahs, verse text, translations and recitations

use std::sync::Arc;
use std::time::Duration;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::ApiError;
use crate::{log_api_request, log_api_result};
use super::types::{ReciterSummary, SurahSummary, TranslationSummary};

/// A verse of a surah in the requested translation
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct VerseRecord {
    /// `"surah:ayah"`
    pub key: String,
    /// Arabic text
    pub verse: String,
    #[serde(default)]
    pub translation: Option<String>,
}

/// Audio location for one verse of a recitation
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecitationEntry {
    pub verse_key: String,
    #[serde(default)]
    pub audio_url: Option<String>,
}

/// The remote lookups the slide builder depends on.
#[async_trait]
pub trait QuranContent: Send + Sync {
    async fn fetch_verses(
        &self,
        surah_id: u16,
        translation_id: Option<u32>,
    ) -> Result<Vec<VerseRecord>, ApiError>;

    async fn fetch_recitation(
        &self,
        surah_id: u16,
        reciter_id: u32,
    ) -> Result<Vec<RecitationEntry>, ApiError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveSurahPayload {
    surah_number: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    translation_id: Option<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveRecitationPayload {
    surah_number: u16,
    recitation_id: u32,
}

/// HTTP client for the Tadabbur content API
#[derive(Clone)]
pub struct QuranApiClient {
    http: reqwest::Client,
    base_url: Arc<str>,
}

impl QuranApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').into(),
        })
    }

    /// The underlying HTTP client, shared with the audio backend.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    pub async fn list_surahs(&self) -> Result<Vec<SurahSummary>, ApiError> {
        log_api_request!("list surahs", path = "list-surahs");
        let result = self.get("list surahs", "list-surahs").await;
        log_api_result!("list surahs", result);
        result
    }

    pub async fn list_reciters(&self) -> Result<Vec<ReciterSummary>, ApiError> {
        log_api_request!("list reciters", path = "list-reciters");
        let result = self.get("list reciters", "list-reciters").await;
        log_api_result!("list reciters", result);
        result
    }

    pub async fn list_translations(&self) -> Result<Vec<TranslationSummary>, ApiError> {
        log_api_request!("list translations", path = "list-translations");
        let result = self.get("list translations", "list-translations").await;
        log_api_result!("list translations", result);
        result
    }

    async fn get<T: DeserializeOwned>(&self, operation: &'static str, path: &str) -> Result<T, ApiError> {
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|source| ApiError::Transport { operation, source })?;
        Self::decode(operation, response).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|source| ApiError::Transport { operation, source })?;
        Self::decode(operation, response).await
    }

    async fn decode<T: DeserializeOwned>(
        operation: &'static str,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status { operation, status });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| ApiError::Transport { operation, source })?;

        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::warn!(operation, error = %e, "Unexpected response body");
            ApiError::InvalidPayload { operation }
        })
    }
}

#[async_trait]
impl QuranContent for QuranApiClient {
    async fn fetch_verses(
        &self,
        surah_id: u16,
        translation_id: Option<u32>,
    ) -> Result<Vec<VerseRecord>, ApiError> {
        log_api_request!("retrieve surah", surah_id, translation_id = ?translation_id);
        let payload = RetrieveSurahPayload {
            surah_number: surah_id,
            translation_id,
        };
        let result = self.post("retrieve surah", "retrieve-surah", &payload).await;
        log_api_result!("retrieve surah", result);
        result
    }

    async fn fetch_recitation(
        &self,
        surah_id: u16,
        reciter_id: u32,
    ) -> Result<Vec<RecitationEntry>, ApiError> {
        log_api_request!("retrieve recitation", surah_id, reciter_id);
        let payload = RetrieveRecitationPayload {
            surah_number: surah_id,
            recitation_id: reciter_id,
        };
        let result = self
            .post("retrieve recitation", "retrieve-recitation", &payload)
            .await;
        log_api_result!("retrieve recitation", result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surah_payload_omits_missing_translation() {
        let body = serde_json::to_value(RetrieveSurahPayload {
            surah_number: 2,
            translation_id: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "surahNumber": 2 }));

        let body = serde_json::to_value(RetrieveRecitationPayload {
            surah_number: 1,
            recitation_id: 7,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "surahNumber": 1, "recitationId": 7 }));
    }

    #[test]
    fn verse_and_recitation_records_decode() {
        let verses: Vec<VerseRecord> = serde_json::from_str(
            r#"[{"verse":"x","translation":"y","words":[],"word_audios":[],"key":"1:1"}]"#,
        )
        .unwrap();
        assert_eq!(verses[0].key, "1:1");
        assert_eq!(verses[0].translation.as_deref(), Some("y"));

        let entries: Vec<RecitationEntry> =
            serde_json::from_str(r#"[{"verseKey":"1:1","audioUrl":"https://a/1.mp3"},{"verseKey":"1:2"}]"#)
                .unwrap();
        assert_eq!(entries[0].audio_url.as_deref(), Some("https://a/1.mp3"));
        assert_eq!(entries[1].audio_url, None);
    }

    #[test]
    fn base_url_is_normalised() {
        let client = QuranApiClient::new("https://example.test/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.url("list-surahs"), "https://example.test/list-surahs");
    }
}
