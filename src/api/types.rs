//! Wire DTOs for the content API's JSON responses
//!
//! Deserialization targets only; fields the collector never reads are simply
//! omitted and ignored by serde. Conversions into the domain types live here
//! so the client module deals in typed values only.

#![allow(missing_docs)]

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::{Chapter, ResourceInfo, VerseKey, VerseMetadata, VerseRecord};

use super::ApiError;

/// `GET /chapters` response envelope.
#[derive(Debug, Deserialize)]
pub struct ChaptersResponse {
    /// All chapters, ordered by id
    pub chapters: Vec<ChapterDto>,
}

/// `GET /chapters/{id}` response envelope.
#[derive(Debug, Deserialize)]
pub struct ChapterResponse {
    /// The requested chapter
    pub chapter: ChapterDto,
}

/// Chapter entry as the API reports it.
#[derive(Debug, Deserialize)]
pub struct ChapterDto {
    pub id: u32,
    pub name_simple: String,
    #[serde(default)]
    pub name_arabic: String,
    pub verses_count: usize,
    #[serde(default)]
    pub revelation_place: Option<String>,
    #[serde(default)]
    pub revelation_order: Option<u32>,
}

impl From<ChapterDto> for Chapter {
    fn from(dto: ChapterDto) -> Self {
        Chapter {
            id: dto.id,
            name_simple: dto.name_simple,
            name_arabic: dto.name_arabic,
            verses_count: dto.verses_count,
            revelation_place: dto.revelation_place,
            revelation_order: dto.revelation_order,
        }
    }
}

/// `GET /verses/by_chapter/{id}` response envelope.
#[derive(Debug, Deserialize)]
pub struct VersesResponse {
    /// Verses on this page
    pub verses: Vec<VerseDto>,
    /// Pagination cursor; `next_page: None` terminates traversal
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// Pagination block attached to list responses.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub current_page: Option<u32>,
    /// Next page number, absent on the last page
    #[serde(default)]
    pub next_page: Option<u32>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub total_records: Option<u64>,
}

/// Verse entry as the API reports it.
#[derive(Debug, Deserialize)]
pub struct VerseDto {
    pub verse_key: String,
    pub verse_number: u32,
    #[serde(default)]
    pub text_uthmani: Option<String>,
    #[serde(default)]
    pub translations: Vec<TranslationDto>,
    #[serde(default)]
    pub juz_number: Option<u32>,
    #[serde(default)]
    pub page_number: Option<u32>,
    #[serde(default)]
    pub hizb_number: Option<u32>,
    #[serde(default)]
    pub rub_el_hizb_number: Option<u32>,
    #[serde(default)]
    pub ruku_number: Option<u32>,
    #[serde(default)]
    pub manzil_number: Option<u32>,
    #[serde(default)]
    pub sajdah_number: Option<u32>,
}

/// Inline translation attached to a verse.
#[derive(Debug, Deserialize)]
pub struct TranslationDto {
    #[serde(default)]
    pub resource_id: Option<u32>,
    #[serde(default)]
    pub resource_name: Option<String>,
    pub text: String,
}

impl VerseDto {
    /// Build the persisted record for this verse.
    ///
    /// `include_metadata` controls whether the positional metadata bag is
    /// carried over; tafsirs start empty and are merged in later.
    pub fn into_record(self, chapter: &Chapter, include_metadata: bool) -> Result<VerseRecord, ApiError> {
        let verse_id: VerseKey = self
            .verse_key
            .parse()
            .map_err(|e| ApiError::ParseError(format!("bad verse_key: {e}")))?;

        let arabic_text = self.text_uthmani.unwrap_or_default();

        let mut translations = BTreeMap::new();
        for t in self.translations {
            let name = t
                .resource_name
                .or_else(|| t.resource_id.map(|id| format!("translation_{id}")))
                .unwrap_or_else(|| "translation".to_string());
            translations.insert(name, t.text);
        }

        let metadata = if include_metadata {
            Some(VerseMetadata {
                juz: self.juz_number,
                page: self.page_number,
                hizb: self.hizb_number,
                rub_el_hizb: self.rub_el_hizb_number,
                ruku: self.ruku_number,
                manzil: self.manzil_number,
                sajdah: self.sajdah_number,
                revelation_place: chapter.revelation_place.clone(),
                revelation_order: chapter.revelation_order,
            })
        } else {
            None
        };

        Ok(VerseRecord {
            verse_id,
            surah_number: verse_id.chapter,
            verse_number: self.verse_number,
            surah_name: chapter.name_simple.clone(),
            surah_name_arabic: chapter.name_arabic.clone(),
            arabic_text,
            translations,
            tafsirs: BTreeMap::new(),
            metadata,
        })
    }
}

/// `GET /tafsirs/{id}/by_ayah/{key}` response envelope.
///
/// Both the envelope field and the text inside it can be absent; either
/// counts as "no commentary for this verse".
#[derive(Debug, Deserialize)]
pub struct TafsirResponse {
    #[serde(default)]
    pub tafsir: Option<TafsirDto>,
}

/// Tafsir entry as the API reports it.
#[derive(Debug, Deserialize)]
pub struct TafsirDto {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub resource_name: Option<String>,
}

/// `GET /resources/translations` response envelope.
#[derive(Debug, Deserialize)]
pub struct TranslationsResponse {
    pub translations: Vec<ResourceDto>,
}

/// `GET /resources/tafsirs` response envelope.
#[derive(Debug, Deserialize)]
pub struct TafsirsResponse {
    pub tafsirs: Vec<ResourceDto>,
}

/// Resource listing entry shared by the translations and tafsirs catalogs.
#[derive(Debug, Deserialize)]
pub struct ResourceDto {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub language_name: Option<String>,
    #[serde(default)]
    pub author_name: Option<String>,
}

impl From<ResourceDto> for ResourceInfo {
    fn from(dto: ResourceDto) -> Self {
        ResourceInfo {
            id: dto.id,
            name: dto.name,
            language: dto.language_name,
            author_name: dto.author_name,
        }
    }
}
