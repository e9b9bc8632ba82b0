use serde::{Deserialize, Serialize};

use crate::fields::{FieldMap, clean_value};

// ---------------------------------------------------------------------------
// Label vocabulary
// ---------------------------------------------------------------------------

/// Labels as they appear in the application messages, in priority order.
pub mod labels {
    pub const SOURCE: &[&str] = &["Источник"];
    pub const CONTACT: &[&str] = &["Контактное лицо", "Имя"];
    pub const BUSINESS: &[&str] = &["Компания / бренд", "Компания / специализация"];
    pub const CITY: &[&str] = &["Город"];
    pub const PARTNER_TYPE: &[&str] = &["Тип партнера", "Тип партнёра"];
    pub const OFFERINGS: &[&str] = &["Услуги / товары", "Компания / специализация"];
    pub const COMMENT: &[&str] = &["Комментарий"];
    pub const EXPERIENCE: &[&str] = &["Опыт"];
}

pub const FALLBACK_TITLE: &str = "Новый партнёр RemCard";
pub const FALLBACK_DESCRIPTION: &str = "Заявка на подключение партнёра в проект RemCard";
pub const PLACEHOLDER_TAG: &str = "Без тега";
pub const MAX_TAGS: usize = 5;

const OFFERING_DELIMITERS: &[char] = &['•', ',', ';', '/', '|'];

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One normalized partner entry, as stored in the collection's `items`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub title: String,
    pub description: String,
    pub status: String,
    /// 1 to 5 distinct, non-empty tags.
    pub tags: Vec<String>,
    pub note: String,
}

/// The logical fields of an application, after label fallback.
#[derive(Debug, Default)]
struct Application<'a> {
    source: Option<&'a str>,
    contact: Option<&'a str>,
    business: Option<&'a str>,
    city: Option<&'a str>,
    partner_type: Option<&'a str>,
    offerings: Option<&'a str>,
    comment: Option<&'a str>,
    experience: Option<&'a str>,
}

impl<'a> Application<'a> {
    fn from_fields(fields: &'a FieldMap) -> Self {
        Self {
            source: fields.first_non_empty(labels::SOURCE),
            contact: fields.first_non_empty(labels::CONTACT),
            business: fields.first_non_empty(labels::BUSINESS),
            city: fields.first_non_empty(labels::CITY),
            partner_type: fields.first_non_empty(labels::PARTNER_TYPE),
            offerings: fields.first_non_empty(labels::OFFERINGS),
            comment: fields.first_non_empty(labels::COMMENT),
            experience: fields.first_non_empty(labels::EXPERIENCE),
        }
    }

    fn title(&self) -> String {
        match (self.business, self.contact) {
            (Some(business), Some(contact)) => format!("{business} — {contact}"),
            (Some(single), None) | (None, Some(single)) => single.to_string(),
            (None, None) => FALLBACK_TITLE.to_string(),
        }
    }

    fn description(&self) -> String {
        let mut parts = Vec::with_capacity(3);
        match self.offerings.or(self.comment) {
            Some(summary) => parts.push(format!("Заявка на подключение: {summary}")),
            None => parts.push(FALLBACK_DESCRIPTION.to_string()),
        }
        if let Some(city) = self.city {
            parts.push(format!("Город: {city}"));
        }
        if let Some(partner_type) = self.partner_type {
            parts.push(format!("Формат: {partner_type}"));
        }
        format!("{}.", parts.join(". "))
    }

    fn tags(&self) -> Vec<String> {
        let candidates = self
            .partner_type
            .into_iter()
            .chain(self.city)
            .chain(self.offerings.map(split_offerings).unwrap_or_default());
        let tags = unique_tags(candidates, MAX_TAGS);
        if tags.is_empty() {
            vec![PLACEHOLDER_TAG.to_string()]
        } else {
            tags
        }
    }

    fn note(&self, default_source: &str) -> String {
        let source = self.source.unwrap_or(default_source);
        let mut note = format!("Источник: {source}. Статус заявки: подтверждена.");
        if let Some(experience) = self.experience {
            note.push_str(&format!(" Опыт: {experience}."));
        }
        note
    }
}

/// Split an offerings line like `чай • кофе; посуда` into cleaned, non-empty tokens.
pub fn split_offerings(value: &str) -> Vec<&str> {
    value
        .split(OFFERING_DELIMITERS)
        .map(clean_value)
        .filter(|token| !token.is_empty())
        .collect()
}

/// Keep the first `limit` distinct non-empty values, in first-seen order.
pub fn unique_tags<'a>(candidates: impl IntoIterator<Item = &'a str>, limit: usize) -> Vec<String> {
    let mut tags: Vec<String> = Vec::with_capacity(limit);
    for candidate in candidates {
        if tags.len() >= limit {
            break;
        }
        let value = clean_value(candidate);
        if value.is_empty() || tags.iter().any(|tag| tag == value) {
            continue;
        }
        tags.push(value.to_string());
    }
    tags
}

/// Derive a [`Record`] from extracted fields. Never fails: every part has a fallback.
pub fn build_record(fields: &FieldMap, status: &str, default_source: &str) -> Record {
    let application = Application::from_fields(fields);
    Record {
        title: application.title(),
        description: application.description(),
        status: status.to_string(),
        tags: application.tags(),
        note: application.note(default_source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn build(text: &str) -> Record {
        build_record(&FieldMap::parse(text), "Подтверждено", "Telegram")
    }

    #[test]
    fn test_full_application() {
        let record = build(
            "Компания / бренд: Чайная\n\
             Контактное лицо: Анна\n\
             Город: Москва\n\
             Услуги / товары: чай, кофе",
        );
        assert_eq!(
            record,
            Record {
                title: "Чайная — Анна".into(),
                description: "Заявка на подключение: чай, кофе. Город: Москва.".into(),
                status: "Подтверждено".into(),
                tags: vec!["Москва".into(), "чай".into(), "кофе".into()],
                note: "Источник: Telegram. Статус заявки: подтверждена.".into(),
            }
        );
    }

    #[test]
    fn test_all_fallbacks() {
        let record = build("ничего полезного");
        assert_eq!(record.title, FALLBACK_TITLE);
        assert_eq!(record.description, format!("{FALLBACK_DESCRIPTION}."));
        assert_eq!(record.tags, vec![PLACEHOLDER_TAG.to_string()]);
        assert_eq!(record.note, "Источник: Telegram. Статус заявки: подтверждена.");
    }

    #[test]
    fn test_title_with_single_party() {
        assert_eq!(build("Имя: Пётр").title, "Пётр");
        assert_eq!(build("Компания / бренд: Ремстрой").title, "Ремстрой");
    }

    #[test]
    fn test_specialization_feeds_business_and_offerings() {
        let record = build("Компания / специализация: Плитка / сантехника\nИмя: Олег");
        assert_eq!(record.title, "Плитка / сантехника — Олег");
        assert_eq!(record.tags, vec!["Плитка".to_string(), "сантехника".to_string()]);
    }

    #[test]
    fn test_description_uses_comment_and_format() {
        let record = build("Комментарий: хочу в каталог\nТип партнёра: Мастер\nГород: Сочи");
        assert_eq!(
            record.description,
            "Заявка на подключение: хочу в каталог. Город: Сочи. Формат: Мастер."
        );
        assert_eq!(record.tags, vec!["Мастер".to_string(), "Сочи".to_string()]);
    }

    #[test]
    fn test_source_and_experience_in_note() {
        let record = build("Источник: Сайт\nОпыт: 10 лет");
        assert_eq!(
            record.note,
            "Источник: Сайт. Статус заявки: подтверждена. Опыт: 10 лет."
        );
    }

    #[test]
    fn test_tags_are_unique_and_capped() {
        let record = build(
            "Тип партнера: Магазин\nГород: Тверь\nУслуги / товары: Тверь • a | b; a / c, d, e",
        );
        assert_eq!(
            record.tags,
            vec!["Магазин", "Тверь", "a", "b", "c"]
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_tags_are_case_sensitive() {
        let record = build("Услуги / товары: Чай, чай");
        assert_eq!(record.tags, vec!["Чай".to_string(), "чай".to_string()]);
    }

    #[test]
    fn test_split_offerings_drops_blank_tokens() {
        assert_eq!(split_offerings(" ,чай,, - ;кофе| "), vec!["чай", "кофе"]);
        assert!(split_offerings("").is_empty());
    }

    #[test]
    fn test_unique_tags_limit() {
        let tags = unique_tags(["1", "2", "2", "3", "4", "5", "6"], MAX_TAGS);
        assert_eq!(tags.len(), 5);
        assert_eq!(tags.last().map(String::as_str), Some("5"));
    }

    #[test]
    fn test_tag_bounds_over_many_inputs() {
        let samples = [
            "",
            "Город: -",
            "Услуги / товары: ,;|/•",
            "Тип партнера: x\nГород: x\nУслуги / товары: x, x",
            "Услуги / товары: 1,2,3,4,5,6,7,8",
        ];
        for sample in samples {
            let tags = build(sample).tags;
            assert!((1..=MAX_TAGS).contains(&tags.len()), "{sample:?} -> {tags:?}");
            assert!(tags.iter().all(|t| !t.is_empty()));
            let mut sorted = tags.clone();
            sorted.sort();
            sorted.dedup();
            assert_eq!(sorted.len(), tags.len());
        }
    }

    #[test]
    fn test_record_serializes_in_field_order() {
        let json = serde_json::to_string(&build("Имя: Анна")).unwrap();
        assert!(json.starts_with(r#"{"title":"Анна","description":"#));
        assert!(json.contains(r#""status":"Подтверждено","tags":["Без тега"],"note":"#));
    }
}
