use chrono::NaiveDate;
use partner_intake::collection::{Collection, Placement, merge_into_file};
use partner_intake::fields::FieldMap;
use partner_intake::input::{InputSource, read_submission_from};
use partner_intake::record::{Record, build_record};
use pretty_assertions::assert_eq;
use std::fs;
use std::io::Cursor;

const MESSAGE: &str = "Новая заявка партнера RemCard:
Компания / бренд: Чайная
Контактное лицо: Анна
Город: Москва
Услуги / товары: чай, кофе
Опыт: -
";

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
}

fn record_from(text: &str) -> Record {
    let submission =
        read_submission_from(InputSource::Inline(text.to_string()), Cursor::new(&b""[..]), false)
            .expect("failed reading submission");
    build_record(&FieldMap::parse(&submission.text), "Подтверждено", "Telegram")
}

#[test]
fn message_becomes_record() {
    let record = record_from(MESSAGE);
    assert_eq!(record.title, "Чайная — Анна");
    assert_eq!(
        record.description,
        "Заявка на подключение: чай, кофе. Город: Москва."
    );
    assert_eq!(record.tags, vec!["Москва", "чай", "кофе"]);
    assert_eq!(record.note, "Источник: Telegram. Статус заявки: подтверждена.");
}

#[test]
fn stdin_message_is_merged_into_new_file() {
    let temp = tempfile::tempdir().expect("failed creating tempdir");
    let path = temp.path().join("confirmed-partners.json");

    let stream = Cursor::new(MESSAGE.as_bytes());
    let submission =
        read_submission_from(InputSource::Stdin, stream, false).expect("failed reading stdin");
    let record = build_record(&FieldMap::parse(&submission.text), "Подтверждено", "Telegram");
    let count = merge_into_file(&path, &record, Placement::Append, "Telegram", today())
        .expect("failed merging");
    assert_eq!(count, 1);

    let collection = Collection::load(&path, "Telegram", today()).expect("failed reloading");
    assert_eq!(collection.source.as_deref(), Some("Telegram"));
    assert_eq!(collection.updated_at, Some(today()));
    let stored: Record = serde_json::from_value(collection.items[0].clone()).expect("not a record");
    assert_eq!(stored, record);
}

#[test]
fn repeated_merges_keep_every_record() {
    let temp = tempfile::tempdir().expect("failed creating tempdir");
    let path = temp.path().join("partners.json");
    fs::write(
        &path,
        concat!(
            "{\n",
            "  \"source\": \"Telegram\",\n",
            "  \"updatedAt\": \"2026-01-01\",\n",
            "  \"items\": [\n",
            "    {\n",
            "      \"title\": \"Старый партнёр\"\n",
            "    }\n",
            "  ],\n",
            "  \"version\": 3\n",
            "}\n",
        ),
    )
    .expect("failed writing collection");

    let names = ["Имя: Первый", "Имя: Второй", "Имя: Третий"];
    for name in names {
        merge_into_file(&path, &record_from(name), Placement::Prepend, "Telegram", today())
            .expect("failed merging");
    }

    let text = fs::read_to_string(&path).expect("failed reading collection");
    let value: serde_json::Value = serde_json::from_str(&text).expect("invalid json");
    let titles: Vec<&str> = value["items"]
        .as_array()
        .expect("items not a list")
        .iter()
        .map(|item| item["title"].as_str().expect("title"))
        .collect();
    assert_eq!(titles, vec!["Третий", "Второй", "Первый", "Старый партнёр"]);
    assert_eq!(value["version"], serde_json::json!(3));
    assert_eq!(value["updatedAt"], serde_json::json!("2026-10-17"));
    assert!(text.contains("\"title\": \"Третий\""));
    assert!(text.ends_with("}\n"));
}

#[test]
fn empty_message_writes_nothing() {
    let temp = tempfile::tempdir().expect("failed creating tempdir");
    let path = temp.path().join("confirmed-partners.json");

    let source = InputSource::Inline("   \n".into());
    let result = read_submission_from(source, Cursor::new(&b""[..]), false);
    assert!(result.is_err());
    assert!(!path.exists());
}
