//! Embedded translation tables. Lookup falls back language -> en -> key, so
//! a missing entry degrades to its key instead of breaking the layout.

use std::collections::HashMap;

use lazy_static::lazy_static;
use serde_json::Value;

const EN: &str = include_str!("localize/en.json");
const DE: &str = include_str!("localize/de.json");

lazy_static! {
    static ref TABLES: HashMap<&'static str, HashMap<String, String>> = {
        let mut tables = HashMap::new();
        tables.insert("en", flatten(EN));
        tables.insert("de", flatten(DE));
        tables
    };
    static ref LANGUAGE: String = detect_language();
}

/// Resolve `key` ("section.entry") in the detected language.
pub fn localize(key: &str) -> String {
    localize_in(&LANGUAGE, key)
}

pub fn localize_in(language: &str, key: &str) -> String {
    TABLES
        .get(language)
        .and_then(|table| table.get(key))
        .or_else(|| TABLES.get("en").and_then(|table| table.get(key)))
        .cloned()
        .unwrap_or_else(|| key.to_string())
}

/// Language code from `LANG` (e.g. `de_DE.UTF-8` -> `de`), defaulting to en.
fn detect_language() -> String {
    std::env::var("LANG")
        .ok()
        .and_then(|lang| {
            lang.split(['_', '.'])
                .next()
                .map(|code| code.to_lowercase())
        })
        .filter(|code| TABLES.contains_key(code.as_str()))
        .unwrap_or_else(|| "en".to_string())
}

fn flatten(raw: &str) -> HashMap<String, String> {
    let root: Value = serde_json::from_str(raw).expect("embedded translation table is valid JSON");
    let mut table = HashMap::new();
    if let Value::Object(sections) = root {
        for (section, entries) in sections {
            if let Value::Object(entries) = entries {
                for (name, text) in entries {
                    if let Value::String(text) = text {
                        table.insert(format!("{section}.{name}"), text);
                    }
                }
            }
        }
    }
    table
}
