// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Status/Message Catalog: numeric status codes to localized strings.
//!
//! Non-negative codes originate from the reader itself; negative codes are
//! SDK-originated. The catalog is global, mutable at runtime and readable
//! from many call sites concurrently, so lookups and mutations go through a
//! `parking_lot::RwLock` rather than requiring every caller to hold a
//! reference to a catalog instance.

mod translations;

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Supported language codes.
pub mod language {
    pub const ENGLISH: &str = "en";
    pub const BULGARIAN: &str = "bg";
    pub const RUSSIAN: &str = "ru";
    pub const GERMAN: &str = "de";
    pub const FRENCH: &str = "fr";
    pub const CHINESE: &str = "zh";
}

/// Status codes defined by the UHF protocol. Values outside this set are
/// permissible on the wire; the catalog falls back to a synthesized
/// placeholder for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum StatusCode {
    Success = 0x00,
    GeneralError = 0x01,
    MemoryOverrun = 0x02,
    MemoryLocked = 0x03,
    AuthFail = 0x04,
    NoTag = 0x0B,
    RfTimeout = 0x0C,
    ParameterUnsupported = 0x14,
    ParameterLengthError = 0x15,
    ParameterContextError = 0x16,
    UnsupportedCommand = 0x17,
    AddressError = 0x18,
    ChecksumError = 0x20,
    UnsupportedTlvType = 0x21,
    FlashError = 0x22,
    InternalError = 0xFF,
}

impl StatusCode {
    pub fn is_success(code: i32) -> bool {
        code == StatusCode::Success as i32
    }
}

type LangTable = HashMap<&'static str, &'static str>;

struct Catalog {
    translations: HashMap<i32, LangTable>,
    default_language: String,
}

fn global_catalog() -> &'static RwLock<Catalog> {
    static CATALOG: OnceLock<RwLock<Catalog>> = OnceLock::new();
    CATALOG.get_or_init(|| {
        RwLock::new(Catalog {
            translations: translations::seed_table(),
            default_language: language::ENGLISH.to_string(),
        })
    })
}

/// Look up the localized message for `code` in `lang`. Falls back to
/// English, then to a synthesized, still-localized placeholder. Never
/// returns an empty string.
pub fn message_for(code: i32, lang: &str) -> String {
    let catalog = global_catalog().read();
    if let Some(table) = catalog.translations.get(&code) {
        if let Some(msg) = table.get(lang) {
            return (*msg).to_string();
        }
        if let Some(msg) = table.get(language::ENGLISH) {
            return (*msg).to_string();
        }
    }
    synthesize(code, lang)
}

/// Message for `code` in the process-wide default language.
pub fn message_for_default(code: i32) -> String {
    let lang = global_catalog().read().default_language.clone();
    message_for(code, &lang)
}

/// Change the process-wide default language used by [`message_for_default`].
pub fn set_default_language(lang: &str) {
    global_catalog().write().default_language = lang.to_string();
}

/// Register or override a translation for `code` in `lang`. Leaked to
/// `'static` deliberately: the catalog is a small, rarely-mutated table for
/// the lifetime of the process, and every other entry in it is already a
/// `&'static str` literal.
pub fn add_translation(code: i32, lang: &'static str, text: &'static str) {
    let mut catalog = global_catalog().write();
    catalog.translations.entry(code).or_default().insert(lang, text);
}

fn synthesize(code: i32, lang: &str) -> String {
    match lang {
        language::BULGARIAN => {
            if code < 0 {
                format!("Системен код за грешка {code}")
            } else {
                format!("Статус код 0x{code:02X}")
            }
        }
        language::RUSSIAN => {
            if code < 0 {
                format!("Системный код ошибки {code}")
            } else {
                format!("Код состояния 0x{code:02X}")
            }
        }
        language::GERMAN => {
            if code < 0 {
                format!("Systemfehlercode {code}")
            } else {
                format!("Statuscode 0x{code:02X}")
            }
        }
        language::FRENCH => {
            if code < 0 {
                format!("Code d'erreur système {code}")
            } else {
                format!("Code d'état 0x{code:02X}")
            }
        }
        language::CHINESE => {
            if code < 0 {
                format!("系统错误代码 {code}")
            } else {
                format!("状态码 0x{code:02X}")
            }
        }
        _ => {
            if code < 0 {
                format!("System error code {code}")
            } else {
                format!("Status code 0x{code:02X}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_code_translates_to_bulgarian() {
        assert_eq!(
            message_for(0x14, language::BULGARIAN),
            "Неподдържан параметър"
        );
    }

    #[test]
    fn known_sdk_code_translates_to_english() {
        assert_eq!(
            message_for(-1, language::ENGLISH),
            "General communication error"
        );
    }

    #[test]
    fn unknown_negative_code_synthesizes_a_message() {
        let msg = message_for(-9999, language::ENGLISH);
        assert!(msg.starts_with("System error code"));
    }

    #[test]
    fn unknown_positive_code_is_hex() {
        let msg = message_for(0x7A, language::ENGLISH);
        assert_eq!(msg, "Status code 0x7A");
    }

    #[test]
    fn every_code_has_a_nonempty_message_in_every_language() {
        let codes = [0x00, 0x14, 0xFF, -1, -10, -99, -12345, 999];
        let langs = [
            language::ENGLISH,
            language::BULGARIAN,
            language::RUSSIAN,
            language::GERMAN,
            language::FRENCH,
            language::CHINESE,
        ];
        for &code in &codes {
            for &lang in &langs {
                assert!(!message_for(code, lang).is_empty());
            }
        }
    }

    #[test]
    fn add_translation_then_lookup() {
        add_translation(12345, "en", "Custom test status");
        assert_eq!(message_for(12345, "en"), "Custom test status");
    }

    #[test]
    fn default_language_roundtrip() {
        set_default_language(language::BULGARIAN);
        assert_eq!(message_for_default(0x14), "Неподдържан параметър");
        set_default_language(language::ENGLISH);
    }
}
