// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Seed data for the Status/Message Catalog, transcribed from the reference
//! translation table: one entry per known reader status code plus the
//! SDK-originated negative codes, six languages each.

use super::language::*;
use std::collections::HashMap;

macro_rules! table {
    ($($code:expr => { en: $en:expr, bg: $bg:expr, ru: $ru:expr, de: $de:expr, fr: $fr:expr, zh: $zh:expr $(,)? }),* $(,)?) => {{
        let mut map: HashMap<i32, HashMap<&'static str, &'static str>> = HashMap::new();
        $(
            let mut entry: HashMap<&'static str, &'static str> = HashMap::new();
            entry.insert(ENGLISH, $en);
            entry.insert(BULGARIAN, $bg);
            entry.insert(RUSSIAN, $ru);
            entry.insert(GERMAN, $de);
            entry.insert(FRENCH, $fr);
            entry.insert(CHINESE, $zh);
            map.insert($code, entry);
        )*
        map
    }};
}

pub(super) fn seed_table() -> HashMap<i32, HashMap<&'static str, &'static str>> {
    table! {
        0x00 => {
            en: "Operation successful", bg: "Операцията е успешна",
            ru: "Операция выполнена успешно", de: "Operation erfolgreich",
            fr: "Opération réussie", zh: "操作成功",
        },
        0x01 => {
            en: "General error", bg: "Обща грешка",
            ru: "Общая ошибка", de: "Allgemeiner Fehler",
            fr: "Erreur générale", zh: "一般错误",
        },
        0x02 => {
            en: "Memory overrun", bg: "Препълване на паметта",
            ru: "Переполнение памяти", de: "Speicherüberlauf",
            fr: "Dépassement de mémoire", zh: "内存溢出",
        },
        0x03 => {
            en: "Memory locked", bg: "Паметта е заключена",
            ru: "Память заблокирована", de: "Speicher gesperrt",
            fr: "Mémoire verrouillée", zh: "内存已锁定",
        },
        0x04 => {
            en: "Authentication failed", bg: "Неуспешна автентикация",
            ru: "Ошибка аутентификации", de: "Authentifizierung fehlgeschlagen",
            fr: "Échec d'authentification", zh: "认证失败",
        },
        0x0B => {
            en: "No tag responding", bg: "Няма отговор от таг",
            ru: "Нет ответа от метки", de: "Kein Tag antwortet",
            fr: "Aucune étiquette ne répond", zh: "无标签响应",
        },
        0x0C => {
            en: "RF communication timeout", bg: "Изтекло време за RF комуникация",
            ru: "Тайм-аут RF-связи", de: "RF-Kommunikations-Timeout",
            fr: "Timeout de communication RF", zh: "RF通信超时",
        },
        0x14 => {
            en: "Parameter unsupported", bg: "Неподдържан параметър",
            ru: "Неподдерживаемый параметр", de: "Parameter nicht unterstützt",
            fr: "Paramètre non pris en charge", zh: "参数不支持",
        },
        0x15 => {
            en: "Parameter length error", bg: "Грешка в дължината на параметъра",
            ru: "Ошибка длины параметра", de: "Fehler in der Parameterlänge",
            fr: "Erreur de longueur de paramètre", zh: "参数长度错误",
        },
        0x16 => {
            en: "Parameter context error", bg: "Грешка в контекста на параметъра",
            ru: "Ошибка контекста параметра", de: "Parameterkontextfehler",
            fr: "Erreur de contexte de paramètre", zh: "参数上下文错误",
        },
        0x17 => {
            en: "Unsupported command", bg: "Неподдържана команда",
            ru: "Неподдерживаемая команда", de: "Nicht unterstützter Befehl",
            fr: "Commande non prise en charge", zh: "不支持的命令",
        },
        0x18 => {
            en: "Address error", bg: "Грешка в адреса",
            ru: "Ошибка адреса", de: "Adressfehler",
            fr: "Erreur d'adresse", zh: "地址错误",
        },
        0x20 => {
            en: "Checksum error", bg: "Грешка в контролната сума",
            ru: "Ошибка контрольной суммы", de: "Prüfsummenfehler",
            fr: "Erreur de somme de contrôle", zh: "校验和错误",
        },
        0x21 => {
            en: "Unsupported TLV type", bg: "Неподдържан TLV тип",
            ru: "Неподдерживаемый тип TLV", de: "Nicht unterstützter TLV-Typ",
            fr: "Type TLV non pris en charge", zh: "不支持的TLV类型",
        },
        0x22 => {
            en: "Flash memory error", bg: "Грешка във флаш паметта",
            ru: "Ошибка флэш-памяти", de: "Flash-Speicherfehler",
            fr: "Erreur de mémoire flash", zh: "闪存错误",
        },
        0xFF => {
            en: "Internal error", bg: "Вътрешна грешка",
            ru: "Внутренняя ошибка", de: "Interner Fehler",
            fr: "Erreur interne", zh: "内部错误",
        },
        -1 => {
            en: "General communication error", bg: "Обща комуникационна грешка",
            ru: "Общая ошибка связи", de: "Allgemeiner Kommunikationsfehler",
            fr: "Erreur de communication générale", zh: "通信总错误",
        },
        -2 => {
            en: "Port access error", bg: "Грешка при достъп до порт",
            ru: "Ошибка доступа к порту", de: "Portzugriffsfehler",
            fr: "Erreur d'accès au port", zh: "端口访问错误",
        },
        -3 => {
            en: "Port configuration error", bg: "Грешка в конфигурацията на порта",
            ru: "Ошибка конфигурации порта", de: "Portkonfigurationsfehler",
            fr: "Erreur de configuration du port", zh: "端口配置错误",
        },
        -4 => {
            en: "Operation timeout", bg: "Изтекло време за операцията",
            ru: "Тайм-аут операции", de: "Zeitüberschreitung bei der Operation",
            fr: "Délai d'opération expiré", zh: "操作超时",
        },
        -5 => {
            en: "Invalid parameter", bg: "Невалиден параметър",
            ru: "Недопустимый параметр", de: "Ungültiger Parameter",
            fr: "Paramètre invalide", zh: "无效参数",
        },
        -6 => {
            en: "Resource busy", bg: "Ресурсът е зает",
            ru: "Ресурс занят", de: "Ressource beschäftigt",
            fr: "Ressource occupée", zh: "资源繁忙",
        },
        -10 => {
            en: "Device not found", bg: "Устройството не е намерено",
            ru: "Устройство не найдено", de: "Gerät nicht gefunden",
            fr: "Périphérique introuvable", zh: "未找到设备",
        },
        -99 => {
            en: "Undefined error", bg: "Неопределена грешка",
            ru: "Неопределенная ошибка", de: "Undefinierter Fehler",
            fr: "Erreur non définie", zh: "未定义的错误",
        },
    }
}
