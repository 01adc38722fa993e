use std::fmt;
use std::str::FromStr;

use chrono::{ Local, Timelike };
use serde::{ Serialize, Deserialize };

/// Locale codes accepted by the backend's anonymous registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LanguageCode {
    #[serde(rename = "pt_BR")]
    PtBr,
    #[serde(rename = "en_US")]
    EnUs,
    #[serde(rename = "es_ES")]
    EsEs,
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseLanguageCodeError {
    message: String,
}

impl fmt::Display for ParseLanguageCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseLanguageCodeError {}

impl FromStr for LanguageCode {
    type Err = ParseLanguageCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "pt_br" | "pt" => Ok(LanguageCode::PtBr),
            "en_us" | "en" => Ok(LanguageCode::EnUs),
            "es_es" | "es" => Ok(LanguageCode::EsEs),
            _ =>
                Err(ParseLanguageCodeError {
                    message: format!("Invalid language code: '{}'", s),
                }),
        }
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LanguageCode::PtBr => "pt_BR",
            LanguageCode::EnUs => "en_US",
            LanguageCode::EsEs => "es_ES",
        })
    }
}

impl LanguageCode {
    /// Short tag persisted in the session store for the UI layer.
    pub fn storage_tag(&self) -> &'static str {
        match self {
            LanguageCode::PtBr => "pt-BR",
            LanguageCode::EnUs => "en",
            LanguageCode::EsEs => "es-ES",
        }
    }
}

/// Time-of-day greeting: 05..12 morning, 12..18 afternoon, evening otherwise.
/// Portuguese for pt_BR, English for everything else.
pub fn greeting(locale: LanguageCode, hour: u32) -> &'static str {
    let pt = locale == LanguageCode::PtBr;
    if (5..12).contains(&hour) {
        if pt { "Bom dia" } else { "Good morning" }
    } else if (12..18).contains(&hour) {
        if pt { "Boa tarde" } else { "Good afternoon" }
    } else {
        if pt { "Boa noite" } else { "Good evening" }
    }
}

pub fn local_greeting(locale: LanguageCode) -> &'static str {
    greeting(locale, Local::now().hour())
}

/// Renders an ISO date or datetime string as "dd/mm/yyyy".
pub fn format_date(value: &str) -> String {
    let date = chrono::DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.date_naive())
        .or_else(|_| chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d"));

    match date {
        Ok(d) => d.format("%d/%m/%Y").to_string(),
        Err(_) => "Invalid date".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backend_codes_and_loose_tags() {
        assert_eq!("pt_BR".parse::<LanguageCode>().unwrap(), LanguageCode::PtBr);
        assert_eq!("pt-BR".parse::<LanguageCode>().unwrap(), LanguageCode::PtBr);
        assert_eq!("en".parse::<LanguageCode>().unwrap(), LanguageCode::EnUs);
        assert_eq!("es_ES".parse::<LanguageCode>().unwrap(), LanguageCode::EsEs);
        assert!("fr_FR".parse::<LanguageCode>().is_err());
    }

    #[test]
    fn greeting_follows_hour_windows() {
        assert_eq!(greeting(LanguageCode::EnUs, 5), "Good morning");
        assert_eq!(greeting(LanguageCode::EnUs, 11), "Good morning");
        assert_eq!(greeting(LanguageCode::EnUs, 12), "Good afternoon");
        assert_eq!(greeting(LanguageCode::EnUs, 17), "Good afternoon");
        assert_eq!(greeting(LanguageCode::EnUs, 18), "Good evening");
        assert_eq!(greeting(LanguageCode::EnUs, 3), "Good evening");
        assert_eq!(greeting(LanguageCode::PtBr, 8), "Bom dia");
        assert_eq!(greeting(LanguageCode::EsEs, 8), "Good morning");
    }

    #[test]
    fn formats_dates_and_datetimes() {
        assert_eq!(format_date("2025-12-18"), "18/12/2025");
        assert_eq!(format_date("2025-12-18T14:30:00Z"), "18/12/2025");
        assert_eq!(format_date("not a date"), "Invalid date");
    }
}
