// src/extract/language.rs

//! Language enumeration and ISO 639 code mapping.

/// Languages the extractor can index.
///
/// English correlates with ISO codes "en" and "eng". The enum leaves room
/// for more languages once stemming support lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
}

/// ISO 639-1 two-letter language codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsoCode639_1 {
    En,
}

/// ISO 639-3 three-letter language codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsoCode639_3 {
    Eng,
}

impl IsoCode639_1 {
    pub fn from_value(value: &str) -> Option<Self> {
        match value {
            "en" => Some(Self::En),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::En => "en",
        }
    }
}

impl IsoCode639_3 {
    pub fn from_value(value: &str) -> Option<Self> {
        match value {
            "eng" => Some(Self::Eng),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eng => "eng",
        }
    }
}

impl Language {
    pub fn from_iso_639_1(code: IsoCode639_1) -> Self {
        match code {
            IsoCode639_1::En => Self::English,
        }
    }

    pub fn from_iso_639_3(code: IsoCode639_3) -> Self {
        match code {
            IsoCode639_3::Eng => Self::English,
        }
    }

    /// Resolve either a two- or three-letter ISO code.
    pub fn from_iso_code(value: &str) -> Option<Self> {
        match value.len() {
            2 => IsoCode639_1::from_value(value).map(Self::from_iso_639_1),
            3 => IsoCode639_3::from_value(value).map(Self::from_iso_639_3),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_iso_code() {
        assert_eq!(Language::from_iso_code("en"), Some(Language::English));
        assert_eq!(Language::from_iso_code("eng"), Some(Language::English));
        assert_eq!(Language::from_iso_code("fr"), None);
        assert_eq!(Language::from_iso_code("deu"), None);
        assert_eq!(Language::from_iso_code("en-US"), None);
    }

    #[test]
    fn test_iso_round_trip() {
        assert_eq!(IsoCode639_1::from_value("en").unwrap().as_str(), "en");
        assert_eq!(IsoCode639_3::from_value("eng").unwrap().as_str(), "eng");
    }
}
