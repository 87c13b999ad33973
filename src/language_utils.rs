//! Language utilities for mapping translation platform codes
//!
//! The platform identifies languages by its own codes (`de`, `zh-CN`, ...).
//! Files in the downloaded archive live under the platform locale
//! (`osx_locale`), while the repository expects its own locale directory
//! names, which differ for a few languages.

use isolang::Language;
use log::debug;
use std::collections::BTreeMap;

use crate::providers::SupportedLanguage;

/// Crowdin codes whose repository locale differs from the platform locale
pub const STATIC_OVERRIDES: &[(&str, &str)] = &[
    ("zh-CN", "zh_Hans"),
    ("zh-TW", "zh_Hant"),
    // In-context localisation pseudo language
    ("en-UD", "xx_LR"),
];

/// How one platform language maps onto paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageMapping {
    /// Platform language code
    pub crowdin_code: String,
    /// Locale segment used inside the downloaded archive
    pub platform_locale: String,
    /// Locale segment used inside the repository
    pub destination_code: String,
}

/// Lookup table from platform codes to [`LanguageMapping`]
#[derive(Debug, Clone, Default)]
pub struct LanguageMap {
    entries: BTreeMap<String, LanguageMapping>,
}

impl LanguageMap {
    /// Build the table from the platform's supported languages
    ///
    /// Destination codes start as the platform locale, are replaced by the
    /// built-in [`STATIC_OVERRIDES`] and finally by the project overrides.
    pub fn from_supported(languages: &[SupportedLanguage], overrides: &BTreeMap<String, String>) -> Self {
        let mut entries = BTreeMap::new();
        for language in languages {
            entries.insert(
                language.crowdin_code.clone(),
                LanguageMapping {
                    crowdin_code: language.crowdin_code.clone(),
                    platform_locale: language.osx_locale.clone(),
                    destination_code: language.osx_locale.clone(),
                },
            );
        }

        let mut map = Self { entries };
        for (code, destination) in STATIC_OVERRIDES {
            map.override_destination(code, destination);
        }
        for (code, destination) in overrides {
            map.override_destination(code, destination);
        }
        map
    }

    fn override_destination(&mut self, crowdin_code: &str, destination: &str) {
        let entry = self
            .entries
            .entry(crowdin_code.to_string())
            .or_insert_with(|| LanguageMapping {
                crowdin_code: crowdin_code.to_string(),
                platform_locale: crowdin_code.to_string(),
                destination_code: crowdin_code.to_string(),
            });
        debug!("Mapping '{}' to '{}'", crowdin_code, destination);
        entry.destination_code = destination.to_string();
    }

    /// Mapping for a known code
    pub fn get(&self, crowdin_code: &str) -> Option<&LanguageMapping> {
        self.entries.get(crowdin_code)
    }

    /// Mapping for any code, falling back to the code itself for both segments
    pub fn resolve(&self, crowdin_code: &str) -> LanguageMapping {
        self.get(crowdin_code).cloned().unwrap_or_else(|| LanguageMapping {
            crowdin_code: crowdin_code.to_string(),
            platform_locale: crowdin_code.to_string(),
            destination_code: crowdin_code.to_string(),
        })
    }

    /// Number of known languages
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// English name of a language code such as `de`, `es-ES` or `zh_Hans`
///
/// Unknown codes are returned unchanged.
pub fn display_name(code: &str) -> String {
    let primary = code
        .split(['-', '_'])
        .next()
        .unwrap_or(code)
        .trim()
        .to_lowercase();

    let language = match primary.len() {
        2 => Language::from_639_1(&primary),
        3 => Language::from_639_3(&primary),
        _ => None,
    };

    match language {
        Some(language) => language.to_name().to_string(),
        None => code.to_string(),
    }
}
