/*!
 * Tests for mapping platform language codes onto repository locales
 */

use std::collections::BTreeMap;

use arnold::language_utils::{LanguageMap, STATIC_OVERRIDES, display_name};
use arnold::providers::SupportedLanguage;

/// Test that built-in overrides apply even when the platform does not list the language
#[test]
fn test_fromSupported_withNoLanguages_shouldStillKnowStaticOverrides() {
    let map = LanguageMap::from_supported(&[], &BTreeMap::new());
    assert_eq!(map.len(), STATIC_OVERRIDES.len());

    let pseudo = map.resolve("en-UD");
    assert_eq!(pseudo.platform_locale, "en-UD");
    assert_eq!(pseudo.destination_code, "xx_LR");
}

/// Test the traditional Chinese mapping
#[test]
fn test_resolve_withTraditionalChinese_shouldUseRepositoryLocale() {
    let languages = vec![SupportedLanguage {
        crowdin_code: "zh-TW".to_string(),
        osx_locale: "zh-Hant".to_string(),
        name: "Chinese Traditional".to_string(),
    }];
    let map = LanguageMap::from_supported(&languages, &BTreeMap::new());

    let mapping = map.resolve("zh-TW");
    assert_eq!(mapping.crowdin_code, "zh-TW");
    assert_eq!(mapping.platform_locale, "zh-Hant");
    assert_eq!(mapping.destination_code, "zh_Hant");
}

/// Test display names used in pull request titles
#[test]
fn test_displayName_withThreeLetterCode_shouldResolve() {
    assert_eq!(display_name("fra"), "French");
    assert_eq!(display_name("unknown"), "unknown");
}
