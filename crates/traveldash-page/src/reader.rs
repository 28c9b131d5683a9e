//! Extracts city names and currency codes from the page.

use std::collections::BTreeSet;

use traveldash_weather::page_key;

use crate::page::Page;

/// Class carried by every city entry.
pub const CITY_CLASS: &str = "city";

/// Class of the element holding the base currency code.
pub const HOME_CURRENCY_CLASS: &str = "home-currency-code";

/// Currency codes found next to the city elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrencyCodes {
    /// Distinct codes, each appearing once regardless of how many cities use it
    pub codes: BTreeSet<String>,
    /// City names whose element had no classed sibling to read a code from
    pub unresolved: Vec<String>,
}

/// City names in page order, one per city entry.
///
/// The name is the second line of the entry's text, trimmed. Entries without
/// one are skipped.
pub fn city_names(page: &dyn Page) -> Vec<String> {
    page.class_texts(CITY_CLASS)
        .iter()
        .filter_map(|text| match text.split('\n').nth(1).map(str::trim) {
            Some(name) if !name.is_empty() => Some(name.to_string()),
            _ => {
                tracing::warn!("Skipping city entry without a name line: {:?}", text.trim());
                None
            }
        })
        .collect()
}

/// Currency codes for `city_names`.
///
/// Each city's code is the class of the element immediately after the
/// city's weather container; every class token counts as a code.
pub fn currency_codes(page: &dyn Page, city_names: &[String]) -> CurrencyCodes {
    let mut result = CurrencyCodes::default();

    for name in city_names {
        match page.sibling_class(&page_key(name)) {
            Some(class) => {
                result
                    .codes
                    .extend(class.split_whitespace().map(str::to_string));
            }
            None => {
                tracing::warn!("No currency element found after weather container for {}", name);
                result.unresolved.push(name.clone());
            }
        }
    }

    result
}

/// Base currency code, read from the home currency element.
pub fn base_currency(page: &dyn Page) -> Option<String> {
    let text = page.class_texts(HOME_CURRENCY_CLASS).concat();
    let code = text.trim();
    if code.is_empty() {
        None
    } else {
        Some(code.to_string())
    }
}
