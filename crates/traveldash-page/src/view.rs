//! Writes weather and exchange-rate displays into the page.

use traveldash_weather::City;

use crate::page::{escape_html, Page};

/// Markup shown inside a city's weather container.
pub fn weather_block(city: &City) -> String {
    let state = escape_html(&city.weather_state);
    format!(
        concat!(
            r#"<h6 class="text-center">{time}</h6>"#,
            r#"<h6 class="text-center">{state}</h6>"#,
            r#"<img class="center-block" src="{icon}" alt="{state}" />"#,
            r#"<h3 class="text-center">{temp}°F</h3>"#,
        ),
        time = escape_html(&city.local_time),
        state = state,
        icon = escape_html(&city.weather_icon),
        temp = city.temp,
    )
}

/// Replace the contents of the city's weather container.
///
/// Returns false, leaving the page untouched, when the page has no container
/// for the city.
pub fn update_city_weather(page: &mut dyn Page, city: &City) -> bool {
    let key = city.page_key();
    let updated = page.set_inner_html(&key, &weather_block(city));
    if !updated {
        tracing::debug!("No weather container #{} for {}", key, city.city_name);
    }
    updated
}

/// Display line for one conversion rate, e.g. `1 USD = 0.9 EUR`.
pub fn currency_line(code: &str, base: &str, rate: f64) -> String {
    format!("1 {} = {} {}", base, rate, code)
}

/// Write the rate line into every child of every element classed `code`.
///
/// Returns the number of `code` elements found.
pub fn update_currency_display(page: &mut dyn Page, code: &str, base: &str, rate: f64) -> usize {
    page.set_children_text(code, &currency_line(code, base, rate))
}
