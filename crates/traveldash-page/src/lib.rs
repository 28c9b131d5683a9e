//! Page access for Traveldash.
//!
//! [`Page`] is the seam between the dashboard and the markup it reads city
//! entries from and writes weather and rate displays into. [`HtmlPage`] backs
//! it with a parsed HTML document.

pub mod page;
pub mod reader;
pub mod view;

pub use page::{escape_html, HtmlPage, Page};
pub use reader::{base_currency, city_names, currency_codes, CurrencyCodes};
pub use view::{currency_line, update_city_weather, update_currency_display, weather_block};
