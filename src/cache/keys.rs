//! Cache key derivation.
//!
//! Keys are `<operation>-<discriminator>`. Distinct operations use distinct
//! prefixes, and every request parameter that changes the result is part of
//! the discriminator, so two different requests never share a key.

use chrono::NaiveDate;

pub fn ticker_details(ticker: &str) -> String {
    format!("ticker-details-{}", ticker)
}

pub fn favourites_open_close(user_id: &str, date: NaiveDate) -> String {
    format!("get-fav-open-close-{}-{}", user_id, date.format("%Y-%m-%d"))
}
