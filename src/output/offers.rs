use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::types::{Offer, SearchResult, ValidityDate};

const DAY_MS: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

/// Flattened offer used for `--json` output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleOffer {
    pub title: String,
    pub price: f64,
    pub retailer: String,
    pub expires: String,
    pub discount_percent: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleSearchResult {
    pub query: String,
    pub total: u64,
    pub offers: Vec<SimpleOffer>,
}

pub fn format_price(price: f64) -> String {
    format!("€{:.2}", price)
}

fn discount_percent(price: f64, old_price: Option<f64>) -> Option<i64> {
    match old_price {
        Some(old) if old > 0.0 && old > price => Some(((1.0 - price / old) * 100.0).round() as i64),
        _ => None,
    }
}

/// `-25%`, or empty when there is no higher previous price.
pub fn format_discount(price: f64, old_price: Option<f64>) -> String {
    discount_percent(price, old_price)
        .map(|p| format!("-{}%", p))
        .unwrap_or_default()
}

/// Accepts RFC 3339 timestamps, naive timestamps (taken as UTC) and plain dates.
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Days until the first validity window ends, rounded up.
pub fn format_validity(dates: &[ValidityDate], now: DateTime<Utc>) -> String {
    let Some(to) = dates.first().and_then(|d| parse_date(&d.to)) else {
        return String::new();
    };
    let days_left = ((to - now).num_milliseconds() as f64 / DAY_MS).ceil() as i64;
    match days_left {
        d if d < 0 => "expired".to_string(),
        0 => "today".to_string(),
        1 => "1 day left".to_string(),
        d => format!("{} days left", d),
    }
}

pub fn simplify_offer(offer: &Offer) -> SimpleOffer {
    let title = [
        offer.brand.as_ref().map(|b| b.name.as_str()),
        Some(offer.product.name.as_str()),
        offer.description.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(" - ");

    let expires = offer
        .validity_dates
        .first()
        .and_then(|d| parse_date(&d.to))
        .map(|to| to.format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    SimpleOffer {
        title,
        price: offer.price,
        retailer: offer.retailer().to_string(),
        expires,
        discount_percent: discount_percent(offer.price, offer.old_price),
        external_url: offer.external_url.clone(),
    }
}

pub fn format_offer_text(offer: &Offer, now: DateTime<Utc>) -> String {
    let mut lines = Vec::new();

    let brand = offer
        .brand
        .as_ref()
        .filter(|b| !b.name.is_empty())
        .map(|b| format!("[{}]", b.name))
        .unwrap_or_default();
    lines.push(format!("{} {}", offer.product.name, brand).trim().to_string());

    let discount = format_discount(offer.price, offer.old_price);
    let price_info = match offer.old_price {
        Some(old) if !discount.is_empty() => {
            format!("{} (was {}) {}", format_price(offer.price), format_price(old), discount)
        }
        _ => format_price(offer.price),
    };
    let unit_info = match (&offer.unit, offer.volume) {
        (Some(unit), Some(volume)) if volume != 0.0 => {
            format!(" · {}/{}", format_price(offer.reference_price), unit.short_name)
        }
        _ => String::new(),
    };
    lines.push(format!("  💰 {}{}", price_info, unit_info));

    if let Some(description) = offer.description.as_deref().filter(|d| !d.is_empty()) {
        lines.push(format!("  📦 {}", description));
    }

    lines.push(format!(
        "  🏪 {} · {}",
        offer.retailer(),
        format_validity(&offer.validity_dates, now)
    ));

    if let Some(url) = offer.external_url.as_deref().filter(|u| !u.is_empty()) {
        lines.push(format!("  🔗 {}", url));
    }

    lines.join("\n")
}

pub fn format_results_text(result: &SearchResult, query: &str, now: DateTime<Utc>) -> String {
    let mut lines = vec![format!("Found {} offers for \"{}\":\n", result.total_results, query)];

    if result.results.is_empty() {
        lines.push("No offers found.".to_string());
        return lines.join("\n");
    }

    for offer in &result.results {
        lines.push(format_offer_text(offer, now));
        lines.push(String::new());
    }

    if !result.filters.retailers.is_empty() {
        let top = result
            .filters
            .retailers
            .iter()
            .take(5)
            .map(|r| format!("{} ({})", r.name, r.results_count))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("📍 Retailers: {}", top));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    fn window(to: &str) -> Vec<ValidityDate> {
        vec![ValidityDate { from: "2024-03-01T00:00:00Z".into(), to: to.into() }]
    }

    #[test]
    fn test_format_price_and_discount() {
        assert_eq!(format_price(1.5), "€1.50");
        assert_eq!(format_discount(1.5, Some(2.0)), "-25%");
        assert_eq!(format_discount(2.0, Some(2.0)), "");
        assert_eq!(format_discount(2.0, None), "");
    }

    #[test]
    fn test_format_validity() {
        assert_eq!(format_validity(&[], now()), "");
        assert_eq!(format_validity(&window("2024-03-09T12:00:00Z"), now()), "expired");
        assert_eq!(format_validity(&window("2024-03-10T12:00:00Z"), now()), "today");
        assert_eq!(format_validity(&window("2024-03-10T20:00:00Z"), now()), "1 day left");
        assert_eq!(format_validity(&window("2024-03-13T11:00:00+01:00"), now()), "3 days left");
        assert_eq!(format_validity(&window("not a date"), now()), "");
    }

    #[test]
    fn test_parse_date_forms() {
        assert!(parse_date("2024-03-16").is_some());
        assert!(parse_date("2024-03-16T22:59:59").is_some());
        assert!(parse_date("2024-03-16T22:59:59.000Z").is_some());
    }
}
