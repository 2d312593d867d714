use serde::{Deserialize, Deserializer, Serialize};

/// Missing and `null` both decode to the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_results: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<Offer>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub filters: Filters,
}

impl SearchResult {
    /// Client-side retailer filter (case-insensitive substring of any advertiser
    /// name) followed by truncation to `limit`. Filtering replaces the total
    /// with the number of offers kept.
    pub fn narrow(&mut self, retailer: Option<&str>, limit: usize) {
        if let Some(retailer) = retailer {
            let needle = retailer.to_lowercase();
            self.results.retain(|offer| {
                offer.advertisers.iter().any(|a| a.name.to_lowercase().contains(&needle))
            });
            self.results.truncate(limit);
            self.total_results = self.results.len() as u64;
        } else {
            self.results.truncate(limit);
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Filters {
    #[serde(default, deserialize_with = "null_as_default")]
    pub retailers: Vec<FilterBucket>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub brands: Vec<FilterBucket>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub categories: Vec<FilterBucket>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterBucket {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub results_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub price: f64,
    pub old_price: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub external_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub product: Product,
    pub brand: Option<Brand>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub advertisers: Vec<Advertiser>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub validity_dates: Vec<ValidityDate>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reference_price: f64,
    pub unit: Option<Unit>,
    pub volume: Option<f64>,
    pub quantity: Option<f64>,
}

impl Offer {
    pub fn retailer(&self) -> &str {
        self.advertisers.first().map(|a| a.name.as_str()).unwrap_or("Unknown")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brand {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Advertiser {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidityDate {
    #[serde(default, deserialize_with = "null_as_default")]
    pub from: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    #[serde(default, deserialize_with = "null_as_default")]
    pub short_name: String,
}
