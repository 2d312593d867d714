pub mod offers;

pub use offers::{
    format_discount, format_offer_text, format_price, format_results_text, format_validity,
    simplify_offer, SimpleOffer, SimpleSearchResult,
};
