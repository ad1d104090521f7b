use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A catalog item available for purchase. Created by the seed tool,
/// read-only on the order path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub category: String,
    pub image: Image,
}

/// Responsive image URLs for a product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub thumbnail: String,
    pub mobile: String,
    pub tablet: String,
    pub desktop: String,
}
