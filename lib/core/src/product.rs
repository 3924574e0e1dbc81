use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Catalog identifier of a product
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductId {
    Integer(u64),
    String(String),
}

impl ProductId {
    /// Parse user input, preferring the integer form when it fits.
    pub fn parse(s: &str) -> Self {
        s.parse::<u64>()
            .map(ProductId::Integer)
            .unwrap_or_else(|_| ProductId::String(s.to_string()))
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductId::Integer(i) => write!(f, "{}", i),
            ProductId::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<u64> for ProductId {
    fn from(i: u64) -> Self {
        ProductId::Integer(i)
    }
}

impl From<String> for ProductId {
    fn from(s: String) -> Self {
        ProductId::String(s)
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        ProductId::String(s.to_string())
    }
}

/// A catalog product as handed to the engine.
///
/// Owned by the catalog; the engine only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Structured features in catalog order
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub features: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

impl ProductRecord {
    #[must_use]
    pub fn new(id: impl Into<ProductId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            brand: None,
            category: None,
            subcategory: None,
            description: None,
            features: Map::new(),
            price: None,
            rating: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn with_subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = Some(subcategory.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_feature(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.features.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    #[must_use]
    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    /// The reduced projection stored next to this record's vector.
    #[must_use]
    pub fn metadata(&self) -> MetadataEntry {
        MetadataEntry {
            id: self.id.clone(),
            name: self.name.clone(),
            brand: self.brand.clone(),
            category: self.category.clone(),
            price: self.price,
            rating: self.rating,
        }
    }
}

/// What a similarity query returns for each hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub id: ProductId,
    pub name: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub rating: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_catalog_row() {
        let record: ProductRecord = serde_json::from_value(json!({
            "id": 1,
            "name": "Moisturizing Face Cream",
            "brand": "CeraVe",
            "category": "skincare",
            "price": 15.99,
            "features": {"size": "50ml", "spf": 30}
        }))
        .unwrap();

        assert_eq!(record.id, ProductId::Integer(1));
        assert_eq!(record.brand.as_deref(), Some("CeraVe"));
        assert!(record.subcategory.is_none());
        let keys: Vec<&String> = record.features.keys().collect();
        assert_eq!(keys, vec!["size", "spf"]);
    }

    #[test]
    fn test_string_ids() {
        let record: ProductRecord = serde_json::from_value(json!({"id": "sku-9"})).unwrap();
        assert_eq!(record.id, ProductId::from("sku-9"));
        assert_eq!(record.id.to_string(), "sku-9");
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(ProductId::parse("42"), ProductId::Integer(42));
        assert_eq!(ProductId::parse("B00X"), ProductId::String("B00X".into()));
    }

    #[test]
    fn test_metadata_projection() {
        let record = ProductRecord::new(7u64)
            .with_name("Hydrating Serum")
            .with_brand("The Ordinary")
            .with_category("skincare")
            .with_description("Hyaluronic acid serum")
            .with_price(12.9)
            .with_rating(4.3);

        let meta = record.metadata();
        assert_eq!(meta.id, ProductId::Integer(7));
        assert_eq!(meta.name.as_deref(), Some("Hydrating Serum"));
        assert_eq!(meta.price, Some(12.9));
        assert_eq!(meta.rating, Some(4.3));
    }
}
