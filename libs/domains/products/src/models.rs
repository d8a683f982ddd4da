use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

/// Product record as returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub price: f64,
    /// `false` once the product has been removed
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload of `create_product`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CreateProduct {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(range(min = 0.0))]
    #[serde(deserialize_with = "number_from_json")]
    pub price: f64,
}

/// Payload of `update_product`, minus the `id` the router splits off.
///
/// Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct UpdateProduct {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(range(min = 0.0))]
    #[serde(default, deserialize_with = "optional_number_from_json")]
    pub price: Option<f64>,
}

impl UpdateProduct {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.price.is_none()
    }
}

/// Payload of `find_all_products`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PaginationDto {
    #[validate(range(min = 1))]
    #[serde(default = "default_page", deserialize_with = "number_from_json")]
    pub page: u64,
    #[validate(range(min = 1))]
    #[serde(default = "default_limit", deserialize_with = "number_from_json")]
    pub limit: u64,
}

impl PaginationDto {
    pub fn new(page: u64, limit: u64) -> Self {
        Self { page, limit }
    }

    /// Rows to skip before this page
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

impl Default for PaginationDto {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    10
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total_products: u64,
    pub page: u64,
    pub last_page: u64,
}

/// Reply of `find_all_products`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedProducts {
    pub products: Vec<Product>,
    pub meta: PageMeta,
}

/// Accepts `12`, `12.5` or `"12.5"`, the way gateways forward query strings
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString<T> {
    Number(T),
    String(String),
}

fn number_from_json<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + std::str::FromStr + FiniteNumber,
{
    let value = match NumberOrString::<T>::deserialize(deserializer)? {
        NumberOrString::Number(n) => n,
        NumberOrString::String(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("expected a number, got {s:?}")))?,
    };

    if !value.is_finite() {
        return Err(serde::de::Error::custom("expected a finite number"));
    }
    Ok(value)
}

fn optional_number_from_json<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "number_from_json")] f64);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|Wrapper(n)| n))
}

trait FiniteNumber {
    fn is_finite(&self) -> bool;
}

impl FiniteNumber for f64 {
    fn is_finite(&self) -> bool {
        f64::is_finite(*self)
    }
}

impl FiniteNumber for u64 {
    fn is_finite(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_product_serializes_camel_case() {
        let now = Utc::now();
        let product = Product {
            id: 1,
            name: "Mouse".to_string(),
            price: 19.99,
            available: true,
            created_at: now,
            updated_at: now,
        };

        let value = serde_json::to_value(&product).unwrap();
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_some());
        assert!(value.get("created_at").is_none());
        assert_eq!(value["available"], true);
    }

    #[test]
    fn test_create_product_accepts_numeric_string_price() {
        let input: CreateProduct =
            serde_json::from_value(json!({ "name": "Desk", "price": "149.5" })).unwrap();
        assert_eq!(input.price, 149.5);
    }

    #[test]
    fn test_create_product_rejects_garbage_price() {
        let result: Result<CreateProduct, _> =
            serde_json::from_value(json!({ "name": "Desk", "price": "cheap" }));
        assert!(result.is_err());

        let result: Result<CreateProduct, _> =
            serde_json::from_value(json!({ "name": "Desk", "price": "inf" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_create_product_validation() {
        let valid = CreateProduct {
            name: "Lamp".to_string(),
            price: 0.0,
        };
        assert!(valid.validate().is_ok());

        let empty_name = CreateProduct {
            name: String::new(),
            price: 1.0,
        };
        assert!(empty_name.validate().is_err());

        let negative = CreateProduct {
            name: "Lamp".to_string(),
            price: -0.01,
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_update_product_ignores_unknown_fields() {
        let update: UpdateProduct =
            serde_json::from_value(json!({ "price": 50, "color": "red" })).unwrap();
        assert_eq!(update.price, Some(50.0));
        assert!(update.name.is_none());
        assert!(!update.is_empty());
    }

    #[test]
    fn test_update_product_null_price_means_unchanged() {
        let update: UpdateProduct = serde_json::from_value(json!({ "price": null })).unwrap();
        assert!(update.is_empty());
    }

    #[test]
    fn test_pagination_defaults_and_coercion() {
        let defaults: PaginationDto = serde_json::from_value(json!({})).unwrap();
        assert_eq!(defaults, PaginationDto::new(1, 10));

        let coerced: PaginationDto =
            serde_json::from_value(json!({ "page": "3", "limit": 5 })).unwrap();
        assert_eq!(coerced, PaginationDto::new(3, 5));
        assert_eq!(coerced.offset(), 10);
    }

    #[test]
    fn test_pagination_validation() {
        assert!(PaginationDto::new(0, 10).validate().is_err());
        assert!(PaginationDto::new(1, 0).validate().is_err());
        assert!(PaginationDto::new(1, 1).validate().is_ok());
    }

    #[test]
    fn test_pagination_rejects_negative_page() {
        let result: Result<PaginationDto, _> = serde_json::from_value(json!({ "page": -1 }));
        assert!(result.is_err());
    }

    #[test]
    fn test_page_meta_wire_names() {
        let meta = PageMeta {
            total_products: 2,
            page: 1,
            last_page: 2,
        };
        assert_eq!(
            serde_json::to_value(meta).unwrap(),
            json!({ "totalProducts": 2, "page": 1, "lastPage": 2 })
        );
    }
}
