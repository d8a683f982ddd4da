//! Command router: turns inbound command payloads into service calls.
//!
//! Payloads are shape-checked here (serde + `validator`) and ids are coerced
//! from their wire form; everything else is delegated to [`ProductService`].

use async_trait::async_trait;
use messaging::{CommandHandler, RpcError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumIter, EnumString, VariantNames};
use tracing::{debug, instrument};
use validator::Validate;

use crate::error::{ProductError, ProductResult};
use crate::models::{CreateProduct, PaginationDto, UpdateProduct};
use crate::repository::ProductRepository;
use crate::service::ProductService;

/// Commands answered by the products service
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter, AsRefStr, VariantNames,
)]
#[strum(serialize_all = "snake_case")]
pub enum ProductCommand {
    CreateProduct,
    FindAllProducts,
    FindOneProduct,
    UpdateProduct,
    DeleteProduct,
    ValidateProducts,
}

/// Wire names of every [`ProductCommand`]
pub const PRODUCT_COMMANDS: &[&str] = ProductCommand::VARIANTS;

const NUMERIC_ID_EXPECTED: &str = "Validation failed (numeric string is expected)";

pub struct ProductHandler<R: ProductRepository> {
    service: ProductService<R>,
}

impl<R: ProductRepository> ProductHandler<R> {
    pub fn new(service: ProductService<R>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &ProductService<R> {
        &self.service
    }

    /// Run one command and encode its result
    #[instrument(skip(self, data), fields(command = %command))]
    pub async fn dispatch(&self, command: ProductCommand, data: Value) -> ProductResult<Value> {
        debug!("Dispatching command");

        match command {
            ProductCommand::CreateProduct => {
                let input: CreateProduct = parse_payload(data)?;
                encode(&self.service.create(input).await?)
            }
            ProductCommand::FindAllProducts => {
                let pagination: PaginationDto = if data.is_null() {
                    PaginationDto::default()
                } else {
                    parse_payload(data)?
                };
                encode(&self.service.list(pagination).await?)
            }
            ProductCommand::FindOneProduct => {
                let id = parse_id(data.get("id"))?;
                encode(&self.service.find_one(id).await?)
            }
            ProductCommand::UpdateProduct => {
                let mut fields = into_object(data)?;
                let id = parse_id(fields.remove("id").as_ref())?;
                let input: UpdateProduct = parse_payload(Value::Object(fields))?;
                encode(&self.service.update(id, input).await?)
            }
            ProductCommand::DeleteProduct => {
                let id = parse_id(data.get("id"))?;
                encode(&self.service.remove(id).await?)
            }
            ProductCommand::ValidateProducts => {
                let ids = parse_ids(data)?;
                encode(&self.service.validate_ids(ids).await?)
            }
        }
    }
}

#[async_trait]
impl<R: ProductRepository + 'static> CommandHandler for ProductHandler<R> {
    fn commands(&self) -> &'static [&'static str] {
        PRODUCT_COMMANDS
    }

    async fn handle(&self, command: &str, data: Value) -> Result<Value, RpcError> {
        let command = ProductCommand::from_str(command).map_err(|_| RpcError::no_handler())?;
        self.dispatch(command, data).await.map_err(RpcError::from)
    }
}

/// Deserialize and validate a payload
fn parse_payload<T: DeserializeOwned + Validate>(data: Value) -> ProductResult<T> {
    let payload: T = serde_json::from_value(data)
        .map_err(|e| ProductError::InvalidArgument(format!("Invalid payload: {e}")))?;
    payload.validate()?;
    Ok(payload)
}

fn into_object(data: Value) -> ProductResult<Map<String, Value>> {
    match data {
        Value::Object(map) => Ok(map),
        _ => Err(ProductError::InvalidArgument(
            "Invalid payload: expected an object".to_string(),
        )),
    }
}

/// Coerce a wire id (`7` or `"7"`) to an integer
pub fn parse_id(value: Option<&Value>) -> ProductResult<i32> {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        Some(Value::String(s)) if is_integer_literal(s) => s.parse::<i32>().ok(),
        _ => None,
    };

    parsed.ok_or_else(|| ProductError::InvalidArgument(NUMERIC_ID_EXPECTED.to_string()))
}

fn is_integer_literal(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn parse_ids(data: Value) -> ProductResult<Vec<i32>> {
    match data {
        Value::Array(items) => items.iter().map(|item| parse_id(Some(item))).collect(),
        _ => Err(ProductError::InvalidArgument(
            "Invalid payload: expected an array of product ids".to_string(),
        )),
    }
}

fn encode<T: Serialize>(value: &T) -> ProductResult<Value> {
    serde_json::to_value(value).map_err(|e| ProductError::Persistence(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use strum::IntoEnumIterator;

    #[test]
    fn test_command_names_match_enum() {
        let names: Vec<String> = ProductCommand::iter().map(|c| c.to_string()).collect();
        assert_eq!(names, PRODUCT_COMMANDS);
        assert_eq!(PRODUCT_COMMANDS.len(), 6);
        assert!(PRODUCT_COMMANDS.contains(&"validate_products"));
        assert_eq!(
            ProductCommand::from_str("find_one_product").unwrap(),
            ProductCommand::FindOneProduct
        );
        assert!(ProductCommand::from_str("findOneProduct").is_err());
    }

    #[test]
    fn test_parse_id_accepts_integers_and_numeric_strings() {
        assert_eq!(parse_id(Some(&json!(7))).unwrap(), 7);
        assert_eq!(parse_id(Some(&json!("42"))).unwrap(), 42);
        assert_eq!(parse_id(Some(&json!("-3"))).unwrap(), -3);
    }

    #[test]
    fn test_parse_id_rejects_everything_else() {
        for bad in [
            json!("abc"),
            json!("1.5"),
            json!(" 1"),
            json!(""),
            json!(1.5),
            json!(null),
            json!(true),
            json!(i64::from(i32::MAX) + 1),
            json!("99999999999"),
        ] {
            let err = parse_id(Some(&bad)).unwrap_err();
            assert_eq!(err.to_string(), NUMERIC_ID_EXPECTED, "input: {bad}");
        }
        assert!(parse_id(None).is_err());
    }

    #[test]
    fn test_parse_ids() {
        assert_eq!(parse_ids(json!([1, "2", 3])).unwrap(), vec![1, 2, 3]);
        assert!(parse_ids(json!({ "ids": [1] })).is_err());
        assert!(parse_ids(json!([1, "x"])).is_err());
    }
}
