use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::{NotSet, Set};

/// Sea-ORM Entity for the products table
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    #[sea_orm(column_type = "Double")]
    pub price: f64,
    pub available: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for crate::models::Product {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            price: model.price,
            available: model.available,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

// id is left to the serial sequence
impl From<crate::models::CreateProduct> for ActiveModel {
    fn from(input: crate::models::CreateProduct) -> Self {
        let now = chrono::Utc::now();

        ActiveModel {
            id: NotSet,
            name: Set(input.name),
            price: Set(input.price),
            available: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
    }
}
