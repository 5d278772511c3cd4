use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use todo_types::api_clients::ApiClient;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "api_clients")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub client_id: String,
    #[serde(skip_serializing)]
    pub secret_key: String,
    pub belongs_to_user: i32,
    pub created_on: OffsetDateTime,
    pub last_updated_on: Option<OffsetDateTime>,
    pub archived_on: Option<OffsetDateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for ApiClient {
    fn from(client: Model) -> Self {
        Self {
            id: client.id,
            name: client.name,
            client_id: client.client_id,
            belongs_to_user: client.belongs_to_user,
            created_on: client.created_on,
            last_updated_on: client.last_updated_on,
            archived_on: client.archived_on,
        }
    }
}
