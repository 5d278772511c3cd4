use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use todo_types::accounts::{Account, AccountUpdateInput};
use todo_types::audit::FieldChangeSummary;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub plan_id: Option<i32>,
    pub belongs_to_user: i32,
    pub created_on: OffsetDateTime,
    pub last_updated_on: Option<OffsetDateTime>,
    pub archived_on: Option<OffsetDateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn update(&mut self, input: &AccountUpdateInput) -> Vec<FieldChangeSummary> {
        let mut changes = Vec::new();

        if let Some(name) = &input.name
            && *name != self.name
        {
            changes.push(FieldChangeSummary::new("name", self.name.clone(), name.clone()));
            self.name = name.clone();
        }

        if input.plan_id.is_some() && input.plan_id != self.plan_id {
            changes.push(FieldChangeSummary::new("plan_id", self.plan_id, input.plan_id));
            self.plan_id = input.plan_id;
        }

        changes
    }
}

impl From<Model> for Account {
    fn from(account: Model) -> Self {
        Self {
            id: account.id,
            name: account.name,
            plan_id: account.plan_id,
            belongs_to_user: account.belongs_to_user,
            created_on: account.created_on,
            last_updated_on: account.last_updated_on,
            archived_on: account.archived_on,
        }
    }
}
