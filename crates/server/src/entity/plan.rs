use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use todo_types::audit::FieldChangeSummary;
use todo_types::plans::{Plan, PlanUpdateInput};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "plans")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub description: String,
    /// Price in cents
    pub price: i32,
    pub period: String,
    pub created_on: OffsetDateTime,
    pub last_updated_on: Option<OffsetDateTime>,
    pub archived_on: Option<OffsetDateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn update(&mut self, input: &PlanUpdateInput) -> Vec<FieldChangeSummary> {
        let mut changes = Vec::new();

        if let Some(name) = &input.name
            && *name != self.name
        {
            changes.push(FieldChangeSummary::new("name", self.name.clone(), name.clone()));
            self.name = name.clone();
        }
        if let Some(description) = &input.description
            && *description != self.description
        {
            changes.push(FieldChangeSummary::new(
                "description",
                self.description.clone(),
                description.clone(),
            ));
            self.description = description.clone();
        }
        if let Some(price) = input.price
            && price != self.price
        {
            changes.push(FieldChangeSummary::new("price", self.price, price));
            self.price = price;
        }
        if let Some(period) = &input.period
            && *period != self.period
        {
            changes.push(FieldChangeSummary::new(
                "period",
                self.period.clone(),
                period.clone(),
            ));
            self.period = period.clone();
        }

        changes
    }
}

impl From<Model> for Plan {
    fn from(plan: Model) -> Self {
        Self {
            id: plan.id,
            name: plan.name,
            description: plan.description,
            price: plan.price,
            period: plan.period,
            created_on: plan.created_on,
            last_updated_on: plan.last_updated_on,
            archived_on: plan.archived_on,
        }
    }
}
