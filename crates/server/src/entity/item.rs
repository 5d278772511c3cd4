use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use todo_types::audit::FieldChangeSummary;
use todo_types::items::{Item, ItemUpdateInput};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub details: String,
    pub belongs_to_user: i32,
    pub created_on: OffsetDateTime,
    pub last_updated_on: Option<OffsetDateTime>,
    pub archived_on: Option<OffsetDateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Applies `input` and reports which fields actually changed.
    pub fn update(&mut self, input: &ItemUpdateInput) -> Vec<FieldChangeSummary> {
        let mut changes = Vec::new();

        if let Some(name) = &input.name
            && *name != self.name
        {
            changes.push(FieldChangeSummary::new("name", self.name.clone(), name.clone()));
            self.name = name.clone();
        }

        if let Some(details) = &input.details
            && *details != self.details
        {
            changes.push(FieldChangeSummary::new(
                "details",
                self.details.clone(),
                details.clone(),
            ));
            self.details = details.clone();
        }

        changes
    }
}

impl From<Model> for Item {
    fn from(item: Model) -> Self {
        Self {
            id: item.id,
            name: item.name,
            details: item.details,
            belongs_to_user: item.belongs_to_user,
            created_on: item.created_on,
            last_updated_on: item.last_updated_on,
            archived_on: item.archived_on,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_reports_only_changed_fields() {
        let mut item = Model {
            id: 1,
            name: "milk".into(),
            details: "2%".into(),
            belongs_to_user: 1,
            created_on: OffsetDateTime::now_utc(),
            last_updated_on: None,
            archived_on: None,
        };

        let changes = item.update(&ItemUpdateInput {
            name: Some("milk".into()),
            details: Some("whole".into()),
        });

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field_name, "details");
        assert_eq!(changes[0].old_value, "2%");
        assert_eq!(changes[0].new_value, "whole");
        assert_eq!(item.details, "whole");
    }
}
