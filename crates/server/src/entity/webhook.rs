use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use todo_types::audit::FieldChangeSummary;
use todo_types::webhooks::{Webhook, WebhookUpdateInput};

use super::{join_list, split_list};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "webhooks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub content_type: String,
    pub url: String,
    pub method: String,
    /// Space-separated event names
    pub events: String,
    pub data_types: String,
    pub topics: String,
    pub belongs_to_user: i32,
    pub created_on: OffsetDateTime,
    pub last_updated_on: Option<OffsetDateTime>,
    pub archived_on: Option<OffsetDateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn update_text(
    field: &str,
    current: &mut String,
    new: Option<&String>,
    changes: &mut Vec<FieldChangeSummary>,
) {
    if let Some(new) = new
        && new != current
    {
        changes.push(FieldChangeSummary::new(field, current.clone(), new.clone()));
        *current = new.clone();
    }
}

fn update_list(
    field: &str,
    current: &mut String,
    new: Option<&Vec<String>>,
    changes: &mut Vec<FieldChangeSummary>,
) {
    if let Some(new) = new {
        let joined = join_list(new);
        if joined != *current {
            changes.push(FieldChangeSummary::new(
                field,
                split_list(current),
                split_list(&joined),
            ));
            *current = joined;
        }
    }
}

impl Model {
    /// Applies `input` and reports which fields actually changed.
    pub fn update(&mut self, input: &WebhookUpdateInput) -> Vec<FieldChangeSummary> {
        let mut changes = Vec::new();
        update_text("name", &mut self.name, input.name.as_ref(), &mut changes);
        update_text(
            "content_type",
            &mut self.content_type,
            input.content_type.as_ref(),
            &mut changes,
        );
        update_text("url", &mut self.url, input.url.as_ref(), &mut changes);
        update_text("method", &mut self.method, input.method.as_ref(), &mut changes);
        update_list("events", &mut self.events, input.events.as_ref(), &mut changes);
        update_list(
            "data_types",
            &mut self.data_types,
            input.data_types.as_ref(),
            &mut changes,
        );
        update_list("topics", &mut self.topics, input.topics.as_ref(), &mut changes);
        changes
    }
}

impl From<Model> for Webhook {
    fn from(webhook: Model) -> Self {
        Self {
            id: webhook.id,
            events: split_list(&webhook.events),
            data_types: split_list(&webhook.data_types),
            topics: split_list(&webhook.topics),
            name: webhook.name,
            content_type: webhook.content_type,
            url: webhook.url,
            method: webhook.method,
            belongs_to_user: webhook.belongs_to_user,
            created_on: webhook.created_on,
            last_updated_on: webhook.last_updated_on,
            archived_on: webhook.archived_on,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_fields_compare_after_normalising() {
        let mut webhook = Model {
            id: 1,
            name: "deploys".into(),
            content_type: "application/json".into(),
            url: "https://hooks.example.com".into(),
            method: "POST".into(),
            events: "item_created item_archived".into(),
            data_types: String::new(),
            topics: String::new(),
            belongs_to_user: 1,
            created_on: OffsetDateTime::now_utc(),
            last_updated_on: None,
            archived_on: None,
        };

        let unchanged = webhook.update(&WebhookUpdateInput {
            events: Some(vec!["item_created".into(), " item_archived ".into()]),
            ..Default::default()
        });
        assert!(unchanged.is_empty());

        let changed = webhook.update(&WebhookUpdateInput {
            method: Some("PUT".into()),
            topics: Some(vec!["groceries".into()]),
            ..Default::default()
        });
        let fields: Vec<_> = changed.iter().map(|c| c.field_name.as_str()).collect();
        assert_eq!(fields, ["method", "topics"]);
        assert_eq!(webhook.topics, "groceries");
    }
}
