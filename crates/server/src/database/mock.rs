//! In-memory OAuth2 client store for unit tests of the callbacks.

use std::sync::Mutex;

use async_trait::async_trait;
use sea_orm::DbErr;
use time::OffsetDateTime;
use todo_types::QueryFilter;

use super::{DataError, ListPage, NewOAuth2Client, OAuth2ClientDataManager};
use crate::entity::{audit_log_entry, join_list, oauth2_client};

#[derive(Default)]
pub struct MockOAuth2ClientDataManager {
    pub clients: Mutex<Vec<oauth2_client::Model>>,
    /// Every call fails with a database error
    pub broken: bool,
}

impl MockOAuth2ClientDataManager {
    pub fn with_client(client: oauth2_client::Model) -> Self {
        Self {
            clients: Mutex::new(vec![client]),
            broken: false,
        }
    }

    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Default::default()
        }
    }

    fn check(&self) -> Result<(), DataError> {
        if self.broken {
            return Err(DataError::Database(DbErr::Custom("blew up".into())));
        }
        Ok(())
    }

    fn find(
        &self,
        pred: impl Fn(&oauth2_client::Model) -> bool,
    ) -> Result<oauth2_client::Model, DataError> {
        self.check()?;
        self.clients
            .lock()
            .unwrap()
            .iter()
            .find(|c| pred(c))
            .cloned()
            .ok_or(DataError::NotFound)
    }
}

pub fn fake_client(client_id: &str, scopes: &str) -> oauth2_client::Model {
    oauth2_client::Model {
        id: 1,
        name: "fake".into(),
        client_id: client_id.into(),
        client_secret: "hunter2".into(),
        redirect_uri: "https://app.example.com/callback".into(),
        scopes: scopes.into(),
        implicit_allowed: false,
        belongs_to_user: 42,
        created_on: OffsetDateTime::now_utc(),
        last_updated_on: None,
        archived_on: None,
    }
}

#[async_trait]
impl OAuth2ClientDataManager for MockOAuth2ClientDataManager {
    async fn get_oauth2_client(
        &self,
        id: i32,
        user_id: i32,
    ) -> Result<oauth2_client::Model, DataError> {
        self.find(|c| c.id == id && c.belongs_to_user == user_id)
    }

    async fn get_oauth2_client_by_client_id(
        &self,
        client_id: &str,
    ) -> Result<oauth2_client::Model, DataError> {
        self.find(|c| c.client_id == client_id)
    }

    async fn get_oauth2_clients(
        &self,
        user_id: i32,
        filter: &QueryFilter,
    ) -> Result<ListPage<oauth2_client::Model>, DataError> {
        self.check()?;
        let items: Vec<_> = self
            .clients
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.belongs_to_user == user_id)
            .cloned()
            .collect();
        Ok(ListPage {
            total_count: items.len() as u64,
            items,
            page: filter.page(),
            limit: filter.limit(),
        })
    }

    async fn create_oauth2_client(
        &self,
        input: NewOAuth2Client,
    ) -> Result<oauth2_client::Model, DataError> {
        self.check()?;
        let mut clients = self.clients.lock().unwrap();
        let client = oauth2_client::Model {
            id: clients.len() as i32 + 1,
            name: input.name,
            client_id: input.client_id,
            client_secret: input.client_secret,
            redirect_uri: input.redirect_uri,
            scopes: join_list(&input.scopes),
            implicit_allowed: input.implicit_allowed,
            belongs_to_user: input.belongs_to_user,
            created_on: OffsetDateTime::now_utc(),
            last_updated_on: None,
            archived_on: None,
        };
        clients.push(client.clone());
        Ok(client)
    }

    async fn archive_oauth2_client(&self, id: i32, user_id: i32) -> Result<(), DataError> {
        self.check()?;
        let mut clients = self.clients.lock().unwrap();
        let before = clients.len();
        clients.retain(|c| !(c.id == id && c.belongs_to_user == user_id));
        if clients.len() == before {
            return Err(DataError::NotFound);
        }
        Ok(())
    }

    async fn get_audit_log_entries_for_oauth2_client(
        &self,
        _id: i32,
    ) -> Result<Vec<audit_log_entry::Model>, DataError> {
        self.check()?;
        Err(DataError::NotFound)
    }
}
