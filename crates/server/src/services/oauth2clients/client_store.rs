//! Adapter from the client data manager to the engine's [`ClientStore`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::database::{DataError, OAuth2ClientDataManager};
use crate::oauth2::{ClientInfo, ClientStore, OAuth2Error};

pub struct ClientStoreAdapter {
    client_data_manager: Arc<dyn OAuth2ClientDataManager>,
}

impl ClientStoreAdapter {
    pub fn new(client_data_manager: Arc<dyn OAuth2ClientDataManager>) -> Self {
        Self {
            client_data_manager,
        }
    }
}

#[async_trait]
impl ClientStore for ClientStoreAdapter {
    async fn get_by_id(&self, client_id: &str) -> Result<ClientInfo, OAuth2Error> {
        match self
            .client_data_manager
            .get_oauth2_client_by_client_id(client_id)
            .await
        {
            Ok(client) => Ok(ClientInfo {
                id: client.client_id,
                secret: client.client_secret,
                domain: client.redirect_uri,
                user_id: client.belongs_to_user.to_string(),
            }),
            Err(DataError::NotFound) => Err(OAuth2Error::InvalidClient),
            Err(e) => Err(OAuth2Error::ServerError(format!(
                "querying for client: {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::mock::{MockOAuth2ClientDataManager, fake_client};

    #[tokio::test]
    async fn known_client_is_returned() {
        let store = ClientStoreAdapter::new(Arc::new(MockOAuth2ClientDataManager::with_client(
            fake_client("abc", "items"),
        )));
        let info = store.get_by_id("abc").await.unwrap();
        assert_eq!(info.id, "abc");
        assert_eq!(info.secret, "hunter2");
        assert_eq!(info.user_id, "42");
    }

    #[tokio::test]
    async fn unknown_client_is_invalid_client() {
        let store = ClientStoreAdapter::new(Arc::new(MockOAuth2ClientDataManager::default()));
        assert!(matches!(
            store.get_by_id("abc").await,
            Err(OAuth2Error::InvalidClient)
        ));
    }

    #[tokio::test]
    async fn store_failure_is_server_error() {
        let store = ClientStoreAdapter::new(Arc::new(MockOAuth2ClientDataManager::broken()));
        assert!(matches!(
            store.get_by_id("abc").await,
            Err(OAuth2Error::ServerError(_))
        ));
    }
}
