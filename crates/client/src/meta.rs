use reqwest::Method;

use crate::{Client, ClientError};

impl Client {
    pub fn build_liveness_request(&self) -> Result<reqwest::Request, ClientError> {
        Ok(self.request(Method::GET, "/_meta_/live")?.build()?)
    }

    pub async fn liveness(&self) -> Result<(), ClientError> {
        self.execute_empty(self.build_liveness_request()?).await
    }

    pub fn build_readiness_request(&self) -> Result<reqwest::Request, ClientError> {
        Ok(self.request(Method::GET, "/_meta_/ready")?.build()?)
    }

    /// `UnexpectedStatus(503)` while the database is unreachable.
    pub async fn readiness(&self) -> Result<(), ClientError> {
        self.execute_empty(self.build_readiness_request()?).await
    }
}
