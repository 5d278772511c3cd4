//! Plans are readable by every user; only admins change them.

use todo_types::QueryFilter;
use todo_types::audit::AuditLogEntry;
use todo_types::plans::{Plan, PlanCreationInput, PlanList, PlanUpdateInput};

use crate::{Client, ClientError};

const PLANS: &str = "/api/v1/plans";

impl Client {
    pub fn build_list_plans_request(
        &self,
        filter: &QueryFilter,
    ) -> Result<reqwest::Request, ClientError> {
        self.list_request(PLANS, filter)
    }

    pub async fn list_plans(&self, filter: &QueryFilter) -> Result<PlanList, ClientError> {
        self.execute_json(self.build_list_plans_request(filter)?)
            .await
    }

    pub fn build_create_plan_request(
        &self,
        input: &PlanCreationInput,
    ) -> Result<reqwest::Request, ClientError> {
        self.create_request(PLANS, input)
    }

    /// Admin only.
    pub async fn create_plan(&self, input: &PlanCreationInput) -> Result<Plan, ClientError> {
        self.execute_json(self.build_create_plan_request(input)?)
            .await
    }

    pub fn build_get_plan_request(&self, id: i32) -> Result<reqwest::Request, ClientError> {
        self.read_request(PLANS, id)
    }

    pub async fn get_plan(&self, id: i32) -> Result<Plan, ClientError> {
        self.execute_json(self.build_get_plan_request(id)?).await
    }

    pub fn build_update_plan_request(
        &self,
        id: i32,
        input: &PlanUpdateInput,
    ) -> Result<reqwest::Request, ClientError> {
        self.update_request(PLANS, id, input)
    }

    /// Admin only.
    pub async fn update_plan(
        &self,
        id: i32,
        input: &PlanUpdateInput,
    ) -> Result<Plan, ClientError> {
        self.execute_json(self.build_update_plan_request(id, input)?)
            .await
    }

    pub fn build_archive_plan_request(&self, id: i32) -> Result<reqwest::Request, ClientError> {
        self.archive_request(PLANS, id)
    }

    /// Admin only.
    pub async fn archive_plan(&self, id: i32) -> Result<(), ClientError> {
        self.execute_empty(self.build_archive_plan_request(id)?)
            .await
    }

    pub fn build_get_audit_log_for_plan_request(
        &self,
        id: i32,
    ) -> Result<reqwest::Request, ClientError> {
        self.audit_request(PLANS, id)
    }

    /// Admin only.
    pub async fn get_audit_log_for_plan(
        &self,
        id: i32,
    ) -> Result<Vec<AuditLogEntry>, ClientError> {
        self.execute_json(self.build_get_audit_log_for_plan_request(id)?)
            .await
    }
}
