use super::payload::{ScalarId, SellerRecord, WebhookRequest};
use super::query::TemplateQuery;
use crate::graph::GraphState;
use serde_json::Value;

#[derive(Debug, Clone, Default)]
pub struct WorkflowState {
    /// Raw trigger body as received
    pub webhook_body: Value,
    /// Typed view of `webhook_body`, filled in by the trigger step
    pub request: WebhookRequest,
    pub sql_query: Option<TemplateQuery>,
    pub is_test_message: bool,
    pub email_template_round_version_id: Option<ScalarId>,
    pub template_version_data: Option<Value>,
    pub sales_brain_data: Option<Value>,
    pub seller_info: Option<SellerRecord>,
    pub prompt: Option<String>,
    pub template_structure: Option<Value>,
    pub preview_result: Option<Value>,
    pub final_result: Option<Value>,
    pub error: Option<String>,
    pub current_step: String,
}

impl WorkflowState {
    pub fn new(webhook_body: Value) -> Self {
        Self {
            webhook_body,
            ..Default::default()
        }
    }

    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Fields written by one step. Every present field overwrites.
#[derive(Debug, Clone, Default)]
pub struct WorkflowUpdate {
    pub request: Option<WebhookRequest>,
    pub sql_query: Option<TemplateQuery>,
    pub is_test_message: Option<bool>,
    pub email_template_round_version_id: Option<ScalarId>,
    pub template_version_data: Option<Value>,
    pub sales_brain_data: Option<Value>,
    pub seller_info: Option<SellerRecord>,
    pub prompt: Option<String>,
    pub template_structure: Option<Value>,
    pub preview_result: Option<Value>,
    pub final_result: Option<Value>,
    pub error: Option<String>,
    pub current_step: Option<String>,
}

impl WorkflowUpdate {
    pub fn at(step: &str) -> Self {
        Self {
            current_step: Some(step.to_string()),
            ..Default::default()
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

impl GraphState for WorkflowState {
    type Update = WorkflowUpdate;

    fn apply(&mut self, update: WorkflowUpdate) {
        if let Some(request) = update.request {
            self.request = request;
        }
        if let Some(is_test) = update.is_test_message {
            self.is_test_message = is_test;
        }
        if let Some(step) = update.current_step {
            self.current_step = step;
        }
        if update.sql_query.is_some() {
            self.sql_query = update.sql_query;
        }
        if update.email_template_round_version_id.is_some() {
            self.email_template_round_version_id = update.email_template_round_version_id;
        }
        if update.template_version_data.is_some() {
            self.template_version_data = update.template_version_data;
        }
        if update.sales_brain_data.is_some() {
            self.sales_brain_data = update.sales_brain_data;
        }
        if update.seller_info.is_some() {
            self.seller_info = update.seller_info;
        }
        if update.prompt.is_some() {
            self.prompt = update.prompt;
        }
        if update.template_structure.is_some() {
            self.template_structure = update.template_structure;
        }
        if update.preview_result.is_some() {
            self.preview_result = update.preview_result;
        }
        if update.final_result.is_some() {
            self.final_result = update.final_result;
        }
        if update.error.is_some() {
            self.error = update.error;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_apply_overwrites_present_fields_only() {
        let mut state = WorkflowState::new(json!({"body": {}}));
        state.prompt = Some("old".into());

        let mut update = WorkflowUpdate::at("build_prompt");
        update.template_structure = Some(json!({"template_structure": []}));
        state.apply(update);

        assert_eq!(state.current_step, "build_prompt");
        assert_eq!(state.prompt.as_deref(), Some("old"));
        assert_eq!(state.template_structure, Some(json!({"template_structure": []})));
        assert!(!state.failed());

        state.apply(WorkflowUpdate::at("run_query").with_error("boom"));
        assert!(state.failed());
        assert_eq!(state.error.as_deref(), Some("boom"));
    }
}
