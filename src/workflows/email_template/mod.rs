//! Webhook-triggered email template pipeline.
//!
//! trigger → build query (test or live) → run query → fetch sales brain →
//! seller info → build prompt → generate template → preview → return
//! result → stop. Each I/O step records its failure in
//! [`WorkflowState::error`]; as soon as an error is present the graph jumps
//! to `stop`.

mod backend;
mod payload;
mod prompt;
mod query;
mod state;
mod store;

pub use backend::{preview_body, BackendClient};
pub use payload::{
    demo_webhook, MessageGenerateReq, ScalarId, SellerBaseInfo, SellerInfo, SellerRecord,
    TemplatePayload, TriggerOptions, UserPayload, WebhookBody, WebhookRequest,
};
pub use prompt::{market_info, template_designer_prompt};
pub use query::{live_query, test_mode_query, TemplateQuery};
pub use state::{WorkflowState, WorkflowUpdate};
pub use store::{InMemoryTemplateStore, MySqlTemplateStore, TemplateStore};

use crate::config::Settings;
use crate::error::Result;
use crate::events::{EventBus, OrchestrationEvent};
use crate::extract::extract_json;
use crate::graph::{CompiledGraph, StateGraph, END};
use crate::provider::{GenerateOptions, LlmProvider, Message};
use serde_json::{json, Value};
use std::sync::Arc;

pub const TRIGGER: &str = "trigger";
pub const BUILD_TEST_QUERY: &str = "build_test_query";
pub const BUILD_LIVE_QUERY: &str = "build_live_query";
pub const RUN_QUERY: &str = "run_query";
pub const FETCH_SALES_BRAIN: &str = "fetch_sales_brain";
pub const SELLER_INFO: &str = "seller_info";
pub const BUILD_PROMPT: &str = "build_prompt";
pub const GENERATE_TEMPLATE: &str = "generate_template";
pub const PREVIEW_TEMPLATE: &str = "preview_template";
pub const RETURN_RESULT: &str = "return_result";
pub const STOP: &str = "stop";

const RUN_NAME: &str = "email_template";

/// Route after the trigger: `stop` on error, otherwise by test mode.
pub fn route_trigger(state: &WorkflowState) -> String {
    let next = if state.failed() {
        STOP
    } else if state.is_test_message {
        BUILD_TEST_QUERY
    } else {
        BUILD_LIVE_QUERY
    };
    next.to_string()
}

/// Continue to `next` unless an error has been recorded.
fn continue_to(next: &'static str) -> impl Fn(&WorkflowState) -> String + Send + Sync + 'static {
    move |state: &WorkflowState| {
        let target = if state.failed() { STOP } else { next };
        target.to_string()
    }
}

struct Steps {
    provider: Arc<dyn LlmProvider>,
    options: GenerateOptions,
    store: Arc<dyn TemplateStore>,
    backend: BackendClient,
}

async fn trigger(state: WorkflowState) -> Result<WorkflowUpdate> {
    tracing::info!(
        body = %serde_json::to_string_pretty(&state.webhook_body).unwrap_or_default(),
        "received webhook request"
    );

    let update = WorkflowUpdate::at(TRIGGER);
    match serde_json::from_value::<WebhookRequest>(state.webhook_body.clone()) {
        Ok(request) => Ok(WorkflowUpdate {
            is_test_message: Some(request.body.options.test_message),
            request: Some(request),
            ..update
        }),
        Err(e) => Ok(update.with_error(format!("Invalid webhook body: {}", e))),
    }
}

async fn build_test_query(state: WorkflowState) -> Result<WorkflowUpdate> {
    let payload = &state.request.body.payload;
    let update = WorkflowUpdate {
        email_template_round_version_id: payload.email_template_round_version_id.clone(),
        ..WorkflowUpdate::at(BUILD_TEST_QUERY)
    };

    Ok(match test_mode_query(payload) {
        Some(query) => {
            tracing::info!(sql = %query.sql, params = ?query.params, "built test-mode query");
            WorkflowUpdate {
                sql_query: Some(query),
                ..update
            }
        }
        None => update.with_error("emailTemplateRoundVersionId is required for test messages"),
    })
}

async fn build_live_query(state: WorkflowState) -> Result<WorkflowUpdate> {
    let update = WorkflowUpdate::at(BUILD_LIVE_QUERY);

    Ok(match live_query(&state.request.body.payload) {
        Some(query) => {
            tracing::info!(sql = %query.sql, params = ?query.params, "built live query");
            WorkflowUpdate {
                sql_query: Some(query),
                ..update
            }
        }
        None => update.with_error("emailTemplateId and seq are required"),
    })
}

async fn seller_info(state: WorkflowState) -> Result<WorkflowUpdate> {
    let seller = SellerRecord::from(&state.request.body.message_generate_req.seller_info);
    tracing::info!(seller = ?seller, "seller info collected");
    Ok(WorkflowUpdate {
        seller_info: Some(seller),
        ..WorkflowUpdate::at(SELLER_INFO)
    })
}

async fn build_prompt(state: WorkflowState) -> Result<WorkflowUpdate> {
    let seller = state.seller_info.clone().unwrap_or_default();
    let market = market_info(state.sales_brain_data.as_ref());
    let prompt = template_designer_prompt(&seller, &state.request.body.chat_content, &market);
    tracing::debug!(chars = prompt.chars().count(), "prompt built");
    Ok(WorkflowUpdate {
        prompt: Some(prompt),
        ..WorkflowUpdate::at(BUILD_PROMPT)
    })
}

async fn return_result(state: WorkflowState) -> Result<WorkflowUpdate> {
    Ok(WorkflowUpdate {
        final_result: Some(state.preview_result.clone().unwrap_or_else(|| json!({}))),
        ..WorkflowUpdate::at(RETURN_RESULT)
    })
}

async fn stop(state: WorkflowState) -> Result<WorkflowUpdate> {
    match &state.error {
        Some(error) => tracing::warn!(after = %state.current_step, error = %error, "workflow stopped"),
        None => tracing::info!("workflow finished"),
    }
    Ok(WorkflowUpdate::at(STOP))
}

impl Steps {
    async fn run_query(self: Arc<Self>, state: WorkflowState) -> Result<WorkflowUpdate> {
        let update = WorkflowUpdate::at(RUN_QUERY);
        let Some(query) = state.sql_query.as_ref() else {
            return Ok(update.with_error("No SQL query was built"));
        };

        Ok(match self.store.fetch_first(query).await {
            Ok(row) => {
                tracing::info!(found = row.is_some(), "template version query finished");
                WorkflowUpdate {
                    template_version_data: Some(Value::Object(row.unwrap_or_default())),
                    ..update
                }
            }
            Err(e) => WorkflowUpdate {
                template_version_data: Some(json!({})),
                ..update
            }
            .with_error(e.to_string()),
        })
    }

    async fn fetch_sales_brain(self: Arc<Self>, state: WorkflowState) -> Result<WorkflowUpdate> {
        let update = WorkflowUpdate::at(FETCH_SALES_BRAIN);
        let user_id = state
            .request
            .body
            .message_generate_req
            .payload
            .user_id
            .as_ref()
            .map(ToString::to_string);

        Ok(match self.backend.sales_brain(user_id.as_deref()).await {
            Ok(body) => WorkflowUpdate {
                sales_brain_data: Some(body),
                ..update
            },
            Err(e) => WorkflowUpdate {
                sales_brain_data: Some(json!({})),
                ..update
            }
            .with_error(e.to_string()),
        })
    }

    async fn generate_template(self: Arc<Self>, state: WorkflowState) -> Result<WorkflowUpdate> {
        let update = WorkflowUpdate::at(GENERATE_TEMPLATE);
        let messages = vec![
            Message::system(state.prompt.clone().unwrap_or_default()),
            Message::user(state.request.body.chat_content.clone()),
        ];

        let structure = match self.provider.generate(messages, Some(self.options.clone())).await {
            Ok(response) => extract_json(&response.content),
            Err(e) => Err(e.into()),
        };

        Ok(match structure {
            Ok(structure) => {
                tracing::info!("template structure generated");
                WorkflowUpdate {
                    template_structure: Some(structure),
                    ..update
                }
            }
            Err(e) => WorkflowUpdate {
                template_structure: Some(json!({})),
                ..update
            }
            .with_error(e.to_string()),
        })
    }

    async fn preview_template(self: Arc<Self>, state: WorkflowState) -> Result<WorkflowUpdate> {
        let update = WorkflowUpdate::at(PREVIEW_TEMPLATE);
        let sections = state
            .template_structure
            .as_ref()
            .and_then(|s| s.get("template_structure"))
            .cloned()
            .unwrap_or_else(|| json!([]));

        Ok(
            match self
                .backend
                .preview(&state.request.body.message_generate_req.payload, sections)
                .await
            {
                Ok(body) => WorkflowUpdate {
                    preview_result: Some(body),
                    ..update
                },
                Err(e) => WorkflowUpdate {
                    preview_result: Some(json!({})),
                    ..update
                }
                .with_error(e.to_string()),
            },
        )
    }
}

/// The compiled pipeline plus the services its steps talk to.
pub struct EmailTemplateWorkflow {
    graph: CompiledGraph<WorkflowState>,
    events: Option<Arc<EventBus>>,
}

impl EmailTemplateWorkflow {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        options: GenerateOptions,
        store: Arc<dyn TemplateStore>,
        backend: BackendClient,
    ) -> Result<Self> {
        let steps = Arc::new(Steps {
            provider,
            options,
            store,
            backend,
        });

        let mut graph = StateGraph::new(RUN_NAME);
        graph
            .add_node(TRIGGER, trigger)
            .add_node(BUILD_TEST_QUERY, build_test_query)
            .add_node(BUILD_LIVE_QUERY, build_live_query)
            .add_node(SELLER_INFO, seller_info)
            .add_node(BUILD_PROMPT, build_prompt)
            .add_node(RETURN_RESULT, return_result)
            .add_node(STOP, stop);

        let s = steps.clone();
        graph.add_node(RUN_QUERY, move |state| s.clone().run_query(state));
        let s = steps.clone();
        graph.add_node(FETCH_SALES_BRAIN, move |state| s.clone().fetch_sales_brain(state));
        let s = steps.clone();
        graph.add_node(GENERATE_TEMPLATE, move |state| s.clone().generate_template(state));
        let s = steps;
        graph.add_node(PREVIEW_TEMPLATE, move |state| s.clone().preview_template(state));

        graph.set_entry_point(TRIGGER).add_conditional_edges(
            TRIGGER,
            route_trigger,
            [
                (BUILD_TEST_QUERY, BUILD_TEST_QUERY),
                (BUILD_LIVE_QUERY, BUILD_LIVE_QUERY),
                (STOP, STOP),
            ],
        );

        let chain = [
            (BUILD_TEST_QUERY, RUN_QUERY),
            (BUILD_LIVE_QUERY, RUN_QUERY),
            (RUN_QUERY, FETCH_SALES_BRAIN),
            (FETCH_SALES_BRAIN, SELLER_INFO),
            (SELLER_INFO, BUILD_PROMPT),
            (BUILD_PROMPT, GENERATE_TEMPLATE),
            (GENERATE_TEMPLATE, PREVIEW_TEMPLATE),
            (PREVIEW_TEMPLATE, RETURN_RESULT),
            (RETURN_RESULT, STOP),
        ];
        for (from, next) in chain {
            graph.add_conditional_edges(from, continue_to(next), [(next, next), (STOP, STOP)]);
        }
        graph.add_edge(STOP, END);

        Ok(Self {
            graph: graph.compile()?,
            events: None,
        })
    }

    /// Wire the workflow to MySQL and the backend services from `settings`.
    pub fn from_settings(
        settings: &Settings,
        provider: Arc<dyn LlmProvider>,
        options: GenerateOptions,
    ) -> Result<Self> {
        Self::new(
            provider,
            options,
            Arc::new(MySqlTemplateStore::new(settings.mysql.clone())),
            BackendClient::new(settings.backend.clone())?,
        )
    }

    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.graph = self.graph.with_events(events.clone());
        self.events = Some(events);
        self
    }

    /// Run the pipeline on a webhook body. Step failures end up in the
    /// returned state's `error`; only graph failures are returned as `Err`.
    pub async fn run(&self, webhook_body: Value) -> Result<WorkflowState> {
        self.publish(OrchestrationEvent::RunStarted {
            run: RUN_NAME.into(),
            input: webhook_body.to_string(),
        });

        let state = match self.graph.invoke(WorkflowState::new(webhook_body)).await {
            Ok(state) => state,
            Err(e) => {
                self.publish(OrchestrationEvent::RunFailed {
                    run: RUN_NAME.into(),
                    error: e.to_string(),
                });
                return Err(e);
            }
        };

        match &state.error {
            Some(error) => self.publish(OrchestrationEvent::RunFailed {
                run: RUN_NAME.into(),
                error: error.clone(),
            }),
            None => self.publish(OrchestrationEvent::RunCompleted {
                run: RUN_NAME.into(),
                summary: state
                    .final_result
                    .as_ref()
                    .map(|v| serde_json::to_string_pretty(v).unwrap_or_default())
                    .unwrap_or_default(),
            }),
        }

        Ok(state)
    }

    fn publish(&self, event: OrchestrationEvent) {
        if let Some(events) = &self.events {
            events.publish(event);
        }
    }
}
