use std::sync::Arc;
use std::time::Instant;

use crate::config::Settings;
use crate::delivery::{DeliveryClient, RetryPolicy, RetryingDeliveryClient};
use crate::dispatch::Dispatcher;
use crate::message::{MemoryMessageStore, MessageStore};
use crate::template::{default_templates, TemplateStore};
use crate::webhook::WebhookReconciler;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub template_store: Arc<TemplateStore>,
    pub message_store: Arc<dyn MessageStore>,
    pub dispatcher: Arc<Dispatcher>,
    pub reconciler: Arc<WebhookReconciler>,
    pub started_at: Instant,
}

impl AppState {
    /// Build the application state from settings and an injected delivery
    /// client. The client is wrapped with the timeout/retry decorator here,
    /// so the dispatcher always sees a single-call adapter.
    pub fn new(settings: Settings, delivery_client: Arc<dyn DeliveryClient>) -> Self {
        let settings = Arc::new(settings);

        let template_store = Arc::new(TemplateStore::new(
            settings.templates.default_language.clone(),
        ));
        if settings.templates.seed_defaults {
            for template in default_templates() {
                // Duplicate seeds are rejected by the store and ignored here
                let _ = template_store.create(template);
            }
            tracing::info!(
                active = template_store.active_count(),
                "Seeded default templates"
            );
        }

        let message_store: Arc<dyn MessageStore> = Arc::new(MemoryMessageStore::new());

        let client: Arc<dyn DeliveryClient> = Arc::new(RetryingDeliveryClient::new(
            delivery_client,
            RetryPolicy::from_config(&settings.provider),
        ));

        let dispatcher = Arc::new(Dispatcher::new(
            template_store.clone(),
            message_store.clone(),
            client,
        ));
        let reconciler = Arc::new(WebhookReconciler::new(message_store.clone()));

        Self {
            settings,
            template_store,
            message_store,
            dispatcher,
            reconciler,
            started_at: Instant::now(),
        }
    }
}
