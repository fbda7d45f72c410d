use std::sync::Arc;

use coop_cms_core::events::bus::EventBus;
use coop_cms_core::ContentService;

use crate::config::AppConfig;

/// Shared application state, passed to all handlers via Axum's `State` extractor.
/// Wrapped in `Arc` so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    service: ContentService,
    config: AppConfig,
}

impl AppState {
    pub fn new(service: ContentService, config: AppConfig) -> Self {
        Self {
            inner: Arc::new(InnerState { service, config }),
        }
    }

    pub fn service(&self) -> &ContentService {
        &self.inner.service
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn event_bus(&self) -> &EventBus {
        self.inner.service.events()
    }
}
