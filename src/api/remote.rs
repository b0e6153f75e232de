//! Background API calls
//!
//! A click on an `api呼叫` button spawns a task on the session runtime. The
//! task never touches widgets: its result is posted back to the loop thread
//! as a `UiTask::ApiCompleted`.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::debug;

use super::client::{ApiClient, ApiRequest};
use crate::runtime::{UiHandle, UiTask};

/// What an `api呼叫` button does when clicked
#[derive(Debug, Clone, PartialEq)]
pub struct ApiCallSpec {
    pub api: String,
    pub method: String,
    pub path: String,
    pub body_template: Option<String>,
    pub target: Option<String>,
}

#[derive(Clone)]
pub struct RemoteCaller {
    client: Arc<ApiClient>,
    handle: Handle,
    ui: UiHandle,
}

impl RemoteCaller {
    pub fn new(client: Arc<ApiClient>, handle: Handle, ui: UiHandle) -> Self {
        Self { client, handle, ui }
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    /// Start a call; `context` fills the body placeholders
    pub fn spawn_call(&self, spec: &ApiCallSpec, context: HashMap<String, String>) {
        let client = Arc::clone(&self.client);
        let job = self.ui.begin_job();
        let spec = spec.clone();
        debug!(api = %spec.api, method = %spec.method, path = %spec.path, "API call started");

        self.handle.spawn(async move {
            let mut request = ApiRequest::new(&spec.method, &spec.path).context(context);
            request.body_template = spec.body_template.clone();
            let response = client.call(&spec.api, &request).await;
            job.complete(UiTask::ApiCompleted {
                api: spec.api,
                target: spec.target,
                response,
            });
        });
    }

    pub fn spawn_connection_test(&self, api: &str, target: Option<String>) {
        let client = Arc::clone(&self.client);
        let job = self.ui.begin_job();
        let api = api.to_string();
        debug!(api = %api, "connection test started");

        self.handle.spawn(async move {
            let response = client.test_connection(&api).await;
            job.complete(UiTask::ApiCompleted {
                api,
                target,
                response,
            });
        });
    }
}
