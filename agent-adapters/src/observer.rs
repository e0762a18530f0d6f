//! Observer chain around the completion backend call.

use std::fmt;
use std::sync::Arc;

use agent_primitives::{FormattedName, MAX_DESCRIPTION_CHARS};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::traits::{
    AdapterError, AdapterMetadata, AdapterResult, AdapterStream, InferenceRequest, ModelAdapter,
};

/// Hook invoked around each outbound inference request.
///
/// Observers see the request by reference and cannot change it or the call.
pub trait RequestObserver: Send + Sync {
    /// Called before the request is handed to the backend.
    fn before_request(&self, request: &InferenceRequest);

    /// Called once the backend call returned; `error` is set when it failed.
    fn after_response(&self, request: &InferenceRequest, error: Option<&AdapterError>) {
        let _ = (request, error);
    }
}

/// Logs the offered capability set and flags descriptions that are still too long.
#[derive(Debug, Default)]
pub struct ToolListObserver;

impl RequestObserver for ToolListObserver {
    fn before_request(&self, request: &InferenceRequest) {
        if request.tools().is_empty() {
            return;
        }

        let names: Vec<&str> = request.tools().iter().map(|tool| tool.name().as_str()).collect();
        debug!(count = names.len(), tools = ?names, "offering capabilities to backend");

        for name in oversized_tools(request) {
            warn!(
                capability = %name,
                limit = MAX_DESCRIPTION_CHARS,
                "capability description exceeds safe length"
            );
        }
    }

    fn after_response(&self, request: &InferenceRequest, error: Option<&AdapterError>) {
        if let Some(error) = error {
            warn!(tools = request.tools().len(), %error, "backend call failed");
        }
    }
}

/// Returns the names of offered capabilities whose description is oversized.
#[must_use]
pub fn oversized_tools(request: &InferenceRequest) -> Vec<&FormattedName> {
    request
        .tools()
        .iter()
        .filter(|tool| tool.is_oversized())
        .map(|tool| tool.name())
        .collect()
}

/// Composite observer that forwards to a collection of observers in order.
pub struct CompositeRequestObserver {
    observers: Vec<Arc<dyn RequestObserver>>,
}

impl CompositeRequestObserver {
    /// Creates a new composite observer from the supplied list.
    #[must_use]
    pub fn new<I>(observers: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn RequestObserver>>,
    {
        Self {
            observers: observers.into_iter().collect(),
        }
    }

    /// Adds an observer to the composite set.
    pub fn push(&mut self, observer: Arc<dyn RequestObserver>) {
        self.observers.push(observer);
    }
}

impl RequestObserver for CompositeRequestObserver {
    fn before_request(&self, request: &InferenceRequest) {
        for observer in &self.observers {
            observer.before_request(request);
        }
    }

    fn after_response(&self, request: &InferenceRequest, error: Option<&AdapterError>) {
        for observer in &self.observers {
            observer.after_response(request, error);
        }
    }
}

/// Model adapter decorated with request observers.
///
/// Each `infer` call notifies the observers and delegates to the wrapped
/// adapter exactly once, returning its result untouched.
pub struct ObservedAdapter {
    inner: Arc<dyn ModelAdapter>,
    observers: Vec<Arc<dyn RequestObserver>>,
}

impl fmt::Debug for ObservedAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservedAdapter")
            .field("provider", &self.inner.metadata().provider())
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl ObservedAdapter {
    /// Wraps `inner` with no observers.
    #[must_use]
    pub fn new(inner: Arc<dyn ModelAdapter>) -> Self {
        Self {
            inner,
            observers: Vec::new(),
        }
    }

    /// Appends an observer to the chain.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn RequestObserver>) -> Self {
        self.observers.push(observer);
        self
    }
}

#[async_trait]
impl ModelAdapter for ObservedAdapter {
    fn metadata(&self) -> &AdapterMetadata {
        self.inner.metadata()
    }

    async fn infer(&self, request: InferenceRequest) -> AdapterResult<AdapterStream> {
        if self.observers.is_empty() {
            return self.inner.infer(request).await;
        }

        for observer in &self.observers {
            observer.before_request(&request);
        }

        let observed = request.clone();
        let result = self.inner.infer(request).await;

        for observer in &self.observers {
            observer.after_response(&observed, result.as_ref().err());
        }

        result
    }
}
