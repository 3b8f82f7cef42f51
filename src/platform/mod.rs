pub mod telegram;
pub mod types;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// An outbound Bot API call whose response did not indicate success.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{method} failed: {description}")]
pub struct PlatformApiError {
    pub method: String,
    pub description: String,
}

impl PlatformApiError {
    pub fn new(method: &str, description: impl Into<String>) -> Self {
        Self {
            method: method.to_string(),
            description: description.into(),
        }
    }
}

/// Method-keyed access to the messaging platform.
///
/// Implementations never retry; a failed call is reported once and the
/// caller decides what to do with it.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    async fn call(&self, method: &str, body: Value) -> Result<Value, PlatformApiError>;
}

/// Serialize typed parameters and issue `method` with them.
pub async fn request<P: Serialize + ?Sized>(
    api: &dyn PlatformApi,
    method: &str,
    params: &P,
) -> Result<Value, PlatformApiError> {
    let body = serde_json::to_value(params)
        .map_err(|e| PlatformApiError::new(method, format!("invalid parameters: {e}")))?;
    api.call(method, body).await
}

#[cfg(test)]
pub mod testing {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use super::*;

    type FailurePredicate = Box<dyn Fn(&str, &Value) -> bool + Send + Sync>;

    /// Records every call in order. Methods listed in `failing`, and calls
    /// matching a `failing_when` predicate, return an error.
    #[derive(Default)]
    pub struct RecordingApi {
        calls: Mutex<Vec<(String, Value)>>,
        failed: Mutex<Vec<(String, Value)>>,
        failing: HashSet<String>,
        failing_when: Vec<FailurePredicate>,
        results: Vec<(String, Value)>,
    }

    impl RecordingApi {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing(mut self, method: &str) -> Self {
            self.failing.insert(method.to_string());
            self
        }

        pub fn failing_when(
            mut self,
            predicate: impl Fn(&str, &Value) -> bool + Send + Sync + 'static,
        ) -> Self {
            self.failing_when.push(Box::new(predicate));
            self
        }

        pub fn returning(mut self, method: &str, result: Value) -> Self {
            self.results.push((method.to_string(), result));
            self
        }

        pub fn calls(&self) -> Vec<(String, Value)> {
            self.calls.lock().unwrap().clone()
        }

        /// Calls that were answered with an error.
        pub fn failed_calls(&self) -> Vec<(String, Value)> {
            self.failed.lock().unwrap().clone()
        }

        pub fn methods(&self) -> Vec<String> {
            self.calls().into_iter().map(|(m, _)| m).collect()
        }
    }

    #[async_trait]
    impl PlatformApi for RecordingApi {
        async fn call(&self, method: &str, body: Value) -> Result<Value, PlatformApiError> {
            self.calls
                .lock()
                .unwrap()
                .push((method.to_string(), body.clone()));
            let fails = self.failing.contains(method)
                || self.failing_when.iter().any(|predicate| predicate(method, &body));
            if fails {
                self.failed.lock().unwrap().push((method.to_string(), body));
                return Err(PlatformApiError::new(method, "Bad Request: simulated"));
            }
            Ok(self
                .results
                .iter()
                .find(|(m, _)| m == method)
                .map(|(_, v)| v.clone())
                .unwrap_or(Value::Bool(true)))
        }
    }
}
