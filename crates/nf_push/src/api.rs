//! Push subscription operations.
//!
//! Three flows, all best-effort:
//! - `register` subscribes every known closed group for the device token;
//! - `unregister` disables push for the token, then unsubscribes every group;
//! - `perform_operation` issues a single subscribe/unsubscribe request.
//!
//! Failures never escalate past this module: transport errors are retried up
//! to a fixed bound and then dropped, soft server failures (nonzero `code`)
//! are logged. Cancelling a sweep is dropping the future.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::{debug, warn};

use crate::storage::PushStorage;
use crate::transport::{Destination, OnionRequest, OnionResponse, OnionTransport, Version};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosedGroupOperation {
    Subscribe,
    Unsubscribe,
}

impl ClosedGroupOperation {
    /// Endpoint path segment on the legacy push server.
    pub fn raw_value(self) -> &'static str {
        match self {
            ClosedGroupOperation::Subscribe => "subscribe_closed_group",
            ClosedGroupOperation::Unsubscribe => "unsubscribe_closed_group",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PushConfig {
    /// Main push server (token registration and unregistration).
    pub server: String,
    pub server_public_key: String,
    /// Legacy server handling per-closed-group subscriptions.
    pub legacy_server: String,
    pub legacy_server_public_key: String,
    /// Attempts per request before giving up.
    pub max_retry_count: u32,
    /// Per-attempt timeout; the onion path makes slow requests common.
    pub request_timeout: Duration,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            server: "https://push.nightfall.chat".into(),
            server_public_key: "36e1f4decd1e6b67b22745a34b8b0f5efeb1013e8b44b0aeeb3221d3dcd8e26a"
                .into(),
            legacy_server: "https://apns.nightfall.chat".into(),
            legacy_server_public_key:
                "7b1f8d35c3a9d2e106bd4056a1b2cd9efa0fe445d7d4a8e3beb9011c4c128f57".into(),
            max_retry_count: 4,
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Subscription manager. Capabilities are injected at construction; the
/// manager holds no other state, so concurrent calls only race on the push
/// flag (an accepted, self-healing inconsistency).
pub struct PushNotificationApi {
    storage: Arc<dyn PushStorage>,
    transport: Arc<dyn OnionTransport>,
    config: PushConfig,
}

impl PushNotificationApi {
    pub fn new(
        storage: Arc<dyn PushStorage>,
        transport: Arc<dyn OnionTransport>,
        config: PushConfig,
    ) -> Self {
        Self {
            storage,
            transport,
            config,
        }
    }

    /// Subscribe every known closed group for this device.
    ///
    /// `force` is accepted for interface stability and currently unused:
    /// the server treats a repeated subscription as a no-op, so every call
    /// re-subscribes unconditionally. `token` identifies the device to the
    /// main server's token endpoints and is not needed for group operations.
    pub async fn register(&self, _token: &str, public_key: &str, _force: bool) {
        for group in self.storage.all_closed_group_public_keys() {
            self.perform_operation(ClosedGroupOperation::Subscribe, &group, public_key)
                .await;
        }
    }

    /// Disable push for this device token, then best-effort unsubscribe
    /// every known closed group.
    ///
    /// The push flag is cleared only when the server confirms the
    /// unregistration (`code == 0`); the per-group sweep runs regardless of
    /// the primary request's outcome.
    pub async fn unregister(&self, token: &str) {
        let request = OnionRequest {
            url: format!("{}/unregister", self.config.server),
            body: json!({ "token": token }),
        };
        let destination = Destination {
            host: self.config.server.clone(),
            public_key: self.config.server_public_key.clone(),
            version: Version::V2,
        };

        match self.send_with_retries(request, &destination).await {
            Some(response) if response.code() == Some(0) => {
                self.storage.set_using_push_notifications(false);
            }
            Some(response) => {
                warn!(
                    code = ?response.code(),
                    message = response.message().unwrap_or("null"),
                    "Couldn't disable push notifications"
                );
            }
            None => warn!("Couldn't disable push notifications: no response"),
        }

        let Some(user_public_key) = self.storage.user_public_key() else {
            warn!("No local account; skipping closed group unsubscribe sweep");
            return;
        };
        for group in self.storage.all_closed_group_public_keys() {
            // The sweep bypasses the enabled-flag check on purpose: the flag
            // may have just been cleared above, and cleanup must still run.
            self.submit_operation(
                ClosedGroupOperation::Unsubscribe,
                &group,
                &user_public_key,
            )
            .await;
        }
    }

    /// Issue one subscribe/unsubscribe request for a group. No-op while push
    /// notifications are disabled on this device.
    pub async fn perform_operation(
        &self,
        operation: ClosedGroupOperation,
        closed_group_public_key: &str,
        public_key: &str,
    ) {
        if !self.storage.is_using_push_notifications() {
            return;
        }
        self.submit_operation(operation, closed_group_public_key, public_key)
            .await;
    }

    async fn submit_operation(
        &self,
        operation: ClosedGroupOperation,
        closed_group_public_key: &str,
        public_key: &str,
    ) {
        let request = OnionRequest {
            url: format!("{}/{}", self.config.legacy_server, operation.raw_value()),
            body: json!({
                "closedGroupPublicKey": closed_group_public_key,
                "pubKey": public_key,
            }),
        };
        let destination = Destination {
            host: self.config.legacy_server.clone(),
            public_key: self.config.legacy_server_public_key.clone(),
            version: Version::V2,
        };

        match self.send_with_retries(request, &destination).await {
            Some(response) if response.code() == Some(0) => {}
            // Soft failure: logged, not retried, never escalated. The next
            // membership or app-state change re-issues the operation.
            Some(response) => debug!(
                group = closed_group_public_key,
                code = ?response.code(),
                message = response.message().unwrap_or("null"),
                "Couldn't subscribe/unsubscribe closed group"
            ),
            None => debug!(
                group = closed_group_public_key,
                "Couldn't subscribe/unsubscribe closed group: no response"
            ),
        }
    }

    /// Relay a request, retrying transport failures and timeouts up to the
    /// configured bound. A delivered response — whatever its code — ends the
    /// loop.
    async fn send_with_retries(
        &self,
        request: OnionRequest,
        destination: &Destination,
    ) -> Option<OnionResponse> {
        for attempt in 1..=self.config.max_retry_count {
            let send = self.transport.send(request.clone(), destination);
            match tokio::time::timeout(self.config.request_timeout, send).await {
                Ok(Ok(response)) => return Some(response),
                Ok(Err(e)) => warn!(attempt, error = %e, url = %request.url, "Onion request failed"),
                Err(_) => warn!(attempt, url = %request.url, "Onion request timed out"),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::transport::TransportError;

    struct MemoryStorage {
        groups: BTreeSet<String>,
        user: Option<String>,
        push_enabled: AtomicBool,
    }

    impl MemoryStorage {
        fn new(groups: &[&str], push_enabled: bool) -> Self {
            Self {
                groups: groups.iter().map(|g| g.to_string()).collect(),
                user: Some("05me".into()),
                push_enabled: AtomicBool::new(push_enabled),
            }
        }
    }

    impl PushStorage for MemoryStorage {
        fn all_closed_group_public_keys(&self) -> BTreeSet<String> {
            self.groups.clone()
        }

        fn user_public_key(&self) -> Option<String> {
            self.user.clone()
        }

        fn is_using_push_notifications(&self) -> bool {
            self.push_enabled.load(Ordering::SeqCst)
        }

        fn set_using_push_notifications(&self, enabled: bool) {
            self.push_enabled.store(enabled, Ordering::SeqCst);
        }
    }

    enum Behaviour {
        Respond(i64),
        Fail,
    }

    struct MockTransport {
        behaviour: Behaviour,
        calls: Mutex<Vec<(OnionRequest, Destination)>>,
    }

    impl MockTransport {
        fn new(behaviour: Behaviour) -> Self {
            Self {
                behaviour,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(OnionRequest, Destination)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl OnionTransport for MockTransport {
        async fn send(
            &self,
            request: OnionRequest,
            destination: &Destination,
        ) -> Result<OnionResponse, TransportError> {
            self.calls
                .lock()
                .unwrap()
                .push((request, destination.clone()));
            match self.behaviour {
                Behaviour::Respond(code) => {
                    let mut response = OnionResponse::default();
                    response.info.insert("code".into(), json!(code));
                    response.info.insert("message".into(), json!("ok"));
                    Ok(response)
                }
                Behaviour::Fail => Err(TransportError::Request("path build failed".into())),
            }
        }
    }

    fn api(
        storage: MemoryStorage,
        behaviour: Behaviour,
    ) -> (PushNotificationApi, Arc<MockTransport>, Arc<MemoryStorage>) {
        let storage = Arc::new(storage);
        let transport = Arc::new(MockTransport::new(behaviour));
        let api = PushNotificationApi::new(
            storage.clone(),
            transport.clone(),
            PushConfig {
                request_timeout: Duration::from_millis(200),
                ..PushConfig::default()
            },
        );
        (api, transport, storage)
    }

    #[tokio::test]
    async fn push_disabled_issues_no_requests() {
        let (api, transport, _) = api(MemoryStorage::new(&["05g1"], false), Behaviour::Respond(0));
        api.perform_operation(ClosedGroupOperation::Subscribe, "05g1", "05me")
            .await;
        api.perform_operation(ClosedGroupOperation::Unsubscribe, "05g1", "05me")
            .await;
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn subscribing_twice_sends_two_independent_requests() {
        let (api, transport, _) = api(MemoryStorage::new(&["05g1"], true), Behaviour::Respond(0));
        api.perform_operation(ClosedGroupOperation::Subscribe, "05g1", "05me")
            .await;
        api.perform_operation(ClosedGroupOperation::Subscribe, "05g1", "05me")
            .await;

        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, calls[1].0);
        assert!(calls[0].0.url.ends_with("/subscribe_closed_group"));
        assert_eq!(
            calls[0].0.body,
            json!({ "closedGroupPublicKey": "05g1", "pubKey": "05me" })
        );
    }

    #[tokio::test]
    async fn register_subscribes_every_known_group() {
        let (api, transport, _) = api(
            MemoryStorage::new(&["05g1", "05g2", "05g3"], true),
            Behaviour::Respond(0),
        );
        api.register("token", "05me", false).await;

        let calls = transport.calls();
        assert_eq!(calls.len(), 3);
        let groups: Vec<_> = calls
            .iter()
            .map(|(req, _)| req.body["closedGroupPublicKey"].as_str().unwrap().to_owned())
            .collect();
        assert_eq!(groups, vec!["05g1", "05g2", "05g3"]);
    }

    #[tokio::test]
    async fn unregister_clears_flag_and_sweeps_groups() {
        let (api, transport, storage) = api(
            MemoryStorage::new(&["05g1", "05g2"], true),
            Behaviour::Respond(0),
        );
        api.unregister("token").await;

        assert!(!storage.is_using_push_notifications());
        let calls = transport.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls[0].0.url.ends_with("/unregister"));
        assert_eq!(calls[0].0.body, json!({ "token": "token" }));
        // The sweep still runs after the flag was cleared.
        assert!(calls[1].0.url.ends_with("/unsubscribe_closed_group"));
        assert!(calls[2].0.url.ends_with("/unsubscribe_closed_group"));
    }

    #[tokio::test]
    async fn unregister_error_code_keeps_flag_but_still_sweeps() {
        let (api, transport, storage) = api(
            MemoryStorage::new(&["05g1"], true),
            Behaviour::Respond(1),
        );
        api.unregister("token").await;

        assert!(storage.is_using_push_notifications());
        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[1].0.url.ends_with("/unsubscribe_closed_group"));
    }

    #[tokio::test]
    async fn transport_failures_are_retried_to_the_bound_then_dropped() {
        let (api, transport, _) = api(MemoryStorage::new(&["05g1"], true), Behaviour::Fail);
        api.perform_operation(ClosedGroupOperation::Subscribe, "05g1", "05me")
            .await;
        assert_eq!(transport.calls().len(), 4);
    }

    #[tokio::test]
    async fn soft_failure_codes_are_not_retried() {
        let (api, transport, _) = api(MemoryStorage::new(&["05g1"], true), Behaviour::Respond(3));
        api.perform_operation(ClosedGroupOperation::Subscribe, "05g1", "05me")
            .await;
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn requests_target_the_configured_destinations() {
        let (api, transport, _) = api(MemoryStorage::new(&["05g1"], true), Behaviour::Respond(0));
        api.unregister("token").await;

        let calls = transport.calls();
        let config = PushConfig::default();
        assert_eq!(calls[0].1.host, config.server);
        assert_eq!(calls[0].1.public_key, config.server_public_key);
        assert_eq!(calls[1].1.host, config.legacy_server);
        assert_eq!(calls[1].1.public_key, config.legacy_server_public_key);
        assert_eq!(calls[0].1.version, Version::V2);
    }
}
