//! Request execution with one-shot credential renewal
//!
//! The only retry in the system lives here. An operation that fails with a
//! 401 triggers exactly one renewal and exactly one retry; a second 401 is
//! reported as `PersistentAuthFailure` so callers can stop a whole batch
//! instead of failing item by item. Non-auth failures are never retried.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use x_auth::{CredentialStore, Renewer};

use crate::client::{ClientFactory, ClientHandle};
use crate::error::{Error, Result};

/// Runs social API operations against the current credential pair.
pub struct RequestExecutor {
    store: Arc<CredentialStore>,
    factory: ClientFactory,
    renewer: Arc<dyn Renewer>,
    /// Serializes renewals so a rotated refresh token is spent only once.
    renewal: Mutex<()>,
}

impl RequestExecutor {
    pub fn new(
        store: Arc<CredentialStore>,
        factory: ClientFactory,
        renewer: Arc<dyn Renewer>,
    ) -> Self {
        Self {
            store,
            factory,
            renewer,
            renewal: Mutex::new(()),
        }
    }

    pub fn credential_store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    /// Run `operation` with a handle bound to the current pair.
    ///
    /// `operation` is invoked at most twice. Renewals are serialized: if the
    /// pair was already replaced by another caller while the first attempt
    /// was in flight, the retry uses the replacement instead of spending the
    /// now stale refresh token.
    pub async fn execute<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: Fn(ClientHandle) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let pair = self.store.current().await;
        let first = match operation(self.factory.build(&pair)).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_unauthorized() => e,
            Err(e) => return Err(e),
        };

        info!(error = %first, "access token rejected, renewing credentials");

        let retry_pair = {
            let _renewing = self.renewal.lock().await;
            let current = self.store.current().await;
            if current != pair {
                debug!("credential pair already replaced, retrying with current pair");
                current
            } else {
                match self.renewer.renew(pair.refresh_token()).await {
                    Ok(renewed) => {
                        metrics::counter!("x_token_refresh_total", "outcome" => "success")
                            .increment(1);
                        self.store.replace(renewed.clone()).await;
                        renewed
                    }
                    Err(e) => {
                        metrics::counter!("x_token_refresh_total", "outcome" => "failure")
                            .increment(1);
                        warn!(error = %e, "credential renewal failed, giving up");
                        return Err(Error::AuthRenewal(e));
                    }
                }
            }
        };

        match operation(self.factory.build(&retry_pair)).await {
            Err(e) if e.is_unauthorized() => {
                warn!(error = %e, "still unauthorized after renewal");
                Err(Error::PersistentAuthFailure(e.to_string()))
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
    use x_auth::{CredentialPair, RenewFuture};

    /// Renewer that records the refresh tokens it was given and either
    /// rotates `R<n>` into `A<n+1>`/`R<n+1>` or fails.
    struct FakeRenewer {
        seen: Mutex<Vec<String>>,
        fail: bool,
    }

    impl FakeRenewer {
        fn rotating() -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(vec![]),
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(vec![]),
                fail: true,
            })
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    impl Renewer for FakeRenewer {
        fn renew<'a>(&'a self, refresh_token: &'a str) -> RenewFuture<'a> {
            Box::pin(async move {
                self.seen.lock().unwrap().push(refresh_token.to_string());
                if self.fail {
                    return Err(x_auth::Error::InvalidCredentials("revoked".into()));
                }
                let n: u32 = refresh_token.trim_start_matches('R').parse().unwrap();
                Ok(CredentialPair::new(format!("A{}", n + 1), format!("R{}", n + 1)))
            })
        }
    }

    fn executor(renewer: Arc<FakeRenewer>) -> RequestExecutor {
        RequestExecutor::new(
            Arc::new(CredentialStore::new(CredentialPair::new("A0", "R0"))),
            ClientFactory::new(reqwest::Client::new(), "http://unused"),
            renewer,
        )
    }

    #[tokio::test]
    async fn valid_token_never_renews() {
        let renewer = FakeRenewer::rotating();
        let executor = executor(renewer.clone());
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = executor
                .execute(|handle| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async move { Ok(handle.access_token().to_string()) }
                })
                .await
                .unwrap();
            assert_eq!(value, "A0");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(renewer.calls(), 0);
    }

    #[tokio::test]
    async fn unauthorized_then_renew_retries_exactly_once() {
        let renewer = FakeRenewer::rotating();
        let executor = executor(renewer.clone());
        let calls = AtomicUsize::new(0);

        let value = executor
            .execute(|handle| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    match handle.access_token() {
                        "A0" => Err(Error::Unauthorized("expired".into())),
                        token => Ok(format!("ok with {token}")),
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(value, "ok with A1");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(*renewer.seen.lock().unwrap(), vec!["R0".to_string()]);
        assert_eq!(
            executor.credential_store().current().await,
            CredentialPair::new("A1", "R1")
        );
    }

    #[tokio::test]
    async fn retry_failure_is_returned_as_is() {
        let renewer = FakeRenewer::rotating();
        let executor = executor(renewer.clone());

        let err = executor
            .execute(|handle| async move {
                match handle.access_token() {
                    "A0" => Err::<(), _>(Error::Unauthorized("expired".into())),
                    _ => Err(Error::Transient("HTTP 503: over capacity".into())),
                }
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Transient(_)), "got: {err:?}");
        assert_eq!(renewer.calls(), 1);
    }

    #[tokio::test]
    async fn failed_renewal_is_auth_renewal_error_without_retry() {
        let renewer = FakeRenewer::failing();
        let executor = executor(renewer.clone());
        let calls = AtomicUsize::new(0);

        let err = executor
            .execute(|_handle| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(Error::Unauthorized("expired".into())) }
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::AuthRenewal(_)), "got: {err:?}");
        assert!(err.is_auth_fatal());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        // The store keeps the old pair
        assert_eq!(
            executor.credential_store().current().await,
            CredentialPair::new("A0", "R0")
        );
    }

    #[tokio::test]
    async fn second_unauthorized_is_persistent_auth_failure() {
        let renewer = FakeRenewer::rotating();
        let executor = executor(renewer.clone());
        let calls = AtomicUsize::new(0);

        let err = executor
            .execute(|_handle| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(Error::Unauthorized("app access revoked".into())) }
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::PersistentAuthFailure(_)), "got: {err:?}");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(renewer.calls(), 1);
    }

    #[tokio::test]
    async fn non_auth_error_propagates_without_renewal() {
        let renewer = FakeRenewer::rotating();
        let executor = executor(renewer.clone());
        let calls = AtomicUsize::new(0);

        let err = executor
            .execute(|_handle| {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err::<(), _>(Error::Api {
                        status: 400,
                        message: "malformed request".into(),
                    })
                }
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Api { status: 400, .. }), "got: {err:?}");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(renewer.calls(), 0);
    }

    #[tokio::test]
    async fn replaced_pair_is_reused_instead_of_renewing() {
        let renewer = FakeRenewer::rotating();
        let executor = executor(renewer.clone());
        let store = executor.credential_store().clone();

        let value = executor
            .execute(|handle| {
                let store = store.clone();
                async move {
                    if handle.access_token() == "A0" {
                        // Someone else renewed while this attempt was in flight
                        store.replace(CredentialPair::new("A5", "R5")).await;
                        return Err(Error::Unauthorized("expired".into()));
                    }
                    Ok(handle.access_token().to_string())
                }
            })
            .await
            .unwrap();

        assert_eq!(value, "A5");
        assert_eq!(renewer.calls(), 0);
    }

    #[tokio::test]
    async fn successive_renewals_use_latest_refresh_token() {
        let renewer = FakeRenewer::rotating();
        let executor = executor(renewer.clone());

        for expected in ["A1", "A2"] {
            let expired = executor.credential_store().current().await;
            let value = executor
                .execute(|handle| {
                    let expired = expired.access_token().to_string();
                    async move {
                        if handle.access_token() == expired {
                            Err(Error::Unauthorized("expired".into()))
                        } else {
                            Ok(handle.access_token().to_string())
                        }
                    }
                })
                .await
                .unwrap();
            assert_eq!(value, expected);
        }

        assert_eq!(
            *renewer.seen.lock().unwrap(),
            vec!["R0".to_string(), "R1".to_string()]
        );
    }

    /// Renewer that, like X, accepts only the most recently issued refresh
    /// token and rotates it on every use.
    struct StrictRenewer {
        latest: Mutex<String>,
        calls: AtomicUsize,
    }

    impl Renewer for StrictRenewer {
        fn renew<'a>(&'a self, refresh_token: &'a str) -> RenewFuture<'a> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                tokio::task::yield_now().await;
                let mut latest = self.latest.lock().unwrap();
                if *latest != refresh_token {
                    return Err(x_auth::Error::InvalidCredentials("stale".into()));
                }
                let n: u32 = refresh_token.trim_start_matches('R').parse().unwrap();
                *latest = format!("R{}", n + 1);
                Ok(CredentialPair::new(format!("A{}", n + 1), format!("R{}", n + 1)))
            })
        }
    }

    #[tokio::test]
    async fn concurrent_unauthorized_calls_share_one_renewal() {
        let renewer = Arc::new(StrictRenewer {
            latest: Mutex::new("R0".into()),
            calls: AtomicUsize::new(0),
        });
        let executor = RequestExecutor::new(
            Arc::new(CredentialStore::new(CredentialPair::new("A0", "R0"))),
            ClientFactory::new(reqwest::Client::new(), "http://unused"),
            renewer.clone(),
        );
        // Both first attempts fail before either caller starts renewing
        let barrier = Arc::new(tokio::sync::Barrier::new(2));
        let op = |handle: ClientHandle| {
            let barrier = barrier.clone();
            async move {
                if handle.access_token() == "A0" {
                    barrier.wait().await;
                    return Err(Error::Unauthorized("expired".into()));
                }
                Ok(handle.access_token().to_string())
            }
        };

        let (a, b) = tokio::join!(executor.execute(op), executor.execute(op));

        assert_eq!(a.unwrap(), "A1");
        assert_eq!(b.unwrap(), "A1");
        assert_eq!(renewer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            executor.credential_store().current().await,
            CredentialPair::new("A1", "R1")
        );
    }

    fn isolated_recorder() -> (PrometheusRecorder, PrometheusHandle) {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        (recorder, handle)
    }

    #[tokio::test]
    async fn renewal_outcomes_are_counted() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        let expire_a0 = |handle: ClientHandle| async move {
            match handle.access_token() {
                "A0" => Err(Error::Unauthorized("expired".into())),
                _ => Ok(()),
            }
        };
        executor(FakeRenewer::rotating())
            .execute(expire_a0)
            .await
            .unwrap();
        executor(FakeRenewer::failing())
            .execute(expire_a0)
            .await
            .unwrap_err();

        let output = handle.render();
        assert!(output.contains("x_token_refresh_total{outcome=\"success\"} 1"));
        assert!(output.contains("x_token_refresh_total{outcome=\"failure\"} 1"));
    }

    #[tokio::test]
    async fn valid_token_records_no_renewal() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        executor(FakeRenewer::rotating())
            .execute(|_handle| async { Ok(()) })
            .await
            .unwrap();

        assert!(!handle.render().contains("x_token_refresh_total"));
    }
}
