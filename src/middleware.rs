//! The Known Agents request interceptor.
//!
//! [`KnownAgents::provision`] activates a module instance: it validates the
//! settings, fetches the generated robots.txt once (when configured) and
//! starts the visit reporter. The instance then hands out a
//! [`KnownAgentsLayer`] that wraps the host's downstream service.
//!
//! Per request the service
//!
//! 1. publishes the cached robots.txt as a [`RobotsTxtVar`] request extension,
//! 2. calls the downstream service, propagating its error unchanged,
//! 3. on success queues a [`VisitEvent`] without waiting for delivery.

use std::borrow::Cow;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::http::Request;
use bytes::Bytes;
use tower::{Layer, Service};

use crate::api::AgentsApi;
use crate::error::ProvisionError;
use crate::reporter::{ReporterOptions, VisitReporter};
use crate::settings::Settings;
use crate::visit::VisitEvent;

/// Name under which hosts that key request variables by string expose the
/// robots.txt text.
pub const ROBOTS_TXT_VAR: &str = "ka_robots_txt";

/// Request-scoped variable holding the generated robots.txt, exactly as
/// returned by the API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RobotsTxtVar(Bytes);

impl RobotsTxtVar {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Cheap handle to the shared buffer.
    pub fn bytes(&self) -> Bytes {
        self.0.clone()
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

/// Read the robots.txt variable published for `req`, if any.
pub fn robots_txt_var<B>(req: &Request<B>) -> Option<&RobotsTxtVar> {
    req.extensions().get::<RobotsTxtVar>()
}

struct Shared {
    settings: Settings,
    robots_txt: Option<RobotsTxtVar>,
    reporter: VisitReporter,
}

/// A provisioned module instance. Cloning shares the same immutable state.
#[derive(Clone)]
pub struct KnownAgents {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for KnownAgents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnownAgents")
            .field("settings", &self.shared.settings)
            .field("robots_txt_len", &self.shared.robots_txt.as_ref().map(|v| v.0.len()))
            .finish()
    }
}

impl KnownAgents {
    /// Validate `settings`, fetch robots.txt if configured and start the
    /// reporter.
    ///
    /// A failed robots.txt fetch fails activation so a misconfigured token or
    /// policy is caught at startup instead of silently serving nothing.
    pub async fn provision(
        mut settings: Settings,
        api: Arc<dyn AgentsApi>,
        reporter: ReporterOptions,
    ) -> Result<Self, ProvisionError> {
        settings.apply_defaults();
        settings.validate()?;

        if let Some(policy) = &settings.robots_txt {
            tracing::debug!(
                agent_types = %policy.agent_types.join(","),
                disallow = %policy.disallow,
                "robots.txt policy"
            );
        }
        tracing::info!("knownagents middleware validated");

        let robots_txt = match &settings.robots_txt {
            Some(policy) => {
                tracing::info!("fetching generated robots.txt");
                let body = api.generate_robots_txt(policy).await.map_err(|err| {
                    tracing::warn!(error = %err, "error fetching robots.txt");
                    ProvisionError::RobotsTxt(err)
                })?;
                tracing::info!(var = ROBOTS_TXT_VAR, bytes = body.len(), "robots.txt cached");
                Some(RobotsTxtVar(body))
            }
            None => None,
        };

        let (reporter, _worker) = VisitReporter::spawn(api, reporter);

        Ok(Self {
            shared: Arc::new(Shared {
                settings,
                robots_txt,
                reporter,
            }),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.shared.settings
    }

    /// The cached robots.txt, present only when a policy is configured.
    pub fn robots_txt(&self) -> Option<&RobotsTxtVar> {
        self.shared.robots_txt.as_ref()
    }

    pub fn layer(&self) -> KnownAgentsLayer {
        KnownAgentsLayer {
            shared: self.shared.clone(),
        }
    }
}

#[derive(Clone)]
pub struct KnownAgentsLayer {
    shared: Arc<Shared>,
}

impl<S> Layer<S> for KnownAgentsLayer {
    type Service = KnownAgentsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        KnownAgentsService {
            inner,
            shared: self.shared.clone(),
        }
    }
}

#[derive(Clone)]
pub struct KnownAgentsService<S> {
    inner: S,
    shared: Arc<Shared>,
}

impl<S, B> Service<Request<B>> for KnownAgentsService<S>
where
    S: Service<Request<B>>,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        if let Some(var) = &self.shared.robots_txt {
            req.extensions_mut().insert(var.clone());
        }

        let event = VisitEvent::new(req.uri(), req.method(), req.headers());
        let reporter = self.shared.reporter.clone();
        let fut = self.inner.call(req);

        Box::pin(async move {
            let response = fut.await?;
            reporter.submit(event);
            Ok(response)
        })
    }
}
