//! Single-flight upstream warm-up.
//!
//! The first caller of [`Readiness::ensure`] starts a `HEAD <origin>/` probe;
//! every concurrent caller awaits that same probe. Success is remembered for
//! the rest of the process lifetime. Failure is not, so the next caller
//! probes again.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::proxy::{ForwardError, Origin};
use crate::upstream::{Upstream, UpstreamRequest};

pub struct Readiness {
    origin: Origin,
    upstream: Arc<dyn Upstream>,
    ready: OnceCell<()>,
    probes: AtomicUsize,
}

impl Readiness {
    pub fn new(origin: Origin, upstream: Arc<dyn Upstream>) -> Self {
        Self {
            origin,
            upstream,
            ready: OnceCell::new(),
            probes: AtomicUsize::new(0),
        }
    }

    /// Resolve once the origin has answered a probe.
    ///
    /// Any HTTP status counts as reachable; only transport-level failures
    /// (including timeouts) are errors.
    pub async fn ensure(&self) -> Result<(), ForwardError> {
        self.ready
            .get_or_try_init(|| self.probe())
            .await
            .map(|_| ())
    }

    /// Whether a probe has already succeeded. Never starts one.
    pub fn is_ready(&self) -> bool {
        self.ready.initialized()
    }

    /// Number of probes started so far.
    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    async fn probe(&self) -> Result<(), ForwardError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        let request = UpstreamRequest::head(self.origin.join("")?);

        match self.upstream.send(request).await {
            Ok(response) => {
                tracing::info!(origin = %self.origin, status = %response.status, "Upstream reachable");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(origin = %self.origin, error = %e, "Upstream warm-up probe failed");
                Err(e)
            }
        }
    }
}
