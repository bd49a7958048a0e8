//! Explicit dispatch context.
//!
//! Everything the dispatcher and proxy forwarder need is carried in a
//! [`DispatchContext`] passed at construction. There are no globals: two
//! engines with different stores, transports, or identities can coexist in
//! one process.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;

use crate::access::AccessControl;
use crate::config::TargetStore;
use crate::log::{NoopLog, NotificationLog};
use crate::transport::DispatchTransport;

/// Supplies the local engine ID.
///
/// Returns `None` until the engine has been assigned an ID; dispatch
/// refuses to run before that.
pub trait EngineIdentity: Send + Sync {
    fn engine_id(&self) -> Option<Bytes>;
}

/// An engine ID fixed at construction.
#[derive(Debug, Clone)]
pub struct FixedEngine(Bytes);

impl FixedEngine {
    pub fn new(engine_id: impl Into<Bytes>) -> Self {
        Self(engine_id.into())
    }
}

impl EngineIdentity for FixedEngine {
    fn engine_id(&self) -> Option<Bytes> {
        if self.0.is_empty() {
            None
        } else {
            Some(self.0.clone())
        }
    }
}

/// sysUpTime clock: hundredths of a second since agent start, wrapping
/// modulo 2^32 per RFC 3418.
#[derive(Debug, Clone, Copy)]
pub struct AgentUptime {
    start: Instant,
}

impl AgentUptime {
    pub fn starting_now() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn ticks(&self) -> u32 {
        (self.start.elapsed().as_millis() / 10) as u32
    }
}

impl Default for AgentUptime {
    fn default() -> Self {
        Self::starting_now()
    }
}

/// Shared dependencies of the dispatch engine.
#[derive(Clone)]
pub struct DispatchContext {
    pub store: Arc<TargetStore>,
    pub access: Arc<dyn AccessControl>,
    pub transport: Arc<dyn DispatchTransport>,
    pub log: Arc<dyn NotificationLog>,
    pub engine: Arc<dyn EngineIdentity>,
    pub uptime: AgentUptime,
}

impl DispatchContext {
    /// Start building a context around a store, transport, and access
    /// policy. Log and uptime have defaults; engine identity defaults to
    /// unassigned.
    pub fn builder(
        store: Arc<TargetStore>,
        transport: Arc<dyn DispatchTransport>,
        access: Arc<dyn AccessControl>,
    ) -> DispatchContextBuilder {
        DispatchContextBuilder {
            store,
            access,
            transport,
            log: None,
            engine: None,
            uptime: None,
        }
    }
}

pub struct DispatchContextBuilder {
    store: Arc<TargetStore>,
    access: Arc<dyn AccessControl>,
    transport: Arc<dyn DispatchTransport>,
    log: Option<Arc<dyn NotificationLog>>,
    engine: Option<Arc<dyn EngineIdentity>>,
    uptime: Option<AgentUptime>,
}

impl DispatchContextBuilder {
    pub fn log(mut self, log: Arc<dyn NotificationLog>) -> Self {
        self.log = Some(log);
        self
    }

    pub fn engine(mut self, engine: Arc<dyn EngineIdentity>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn engine_id(self, engine_id: impl Into<Bytes>) -> Self {
        let engine = Arc::new(FixedEngine::new(engine_id));
        self.engine(engine)
    }

    pub fn uptime(mut self, uptime: AgentUptime) -> Self {
        self.uptime = Some(uptime);
        self
    }

    pub fn build(self) -> DispatchContext {
        DispatchContext {
            store: self.store,
            access: self.access,
            transport: self.transport,
            log: self.log.unwrap_or_else(|| Arc::new(NoopLog)),
            engine: self.engine.unwrap_or_else(|| Arc::new(FixedEngine::new(Bytes::new()))),
            uptime: self.uptime.unwrap_or_default(),
        }
    }
}
