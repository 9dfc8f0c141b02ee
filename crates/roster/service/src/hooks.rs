use crate::error::{ServiceError, ServiceResult};
use async_trait::async_trait;
use roster_engine::SubmissionEvent;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Kinds of events the service dispatches to registered hooks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Gateway connection established; initial reload.
    Init,
    /// A submission event in the profile channel.
    Submission,
    /// A control command in the operator channel.
    Control,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Init => "init",
            EventKind::Submission => "submission",
            EventKind::Control => "control",
        };
        f.write_str(name)
    }
}

/// Payload handed to a hook invocation.
#[derive(Clone, Debug)]
pub enum HookContext<'a> {
    Init,
    Submission(&'a SubmissionEvent),
    Control { command: &'a str },
}

/// A capability object bound to an event kind.
///
/// The async call signature is fixed by the trait, so a handler is known to
/// be awaitable at registration time rather than at each invocation.
#[async_trait]
pub trait EventHook: Send + Sync {
    async fn call(&self, context: HookContext<'_>) -> ServiceResult<()>;
}

/// Explicit event-kind to handler registry, populated at startup from
/// static configuration.
#[derive(Default)]
pub struct HookRegistry {
    hooks: HashMap<EventKind, Arc<dyn EventHook>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a handler to an event kind. Binding the same kind twice is a
    /// configuration mistake and is rejected here, once, at startup.
    pub fn register(&mut self, kind: EventKind, hook: Arc<dyn EventHook>) -> ServiceResult<()> {
        if self.hooks.contains_key(&kind) {
            return Err(ServiceError::DuplicateHook(kind.to_string()));
        }
        self.hooks.insert(kind, hook);
        Ok(())
    }

    pub fn is_registered(&self, kind: EventKind) -> bool {
        self.hooks.contains_key(&kind)
    }

    /// Dispatch an event to its handler.
    pub async fn dispatch(&self, kind: EventKind, context: HookContext<'_>) -> ServiceResult<()> {
        let hook = self
            .hooks
            .get(&kind)
            .ok_or_else(|| ServiceError::UnknownHook(kind.to_string()))?;
        hook.call(context).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingHook {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EventHook for CountingHook {
        async fn call(&self, _context: HookContext<'_>) -> ServiceResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn dispatch_reaches_the_registered_hook() {
        let hook = Arc::new(CountingHook::default());
        let mut registry = HookRegistry::new();
        registry.register(EventKind::Init, hook.clone()).unwrap();

        registry
            .dispatch(EventKind::Init, HookContext::Init)
            .await
            .unwrap();
        assert_eq!(hook.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected_at_startup() {
        let mut registry = HookRegistry::new();
        registry
            .register(EventKind::Control, Arc::new(CountingHook::default()))
            .unwrap();
        let err = registry
            .register(EventKind::Control, Arc::new(CountingHook::default()))
            .unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateHook(_)));
    }

    #[tokio::test]
    async fn dispatch_to_unbound_kind_is_an_error() {
        let registry = HookRegistry::new();
        let err = registry
            .dispatch(EventKind::Control, HookContext::Control { command: "db" })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::UnknownHook(_)));
    }
}
