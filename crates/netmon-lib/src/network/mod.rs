//! Default interface liveness
//!
//! The default route's interface is resolved once at startup; after that
//! only its up/down flag is re-read each cycle.

mod linux;

pub use linux::{parse_default_route, parse_interface_flags, LinuxHostNetwork, IFF_UP};

use crate::error::LivenessError;
use crate::models::InterfaceState;
use std::sync::Arc;
use tracing::warn;

/// Host network-state queries
pub trait HostNetwork: Send + Sync {
    /// Interface carrying the default IPv4 route, if any
    fn default_route_interface(&self) -> Result<Option<String>, LivenessError>;

    /// Whether `name` reports up; `Ok(false)` when the interface does not exist
    fn interface_up(&self, name: &str) -> Result<bool, LivenessError>;
}

/// Liveness check for the default interface
#[derive(Clone)]
pub struct InterfaceLivenessCheck {
    host: Arc<dyn HostNetwork>,
}

impl InterfaceLivenessCheck {
    pub fn new(host: Arc<dyn HostNetwork>) -> Self {
        Self { host }
    }

    /// Resolve the default interface; query failures are logged and yield `None`
    pub fn resolve_default_interface(&self) -> Option<String> {
        match self.host.default_route_interface() {
            Ok(name) => name,
            Err(e) => {
                warn!(error = %e, "Unable to resolve the default interface");
                None
            }
        }
    }

    /// Check a resolved interface; fails only if the host query fails
    pub fn is_interface_up(&self, name: &str) -> Result<bool, LivenessError> {
        self.host.interface_up(name)
    }

    /// Current state of `name`; an unresolved interface is down without a query
    pub fn status(&self, name: Option<&str>) -> Result<InterfaceState, LivenessError> {
        match name {
            Some(name) => Ok(InterfaceState::new(name, self.is_interface_up(name)?)),
            None => Ok(InterfaceState::unresolved()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Host whose answers are fixed up front
    struct StaticHost {
        route: Result<Option<String>, ()>,
        up: Result<bool, ()>,
        queries: AtomicUsize,
    }

    impl StaticHost {
        fn new(route: Result<Option<String>, ()>, up: Result<bool, ()>) -> Self {
            Self {
                route,
                up,
                queries: AtomicUsize::new(0),
            }
        }
    }

    fn query_failure() -> LivenessError {
        LivenessError::Io {
            path: PathBuf::from("/proc/net/route"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        }
    }

    impl HostNetwork for StaticHost {
        fn default_route_interface(&self) -> Result<Option<String>, LivenessError> {
            self.route.clone().map_err(|_| query_failure())
        }

        fn interface_up(&self, _name: &str) -> Result<bool, LivenessError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            self.up.map_err(|_| query_failure())
        }
    }

    #[test]
    fn test_resolve_swallows_failures() {
        let check = InterfaceLivenessCheck::new(Arc::new(StaticHost::new(Err(()), Ok(true))));
        assert_eq!(check.resolve_default_interface(), None);
    }

    #[test]
    fn test_resolve_default_interface() {
        let check = InterfaceLivenessCheck::new(Arc::new(StaticHost::new(
            Ok(Some("wlan0".to_string())),
            Ok(true),
        )));
        assert_eq!(check.resolve_default_interface().as_deref(), Some("wlan0"));
    }

    #[test]
    fn test_status_unresolved_skips_query() {
        let host = Arc::new(StaticHost::new(Ok(None), Err(())));
        let check = InterfaceLivenessCheck::new(host.clone());

        let state = check.status(None).unwrap();

        assert_eq!(state, InterfaceState::unresolved());
        assert_eq!(host.queries.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_status_down_is_not_an_error() {
        let check = InterfaceLivenessCheck::new(Arc::new(StaticHost::new(Ok(None), Ok(false))));

        let state = check.status(Some("eth0")).unwrap();

        assert_eq!(state.name(), Some("eth0"));
        assert!(!state.is_up());
    }

    #[test]
    fn test_status_query_failure_propagates() {
        let check = InterfaceLivenessCheck::new(Arc::new(StaticHost::new(Ok(None), Err(()))));
        assert!(check.status(Some("eth0")).is_err());
    }
}
