//! Connectivity ports
//!
//! Two collaborators feed the engine's belief about network availability:
//!
//! - a push-style signal source that emits [`ConnectivityEvent`]s on a
//!   channel (platform network monitors, the daemon's probe timer)
//! - a pull-style [`IConnectivityProbe`] that can be asked on demand, used
//!   before a manual "sync now" and as a redundancy check when the push
//!   signal is unreliable

use serde::{Deserialize, Serialize};

/// Edge notification from a connectivity signal source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectivityEvent {
    Online,
    Offline,
}

impl ConnectivityEvent {
    /// Builds the event matching a reachability reading
    pub fn from_reachable(reachable: bool) -> Self {
        if reachable {
            ConnectivityEvent::Online
        } else {
            ConnectivityEvent::Offline
        }
    }

    pub fn is_online(&self) -> bool {
        matches!(self, ConnectivityEvent::Online)
    }
}

impl std::fmt::Display for ConnectivityEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectivityEvent::Online => write!(f, "online"),
            ConnectivityEvent::Offline => write!(f, "offline"),
        }
    }
}

/// Port trait for an on-demand reachability check
///
/// Implementations must not return errors: any failure to reach the
/// target simply means "not reachable".
#[async_trait::async_trait]
pub trait IConnectivityProbe: Send + Sync {
    /// Returns true if the remote endpoint currently looks reachable
    async fn is_reachable(&self) -> bool;
}
