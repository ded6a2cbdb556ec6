//! Open/closed lifecycle shared by the clients.

use crate::error::{ClientError, Result};

/// Lifecycle of a client. Transitions only from `Open` to `Closed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClientState {
    /// Accepting operations.
    #[default]
    Open,
    /// Closed; every operation fails with [`ClientError::ClientClosed`].
    Closed,
}

impl ClientState {
    /// `Ok` while open.
    pub fn ensure_open(self) -> Result<()> {
        match self {
            Self::Open => Ok(()),
            Self::Closed => Err(ClientError::ClientClosed),
        }
    }

    /// Move to `Closed`, returning whether this call made the transition.
    pub fn close(&mut self) -> bool {
        let was_open = *self == Self::Open;
        *self = Self::Closed;
        was_open
    }
}
