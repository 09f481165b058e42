use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Lifecycle shared by work permits and pending requests.
///
/// `Pending` is the only non-terminal state. A terminal state can only be
/// "re-entered" as an idempotent no-op.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

/// Result of asking the state machine to move to a new status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The move is legal and changes the stored status.
    Apply(RequestStatus),
    /// Already in the requested terminal state; nothing to do.
    NoOp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
#[display(fmt = "cannot move from {} to {}", from, to)]
pub struct IllegalTransition {
    pub from: RequestStatus,
    pub to: RequestStatus,
}

impl RequestStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }

    pub fn transition(self, to: RequestStatus) -> Result<Transition, IllegalTransition> {
        use RequestStatus::*;

        match (self, to) {
            (Pending, Approved) | (Pending, Rejected) => Ok(Transition::Apply(to)),
            (Approved, Approved) | (Rejected, Rejected) => Ok(Transition::NoOp),
            (from, to) => Err(IllegalTransition { from, to }),
        }
    }
}
