//! Core errors.

#![allow(missing_docs)]

use smol_str::SmolStr;
use thiserror::Error;

use crate::catalog::FieldSlot;
use crate::reconcile::RowMode;

/// Errors raised by catalog parsing, scope parsing and row operations.
///
/// Catalog lookups never fail; a missing endpoint resolves to an empty record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Address is not six hexadecimal digits.
    #[error("invalid address '{0}'")]
    InvalidAddress(SmolStr),

    /// Page location does not name a modem or device scope.
    #[error("invalid link scope '{0}'")]
    InvalidScope(SmolStr),

    /// JSON document does not match the expected shape.
    #[error("invalid payload: {0}")]
    InvalidPayload(SmolStr),

    /// No defined link row with this id.
    #[error("unknown defined link '{0}'")]
    UnknownLink(SmolStr),

    /// No undefined or unknown link row with this key.
    #[error("unknown link key '{0}'")]
    UnknownKey(SmolStr),

    /// Operation requires the row to be in another mode.
    #[error("link '{id}' is {actual:?}, expected {expected:?}")]
    InvalidRowMode {
        id: SmolStr,
        expected: RowMode,
        actual: RowMode,
    },

    /// Responder key is not offered by the row's responder selector.
    #[error("responder '{key}' is not offered for link '{id}'")]
    UnknownResponder { id: SmolStr, key: SmolStr },

    /// Raw value is not offered by the field control.
    #[error("value {value} is not offered by {slot} of link '{id}'")]
    OptionNotOffered {
        id: SmolStr,
        slot: FieldSlot,
        value: u8,
    },

    /// Fix requested for a link that is not broken.
    #[error("link '{0}' does not need fixing")]
    NothingToFix(SmolStr),
}
