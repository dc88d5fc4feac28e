use thiserror::Error;

use crate::frame::FrameError;
use crate::ids::RequestTag;
use crate::opcode::ResponseType;

/// Taxonomy of failures a caller of the remote node client or HA context can
/// observe. Distinguishes local decisions (timeout) from remote-reported
/// outcomes (everything else) so callers can decide what is retriable.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The local deadline for this request elapsed before a reply arrived.
    /// The request has been removed from local bookkeeping; the remote may
    /// still execute it.
    #[error("request {0} timed out waiting for a reply")]
    RequestTimeout(RequestTag),

    /// The remote peer itself reported a timeout handling the request.
    #[error("remote node reported a timeout for request {0}")]
    RemoteTimeout(RequestTag),

    /// The remote peer could not parse or did not recognize the request.
    #[error("remote node rejected request {0} as unknown or malformed")]
    ProtocolError(RequestTag),

    /// The targeted object is not (or no longer) owned by this peer.
    #[error("object is not present on this node (request {0})")]
    ObjectNotHere(RequestTag),

    #[error("write would read/write beyond the end of the volume (request {0})")]
    AccessBeyondEndOfVolume(RequestTag),

    #[error("volume cannot be shrunk to the requested size (request {0})")]
    CannotShrinkVolume(RequestTag),

    #[error("volume cannot grow beyond the configured limit (request {0})")]
    CannotGrowVolumeBeyondLimit(RequestTag),

    /// Catch-all for transport failures, frame decode failures, and
    /// post-reconnect replay failures in HA mode.
    #[error("I/O error: {0}")]
    IOError(String),
}

impl ClientError {
    /// Map a remote [`ResponseType`] that is not `Ok` to its typed failure.
    pub fn from_response_type(tag: RequestTag, response_type: ResponseType) -> Self {
        match response_type {
            ResponseType::Ok => {
                unreachable!("Ok is not a failure response type")
            }
            ResponseType::UnknownRequest => Self::ProtocolError(tag),
            ResponseType::ObjectNotRunningHere => Self::ObjectNotHere(tag),
            ResponseType::Timeout => Self::RemoteTimeout(tag),
            ResponseType::AccessBeyondEndOfVolume => Self::AccessBeyondEndOfVolume(tag),
            ResponseType::CannotShrinkVolume => Self::CannotShrinkVolume(tag),
            ResponseType::CannotGrowVolumeBeyondLimit => Self::CannotGrowVolumeBeyondLimit(tag),
            ResponseType::IOError => Self::IOError(format!("remote I/O error on request {tag}")),
        }
    }

    /// Whether retrying the same request against a (possibly different) peer
    /// is sensible. Semantic rejections are not.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::RequestTimeout(_) | Self::RemoteTimeout(_) | Self::IOError(_)
        )
    }
}

impl From<FrameError> for ClientError {
    fn from(e: FrameError) -> Self {
        Self::IOError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_failure_types() {
        let tag = RequestTag(1);
        assert!(matches!(
            ClientError::from_response_type(tag, ResponseType::UnknownRequest),
            ClientError::ProtocolError(_)
        ));
        assert!(matches!(
            ClientError::from_response_type(tag, ResponseType::ObjectNotRunningHere),
            ClientError::ObjectNotHere(_)
        ));
    }

    #[test]
    fn retriability_matches_taxonomy() {
        assert!(ClientError::RequestTimeout(RequestTag(1)).is_retriable());
        assert!(!ClientError::ProtocolError(RequestTag(1)).is_retriable());
        assert!(!ClientError::ObjectNotHere(RequestTag(1)).is_retriable());
    }
}
