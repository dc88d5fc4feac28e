//! Wire framing: request and reply messages as ordered sequences of byte
//! frames, independent of the transport that carries them (see
//! `rnode-transport` for the ZMQ-specific `Multipart` conversion).
//!
//! Request frames: `[delim, request_type(u32 BE), tag(u64 BE), body, trailing?]`
//! Reply frames:   `[delim, response_type(u32 BE), tag(u64 BE), trailing?]`

use bytes::Bytes;
use thiserror::Error;

use crate::ids::RequestTag;
use crate::message::{RequestParams, ResponsePayload};
use crate::opcode::{RequestType, ResponseType};

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame too short: expected at least {expected} parts, got {actual}")]
    TooShort { expected: usize, actual: usize },
    #[error("expected an empty delimiter frame")]
    MissingDelimiter,
    #[error("unknown request type {0}")]
    InvalidRequestType(u32),
    #[error("unknown response type {0}")]
    InvalidResponseType(u32),
    #[error("malformed tag frame")]
    InvalidTag,
    #[error("msgpack decode failed: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
    #[error("msgpack encode failed: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("transport error: {0}")]
    Transport(String),
}

/// A request as it appears on the wire, before/after opaque body encoding.
#[derive(Debug, Clone)]
pub struct RequestFrame {
    pub tag: RequestTag,
    pub params: RequestParams,
    pub trailing: Option<Bytes>,
}

impl RequestFrame {
    pub fn new(tag: RequestTag, params: RequestParams) -> Self {
        Self {
            tag,
            params,
            trailing: None,
        }
    }

    pub fn with_trailing(mut self, trailing: Bytes) -> Self {
        self.trailing = Some(trailing);
        self
    }

    pub fn request_type(&self) -> RequestType {
        self.params.request_type()
    }

    pub fn to_parts(&self) -> Result<Vec<Bytes>, FrameError> {
        let body = rmp_serde::to_vec_named(&self.params)?;
        let mut parts = vec![
            Bytes::new(),
            Bytes::copy_from_slice(&self.request_type().to_u32().to_be_bytes()),
            Bytes::copy_from_slice(&self.tag.get().to_be_bytes()),
            Bytes::from(body),
        ];
        if let Some(trailing) = &self.trailing {
            parts.push(trailing.clone());
        }
        Ok(parts)
    }

    pub fn from_parts(parts: &[Bytes]) -> Result<Self, FrameError> {
        if parts.len() < 4 {
            return Err(FrameError::TooShort {
                expected: 4,
                actual: parts.len(),
            });
        }
        if !parts[0].is_empty() {
            return Err(FrameError::MissingDelimiter);
        }
        let request_type_raw = read_u32(&parts[1])?;
        RequestType::from_u32(request_type_raw)
            .ok_or(FrameError::InvalidRequestType(request_type_raw))?;
        let tag = RequestTag(read_u64(&parts[2])?);
        let params: RequestParams = rmp_serde::from_slice(&parts[3])?;
        let trailing = parts.get(4).cloned();
        Ok(Self {
            tag,
            params,
            trailing,
        })
    }
}

/// A reply as it appears on the wire.
#[derive(Debug, Clone)]
pub struct ReplyFrame {
    pub tag: RequestTag,
    pub response_type: ResponseType,
    pub payload: Option<ResponsePayload>,
}

impl ReplyFrame {
    pub fn ok(tag: RequestTag, payload: ResponsePayload) -> Self {
        Self {
            tag,
            response_type: ResponseType::Ok,
            payload: Some(payload),
        }
    }

    pub fn error(tag: RequestTag, response_type: ResponseType) -> Self {
        debug_assert_ne!(response_type, ResponseType::Ok);
        Self {
            tag,
            response_type,
            payload: None,
        }
    }

    pub fn to_parts(&self) -> Result<Vec<Bytes>, FrameError> {
        let mut parts = vec![
            Bytes::new(),
            Bytes::copy_from_slice(&self.response_type.to_u32().to_be_bytes()),
            Bytes::copy_from_slice(&self.tag.get().to_be_bytes()),
        ];
        if let Some(payload) = &self.payload {
            parts.push(Bytes::from(rmp_serde::to_vec_named(payload)?));
        }
        Ok(parts)
    }

    pub fn from_parts(parts: &[Bytes]) -> Result<Self, FrameError> {
        if parts.len() < 3 {
            return Err(FrameError::TooShort {
                expected: 3,
                actual: parts.len(),
            });
        }
        if !parts[0].is_empty() {
            return Err(FrameError::MissingDelimiter);
        }
        let response_type_raw = read_u32(&parts[1])?;
        let response_type = ResponseType::from_u32(response_type_raw)
            .ok_or(FrameError::InvalidResponseType(response_type_raw))?;
        let tag = RequestTag(read_u64(&parts[2])?);
        let payload = match parts.get(3) {
            Some(bytes) => Some(rmp_serde::from_slice(bytes)?),
            None => None,
        };
        Ok(Self {
            tag,
            response_type,
            payload,
        })
    }
}

fn read_u32(b: &Bytes) -> Result<u32, FrameError> {
    let arr: [u8; 4] = b.as_ref().try_into().map_err(|_| FrameError::InvalidTag)?;
    Ok(u32::from_be_bytes(arr))
}

fn read_u64(b: &Bytes) -> Result<u64, FrameError> {
    let arr: [u8; 8] = b.as_ref().try_into().map_err(|_| FrameError::InvalidTag)?;
    Ok(u64::from_be_bytes(arr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ObjectId;

    #[test]
    fn request_frame_roundtrip() {
        let frame = RequestFrame::new(
            RequestTag(42),
            RequestParams::Read {
                object: ObjectId::from("vol-1"),
                offset: 4096,
                size: 4096,
            },
        );
        let parts = frame.to_parts().unwrap();
        assert!(parts[0].is_empty());
        let back = RequestFrame::from_parts(&parts).unwrap();
        assert_eq!(back.tag, frame.tag);
        assert_eq!(back.params, frame.params);
    }

    #[test]
    fn request_frame_with_trailing_roundtrip() {
        let frame = RequestFrame::new(
            RequestTag(1),
            RequestParams::Write {
                object: ObjectId::from("vol-1"),
                offset: 0,
                data: vec![],
            },
        )
        .with_trailing(Bytes::from_static(&[0x5A; 64]));
        let parts = frame.to_parts().unwrap();
        assert_eq!(parts.len(), 5);
        let back = RequestFrame::from_parts(&parts).unwrap();
        assert_eq!(back.trailing.unwrap().as_ref(), &[0x5A; 64][..]);
    }

    #[test]
    fn reply_frame_ok_roundtrip() {
        let reply = ReplyFrame::ok(
            RequestTag(9),
            ResponsePayload::Write {
                size_written: 4096,
                dtl_in_sync: false,
            },
        );
        let parts = reply.to_parts().unwrap();
        let back = ReplyFrame::from_parts(&parts).unwrap();
        assert_eq!(back.tag, reply.tag);
        assert_eq!(back.response_type, ResponseType::Ok);
        assert_eq!(back.payload, reply.payload);
    }

    #[test]
    fn reply_frame_error_has_no_payload() {
        let reply = ReplyFrame::error(RequestTag(3), ResponseType::ObjectNotRunningHere);
        let parts = reply.to_parts().unwrap();
        assert_eq!(parts.len(), 3);
        let back = ReplyFrame::from_parts(&parts).unwrap();
        assert!(back.payload.is_none());
        assert_eq!(back.response_type, ResponseType::ObjectNotRunningHere);
    }

    #[test]
    fn missing_delimiter_is_rejected() {
        let parts = vec![
            Bytes::from_static(b"not-empty"),
            Bytes::copy_from_slice(&0u32.to_be_bytes()),
            Bytes::copy_from_slice(&0u64.to_be_bytes()),
        ];
        assert!(matches!(
            ReplyFrame::from_parts(&parts),
            Err(FrameError::MissingDelimiter)
        ));
    }

    #[test]
    fn too_short_frame_is_rejected() {
        let parts = vec![Bytes::new()];
        assert!(matches!(
            ReplyFrame::from_parts(&parts),
            Err(FrameError::TooShort { .. })
        ));
    }
}
