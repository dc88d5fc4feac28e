//! Wire types shared by the remote node client and the HA context: request
//! and response bodies, frame encoding, opcodes, and the client-facing error
//! taxonomy. Transport-agnostic — `rnode-transport` adapts these frames onto
//! ZMQ multipart messages.

pub mod error;
pub mod frame;
pub mod ids;
pub mod message;
pub mod opcode;

pub use error::ClientError;
pub use frame::{FrameError, ReplyFrame, RequestFrame};
pub use ids::{ObjectId, PeerUri, RequestId, RequestTag};
pub use message::{RequestParams, ResponsePayload};
pub use opcode::{RequestType, ResponseType};
