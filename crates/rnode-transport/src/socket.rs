//! Thin wrappers over `tmq`'s DEALER/ROUTER sockets: trait aliases so callers
//! can hold a boxed socket without naming tmq's concrete stream/sink types,
//! plus constructors applying the linger and reconnect defaults every
//! long-lived peer connection in this crate wants.

use futures::{Sink, Stream};
use tmq::{Context as ZmqContext, Multipart, TmqError};

pub use tmq::Multipart as RawMultipart;

/// Default ZMQ `ZMQ_LINGER`: drop unsent messages immediately on close
/// rather than blocking shutdown waiting for the peer.
pub const DEFAULT_LINGER_MS: i32 = 0;

/// Initial backoff ZMQ itself uses between reconnect attempts.
pub const DEFAULT_RECONNECT_IVL_MS: i32 = 100;

/// Cap on ZMQ's internal reconnect backoff.
pub const DEFAULT_RECONNECT_IVL_MAX_MS: i32 = 5_000;

/// A duplex, message-framed socket to exactly one peer.
pub trait DealerSocket:
    Stream<Item = Result<Multipart, TmqError>> + Sink<Multipart, Error = TmqError> + Unpin + Send
{
}

impl<T> DealerSocket for T where
    T: Stream<Item = Result<Multipart, TmqError>> + Sink<Multipart, Error = TmqError> + Unpin + Send
{
}

/// A duplex, message-framed socket bound to accept many peers, each
/// message prefixed with the originating peer's routing identity frame.
pub trait RouterSocket:
    Stream<Item = Result<Multipart, TmqError>> + Sink<Multipart, Error = TmqError> + Unpin + Send
{
}

impl<T> RouterSocket for T where
    T: Stream<Item = Result<Multipart, TmqError>> + Sink<Multipart, Error = TmqError> + Unpin + Send
{
}

pub type BoxedDealerSocket = Box<dyn DealerSocket>;
pub type BoxedRouterSocket = Box<dyn RouterSocket>;

/// Connect a DEALER socket to `endpoint` with this crate's linger/reconnect
/// defaults applied.
pub fn create_dealer_and_connect(
    ctx: &ZmqContext,
    endpoint: &str,
) -> Result<BoxedDealerSocket, TmqError> {
    let socket = tmq::dealer(ctx)
        .set_linger(DEFAULT_LINGER_MS)
        .set_reconnect_ivl(DEFAULT_RECONNECT_IVL_MS)
        .set_reconnect_ivl_max(DEFAULT_RECONNECT_IVL_MAX_MS)
        .connect(endpoint)?
        .finish();
    Ok(Box::new(socket))
}

/// Bind a ROUTER socket at `endpoint` with this crate's linger default
/// applied. Used by the mock-peer test harness and by any in-process test
/// double standing in for a cluster node.
pub fn create_router_and_bind(
    ctx: &ZmqContext,
    endpoint: &str,
) -> Result<BoxedRouterSocket, TmqError> {
    let socket = tmq::router(ctx)
        .set_linger(DEFAULT_LINGER_MS)
        .bind(endpoint)?
        .finish();
    Ok(Box::new(socket))
}
