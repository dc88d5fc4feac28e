//! DEALER/ROUTER transport glue: trait aliases over `tmq`'s async ZMQ
//! sockets, connection constructors with this codebase's linger/reconnect
//! defaults, and (behind the `testing` feature) an in-process mock peer used
//! by `rnode-client` and `rnode-ha`'s test suites.

pub mod socket;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use socket::{
    create_dealer_and_connect, create_router_and_bind, BoxedDealerSocket, BoxedRouterSocket,
    DealerSocket, RouterSocket,
};
pub use tmq::Context as ZmqContext;
