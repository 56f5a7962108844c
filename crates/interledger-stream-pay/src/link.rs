use async_trait::async_trait;
use interledger_packet::{Fulfill, Prepare, Reject};

/// The result of sending a Prepare: the Fulfill or the Reject that came back.
pub type IlpResult = Result<Fulfill, Reject>;

/// The transport the sender hands ILP Prepare packets to.
///
/// Implementations forward the packet to the first connector and resolve
/// with whatever reply settles it.
#[async_trait]
pub trait Link: Send + Sync {
    async fn send_packet(&self, prepare: Prepare) -> IlpResult;
}

/// A [`Link`] that answers every packet with the given closure.
#[derive(Clone)]
pub struct LinkFn<F> {
    handler: F,
}

/// Create a [`Link`] from a function, mostly useful for tests and simulations.
pub fn link_fn<F>(handler: F) -> LinkFn<F>
where
    F: Fn(Prepare) -> IlpResult + Send + Sync,
{
    LinkFn { handler }
}

#[async_trait]
impl<F> Link for LinkFn<F>
where
    F: Fn(Prepare) -> IlpResult + Send + Sync,
{
    async fn send_packet(&self, prepare: Prepare) -> IlpResult {
        (self.handler)(prepare)
    }
}
