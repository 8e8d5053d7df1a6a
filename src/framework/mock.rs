//! # Mock Utilities
//!
//! Test a typed client wrapper (such as [`OrderClient`](crate::clients::OrderClient))
//! without spawning an actor: the mock client sends to a channel the test owns, the
//! test inspects each request and answers it through the `respond_to` sender.
//!
//! | Feature | Mock client | Real actor |
//! |---------|-------------|------------|
//! | **Determinism** | Fully deterministic | Subject to scheduler |
//! | **State** | None, the test answers | Real aggregate state |
//! | **Error Injection** | Easy (send any `Err`) | Requires specific state |
//!
//! ```rust
//! use order_lifecycle::framework::mock::{create_mock_client, expect_get};
//! use order_lifecycle::model::Order;
//!
//! # async fn demo() {
//! let (client, mut receiver) = create_mock_client::<Order>(4);
//! let pending = tokio::spawn(async move { client.get().await.is_err() });
//! let responder = expect_get(&mut receiver).await.expect("Expected Get request");
//! drop(responder); // simulate an actor that dies mid-request
//! assert!(pending.await.unwrap());
//! # }
//! ```

use crate::framework::client::EntityClient;
use crate::framework::entity::ActorEntity;
use crate::framework::message::{EntityRequest, Response};
use tokio::sync::mpsc;

/// Creates a client whose requests arrive on the returned receiver.
pub fn create_mock_client<T: ActorEntity>(
    buffer_size: usize,
) -> (EntityClient<T>, mpsc::Receiver<EntityRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (EntityClient::new(sender), receiver)
}

/// Waits for the next request and returns its responder if it is a `Get`.
pub async fn expect_get<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<EntityRequest<T>>,
) -> Option<Response<T, T::Error>> {
    match receiver.recv().await {
        Some(EntityRequest::Get { respond_to }) => Some(respond_to),
        _ => None,
    }
}

/// Waits for the next request and returns its action and responder if it is an `Action`.
pub async fn expect_action<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<EntityRequest<T>>,
) -> Option<(T::Action, Response<T::ActionResult, T::Error>)> {
    match receiver.recv().await {
        Some(EntityRequest::Action { action, respond_to }) => Some((action, respond_to)),
        _ => None,
    }
}
