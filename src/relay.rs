//! Single-subscriber event relay
//!
//! A [`ProgressRelay`] is the job's end of a live event channel; the matching
//! [`RelayStream`] is the subscriber's end. Once the relay is closed (terminal
//! event delivered, subscriber gone, or an explicit close) every later send is
//! a silent no-op, so a job never has to care how its subscriber went away.

use crate::types::ProgressEvent;
use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Job-side end of a subscriber channel
#[derive(Debug)]
pub struct ProgressRelay {
    sender: Option<mpsc::UnboundedSender<ProgressEvent>>,
    subscriber_gone: CancellationToken,
}

impl ProgressRelay {
    /// Create a relay together with the stream its subscriber reads
    pub fn channel() -> (ProgressRelay, RelayStream) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let subscriber_gone = CancellationToken::new();

        (
            ProgressRelay {
                sender: Some(sender),
                subscriber_gone: subscriber_gone.clone(),
            },
            RelayStream {
                receiver,
                subscriber_gone,
            },
        )
    }

    /// Deliver one event, in order
    ///
    /// Returns whether the event was handed to the subscriber. A terminal
    /// event closes the relay after it is delivered.
    pub fn send(&mut self, event: ProgressEvent) -> bool {
        let Some(sender) = self.sender.as_ref() else {
            return false;
        };

        let terminal = event.is_terminal();
        if sender.send(event).is_err() {
            tracing::debug!("subscriber went away, closing relay");
            self.close();
            return false;
        }

        if terminal {
            self.close();
        }
        true
    }

    /// Close the relay; the subscriber's stream ends after what it already has
    ///
    /// Safe to call any number of times.
    pub fn close(&mut self) {
        self.sender = None;
    }

    /// Whether sends are still delivered
    pub fn is_closed(&self) -> bool {
        self.sender.is_none() || self.subscriber_gone.is_cancelled()
    }

    /// Resolves once the subscriber has dropped its stream
    pub fn disconnected(&self) -> impl Future<Output = ()> + Send + 'static {
        self.subscriber_gone.clone().cancelled_owned()
    }
}

/// Subscriber-side end of a relay
///
/// Yields the job's events in order and ends after the terminal one.
/// Dropping it tells the job its subscriber is gone.
#[derive(Debug)]
pub struct RelayStream {
    receiver: mpsc::UnboundedReceiver<ProgressEvent>,
    subscriber_gone: CancellationToken,
}

impl Stream for RelayStream {
    type Item = ProgressEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for RelayStream {
    fn drop(&mut self) {
        self.subscriber_gone.cancel();
    }
}
