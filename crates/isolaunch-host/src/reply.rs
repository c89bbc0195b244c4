//! The reply obligation: exactly one terminal reply per launch.
//!
//! Every launch request creates one [`ReplyObligation`]. Fulfilling it
//! (success or failure) consumes the token, so a second reply cannot be
//! expressed. Cancellation discards the obligation explicitly, which
//! suppresses the reply while the instance is driven to a terminal state.
//! Dropping an unfulfilled, undiscarded obligation is a coordinator bug
//! and is logged as such.

use isolaunch_core::channel::ChannelHandleSet;
use tokio::sync::oneshot;
use tracing::{debug, error};

/// Terminal reply payload delivered to the requester.
#[derive(Debug)]
pub enum LaunchReply {
    /// Launch succeeded; all four channel handles are populated.
    Success(ChannelHandleSet),
    /// Launch failed with a human-readable error.
    Failure(String),
}

/// Move-only token representing the single outstanding reply.
#[derive(Debug)]
pub struct ReplyObligation {
    sender: Option<oneshot::Sender<LaunchReply>>,
}

impl ReplyObligation {
    /// Creates an obligation and the receiver the requester awaits.
    #[must_use]
    pub fn new() -> (Self, oneshot::Receiver<LaunchReply>) {
        let (tx, rx) = oneshot::channel();
        (Self { sender: Some(tx) }, rx)
    }

    /// Fulfills the obligation with the channel handle set.
    pub fn succeed(mut self, channels: ChannelHandleSet) {
        if let Some(sender) = self.sender.take() {
            if sender.send(LaunchReply::Success(channels)).is_err() {
                debug!("requester gone before success reply");
            }
        }
    }

    /// Fulfills the obligation with a failure message.
    pub fn fail(mut self, message: impl Into<String>) {
        let message = message.into();
        if let Some(sender) = self.sender.take() {
            if sender.send(LaunchReply::Failure(message)).is_err() {
                debug!("requester gone before failure reply");
            }
        }
    }

    /// Discards the obligation without replying (cancellation path).
    pub fn discard(mut self) {
        self.sender.take();
        debug!("reply obligation discarded");
    }
}

impl Drop for ReplyObligation {
    fn drop(&mut self) {
        if self.sender.is_some() {
            // Every code path must fulfill or discard before dropping.
            error!("reply obligation dropped without fulfillment");
        }
    }
}

#[cfg(test)]
mod tests {
    use isolaunch_core::channel::{ChannelHandle, ChannelKind};

    use super::*;

    fn channel_set() -> ChannelHandleSet {
        ChannelHandleSet::new(
            ChannelHandle { id: 1, kind: ChannelKind::HostApi },
            ChannelHandle { id: 2, kind: ChannelKind::ClientApi },
            ChannelHandle { id: 3, kind: ChannelKind::Trusted },
            ChannelHandle { id: 4, kind: ChannelKind::ManifestService },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_succeed_delivers_channels() {
        let (obligation, rx) = ReplyObligation::new();
        obligation.succeed(channel_set());
        match rx.await.unwrap() {
            LaunchReply::Success(set) => assert_eq!(set.trusted().id, 3),
            LaunchReply::Failure(msg) => panic!("unexpected failure: {msg}"),
        }
    }

    #[tokio::test]
    async fn test_fail_delivers_message() {
        let (obligation, rx) = ReplyObligation::new();
        obligation.fail("invalid manifest");
        match rx.await.unwrap() {
            LaunchReply::Failure(msg) => assert_eq!(msg, "invalid manifest"),
            LaunchReply::Success(_) => panic!("unexpected success"),
        }
    }

    #[tokio::test]
    async fn test_discard_suppresses_reply() {
        let (obligation, rx) = ReplyObligation::new();
        obligation.discard();
        assert!(rx.await.is_err());
    }

    #[tokio::test]
    async fn test_succeed_tolerates_gone_requester() {
        let (obligation, rx) = ReplyObligation::new();
        drop(rx);
        obligation.succeed(channel_set());
    }
}
