use std::sync::Arc;

use skein_metrics::{RPC_REQUESTS, inc_int_counter_vec};
use skein_peer::PeerId;
use skein_rate_limiter::{RateLimiter, ResourceKind};
use tracing::{debug, trace};

use crate::{
    error::RpcError,
    messages::{
        meta_data::{MetaData, MetaDataVersion},
        ping::Ping,
    },
    metadata_factory::MetadataMessagesFactory,
    peer_metadata::PeerMetadataStore,
    protocol_id::{SupportedProtocol, extract_metadata_version},
};

/// Where a single inbound request is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Received,
    RateChecked,
    Rejected,
    Processed,
    ResponseSent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// A response was written and the stream completed.
    Responded,
    /// The request was refused by the rate limiter; nothing was sent.
    Dropped,
    /// The stream was completed with an error.
    Failed,
}

impl HandlerOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandlerOutcome::Responded => "responded",
            HandlerOutcome::Dropped => "dropped",
            HandlerOutcome::Failed => "failed",
        }
    }
}

/// Outbound half of a req/resp stream.
pub trait ResponseCallback<T>: Send {
    fn respond_and_complete(&mut self, response: T);

    fn complete_with_error(&mut self, error: RpcError);
}

pub struct RpcProtocolHandler {
    rate_limiter: Arc<RateLimiter>,
    metadata_factory: Arc<MetadataMessagesFactory>,
    peer_metadata: Arc<PeerMetadataStore>,
}

impl RpcProtocolHandler {
    pub fn new(
        rate_limiter: Arc<RateLimiter>,
        metadata_factory: Arc<MetadataMessagesFactory>,
        peer_metadata: Arc<PeerMetadataStore>,
    ) -> Self {
        Self {
            rate_limiter,
            metadata_factory,
            peer_metadata,
        }
    }

    pub fn metadata_factory(&self) -> &Arc<MetadataMessagesFactory> {
        &self.metadata_factory
    }

    pub fn peer_metadata(&self) -> &Arc<PeerMetadataStore> {
        &self.peer_metadata
    }

    fn admit(&self, peer_id: &PeerId, protocol: &str) -> bool {
        trace!(?peer_id, protocol, state = ?RequestState::Received, "Inbound request");
        if !self.rate_limiter.approve(peer_id, ResourceKind::Requests, 1) {
            debug!(
                ?peer_id,
                protocol,
                state = ?RequestState::Rejected,
                "Dropping rate limited request"
            );
            return false;
        }
        trace!(?peer_id, protocol, state = ?RequestState::RateChecked, "Request admitted");
        true
    }

    fn finish(protocol: &str, outcome: HandlerOutcome) -> HandlerOutcome {
        inc_int_counter_vec(&RPC_REQUESTS, &[protocol, outcome.as_str()]);
        outcome
    }

    pub fn handle_ping(
        &self,
        peer_id: &PeerId,
        request: Ping,
        callback: &mut dyn ResponseCallback<Ping>,
    ) -> HandlerOutcome {
        let protocol = SupportedProtocol::PingV1.message_name();
        if !self.admit(peer_id, protocol) {
            return Self::finish(protocol, HandlerOutcome::Dropped);
        }

        if self.peer_metadata.update_seq_number(peer_id, request.data) {
            debug!(?peer_id, seq_number = request.data, "Peer metadata is stale");
        }
        let response = self.metadata_factory.create_ping();
        trace!(
            ?peer_id,
            state = ?RequestState::Processed,
            seq_number = response.data,
            "Ping processed"
        );

        callback.respond_and_complete(response);
        trace!(?peer_id, state = ?RequestState::ResponseSent, "Ping response sent");
        Self::finish(protocol, HandlerOutcome::Responded)
    }

    pub fn handle_metadata(
        &self,
        peer_id: &PeerId,
        protocol_id: &str,
        callback: &mut dyn ResponseCallback<MetaData>,
    ) -> HandlerOutcome {
        let protocol = SupportedProtocol::GetMetaDataV1.message_name();
        if !self.admit(peer_id, protocol) {
            return Self::finish(protocol, HandlerOutcome::Dropped);
        }

        let version = match extract_metadata_version(protocol_id)
            .and_then(MetaDataVersion::from_protocol_version)
        {
            Ok(version) => version,
            Err(err) => {
                debug!(?peer_id, protocol_id, ?err, "Failing metadata request");
                callback.complete_with_error(err);
                return Self::finish(protocol, HandlerOutcome::Failed);
            }
        };

        let response = self.metadata_factory.create_metadata(version);
        trace!(?peer_id, state = ?RequestState::Processed, ?version, "Metadata processed");

        callback.respond_and_complete(response);
        trace!(?peer_id, state = ?RequestState::ResponseSent, "Metadata response sent");
        Self::finish(protocol, HandlerOutcome::Responded)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use skein_rate_limiter::{RateLimitConfig, StubTimeProvider};
    use tracing_test::traced_test;

    use super::*;

    struct RecordingCallback<T> {
        responses: Vec<T>,
        errors: Vec<RpcError>,
    }

    impl<T> Default for RecordingCallback<T> {
        fn default() -> Self {
            Self {
                responses: vec![],
                errors: vec![],
            }
        }
    }

    impl<T: Send> ResponseCallback<T> for RecordingCallback<T> {
        fn respond_and_complete(&mut self, response: T) {
            self.responses.push(response);
        }

        fn complete_with_error(&mut self, error: RpcError) {
            self.errors.push(error);
        }
    }

    fn handler(max_requests: u64) -> (RpcProtocolHandler, Arc<StubTimeProvider>, PeerId) {
        let time = Arc::new(StubTimeProvider::with_time(Duration::from_secs(100)));
        let config = RateLimitConfig::new(500, 2000, max_requests, 1);
        let rate_limiter = Arc::new(RateLimiter::new(config, time.clone()));
        let peer_id = PeerId::random();
        rate_limiter.on_peer_connected(peer_id);
        let peer_metadata = Arc::new(PeerMetadataStore::new());
        peer_metadata.on_peer_connected(peer_id);
        let handler = RpcProtocolHandler::new(
            rate_limiter,
            Arc::new(MetadataMessagesFactory::new(4)),
            peer_metadata,
        );
        (handler, time, peer_id)
    }

    #[test]
    fn test_ping_responds_with_local_seq_number() {
        let (handler, _, peer_id) = handler(10);
        handler.metadata_factory().update_attestation_subnets(&[3]);

        let mut callback = RecordingCallback::default();
        let outcome = handler.handle_ping(&peer_id, Ping::new(7), &mut callback);

        assert_eq!(outcome, HandlerOutcome::Responded);
        assert_eq!(callback.responses, vec![Ping::new(1)]);
        assert_eq!(
            handler.peer_metadata().metadata(&peer_id).map(|meta| meta.seq_number),
            Some(7)
        );
    }

    #[test]
    #[traced_test]
    fn test_rate_limited_requests_are_dropped_silently() {
        let (handler, time, peer_id) = handler(2);
        let mut callback = RecordingCallback::default();

        let mut ping = || handler.handle_ping(&peer_id, Ping::new(0), &mut callback);
        assert_eq!(ping(), HandlerOutcome::Responded);
        assert_eq!(ping(), HandlerOutcome::Responded);
        assert_eq!(ping(), HandlerOutcome::Dropped);
        assert!(logs_contain("Dropping rate limited request"));

        time.advance_time_by(Duration::from_secs(60));
        assert_eq!(ping(), HandlerOutcome::Responded);
        assert_eq!(callback.responses.len(), 3);
        assert!(callback.errors.is_empty());
    }

    #[test]
    fn test_unknown_peer_is_dropped() {
        let (handler, _, _) = handler(10);
        let mut callback = RecordingCallback::<Ping>::default();
        let outcome = handler.handle_ping(&PeerId::random(), Ping::new(0), &mut callback);
        assert_eq!(outcome, HandlerOutcome::Dropped);
        assert!(callback.responses.is_empty());
    }

    #[test]
    fn test_ping_racing_disconnect_leaves_no_metadata_behind() {
        let (handler, _, peer_id) = handler(10);
        // Metadata already dropped while the request was in flight.
        handler.peer_metadata().remove(&peer_id);

        let mut callback = RecordingCallback::default();
        let outcome = handler.handle_ping(&peer_id, Ping::new(3), &mut callback);

        assert_eq!(outcome, HandlerOutcome::Responded);
        assert_eq!(callback.responses, vec![Ping::new(0)]);
        assert!(handler.peer_metadata().is_empty());
    }

    #[test]
    fn test_metadata_version_selects_schema() {
        let (handler, _, peer_id) = handler(10);

        for (protocol, expected) in [
            (SupportedProtocol::GetMetaDataV1, MetaDataVersion::Phase0),
            (SupportedProtocol::GetMetaDataV2, MetaDataVersion::Altair),
            (SupportedProtocol::GetMetaDataV3, MetaDataVersion::Fulu),
        ] {
            let mut callback = RecordingCallback::default();
            let outcome =
                handler.handle_metadata(&peer_id, &protocol.protocol_id(), &mut callback);
            assert_eq!(outcome, HandlerOutcome::Responded);
            assert_eq!(callback.responses.len(), 1);
            assert_eq!(callback.responses[0].version(), expected);
        }
    }

    #[test]
    fn test_unknown_metadata_version_fails_only_that_request() {
        let (handler, _, peer_id) = handler(10);

        let mut callback = RecordingCallback::default();
        let outcome = handler.handle_metadata(
            &peer_id,
            "/eth2/beacon_chain/req/metadata/9/ssz_snappy",
            &mut callback,
        );
        assert_eq!(outcome, HandlerOutcome::Failed);
        assert!(callback.responses.is_empty());
        assert_eq!(callback.errors, vec![RpcError::UnknownProtocolVersion(9)]);

        let mut callback = RecordingCallback::default();
        let outcome = handler.handle_metadata(
            &peer_id,
            &SupportedProtocol::GetMetaDataV3.protocol_id(),
            &mut callback,
        );
        assert_eq!(outcome, HandlerOutcome::Responded);
        assert_eq!(callback.responses[0].custody_group_count(), Some(4));
    }
}
