//! Normalize-then-publish, the whole decision path of one request.

use std::sync::Arc;

use tracing::debug;

use crate::errors::DispatchError;
use crate::normalize::normalize;
use crate::presence::PresenceUpdate;
use crate::sink::PresenceSink;

/// Hands normalized presences to a shared [`PresenceSink`].
#[derive(Clone)]
pub struct Dispatcher {
    sink: Arc<dyn PresenceSink>,
}

impl Dispatcher {
    /// Create a dispatcher over `sink`.
    pub fn new(sink: Arc<dyn PresenceSink>) -> Self {
        Self { sink }
    }

    /// Normalize `body` and publish the result.
    ///
    /// The sink is not called when normalization fails. On success the
    /// published update is returned for logging.
    pub async fn dispatch(&self, body: &[u8]) -> Result<PresenceUpdate, DispatchError> {
        let update = normalize(body)?;
        debug!(
            state = %update.state,
            link_count = update.link_count(),
            has_time_range = update.time_range.is_some(),
            "publishing presence"
        );
        self.sink.publish(&update).await?;
        Ok(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{TransmissionError, ValidationError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every published update; optionally fails.
    #[derive(Default)]
    struct Recorded {
        published: Mutex<Vec<PresenceUpdate>>,
        fail_with: Option<TransmissionError>,
    }

    #[async_trait]
    impl PresenceSink for Recorded {
        async fn publish(&self, update: &PresenceUpdate) -> Result<(), TransmissionError> {
            if let Some(err) = &self.fail_with {
                return Err(err.clone());
            }
            self.published.lock().unwrap().push(update.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn publishes_normalized_update() {
        let sink = Arc::new(Recorded::default());
        let dispatcher = Dispatcher::new(sink.clone());

        let update = dispatcher
            .dispatch(br#"{"activity_name": "Obby", "activity_details": "Stage 3"}"#)
            .await
            .unwrap();

        assert_eq!(update.state, "Obby");
        let published = sink.published.lock().unwrap();
        assert_eq!(published.as_slice(), &[update]);
    }

    #[tokio::test]
    async fn malformed_body_never_reaches_sink() {
        let sink = Arc::new(Recorded::default());
        let dispatcher = Dispatcher::new(sink.clone());

        let err = dispatcher.dispatch(b"{not json").await.unwrap_err();

        assert!(matches!(
            err,
            DispatchError::Validation(ValidationError::MalformedPayload(_))
        ));
        assert!(sink.published.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn sink_failure_is_transmission_error() {
        let sink = Arc::new(Recorded {
            fail_with: Some(TransmissionError::Unavailable("closed".into())),
            ..Recorded::default()
        });
        let dispatcher = Dispatcher::new(sink);

        let err = dispatcher.dispatch(b"{}").await.unwrap_err();

        assert_eq!(
            err,
            DispatchError::Transmission(TransmissionError::Unavailable("closed".into()))
        );
    }
}
