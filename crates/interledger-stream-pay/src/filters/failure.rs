use super::StreamPacketFilter;
use crate::config::StreamPayerConfig;
use crate::error::{SendState, StreamPayerError};
use crate::request::{StreamReply, StreamRequest};
use interledger_packet::{ErrorClass, ErrorCode};
use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tracing::{error, warn};

/// Ends the payment on errors no retry can fix, or when retrying stops
/// making progress.
pub struct FailureFilter {
    max_consecutive_rejects: u32,
    idle_timeout: Duration,
    state: Mutex<FailureState>,
}

struct FailureState {
    terminal: Option<StreamPayerError>,
    consecutive_rejects: u32,
    last_fulfill: Instant,
}

impl FailureState {
    fn fail(&mut self, err: StreamPayerError) {
        if self.terminal.is_none() {
            error!("{}", err);
            self.terminal = Some(err);
        }
    }
}

impl FailureFilter {
    pub fn new(config: &StreamPayerConfig) -> Self {
        FailureFilter {
            max_consecutive_rejects: config.max_consecutive_rejects,
            idle_timeout: config.idle_timeout(),
            state: Mutex::new(FailureState {
                terminal: None,
                consecutive_rejects: 0,
                last_fulfill: Instant::now(),
            }),
        }
    }
}

impl StreamPacketFilter for FailureFilter {
    fn next_state(&self, _request: &mut StreamRequest) -> SendState {
        let mut state = self.state.lock();
        if let Some(terminal) = &state.terminal {
            return terminal.state();
        }
        if state.last_fulfill.elapsed() > self.idle_timeout {
            let err = StreamPayerError::new(
                SendState::IdleTimeout,
                format!(
                    "No packet was fulfilled in the last {:?}",
                    self.idle_timeout
                ),
            );
            state.fail(err);
            return SendState::IdleTimeout;
        }
        SendState::Ready
    }

    fn on_reply(&self, request: &StreamRequest, reply: &StreamReply) {
        let mut state = self.state.lock();
        if reply.receiver().map(|receiver| receiver.closed).unwrap_or(false) {
            state.fail(StreamPayerError::new(
                SendState::ClosedByRecipient,
                format!(
                    "Receiver closed the connection in reply to packet {}",
                    request.sequence
                ),
            ));
            return;
        }

        let reject = match reply.reject() {
            Some(reject) => reject,
            None => {
                state.consecutive_rejects = 0;
                state.last_fulfill = Instant::now();
                return;
            }
        };

        let is_final = match reject.code.class() {
            ErrorClass::Final => {
                reject.code != ErrorCode::F08_AMOUNT_TOO_LARGE
                    && !(reject.code == ErrorCode::F99_APPLICATION_ERROR
                        && reject.receiver.is_some())
            }
            ErrorClass::Temporary | ErrorClass::Relative => false,
            ErrorClass::Unknown => true,
        };
        if is_final {
            state.fail(StreamPayerError::new(
                SendState::ConnectorError,
                format!(
                    "Packet {} was rejected with final error {:?}: {}",
                    request.sequence, reject.code, reject.message
                ),
            ));
            return;
        }

        state.consecutive_rejects += 1;
        if state.consecutive_rejects > self.max_consecutive_rejects {
            let err = StreamPayerError::new(
                SendState::ConnectorError,
                format!(
                    "{} packets in a row were rejected, the last was packet {} with {:?}: {}",
                    state.consecutive_rejects, request.sequence, reject.code, reject.message
                ),
            );
            state.fail(err);
        } else {
            warn!(
                "Packet {} was rejected with {:?}: {}",
                request.sequence, reject.code, reject.message
            );
        }
    }

    fn failure(&self) -> Option<StreamPayerError> {
        self.state.lock().terminal.clone()
    }
}
