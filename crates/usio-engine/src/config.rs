use std::time::Duration;

use usio_frame::FrameConfig;

/// Engine behavior settings.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long one attempt waits for its status sentence; `None` waits
    /// indefinitely. Default: 500 ms.
    pub response_timeout: Option<Duration>,
    /// Attempts per high-level operation. Default: 3.
    pub attempts: u32,
    /// Capacity of the outgoing command queue; senders block when it is full. Default: 16.
    pub tx_queue_capacity: usize,
    /// Evict unclaimed sentences older than this. Default: keep forever.
    pub pending_max_age: Option<Duration>,
    /// Sentence codec settings for the receiver.
    pub frame: FrameConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            response_timeout: Some(Duration::from_millis(500)),
            attempts: 3,
            tx_queue_capacity: 16,
            pending_max_age: None,
            frame: FrameConfig::default(),
        }
    }
}
