use std::time::Duration;

/// Largest payload carried by a single data frame. Longer submissions are
/// truncated.
pub const PAYLOAD_MAX: usize = 1024;

/// Smallest window size either engine accepts.
pub const WINDOW_MIN: usize = 1;
/// Largest window size either engine accepts. Sequence numbers span twice
/// the window, so 128 keeps them inside one byte.
pub const WINDOW_MAX: usize = 128;

/// Time an in-flight frame waits for its acknowledgement before it is
/// retransmitted.
pub const RTO: Duration = Duration::from_millis(250);

/// Period of the retransmission sweep on the sending side.
pub const TICK: Duration = Duration::from_millis(100);

/// Expiries tolerated for one frame before the session declares the peer
/// unreachable.
pub const MAX_RETRIES: u32 = 25;

/// Upper bound on received payloads buffered for the application.
pub const Q_CAPACITY: usize = 1000;

/// On-wire size of a data frame: sequence number (1), padding (3), payload
/// length (4), payload region, checksum (4).
pub const DATA_FRAME_LEN: usize = 8 + PAYLOAD_MAX + 4;

/// On-wire size of an ACK frame: ack number (1), padding (3), checksum (4).
pub const ACK_FRAME_LEN: usize = 8;
