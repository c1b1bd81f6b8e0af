//!
//! WebSocket client configuration options
//!

use tungstenite::protocol::WebSocketConfig as TsWebSocketConfig;

///
/// Configuration struct for the native (tungstenite) WebSocket client
///
#[derive(Clone, Debug)]
pub struct WebSocketConfig {
    /// The target minimum size of the write buffer to reach before writing the data
    /// to the underlying stream.
    /// The default value is 128 KiB.
    ///
    /// If set to `0` each message will be eagerly written to the underlying stream.
    pub write_buffer_size: usize,
    /// The max size of the write buffer in bytes. Setting this can provide backpressure
    /// in the case the write buffer is filling up due to write errors.
    /// The default value is unlimited.
    pub max_write_buffer_size: usize,
    /// The maximum size of a message. `None` means no size limit. The default value is 64 MiB.
    pub max_message_size: Option<usize>,
    /// The maximum size of a single message frame. `None` means no size limit. The limit is for
    /// frame payload NOT including the frame header. The default value is 16 MiB.
    pub max_frame_size: Option<usize>,
    /// Disable Nagle's algorithm on the underlying TCP socket.
    pub disable_nagle: bool,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        WebSocketConfig {
            write_buffer_size: 128 * 1024,
            max_write_buffer_size: usize::MAX,
            max_message_size: Some(64 << 20),
            max_frame_size: Some(16 << 20),
            disable_nagle: true,
        }
    }
}

impl From<&WebSocketConfig> for TsWebSocketConfig {
    fn from(config: &WebSocketConfig) -> Self {
        let mut ts_config = TsWebSocketConfig::default();
        ts_config.write_buffer_size = config.write_buffer_size;
        ts_config.max_write_buffer_size = config.max_write_buffer_size;
        ts_config.max_message_size = config.max_message_size;
        ts_config.max_frame_size = config.max_frame_size;
        ts_config
    }
}
