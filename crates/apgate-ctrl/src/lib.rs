// apgate-ctrl: Async client for hostapd's control-interface protocol

pub mod channel;
pub mod error;
pub mod pool;
pub mod station;

pub use channel::{ControlChannel, REPLY_BUFFER_SIZE};
pub use error::{CtrlError, ParseError};
pub use pool::ChannelPool;
pub use station::{Station, parse_station_block};
