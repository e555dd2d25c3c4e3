//! An asynchronous DNS resolver channel over UDP.
//!
//! A [`Channel`] owns one UDP association to a resolver and correlates
//! responses with the queries in flight on it. Each query completes exactly
//! once: with a decoded answer, a timeout, an interruption when the channel
//! is destroyed, or an encode/transport error.

pub mod args;
pub mod channel;
pub mod codec;
pub mod config;
pub mod duration;
pub mod error;
pub mod fs;
pub mod header;
pub mod message;
pub mod parser;
pub mod query_table;
pub mod question;
pub mod record;
pub mod record_type;
pub mod result_code;
pub mod timer;
pub mod transport;
pub mod writer;

pub use channel::{Channel, ChannelHandle, ChannelOptions, ChannelState, Query, QueryResult};
pub use codec::{decode_message, encode_message, encode_query};
pub use error::{DecodeError, EncodeError, Error};
pub use record::{Record, RecordData};
pub use record_type::{DNSClass, RecordType};
pub use result_code::ResultCode;
pub use transport::{Connect, Transport, UdpConnect};
