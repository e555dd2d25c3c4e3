//! Stateless conversion between queries and wire-format messages.

use crate::error::{DecodeError, EncodeError};
use crate::message::Message;
use crate::parser::PacketParser;
use crate::question::Question;
use crate::record_type::RecordType;
use crate::writer::PacketWriter;

/// Builds a single-question request for `name` with recursion desired.
pub fn encode_query(name: &str, record_type: RecordType, transaction_id: u16) -> Result<Vec<u8>, EncodeError> {
    let message = Message::query(transaction_id, Question::new(name, record_type));

    PacketWriter::from(&message).write()
}

/// Parses a complete datagram, expanding compressed names.
pub fn decode_message(bytes: &[u8]) -> Result<Message, DecodeError> {
    PacketParser::new(bytes).parse()
}

/// Serializes an arbitrary message, used to build responses.
pub fn encode_message(message: &Message) -> Result<Vec<u8>, EncodeError> {
    PacketWriter::from(message).write()
}
