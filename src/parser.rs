use crate::error::DecodeError;
use crate::header::{Header, HEADER_LEN};
use crate::message::Message;
use crate::question::Question;
use crate::record::Record;
use crate::record_type::{DNSClass, RecordType};
use crate::writer::MAX_NAME_LEN;

type Result<T> = std::result::Result<T, DecodeError>;

pub struct PacketParser<'a> {
    buf: &'a [u8],
    offset: usize
}

impl<'a> PacketParser<'a> {
    pub fn new(data: &'a [u8]) -> PacketParser<'a> {
        PacketParser {
            buf: data,
            offset: 0,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn seek(&mut self, n: usize) -> Result<()> {
        if n > self.buf.len() {
            return Err(DecodeError::Truncated(n));
        }

        self.offset = n;

        Ok(())
    }

    pub fn next(&mut self) -> Result<u8> {
        let res = self.get(self.offset)?;
        self.offset += 1;

        Ok(res)
    }

    pub fn next_u16(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;

        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn next_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;

        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Consumes `len` bytes starting at the current offset.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let res = self.range(self.offset, len)?;
        self.offset += len;

        Ok(res)
    }

    pub fn get(&self, n: usize) -> Result<u8> {
        self.buf.get(n).copied().ok_or(DecodeError::Truncated(n))
    }

    pub fn range(&self, start: usize, len: usize) -> Result<&'a [u8]> {
        let buf: &'a [u8] = self.buf;

        buf.get(start..start + len).ok_or(DecodeError::Truncated(buf.len()))
    }

    pub fn parse(&mut self) -> Result<Message> {
        let mut message = Message::default();

        message.header = self.parse_header()?;

        for _ in 0..message.header.question_count {
            message.questions.push(self.parse_question()?);
        }

        for _ in 0..message.header.answer_count {
            message.answers.push(Record::parse(self)?);
        }

        for _ in 0..message.header.authority_count {
            message.authorities.push(Record::parse(self)?);
        }

        for _ in 0..message.header.additional_count {
            message.additionals.push(Record::parse(self)?);
        }

        Ok(message)
    }

    pub fn parse_header(&mut self) -> Result<Header> {
        if self.buf.len() < HEADER_LEN {
            return Err(DecodeError::Truncated(self.buf.len()));
        }

        // seek to the beginning of the packet to parse the header.
        self.seek(0)?;

        let mut header = Header::new_with_id(self.next_u16()?);
        let (first, second) = (self.next()?, self.next()?);
        header.read_flags(first, second);
        header.question_count = self.next_u16()?;
        header.answer_count = self.next_u16()?;
        header.authority_count = self.next_u16()?;
        header.additional_count = self.next_u16()?;

        Ok(header)
    }

    pub fn parse_question(&mut self) -> Result<Question> {
        let name = self.parse_domain_name()?;
        let qtype = self.next_u16()?;
        let qclass = self.next_u16()?;

        Ok(Question::new_with_class(name, RecordType::from(qtype), DNSClass::from(qclass)))
    }

    /// Reads a possibly compressed name at the current offset.
    ///
    /// Every compression pointer must point strictly before the previous
    /// one, which rules out loops and forward references.
    pub fn parse_domain_name(&mut self) -> Result<String> {
        let mut res = String::new();

        let mut pos = self.offset;
        let mut limit = pos;
        let mut jumped = false;
        let mut wire_len = 0usize;

        loop {
            let len = self.get(pos)?;

            match len & 0xC0 {
                0xC0 => {
                    let next_byte = self.get(pos + 1)? as usize;
                    let target = (((len & 0x3F) as usize) << 8) | next_byte;

                    if target >= limit {
                        return Err(DecodeError::MalformedName(pos));
                    }

                    if !jumped {
                        self.seek(pos + 2)?;
                        jumped = true;
                    }

                    limit = target;
                    pos = target;
                },
                0x00 => {
                    pos += 1;
                    wire_len += len as usize + 1;

                    if wire_len > MAX_NAME_LEN {
                        return Err(DecodeError::MalformedName(pos - 1));
                    }

                    if len == 0 {
                        break;
                    }

                    if !res.is_empty() {
                        res.push('.');
                    }

                    let bytes = self.range(pos, len as usize)?;
                    res.push_str(&String::from_utf8_lossy(bytes).to_lowercase());

                    pos += len as usize;
                },
                // 0x40 and 0x80 label types are reserved
                _ => return Err(DecodeError::MalformedName(pos)),
            }
        }

        if !jumped {
            self.seek(pos)?;
        }

        if res.is_empty() {
            res.push('.');
        }

        Ok(res)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn header(qd: u16, an: u16) -> Vec<u8> {
        let mut buf = vec![0x12, 0x34, 0x81, 0x80];
        buf.extend_from_slice(&qd.to_be_bytes());
        buf.extend_from_slice(&an.to_be_bytes());
        buf.extend_from_slice(&[0, 0, 0, 0]);

        buf
    }

    #[test]
    fn short_header_is_truncated() {
        let err = PacketParser::new(&[0x12, 0x34, 0x81]).parse().unwrap_err();
        assert!(matches!(err, DecodeError::Truncated(_)));
    }

    #[test]
    fn question_count_beyond_buffer_is_truncated() {
        let buf = header(2, 0);
        let err = PacketParser::new(&buf).parse().unwrap_err();
        assert!(matches!(err, DecodeError::Truncated(_)));
    }

    #[test]
    fn backward_pointer_is_expanded() {
        let mut buf = header(2, 0);
        // example.com A IN at offset 12
        buf.extend_from_slice(&[7, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 3, b'c', b'o', b'm', 0, 0, 1, 0, 1]);
        // www + pointer to offset 12
        buf.extend_from_slice(&[3, b'W', b'W', b'W', 0xC0, 12, 0, 28, 0, 1]);

        let message = PacketParser::new(&buf).parse().unwrap();
        assert_eq!(message.questions[0].domain, "example.com");
        assert_eq!(message.questions[1].domain, "www.example.com");
        assert_eq!(message.questions[1].qtype, RecordType::AAAA);
    }

    #[test]
    fn self_pointer_is_rejected() {
        let mut buf = header(1, 0);
        buf.extend_from_slice(&[0xC0, 12, 0, 1, 0, 1]);

        let err = PacketParser::new(&buf).parse().unwrap_err();
        assert_eq!(err, DecodeError::MalformedName(12));
    }

    #[test]
    fn forward_pointer_is_rejected() {
        let mut buf = header(1, 0);
        buf.extend_from_slice(&[0xC0, 18, 0, 1, 0, 1, 1, b'a', 0]);

        let err = PacketParser::new(&buf).parse().unwrap_err();
        assert_eq!(err, DecodeError::MalformedName(12));
    }

    #[test]
    fn pointer_loop_is_rejected() {
        let mut buf = header(1, 0);
        // offset 12: label "a" then pointer to 12, a loop through the label
        buf.extend_from_slice(&[1, b'a', 0xC0, 12, 0, 1, 0, 1]);
        let mut parser = PacketParser::new(&buf);
        parser.parse_header().unwrap();
        parser.seek(14).unwrap();
        // pointer at 14 targets 12, whose label leads back to the pointer at 14
        let err = parser.parse_domain_name().unwrap_err();
        assert_eq!(err, DecodeError::MalformedName(14));
    }

    #[test]
    fn reserved_label_type_is_rejected() {
        let mut buf = header(1, 0);
        buf.extend_from_slice(&[0x41, b'a', 0, 0, 1, 0, 1]);

        let err = PacketParser::new(&buf).parse().unwrap_err();
        assert_eq!(err, DecodeError::MalformedName(12));
    }

    #[test]
    fn root_name_decodes_as_dot() {
        let mut buf = header(1, 0);
        buf.extend_from_slice(&[0, 0, 2, 0, 1]);

        let message = PacketParser::new(&buf).parse().unwrap();
        assert_eq!(message.questions[0].domain, ".");
        assert_eq!(message.questions[0].qtype, RecordType::NS);
    }
}
