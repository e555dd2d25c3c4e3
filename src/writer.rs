use crate::error::EncodeError;
use crate::message::Message;
use crate::question::Question;
use crate::record::Record;

pub const MAX_LABEL_LEN: usize = 63;
pub const MAX_NAME_LEN: usize = 255;

pub struct PacketWriter<'a> {
    message: &'a Message,
    buf: Vec<u8>,
}

impl<'a> PacketWriter<'a> {
    pub fn from(message: &'a Message) -> PacketWriter<'a> {
        PacketWriter {
            message,
            buf: Vec::with_capacity(512),
        }
    }

    /// Serializes the message without name compression.
    ///
    /// Section counts in the header are taken from the sections themselves.
    pub fn write(mut self) -> Result<Vec<u8>, EncodeError> {
        let mut header = self.message.header.clone();
        header.question_count = self.message.questions.len() as u16;
        header.answer_count = self.message.answers.len() as u16;
        header.authority_count = self.message.authorities.len() as u16;
        header.additional_count = self.message.additionals.len() as u16;

        self.buf.extend_from_slice(&header.write());

        for question in &self.message.questions {
            Self::write_question(&mut self.buf, question)?;
        }

        for section in [&self.message.answers, &self.message.authorities, &self.message.additionals] {
            for record in section {
                Self::write_record(&mut self.buf, record)?;
            }
        }

        Ok(self.buf)
    }

    fn write_question(buf: &mut Vec<u8>, question: &Question) -> Result<(), EncodeError> {
        buf.append(&mut Self::write_domain(&question.domain)?);
        buf.extend_from_slice(&question.qtype.to_num().to_be_bytes());
        buf.extend_from_slice(&question.qclass.to_num().to_be_bytes());

        Ok(())
    }

    fn write_record(buf: &mut Vec<u8>, record: &Record) -> Result<(), EncodeError> {
        buf.append(&mut Self::write_domain(&record.domain)?);
        buf.extend_from_slice(&record.rtype.to_num().to_be_bytes());
        buf.extend_from_slice(&record.rclass.to_num().to_be_bytes());
        buf.extend_from_slice(&record.ttl.to_be_bytes());

        let mut data = record.data.bytes()?;
        buf.extend_from_slice(&(data.len() as u16).to_be_bytes());
        buf.append(&mut data);

        Ok(())
    }

    /// Writes `domain` as a sequence of length-prefixed labels.
    ///
    /// A single trailing dot is accepted, and `.` or an empty string is the root.
    pub fn write_domain(domain: &str) -> Result<Vec<u8>, EncodeError> {
        let mut res = Vec::with_capacity(domain.len() + 2);
        let trimmed = domain.strip_suffix('.').unwrap_or(domain);

        if !trimmed.is_empty() {
            for label in trimmed.split('.') {
                if label.is_empty() {
                    return Err(EncodeError::EmptyLabel(domain.to_string()));
                }

                if label.len() > MAX_LABEL_LEN {
                    return Err(EncodeError::LabelTooLong(label.to_string()));
                }

                if let Some(ch) = label.chars().find(|ch| !is_valid_char(*ch)) {
                    return Err(EncodeError::InvalidCharacter(ch));
                }

                res.push(label.len() as u8);
                res.extend_from_slice(label.as_bytes());
            }
        }

        res.push(0x00);

        if res.len() > MAX_NAME_LEN {
            return Err(EncodeError::NameTooLong);
        }

        Ok(res)
    }
}

fn is_valid_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '*'
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn domain_labels() {
        assert_eq!(
            PacketWriter::write_domain("example.com").unwrap(),
            vec![7, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 3, b'c', b'o', b'm', 0]
        );
        assert_eq!(PacketWriter::write_domain("example.com.").unwrap().len(), 13);
        assert_eq!(PacketWriter::write_domain(".").unwrap(), vec![0]);
        assert_eq!(PacketWriter::write_domain("").unwrap(), vec![0]);
    }

    #[test]
    fn label_limits() {
        let label = "a".repeat(63);
        assert!(PacketWriter::write_domain(&label).is_ok());

        let label = "a".repeat(64);
        assert_eq!(
            PacketWriter::write_domain(&format!("{}.com", label)),
            Err(EncodeError::LabelTooLong(label))
        );
    }

    #[test]
    fn name_limit() {
        // 4 labels of 63 bytes take 257 bytes on the wire once the root is added
        let long = vec!["a".repeat(63); 4].join(".");
        assert_eq!(PacketWriter::write_domain(&long), Err(EncodeError::NameTooLong));

        let fits = format!("{}.{}", vec!["a".repeat(63); 3].join("."), "a".repeat(61));
        assert_eq!(PacketWriter::write_domain(&fits).unwrap().len(), 255);
    }

    #[test]
    fn invalid_names() {
        assert_eq!(
            PacketWriter::write_domain("exa mple.com"),
            Err(EncodeError::InvalidCharacter(' '))
        );
        assert_eq!(
            PacketWriter::write_domain("a..b"),
            Err(EncodeError::EmptyLabel("a..b".to_string()))
        );
        assert!(PacketWriter::write_domain("ünicode.com").is_err());
        assert!(PacketWriter::write_domain("_sip._udp.example.com").is_ok());
    }
}
