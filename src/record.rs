use std::fmt::{Display, Formatter};
use std::net::{Ipv4Addr, Ipv6Addr};
use crate::error::{DecodeError, EncodeError};
use crate::parser::PacketParser;
use crate::record_type::{DNSClass, RecordType};
use crate::writer::PacketWriter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordData {
    A(Ipv4Addr),
    AAAA(Ipv6Addr),
    NS(String),
    CNAME(String),
    PTR(String),
    MX {
        preference: u16,
        exchange: String
    },
    TXT(Vec<Vec<u8>>),
    SOA {
        mname: String,
        rname: String,
        serial: u32,
        refresh: u32,
        retry: u32,
        expire: u32,
        minimum: u32,
    },
    SRV {
        priority: u16,
        weight: u16,
        port: u16,
        target: String,
    },
    /// Raw RDATA of any type without a dedicated variant.
    Other {
        rtype: RecordType,
        data: Vec<u8>,
    },
}

impl RecordData {
    fn parse(parser: &mut PacketParser, rtype: RecordType, len: usize) -> Result<RecordData, DecodeError> {
        let data = match rtype {
            RecordType::A => {
                if len != 4 {
                    return Err(DecodeError::Malformed("A record length is not 4"));
                }

                RecordData::A(Ipv4Addr::from(parser.next_u32()?))
            },
            RecordType::AAAA => {
                if len != 16 {
                    return Err(DecodeError::Malformed("AAAA record length is not 16"));
                }

                let mut octets = [0u8; 16];
                octets.copy_from_slice(parser.take(16)?);

                RecordData::AAAA(Ipv6Addr::from(octets))
            },
            RecordType::NS => RecordData::NS(parser.parse_domain_name()?),
            RecordType::CNAME => RecordData::CNAME(parser.parse_domain_name()?),
            RecordType::PTR => RecordData::PTR(parser.parse_domain_name()?),
            RecordType::MX => RecordData::MX {
                preference: parser.next_u16()?,
                exchange: parser.parse_domain_name()?,
            },
            RecordType::TXT => {
                let end = parser.offset() + len;
                let mut strings = Vec::new();

                while parser.offset() < end {
                    let n = parser.next()? as usize;
                    strings.push(parser.take(n)?.to_vec());
                }

                RecordData::TXT(strings)
            },
            RecordType::SOA => RecordData::SOA {
                mname: parser.parse_domain_name()?,
                rname: parser.parse_domain_name()?,
                serial: parser.next_u32()?,
                refresh: parser.next_u32()?,
                retry: parser.next_u32()?,
                expire: parser.next_u32()?,
                minimum: parser.next_u32()?,
            },
            RecordType::SRV => RecordData::SRV {
                priority: parser.next_u16()?,
                weight: parser.next_u16()?,
                port: parser.next_u16()?,
                target: parser.parse_domain_name()?,
            },
            other => RecordData::Other {
                rtype: other,
                data: parser.take(len)?.to_vec(),
            },
        };

        Ok(data)
    }

    pub fn bytes(&self) -> Result<Vec<u8>, EncodeError> {
        let res = match self {
            RecordData::A(addr) => addr.octets().to_vec(),
            RecordData::AAAA(addr) => addr.octets().to_vec(),
            RecordData::NS(host) | RecordData::CNAME(host) | RecordData::PTR(host) => {
                PacketWriter::write_domain(host)?
            },
            RecordData::MX { preference, exchange } => {
                let mut res = preference.to_be_bytes().to_vec();
                res.append(&mut PacketWriter::write_domain(exchange)?);

                res
            },
            RecordData::TXT(strings) => {
                let mut res = Vec::new();
                for s in strings {
                    let chunk = &s[..s.len().min(255)];
                    res.push(chunk.len() as u8);
                    res.extend_from_slice(chunk);
                }

                res
            },
            RecordData::SOA { mname, rname, serial, refresh, retry, expire, minimum } => {
                let mut res = PacketWriter::write_domain(mname)?;
                res.append(&mut PacketWriter::write_domain(rname)?);
                for value in [serial, refresh, retry, expire, minimum] {
                    res.extend_from_slice(&value.to_be_bytes());
                }

                res
            },
            RecordData::SRV { priority, weight, port, target } => {
                let mut res = Vec::with_capacity(6);
                res.extend_from_slice(&priority.to_be_bytes());
                res.extend_from_slice(&weight.to_be_bytes());
                res.extend_from_slice(&port.to_be_bytes());
                res.append(&mut PacketWriter::write_domain(target)?);

                res
            },
            RecordData::Other { data, .. } => data.clone(),
        };

        Ok(res)
    }
}

impl Display for RecordData {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordData::A(addr) => write!(f, "{}", addr),
            RecordData::AAAA(addr) => write!(f, "{}", addr),
            RecordData::NS(host) | RecordData::CNAME(host) | RecordData::PTR(host) => {
                write!(f, "{}", host)
            },
            RecordData::MX { preference, exchange } => write!(f, "{} {}", preference, exchange),
            RecordData::TXT(strings) => {
                let joined: Vec<String> = strings.iter()
                    .map(|s| format!("\"{}\"", String::from_utf8_lossy(s)))
                    .collect();

                write!(f, "{}", joined.join(" "))
            },
            RecordData::SOA { mname, rname, serial, refresh, retry, expire, minimum } => write!(
                f,
                "{} {} {} {} {} {} {}",
                mname, rname, serial, refresh, retry, expire, minimum
            ),
            RecordData::SRV { priority, weight, port, target } => {
                write!(f, "{} {} {} {}", priority, weight, port, target)
            },
            RecordData::Other { data, .. } => write!(f, "\\# {}", data.len()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub domain: String,
    pub rtype: RecordType,
    pub rclass: DNSClass,
    pub ttl: u32,
    pub data: RecordData,
}

impl Record {
    pub fn new(domain: &str, ttl: u32, data: RecordData) -> Record {
        let rtype = match &data {
            RecordData::A(_) => RecordType::A,
            RecordData::AAAA(_) => RecordType::AAAA,
            RecordData::NS(_) => RecordType::NS,
            RecordData::CNAME(_) => RecordType::CNAME,
            RecordData::PTR(_) => RecordType::PTR,
            RecordData::MX { .. } => RecordType::MX,
            RecordData::TXT(_) => RecordType::TXT,
            RecordData::SOA { .. } => RecordType::SOA,
            RecordData::SRV { .. } => RecordType::SRV,
            RecordData::Other { rtype, .. } => *rtype,
        };

        Record {
            domain: domain.to_string(),
            rtype,
            rclass: DNSClass::IN,
            ttl,
            data,
        }
    }

    pub fn parse(parser: &mut PacketParser) -> Result<Record, DecodeError> {
        let domain = parser.parse_domain_name()?;

        let rtype = RecordType::from(parser.next_u16()?);
        let rclass = DNSClass::from(parser.next_u16()?);
        let ttl = parser.next_u32()?;
        let len = parser.next_u16()? as usize;

        let start = parser.offset();
        let end = start + len;
        // make sure the whole rdata is there before looking inside it
        parser.range(start, len)?;

        let data = RecordData::parse(parser, rtype, len)?;

        if parser.offset() > end {
            return Err(DecodeError::Malformed("record data overruns its length"));
        }
        parser.seek(end)?;

        Ok(Record {
            domain,
            rtype,
            rclass,
            ttl,
            data,
        })
    }
}

impl Display for Record {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\t{}\t{}\t{}", self.domain, self.ttl, self.rtype, self.data)
    }
}
