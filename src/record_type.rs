use std::fmt::{Display, Formatter};
use std::str::FromStr;
use anyhow::bail;

#[derive(Default, PartialEq, Eq, Debug, Clone, Hash, Copy)]
pub enum RecordType {
    #[default]
    A, // 1
    NS,
    CNAME,
    SOA,
    PTR,
    MX,
    TXT,
    AAAA, // 28
    SRV, // 33
    OPT, // 41
    // QTYPE
    ANY, // 255
    Unknown(u16),
}

impl RecordType {
    pub fn from(value: u16) -> RecordType {
        match value {
            1 => RecordType::A,
            2 => RecordType::NS,
            5 => RecordType::CNAME,
            6 => RecordType::SOA,
            12 => RecordType::PTR,
            15 => RecordType::MX,
            16 => RecordType::TXT,
            28 => RecordType::AAAA,
            33 => RecordType::SRV,
            41 => RecordType::OPT,
            255 => RecordType::ANY,
            n => RecordType::Unknown(n),
        }
    }

    pub fn to_num(&self) -> u16 {
        match *self {
            RecordType::A => 1,
            RecordType::NS => 2,
            RecordType::CNAME => 5,
            RecordType::SOA => 6,
            RecordType::PTR => 12,
            RecordType::MX => 15,
            RecordType::TXT => 16,
            RecordType::AAAA => 28,
            RecordType::SRV => 33,
            RecordType::OPT => 41,
            RecordType::ANY => 255,
            RecordType::Unknown(n) => n,
        }
    }
}

impl Display for RecordType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordType::Unknown(n) => write!(f, "TYPE{}", n),
            other => write!(f, "{:?}", other),
        }
    }
}

impl FromStr for RecordType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let upper = s.to_uppercase();

        let res = match upper.as_str() {
            "A" => RecordType::A,
            "NS" => RecordType::NS,
            "CNAME" => RecordType::CNAME,
            "SOA" => RecordType::SOA,
            "PTR" => RecordType::PTR,
            "MX" => RecordType::MX,
            "TXT" => RecordType::TXT,
            "AAAA" => RecordType::AAAA,
            "SRV" => RecordType::SRV,
            "ANY" | "*" => RecordType::ANY,
            other => match other.strip_prefix("TYPE").map(u16::from_str) {
                Some(Ok(n)) => RecordType::from(n),
                _ => bail!("{} is not a known record type", s),
            },
        };

        Ok(res)
    }
}

#[derive(Default, PartialEq, Eq, Debug, Clone, Copy)]
pub enum DNSClass {
    #[default]
    IN, // 1
    CH,
    HS,
    ANY,
    Unknown(u16),
}

impl DNSClass {
    pub fn from(value: u16) -> Self {
        match value {
            1 => DNSClass::IN,
            3 => DNSClass::CH,
            4 => DNSClass::HS,
            255 => DNSClass::ANY,
            n => DNSClass::Unknown(n),
        }
    }

    pub fn to_num(&self) -> u16 {
        match *self {
            DNSClass::IN => 1,
            DNSClass::CH => 3,
            DNSClass::HS => 4,
            DNSClass::ANY => 255,
            DNSClass::Unknown(n) => n,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn numeric_codes() {
        assert_eq!(RecordType::from(28), RecordType::AAAA);
        assert_eq!(RecordType::from(99), RecordType::Unknown(99));
        assert_eq!(RecordType::Unknown(99).to_num(), 99);
        assert_eq!(DNSClass::from(1), DNSClass::IN);
        assert_eq!(DNSClass::from(7).to_num(), 7);
    }

    #[test]
    fn parse_names() {
        assert_eq!("aaaa".parse::<RecordType>().ok(), Some(RecordType::AAAA));
        assert_eq!("TYPE65".parse::<RecordType>().ok(), Some(RecordType::Unknown(65)));
        assert_eq!(RecordType::Unknown(65).to_string(), "TYPE65");
        assert!("BOGUS".parse::<RecordType>().is_err());
    }
}
