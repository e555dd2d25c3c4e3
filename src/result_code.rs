use std::fmt::{Display, Formatter};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ResultCode {
    #[default]
    NOERROR,
    FORMERR,
    SERVFAIL,
    NXDOMAIN,
    NOTIMP,
    REFUSED,
    Unknown(u8),
}

impl ResultCode {
    pub fn from(value: u8) -> ResultCode {
        match value & 0x0F {
            0 => ResultCode::NOERROR,
            1 => ResultCode::FORMERR,
            2 => ResultCode::SERVFAIL,
            3 => ResultCode::NXDOMAIN,
            4 => ResultCode::NOTIMP,
            5 => ResultCode::REFUSED,
            n => ResultCode::Unknown(n),
        }
    }

    pub fn to_u8(&self) -> u8 {
        match self {
            ResultCode::NOERROR => 0,
            ResultCode::FORMERR => 1,
            ResultCode::SERVFAIL => 2,
            ResultCode::NXDOMAIN => 3,
            ResultCode::NOTIMP => 4,
            ResultCode::REFUSED => 5,
            ResultCode::Unknown(n) => *n,
        }
    }
}

impl Display for ResultCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultCode::Unknown(n) => write!(f, "RCODE{}", n),
            other => write!(f, "{:?}", other),
        }
    }
}
