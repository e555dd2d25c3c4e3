use std::time::Duration;
use anyhow::{bail, Result};

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

enum TimeUnit {
    NanoSecond,
    MicroSecond,
    MilliSecond,
    Second,
    Minute,
    Hour,
    Day,
}

impl TimeUnit {
    fn to_duration(&self, n: u64) -> Option<Duration> {
        let secs = |unit: u64| n.checked_mul(unit).map(Duration::from_secs);

        match self {
            TimeUnit::NanoSecond => Some(Duration::from_nanos(n)),
            TimeUnit::MicroSecond => Some(Duration::from_micros(n)),
            TimeUnit::MilliSecond => Some(Duration::from_millis(n)),
            TimeUnit::Second => Some(Duration::from_secs(n)),
            TimeUnit::Minute => secs(MINUTE),
            TimeUnit::Hour => secs(HOUR),
            TimeUnit::Day => secs(DAY)
        }
    }

    fn from(s: &str) -> Result<Self> {
        match s {
            "d" | "D" => Ok(Self::Day),
            "h" | "H" => Ok(Self::Hour),
            "m" | "M" => Ok(Self::Minute),
            "s" | "S" => Ok(Self::Second),
            "ms" => Ok(Self::MilliSecond),
            "µs" | "us" => Ok(Self::MicroSecond),
            "ns" => Ok(Self::NanoSecond),
            _ => bail!("{} is an invalid time unit", s)
        }
    }
}

/// Parses strings such as `5s`, `1m30s` or `250ms`, summing each part.
pub fn parse(s: &str) -> Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        bail!("empty duration");
    }

    let mut res = Duration::ZERO;
    let mut chars = s.chars().peekable();

    while chars.peek().is_some() {
        let mut num = String::new();
        while let Some(ch) = chars.peek().filter(|ch| ch.is_ascii_digit()) {
            num.push(*ch);
            chars.next();
        }

        let mut unit = String::new();
        while let Some(ch) = chars.peek().filter(|ch| !ch.is_ascii_digit()) {
            unit.push(*ch);
            chars.next();
        }

        if num.is_empty() || unit.is_empty() {
            bail!("{} is an invalid duration", s);
        }

        let n: u64 = num.parse()?;
        let Some(part) = TimeUnit::from(&unit)?.to_duration(n) else {
            bail!("{} overflows a duration", s);
        };
        let Some(sum) = res.checked_add(part) else {
            bail!("{} overflows a duration", s);
        };
        res = sum;
    }

    Ok(res)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn time_units() {
        assert_eq!(parse("12s").ok(), Some(Duration::from_secs(12)));
        assert_eq!(parse("1m10s").ok(), Some(Duration::from_secs(70)));
        assert_eq!(parse("1h15m10s").ok(), Some(Duration::from_secs(HOUR + (15 * MINUTE) + 10)));
        assert_eq!(parse("1s500ms").ok(), Some(Duration::from_millis(1500)));
        assert_eq!(parse("0s").ok(), Some(Duration::ZERO));

        assert_eq!(parse("1G").ok(), None);
        assert_eq!(parse("1h34m23g").ok(), None);
        assert_eq!(parse("12").ok(), None);
        assert_eq!(parse("s").ok(), None);
        assert_eq!(parse("").ok(), None);
    }

    #[test]
    fn overflow_is_an_error() {
        assert!(parse("307445734561825861m").is_err());
        assert!(parse("213503982334602d").is_err());
        assert!(parse("18446744073709551615s1s").is_err());
        assert!(parse("99999999999999999999s").is_err());

        assert_eq!(parse("18446744073709551615s").ok(), Some(Duration::from_secs(u64::MAX)));
    }
}
