use crate::record_type::{DNSClass, RecordType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub domain: String,
    pub qtype: RecordType,
    pub qclass: DNSClass
}

impl Question {
    pub fn new(name: &str, qtype: RecordType) -> Question {
        Question {
            domain: name.to_string(),
            qtype,
            qclass: DNSClass::IN,
        }
    }

    pub fn new_with_class(name: String, qtype: RecordType, qclass: DNSClass) -> Question {
        Question {
            domain: name,
            qtype,
            qclass,
        }
    }

    /// Whether `other` asks the same thing, ignoring name case and a trailing dot.
    pub fn matches(&self, other: &Question) -> bool {
        self.qtype == other.qtype
            && self.qclass == other.qclass
            && normalize(&self.domain) == normalize(&other.domain)
    }
}

fn normalize(name: &str) -> String {
    let trimmed = name.strip_suffix('.').unwrap_or(name);

    if trimmed.is_empty() {
        return ".".to_string();
    }

    trimmed.to_ascii_lowercase()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn matching_ignores_case_and_root_dot() {
        let asked = Question::new("Example.COM.", RecordType::A);

        assert!(asked.matches(&Question::new("example.com", RecordType::A)));
        assert!(!asked.matches(&Question::new("example.com", RecordType::AAAA)));
        assert!(!asked.matches(&Question::new("example.org", RecordType::A)));
        assert!(Question::new(".", RecordType::NS).matches(&Question::new("", RecordType::NS)));
    }
}
