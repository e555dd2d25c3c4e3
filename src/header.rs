use crate::result_code::ResultCode;

/// Size of the fixed message header on the wire.
pub const HEADER_LEN: usize = 12;

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub id: u16,
    pub response: bool,
    pub opcode: u8,
    pub authoritative: bool,
    pub truncation: bool,
    pub recursion_desired: bool,
    pub recursion_available: bool,
    pub reserved: u8,
    pub code: ResultCode,
    pub question_count: u16,
    pub answer_count: u16,
    pub authority_count: u16,
    pub additional_count: u16
}

impl Header {
    pub fn new_with_id(id: u16) -> Header {
        Header {
            id,
            ..Default::default()
        }
    }

    pub fn with_recursion_desired(mut self) -> Self {
        self.recursion_desired = true;

        self
    }

    pub fn with_question_count(mut self, n: u16) -> Self {
        self.question_count = n;

        self
    }

    pub fn write(&self) -> [u8; HEADER_LEN] {
        let mut res = [0u8; HEADER_LEN];

        res[0..2].copy_from_slice(&self.id.to_be_bytes());
        (res[2], res[3]) = self.write_flags();
        res[4..6].copy_from_slice(&self.question_count.to_be_bytes());
        res[6..8].copy_from_slice(&self.answer_count.to_be_bytes());
        res[8..10].copy_from_slice(&self.authority_count.to_be_bytes());
        res[10..12].copy_from_slice(&self.additional_count.to_be_bytes());

        res
    }

    fn write_flags(&self) -> (u8, u8) {
        let first = self.recursion_desired as u8
            | (self.truncation as u8) << 1
            | (self.authoritative as u8) << 2
            | ((self.opcode & 0x0F) << 3)
            | (self.response as u8) << 7;

        let second = self.code.to_u8() & 0x0F
            | ((self.reserved & 0x07) << 4)
            | (self.recursion_available as u8) << 7;

        (first, second)
    }

    pub fn read_flags(&mut self, first: u8, second: u8) {
        self.response = first & (1 << 7) != 0;
        self.opcode = (first >> 3) & 0x0F;
        self.authoritative = first & (1 << 2) != 0;
        self.truncation = first & (1 << 1) != 0;
        self.recursion_desired = first & 1 != 0;

        self.recursion_available = second & (1 << 7) != 0;
        self.reserved = (second >> 4) & 0x07;
        self.code = ResultCode::from(second & 0x0F);
    }
}
