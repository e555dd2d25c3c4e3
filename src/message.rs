use crate::header::Header;
use crate::question::Question;
use crate::record::Record;

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<Record>,
    pub authorities: Vec<Record>,
    pub additionals: Vec<Record>,
}

impl Message {
    /// A single-question query with recursion desired.
    pub fn query(id: u16, question: Question) -> Message {
        Message {
            header: Header::new_with_id(id).with_recursion_desired().with_question_count(1),
            questions: vec![question],
            ..Default::default()
        }
    }

    /// An empty response to `req`, echoing its id and questions.
    pub fn response_to(req: &Message) -> Message {
        let mut header = Header::new_with_id(req.header.id);
        header.response = true;
        header.opcode = req.header.opcode;
        header.recursion_desired = req.header.recursion_desired;
        header.recursion_available = true;

        Message {
            header,
            questions: req.questions.clone(),
            ..Default::default()
        }
    }
}
