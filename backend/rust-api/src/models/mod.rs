pub mod answer;
pub mod lms;
pub mod question;

pub use answer::{AnswerAck, AnswerSubmission, StepResponse};
pub use question::{QuestionMeta, QuestionPayload, QuestionRequest};
