//! Minimal HTML rendering of LMS questions for the exam client.
//!
//! Question text and option labels are LMS-authored HTML and are embedded
//! as-is. Anything else interpolated into markup goes through
//! [`escape_html`].

use crate::models::lms::{AnswerOptionRow, QuestionKind, QuestionRow};

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Input group name shared by all options of one slot
pub fn choice_group_name(slot: i64) -> String {
    format!("slot_{}", slot)
}

pub fn text_input_name(slot: i64) -> String {
    format!("slot_{}_text", slot)
}

pub fn render_question(slot: i64, question: &QuestionRow, options: &[AnswerOptionRow]) -> String {
    let body = match QuestionKind::from_qtype(&question.qtype) {
        QuestionKind::Choice => render_choices(slot, options),
        QuestionKind::FreeText => render_text_input(slot),
    };

    format!(
        "<div class=\"question\" data-slot=\"{slot}\" data-qtype=\"{qtype}\">\
         <div class=\"qtext\">{text}</div>{body}</div>",
        slot = slot,
        qtype = escape_html(&question.qtype),
        text = question.questiontext,
        body = body,
    )
}

fn render_choices(slot: i64, options: &[AnswerOptionRow]) -> String {
    let name = choice_group_name(slot);
    let mut html = String::from("<div class=\"answers\">");
    for option in options {
        html.push_str(&format!(
            "<label class=\"answer\"><input type=\"radio\" name=\"{name}\" value=\"{id}\"> \
             <span class=\"answer-text\">{label}</span></label>",
            name = name,
            id = option.id,
            label = option.answer,
        ));
    }
    html.push_str("</div>");
    html
}

fn render_text_input(slot: i64) -> String {
    format!(
        "<div class=\"answers\"><input type=\"text\" name=\"{}\" autocomplete=\"off\"></div>",
        text_input_name(slot)
    )
}

/// Content shown in place of a question that could not be loaded
pub fn render_fallback(attempt_id: i64, slot: i64, error: &str) -> String {
    format!(
        "<div class=\"question question-unavailable\" data-slot=\"{}\">\
         <p>Question {} of attempt {} is temporarily unavailable.</p>\
         <p class=\"error\">{}</p></div>",
        slot,
        slot,
        attempt_id,
        escape_html(error)
    )
}
