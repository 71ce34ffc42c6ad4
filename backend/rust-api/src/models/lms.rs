//! Row shapes read from the LMS question engine tables.

use sqlx::{any::AnyRow, FromRow, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct AttemptRow {
    pub usage_id: i64,
    pub user_id: i64,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct QuestionAttemptRow {
    pub id: i64,
    pub question_id: i64,
    pub max_mark: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionRow {
    pub id: i64,
    pub qtype: String,
    pub questiontext: String,
}

impl<'r> FromRow<'r, AnyRow> for QuestionRow {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            qtype: text_column(row, "qtype")?,
            questiontext: text_column(row, "questiontext")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOptionRow {
    pub id: i64,
    pub answer: String,
    pub fraction: f64,
}

impl<'r> FromRow<'r, AnyRow> for AnswerOptionRow {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            answer: text_column(row, "answer")?,
            fraction: row.try_get("fraction")?,
        })
    }
}

/// Reads a text column that the driver may hand over as bytes.
///
/// MySQL `TEXT`/`LONGTEXT` columns arrive as blobs through the Any driver.
fn text_column(row: &AnyRow, column: &str) -> Result<String, sqlx::Error> {
    match row.try_get::<String, _>(column) {
        Ok(text) => Ok(text),
        Err(sqlx::Error::ColumnDecode { .. }) => {
            let bytes: Vec<u8> = row.try_get(column)?;
            String::from_utf8(bytes).map_err(|e| sqlx::Error::ColumnDecode {
                index: column.to_string(),
                source: Box::new(e),
            })
        }
        Err(e) => Err(e),
    }
}

/// How a question is rendered for the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    Choice,
    FreeText,
}

impl QuestionKind {
    pub fn from_qtype(qtype: &str) -> Self {
        match qtype.trim() {
            "multichoice" | "truefalse" => QuestionKind::Choice,
            _ => QuestionKind::FreeText,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choice_types() {
        assert_eq!(QuestionKind::from_qtype("multichoice"), QuestionKind::Choice);
        assert_eq!(QuestionKind::from_qtype("truefalse"), QuestionKind::Choice);
    }

    #[test]
    fn test_other_types_are_free_text() {
        for qtype in ["essay", "shortanswer", "numerical", ""] {
            assert_eq!(QuestionKind::from_qtype(qtype), QuestionKind::FreeText);
        }
    }
}
