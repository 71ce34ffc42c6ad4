use async_trait::async_trait;
use sqlx::AnyPool;

use crate::error::{ExamError, ExamResult};
use crate::metrics::{track_db_operation, ANSWERS_SAVED_TOTAL};
use crate::models::lms::{
    AnswerOptionRow, AttemptRow, QuestionAttemptRow, QuestionKind, QuestionRow,
};
use crate::models::{QuestionPayload, StepResponse};
use crate::services::exam_service::QuestionSource;
use crate::services::render;
use crate::utils::time::unix_now;

/// State recorded on every step written by this service
pub const SUBMITTED_STEP_STATE: &str = "complete";

/// Fully-qualified names of the LMS tables touched by the adapter
#[derive(Debug, Clone)]
pub struct LmsTables {
    pub quiz_attempts: String,
    pub question_attempts: String,
    pub question: String,
    pub question_answers: String,
    pub steps: String,
    pub step_data: String,
}

impl LmsTables {
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            quiz_attempts: format!("{}quiz_attempts", prefix),
            question_attempts: format!("{}question_attempts", prefix),
            question: format!("{}question", prefix),
            question_answers: format!("{}question_answers", prefix),
            steps: format!("{}question_attempt_steps", prefix),
            step_data: format!("{}question_attempt_step_data", prefix),
        }
    }
}

/// Maps exam requests onto the LMS question engine schema.
///
/// Reads walk quiz attempt -> usage -> question attempt -> question; writes
/// append a step plus its data rows and touch the attempt's `timemodified`.
#[derive(Clone)]
pub struct LmsAdapter {
    pool: AnyPool,
    tables: LmsTables,
}

impl LmsAdapter {
    pub fn new(pool: AnyPool, table_prefix: &str) -> Self {
        Self {
            pool,
            tables: LmsTables::with_prefix(table_prefix),
        }
    }

    pub async fn get_question_payload(
        &self,
        attempt_id: i64,
        slot: i64,
    ) -> ExamResult<QuestionPayload> {
        let attempt = self.resolve_attempt(attempt_id).await?;
        let question_attempt = self.question_attempt(attempt.usage_id, slot).await?;
        let question = self.question(question_attempt.question_id).await?;

        let options = match QuestionKind::from_qtype(&question.qtype) {
            QuestionKind::Choice => self.answer_options(question.id).await?,
            QuestionKind::FreeText => Vec::new(),
        };

        tracing::debug!(
            attempt_id,
            slot,
            question_id = question.id,
            qtype = %question.qtype,
            options = options.len(),
            "Rendering question"
        );

        Ok(QuestionPayload::new(
            attempt_id,
            slot,
            render::render_question(slot, &question, &options),
            question_attempt.max_mark,
        ))
    }

    pub async fn save_answer(
        &self,
        attempt_id: i64,
        slot: i64,
        response: &serde_json::Value,
    ) -> ExamResult<()> {
        let step = StepResponse::from_value(response)?;
        let attempt = self.resolve_attempt(attempt_id).await?;
        let question_attempt = self.question_attempt(attempt.usage_id, slot).await?;

        let sequence_number = track_db_operation("append_step", async {
            let mut tx = self.pool.begin().await?;
            let now = unix_now();

            let sequence_number: i64 = sqlx::query_scalar(&format!(
                "SELECT COALESCE(MAX(sequencenumber) + 1, 0) FROM {} WHERE questionattemptid = ?",
                self.tables.steps
            ))
            .bind(question_attempt.id)
            .fetch_one(&mut *tx)
            .await?;

            sqlx::query(&format!(
                "INSERT INTO {} (questionattemptid, sequencenumber, state, fraction, timecreated, userid) \
                 VALUES (?, ?, ?, NULL, ?, ?)",
                self.tables.steps
            ))
            .bind(question_attempt.id)
            .bind(sequence_number)
            .bind(SUBMITTED_STEP_STATE)
            .bind(now)
            .bind(attempt.user_id)
            .execute(&mut *tx)
            .await?;

            // (questionattemptid, sequencenumber) is unique; not every Any backend reports insert ids
            let step_id: i64 = sqlx::query_scalar(&format!(
                "SELECT id FROM {} WHERE questionattemptid = ? AND sequencenumber = ?",
                self.tables.steps
            ))
            .bind(question_attempt.id)
            .bind(sequence_number)
            .fetch_one(&mut *tx)
            .await?;

            for (name, value) in step.step_data() {
                sqlx::query(&format!(
                    "INSERT INTO {} (attemptstepid, name, value) VALUES (?, ?, ?)",
                    self.tables.step_data
                ))
                .bind(step_id)
                .bind(name)
                .bind(value)
                .execute(&mut *tx)
                .await?;
            }

            sqlx::query(&format!(
                "UPDATE {} SET timemodified = ? WHERE id = ?",
                self.tables.quiz_attempts
            ))
            .bind(now)
            .bind(attempt_id)
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
            Ok::<_, ExamError>(sequence_number)
        })
        .await?;

        ANSWERS_SAVED_TOTAL.inc();
        tracing::info!(
            attempt_id,
            slot,
            question_attempt_id = question_attempt.id,
            sequence_number,
            "Answer saved"
        );

        Ok(())
    }

    async fn resolve_attempt(&self, attempt_id: i64) -> ExamResult<AttemptRow> {
        let row = track_db_operation("resolve_attempt", async {
            let row = sqlx::query_as::<_, AttemptRow>(&format!(
                "SELECT uniqueid AS usage_id, userid AS user_id FROM {} WHERE id = ?",
                self.tables.quiz_attempts
            ))
            .bind(attempt_id)
            .fetch_optional(&self.pool)
            .await?;
            Ok::<_, ExamError>(row)
        })
        .await?
        .ok_or_else(|| ExamError::NotFound(format!("no quiz attempt with id {}", attempt_id)))?;

        if row.usage_id <= 0 {
            return Err(ExamError::Invalid(format!(
                "quiz attempt {} has invalid usage id {}",
                attempt_id, row.usage_id
            )));
        }

        Ok(row)
    }

    async fn question_attempt(&self, usage_id: i64, slot: i64) -> ExamResult<QuestionAttemptRow> {
        track_db_operation("question_attempt", async {
            let row = sqlx::query_as::<_, QuestionAttemptRow>(&format!(
                "SELECT id, questionid AS question_id, CAST(maxmark AS DOUBLE) AS max_mark \
                 FROM {} WHERE questionusageid = ? AND slot = ?",
                self.tables.question_attempts
            ))
            .bind(usage_id)
            .bind(slot)
            .fetch_optional(&self.pool)
            .await?;
            Ok::<_, ExamError>(row)
        })
        .await?
        .ok_or_else(|| {
            ExamError::NotFound(format!(
                "no question attempt for usage {} slot {}",
                usage_id, slot
            ))
        })
    }

    async fn question(&self, question_id: i64) -> ExamResult<QuestionRow> {
        track_db_operation("question", async {
            let row = sqlx::query_as::<_, QuestionRow>(&format!(
                "SELECT id, qtype, questiontext FROM {} WHERE id = ?",
                self.tables.question
            ))
            .bind(question_id)
            .fetch_optional(&self.pool)
            .await?;
            Ok::<_, ExamError>(row)
        })
        .await?
        .ok_or_else(|| ExamError::NotFound(format!("no question with id {}", question_id)))
    }

    async fn answer_options(&self, question_id: i64) -> ExamResult<Vec<AnswerOptionRow>> {
        track_db_operation("answer_options", async {
            let rows = sqlx::query_as::<_, AnswerOptionRow>(&format!(
                "SELECT id, answer, CAST(fraction AS DOUBLE) AS fraction \
                 FROM {} WHERE question = ? ORDER BY id ASC",
                self.tables.question_answers
            ))
            .bind(question_id)
            .fetch_all(&self.pool)
            .await?;
            Ok::<_, ExamError>(rows)
        })
        .await
    }
}

#[async_trait]
impl QuestionSource for LmsAdapter {
    async fn load_question(&self, attempt_id: i64, slot: i64) -> ExamResult<QuestionPayload> {
        self.get_question_payload(attempt_id, slot).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_names_carry_prefix() {
        let tables = LmsTables::with_prefix("mdl_");
        assert_eq!(tables.quiz_attempts, "mdl_quiz_attempts");
        assert_eq!(tables.steps, "mdl_question_attempt_steps");
        assert_eq!(tables.step_data, "mdl_question_attempt_step_data");
    }

    #[test]
    fn test_empty_prefix() {
        let tables = LmsTables::with_prefix("");
        assert_eq!(tables.question, "question");
    }
}
