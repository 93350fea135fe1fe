use chrono::{DateTime, SubsecRound, Utc};
use quiz_core::model::{
    AttemptId, AttemptRecord, Difficulty, Document, DocumentId, IncorrectAnswer, Question,
    QuestionId, Quiz, QuizId, Subject, SubjectColor, SubjectIcon, SubjectId, UserId, UserStats,
};
use serde::{Deserialize, Serialize};

use crate::repository::{StatsUpdate, StorageError};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn count(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct QuizRow {
    pub id: QuizId,
    pub user_id: UserId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub subject_id: Option<SubjectId>,
    #[serde(default)]
    pub document_id: Option<DocumentId>,
    #[serde(default)]
    pub total_questions: Option<i64>,
    #[serde(default)]
    pub difficulty_level: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<&Quiz> for QuizRow {
    fn from(quiz: &Quiz) -> Self {
        Self {
            id: quiz.id,
            user_id: quiz.user_id,
            title: quiz.title.clone(),
            description: Some(quiz.description.clone()),
            subject_id: quiz.subject_id.clone(),
            document_id: quiz.document_id,
            total_questions: Some(i64::from(quiz.total_questions)),
            difficulty_level: Some(quiz.difficulty.level()),
            created_at: quiz.created_at,
        }
    }
}

impl TryFrom<QuizRow> for Quiz {
    type Error = StorageError;

    fn try_from(row: QuizRow) -> Result<Self, Self::Error> {
        let mut quiz = Quiz::new(row.id, row.title, row.user_id, row.created_at)
            .map_err(ser)?
            .with_description(row.description.unwrap_or_default())
            .with_total_questions(count("total_questions", row.total_questions.unwrap_or(0))?)
            .with_difficulty(Difficulty::from_level(row.difficulty_level.unwrap_or(0)));
        if let Some(subject_id) = row.subject_id {
            quiz = quiz.with_subject(subject_id);
        }
        if let Some(document_id) = row.document_id {
            quiz = quiz.with_document(document_id);
        }
        Ok(quiz)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct QuestionRow {
    pub id: QuestionId,
    pub quiz_id: QuizId,
    pub question: String,
    pub correct_answer: String,
    pub options: Vec<String>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub latex_content: Option<String>,
}

impl From<&Question> for QuestionRow {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id(),
            quiz_id: q.quiz_id(),
            question: q.prompt().to_string(),
            correct_answer: q.correct_answer().to_string(),
            options: q.options().to_vec(),
            explanation: q.explanation().map(str::to_string),
            latex_content: q.latex().map(str::to_string),
        }
    }
}

impl TryFrom<QuestionRow> for Question {
    type Error = StorageError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        Question::from_persisted(
            row.id,
            row.quiz_id,
            row.question,
            row.correct_answer,
            row.options,
            row.explanation,
            row.latex_content,
        )
        .map_err(ser)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct AttemptRow {
    pub id: AttemptId,
    pub quiz_id: QuizId,
    pub user_id: UserId,
    pub score: i64,
    pub total_questions: i64,
    pub time_spent: i64,
    pub completed_at: DateTime<Utc>,
    #[serde(default)]
    pub incorrect_answers: Option<Vec<IncorrectAnswer>>,
}

impl From<&AttemptRecord> for AttemptRow {
    fn from(a: &AttemptRecord) -> Self {
        Self {
            id: a.id(),
            quiz_id: a.quiz_id(),
            user_id: a.user_id(),
            score: i64::from(a.score()),
            total_questions: i64::from(a.total_questions()),
            time_spent: i64::from(a.time_spent_secs()),
            completed_at: a.completed_at(),
            incorrect_answers: Some(a.incorrect_answers().to_vec()),
        }
    }
}

impl TryFrom<AttemptRow> for AttemptRecord {
    type Error = StorageError;

    fn try_from(row: AttemptRow) -> Result<Self, Self::Error> {
        AttemptRecord::from_persisted(
            row.id,
            row.quiz_id,
            row.user_id,
            count("score", row.score)?,
            count("total_questions", row.total_questions)?,
            count("time_spent", row.time_spent)?,
            row.completed_at,
            row.incorrect_answers.unwrap_or_default(),
        )
        .map_err(ser)
    }
}

/// Whether a stored attempt is the one being re-sent. `timestamptz` keeps
/// microseconds, so finer precision on `sent` is ignored.
pub(super) fn same_attempt(stored: &AttemptRecord, sent: &AttemptRecord) -> bool {
    stored.id() == sent.id()
        && stored.quiz_id() == sent.quiz_id()
        && stored.user_id() == sent.user_id()
        && stored.score() == sent.score()
        && stored.total_questions() == sent.total_questions()
        && stored.time_spent_secs() == sent.time_spent_secs()
        && stored.completed_at() == sent.completed_at().trunc_subsecs(6)
        && stored.incorrect_answers() == sent.incorrect_answers()
}

#[derive(Debug, Deserialize)]
pub(super) struct UserStatsRow {
    pub user_id: UserId,
    #[serde(default)]
    pub total_quizzes: i64,
    #[serde(default)]
    pub average_score: f64,
    #[serde(default)]
    pub subjects_mastered: i64,
    #[serde(default)]
    pub current_level: i64,
    #[serde(default)]
    pub xp_points: i64,
}

impl UserStatsRow {
    pub(super) fn into_stats(self, recent_activity: Vec<AttemptRecord>) -> Result<UserStats, StorageError> {
        Ok(UserStats {
            user_id: self.user_id,
            total_quizzes: count("total_quizzes", self.total_quizzes)?,
            average_score: self.average_score,
            subjects_mastered: count("subjects_mastered", self.subjects_mastered)?,
            current_level: count("current_level", self.current_level)?.max(1),
            xp_points: count("xp_points", self.xp_points)?,
            recent_activity,
        })
    }
}

/// Named arguments of the `update_user_stats_after_quiz` function.
#[derive(Debug, Serialize)]
pub(super) struct StatsRpcArgs {
    pub input_user_id: UserId,
    pub quiz_score: u32,
    pub total_questions: u32,
    pub quiz_id: QuizId,
}

impl From<&StatsUpdate> for StatsRpcArgs {
    fn from(update: &StatsUpdate) -> Self {
        Self {
            input_user_id: update.user_id,
            quiz_score: update.score,
            total_questions: update.total_questions,
            quiz_id: update.quiz_id,
        }
    }
}

/// Remote subjects carry no icon or color; custom subjects always render
/// with the fallback pair.
#[derive(Debug, Serialize, Deserialize)]
pub(super) struct SubjectRow {
    pub id: SubjectId,
    pub user_id: UserId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<SubjectRow> for Subject {
    fn from(row: SubjectRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description.unwrap_or_default(),
            icon: SubjectIcon::BookOpen,
            color: SubjectColor::Gray,
            user_id: Some(row.user_id),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct DocumentRow {
    pub id: DocumentId,
    pub user_id: UserId,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Document> for DocumentRow {
    fn from(d: &Document) -> Self {
        Self {
            id: d.id,
            user_id: d.user_id,
            title: d.title.clone(),
            content: d.content.clone(),
            created_at: d.created_at,
        }
    }
}

impl TryFrom<DocumentRow> for Document {
    type Error = StorageError;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        Document::new(row.id, row.user_id, row.title, row.content, row.created_at).map_err(ser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn quiz_row_tolerates_missing_optional_columns() {
        let row: QuizRow = serde_json::from_value(json!({
            "id": "00000000-0000-0000-0000-000000000001",
            "user_id": "00000000-0000-0000-0000-000000000002",
            "title": "Quiz - notes.txt",
            "document_id": null,
            "created_at": "2024-03-01T10:00:00+00:00"
        }))
        .unwrap();

        let quiz = Quiz::try_from(row).unwrap();
        assert_eq!(quiz.title, "Quiz - notes.txt");
        assert_eq!(quiz.description, "");
        assert_eq!(quiz.difficulty, Difficulty::Unrated);
        assert!(quiz.subject_id.is_none());
    }

    #[test]
    fn attempt_row_reads_incorrect_answers_json() {
        let row: AttemptRow = serde_json::from_value(json!({
            "id": "00000000-0000-0000-0000-0000000000aa",
            "quiz_id": "00000000-0000-0000-0000-000000000001",
            "user_id": "00000000-0000-0000-0000-000000000002",
            "score": 1,
            "total_questions": 2,
            "time_spent": 42,
            "completed_at": "2024-03-01T10:05:00Z",
            "incorrect_answers": [
                {"question_id": "00000000-0000-0000-0000-000000000010", "selected_answer": "B"}
            ]
        }))
        .unwrap();

        let attempt = AttemptRecord::try_from(row).unwrap();
        assert_eq!(attempt.time_spent_secs(), 42);
        assert_eq!(attempt.incorrect_answers().len(), 1);
        assert_eq!(attempt.incorrect_answers()[0].selected_answer, "B");
    }

    #[test]
    fn attempt_row_rejects_inconsistent_score() {
        let row = AttemptRow {
            id: AttemptId::from_u128(1),
            quiz_id: QuizId::from_u128(1),
            user_id: UserId::from_u128(1),
            score: 3,
            total_questions: 2,
            time_spent: 0,
            completed_at: quiz_core::time::fixed_now(),
            incorrect_answers: None,
        };
        assert!(matches!(
            AttemptRecord::try_from(row),
            Err(StorageError::Serialization(_))
        ));
    }

    #[test]
    fn resent_attempt_matches_its_microsecond_copy() {
        let record = |completed_at, score| {
            AttemptRecord::from_persisted(
                AttemptId::from_u128(5),
                QuizId::from_u128(1),
                UserId::from_u128(2),
                score,
                2,
                30,
                completed_at,
                Vec::new(),
            )
            .unwrap()
        };
        let now = quiz_core::time::fixed_now();
        let sent = record(now + chrono::Duration::nanoseconds(7_000_123), 2);
        let stored = record(now + chrono::Duration::microseconds(7_000), 2);

        assert_ne!(stored, sent);
        assert!(same_attempt(&stored, &sent));
        assert!(!same_attempt(&record(now, 1), &record(now, 2)));
    }

    #[test]
    fn stats_rpc_uses_remote_argument_names() {
        let args = StatsRpcArgs::from(&StatsUpdate {
            user_id: UserId::from_u128(2),
            quiz_id: QuizId::from_u128(1),
            score: 4,
            total_questions: 5,
        });
        let value = serde_json::to_value(&args).unwrap();
        assert_eq!(value["quiz_score"], 4);
        assert_eq!(value["total_questions"], 5);
        assert_eq!(
            value["input_user_id"],
            "00000000-0000-0000-0000-000000000002"
        );
        assert_eq!(value["quiz_id"], "00000000-0000-0000-0000-000000000001");
    }

    #[test]
    fn stats_row_floors_level_at_one() {
        let row: UserStatsRow = serde_json::from_value(json!({
            "user_id": "00000000-0000-0000-0000-000000000002",
            "current_level": 0
        }))
        .unwrap();
        let stats = row.into_stats(Vec::new()).unwrap();
        assert_eq!(stats.current_level, 1);
        assert_eq!(stats.total_quizzes, 0);
    }
}
