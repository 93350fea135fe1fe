use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

const SCHEMA_V1: &[&str] = &[
    r"
        CREATE TABLE IF NOT EXISTS documents (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS subjects (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            description TEXT NOT NULL,
            icon TEXT NOT NULL,
            color TEXT NOT NULL
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS quizzes (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            subject_id TEXT,
            document_id TEXT,
            total_questions INTEGER NOT NULL CHECK (total_questions >= 0),
            difficulty_level INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE SET NULL
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS questions (
            id TEXT PRIMARY KEY,
            quiz_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            question TEXT NOT NULL,
            correct_answer TEXT NOT NULL,
            options TEXT NOT NULL,
            explanation TEXT,
            latex_content TEXT,
            FOREIGN KEY (quiz_id) REFERENCES quizzes(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS quiz_attempts (
            id TEXT PRIMARY KEY,
            quiz_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            score INTEGER NOT NULL CHECK (score >= 0),
            total_questions INTEGER NOT NULL CHECK (total_questions >= score),
            time_spent INTEGER NOT NULL CHECK (time_spent >= 0),
            completed_at TEXT NOT NULL,
            incorrect_answers TEXT NOT NULL,
            FOREIGN KEY (quiz_id) REFERENCES quizzes(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS user_stats (
            user_id TEXT PRIMARY KEY,
            total_quizzes INTEGER NOT NULL CHECK (total_quizzes >= 0),
            average_score REAL NOT NULL,
            subjects_mastered INTEGER NOT NULL CHECK (subjects_mastered >= 0),
            current_level INTEGER NOT NULL CHECK (current_level >= 1),
            xp_points INTEGER NOT NULL CHECK (xp_points >= 0),
            updated_at TEXT NOT NULL
        );
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_quizzes_user_created
            ON quizzes (user_id, created_at);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_quizzes_subject_created
            ON quizzes (subject_id, created_at);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_questions_quiz_position
            ON questions (quiz_id, position);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_quiz_attempts_user_completed
            ON quiz_attempts (user_id, completed_at);
    ",
];

/// Runs the bootstrap migration for the local schema.
///
/// Creates documents, subjects, quizzes, questions, attempts, user stats and indexes.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        for statement in SCHEMA_V1 {
            sqlx::query(*statement).execute(&mut *tx).await?;
        }

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        log::info!("applied sqlite schema version 1");
    }

    Ok(())
}
