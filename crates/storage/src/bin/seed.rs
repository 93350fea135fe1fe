use std::fmt;

use chrono::{DateTime, Duration, Utc};
use quiz_core::model::{
    AttemptId, AttemptRecord, AttemptTally, Difficulty, IncorrectAnswer, QuestionDraft,
    QuestionId, Quiz, QuizId, SubjectId, UserId,
};
use storage::repository::{StatsUpdate, Storage};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    user_id: UserId,
    quiz_id: QuizId,
    title: String,
    attempts: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidUserId { raw: String },
    InvalidQuizId { raw: String },
    InvalidAttempts { raw: String },
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidUserId { raw } => write!(f, "invalid --user value: {raw}"),
            ArgsError::InvalidQuizId { raw } => write!(f, "invalid --quiz-id value: {raw}"),
            ArgsError::InvalidAttempts { raw } => write!(f, "invalid --attempts value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

const DEFAULT_USER: UserId = UserId::from_u128(1);
const DEFAULT_QUIZ: QuizId = QuizId::from_u128(1);

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("QUIZ_DB_URL").unwrap_or_else(|_| "sqlite:quiz.sqlite3".into());
        let mut user_id = std::env::var("QUIZ_USER_ID")
            .ok()
            .and_then(|value| value.parse::<UserId>().ok())
            .unwrap_or(DEFAULT_USER);
        let mut quiz_id = DEFAULT_QUIZ;
        let mut title = "Microeconomics basics".to_string();
        let mut attempts = 0;
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--user" => {
                    let value = require_value(&mut args, "--user")?;
                    user_id = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidUserId { raw: value.clone() })?;
                }
                "--quiz-id" => {
                    let value = require_value(&mut args, "--quiz-id")?;
                    quiz_id = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidQuizId { raw: value.clone() })?;
                }
                "--title" => {
                    title = require_value(&mut args, "--title")?;
                }
                "--attempts" => {
                    let value = require_value(&mut args, "--attempts")?;
                    attempts = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidAttempts { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            user_id,
            quiz_id,
            title,
            attempts,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:quiz.sqlite3)");
    eprintln!("  --user <uuid>             Owner of the seeded quiz");
    eprintln!("  --quiz-id <uuid>          Quiz id to create");
    eprintln!("  --title <text>            Quiz title (default: Microeconomics basics)");
    eprintln!("  --attempts <n>            Number of past attempts to record (default: 0)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  QUIZ_DB_URL, QUIZ_USER_ID");
}

const SAMPLES: [(&str, &str, [&str; 4], &str); 5] = [
    (
        "What happens to quantity demanded when price rises, all else equal?",
        "It falls",
        ["It falls", "It rises", "It stays the same", "It doubles"],
        "The law of demand: price and quantity demanded move in opposite directions.",
    ),
    (
        "Which cost does not vary with output in the short run?",
        "Fixed cost",
        ["Variable cost", "Marginal cost", "Fixed cost", "Average variable cost"],
        "Fixed costs are incurred regardless of the quantity produced.",
    ),
    (
        "A good whose demand rises when income rises is called",
        "A normal good",
        ["An inferior good", "A normal good", "A Giffen good", "A public good"],
        "Normal goods have a positive income elasticity.",
    ),
    (
        "Under perfect competition a firm is a",
        "Price taker",
        ["Price maker", "Price taker", "Monopolist", "Cartel member"],
        "Each firm is too small to influence the market price.",
    ),
    (
        "Consumer surplus is the area",
        "Below demand and above price",
        [
            "Above supply and below price",
            "Below demand and above price",
            "Between supply and demand",
            "Under the marginal cost curve",
        ],
        "It measures willingness to pay in excess of what is paid.",
    ),
];

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let total = u32::try_from(SAMPLES.len())?;
    let quiz = Quiz::new(args.quiz_id, args.title.clone(), args.user_id, now)?
        .with_description("Seeded sample questions")
        .with_subject(SubjectId::new("microeconomics"))
        .with_total_questions(total)
        .with_difficulty(Difficulty::Beginner);
    storage.quizzes.insert_quiz(&quiz).await?;

    let mut questions = Vec::with_capacity(SAMPLES.len());
    for (i, (prompt, answer, options, explanation)) in SAMPLES.iter().enumerate() {
        let n = args.quiz_id.value().as_u128().wrapping_add(i as u128 + 1);
        let question = QuestionDraft::new(
            *prompt,
            *answer,
            options.iter().map(|o| (*o).to_string()).collect(),
        )
        .with_explanation(*explanation)
        .validate(QuestionId::from_u128(n), quiz.id)?;
        questions.push(question);
    }
    storage.questions.insert_questions(&questions).await?;

    for i in 0..args.attempts {
        let score = total.saturating_sub(i % (total + 1));
        let completed_at = now - Duration::days(i64::from(i)) + Duration::minutes(5);
        let incorrect_answers = questions
            .iter()
            .take((total - score) as usize)
            .map(|q| IncorrectAnswer {
                question_id: q.id(),
                selected_answer: q.options()[3].clone(),
            })
            .collect();
        let record = AttemptRecord::from_tally(
            AttemptId::generate(),
            args.user_id,
            AttemptTally {
                quiz_id: quiz.id,
                score,
                total_questions: total,
                time_spent_secs: 60 + i * 15,
                incorrect_answers,
            },
            completed_at,
        )?;
        storage.attempts.create_attempt(&record).await?;
        storage
            .stats
            .update_user_stats_after_quiz(&StatsUpdate {
                user_id: args.user_id,
                quiz_id: quiz.id,
                score,
                total_questions: total,
            })
            .await?;
    }

    println!(
        "Seeded quiz {} with {} questions and {} attempts into {}",
        quiz.id,
        questions.len(),
        args.attempts,
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
