use std::fmt;
use std::path::PathBuf;

use quiz_core::model::{QuizId, SubjectId, UserId};

#[derive(Debug)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { command: &'static str, flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidDbUrl { raw: String },
    InvalidBackend { raw: String },
    InvalidUserId { raw: String },
    InvalidQuizId { raw: String },
    InvalidCount { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { command, flag } => write!(f, "{command} requires {flag}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidBackend { raw } => {
                write!(f, "invalid --backend value (expected sqlite or supabase): {raw}")
            }
            ArgsError::InvalidUserId { raw } => write!(f, "invalid --user value: {raw}"),
            ArgsError::InvalidQuizId { raw } => write!(f, "invalid --quiz value: {raw}"),
            ArgsError::InvalidCount { raw } => write!(f, "invalid --count value: {raw}"),
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    Supabase,
}

impl Backend {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Some(Self::Sqlite),
            "supabase" => Some(Self::Supabase),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quizzes {
        query: String,
        subject: Option<SubjectId>,
    },
    Subjects {
        query: String,
    },
    AddSubject {
        name: String,
        description: String,
    },
    Create {
        file: PathBuf,
        subject: Option<SubjectId>,
        count: Option<usize>,
    },
    Take {
        quiz_id: QuizId,
        shuffle: bool,
    },
    Stats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub backend: Backend,
    pub db_url: String,
    pub user_id: Option<UserId>,
    pub user_name: Option<String>,
    pub command: Command,
}

/// Flags accepted by any subcommand; each command picks the ones it uses.
#[derive(Default)]
struct Flags {
    query: Option<String>,
    subject: Option<SubjectId>,
    name: Option<String>,
    description: Option<String>,
    file: Option<PathBuf>,
    count: Option<usize>,
    quiz_id: Option<QuizId>,
    shuffle: bool,
}

impl Args {
    /// Parse `argv` (without the program name). Returns `Ok(None)` when help
    /// was requested.
    pub fn parse(argv: impl IntoIterator<Item = String>) -> Result<Option<Self>, ArgsError> {
        let mut args = argv.into_iter();
        let Some(command) = args.next() else {
            return Ok(None);
        };
        if matches!(command.as_str(), "--help" | "-h" | "help") {
            return Ok(None);
        }

        let mut backend = std::env::var("QUIZ_BACKEND")
            .ok()
            .and_then(|value| Backend::parse(&value))
            .unwrap_or(Backend::Sqlite);
        let mut db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .map_or_else(|| normalize_sqlite_url("sqlite:quiz.sqlite3".into()), normalize_sqlite_url);
        let mut user_id = std::env::var("QUIZ_USER_ID")
            .ok()
            .and_then(|value| value.parse::<UserId>().ok());
        let user_name = std::env::var("QUIZ_USER_NAME").ok();
        let mut flags = Flags::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--backend" => {
                    let value = require_value(&mut args, "--backend")?;
                    backend =
                        Backend::parse(&value).ok_or(ArgsError::InvalidBackend { raw: value })?;
                }
                "--user" => {
                    let value = require_value(&mut args, "--user")?;
                    user_id = Some(
                        value
                            .parse()
                            .map_err(|_| ArgsError::InvalidUserId { raw: value.clone() })?,
                    );
                }
                "--query" | "-q" => flags.query = Some(require_value(&mut args, "--query")?),
                "--subject" => {
                    let value = require_value(&mut args, "--subject")?;
                    flags.subject = Some(SubjectId::new(value.trim()));
                }
                "--name" => flags.name = Some(require_value(&mut args, "--name")?),
                "--description" => {
                    flags.description = Some(require_value(&mut args, "--description")?);
                }
                "--file" => flags.file = Some(PathBuf::from(require_value(&mut args, "--file")?)),
                "--count" => {
                    let value = require_value(&mut args, "--count")?;
                    let count = value
                        .parse::<usize>()
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or(ArgsError::InvalidCount { raw: value })?;
                    flags.count = Some(count);
                }
                "--quiz" => {
                    let value = require_value(&mut args, "--quiz")?;
                    flags.quiz_id = Some(
                        value
                            .parse()
                            .map_err(|_| ArgsError::InvalidQuizId { raw: value.clone() })?,
                    );
                }
                "--shuffle" => flags.shuffle = true,
                "--help" | "-h" => return Ok(None),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let command = match command.as_str() {
            "quizzes" => Command::Quizzes {
                query: flags.query.unwrap_or_default(),
                subject: flags.subject,
            },
            "subjects" => Command::Subjects {
                query: flags.query.unwrap_or_default(),
            },
            "add-subject" => Command::AddSubject {
                name: flags.name.ok_or(ArgsError::MissingFlag {
                    command: "add-subject",
                    flag: "--name",
                })?,
                description: flags.description.unwrap_or_default(),
            },
            "create" => Command::Create {
                file: flags.file.ok_or(ArgsError::MissingFlag {
                    command: "create",
                    flag: "--file",
                })?,
                subject: flags.subject,
                count: flags.count,
            },
            "take" => Command::Take {
                quiz_id: flags.quiz_id.ok_or(ArgsError::MissingFlag {
                    command: "take",
                    flag: "--quiz",
                })?,
                shuffle: flags.shuffle,
            },
            "stats" => Command::Stats,
            other => return Err(ArgsError::UnknownCommand(other.to_string())),
        };

        Ok(Some(Self {
            backend,
            db_url,
            user_id,
            user_name,
            command,
        }))
    }
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- <command> [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  quizzes     [--query <text>] [--subject <id>]   List your quizzes");
    eprintln!("  subjects    [--query <text>]                    List subjects");
    eprintln!("  add-subject --name <name> [--description <text>]");
    eprintln!("  create      --file <path> [--subject <id>] [--count <n>]");
    eprintln!("  take        --quiz <uuid> [--shuffle]           Answer a quiz interactively");
    eprintln!("  stats                                           Show your progress");
    eprintln!();
    eprintln!("Global options:");
    eprintln!("  --backend <sqlite|supabase>   Storage backend (default: sqlite)");
    eprintln!("  --db <sqlite_url>             SQLite URL (default: sqlite:quiz.sqlite3)");
    eprintln!("  --user <uuid>                 Acting user (default: local user for sqlite)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_BACKEND, QUIZ_DB_URL, QUIZ_USER_ID, QUIZ_USER_NAME, QUIZ_QUESTION_COUNT");
    eprintln!("  QUIZ_AI_API_KEY, QUIZ_AI_BASE_URL, QUIZ_AI_MODEL");
    eprintln!("  SUPABASE_URL, SUPABASE_ANON_KEY, SUPABASE_ACCESS_TOKEN");
    eprintln!("  RUST_LOG");
}

pub fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Option<Args>, ArgsError> {
        Args::parse(args.iter().map(|s| (*s).to_string()))
    }

    #[test]
    fn help_and_empty_argv_print_usage() {
        assert!(parse(&[]).unwrap().is_none());
        assert!(parse(&["--help"]).unwrap().is_none());
        assert!(parse(&["stats", "-h"]).unwrap().is_none());
    }

    #[test]
    fn take_requires_a_quiz_id() {
        let err = parse(&["take"]).unwrap_err();
        assert_eq!(err.to_string(), "take requires --quiz");

        let args = parse(&[
            "take",
            "--quiz",
            "00000000-0000-0000-0000-000000000001",
            "--shuffle",
            "--db",
            "sqlite::memory:",
        ])
        .unwrap()
        .unwrap();
        assert_eq!(
            args.command,
            Command::Take {
                quiz_id: QuizId::from_u128(1),
                shuffle: true,
            }
        );
        assert_eq!(args.db_url, "sqlite::memory:");
    }

    #[test]
    fn bad_values_are_reported() {
        assert!(matches!(
            parse(&["create", "--file", "notes.txt", "--count", "0"]),
            Err(ArgsError::InvalidCount { .. })
        ));
        assert!(matches!(
            parse(&["stats", "--backend", "postgres"]),
            Err(ArgsError::InvalidBackend { .. })
        ));
        assert!(matches!(
            parse(&["stats", "--user", "me"]),
            Err(ArgsError::InvalidUserId { .. })
        ));
        assert!(matches!(
            parse(&["launch"]),
            Err(ArgsError::UnknownCommand(_))
        ));
    }

    #[test]
    fn relative_sqlite_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:data/quiz.sqlite3".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/quiz.sqlite3"));
        assert_eq!(
            normalize_sqlite_url("sqlite:///tmp/q.db".into()),
            "sqlite:///tmp/q.db"
        );
    }
}
