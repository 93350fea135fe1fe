mod args;
mod take;

use quiz_core::model::{QuizFilter, SubjectFilter, UserId};
use services::{AppServices, Clock, QuizSource, UserContext};
use storage::supabase::SupabaseConfig;

use crate::args::{Args, ArgsError, Backend, Command, print_usage};

/// Acting user for a local database when none is configured.
const LOCAL_USER_ID: UserId = UserId::from_u128(1);

#[derive(Debug)]
enum SetupError {
    MissingSupabaseConfig,
    MissingUser,
}

impl std::fmt::Display for SetupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SetupError::MissingSupabaseConfig => {
                write!(f, "supabase backend requires SUPABASE_URL and SUPABASE_ANON_KEY")
            }
            SetupError::MissingUser => {
                write!(f, "supabase backend requires --user or QUIZ_USER_ID")
            }
        }
    }
}

impl std::error::Error for SetupError {}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let Some(args) = Args::parse(std::env::args().skip(1))? else {
        print_usage();
        return Ok(());
    };

    let services = match args.backend {
        Backend::Sqlite => {
            prepare_sqlite_file(&args.db_url)?;
            AppServices::new_sqlite(&args.db_url, Clock::default_clock()).await?
        }
        Backend::Supabase => {
            let config = SupabaseConfig::from_env().ok_or(SetupError::MissingSupabaseConfig)?;
            AppServices::new_supabase(config, Clock::default_clock())
        }
    };
    let user_id = match (args.backend, args.user_id) {
        (_, Some(id)) => id,
        (Backend::Sqlite, None) => LOCAL_USER_ID,
        (Backend::Supabase, None) => return Err(SetupError::MissingUser.into()),
    };
    let mut ctx = UserContext::new(user_id);
    if let Some(name) = args.user_name {
        ctx = ctx.with_display_name(name);
    }
    log::debug!("running {:?} as user {}", args.command, ctx.user_id);

    match args.command {
        Command::Quizzes { query, subject } => {
            let subject = subject.map_or(SubjectFilter::All, SubjectFilter::Only);
            let quizzes = services
                .catalog()
                .quizzes(&ctx, &QuizFilter::new(query, subject))
                .await?;
            if quizzes.is_empty() {
                println!("No quizzes yet. Create one with `create --file <path>`.");
            }
            for quiz in quizzes {
                println!(
                    "{}  {}  ({} questions, {}, {})",
                    quiz.id,
                    quiz.title,
                    quiz.total_questions,
                    quiz.difficulty.label(),
                    quiz.created_at.format("%Y-%m-%d"),
                );
            }
        }
        Command::Subjects { query } => {
            for subject in services.catalog().search_subjects(&ctx, &query).await? {
                let origin = if subject.is_builtin() { "" } else { " (custom)" };
                println!("{:<20} {}{origin}", subject.id.as_str(), subject.name);
                if !subject.description.is_empty() {
                    println!("{:<20} {}", "", subject.description);
                }
            }
        }
        Command::AddSubject { name, description } => {
            let subject = services
                .catalog()
                .add_subject(&ctx, &name, &description)
                .await?;
            println!("Added subject {} ({})", subject.name, subject.id);
        }
        Command::Create {
            file,
            subject,
            count,
        } => {
            if !services.generation_enabled() {
                log::warn!("question generation is not configured; set QUIZ_AI_API_KEY");
            }
            let content = std::fs::read_to_string(&file)?;
            let file_name = file
                .file_name()
                .map_or_else(|| file.display().to_string(), |n| n.to_string_lossy().into_owned());
            let mut source = QuizSource::new(file_name, content);
            if let Some(subject) = subject {
                source = source.with_subject(subject);
            }
            let services = match count {
                Some(count) => services.with_question_count(count),
                None => services,
            };
            let created = services.quiz_builder().create_quiz(&ctx, source).await?;
            println!(
                "Created \"{}\" with {} questions: {}",
                created.quiz.title,
                created.questions.len(),
                created.quiz.id
            );
        }
        Command::Take { quiz_id, shuffle } => {
            let sessions = services.with_shuffle_questions(shuffle).sessions();
            let stdin = std::io::stdin();
            let mut input = stdin.lock();
            let mut output = std::io::stdout();
            take::run(&sessions, &ctx, quiz_id, &mut input, &mut output).await?;
        }
        Command::Stats => {
            let overview = services.dashboard().overview(&ctx).await?;
            let stats = &overview.stats;
            println!("{}", overview.display_name);
            println!(
                "Level {}  ({} / {} XP)",
                overview.level.level, overview.level.xp, overview.level.next_level_xp
            );
            println!("Quizzes taken:     {}", stats.total_quizzes);
            println!("Average score:     {}%", stats.average_score_rounded());
            println!("Subjects mastered: {}", stats.subjects_mastered);
            if !overview.recent_scores.is_empty() {
                let recent: Vec<String> = overview
                    .recent_scores
                    .iter()
                    .map(|s| format!("{s}%"))
                    .collect();
                println!("Recent:            {}", recent.join(", "));
            }
        }
    }

    Ok(())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::init();
    if let Err(err) = run().await {
        eprintln!("error: {err}");
        std::process::exit(2);
    }
}
