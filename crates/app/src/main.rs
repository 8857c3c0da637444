use std::fmt;
use std::sync::Arc;

use quiz_core::model::{CategoryId, QuizId};
use services::{AppServices, AuthProvider, Clock, InMemoryAuthProvider};
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

mod terminal;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingQuizId,
    UnknownArg(String),
    InvalidQuizId { raw: String },
    InvalidCategoryId { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingQuizId => write!(f, "take requires a quiz id"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidQuizId { raw } => write!(f, "invalid quiz id: {raw}"),
            ArgsError::InvalidCategoryId { raw } => write!(f, "invalid --category value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- list  [--db <sqlite_url>] [--category <id>]");
    eprintln!("  cargo run -p app -- take  <quiz_id> [--db <sqlite_url>] [--name <display_name>]");
    eprintln!("  cargo run -p app -- stats [--db <sqlite_url>] [--json]");
    eprintln!("  cargo run -p app -- participants [--db <sqlite_url>] [--json]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:quiz.sqlite3");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_ADMIN_EMAIL, QUIZ_ADMIN_PASSWORD, QUIZ_USER_EMAIL,");
    eprintln!("  QUIZ_USER_PASSWORD, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    List,
    Take,
    Stats,
    Participants,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "list" => Some(Self::List),
            "take" => Some(Self::Take),
            "stats" => Some(Self::Stats),
            "participants" => Some(Self::Participants),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Args {
    db_url: String,
    quiz_id: Option<QuizId>,
    category: Option<CategoryId>,
    name: Option<String>,
    json: bool,
}

impl Args {
    fn parse(
        cmd: Command,
        args: &mut impl Iterator<Item = String>,
        env_db_url: Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            db_url: env_db_url.map_or_else(|| "sqlite://quiz.sqlite3".into(), normalize_sqlite_url),
            quiz_id: None,
            category: None,
            name: None,
            json: false,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = normalize_sqlite_url(value);
                }
                "--category" if cmd == Command::List => {
                    let value = require_value(args, "--category")?;
                    let id = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidCategoryId { raw: value.clone() })?;
                    parsed.category = Some(id);
                }
                "--name" if cmd == Command::Take => {
                    parsed.name = Some(require_value(args, "--name")?);
                }
                "--json" if matches!(cmd, Command::Stats | Command::Participants) => {
                    parsed.json = true;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ if cmd == Command::Take && parsed.quiz_id.is_none() && !arg.starts_with('-') => {
                    let id = arg
                        .parse()
                        .map_err(|_| ArgsError::InvalidQuizId { raw: arg.clone() })?;
                    parsed.quiz_id = Some(id);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        if cmd == Command::Take && parsed.quiz_id.is_none() {
            return Err(ArgsError::MissingQuizId);
        }
        Ok(parsed)
    }
}

fn normalize_sqlite_url(raw: String) -> String {
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
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
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

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // Logs go to stderr so they never interleave with quiz prompts.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Accounts live only for the process, so credentials from the environment
/// are registered and signed in at startup.
async fn sign_in_from_env(auth: &InMemoryAuthProvider) -> Result<(), services::AuthError> {
    for (email_var, password_var) in [
        ("QUIZ_ADMIN_EMAIL", "QUIZ_ADMIN_PASSWORD"),
        ("QUIZ_USER_EMAIL", "QUIZ_USER_PASSWORD"),
    ] {
        let (Ok(email), Ok(password)) = (std::env::var(email_var), std::env::var(password_var))
        else {
            continue;
        };
        auth.sign_up(&email, &password).await?;
        return Ok(());
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();

    // Listing is the default when no subcommand is provided.
    let mut iter = argv.into_iter().peekable();
    let first = iter.peek().cloned();
    let cmd = match first.as_deref() {
        None => Command::List,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::List,
        Some(first) => {
            let cmd = Command::from_arg(first).ok_or_else(|| {
                eprintln!("unknown subcommand: {first}");
                print_usage();
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
            })?;
            iter.next();
            cmd
        }
    };

    let parsed = Args::parse(cmd, &mut iter, std::env::var("QUIZ_DB_URL").ok()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    init_tracing();
    tracing::debug!(?cmd, db_url = %parsed.db_url, "starting");
    prepare_sqlite_file(&parsed.db_url)?;

    let admin_email = std::env::var("QUIZ_ADMIN_EMAIL").ok();
    let auth = Arc::new(InMemoryAuthProvider::new(admin_email.as_deref()));
    sign_in_from_env(&auth).await?;
    let clock = Clock::default();
    let services =
        AppServices::new_sqlite(&parsed.db_url, clock, Arc::clone(&auth) as Arc<dyn AuthProvider>)
            .await?;

    match cmd {
        Command::List => list_quizzes(&services, parsed.category).await,
        Command::Take => {
            let quiz_id = parsed.quiz_id.ok_or(ArgsError::MissingQuizId)?;
            take(&services, quiz_id, parsed.name).await
        }
        Command::Stats => {
            let stats = services.analytics().dashboard(clock.now()).await?;
            if parsed.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
                return Ok(());
            }
            println!("Quizzes:       {}", stats.total_quizzes);
            println!("Submissions:   {}", stats.total_submissions);
            println!("Participants:  {}", stats.unique_participants);
            println!();
            println!("Last 7 days:");
            for day in &stats.daily_activity {
                println!("  {}  {}", day.date, day.submissions);
            }
            println!();
            println!("Recent:");
            for recent in &stats.recent {
                println!(
                    "  {}  {:<20} {:<24} {}/{}",
                    recent.completed_at.format("%Y-%m-%d %H:%M"),
                    recent.display_name,
                    recent.quiz_title,
                    recent.score.earned,
                    recent.score.total,
                );
            }
            Ok(())
        }
        Command::Participants => {
            let participants = services.analytics().participants(clock.now()).await?;
            if parsed.json {
                println!("{}", serde_json::to_string_pretty(&participants)?);
                return Ok(());
            }
            for p in &participants {
                println!(
                    "{:<24} {:>4} attempts  last {}",
                    p.display_name,
                    p.attempts,
                    p.last_activity.format("%Y-%m-%d %H:%M")
                );
            }
            Ok(())
        }
    }
}

async fn list_quizzes(
    services: &AppServices,
    category: Option<CategoryId>,
) -> Result<(), Box<dyn std::error::Error>> {
    let categories = services.categories().list().await?;
    let mut quizzes = services.quizzes().list_published().await?;
    if let Some(category) = category {
        quizzes.retain(|q| q.category_id == category);
    }
    if quizzes.is_empty() {
        println!("No published quizzes.");
        return Ok(());
    }

    for quiz in &quizzes {
        let category = categories
            .iter()
            .find(|c| c.id == quiz.category_id)
            .map_or("?", |c| c.name.as_str());
        println!(
            "{:>4}  {:<32} {:<16} {:>3} questions  {:>5} attempts  {:.1}*",
            quiz.id.value(),
            quiz.title,
            category,
            quiz.questions_count,
            quiz.attempts,
            quiz.rating
        );
    }
    Ok(())
}

async fn take(
    services: &AppServices,
    quiz_id: QuizId,
    name: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = services.quiz_taking().start_session(quiz_id).await?;
    if let Some(name) = name {
        session.set_display_name(name);
    }

    let mut input = BufReader::new(tokio::io::stdin());
    let mut out = std::io::stdout();
    if terminal::take_quiz(&mut session, &mut input, &mut out)
        .await?
        .is_none()
    {
        println!("Attempt not submitted.");
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
