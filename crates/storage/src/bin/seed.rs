use std::fmt;

use chrono::{DateTime, Duration, Utc};
use quiz_core::model::{
    AnswerOption, CategoryDraft, QuestionDraft, QuizDraft, Response, Score, SubmissionSnapshot,
};
use quiz_core::session::{AnswerStore, score};
use storage::repository::Storage;

const SAMPLE_NAMES: [&str; 4] = ["Ada", "Grace", "Linus", "Barbara"];

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    submissions: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
    InvalidSubmissions { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
            ArgsError::InvalidSubmissions { raw } => {
                write!(f, "invalid --submissions value: {raw}")
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("QUIZ_DB_URL").unwrap_or_else(|_| "sqlite:quiz.sqlite3".into());
        let mut submissions = std::env::var("QUIZ_SEED_SUBMISSIONS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(4);
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
                "--submissions" => {
                    let value = require_value(&mut args, "--submissions")?;
                    submissions = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidSubmissions { raw: value.clone() })?;
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
            submissions,
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
    eprintln!("  --submissions <n>         Sample submissions to append (default: 4)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  QUIZ_DB_URL, QUIZ_SEED_SUBMISSIONS");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let draft = CategoryDraft::new("Programming", "code").validate(now)?;
    let category = match storage
        .categories
        .list_categories()
        .await?
        .into_iter()
        .find(|c| c.name == draft.name)
    {
        Some(existing) => existing,
        None => storage.categories.insert_category(draft).await?,
    };

    let mut quiz_draft = QuizDraft::new("Rust Fundamentals", category.id).published();
    quiz_draft.description = "Ownership, borrowing and the basics of the type system.".into();
    quiz_draft.time_estimate = "5 min".into();
    quiz_draft.thumbnail_url =
        Some("https://images.unsplash.com/photo-1515879218367-8466d910aaa4".into());
    let quiz_draft = quiz_draft.validate(now)?;

    let quiz = match storage
        .quizzes
        .list_quizzes(Some(category.id))
        .await?
        .into_iter()
        .find(|q| q.title == quiz_draft.title)
    {
        Some(existing) => existing,
        None => storage.quizzes.insert_quiz(quiz_draft).await?,
    };

    let mut questions = storage.questions.list_questions(quiz.id).await?;
    if questions.is_empty() {
        let drafts = [
            QuestionDraft::multiple_choice(
                quiz.id,
                "Which keyword makes a binding mutable?",
                vec![
                    AnswerOption::new(1, "mut", true),
                    AnswerOption::new(2, "var", false),
                    AnswerOption::new(3, "let!", false),
                ],
                10,
            )
            .with_explanation("Bindings are immutable unless declared with `mut`."),
            QuestionDraft::true_false(quiz.id, "A value can have two owners at once.", false, 5),
            QuestionDraft::descriptive(
                quiz.id,
                "Explain what the borrow checker guarantees.",
                "No data races and no dangling references.",
                15,
            ),
        ];
        for draft in drafts {
            let question = storage.questions.insert_question(draft.validate()?).await?;
            storage.quizzes.adjust_questions_count(quiz.id, 1).await?;
            questions.push(question);
        }
    }

    for i in 0..args.submissions {
        let mut answers = AnswerStore::new();
        for (n, question) in questions.iter().enumerate() {
            let response = if question.kind().is_choice() {
                let pick = (i as usize + n) % question.options().len().max(1);
                question
                    .options()
                    .get(pick)
                    .map_or_else(|| Response::choice(1), |o| Response::Choice(o.id))
            } else {
                Response::text("Memory safety without a garbage collector.")
            };
            answers.record_answer(question, response);
        }
        let frozen: Score = score(&questions, &answers);
        let name = SAMPLE_NAMES[i as usize % SAMPLE_NAMES.len()];
        let snapshot = SubmissionSnapshot::new(
            quiz.id,
            None,
            name,
            frozen,
            now - Duration::hours(i64::from(i) * 20),
            answers.to_submitted(),
        )?;
        storage.submissions.create_submission(&snapshot).await?;
        storage.quizzes.increment_attempts(quiz.id).await?;
    }

    println!(
        "Seeded quiz {} ({} questions) with {} submissions into {}",
        quiz.id.value(),
        questions.len(),
        args.submissions,
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
