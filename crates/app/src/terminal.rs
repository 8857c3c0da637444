use std::io::Write;

use quiz_core::model::{Question, Response};
use services::{QuizSession, SubmissionOutcome, SubmitError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// What the user typed at a question prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Answer(Response),
    Next,
    Back,
    Submit,
    Quit,
    Invalid,
}

fn parse_input(question: &Question, line: &str) -> Input {
    let trimmed = line.trim();
    match trimmed {
        ":q" => return Input::Quit,
        ":b" => return Input::Back,
        ":s" => return Input::Submit,
        "" => return Input::Next,
        _ => {}
    }

    if !question.kind().is_choice() {
        return Input::Answer(Response::text(trimmed));
    }
    trimmed
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|index| question.options().get(index))
        .map_or(Input::Invalid, |option| {
            Input::Answer(Response::Choice(option.id))
        })
}

fn render_question(
    out: &mut impl Write,
    session: &QuizSession,
    question: &Question,
) -> std::io::Result<()> {
    let progress = session.progress();
    writeln!(out)?;
    writeln!(
        out,
        "Question {}/{} ({} pts, {}% answered, {}s)",
        progress.index + 1,
        progress.total,
        question.points(),
        progress.percent_answered(),
        session.elapsed_seconds(),
    )?;
    writeln!(out, "{}", question.text())?;
    for (n, option) in question.options().iter().enumerate() {
        let picked = session
            .answer_for(question.id())
            .and_then(|a| a.selected_option())
            == Some(option.id);
        let marker = if picked { '*' } else { ' ' };
        writeln!(out, " {marker}{}. {}", n + 1, option.text)?;
    }
    if let Some(text) = session.answer_for(question.id()).and_then(|a| a.text()) {
        writeln!(out, "  current answer: {text}")?;
    }
    write!(out, "> ")?;
    out.flush()
}

async fn read_line<R>(input: &mut R) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    if input.read_line(&mut line).await? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

/// Drive `session` from line-based input until it is submitted or abandoned.
///
/// Returns `Ok(None)` when the user quits or input runs out before a
/// successful submission.
///
/// # Errors
///
/// Returns an I/O error if reading input or writing output fails.
pub async fn take_quiz<R, W>(
    session: &mut QuizSession,
    input: &mut R,
    out: &mut W,
) -> std::io::Result<Option<SubmissionOutcome>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "{}", session.quiz().title)?;
    writeln!(
        out,
        "Enter an option number or text. Empty line skips, :b goes back, :s submits, :q quits."
    )?;

    loop {
        let Some(question) = session.current_question().cloned() else {
            break;
        };
        render_question(out, session, &question)?;
        let Some(line) = read_line(input).await? else {
            return Ok(None);
        };

        match parse_input(&question, &line) {
            Input::Answer(response) => {
                session.answer_current(response);
                if !session.advance() {
                    break;
                }
            }
            Input::Next => {
                if !session.advance() {
                    break;
                }
            }
            Input::Back => {
                session.retreat();
            }
            Input::Submit => break,
            Input::Quit => return Ok(None),
            Input::Invalid => writeln!(out, "Pick one of the listed option numbers.")?,
        }
    }

    submit_with_prompts(session, input, out).await
}

async fn submit_with_prompts<R, W>(
    session: &mut QuizSession,
    input: &mut R,
    out: &mut W,
) -> std::io::Result<Option<SubmissionOutcome>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let progress = session.progress();
    writeln!(out)?;
    writeln!(out, "Answered {} of {} questions.", progress.answered, progress.total)?;

    loop {
        if session.display_name().trim().is_empty() {
            write!(out, "Your name: ")?;
            out.flush()?;
            let Some(line) = read_line(input).await? else {
                return Ok(None);
            };
            session.set_display_name(line.trim());
        }

        match session.submit().await {
            Ok(outcome) => {
                session.stop_timer();
                writeln!(
                    out,
                    "Score: {}/{} ({}%) in {}s",
                    outcome.score.earned,
                    outcome.score.total,
                    outcome.score.percent(),
                    session.elapsed_seconds(),
                )?;
                for (index, question) in session.questions().iter().enumerate() {
                    if let Some(explanation) = question.explanation() {
                        writeln!(out, "  {}. {explanation}", index + 1)?;
                    }
                }
                return Ok(Some(outcome));
            }
            Err(SubmitError::Validation(err)) => {
                writeln!(out, "{err}")?;
                session.set_display_name("");
            }
            Err(err @ SubmitError::Persistence { .. }) => {
                writeln!(out, "{err}")?;
                write!(out, "Retry? [y/N] ")?;
                out.flush()?;
                let retry = read_line(input)
                    .await?
                    .is_some_and(|l| l.trim().eq_ignore_ascii_case("y"));
                if !retry {
                    return Ok(None);
                }
            }
            Err(err) => {
                writeln!(out, "{err}")?;
                return Ok(None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{AnswerOption, QuestionDraft, QuizDraft};
    use quiz_core::time::fixed_now;
    use services::{AppServices, AuthProvider, Clock, InMemoryAuthProvider};
    use std::sync::Arc;

    async fn seeded() -> (AppServices, quiz_core::model::QuizId) {
        let auth = Arc::new(InMemoryAuthProvider::new(Some("admin@quiz.dev")));
        auth.sign_up("admin@quiz.dev", "password").await.unwrap();
        let services = AppServices::in_memory(
            Clock::fixed(fixed_now()),
            Arc::clone(&auth) as Arc<dyn AuthProvider>,
        );
        let category = services.categories().create("General", "book").await.unwrap();
        let quiz = services
            .quizzes()
            .create(QuizDraft::new("Warmup", category.id).published())
            .await
            .unwrap();
        services
            .questions()
            .add(QuestionDraft::multiple_choice(
                quiz.id,
                "2 + 2",
                vec![
                    AnswerOption::new(10, "3", false),
                    AnswerOption::new(20, "4", true),
                ],
                4,
            ))
            .await
            .unwrap();
        services
            .questions()
            .add(QuestionDraft::true_false(quiz.id, "Water is wet", true, 1))
            .await
            .unwrap();
        services
            .questions()
            .add(QuestionDraft::descriptive(quiz.id, "Say hi", "hi", 2))
            .await
            .unwrap();
        (services, quiz.id)
    }

    #[tokio::test]
    async fn answers_every_question_and_submits() {
        let (services, quiz_id) = seeded().await;
        let taking = services.quiz_taking().as_ref().clone().with_tick(None);
        let mut session = taking.start_session(quiz_id).await.unwrap();

        let mut input: &[u8] = b"2\n1\nhello\nAda\n";
        let mut out = Vec::new();
        let outcome = take_quiz(&mut session, &mut input, &mut out)
            .await
            .unwrap()
            .expect("submitted");

        assert_eq!(outcome.score.earned, 5);
        assert_eq!(outcome.score.total, 7);
        assert_eq!(session.display_name(), "Ada");
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("Score: 5/7 (71%)"));
    }

    #[tokio::test]
    async fn invalid_choice_reprompts_and_back_revisits() {
        let (services, quiz_id) = seeded().await;
        let taking = services.quiz_taking().as_ref().clone().with_tick(None);
        let mut session = taking.start_session(quiz_id).await.unwrap();

        let mut input: &[u8] = b"9\n1\n:b\n2\n\n:s\n\nGrace\n";
        let mut out = Vec::new();
        let outcome = take_quiz(&mut session, &mut input, &mut out)
            .await
            .unwrap()
            .expect("submitted");

        assert_eq!(outcome.score.earned, 4);
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("Pick one of the listed option numbers."));
        assert!(printed.contains("please enter your name before submitting"));
    }

    #[tokio::test]
    async fn quitting_leaves_nothing_submitted() {
        let (services, quiz_id) = seeded().await;
        let taking = services.quiz_taking().as_ref().clone().with_tick(None);
        let mut session = taking.start_session(quiz_id).await.unwrap();

        let mut input: &[u8] = b"2\n:q\n";
        let mut out = Vec::new();
        let outcome = take_quiz(&mut session, &mut input, &mut out).await.unwrap();

        assert!(outcome.is_none());
        let stats = services.analytics().dashboard(fixed_now()).await.unwrap();
        assert_eq!(stats.total_submissions, 0);
    }
}
