//! Terminal presentation shell.
//!
//! Renders engine state as plain text and turns input lines into engine
//! calls. Input and output are injected so tests can script a whole run.

use std::io::{BufRead, Write};

use quiz_core::model::{GradeLevel, QuizItem};
use services::{
    ActivityLoopService, ActivityRun, AdvanceOutcome, EnginePhase, Feedback, ProgressError,
    SubjectOverview,
};
use thiserror::Error;

use crate::catalog::{Activity, Catalog};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ShellError {
    #[error("terminal i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Progress(#[from] ProgressError),
}

/// How a played activity was left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellExit {
    /// The activity completed and the player chose not to replay.
    Finished,
    /// The player backed out (`q` or end of input).
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Choice(usize),
    Back,
    Invalid,
}

fn parse_choice(line: &str, options: usize) -> Input {
    let line = line.trim();
    if line.eq_ignore_ascii_case("q") {
        return Input::Back;
    }
    match line.parse::<usize>() {
        Ok(n) if (1..=options).contains(&n) => Input::Choice(n - 1),
        _ => Input::Invalid,
    }
}

/// Next input line, or `None` at end of input.
fn read_line(input: &mut impl BufRead) -> std::io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn is_back(line: Option<&str>) -> bool {
    line.is_none_or(|l| l.eq_ignore_ascii_case("q"))
}

//
// ─── PLAY ──────────────────────────────────────────────────────────────────────
//

/// Run one activity until it completes or the player backs out.
///
/// Completions are persisted through `activities` as passes finish. A failed
/// write is reported and retried on the next step, and once more on exit.
///
/// # Errors
///
/// Returns `ShellError` on terminal I/O failures or when a completion still
/// cannot be stored on exit.
pub async fn play<R: BufRead, W: Write>(
    activities: &ActivityLoopService,
    activity: &Activity,
    input: &mut R,
    out: &mut W,
) -> Result<ShellExit, ShellError> {
    let mut run = activities.start(activity.key().clone(), activity, activity.config().clone());
    writeln!(out, "== {} ({}) ==", activity.name(), activity.key().grade)?;
    if let Some(description) = activity.description() {
        writeln!(out, "{description}")?;
    }

    let exit = drive(activities, &mut run, input, out).await?;
    // Last chance for completions a failed write left behind.
    activities.flush(&mut run).await?;
    Ok(exit)
}

async fn drive<I: QuizItem, R: BufRead, W: Write>(
    activities: &ActivityLoopService,
    run: &mut ActivityRun<I>,
    input: &mut R,
    out: &mut W,
) -> Result<ShellExit, ShellError> {
    loop {
        match run.engine().phase() {
            EnginePhase::Loading => {
                writeln!(out, "This activity has no questions yet.")?;
                return Ok(ShellExit::Back);
            }
            EnginePhase::AwaitingAnswer => {
                render_item(run, out)?;
                let Some(line) = read_line(input)? else {
                    return Ok(ShellExit::Back);
                };
                match parse_choice(&line, run.engine().options().len()) {
                    Input::Back => return Ok(ShellExit::Back),
                    Input::Invalid => writeln!(
                        out,
                        "Pick a number from 1 to {}, or q to go back.",
                        run.engine().options().len()
                    )?,
                    Input::Choice(index) => {
                        if let Some(feedback) = run.engine_mut().submit_choice(index) {
                            render_feedback(feedback, out)?;
                        }
                    }
                }
            }
            EnginePhase::Answered => {
                let result = match run.engine().config().auto_advance_delay() {
                    Some(delay) => {
                        out.flush()?;
                        tokio::time::sleep(delay).await;
                        auto_advance(activities, run).await
                    }
                    None => {
                        writeln!(out, "Press Enter to continue, q to go back.")?;
                        let line = read_line(input)?;
                        if is_back(line.as_deref()) {
                            return Ok(ShellExit::Back);
                        }
                        activities.advance(run).await
                    }
                };
                match result {
                    Ok(outcome) => render_outcome(&outcome, out)?,
                    // The run keeps the completion and retries on the next step.
                    Err(err) => writeln!(out, "Progress not saved yet ({err}); will retry.")?,
                }
            }
            EnginePhase::Completed => {
                writeln!(out, "Type r to play again, or press Enter to go back.")?;
                match read_line(input)? {
                    Some(line) if line.eq_ignore_ascii_case("r") => run.engine_mut().reset(),
                    _ => return Ok(ShellExit::Finished),
                }
            }
        }
    }
}

/// Fire the pending auto-advance at its own deadline.
async fn auto_advance<I: QuizItem>(
    activities: &ActivityLoopService,
    run: &mut ActivityRun<I>,
) -> Result<AdvanceOutcome, ProgressError> {
    match run.engine().auto_advance_deadline() {
        Some(deadline) => Ok(activities
            .tick(run, deadline)
            .await?
            .unwrap_or(AdvanceOutcome::Ignored)),
        None => activities.advance(run).await,
    }
}

fn render_item<I: QuizItem>(run: &ActivityRun<I>, out: &mut impl Write) -> std::io::Result<()> {
    let engine = run.engine();
    let progress = engine.progress();
    let Some(item) = engine.current_item() else {
        return Ok(());
    };

    writeln!(out)?;
    write!(
        out,
        "Round {}, question {}/{}",
        progress.round, progress.position, progress.total
    )?;
    match progress.accuracy {
        Some(pct) => writeln!(out, "  (accuracy {pct}%)")?,
        None => writeln!(out)?,
    }
    writeln!(out, "{}", item.prompt())?;
    for (n, option) in engine.options().iter().enumerate() {
        writeln!(out, "  {}) {option}", n + 1)?;
    }
    write!(out, "> ")?;
    out.flush()
}

fn render_feedback(feedback: &Feedback, out: &mut impl Write) -> std::io::Result<()> {
    if feedback.correct {
        writeln!(out, "Correct!")?;
    } else {
        writeln!(out, "Not quite. The answer is {}.", feedback.answer)?;
    }
    if let Some(explanation) = &feedback.explanation {
        writeln!(out, "{explanation}")?;
    }
    if let Some(fact) = &feedback.fun_fact {
        writeln!(out, "Fun fact: {fact}")?;
    }
    Ok(())
}

fn render_outcome(outcome: &AdvanceOutcome, out: &mut impl Write) -> std::io::Result<()> {
    match outcome {
        AdvanceOutcome::Ignored | AdvanceOutcome::NextItem => Ok(()),
        AdvanceOutcome::NextRound { round, summary, .. } => writeln!(
            out,
            "\nPass finished: {}/{} ({}%). Starting round {round}.",
            summary.correct(),
            summary.total(),
            summary.percentage()
        ),
        AdvanceOutcome::Completed { summary, .. } => {
            writeln!(
                out,
                "\nAll done! You got {}/{} ({}%).",
                summary.correct(),
                summary.total(),
                summary.percentage()
            )?;
            if summary.is_perfect() {
                writeln!(out, "Perfect score!")?;
            }
            Ok(())
        }
    }
}

//
// ─── LISTINGS ──────────────────────────────────────────────────────────────────
//

/// Numbered activity list for one grade (or all grades).
///
/// # Errors
///
/// Returns the underlying I/O error.
pub fn render_catalog(
    catalog: &Catalog,
    grade: Option<GradeLevel>,
    out: &mut impl Write,
) -> std::io::Result<()> {
    for (n, activity) in catalog.for_grade(grade).enumerate() {
        writeln!(
            out,
            "{:>2}) {:<28} {} / {} ({} questions)",
            n + 1,
            activity.name(),
            activity.key().grade,
            activity.key().subject,
            activity.len()
        )?;
    }
    Ok(())
}

/// Progress report for one grade, one block per subject.
///
/// # Errors
///
/// Returns the underlying I/O error.
pub fn render_overview(
    grade: GradeLevel,
    overview: &[SubjectOverview],
    out: &mut impl Write,
) -> std::io::Result<()> {
    writeln!(out, "Progress for {grade}")?;
    for subject in overview {
        match subject.average_best() {
            Some(avg) => writeln!(out, "{} (average best {avg}%)", subject.subject)?,
            None => writeln!(out, "{} (not started)", subject.subject)?,
        }
        for activity in &subject.activities {
            writeln!(
                out,
                "  {:<28} best {:>3}%  last {}/{}  attempts {}",
                activity.key.activity,
                activity.best_percentage,
                activity.last_score.correct(),
                activity.last_score.total(),
                activity.attempts
            )?;
        }
    }
    Ok(())
}

/// Interactive menu: pick activities by number until `q`.
///
/// # Errors
///
/// Returns `ShellError` on terminal I/O failures or storage errors while
/// playing.
pub async fn menu<R: BufRead, W: Write>(
    activities: &ActivityLoopService,
    catalog: &Catalog,
    grade: Option<GradeLevel>,
    input: &mut R,
    out: &mut W,
) -> Result<(), ShellError> {
    let choices: Vec<&Activity> = catalog.for_grade(grade).collect();
    loop {
        writeln!(out)?;
        render_catalog(catalog, grade, out)?;
        write!(out, "Choose an activity (q to quit): ")?;
        out.flush()?;

        let Some(line) = read_line(input)? else {
            return Ok(());
        };
        match parse_choice(&line, choices.len()) {
            Input::Back => return Ok(()),
            Input::Invalid => writeln!(out, "Pick a number from 1 to {}.", choices.len())?,
            Input::Choice(index) => {
                let exit = play(activities, choices[index], input, out).await?;
                tracing::debug!(activity = %choices[index].key(), ?exit, "returned to menu");
            }
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
