use anyhow::Context;
use chartquiz_core::api::HttpQuizApi;
use chartquiz_core::session::{InitOutcome, QuizSession, SubmitBlocked, SubmitOutcome};
use clap::Parser;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod input;
mod render;

use input::Command;

#[derive(Debug, Parser)]
#[command(name = "chartquiz")]
struct Args {
    /// Open a past round instead of the current quiz set.
    #[arg(long)]
    round: Option<i64>,

    /// Print the past rounds and exit.
    #[arg(long)]
    history: bool,

    /// Print company names containing TEXT and exit.
    #[arg(long, value_name = "TEXT")]
    suggest: Option<String>,

    /// Chart height in text rows.
    #[arg(long, default_value_t = 12)]
    chart_rows: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = chartquiz_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let api = HttpQuizApi::from_settings(&settings)?;
    let mut session = QuizSession::new(Arc::new(api));
    tracing::info!(session_id = %session.id(), "session started");

    match session.initialize().await {
        InitOutcome::Ready => {}
        InitOutcome::Partial { history_error } => {
            tracing::warn!(error = %history_error, "continuing without round history");
        }
        InitOutcome::Failed(err) => {
            sentry_anyhow::capture_anyhow(&err);
            eprintln!("Could not load the quiz: {err:#}");
            return Err(err);
        }
    }

    if args.history {
        print!("{}", render::history(&session.state().history));
        return Ok(());
    }

    if let Some(query) = args.suggest.as_deref() {
        for name in session.suggestions(query) {
            println!("{name}");
        }
        return Ok(());
    }

    if let Some(round) = args.round {
        if !session.select_round(round).await {
            flush_notifications(&mut session);
            anyhow::bail!("round {round} could not be loaded");
        }
    }

    run(&mut session, args.chart_rows).await
}

async fn run(session: &mut QuizSession, chart_rows: usize) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", input::HELP);
    println!();
    print!("{}", render::screen(session.state(), chart_rows));

    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let redraw = match Command::parse(&line) {
            Command::Empty => false,
            Command::Quit => break,
            Command::Help => {
                println!("{}", input::HELP);
                false
            }
            Command::Invalid(msg) => {
                println!("{msg}");
                false
            }
            Command::History => {
                print!("{}", render::history(&session.state().history));
                false
            }
            Command::Suggest(query) => {
                let names = session.suggestions(&query);
                if names.is_empty() {
                    println!("No matching companies.");
                }
                for name in names {
                    println!("  {name}");
                }
                false
            }
            Command::Hint(n) => {
                let before = session.state().unlocked_hints;
                session.unlock_hint(n);
                if session.state().unlocked_hints == before && !session.state().review_mode() {
                    println!("Reveal hints in order: next is hint {}.", before + 1);
                }
                true
            }
            Command::Round(round) => {
                session.select_round(round).await;
                true
            }
            Command::Answer(text) => {
                submit(session, text).await;
                true
            }
        };

        flush_notifications(session);
        if redraw {
            if session.state().is_complete() {
                let score = session.state().score();
                println!(
                    "Score: {}/{} correct with {} attempts. Type :round N to review a past round or :quit.",
                    score.correct, score.total, score.attempts
                );
            }
            println!();
            print!("{}", render::screen(session.state(), chart_rows));
        }
    }

    Ok(())
}

async fn submit(session: &mut QuizSession, text: String) {
    session.set_answer(text);
    match session.submit().await {
        SubmitOutcome::Ignored(SubmitBlocked::AlreadySolved) => {
            println!("This quiz is already closed.");
        }
        SubmitOutcome::Ignored(reason) => {
            tracing::debug!(?reason, "submission ignored");
        }
        SubmitOutcome::Checked { .. } => {}
        SubmitOutcome::Failed(err) => {
            sentry_anyhow::capture_anyhow(&err);
        }
    }
    // Show the verdict before waiting out the transition.
    flush_notifications(session);
    session.settle().await;
}

fn flush_notifications(session: &mut QuizSession) {
    for n in session.drain_notifications() {
        println!("{}", render::notification(&n));
    }
}

fn init_sentry(settings: &chartquiz_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
