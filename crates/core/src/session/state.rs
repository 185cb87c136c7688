//! Quiz progression as a plain state machine.
//!
//! [`SessionState::apply`] consumes one [`Event`] and returns the [`Effect`]s the owner must run
//! (API calls, timers, notifications). Nothing here touches the network or the clock, so every
//! transition can be exercised directly.

use crate::domain::quiz::{QuizHistoryItem, QuizItem, QuizState};
use std::time::Duration;

/// Wrong answers allowed per item before it is closed.
pub const MAX_ATTEMPTS: u32 = 3;

/// Pause between a verdict and the follow-up transition.
pub const TRANSITION_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Info,
    Warning,
    Error,
}

/// Transient, auto-dismissing message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// Move to the next item, or announce the end of the set. `exhausted` marks a forced move.
    Advance { exhausted: bool },
    /// Re-enable submission after a wrong answer or a failed check.
    ReleaseSubmit,
}

/// Identifies an in-flight answer check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitTicket {
    pub generation: u64,
    pub index: usize,
    pub quiz_id: i64,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Notify(Notification),
    Schedule {
        delay: Duration,
        generation: u64,
        action: TimerAction,
    },
    CancelTimers,
    CheckAnswer(SubmitTicket),
    FetchRound(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    QuizSetLoaded(Vec<QuizItem>),
    QuizSetFailed(String),
    HistoryLoaded(Vec<QuizHistoryItem>),
    HistoryMenuToggled,
    RoundSelected(i64),
    RoundLoaded { round: i64, items: Vec<QuizItem> },
    RoundFailed { round: i64, error: String },
    HintRequested(usize),
    AnswerChanged(String),
    SubmitRequested,
    AnswerChecked { ticket: SubmitTicket, correct: bool },
    AnswerCheckFailed { ticket: SubmitTicket, error: String },
    TimerElapsed { generation: u64, action: TimerAction },
}

/// Why a submission was not sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitBlocked {
    InFlight,
    NoQuiz,
    EmptyAnswer,
    AlreadySolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMarker {
    Current,
    Correct,
    Wrong,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintView {
    pub number: usize,
    pub content: String,
    pub locked: bool,
    pub can_unlock: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreSummary {
    pub total: usize,
    pub solved: usize,
    pub correct: usize,
    pub attempts: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub quizzes: Vec<QuizItem>,
    pub quiz_states: Vec<QuizState>,
    pub current_index: usize,
    pub unlocked_hints: usize,
    pub answer: String,
    pub submitting: bool,
    pub loading: bool,
    pub error: Option<String>,
    pub history: Vec<QuizHistoryItem>,
    pub history_menu_open: bool,
    pub selected_round: Option<i64>,
    pub round_loading: bool,
    /// Bumped whenever the quiz set is replaced.
    pub generation: u64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            quizzes: Vec::new(),
            quiz_states: Vec::new(),
            current_index: 0,
            unlocked_hints: 0,
            answer: String::new(),
            submitting: false,
            loading: true,
            error: None,
            history: Vec::new(),
            history_menu_open: false,
            selected_round: None,
            round_loading: false,
            generation: 0,
        }
    }
}

/// Functional form of [`SessionState::apply`].
pub fn reduce(mut state: SessionState, event: Event) -> (SessionState, Vec<Effect>) {
    let effects = state.apply(event);
    (state, effects)
}

impl SessionState {
    pub fn apply(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::QuizSetLoaded(items) => {
                self.replace_set(items);
                self.loading = false;
                self.error = None;
                vec![Effect::CancelTimers]
            }
            Event::QuizSetFailed(error) => {
                self.loading = false;
                self.error = Some(error);
                Vec::new()
            }
            Event::HistoryLoaded(history) => {
                self.history = history;
                Vec::new()
            }
            Event::HistoryMenuToggled => {
                self.history_menu_open = !self.history_menu_open;
                Vec::new()
            }
            Event::RoundSelected(round) => {
                self.round_loading = true;
                self.history_menu_open = false;
                vec![Effect::FetchRound(round)]
            }
            Event::RoundLoaded { round, items } => {
                self.round_loading = false;
                if items.is_empty() {
                    return vec![notify(
                        NotificationKind::Error,
                        format!("Round {round} has no quizzes."),
                    )];
                }
                self.replace_set(items);
                self.selected_round = Some(round);
                vec![Effect::CancelTimers]
            }
            Event::RoundFailed { round, error } => {
                self.round_loading = false;
                tracing::warn!(round, %error, "round load failed");
                vec![notify(
                    NotificationKind::Error,
                    "Failed to load the previous round.",
                )]
            }
            Event::HintRequested(number) => {
                self.unlock_hint(number);
                Vec::new()
            }
            Event::AnswerChanged(text) => {
                self.answer = text;
                Vec::new()
            }
            Event::SubmitRequested => self.begin_submit(),
            Event::AnswerChecked { ticket, correct } => self.apply_verdict(ticket, correct),
            Event::AnswerCheckFailed { ticket, error } => {
                if ticket.generation != self.generation {
                    return Vec::new();
                }
                tracing::warn!(quiz_id = ticket.quiz_id, %error, "answer check failed");
                vec![
                    notify(
                        NotificationKind::Error,
                        "Something went wrong. Please try again.",
                    ),
                    self.schedule(TimerAction::ReleaseSubmit),
                ]
            }
            Event::TimerElapsed { generation, action } => {
                if generation != self.generation {
                    return Vec::new();
                }
                self.on_timer(action)
            }
        }
    }

    pub fn submit_blocker(&self) -> Option<SubmitBlocked> {
        if self.submitting {
            return Some(SubmitBlocked::InFlight);
        }
        let Some(state) = self.current_state() else {
            return Some(SubmitBlocked::NoQuiz);
        };
        if state.solved {
            return Some(SubmitBlocked::AlreadySolved);
        }
        if self.answer.trim().is_empty() {
            return Some(SubmitBlocked::EmptyAnswer);
        }
        None
    }

    pub fn current_item(&self) -> Option<&QuizItem> {
        self.quizzes.get(self.current_index)
    }

    pub fn current_state(&self) -> Option<&QuizState> {
        self.quiz_states.get(self.current_index)
    }

    /// A selected historical round is read-only review: every hint is open.
    pub fn review_mode(&self) -> bool {
        self.selected_round.is_some()
    }

    pub fn is_last_item(&self) -> bool {
        self.current_index + 1 >= self.quizzes.len()
    }

    pub fn is_complete(&self) -> bool {
        !self.quiz_states.is_empty() && self.quiz_states.iter().all(|s| s.solved)
    }

    pub fn remaining_attempts(&self) -> u32 {
        self.current_state()
            .map_or(0, |s| MAX_ATTEMPTS.saturating_sub(s.attempts))
    }

    pub fn hint_views(&self) -> Vec<HintView> {
        let Some(item) = self.current_item() else {
            return Vec::new();
        };
        let hints = item.hints_lenient();
        let review = self.review_mode();
        let visible = if review {
            hints.len()
        } else {
            (self.unlocked_hints + 1).min(hints.len())
        };

        hints
            .into_iter()
            .take(visible)
            .enumerate()
            .map(|(idx, content)| {
                let number = idx + 1;
                HintView {
                    number,
                    content,
                    locked: !review && number > self.unlocked_hints,
                    can_unlock: review || number <= self.unlocked_hints + 1,
                }
            })
            .collect()
    }

    pub fn progress_markers(&self) -> Vec<ProgressMarker> {
        self.quiz_states
            .iter()
            .enumerate()
            .map(|(idx, s)| {
                if idx == self.current_index {
                    ProgressMarker::Current
                } else if s.solved && s.correct {
                    ProgressMarker::Correct
                } else if s.solved {
                    ProgressMarker::Wrong
                } else {
                    ProgressMarker::Pending
                }
            })
            .collect()
    }

    pub fn latest_round(&self) -> Option<i64> {
        self.history.iter().map(|h| h.round).max()
    }

    pub fn title(&self) -> String {
        match self.selected_round.or_else(|| self.latest_round()) {
            Some(round) => format!("Round {round}"),
            None => "Today's quiz".to_string(),
        }
    }

    pub fn score(&self) -> ScoreSummary {
        ScoreSummary {
            total: self.quiz_states.len(),
            solved: self.quiz_states.iter().filter(|s| s.solved).count(),
            correct: self.quiz_states.iter().filter(|s| s.solved && s.correct).count(),
            attempts: self.quiz_states.iter().map(|s| s.attempts).sum(),
        }
    }

    fn replace_set(&mut self, items: Vec<QuizItem>) {
        self.quiz_states = QuizState::fresh_for(&items);
        self.quizzes = items;
        self.current_index = 0;
        self.unlocked_hints = 0;
        self.answer.clear();
        self.submitting = false;
        self.generation += 1;
    }

    fn unlock_hint(&mut self, number: usize) {
        let available = self.current_item().map_or(0, QuizItem::hint_count);
        if number == 0 || number > self.unlocked_hints + 1 || number > available {
            tracing::debug!(number, unlocked = self.unlocked_hints, available, "hint request ignored");
            return;
        }
        // Re-opening an earlier hint never re-locks later ones.
        self.unlocked_hints = self.unlocked_hints.max(number);
    }

    fn begin_submit(&mut self) -> Vec<Effect> {
        if let Some(reason) = self.submit_blocker() {
            tracing::debug!(?reason, "submit ignored");
            return Vec::new();
        }
        let Some(item) = self.current_item() else {
            return Vec::new();
        };
        let ticket = SubmitTicket {
            generation: self.generation,
            index: self.current_index,
            quiz_id: item.id,
            answer: self.answer.clone(),
        };
        self.submitting = true;
        vec![Effect::CheckAnswer(ticket)]
    }

    fn apply_verdict(&mut self, ticket: SubmitTicket, correct: bool) -> Vec<Effect> {
        if ticket.generation != self.generation {
            tracing::debug!(quiz_id = ticket.quiz_id, "discarding verdict for a replaced quiz set");
            return Vec::new();
        }
        let Some(state) = self.quiz_states.get_mut(ticket.index) else {
            return Vec::new();
        };
        let attempts = state.attempts + 1;

        if correct {
            *state = QuizState {
                solved: true,
                correct: true,
                attempts,
            };
            return vec![
                notify(NotificationKind::Success, "Correct! 🎉"),
                self.schedule(TimerAction::Advance { exhausted: false }),
            ];
        }

        if attempts >= MAX_ATTEMPTS {
            *state = QuizState {
                solved: true,
                correct: false,
                attempts,
            };
            return vec![
                notify(
                    NotificationKind::Error,
                    format!("All {MAX_ATTEMPTS} attempts used. Moving to the next quiz."),
                ),
                self.schedule(TimerAction::Advance { exhausted: true }),
            ];
        }

        state.attempts = attempts;
        self.answer.clear();
        let left = MAX_ATTEMPTS - attempts;
        vec![
            notify(
                NotificationKind::Warning,
                format!(
                    "Wrong. {left} attempt{} left.",
                    if left == 1 { "" } else { "s" }
                ),
            ),
            self.schedule(TimerAction::ReleaseSubmit),
        ]
    }

    fn on_timer(&mut self, action: TimerAction) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let TimerAction::Advance { exhausted } = action {
            if !self.is_last_item() {
                self.current_index += 1;
                self.unlocked_hints = 0;
                self.answer.clear();
            } else if exhausted {
                effects.push(notify(
                    NotificationKind::Info,
                    "That's all for this round. Check back for the next one! 🎊",
                ));
            } else {
                effects.push(notify(
                    NotificationKind::Info,
                    "You've finished every quiz in this round! 🎊",
                ));
            }
        }
        self.submitting = false;
        effects
    }

    fn schedule(&self, action: TimerAction) -> Effect {
        Effect::Schedule {
            delay: TRANSITION_DELAY,
            generation: self.generation,
            action,
        }
    }
}

fn notify(kind: NotificationKind, message: impl Into<String>) -> Effect {
    Effect::Notify(Notification::new(kind, message))
}
