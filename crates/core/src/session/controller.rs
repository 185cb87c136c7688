use crate::api::QuizApi;
use crate::domain::quiz::QuizState;
use crate::session::state::{
    Effect, Event, Notification, NotificationKind, SessionState, SubmitBlocked, SubmitTicket,
    TimerAction,
};
use crate::session::timer::TimerQueue;
use crate::suggest::StockSuggestions;
use std::sync::Arc;
use uuid::Uuid;

/// Result of [`QuizSession::initialize`].
#[derive(Debug)]
pub enum InitOutcome {
    /// Quiz set and history both loaded.
    Ready,
    /// Quiz set loaded; history could not be fetched and stays empty.
    Partial { history_error: anyhow::Error },
    /// The quiz set could not be loaded; the session shows an error and goes no further.
    Failed(anyhow::Error),
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Ignored(SubmitBlocked),
    Checked {
        correct: bool,
        state: QuizState,
    },
    Failed(anyhow::Error),
}

/// Owns one quiz session: state, API access and the timers driving delayed transitions.
///
/// Methods take `&mut self`, so events are applied strictly one after another. Dropping the
/// session aborts every pending timer.
pub struct QuizSession {
    id: Uuid,
    api: Arc<dyn QuizApi>,
    state: SessionState,
    timers: TimerQueue,
    suggestions: StockSuggestions,
    notifications: Vec<Notification>,
}

impl QuizSession {
    pub fn new(api: Arc<dyn QuizApi>) -> Self {
        Self {
            id: Uuid::new_v4(),
            api,
            state: SessionState::default(),
            timers: TimerQueue::new(),
            suggestions: StockSuggestions::default(),
            notifications: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn suggestions(&self, query: &str) -> Vec<&str> {
        self.suggestions.filter(query)
    }

    pub fn has_pending_timers(&self) -> bool {
        self.timers.pending() > 0
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Loads the current quiz set, then the round history, then the autocomplete list.
    pub async fn initialize(&mut self) -> InitOutcome {
        let items = match self.api.fetch_current_quiz_set().await {
            Ok(items) if items.is_empty() => Err(anyhow::anyhow!("no quiz is available right now")),
            other => other,
        };
        let items = match items {
            Ok(items) => items,
            Err(err) => {
                tracing::error!(session_id = %self.id, error = %err, "quiz set load failed");
                self.dispatch(Event::QuizSetFailed(format!("{err:#}")));
                return InitOutcome::Failed(err);
            }
        };
        tracing::info!(session_id = %self.id, quizzes = items.len(), "quiz set loaded");
        self.dispatch(Event::QuizSetLoaded(items));

        let outcome = match self.api.fetch_history().await {
            Ok(history) => {
                self.dispatch(Event::HistoryLoaded(history));
                InitOutcome::Ready
            }
            Err(err) => {
                tracing::warn!(session_id = %self.id, error = %err, "quiz history unavailable");
                InitOutcome::Partial { history_error: err }
            }
        };

        self.suggestions = StockSuggestions::load(self.api.as_ref()).await;
        outcome
    }

    /// Switches to a past round. Returns whether the round replaced the current set.
    pub async fn select_round(&mut self, round: i64) -> bool {
        let generation = self.state.generation;
        for effect in self.dispatch(Event::RoundSelected(round)) {
            let Effect::FetchRound(round) = effect else {
                continue;
            };
            let event = match self.api.fetch_round_quiz_set(round).await {
                Ok(items) => Event::RoundLoaded { round, items },
                Err(err) => Event::RoundFailed {
                    round,
                    error: format!("{err:#}"),
                },
            };
            self.dispatch(event);
        }
        let loaded = self.state.generation != generation;
        tracing::info!(session_id = %self.id, round, loaded, "round selection finished");
        loaded
    }

    pub fn toggle_history_menu(&mut self) {
        self.dispatch(Event::HistoryMenuToggled);
    }

    pub fn unlock_hint(&mut self, number: usize) {
        self.dispatch(Event::HintRequested(number));
    }

    pub fn set_answer(&mut self, text: impl Into<String>) {
        self.dispatch(Event::AnswerChanged(text.into()));
    }

    pub async fn submit(&mut self) -> SubmitOutcome {
        if let Some(reason) = self.state.submit_blocker() {
            return SubmitOutcome::Ignored(reason);
        }

        let mut outcome = SubmitOutcome::Ignored(SubmitBlocked::InFlight);
        for effect in self.dispatch(Event::SubmitRequested) {
            let Effect::CheckAnswer(ticket) = effect else {
                continue;
            };
            outcome = self.check(ticket).await;
        }
        outcome
    }

    async fn check(&mut self, ticket: SubmitTicket) -> SubmitOutcome {
        let index = ticket.index;
        match self.api.check_answer(ticket.quiz_id, &ticket.answer).await {
            Ok(res) => {
                let correct = res.is_success;
                tracing::info!(session_id = %self.id, quiz_id = ticket.quiz_id, correct, "answer checked");
                self.dispatch(Event::AnswerChecked { ticket, correct });
                let state = self.state.quiz_states.get(index).copied().unwrap_or_default();
                SubmitOutcome::Checked { correct, state }
            }
            Err(err) => {
                self.dispatch(Event::AnswerCheckFailed {
                    ticket,
                    error: format!("{err:#}"),
                });
                SubmitOutcome::Failed(err)
            }
        }
    }

    /// Waits for the next pending transition and applies it.
    pub async fn next_timer(&mut self) -> Option<TimerAction> {
        let fired = self.timers.next().await?;
        self.dispatch(Event::TimerElapsed {
            generation: fired.generation,
            action: fired.action,
        });
        Some(fired.action)
    }

    /// Applies every pending transition, waiting out their delays.
    pub async fn settle(&mut self) {
        while self.next_timer().await.is_some() {}
    }

    /// Applies `event` and runs its local effects; API effects are returned to the caller.
    fn dispatch(&mut self, event: Event) -> Vec<Effect> {
        let mut remote = Vec::new();
        for effect in self.state.apply(event) {
            match effect {
                Effect::Notify(n) => {
                    match n.kind {
                        NotificationKind::Error => {
                            tracing::warn!(session_id = %self.id, message = %n.message, "notify")
                        }
                        _ => tracing::debug!(session_id = %self.id, kind = ?n.kind, message = %n.message, "notify"),
                    }
                    self.notifications.push(n);
                }
                Effect::Schedule {
                    delay,
                    generation,
                    action,
                } => self.timers.schedule(delay, generation, action),
                Effect::CancelTimers => self.timers.cancel_all(),
                Effect::CheckAnswer(_) | Effect::FetchRound(_) => remote.push(effect),
            }
        }
        remote
    }
}

impl std::fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuizSession")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("pending_timers", &self.timers.pending())
            .finish()
    }
}
