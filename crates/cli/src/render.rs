use chartquiz_core::domain::chart::{Candle, PriceAxis};
use chartquiz_core::domain::quiz::QuizHistoryItem;
use chartquiz_core::session::{
    HintView, Notification, NotificationKind, ProgressMarker, SessionState,
};
use std::fmt::Write;

const UP_BODY: char = '█';
const DOWN_BODY: char = '░';
const WICK: char = '│';
const AXIS_WIDTH: usize = 10;

pub fn screen(state: &SessionState, chart_rows: usize) -> String {
    let mut out = header(state);
    out.push('\n');

    if let Some(item) = state.current_item() {
        match item.candles() {
            Ok(candles) => out.push_str(&chart(&candles, chart_rows)),
            Err(err) => {
                tracing::warn!(quiz_id = item.id, error = %err, "chart data unreadable");
                out.push_str("(chart unavailable)\n");
            }
        }
    }
    out.push('\n');
    out.push_str(&hints(&state.hint_views(), state.review_mode()));

    if let Some(s) = state.current_state() {
        if !s.solved {
            let _ = writeln!(out, "Attempts left: {}", state.remaining_attempts());
        }
    }
    out
}

pub fn header(state: &SessionState) -> String {
    let markers: String = state
        .progress_markers()
        .iter()
        .map(|m| match m {
            ProgressMarker::Current => '●',
            ProgressMarker::Correct => '✔',
            ProgressMarker::Wrong => '✘',
            ProgressMarker::Pending => '○',
        })
        .collect();

    format!(
        "== {} == question {}/{}  {}\n",
        state.title(),
        state.current_index + 1,
        state.quizzes.len(),
        markers
    )
}

/// Text candlestick chart, one two-column slot per candle, scaled to `rows` lines.
pub fn chart(candles: &[Candle], rows: usize) -> String {
    let Some(axis) = PriceAxis::for_candles(candles) else {
        return "(no chart data)\n".to_string();
    };
    let rows = rows.max(2);

    let mut out = String::new();
    for row in 0..rows {
        let label = if row == 0 {
            format!("{:>w$.0}", axis.max, w = AXIS_WIDTH)
        } else if row == rows - 1 {
            format!("{:>w$.0}", axis.min, w = AXIS_WIDTH)
        } else {
            " ".repeat(AXIS_WIDTH)
        };
        out.push_str(&label);
        out.push_str(" ┤");

        for c in candles {
            out.push(glyph(c, &axis, row, rows));
            out.push(' ');
        }
        out.push('\n');
    }

    if let (Some(first), Some(last)) = (candles.first(), candles.last()) {
        let _ = writeln!(
            out,
            "{:w$}  {} .. {}",
            "",
            first.label,
            last.label,
            w = AXIS_WIDTH
        );
    }
    out
}

fn glyph(c: &Candle, axis: &PriceAxis, row: usize, rows: usize) -> char {
    let high = axis.row(c.high, rows);
    let low = axis.row(c.low, rows);
    let body_top = axis.row(c.body_top(), rows);
    let body_bottom = axis.row(c.body_bottom(), rows);

    if (body_top..=body_bottom).contains(&row) {
        if c.is_up() {
            UP_BODY
        } else {
            DOWN_BODY
        }
    } else if (high..=low).contains(&row) {
        WICK
    } else {
        ' '
    }
}

pub fn hints(views: &[HintView], review: bool) -> String {
    if views.is_empty() {
        return "No hints for this quiz.\n".to_string();
    }
    let mut out = String::new();
    for h in views {
        if h.locked {
            let action = if h.can_unlock {
                format!("type :hint {} to reveal", h.number)
            } else {
                "locked".to_string()
            };
            let _ = writeln!(out, "Hint {}: [{}]", h.number, action);
        } else {
            let _ = writeln!(out, "Hint {}: {}", h.number, h.content);
        }
    }
    if review {
        out.push_str("(review mode: all hints are open)\n");
    }
    out
}

pub fn notification(n: &Notification) -> String {
    let prefix = match n.kind {
        NotificationKind::Success => "[ok]",
        NotificationKind::Info => "[info]",
        NotificationKind::Warning => "[warn]",
        NotificationKind::Error => "[error]",
    };
    format!("{prefix} {}", n.message)
}

pub fn history(items: &[QuizHistoryItem]) -> String {
    if items.is_empty() {
        return "No past rounds.\n".to_string();
    }
    let mut out = String::new();
    for item in items {
        let date = item
            .created_date()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| item.created_at.clone());
        let _ = writeln!(out, "Round {:<4} {}", item.round, date);
    }
    out
}
