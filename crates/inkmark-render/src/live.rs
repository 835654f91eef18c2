//! Incremental rendering while a stroke is being drawn.

use crate::command::DrawCommand;
use crate::rng::SimpleRng;
use crate::styles::{Ink, render_ink, render_segment};
use inkmark_core::capture::StrokeDraft;

/// Most points the live tail looks back over.
pub const LIVE_TAIL_POINTS: usize = 4;

/// Commands for the newest part of a draft.
///
/// A one-point draft renders as a dot; otherwise only the last segment is
/// drawn, smoothed with at most [`LIVE_TAIL_POINTS`] trailing points.
pub fn render_live_tail(draft: &StrokeDraft, rng: &mut SimpleRng) -> Vec<DrawCommand> {
    let ink = Ink::from_draft(draft);
    if ink.points.len() < 2 {
        return render_ink(&ink, rng);
    }
    let start = ink.points.len().saturating_sub(LIVE_TAIL_POINTS);
    let tail = ink.tail(start);
    render_segment(&tail, tail.points.len() - 2, rng)
}
