//! Reconcile a position with the notification feed.

use crate::records::{NotificationRecord, PositionRecord};
use tracing::{debug, warn};

/// Which rule produced a [`Match`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Order number, symbol, side and volume all agree
    Exact,
    /// Symbol, side and volume agree
    Fallback,
}

/// A notification matched to a position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match<'a> {
    /// The first entry satisfying `kind`
    pub notification: &'a NotificationRecord,
    /// Index of the entry in the feed
    pub index: usize,
    /// Rule that matched
    pub kind: MatchKind,
    /// Entries satisfying the same rule, including this one
    pub candidates: usize,
}

impl Match<'_> {
    /// More than one entry satisfied the winning rule
    #[must_use]
    pub const fn is_ambiguous(&self) -> bool {
        self.candidates > 1
    }
}

/// Equal and present. A missing field never matches.
fn same<T: PartialEq>(a: Option<&T>, b: Option<&T>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a == b)
}

fn same_trade(position: &PositionRecord, n: &NotificationRecord) -> bool {
    same(position.symbol.as_ref(), n.symbol.as_ref())
        && same(position.side.as_ref(), n.side.as_ref())
        && same(position.volume.as_ref(), n.volume.as_ref())
}

fn same_order(position: &PositionRecord, n: &NotificationRecord) -> bool {
    same(position.order_id.as_ref(), n.order_id.as_ref()) && same_trade(position, n)
}

fn first_of<'a>(
    notifications: &'a [NotificationRecord],
    kind: MatchKind,
    pred: impl Fn(&NotificationRecord) -> bool,
) -> Option<Match<'a>> {
    let mut hits = notifications.iter().enumerate().filter(|(_, n)| pred(n));
    let (index, notification) = hits.next()?;
    let candidates = 1 + hits.count();
    Some(Match {
        notification,
        index,
        kind,
        candidates,
    })
}

/// Find the notification for `position`.
///
/// Tries an exact match on order number plus symbol, side and volume, then a
/// fallback on symbol, side and volume alone. The first entry in feed order
/// wins either way; when several entries satisfy the winning rule the
/// ambiguity is logged and reported through [`Match::candidates`].
#[must_use]
pub fn match_position<'a>(
    position: &PositionRecord,
    notifications: &'a [NotificationRecord],
) -> Option<Match<'a>> {
    let found = first_of(notifications, MatchKind::Exact, |n| same_order(position, n))
        .or_else(|| first_of(notifications, MatchKind::Fallback, |n| same_trade(position, n)));

    match &found {
        Some(m) if m.is_ambiguous() => warn!(
            kind = ?m.kind,
            candidates = m.candidates,
            order_id = ?position.order_id,
            "several notifications match position, using the first"
        ),
        Some(m) => debug!(kind = ?m.kind, index = m.index, "notification matched"),
        None => debug!(order_id = ?position.order_id, "no notification matches position"),
    }
    found
}
