use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use inkroom_shared::{Member, Segment, ServerMessage, Stroke};
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

pub const MAX_STROKES: usize = 2000;
pub const MAX_SEGMENTS_PER_STROKE: usize = 5000;

pub const PALETTE: [&str; 8] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#FFA07A", "#98D8C8", "#F7DC6F", "#BB8FCE", "#85C1E2",
];

pub type RoomHandle = Arc<RwLock<Room>>;

#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<RwLock<HashMap<String, RoomHandle>>>,
    pub directory: Arc<RwLock<crate::rooms::RoomDirectory>>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            directory: Arc::new(RwLock::new(crate::rooms::RoomDirectory::new())),
        }
    }
}

/// One room's shared mutable state plus the outbound channel of every
/// connection currently attached to it. All mutation happens under the
/// room's write lock; broadcasting is queued after the guard is dropped.
pub struct Room {
    pub state: RoomState,
    pub peers: HashMap<Uuid, mpsc::UnboundedSender<ServerMessage>>,
}

impl Room {
    pub fn new() -> Self {
        Self {
            state: RoomState::new(),
            peers: HashMap::new(),
        }
    }
}

/// The authoritative drawing state of one room. Clients never compute this
/// independently; their views are caches of what the server pushes.
#[derive(Default)]
pub struct RoomState {
    history: Vec<Stroke>,
    undone: Vec<Stroke>,
    in_progress: HashMap<Uuid, Stroke>,
    members: HashMap<Uuid, Member>,
    color_cursor: usize,
}

impl RoomState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts (or overwrites, for a re-join) a member. Missing profile
    /// fields are defaulted: color from the fixed palette keyed by a
    /// per-room counter, name as "User N".
    pub fn join(&mut self, user_id: Uuid, name: Option<String>, color: Option<String>) -> &Member {
        let color = color.unwrap_or_else(|| {
            let picked = PALETTE[self.color_cursor % PALETTE.len()];
            self.color_cursor += 1;
            picked.to_string()
        });
        let name = name.unwrap_or_else(|| format!("User {}", self.members.len() + 1));
        self.members.insert(
            user_id,
            Member {
                id: user_id.to_string(),
                color,
                name,
            },
        );
        &self.members[&user_id]
    }

    /// Removes a member. Any stroke they were still drawing is discarded,
    /// never committed.
    pub fn leave(&mut self, user_id: Uuid) {
        self.members.remove(&user_id);
        self.in_progress.remove(&user_id);
    }

    pub fn member(&self, user_id: Uuid) -> Option<&Member> {
        self.members.get(&user_id)
    }

    pub fn roster(&self) -> Vec<Member> {
        let mut members = self.members.values().cloned().collect::<Vec<_>>();
        members.sort_by(|a, b| a.id.cmp(&b.id));
        members
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Opens a fresh in-progress stroke for the user. A second begin without
    /// a matching end abandons the first stroke.
    pub fn begin_stroke(&mut self, user_id: Uuid) {
        let timestamp = epoch_millis();
        self.in_progress.insert(
            user_id,
            Stroke {
                id: format!("{timestamp}-{user_id}"),
                user_id: user_id.to_string(),
                segments: Vec::new(),
                timestamp,
            },
        );
    }

    /// Appends to the user's in-progress stroke. A segment with no matching
    /// begin (reconnect race) is ignored, not an error.
    pub fn append_segment(&mut self, user_id: Uuid, segment: Segment) {
        if let Some(stroke) = self.in_progress.get_mut(&user_id) {
            if stroke.segments.len() < MAX_SEGMENTS_PER_STROKE {
                stroke.segments.push(segment);
            }
        }
    }

    /// Commits the user's in-progress stroke to the tail of history and
    /// invalidates the redo branch. An empty stroke (click with no drag)
    /// is dropped without mutating anything.
    pub fn end_stroke(&mut self, user_id: Uuid) -> Option<Stroke> {
        let has_segments = self
            .in_progress
            .get(&user_id)
            .is_some_and(|stroke| !stroke.segments.is_empty());
        if !has_segments {
            return None;
        }
        let stroke = self.in_progress.remove(&user_id)?;
        self.history.push(stroke.clone());
        let overflow = self.history.len().saturating_sub(MAX_STROKES);
        if overflow > 0 {
            self.history.drain(0..overflow);
        }
        self.undone.clear();
        Some(stroke)
    }

    /// Pops the most recent committed stroke onto the redo stack. Global
    /// per room: any member may undo anyone's last stroke.
    pub fn undo(&mut self) -> Option<Stroke> {
        let popped = self.history.pop()?;
        self.undone.push(popped.clone());
        Some(popped)
    }

    pub fn redo(&mut self) -> Option<Stroke> {
        let restored = self.undone.pop()?;
        self.history.push(restored.clone());
        Some(restored)
    }

    /// Resets the drawing. Not undoable.
    pub fn clear(&mut self) {
        self.history.clear();
        self.undone.clear();
        self.in_progress.clear();
    }

    /// Committed strokes only; a late joiner never sees a partial stroke.
    pub fn snapshot(&self) -> Vec<Stroke> {
        self.history.clone()
    }

    pub fn history(&self) -> &[Stroke] {
        &self.history
    }

    #[cfg(test)]
    pub fn undone(&self) -> &[Stroke] {
        &self.undone
    }

    #[cfg(test)]
    pub fn has_in_progress(&self, user_id: Uuid) -> bool {
        self.in_progress.contains_key(&user_id)
    }
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkroom_shared::Tool;

    fn segment() -> Segment {
        Segment {
            x0: 0.0,
            y0: 0.0,
            x1: 10.0,
            y1: 10.0,
            color: "#000000".to_string(),
            size: 5.0,
            tool: Tool::Pen,
        }
    }

    fn commit_stroke(state: &mut RoomState, user: Uuid, segments: usize) -> Stroke {
        state.begin_stroke(user);
        for _ in 0..segments {
            state.append_segment(user, segment());
        }
        state.end_stroke(user).expect("stroke should commit")
    }

    #[test]
    fn history_order_follows_end_stroke_order() {
        let mut state = RoomState::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        state.begin_stroke(a);
        state.begin_stroke(b);
        // Interleaved segment arrival must not affect commit order.
        state.append_segment(b, segment());
        state.append_segment(a, segment());
        state.append_segment(b, segment());
        let first = state.end_stroke(b).unwrap();
        let second = state.end_stroke(a).unwrap();
        assert_eq!(state.history(), &[first, second]);
    }

    #[test]
    fn empty_stroke_is_never_committed() {
        let mut state = RoomState::new();
        let user = Uuid::new_v4();
        state.begin_stroke(user);
        assert!(state.end_stroke(user).is_none());
        assert!(state.history().is_empty());
    }

    #[test]
    fn append_without_begin_is_a_noop() {
        let mut state = RoomState::new();
        let user = Uuid::new_v4();
        state.append_segment(user, segment());
        assert!(state.end_stroke(user).is_none());
        assert!(state.history().is_empty());
    }

    #[test]
    fn second_begin_abandons_first_stroke() {
        let mut state = RoomState::new();
        let user = Uuid::new_v4();
        state.begin_stroke(user);
        state.append_segment(user, segment());
        state.begin_stroke(user);
        assert!(state.end_stroke(user).is_none());
    }

    #[test]
    fn undo_then_redo_restores_history_exactly() {
        let mut state = RoomState::new();
        let user = Uuid::new_v4();
        commit_stroke(&mut state, user, 2);
        commit_stroke(&mut state, user, 1);
        let before = state.history().to_vec();
        let popped = state.undo().unwrap();
        assert_eq!(state.history().len(), 1);
        assert_eq!(state.undone(), std::slice::from_ref(&popped));
        state.redo().unwrap();
        assert_eq!(state.history(), before.as_slice());
        assert!(state.undone().is_empty());
    }

    #[test]
    fn commit_clears_redo_branch_but_undo_does_not() {
        let mut state = RoomState::new();
        let user = Uuid::new_v4();
        commit_stroke(&mut state, user, 1);
        commit_stroke(&mut state, user, 1);
        state.undo().unwrap();
        state.undo().unwrap();
        assert_eq!(state.undone().len(), 2);
        commit_stroke(&mut state, user, 1);
        assert!(state.undone().is_empty());
    }

    #[test]
    fn undo_on_empty_history_is_a_noop() {
        let mut state = RoomState::new();
        assert!(state.undo().is_none());
        assert!(state.redo().is_none());
    }

    #[test]
    fn clear_resets_everything_and_is_not_undoable() {
        let mut state = RoomState::new();
        let user = Uuid::new_v4();
        commit_stroke(&mut state, user, 1);
        state.undo().unwrap();
        state.begin_stroke(user);
        state.append_segment(user, segment());
        state.clear();
        assert!(state.history().is_empty());
        assert!(state.undone().is_empty());
        assert!(!state.has_in_progress(user));
        assert!(state.undo().is_none());
    }

    #[test]
    fn leave_discards_in_progress_stroke() {
        let mut state = RoomState::new();
        let user = Uuid::new_v4();
        state.join(user, None, None);
        state.begin_stroke(user);
        state.append_segment(user, segment());
        state.leave(user);
        assert!(state.end_stroke(user).is_none());
        assert!(state.history().is_empty());
    }

    #[test]
    fn join_defaults_follow_palette_and_counter() {
        let mut state = RoomState::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let first = state.join(a, None, None).clone();
        let second = state.join(b, None, None).clone();
        assert_eq!(first.color, PALETTE[0]);
        assert_eq!(second.color, PALETTE[1]);
        assert_eq!(second.name, "User 2");
    }

    #[test]
    fn rejoin_overwrites_profile() {
        let mut state = RoomState::new();
        let user = Uuid::new_v4();
        state.join(user, Some("old".to_string()), None);
        state.join(user, Some("new".to_string()), Some("#123456".to_string()));
        assert_eq!(state.member_count(), 1);
        let member = state.member(user).unwrap();
        assert_eq!(member.name, "new");
        assert_eq!(member.color, "#123456");
    }

    #[test]
    fn snapshot_excludes_in_progress_strokes() {
        let mut state = RoomState::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        commit_stroke(&mut state, a, 1);
        state.begin_stroke(b);
        state.append_segment(b, segment());
        assert_eq!(state.snapshot().len(), 1);
    }

    #[test]
    fn history_is_capped_at_max_strokes() {
        let mut state = RoomState::new();
        let user = Uuid::new_v4();
        for _ in 0..MAX_STROKES + 5 {
            commit_stroke(&mut state, user, 1);
        }
        assert_eq!(state.history().len(), MAX_STROKES);
    }

    #[test]
    fn in_progress_stroke_is_capped() {
        let mut state = RoomState::new();
        let user = Uuid::new_v4();
        state.begin_stroke(user);
        for _ in 0..MAX_SEGMENTS_PER_STROKE + 10 {
            state.append_segment(user, segment());
        }
        let stroke = state.end_stroke(user).unwrap();
        assert_eq!(stroke.segments.len(), MAX_SEGMENTS_PER_STROKE);
    }
}
