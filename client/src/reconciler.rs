use inkroom_shared::{Member, Segment, ServerMessage, Stroke};

use crate::cursors::CursorField;

/// The rendering collaborator. Rasterization itself is out of scope; the
/// reconciler only tells the surface what to draw, in order.
pub trait Surface {
    fn render_segment(&mut self, segment: &Segment);
    fn clear_surface(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

/// Mirrors server-declared room state onto a local surface. Never computes
/// room state on its own: every visible change originates from a pushed
/// event, and a fresh snapshot fully replaces the view (reconnects rely on
/// this instead of event replay).
pub struct Reconciler<S: Surface> {
    surface: S,
    local_id: Option<String>,
    roster: Vec<Member>,
    cursors: CursorField,
    status: ConnectionStatus,
}

impl<S: Surface> Reconciler<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            local_id: None,
            roster: Vec::new(),
            cursors: CursorField::new(),
            status: ConnectionStatus::Disconnected,
        }
    }

    pub fn apply(&mut self, message: &ServerMessage) {
        match message {
            ServerMessage::AssignedId { id } => self.local_id = Some(id.clone()),
            ServerMessage::Snapshot { strokes } => self.apply_snapshot(strokes),
            ServerMessage::Roster { members } => self.apply_roster(members),
            ServerMessage::DrawSegment { segment } => self.apply_segment(segment),
            ServerMessage::CursorMove {
                sender_id,
                x,
                y,
                color,
            } => self.apply_cursor(sender_id, *x, *y, color),
            ServerMessage::FullHistory { strokes } => self.apply_full_history(strokes),
            ServerMessage::Clear => self.apply_clear(),
        }
    }

    /// A snapshot is the authoritative view at join time; anything drawn
    /// before it (a stale pre-reconnect canvas) is discarded.
    fn apply_snapshot(&mut self, strokes: &[Stroke]) {
        self.surface.clear_surface();
        self.render_strokes(strokes);
    }

    /// Incremental render. Deliberately tolerant of segments for strokes the
    /// client never saw begin: draw immediately, never buffer.
    fn apply_segment(&mut self, segment: &Segment) {
        self.surface.render_segment(segment);
    }

    fn apply_full_history(&mut self, strokes: &[Stroke]) {
        self.surface.clear_surface();
        self.render_strokes(strokes);
    }

    fn apply_clear(&mut self) {
        self.surface.clear_surface();
    }

    fn apply_cursor(&mut self, sender_id: &str, x: f32, y: f32, color: &str) {
        self.cursors.upsert(sender_id, x, y, color);
    }

    fn apply_roster(&mut self, members: &[Member]) {
        self.roster = members.to_vec();
        self.cursors
            .retain_members(self.roster.iter().map(|member| member.id.as_str()));
    }

    fn render_strokes(&mut self, strokes: &[Stroke]) {
        for stroke in strokes {
            for segment in &stroke.segments {
                self.surface.render_segment(segment);
            }
        }
    }

    pub fn set_status(&mut self, status: ConnectionStatus) {
        self.status = status;
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn local_id(&self) -> Option<&str> {
        self.local_id.as_deref()
    }

    pub fn roster(&self) -> &[Member] {
        &self.roster
    }

    pub fn cursors(&self) -> &CursorField {
        &self.cursors
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }
}
