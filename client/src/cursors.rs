use std::collections::HashMap;

const LABEL_LEN: usize = 6;

/// One remote participant's cursor marker.
#[derive(Clone, Debug, PartialEq)]
pub struct CursorMarker {
    pub x: f32,
    pub y: f32,
    pub color: String,
    pub label: String,
}

/// The set of remote cursor markers, keyed by sender id. Ephemeral: never
/// part of the drawing history, never subject to undo.
#[derive(Default)]
pub struct CursorField {
    markers: HashMap<String, CursorMarker>,
}

impl CursorField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&mut self, sender_id: &str, x: f32, y: f32, color: &str) {
        let label = sender_id.chars().take(LABEL_LEN).collect();
        self.markers.insert(
            sender_id.to_string(),
            CursorMarker {
                x,
                y,
                color: color.to_string(),
                label,
            },
        );
    }

    /// Drops markers whose owner is no longer in the roster.
    pub fn retain_members<'a>(&mut self, member_ids: impl Iterator<Item = &'a str>) {
        let present: std::collections::HashSet<&str> = member_ids.collect();
        self.markers.retain(|id, _| present.contains(id.as_str()));
    }

    pub fn get(&self, sender_id: &str) -> Option<&CursorMarker> {
        self.markers.get(sender_id)
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn clear(&mut self) {
        self.markers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_overwrites_position_and_keeps_one_marker_per_sender() {
        let mut field = CursorField::new();
        field.upsert("abcdef-123", 1.0, 2.0, "#FF6B6B");
        field.upsert("abcdef-123", 5.0, 6.0, "#FF6B6B");
        assert_eq!(field.len(), 1);
        let marker = field.get("abcdef-123").unwrap();
        assert_eq!((marker.x, marker.y), (5.0, 6.0));
        assert_eq!(marker.label, "abcdef");
    }

    #[test]
    fn retain_members_drops_departed_cursors() {
        let mut field = CursorField::new();
        field.upsert("alice", 0.0, 0.0, "#FF6B6B");
        field.upsert("bob", 0.0, 0.0, "#4ECDC4");
        field.retain_members(["alice"].into_iter());
        assert!(field.get("alice").is_some());
        assert!(field.get("bob").is_none());
    }
}
