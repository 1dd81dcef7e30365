use serde::{Deserialize, Serialize};

/// One drawn line primitive. Immutable once created.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Segment {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    pub color: String,
    pub size: f32,
    pub tool: Tool,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Pen,
    Eraser,
}

/// One continuous drawing gesture. Mutable only while in progress; once
/// committed to a room's history it is never modified again.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Stroke {
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub segments: Vec<Segment>,
    pub timestamp: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Member {
    pub id: String,
    pub color: String,
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "join")]
    Join {
        name: Option<String>,
        color: Option<String>,
    },
    #[serde(rename = "begin-stroke")]
    BeginStroke,
    #[serde(rename = "draw-segment")]
    DrawSegment {
        #[serde(flatten)]
        segment: Segment,
    },
    #[serde(rename = "end-stroke")]
    EndStroke,
    #[serde(rename = "cursor-move")]
    CursorMove { x: f32, y: f32 },
    #[serde(rename = "undo")]
    Undo,
    #[serde(rename = "redo")]
    Redo,
    #[serde(rename = "clear")]
    Clear,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "assigned-id")]
    AssignedId { id: String },
    #[serde(rename = "snapshot")]
    Snapshot { strokes: Vec<Stroke> },
    #[serde(rename = "roster")]
    Roster { members: Vec<Member> },
    #[serde(rename = "draw-segment")]
    DrawSegment {
        #[serde(flatten)]
        segment: Segment,
    },
    #[serde(rename = "cursor-move")]
    CursorMove {
        #[serde(rename = "senderId")]
        sender_id: String,
        x: f32,
        y: f32,
        color: String,
    },
    #[serde(rename = "full-history")]
    FullHistory { strokes: Vec<Stroke> },
    #[serde(rename = "clear")]
    Clear,
}
