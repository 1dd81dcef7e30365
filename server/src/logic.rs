use inkroom_shared::{ClientMessage, Segment, ServerMessage};
use uuid::Uuid;

use crate::state::{Room, RoomHandle};

const FALLBACK_CURSOR_COLOR: &str = "#000000";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Recipients {
    /// Only the connection the action came from.
    Sender,
    /// Everyone in the room except the sender.
    Others,
    /// Every room member, sender included.
    All,
}

#[derive(Debug)]
pub struct Outgoing {
    pub message: ServerMessage,
    pub recipients: Recipients,
}

impl Outgoing {
    fn to_sender(message: ServerMessage) -> Self {
        Self {
            message,
            recipients: Recipients::Sender,
        }
    }

    fn to_others(message: ServerMessage) -> Self {
        Self {
            message,
            recipients: Recipients::Others,
        }
    }

    fn to_all(message: ServerMessage) -> Self {
        Self {
            message,
            recipients: Recipients::All,
        }
    }
}

/// Applies one participant action to the room and decides what to broadcast
/// to whom. Runs under the room's write lock; malformed input degrades to an
/// empty broadcast list, never an error.
pub fn apply_client_message(
    room: &mut Room,
    sender: Uuid,
    message: ClientMessage,
) -> Vec<Outgoing> {
    match message {
        ClientMessage::Join { name, color } => {
            let color = color.and_then(sanitize_color);
            let name = name.and_then(sanitize_name);
            room.state.join(sender, name, color);
            vec![
                Outgoing::to_sender(ServerMessage::AssignedId {
                    id: sender.to_string(),
                }),
                Outgoing::to_sender(ServerMessage::Snapshot {
                    strokes: room.state.snapshot(),
                }),
                Outgoing::to_all(ServerMessage::Roster {
                    members: room.state.roster(),
                }),
            ]
        }
        ClientMessage::BeginStroke => {
            room.state.begin_stroke(sender);
            Vec::new()
        }
        ClientMessage::DrawSegment { segment } => {
            let Some(segment) = sanitize_segment(segment) else {
                return Vec::new();
            };
            room.state.append_segment(sender, segment.clone());
            vec![Outgoing::to_others(ServerMessage::DrawSegment { segment })]
        }
        ClientMessage::EndStroke => {
            room.state.end_stroke(sender);
            Vec::new()
        }
        ClientMessage::CursorMove { x, y } => {
            if !x.is_finite() || !y.is_finite() {
                return Vec::new();
            }
            // Ephemeral: cursors never touch RoomState or history.
            let color = room
                .state
                .member(sender)
                .map(|member| member.color.clone())
                .unwrap_or_else(|| FALLBACK_CURSOR_COLOR.to_string());
            vec![Outgoing::to_others(ServerMessage::CursorMove {
                sender_id: sender.to_string(),
                x,
                y,
                color,
            })]
        }
        ClientMessage::Undo => {
            if room.state.undo().is_none() {
                return Vec::new();
            }
            vec![Outgoing::to_all(ServerMessage::FullHistory {
                strokes: room.state.snapshot(),
            })]
        }
        ClientMessage::Redo => {
            if room.state.redo().is_none() {
                return Vec::new();
            }
            vec![Outgoing::to_all(ServerMessage::FullHistory {
                strokes: room.state.snapshot(),
            })]
        }
        ClientMessage::Clear => {
            room.state.clear();
            vec![Outgoing::to_all(ServerMessage::Clear)]
        }
    }
}

/// The disconnect path: discard in-progress work, drop the member, tell the
/// remaining peers. Serialized through the same room lock as every other
/// action.
pub fn apply_leave(room: &mut Room, sender: Uuid) -> Vec<Outgoing> {
    room.state.leave(sender);
    vec![Outgoing::to_others(ServerMessage::Roster {
        members: room.state.roster(),
    })]
}

/// Queues the prepared messages onto the peers' channels. Called after the
/// room's write guard is dropped; sending never blocks on the network, and
/// peers whose channel is gone are pruned.
pub async fn dispatch(room: &RoomHandle, sender: Uuid, outgoing: Vec<Outgoing>) {
    if outgoing.is_empty() {
        return;
    }
    let mut stale = Vec::new();
    {
        let room = room.read().await;
        for item in &outgoing {
            for (id, tx) in room.peers.iter() {
                let wanted = match item.recipients {
                    Recipients::Sender => *id == sender,
                    Recipients::Others => *id != sender,
                    Recipients::All => true,
                };
                if wanted && tx.send(item.message.clone()).is_err() {
                    stale.push(*id);
                }
            }
        }
    }
    if !stale.is_empty() {
        let mut room = room.write().await;
        for id in stale {
            room.peers.remove(&id);
        }
    }
}

fn sanitize_segment(mut segment: Segment) -> Option<Segment> {
    for value in [segment.x0, segment.y0, segment.x1, segment.y1] {
        if !value.is_finite() {
            return None;
        }
    }
    segment.color = sanitize_color(segment.color)?;
    segment.size = if segment.size.is_finite() {
        segment.size.clamp(1.0, 60.0)
    } else {
        5.0
    };
    Some(segment)
}

fn sanitize_color(mut color: String) -> Option<String> {
    if color.is_empty() {
        return None;
    }
    truncate_at_char_boundary(&mut color, 32);
    Some(color)
}

fn sanitize_name(mut name: String) -> Option<String> {
    truncate_at_char_boundary(&mut name, 48);
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

// String::truncate panics mid-character; back off to the previous boundary.
fn truncate_at_char_boundary(value: &mut String, max_len: usize) {
    if value.len() <= max_len {
        return;
    }
    let mut cut = max_len;
    while !value.is_char_boundary(cut) {
        cut -= 1;
    }
    value.truncate(cut);
}
