mod cursors;
mod net;
mod reconciler;

pub use cursors::{CursorField, CursorMarker};
pub use net::{decode_server_message, encode_client_message};
pub use reconciler::{ConnectionStatus, Reconciler, Surface};
