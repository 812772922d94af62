//! Wire protocol: semantic events, the frame codec, and a streaming decoder.

pub mod codec;
pub mod events;
pub mod stream;

pub use codec::{
    decode_frame, encode_event, encode_key, encode_mouse_move, DecodedFrame, ProtocolError,
    WireFrame,
};
pub use events::{KeyCode, SemanticInputEvent, UnknownKeyName};
pub use stream::FrameDecoder;
