//! Data models for threads.
//!
//! This module contains all record types:
//! - Thread
//! - Item
//! - Edge
//! - Stream
//!
//! Each record comes with an insert payload (`New*`) and a partial update
//! payload (`*Patch`).

pub mod edge;
pub mod enums;
pub mod ids;
pub mod item;
pub mod parts;
pub mod stream;
pub mod thread;

pub use edge::{DagEdge, DagStructure, Edge, EdgePatch, NewEdge};
pub use enums::{EdgeType, Role, StreamStatus, Visibility};
pub use ids::{format_timestamp, new_id, now_millis};
pub use item::{Item, ItemPatch, NewItem};
pub use parts::{ImageData, MessagePart, joined_text};
pub use stream::{NewStream, Stream, StreamPatch, StreamSnapshot};
pub use thread::{NewThread, Thread, ThreadPatch, ThreadUpdate, ThreadWithItems};
