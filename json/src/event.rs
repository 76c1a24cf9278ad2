//! `ValueEvent`: the linear event stream shared by the push parser, the
//! stream writer, and the streaming schema validator.

use crate::value::Value;

/// One token of a well-formed event sequence: any value position accepts
/// zero or more `Tag` events followed by one of `Scalar`, or a
/// `BeginArray ... EndArray` run, or a `BeginObject (Key Value)* EndObject`
/// run. `Anchor`/`Alias` are reserved for a future graph-sharing extension
/// and are rejected by every reader/writer in this crate today.
#[derive(Debug, Clone)]
pub enum ValueEvent {
    Tag(Value),
    Anchor,
    Alias,
    BeginArray,
    EndArray,
    BeginObject,
    EndObject,
    Key(Value),
    Scalar(Value),
}
