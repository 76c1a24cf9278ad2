pub mod compare;
pub mod event;
pub mod location;
pub mod node;
pub mod ptr;
pub mod reader;
pub mod schema;
pub mod validator;
pub mod value;
pub mod writer;

pub use compare::{compare, compare_at, compare_cross};
pub use event::ValueEvent;
pub use location::{LocatedItem, LocatedProperty, Location};
pub use node::{AsNode, Field, Fields, Node};
pub use ptr::Pointer;
pub use reader::{from_slice, Assembler, Parser, ReaderConfig, Tokenizer};
pub use schema::{build_schema, Index, Schema};
pub use validator::{Outcome, OutputShape, Validator};
pub use value::Value;
pub use writer::{TagShape, Writer, WriterConfig};
