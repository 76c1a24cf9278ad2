//! `WriterConfig` controls how a tagged scalar (`ValueEvent::Tag` followed
//! by its value) and forward slashes are rendered on the wire; the same
//! event stream produces four different JSON shapes depending on
//! `tag_shape`.

use solid_json::event::ValueEvent;
use solid_json::value::Value;
use solid_json::writer::{TagShape, Writer, WriterConfig};

fn main() {
    for shape in [TagShape::Unwrapped, TagShape::Array, TagShape::Object, TagShape::Wrapped] {
        let config = WriterConfig { tag_shape: shape, ..Default::default() };
        println!("{shape:?}: {}", render_tagged_duration(config));
    }

    let escaping = WriterConfig { escape_slashes: true, ..Default::default() };
    println!("escape_slashes=true: {}", render_path(escaping));
    println!("escape_slashes=false: {}", render_path(WriterConfig::default()));
}

fn render_tagged_duration(config: WriterConfig) -> String {
    let mut w = Writer::new(Vec::new(), config);
    w.write_event(ValueEvent::Tag(Value::String("duration".into()))).unwrap();
    w.write_event(ValueEvent::Scalar(Value::String("P3Y6M4DT12H30M5S".into()))).unwrap();
    String::from_utf8(w.close().unwrap()).unwrap()
}

fn render_path(config: WriterConfig) -> String {
    let mut w = Writer::new(Vec::new(), config);
    w.write_event(ValueEvent::Scalar(Value::String("/a/b/c".into()))).unwrap();
    String::from_utf8(w.close().unwrap()).unwrap()
}
