use plume::prelude::*;

#[derive(Default, Entity)]
#[entity(collection = "events")]
pub struct Event {
    #[field(id)]
    id: String,
    #[field]
    kind: String,
    #[raw_view]
    raw: Option<FlatMap>,
    // Fields without a mapping attribute are not persisted.
    scratch: Vec<u8>,
}

fn main() {
    let mut event = Event {
        id: "e1".into(),
        kind: "login".into(),
        ..Event::default()
    };
    let doc = Document::build(&event).unwrap();
    doc.apply_raw_view(&mut event).unwrap();
    assert!(event.raw.is_some());
}
