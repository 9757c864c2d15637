use plume::prelude::*;

// Type- and field-level hints pass through to the mapping table for
// backend adapters to interpret.
#[derive(Default, Entity)]
#[entity(collection = "sessions", ttl = 120)]
pub struct Session {
    #[field(id)]
    token: String,
    #[field(index)]
    user_id: u64,
}

fn main() {
    let table = plume::resolve::<Session>().unwrap();
    assert_eq!(table.hint("ttl").and_then(|h| h.value), Some("120"));
}
