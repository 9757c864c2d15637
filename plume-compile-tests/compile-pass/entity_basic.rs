use plume::prelude::*;

#[derive(Default, Entity)]
#[entity(collection = "users")]
pub struct User {
    #[field(id)]
    id: u64,
    #[field]
    name: String,
    #[field]
    active: bool,
}

fn main() {
    let user = User {
        id: 1,
        name: "a".into(),
        active: true,
    };
    let doc = Document::build(&user).unwrap();
    assert_eq!(doc.id_string(), "1");
}
