use plume::prelude::*;

#[derive(Debug, Default, Clone, PartialEq, Entity)]
#[entity(collection = "notes")]
pub struct Note {
    #[field(id)]
    id: i64,
    #[field]
    body: String,
}

fn main() {
    let repo = BackendRepository::<Note, _>::new(MemoryBackend::new()).unwrap();
    let note = Note {
        id: 7,
        body: "hello".into(),
    };
    repo.save(&note).unwrap();
    assert_eq!(repo.find(&7).unwrap(), Some(note));
    assert_eq!(repo.count().unwrap(), 1);
}
