//! TTL hint handling: records expire after the configured lifetime.

use plume_data::{BackendRepository, Repository};
use plume_macros::Entity;
use plume_memory::MemoryBackend;
use std::thread;
use std::time::Duration;

#[derive(Debug, Default, Clone, PartialEq, Entity)]
#[entity(collection = "sessions", ttl = 1)]
struct Session {
    #[field(id)]
    token: String,
    #[field]
    hits: u64,
}

#[test]
fn test_records_expire_after_the_declared_ttl() {
    let repo = BackendRepository::<Session, _>::new(MemoryBackend::new()).unwrap();
    let session = Session {
        token: "abc".into(),
        hits: 3,
    };
    repo.save(&session).unwrap();
    assert_eq!(repo.find(&session.token).unwrap(), Some(session.clone()));
    assert_eq!(repo.count().unwrap(), 1);

    thread::sleep(Duration::from_millis(1_100));

    assert_eq!(repo.find(&session.token).unwrap(), None);
    assert_eq!(repo.count().unwrap(), 0);
    assert!(repo.find_all().unwrap().is_empty());
}

#[test]
fn test_saving_again_restarts_the_clock() {
    let repo = BackendRepository::<Session, _>::new(MemoryBackend::new()).unwrap();
    let session = Session {
        token: "xyz".into(),
        hits: 1,
    };
    repo.save(&session).unwrap();
    thread::sleep(Duration::from_millis(600));
    repo.save(&session).unwrap();
    thread::sleep(Duration::from_millis(600));
    // 1.2s after the first save, 0.6s after the second.
    assert_eq!(repo.find(&session.token).unwrap(), Some(session));
}
