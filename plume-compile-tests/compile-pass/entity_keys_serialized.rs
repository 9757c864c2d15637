use plume::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Address {
    street: String,
    city: String,
}

#[derive(Default, Entity)]
#[entity(collection = "customers")]
pub struct Customer {
    #[field(id, key = "customer_id")]
    id: Uuid,
    #[field(key = "email_address")]
    email: String,
    #[field]
    nickname: Option<String>,
    #[field(serialized)]
    address: Address,
    #[field(serialized)]
    tags: Vec<String>,
}

fn main() {
    let doc = Document::build(&Customer {
        id: Uuid::new_v4(),
        ..Customer::default()
    })
    .unwrap();
    assert_eq!(doc.id_key(), "customer_id");
    assert!(doc.fields().get("email_address").is_some());
}
