//! Procedural macros for Plume.

use proc_macro::TokenStream;

mod crate_path;
mod entity_derive;

/// Derive the `Entity` trait from declarative mapping attributes.
///
/// # Example
///
/// ```ignore
/// #[derive(Default, Entity)]
/// #[entity(collection = "users", ttl = 300)]
/// pub struct User {
///     #[field(id)]
///     id: Uuid,
///     #[field]
///     name: String,
///     #[field(key = "email_address")]
///     email: String,
///     #[field(serialized)]
///     tags: Vec<String>,
///     #[raw_view]
///     raw: Option<FlatMap>,
/// }
/// ```
///
/// Attributes:
/// - `#[entity(collection = "name")]` — optional collection/table name.
///   Other idents or name-value pairs (e.g. `ttl = 300`) become type-level
///   backend hints.
/// - `#[field]` — persist under the field's own name.
/// - `#[field(key = "...")]` — persist under an explicit key.
/// - `#[field(id)]` — the identity field; its key defaults to `_id`.
///   Exactly one per struct.
/// - `#[field(serialized)]` — store as a JSON-encoded string; the field type
///   must implement `Serialize + DeserializeOwned`.
/// - Unknown idents inside `#[field(...)]` (e.g. `indexed`) become field
///   hints for backend adapters.
/// - `#[raw_view]` — excluded from the mapped view; receives the entity's
///   own flat document via `Document::apply_raw_view`. The field type must
///   be `From<FlatMap>` (e.g. `Option<FlatMap>`).
///
/// Fields without attributes are not persisted and keep their `Default`
/// values on reconstruction.
#[proc_macro_derive(Entity, attributes(entity, field, raw_view))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    entity_derive::expand(input)
}
