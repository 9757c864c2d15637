//! Resolves the path generated code uses to reach `plume_core` items.

use proc_macro2::TokenStream;
use proc_macro_crate::{crate_name, FoundCrate};
use quote::quote;

/// Path prefix for `plume_core` types in generated impls.
///
/// Users reach the core either through the `plume` facade (which re-exports
/// it at its root) or by depending on `plume-core` directly; whichever
/// appears in their manifest wins, under whatever name it was renamed to.
pub fn plume_core_path() -> TokenStream {
    for dep in ["plume", "plume-core"] {
        match crate_name(dep) {
            Ok(FoundCrate::Itself) => return quote!(crate),
            Ok(FoundCrate::Name(name)) => {
                let ident = syn::Ident::new(&name, proc_macro2::Span::call_site());
                return quote!(::#ident);
            }
            Err(_) => continue,
        }
    }
    // Neither dependency is declared; emit the canonical name so the
    // resulting resolution error points at the missing crate.
    quote!(::plume_core)
}
