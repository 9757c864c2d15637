use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Lit};

use crate::crate_path::plume_core_path;

pub fn expand(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match generate(&input) {
        Ok(output) => output.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// A backend hint collected from an unknown attribute ident; the core
/// tolerates and ignores these, adapters may read them.
struct HintInfo {
    name: String,
    value: Option<String>,
}

/// Parsed `#[entity(...)]` type-level attributes.
struct EntityAttrs {
    collection: Option<String>,
    hints: Vec<HintInfo>,
}

/// Parsed information about a single persisted field.
struct MappedField {
    ident: syn::Ident,
    /// Storage key; defaults to the field name, or `_id` for the identity.
    key: String,
    identity: bool,
    serialized: bool,
    hints: Vec<HintInfo>,
}

fn lit_to_string(lit: &Lit) -> syn::Result<String> {
    match lit {
        Lit::Str(s) => Ok(s.value()),
        Lit::Int(i) => Ok(i.base10_digits().to_string()),
        Lit::Bool(b) => Ok(b.value.to_string()),
        other => Err(syn::Error::new_spanned(
            other,
            "expected a string, integer or boolean literal",
        )),
    }
}

fn parse_entity_attrs(input: &DeriveInput) -> syn::Result<EntityAttrs> {
    let mut collection = None;
    let mut hints = Vec::new();
    for attr in &input.attrs {
        if !attr.path().is_ident("entity") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            let Some(ident) = meta.path.get_ident() else {
                return Err(meta.error("expected an identifier in #[entity(...)]"));
            };
            let name = ident.to_string();
            if meta.input.peek(syn::Token![=]) {
                let lit: Lit = meta.value()?.parse()?;
                let value = lit_to_string(&lit)?;
                if name == "collection" {
                    collection = Some(value);
                } else {
                    // Backend-specific tag, e.g. `ttl = 300`.
                    hints.push(HintInfo {
                        name,
                        value: Some(value),
                    });
                }
            } else {
                hints.push(HintInfo { name, value: None });
            }
            Ok(())
        })?;
    }
    Ok(EntityAttrs { collection, hints })
}

fn parse_field(field: &syn::Field) -> syn::Result<Option<MappedField>> {
    let ident = field
        .ident
        .clone()
        .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;

    let mut mapped = false;
    let mut key = None;
    let mut identity = false;
    let mut serialized = false;
    let mut hints = Vec::new();

    for attr in &field.attrs {
        if !attr.path().is_ident("field") {
            continue;
        }
        mapped = true;
        if matches!(attr.meta, syn::Meta::Path(_)) {
            // Bare `#[field]`.
            continue;
        }
        attr.parse_nested_meta(|meta| {
            let Some(meta_ident) = meta.path.get_ident() else {
                return Err(meta.error("expected an identifier in #[field(...)]"));
            };
            let name = meta_ident.to_string();
            if meta.input.peek(syn::Token![=]) {
                let lit: Lit = meta.value()?.parse()?;
                let value = lit_to_string(&lit)?;
                match name.as_str() {
                    "key" => {
                        if value.is_empty() {
                            return Err(meta.error("#[field(key = \"...\")] must not be empty"));
                        }
                        key = Some(value);
                    }
                    _ => hints.push(HintInfo {
                        name,
                        value: Some(value),
                    }),
                }
            } else {
                match name.as_str() {
                    "id" => identity = true,
                    "serialized" => serialized = true,
                    _ => hints.push(HintInfo { name, value: None }),
                }
            }
            Ok(())
        })?;
    }

    if !mapped {
        return Ok(None);
    }
    if identity && serialized {
        return Err(syn::Error::new_spanned(
            field,
            "an identity field cannot be #[field(serialized)]",
        ));
    }

    let key = key.unwrap_or_else(|| {
        if identity {
            "_id".to_string()
        } else {
            ident.to_string()
        }
    });

    Ok(Some(MappedField {
        ident,
        key,
        identity,
        serialized,
        hints,
    }))
}

fn hint_tokens(krate: &TokenStream2, hint: &HintInfo) -> TokenStream2 {
    let name = &hint.name;
    match &hint.value {
        Some(value) => quote!(#krate::Hint::with_value(#name, #value)),
        None => quote!(#krate::Hint::flag(#name)),
    }
}

fn generate(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let krate = plume_core_path();

    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            name,
            "#[derive(Entity)] only supports structs",
        ));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            name,
            "#[derive(Entity)] requires named fields",
        ));
    };

    let entity_attrs = parse_entity_attrs(input)?;

    let mut mapped = Vec::new();
    let mut raw_view: Option<syn::Ident> = None;
    let mut id_field: Option<(syn::Ident, syn::Type)> = None;

    for field in &fields.named {
        let is_raw = field.attrs.iter().any(|a| a.path().is_ident("raw_view"));
        let parsed = parse_field(field)?;
        if is_raw {
            if parsed.is_some() {
                return Err(syn::Error::new_spanned(
                    field,
                    "#[raw_view] fields are not mapped; remove #[field]",
                ));
            }
            if raw_view.is_some() {
                return Err(syn::Error::new_spanned(
                    field,
                    "only one field may be tagged #[raw_view]",
                ));
            }
            raw_view = field.ident.clone();
            continue;
        }
        let Some(parsed) = parsed else { continue };
        if parsed.identity {
            if id_field.is_some() {
                return Err(syn::Error::new_spanned(
                    field,
                    "only one field may be tagged #[field(id)]",
                ));
            }
            id_field = Some((parsed.ident.clone(), field.ty.clone()));
        }
        mapped.push(parsed);
    }

    let Some((id_ident, id_ty)) = id_field else {
        return Err(syn::Error::new_spanned(
            name,
            "#[derive(Entity)] requires exactly one #[field(id)]\n\
             \n  example:\n  #[derive(Entity)]\n  #[entity(collection = \"users\")]\n  \
             pub struct User {\n      #[field(id)]\n      id: Uuid,\n  }",
        ));
    };

    // descriptor()
    let entity_name = name.to_string();
    let collection = entity_attrs
        .collection
        .as_ref()
        .map(|c| quote!(.collection(#c)));
    let type_hints = entity_attrs
        .hints
        .iter()
        .map(|h| {
            let tokens = hint_tokens(&krate, h);
            quote!(.hint(#tokens))
        })
        .collect::<Vec<_>>();
    let field_specs = mapped.iter().map(|f| {
        let field_name = f.ident.to_string();
        let key = &f.key;
        let ctor = if f.identity {
            quote!(#krate::FieldSpec::identity(#field_name, #key))
        } else if f.serialized {
            quote!(#krate::FieldSpec::serialized(#field_name, #key))
        } else {
            quote!(#krate::FieldSpec::mapped(#field_name, #key))
        };
        let hints = f.hints.iter().map(|h| {
            let tokens = hint_tokens(&krate, h);
            quote!(.hint(#tokens))
        });
        quote!(.field(#ctor #(#hints)*))
    });
    let raw_view_call = raw_view.as_ref().map(|ident| {
        let raw_name = ident.to_string();
        quote!(.raw_view(#raw_name))
    });

    // read_field / write_field
    let read_arms = mapped.iter().map(|f| {
        let field_name = f.ident.to_string();
        let ident = &f.ident;
        if f.serialized {
            quote!(#field_name => #krate::to_json(&self.#ident),)
        } else {
            quote!(#field_name => Ok(#krate::ToValue::to_value(&self.#ident)),)
        }
    });
    let write_arms = mapped.iter().map(|f| {
        let field_name = f.ident.to_string();
        let ident = &f.ident;
        if f.serialized {
            quote!(#field_name => self.#ident = #krate::from_json(value)?,)
        } else {
            quote!(#field_name => self.#ident = #krate::FromValue::from_value(value)?,)
        }
    });

    let set_raw_view = raw_view.as_ref().map(|ident| {
        quote! {
            fn set_raw_view(&mut self, view: #krate::FlatMap) {
                self.#ident = ::std::convert::From::from(view);
            }
        }
    });

    Ok(quote! {
        impl #impl_generics #krate::Entity for #name #ty_generics #where_clause {
            type Id = #id_ty;

            fn descriptor() -> #krate::EntityDescriptor {
                #krate::EntityDescriptor::new(#entity_name)
                    #collection
                    #(#type_hints)*
                    #(#field_specs)*
                    #raw_view_call
            }

            fn id(&self) -> &#id_ty {
                &self.#id_ident
            }

            fn read_field(&self, name: &str) -> ::std::result::Result<#krate::Value, #krate::CoerceError> {
                match name {
                    #(#read_arms)*
                    other => Err(#krate::CoerceError::new("known field", other)),
                }
            }

            fn write_field(&mut self, name: &str, value: &#krate::Value) -> ::std::result::Result<(), #krate::CoerceError> {
                match name {
                    #(#write_arms)*
                    other => return Err(#krate::CoerceError::new("known field", other)),
                }
                Ok(())
            }

            #set_raw_view
        }
    })
}
