//! `#[derive(Configurable)]` for fieldwise records.
//!
//! The derive walks the struct's fields in declaration order and emits a
//! typed descriptor table plus name-dispatched accessors. A field takes part
//! when it is `pub` and its type is one of the supported kinds (or a `Vec` of
//! one); anything else is left out so records can carry unrelated state.
//!
//! ```ignore
//! #[derive(Configurable)]
//! pub struct Config {
//!     pub log_level: String,
//!     #[fieldwise(arg = "-", sep = "|")]
//!     pub peers: Vec<Url>,
//! }
//! ```

use proc_macro::TokenStream;
use quote::quote;
use syn::{
    Data, DeriveInput, Error, Fields, GenericArgument, LitStr, PathArguments, Type, Visibility,
    ext::IdentExt, parse_macro_input, spanned::Spanned,
};

const ELEMENT_TYPES: &[&str] = &[
    "String", "bool", "f32", "f64", "isize", "i8", "i16", "i32", "i64", "usize", "u8", "u16",
    "u32", "u64", "Duration", "Url", "Regex",
];

#[proc_macro_derive(Configurable, attributes(fieldwise))]
pub fn derive_configurable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}

#[derive(Default)]
struct FieldAttrs {
    arg: Option<LitStr>,
    env: Option<LitStr>,
    file_env: Option<LitStr>,
    sep: Option<LitStr>,
    skip: bool,
}

impl FieldAttrs {
    fn is_empty(&self) -> bool {
        self.arg.is_none()
            && self.env.is_none()
            && self.file_env.is_none()
            && self.sep.is_none()
            && !self.skip
    }
}

fn parse_attrs(field: &syn::Field) -> Result<FieldAttrs, Error> {
    let mut attrs = FieldAttrs::default();
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("fieldwise")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                attrs.skip = true;
                return Ok(());
            }
            let slot = if meta.path.is_ident("arg") {
                &mut attrs.arg
            } else if meta.path.is_ident("env") {
                &mut attrs.env
            } else if meta.path.is_ident("file_env") {
                &mut attrs.file_env
            } else if meta.path.is_ident("sep") {
                &mut attrs.sep
            } else {
                return Err(meta.error(
                    "expected one of `arg`, `env`, `file_env`, `sep`, `skip`",
                ));
            };
            *slot = Some(meta.value()?.parse()?);
            Ok(())
        })?;
    }
    if let Some(sep) = &attrs.sep {
        if sep.value().is_empty() {
            return Err(Error::new(sep.span(), "list separator must not be empty"));
        }
    }
    Ok(attrs)
}

fn is_element(ty: &Type) -> bool {
    match ty {
        Type::Path(path) if path.qself.is_none() => path.path.segments.last().is_some_and(|seg| {
            matches!(seg.arguments, PathArguments::None) && ELEMENT_TYPES.iter().any(|name| seg.ident == name)
        }),
        _ => false,
    }
}

fn is_supported(ty: &Type) -> bool {
    if is_element(ty) {
        return true;
    }
    let Type::Path(path) = ty else {
        return false;
    };
    let Some(seg) = path.path.segments.last() else {
        return false;
    };
    if seg.ident != "Vec" {
        return false;
    }
    match &seg.arguments {
        PathArguments::AngleBracketed(args) if args.args.len() == 1 => {
            matches!(args.args.first(), Some(GenericArgument::Type(inner)) if is_element(inner))
        }
        _ => false,
    }
}

fn directive(lit: &Option<LitStr>) -> proc_macro2::TokenStream {
    match lit {
        Some(lit) => quote!(::fieldwise::Directive::parse(#lit)),
        None => quote!(::fieldwise::Directive::Derive),
    }
}

fn expand(input: DeriveInput) -> Result<proc_macro2::TokenStream, Error> {
    let Data::Struct(data) = &input.data else {
        return Err(Error::new(
            input.span(),
            "#[derive(Configurable)] only supports structs",
        ));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(Error::new(
            data.fields.span(),
            "#[derive(Configurable)] requires named fields",
        ));
    };

    let mut specs = Vec::new();
    let mut getters = Vec::new();
    let mut setters = Vec::new();

    for field in &fields.named {
        let attrs = parse_attrs(field)?;
        if attrs.skip {
            continue;
        }
        let ty = &field.ty;
        let visible = matches!(field.vis, Visibility::Public(_));
        if !visible || !is_supported(ty) {
            if !attrs.is_empty() {
                return Err(Error::new(
                    field.span(),
                    "fieldwise attributes need a `pub` field of a supported type",
                ));
            }
            continue;
        }

        let Some(ident) = &field.ident else {
            continue;
        };
        let name = ident.unraw().to_string();
        let arg = directive(&attrs.arg);
        let env = directive(&attrs.env);
        let file_env = directive(&attrs.file_env);
        let separator = match &attrs.sep {
            Some(sep) => quote!(.with_separator(#sep)),
            None => quote!(),
        };

        specs.push(quote! {
            ::fieldwise::FieldSpec::new(#name, <#ty as ::fieldwise::Field>::KIND)
                .with_arg(#arg)
                .with_env(#env)
                .with_file_env(#file_env)
                #separator
        });
        getters.push(quote! {
            #name => ::std::option::Option::Some(::fieldwise::Field::to_value(&self.#ident)),
        });
        setters.push(quote! {
            #name => match <#ty as ::fieldwise::Field>::from_value(value) {
                ::std::option::Option::Some(v) => {
                    self.#ident = v;
                    true
                }
                ::std::option::Option::None => false,
            },
        });
    }

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::fieldwise::Configurable for #ident #ty_generics #where_clause {
            fn field_specs() -> ::std::vec::Vec<::fieldwise::FieldSpec> {
                ::std::vec![#(#specs),*]
            }

            #[allow(unused_variables)]
            fn field_value(&self, name: &str) -> ::std::option::Option<::fieldwise::Value> {
                match name {
                    #(#getters)*
                    _ => ::std::option::Option::None,
                }
            }

            #[allow(unused_variables)]
            fn set_field_value(&mut self, name: &str, value: ::fieldwise::Value) -> bool {
                match name {
                    #(#setters)*
                    _ => false,
                }
            }
        }
    })
}
