//! Procedural macros for schema_migrate
//!
//! This crate provides the `SchemaModel` derive macro, which describes a
//! struct's table to the schema_migrate model registry.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{quote, ToTokens};
use syn::ext::IdentExt;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Field, Fields, LitStr, Type};

/// Struct level `#[schema_model(...)]` options
#[derive(Default)]
struct ModelOptions {
    table: Option<String>,
    engine: Option<String>,
    connection: Option<String>,
}

/// Field level `#[schema_field(...)]` options
#[derive(Default)]
struct FieldOptions {
    db_type: Option<String>,
    primary_key: bool,
    auto_increment: bool,
    unique: bool,
    index: bool,
    default: Option<String>,
    /// Validated `table.column` reference
    foreign_key: Option<String>,
    on_delete: Option<String>,
    on_update: Option<String>,
    skip: bool,
}

/// Derive macro for `schema_migrate::models::SchemaModel`
///
/// ```ignore
/// #[derive(SchemaModel)]
/// #[schema_model(table = "users", engine = "InnoDB", connection = "default")]
/// struct User {
///     #[schema_field(primary_key, auto_increment)]
///     id: i32,
///     #[schema_field(unique, db_type = "VARCHAR(190)")]
///     email: String,
///     #[schema_field(foreign_key = "teams.id", on_delete = "CASCADE")]
///     team_id: Option<i32>,
/// }
/// ```
#[proc_macro_derive(SchemaModel, attributes(schema_model, schema_field))]
pub fn derive_schema_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    expand_schema_model(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_schema_model(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "SchemaModel only supports structs with named fields",
                ))
            }
        },
        _ => return Err(syn::Error::new_spanned(name, "SchemaModel only supports structs")),
    };

    let options = parse_model_options(&input.attrs)?;

    let mut definitions = Vec::new();
    for field in fields {
        let field_options = parse_field_options(&field.attrs)?;
        if field_options.skip {
            continue;
        }
        definitions.push(field_definition(field, field_options)?);
    }

    let model_name = name.to_string();
    let table_name = option_str(options.table.as_deref());
    let engine = option_str(options.engine.as_deref());
    let connection = match &options.connection {
        Some(connection) => quote! { #connection },
        None => quote! { ::schema_migrate::config::DEFAULT_CONNECTION },
    };

    Ok(quote! {
        #[automatically_derived]
        impl #impl_generics ::schema_migrate::models::SchemaModel for #name #ty_generics #where_clause {
            fn model_name() -> &'static str {
                #model_name
            }

            fn table_name() -> ::std::option::Option<&'static str> {
                #table_name
            }

            fn engine() -> ::std::option::Option<&'static str> {
                #engine
            }

            fn connection() -> &'static str {
                #connection
            }

            fn field_definitions() -> ::std::vec::Vec<::schema_migrate::schema::FieldDefinition> {
                ::std::vec![#(#definitions),*]
            }
        }
    })
}

fn parse_model_options(attrs: &[Attribute]) -> syn::Result<ModelOptions> {
    let mut options = ModelOptions::default();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("schema_model")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                options.table = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("engine") {
                options.engine = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("connection") {
                options.connection = Some(meta.value()?.parse::<LitStr>()?.value());
            } else {
                return Err(meta.error("unsupported schema_model option"));
            }
            Ok(())
        })?;
    }

    Ok(options)
}

fn parse_field_options(attrs: &[Attribute]) -> syn::Result<FieldOptions> {
    let mut options = FieldOptions::default();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("schema_field")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("db_type") {
                options.db_type = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("primary_key") {
                options.primary_key = true;
            } else if meta.path.is_ident("auto_increment") {
                options.auto_increment = true;
            } else if meta.path.is_ident("unique") {
                options.unique = true;
            } else if meta.path.is_ident("index") {
                options.index = true;
            } else if meta.path.is_ident("default") {
                options.default = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("foreign_key") {
                let reference = meta.value()?.parse::<LitStr>()?;
                let value = reference.value();
                match value.split_once('.') {
                    Some((table, column)) if !table.is_empty() && !column.is_empty() => {
                        options.foreign_key = Some(value.clone());
                    }
                    _ => {
                        return Err(syn::Error::new_spanned(
                            reference,
                            "foreign_key must look like \"table.column\"",
                        ))
                    }
                }
            } else if meta.path.is_ident("on_delete") {
                options.on_delete = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("on_update") {
                options.on_update = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("skip") {
                options.skip = true;
            } else {
                return Err(meta.error("unsupported schema_field option"));
            }
            Ok(())
        })?;
    }

    if options.foreign_key.is_none() && (options.on_delete.is_some() || options.on_update.is_some()) {
        return Err(syn::Error::new(
            proc_macro2::Span::call_site(),
            "on_delete and on_update require foreign_key",
        ));
    }

    Ok(options)
}

fn field_definition(field: &Field, options: FieldOptions) -> syn::Result<TokenStream2> {
    let ident = field
        .ident
        .as_ref()
        .ok_or_else(|| syn::Error::new_spanned(field, "SchemaModel fields must be named"))?;

    let name = ident.unraw().to_string();
    let rust_type: String = field
        .ty
        .to_token_stream()
        .to_string()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let nullable = is_option(&field.ty);

    let db_type = option_string(options.db_type.as_deref());
    let default = option_string(options.default.as_deref());
    let primary_key = options.primary_key;
    let auto_increment = options.auto_increment;
    let unique = options.unique;
    let index = options.index;

    let foreign_key = match &options.foreign_key {
        Some(reference) => {
            let on_delete = option_string(options.on_delete.as_deref());
            let on_update = option_string(options.on_update.as_deref());
            quote! {
                ::schema_migrate::schema::ForeignKeyDefinition::parse(#reference).map(|parsed| {
                    ::schema_migrate::schema::ForeignKeyDefinition {
                        on_delete: #on_delete,
                        on_update: #on_update,
                        ..parsed
                    }
                })
            }
        }
        None => quote! { ::std::option::Option::None },
    };

    Ok(quote! {
        ::schema_migrate::schema::FieldDefinition {
            name: ::std::string::String::from(#name),
            rust_type: ::std::string::String::from(#rust_type),
            db_type: #db_type,
            nullable: #nullable,
            primary_key: #primary_key,
            auto_increment: #auto_increment,
            unique: #unique,
            index: #index,
            default: #default,
            foreign_key: #foreign_key,
        }
    })
}

/// Whether a type is spelled `Option<...>` (possibly path-qualified)
fn is_option(ty: &Type) -> bool {
    match ty {
        Type::Path(path) if path.qself.is_none() => path
            .path
            .segments
            .last()
            .map_or(false, |segment| segment.ident == "Option"),
        _ => false,
    }
}

fn option_str(value: Option<&str>) -> TokenStream2 {
    match value {
        Some(value) => quote! { ::std::option::Option::Some(#value) },
        None => quote! { ::std::option::Option::None },
    }
}

fn option_string(value: Option<&str>) -> TokenStream2 {
    match value {
        Some(value) => quote! { ::std::option::Option::Some(::std::string::String::from(#value)) },
        None => quote! { ::std::option::Option::None },
    }
}
