//! Procedural macros for **chatfn-rs**
#![forbid(unsafe_code)]

use proc_macro::TokenStream;
use proc_macro2::{Ident, Span};
use proc_macro_crate::{FoundCrate, crate_name};
use proc_macro_error::{abort, proc_macro_error};
use quote::quote;
use syn::{
    Attribute, Data, DataEnum, DeriveInput, Expr, ExprLit, Fields, FieldsNamed, FnArg, ItemFn,
    Lit, LitBool, LitStr, Meta, Pat, PatIdent, PatType, ReturnType, Type, TypePath,
    parse_macro_input,
};

// ============================================================================
// DESCRIBE DERIVE MACRO
// ============================================================================

/// Derives `Describe` and `FromArgValue`.
///
/// Structs with named fields become records, enums with unit variants become
/// choices. `Option` fields default to null and are not required.
#[proc_macro_error]
#[proc_macro_derive(Describe)]
pub fn derive_describe(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match &input.data {
        Data::Struct(data_struct) => match &data_struct.fields {
            Fields::Named(fields) => generate_record(&input, fields),
            Fields::Unnamed(_) => abort!(input.ident, "Tuple structs cannot be described"),
            Fields::Unit => abort!(input.ident, "Unit structs cannot be described"),
        },
        Data::Enum(data_enum) => generate_choice(&input, data_enum),
        Data::Union(_) => abort!(input.ident, "Unions cannot be described"),
    }
}

fn generate_record(input: &DeriveInput, fields: &FieldsNamed) -> TokenStream {
    let name = &input.ident;
    let name_str = name.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let crate_path = get_crate_path();
    let record_doc = doc_call(&input.attrs);

    let mut idents = Vec::new();
    let mut names = Vec::new();
    let mut descriptors = Vec::new();

    for field in &fields.named {
        let Some(ident) = field.ident.as_ref() else {
            abort!(field, "expected a named field");
        };
        let field_name = ident.to_string();
        let ty = &field.ty;

        let default_call = if is_option_type(ty) {
            quote! { .with_default(#crate_path::serde_json::Value::Null) }
        } else {
            quote! {}
        };
        let field_doc = doc_call(&field.attrs);

        descriptors.push(quote! {
            #crate_path::schema::FieldDescriptor::new(
                #field_name,
                <#ty as #crate_path::schema::Describe>::descriptor(),
            )
            #default_call
            #field_doc
        });
        idents.push(ident);
        names.push(field_name);
    }

    TokenStream::from(quote! {
        impl #impl_generics #crate_path::schema::Describe for #name #ty_generics #where_clause {
            fn descriptor() -> #crate_path::schema::TypeDescriptor {
                #crate_path::schema::TypeDescriptor::Record(
                    #crate_path::schema::RecordDescriptor::new(#name_str)
                        #record_doc
                        #( .field(#descriptors) )*
                )
            }
        }

        impl #impl_generics #crate_path::value::FromArgValue for #name #ty_generics #where_clause {
            fn from_arg_value(
                value: #crate_path::value::ArgValue,
            ) -> ::std::result::Result<Self, #crate_path::error::ToolError> {
                let mut fields = value.into_record(#name_str)?;
                ::std::result::Result::Ok(Self {
                    #( #idents: #crate_path::value::take_field(&mut fields, #names)?, )*
                })
            }
        }
    })
}

fn generate_choice(input: &DeriveInput, data: &DataEnum) -> TokenStream {
    let name = &input.ident;
    let name_str = name.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let crate_path = get_crate_path();
    let choice_doc = doc_call(&input.attrs);

    let variants: Vec<&Ident> = data
        .variants
        .iter()
        .map(|variant| {
            if !matches!(variant.fields, Fields::Unit) {
                abort!(variant, "Only enums with unit variants can be described");
            }
            &variant.ident
        })
        .collect();
    let members: Vec<String> = variants.iter().map(|v| v.to_string()).collect();
    let count = members.len();

    TokenStream::from(quote! {
        impl #impl_generics #crate_path::schema::Describe for #name #ty_generics #where_clause {
            fn descriptor() -> #crate_path::schema::TypeDescriptor {
                #crate_path::schema::TypeDescriptor::Choice(
                    #crate_path::schema::ChoiceDescriptor::new(#name_str, {
                        let members: [&str; #count] = [#(#members),*];
                        members
                    })
                        #choice_doc
                )
            }
        }

        impl #impl_generics #crate_path::value::FromArgValue for #name #ty_generics #where_clause {
            fn from_arg_value(
                value: #crate_path::value::ArgValue,
            ) -> ::std::result::Result<Self, #crate_path::error::ToolError> {
                match value.into_choice(#name_str)?.as_str() {
                    #( #members => ::std::result::Result::Ok(Self::#variants), )*
                    other => ::std::result::Result::Err(#crate_path::error::ToolError::ArgumentConversion {
                        expected: #name_str.to_string(),
                        found: other.to_string(),
                    }),
                }
            }
        }
    })
}

fn get_crate_path() -> proc_macro2::TokenStream {
    match crate_name("chatfn_core") {
        Ok(FoundCrate::Itself) => quote!(crate),
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(#ident)
        }
        Err(_) => quote!(::chatfn_core),
    }
}

fn is_option_type(ty: &Type) -> bool {
    let Type::Path(TypePath { qself: None, path }) = ty else {
        return false;
    };

    let Some(last) = path.segments.last() else {
        return false;
    };
    if last.ident != "Option" {
        return false;
    }

    match path
        .segments
        .iter()
        .map(|s| &s.ident)
        .collect::<Vec<_>>()
        .as_slice()
    {
        [ident] if *ident == "Option" => true,

        [first, second, ident]
            if (*first == "std" || *first == "core")
                && *second == "option"
                && *ident == "Option" =>
        {
            true
        }

        _ => false,
    }
}

/// `Result<..>` by its last path segment; aliases like `io::Result` count too.
fn returns_result(output: &ReturnType) -> bool {
    let ReturnType::Type(_, ty) = output else {
        return false;
    };
    let Type::Path(TypePath { qself: None, path }) = &**ty else {
        return false;
    };
    path.segments.last().is_some_and(|s| s.ident == "Result")
}

/// A local for generated code that user parameter names cannot shadow.
fn hidden_ident(name: &str) -> Ident {
    Ident::new(&format!("__chatfn_{name}"), Span::mixed_site())
}

/// Gather `///` doc-comments into a single string, trimming the leading space after `///`.
fn docs(attrs: &[Attribute]) -> String {
    attrs
        .iter()
        .filter_map(|a| match &a.meta {
            Meta::NameValue(nv) if a.path().is_ident("doc") => {
                if let Expr::Lit(ExprLit {
                    lit: Lit::Str(s), ..
                }) = &nv.value
                {
                    Some(s.value().trim_start().to_owned())
                } else {
                    None
                }
            }
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn doc_call(attrs: &[Attribute]) -> proc_macro2::TokenStream {
    let doc = docs(attrs);
    let doc = doc.trim();
    if doc.is_empty() {
        quote! {}
    } else {
        quote! { .with_doc(#doc) }
    }
}

// ============================================================================
// FUNCTION ATTRIBUTE MACRO
// ============================================================================

#[derive(Default)]
struct FunctionArgs {
    name: Option<LitStr>,
    description: Option<LitStr>,
    save_return: Option<LitBool>,
    serialize: Option<LitBool>,
    remove_call: Option<LitBool>,
    interpret_as_response: Option<LitBool>,
}

impl FunctionArgs {
    fn parse(&mut self, meta: syn::meta::ParseNestedMeta<'_>) -> syn::Result<()> {
        let path = &meta.path;
        if path.is_ident("name") {
            self.name = Some(meta.value()?.parse()?);
        } else if path.is_ident("description") {
            self.description = Some(meta.value()?.parse()?);
        } else if path.is_ident("save_return") {
            self.save_return = Some(meta.value()?.parse()?);
        } else if path.is_ident("serialize") {
            self.serialize = Some(meta.value()?.parse()?);
        } else if path.is_ident("remove_call") {
            self.remove_call = Some(meta.value()?.parse()?);
        } else if path.is_ident("interpret_as_response") {
            self.interpret_as_response = Some(meta.value()?.parse()?);
        } else {
            return Err(meta.error("unsupported #[function] property"));
        }
        Ok(())
    }
}

/// Registers a free function for the model.
///
/// Generates a `<fn>_function()` constructor returning a `FunctionWrapper`
/// and submits it to the global registry collected by
/// `BasicFunctionSet::collect`.
#[proc_macro_error]
#[proc_macro_attribute]
pub fn function(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut args = FunctionArgs::default();
    let parser = syn::meta::parser(|meta| args.parse(meta));
    parse_macro_input!(attr with parser);

    // ───────── Parse the user function ─────────
    let func: ItemFn = parse_macro_input!(item);
    let fn_name = &func.sig.ident;
    let vis = &func.vis;
    if !func.sig.generics.params.is_empty() {
        abort!(func.sig.generics, "`#[function]` does not support generic functions");
    }

    let registered_name = args
        .name
        .clone()
        .unwrap_or_else(|| LitStr::new(&fn_name.to_string(), Span::call_site()));
    let doc_lit = LitStr::new(&docs(&func.attrs), Span::call_site());

    // ───────── Inputs → parameters ─────────
    let (idents, types): (Vec<_>, Vec<_>) = func
        .sig
        .inputs
        .iter()
        .map(|arg| match arg {
            FnArg::Typed(PatType { pat, ty, .. }) => {
                let Pat::Ident(PatIdent { ident, .. }) = &**pat else {
                    abort!(pat, "`#[function]` supports only identifier patterns");
                };
                if matches!(**ty, Type::Reference(_)) {
                    abort!(ty, "`#[function]` parameters must be owned types");
                }
                (ident.clone(), (**ty).clone())
            }
            _ => abort!(arg, "`#[function]` may not be used on `self` methods"),
        })
        .unzip();
    let names: Vec<String> = idents.iter().map(|i| i.to_string()).collect();

    let crate_path = get_crate_path();

    let params = types.iter().zip(&names).map(|(ty, name)| {
        let optional = if is_option_type(ty) {
            quote! { .optional() }
        } else {
            quote! {}
        };
        quote! {
            .param(
                #crate_path::function::Param::new(
                    #name,
                    <#ty as #crate_path::schema::Describe>::descriptor(),
                )
                #optional
            )
        }
    });

    let description = args
        .description
        .as_ref()
        .map(|d| quote! { .description(#d) });
    let flags = [
        ("save_return", &args.save_return),
        ("serialize", &args.serialize),
        ("remove_call", &args.remove_call),
        ("interpret_as_response", &args.interpret_as_response),
    ]
    .into_iter()
    .filter_map(|(setter, value)| {
        let setter = Ident::new(setter, Span::call_site());
        value.as_ref().map(|v| quote! { .#setter(#v) })
    });

    // ───────── Call and result mapping ─────────
    let mut call = quote! { #fn_name( #( #idents ),* ) };
    if func.sig.asyncness.is_some() {
        call = quote! { #call.await };
    }
    let output = if returns_result(&func.sig.output) {
        quote! {
            #call.map_err(|e| #crate_path::error::ToolError::Runtime(e.to_string()))?
        }
    } else {
        call
    };

    let ctor = Ident::new(&format!("{fn_name}_function"), Span::call_site());
    let arguments = hidden_ident("args");
    let out = hidden_ident("out");

    // ───────── Macro expansion ─────────
    TokenStream::from(quote! {
        #func

        #vis fn #ctor() -> ::std::result::Result<
            #crate_path::function::FunctionWrapper,
            #crate_path::error::ToolError,
        > {
            #crate_path::function::FunctionWrapper::builder(#registered_name)
                .docs(#doc_lit)
                #description
                #( #params )*
                #( #flags )*
                .handler(|#arguments: #crate_path::function::Arguments| async move {
                    #[allow(unused_mut)]
                    let mut #arguments = #arguments;
                    #( let #idents: #types = #arguments.take(#names)?; )*
                    let #out = #output;
                    ::std::result::Result::Ok::<_, #crate_path::error::ToolError>(#out)
                })
        }

        #crate_path::inventory::submit! {
            #crate_path::function::FunctionRegistration::new(#registered_name, #ctor)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::{Type, parse_quote};

    #[test]
    fn test_is_option_type_detection() {
        let simple_option: Type = parse_quote!(Option<i32>);
        assert!(is_option_type(&simple_option));

        let std_option: Type = parse_quote!(std::option::Option<String>);
        assert!(is_option_type(&std_option));

        let core_option: Type = parse_quote!(core::option::Option<bool>);
        assert!(is_option_type(&core_option));

        let vec_type: Type = parse_quote!(Vec<i32>);
        assert!(!is_option_type(&vec_type));

        let custom_type: Type = parse_quote!(MyCustomOption<i32>);
        assert!(!is_option_type(&custom_type));

        // Paths that end in `Option` but are not the std one
        let fake_option: Type = parse_quote!(my_mod::Option<i32>);
        assert!(!is_option_type(&fake_option));
    }

    #[test]
    fn test_result_return_detection() {
        let item: ItemFn = parse_quote! { fn a() -> Result<i32, String> { Ok(1) } };
        assert!(returns_result(&item.sig.output));

        let item: ItemFn = parse_quote! { fn b() -> std::io::Result<()> { Ok(()) } };
        assert!(returns_result(&item.sig.output));

        let item: ItemFn = parse_quote! { fn c() -> i32 { 1 } };
        assert!(!returns_result(&item.sig.output));

        let item: ItemFn = parse_quote! { fn d() {} };
        assert!(!returns_result(&item.sig.output));
    }

    #[test]
    fn test_docs_are_joined() {
        let item: ItemFn = parse_quote! {
            /// Adds two numbers.
            ///
            /// # Arguments
            /// * `a` - left
            #[inline]
            fn add(a: i64) -> i64 { a }
        };
        assert_eq!(
            docs(&item.attrs),
            "Adds two numbers.\n\n# Arguments\n* `a` - left"
        );
        assert!(doc_call(&[]).is_empty());
    }

    #[test]
    fn test_generated_locals_are_prefixed() {
        assert_eq!(hidden_ident("args").to_string(), "__chatfn_args");
        assert_ne!(hidden_ident("out").to_string(), "out");
    }

    #[test]
    fn test_function_args_parsing() {
        let mut args = FunctionArgs::default();
        let parser = syn::meta::parser(|meta| args.parse(meta));
        syn::parse::Parser::parse2(
            parser,
            quote! { name = "sum", save_return = false, interpret_as_response = true },
        )
        .unwrap();
        assert_eq!(args.name.unwrap().value(), "sum");
        assert!(!args.save_return.unwrap().value);
        assert!(args.interpret_as_response.unwrap().value);
        assert!(args.serialize.is_none());

        let mut args = FunctionArgs::default();
        let parser = syn::meta::parser(|meta| args.parse(meta));
        assert!(syn::parse::Parser::parse2(parser, quote! { bogus = 1 }).is_err());
    }

    #[test]
    fn test_enum_variants_are_inspected() {
        let input: DeriveInput = parse_quote! {
            enum Unit { A, B }
        };
        let Data::Enum(data) = &input.data else {
            panic!("Expected enum");
        };
        assert!(data.variants.iter().all(|v| matches!(v.fields, Fields::Unit)));
    }
}
