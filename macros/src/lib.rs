//! Procedural macros for the xai-client crate.
//!
//! - [`completion_schema`] - prepares a type for use with
//!   `ChatClient::create_structured_completion::<T>()`
//!
//! # Quick Start
//!
//! ```rust
//! use xai_client_macros::completion_schema;
//!
//! #[completion_schema(name = "weather")]
//! struct WeatherResponse {
//!     city: String,
//!     temperature: f64,
//!     conditions: String,
//! }
//! ```

use proc_macro::TokenStream;
use quote::quote;
use syn::{Item, LitStr, parse_macro_input};

/// Attribute macro for types returned by structured completions.
///
/// # What it does
///
/// - Adds `#[derive(serde::Deserialize, schemars::JsonSchema)]`
/// - Adds `#[schemars(deny_unknown_fields)]` so the generated schema rejects extra keys
/// - With `name = "..."`, sets the schema title, which is sent to the API as the
///   response format name
///
/// # Example
///
/// ```rust
/// use xai_client_macros::completion_schema;
///
/// #[completion_schema(name = "invoice")]
/// struct Invoice {
///     /// Unique invoice identifier
///     invoice_number: String,
///     /// Total amount due
///     #[schemars(range(min = 0))]
///     total_amount: f64,
/// }
/// ```
///
/// Only structs and enums are accepted:
///
/// ```rust,compile_fail
/// use xai_client_macros::completion_schema;
///
/// #[completion_schema]
/// fn not_a_type() {}
/// ```
#[proc_macro_attribute]
pub fn completion_schema(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut name: Option<LitStr> = None;
    let args_parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("name") {
            name = Some(meta.value()?.parse()?);
            Ok(())
        } else {
            Err(meta.error("unsupported completion_schema argument, expected `name`"))
        }
    });
    parse_macro_input!(attr with args_parser);

    let item = parse_macro_input!(item as Item);
    if !matches!(item, Item::Struct(_) | Item::Enum(_)) {
        return syn::Error::new_spanned(
            &item,
            "#[completion_schema] can only be applied to structs and enums",
        )
        .to_compile_error()
        .into();
    }

    let title = name.map(|name| quote! { #[schemars(title = #name)] });

    let expanded = quote! {
        #[derive(serde::Deserialize, schemars::JsonSchema)]
        #[schemars(deny_unknown_fields)]
        #title
        #item
    };

    TokenStream::from(expanded)
}
