use proc_macro::TokenStream;
use quote::quote;
use syn::parse::Parser;
use syn::{parse_macro_input, DeriveInput, Expr, ItemFn, LitBool, LitStr};

#[derive(Clone, Copy)]
enum Format {
    Table,
    Json,
    JsonPretty,
}

impl Format {
    fn to_tokens(self) -> proc_macro2::TokenStream {
        match self {
            Format::Table => quote!(leakseal::Format::Table),
            Format::Json => quote!(leakseal::Format::Json),
            Format::JsonPretty => quote!(leakseal::Format::JsonPretty),
        }
    }
}

/// Prints a leak report of the process-wide registry when the annotated function returns.
///
/// # Parameters
///
/// * `format` - Output format as a string: `"table"` (default), `"json"`, or `"json-pretty"`
/// * `watch` - When `true`, logs leak status transitions through `tracing` while the function runs
///
/// # Examples
///
/// ```rust,no_run
/// #[cfg_attr(feature = "leakseal", leakseal::main)]
/// fn main() {
///     // Your code here
/// }
/// ```
///
/// ```rust,no_run
/// #[cfg_attr(feature = "leakseal", leakseal::main(format = "json-pretty", watch = true))]
/// fn main() {
///     // Your code here
/// }
/// ```
///
/// When using with tokio, place `#[tokio::main]` before `#[leakseal::main]`.
#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    let attrs = &input.attrs;
    let vis = &input.vis;
    let sig = &input.sig;
    let block = &input.block;

    let mut format = Format::Table;
    let mut watch = false;

    if !attr.is_empty() {
        let parser = syn::meta::parser(|meta| {
            if meta.path.is_ident("format") {
                meta.input.parse::<syn::Token![=]>()?;
                let lit: LitStr = meta.input.parse()?;
                format =
                    match lit.value().as_str() {
                        "table" => Format::Table,
                        "json" => Format::Json,
                        "json-pretty" => Format::JsonPretty,
                        other => return Err(meta.error(format!(
                            "Unknown format {:?}. Expected one of: \"table\", \"json\", \"json-pretty\"",
                            other
                        ))),
                    };
                return Ok(());
            }

            if meta.path.is_ident("watch") {
                meta.input.parse::<syn::Token![=]>()?;
                let lit: LitBool = meta.input.parse()?;
                watch = lit.value();
                return Ok(());
            }

            Err(meta.error("Unknown parameter. Supported: format=\"..\", watch=true|false"))
        });

        if let Err(e) = parser.parse2(proc_macro2::TokenStream::from(attr)) {
            return e.to_compile_error().into();
        }
    }

    let format_token = format.to_tokens();

    let watch_init = if watch {
        quote! {
            let _leakseal_watch = leakseal::global().watch();
        }
    } else {
        quote! {}
    };

    // The report guard is declared first so it drops last, after the watcher.
    let body = quote! {
        let _leakseal = leakseal::LeakSealGuardBuilder::new()
            .format(#format_token)
            .build();
        #watch_init
        #block
    };

    let wrapped_body = if sig.asyncness.is_some() {
        quote! { async { #body }.await }
    } else {
        body
    };

    let output = quote! {
        #(#attrs)*
        #vis #sig {
            #wrapped_body
        }
    };

    output.into()
}

/// Implements `leakseal::Trackable` for a type.
///
/// # Parameters (in `#[trackable(..)]`)
///
/// * `max` - Required. Live instances allowed before the type counts as leaking
/// * `name` - Optional tracked name. Defaults to the last two segments of the type path
///
/// # Examples
///
/// ```rust,ignore
/// #[derive(leakseal::Trackable)]
/// #[trackable(name = "Widget", max = 8)]
/// struct Widget {
///     color: u8,
/// }
///
/// let widget = leakseal::Tracked::new(Widget { color: 3 });
/// ```
#[proc_macro_derive(Trackable, attributes(trackable))]
pub fn derive_trackable(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let mut max: Option<Expr> = None;
    let mut name: Option<LitStr> = None;

    for attr in input.attrs.iter().filter(|a| a.path().is_ident("trackable")) {
        let result = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("max") {
                max = Some(meta.value()?.parse()?);
                return Ok(());
            }

            if meta.path.is_ident("name") {
                name = Some(meta.value()?.parse()?);
                return Ok(());
            }

            Err(meta.error("Unknown parameter. Supported: name=\"..\", max=N"))
        });

        if let Err(e) = result {
            return e.to_compile_error().into();
        }
    }

    let Some(max) = max else {
        return syn::Error::new_spanned(
            ident,
            "Missing #[trackable(max = N)] attribute on a #[derive(Trackable)] type",
        )
        .to_compile_error()
        .into();
    };

    let name_fn = name.map(|name| {
        quote! {
            fn tracked_name() -> ::std::string::String {
                ::std::string::String::from(#name)
            }
        }
    });

    let output = quote! {
        impl #impl_generics leakseal::Trackable for #ident #ty_generics #where_clause {
            const MAX_ALLOWED: i64 = #max;
            #name_fn
        }
    };

    output.into()
}
