use listen_core::config::parse_list;
use listen_core::{
    FailurePolicy, Generator, GeneratorConfig, ListenError, MemorySink, RemovalPolicy,
    descriptor::simple_name, frontend,
};
use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{
    Ident, Item, ItemMod, LitStr, Token,
    parse::{Parse, ParseStream},
    parse_macro_input,
};

struct ListenersArgs {
    config: GeneratorConfig,
}

impl Parse for ListenersArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut config = GeneratorConfig::default();

        while !input.is_empty() {
            let key: Ident = input.parse()?;
            input.parse::<Token![=]>()?;
            let value: LitStr = input.parse()?;
            let invalid = |e: ListenError| syn::Error::new(value.span(), e.to_string());

            match key.to_string().as_str() {
                "failure" => {
                    config.failure_policy = value.value().parse::<FailurePolicy>().map_err(invalid)?
                }
                "removal" => {
                    config.removal_policy = value.value().parse::<RemovalPolicy>().map_err(invalid)?
                }
                "derives" => config.event_derives = parse_list(&value.value()),
                other => {
                    return Err(syn::Error::new(
                        key.span(),
                        format!("unknown listeners option `{}`", other),
                    ));
                }
            }

            if !input.is_empty() {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(ListenersArgs { config })
    }
}

pub fn listeners_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as ListenersArgs);
    let mut module = parse_macro_input!(item as ItemMod);

    let fallback = module.ident.span();
    let Some((_, items)) = module.content.as_mut() else {
        return syn::Error::new(fallback, "listeners can only be applied to an inline module")
            .to_compile_error()
            .into();
    };

    let generated = generate(&args.config, items, fallback);
    frontend::strip_attributes(items);

    match generated {
        Ok(generated) => {
            items.extend(generated);
            quote!(#module).into()
        }
        // Keep the module so its own items still resolve next to the error.
        Err(err) => {
            let errors = err.to_compile_error();
            quote! {
                #module
                #errors
            }
            .into()
        }
    }
}

fn generate(config: &GeneratorConfig, items: &[Item], fallback: Span) -> syn::Result<Vec<Item>> {
    let scanned = frontend::scan(items).map_err(|e| to_syn_error(e, items, fallback))?;

    let mut sink = MemorySink::new();
    Generator::new(config.clone())
        .run(&scanned.graph, &scanned.directives, &mut sink)
        .map_err(|e| to_syn_error(e, items, fallback))?;

    let file: syn::File = syn::parse2(sink.tokens())?;
    Ok(file.items)
}

/// One `syn::Error` per failure, placed on the item it concerns.
fn to_syn_error(err: ListenError, items: &[Item], fallback: Span) -> syn::Error {
    let mut combined: Option<syn::Error> = None;

    for leaf in err.into_leaves() {
        let error = match leaf {
            ListenError::Parse(error) => error,
            other => {
                let span = other
                    .interface()
                    .and_then(|name| span_of(items, simple_name(name)))
                    .unwrap_or(fallback);
                syn::Error::new(span, other.to_string())
            }
        };
        match combined.as_mut() {
            Some(all) => all.combine(error),
            None => combined = Some(error),
        }
    }

    combined.unwrap_or_else(|| syn::Error::new(fallback, "listener generation failed"))
}

fn span_of(items: &[Item], name: &str) -> Option<Span> {
    items.iter().find_map(|item| {
        let ident = match item {
            Item::Trait(i) => &i.ident,
            Item::Struct(i) => &i.ident,
            Item::Enum(i) => &i.ident,
            Item::Union(i) => &i.ident,
            Item::Fn(i) => &i.sig.ident,
            Item::Type(i) => &i.ident,
            Item::Mod(i) => &i.ident,
            Item::Const(i) => &i.ident,
            Item::Static(i) => &i.ident,
            _ => return None,
        };
        (ident == name).then(|| ident.span())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_default() {
        let args: ListenersArgs = syn::parse_str("").unwrap();
        assert_eq!(args.config, GeneratorConfig::default());
    }

    #[test]
    fn test_args_all_options() {
        let args: ListenersArgs =
            syn::parse_str(r#"failure = "isolate", removal = "all", derives = "Debug, PartialEq""#)
                .unwrap();

        assert_eq!(args.config.failure_policy, FailurePolicy::Isolate);
        assert_eq!(args.config.removal_policy, RemovalPolicy::All);
        assert_eq!(args.config.event_derives, vec!["Debug", "PartialEq"]);
    }

    #[test]
    fn test_args_reject_unknown_value() {
        assert!(syn::parse_str::<ListenersArgs>(r#"removal = "last""#).is_err());
        assert!(syn::parse_str::<ListenersArgs>(r#"colour = "red""#).is_err());
    }

    #[test]
    fn test_generate_appends_dispatcher() {
        let file: syn::File = syn::parse_str(
            "#[listener] pub trait Clicks { fn on_click(&self, x: i32); }",
        )
        .unwrap();

        let generated =
            generate(&GeneratorConfig::default(), &file.items, Span::call_site()).unwrap();

        assert!(generated.iter().any(|item| matches!(
            item,
            Item::Struct(s) if s.ident == "ClicksDispatcher"
        )));
    }

    #[test]
    fn test_generate_reports_non_void_return() {
        let file: syn::File =
            syn::parse_str("#[listener] trait Counter { fn count(&self) -> usize; }").unwrap();

        let err = generate(&GeneratorConfig::default(), &file.items, Span::call_site())
            .unwrap_err();

        assert!(err.to_string().contains("Counter::count"));
    }
}
