//! Parameter type inspection and rewriting.
//!
//! Record fields live one module below the interface, behind a
//! `use super::*` glob that the records themselves shadow. Field types are
//! rewritten here so they still name what the interface meant.

use crate::descriptor::TypeRef;
use crate::error::{ListenError, Result};
use proc_macro2::Span;
use quote::quote;
use std::collections::HashSet;
use syn::visit::{self, Visit};
use syn::visit_mut::{self, VisitMut};
use syn::{
    BoundLifetimes, Ident, Lifetime, ParenthesizedGenericArguments, Path, PathSegment, Type,
    TypeBareFn, TypePath, TypeReference,
};

/// Prelude types reached through a full path once a record shadows them.
const PRELUDE: &[(&str, &[&str])] = &[
    ("Box", &["std", "boxed"]),
    ("Option", &["std", "option"]),
    ("Result", &["std", "result"]),
    ("String", &["std", "string"]),
    ("Vec", &["std", "vec"]),
];

pub(crate) fn parse(ty: &TypeRef) -> Result<Type> {
    syn::parse_str::<Type>(ty.as_str()).map_err(|e| ListenError::InvalidType {
        ty: ty.to_string(),
        reason: e.to_string(),
    })
}

/// Whether a type holds a non-`'static` borrow anywhere inside it.
///
/// Argument lists of fn pointers and `Fn(..)` bounds are skipped, their
/// borrows are higher-ranked and do not tie the value to a caller.
pub(crate) fn borrows(ty: &Type) -> bool {
    let mut finder = BorrowFinder { found: false };
    finder.visit_type(ty);
    finder.found
}

struct BorrowFinder {
    found: bool,
}

impl<'ast> Visit<'ast> for BorrowFinder {
    fn visit_type_reference(&mut self, r: &'ast TypeReference) {
        if r.lifetime.is_none() {
            self.found = true;
        }
        visit::visit_type_reference(self, r);
    }

    fn visit_lifetime(&mut self, lifetime: &'ast Lifetime) {
        if lifetime.ident != "static" {
            self.found = true;
        }
    }

    fn visit_type_bare_fn(&mut self, _: &'ast TypeBareFn) {}

    fn visit_parenthesized_generic_arguments(&mut self, _: &'ast ParenthesizedGenericArguments) {}

    fn visit_bound_lifetimes(&mut self, _: &'ast BoundLifetimes) {}
}

/// Every identifier a type mentions.
pub(crate) fn idents(ty: &Type) -> Vec<String> {
    let mut collector = IdentCollector(Vec::new());
    collector.visit_type(ty);
    collector.0
}

struct IdentCollector(Vec<String>);

impl<'ast> Visit<'ast> for IdentCollector {
    fn visit_ident(&mut self, ident: &'ast Ident) {
        self.0.push(ident.to_string());
    }
}

/// Rewrite `ty`, written in the interface's scope, for use one module below.
///
/// `self::` and `super::` move up a level. A leading name that `shadowed`
/// contains is reached through `super::`, or through its full path when it
/// comes from the prelude.
pub(crate) fn rescope(ty: &Type, shadowed: &HashSet<String>) -> TypeRef {
    let mut ty = ty.clone();
    Rescoper { shadowed }.visit_type_mut(&mut ty);
    TypeRef::new(quote!(#ty).to_string())
}

struct Rescoper<'a> {
    shadowed: &'a HashSet<String>,
}

impl VisitMut for Rescoper<'_> {
    fn visit_type_path_mut(&mut self, ty: &mut TypePath) {
        match &mut ty.qself {
            Some(qself) => self.visit_type_mut(&mut qself.ty),
            None => return visit_mut::visit_type_path_mut(self, ty),
        }
        for segment in &mut ty.path.segments {
            self.visit_path_arguments_mut(&mut segment.arguments);
        }
    }

    fn visit_path_mut(&mut self, path: &mut Path) {
        visit_mut::visit_path_mut(self, path);
        if path.leading_colon.is_some() {
            return;
        }
        let relative = path.segments.len() > 1;
        let Some(first) = path.segments.first_mut() else {
            return;
        };

        if relative && first.ident == "self" {
            first.ident = keyword("super");
        } else if relative && first.ident == "super" {
            path.segments.insert(0, PathSegment::from(keyword("super")));
        } else if self.shadowed.contains(&first.ident.to_string()) {
            match PRELUDE.iter().find(|(name, _)| first.ident == name) {
                Some((_, prefix)) => {
                    path.leading_colon = Some(Default::default());
                    for (i, segment) in prefix.iter().enumerate() {
                        path.segments.insert(i, PathSegment::from(keyword(segment)));
                    }
                }
                None => path.segments.insert(0, PathSegment::from(keyword("super"))),
            }
        }
    }
}

fn keyword(name: &str) -> Ident {
    Ident::new(name, Span::call_site())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn borrows_str(ty: &str) -> bool {
        borrows(&parse(&TypeRef::new(ty)).unwrap())
    }

    fn rescoped(ty: &str, shadowed: &[&str]) -> String {
        let shadowed = shadowed.iter().map(|s| s.to_string()).collect();
        let rewritten = rescope(&parse(&TypeRef::new(ty)).unwrap(), &shadowed);
        rewritten.as_str().replace(' ', "")
    }

    #[test]
    fn test_top_level_references_borrow() {
        assert!(borrows_str("&str"));
        assert!(borrows_str("&mut Vec<u8>"));
        assert!(borrows_str("&'a str"));
        assert!(!borrows_str("&'static str"));
        assert!(!borrows_str("String"));
    }

    #[test]
    fn test_nested_references_borrow() {
        assert!(borrows_str("Option<&str>"));
        assert!(borrows_str("(&str, u8)"));
        assert!(borrows_str("[&'a u8; 4]"));
        assert!(borrows_str("Cow<'a, str>"));
        assert!(borrows_str("Box<dyn Display + 'a>"));
        assert!(!borrows_str("Vec<&'static str>"));
        assert!(!borrows_str("Cow<'static, str>"));
    }

    #[test]
    fn test_callable_arguments_do_not_borrow() {
        assert!(!borrows_str("Box<dyn Fn(&str)>"));
        assert!(!borrows_str("fn(&str) -> usize"));
        assert!(!borrows_str("Box<dyn for<'x> Fn(&'x str)>"));
    }

    #[test]
    fn test_idents_cover_nested_types() {
        let ty = parse(&TypeRef::new("HashMap<T, Vec<crate::Item>>")).unwrap();
        assert_eq!(idents(&ty), vec!["HashMap", "T", "Vec", "crate", "Item"]);
    }

    #[test]
    fn test_rescope_leaves_unshadowed_names() {
        assert_eq!(rescoped("i32", &["OnClick", "Event"]), "i32");
        assert_eq!(rescoped("Vec<Label>", &["OnClick", "Event"]), "Vec<Label>");
        assert_eq!(rescoped("crate::ui::Label", &["Label"]), "crate::ui::Label");
        assert_eq!(rescoped("::std::string::String", &["String"]), "::std::string::String");
    }

    #[test]
    fn test_rescope_prefixes_shadowed_names() {
        assert_eq!(rescoped("Message", &["Message", "Event"]), "super::Message");
        assert_eq!(rescoped("Option<Event>", &["Message", "Event"]), "Option<super::Event>");
        assert_eq!(
            rescoped("Box<dyn Fn(Message)>", &["Message"]),
            "Box<dynFn(super::Message)>"
        );
    }

    #[test]
    fn test_rescope_spells_out_shadowed_prelude_types() {
        assert_eq!(rescoped("String", &["String"]), "::std::string::String");
        assert_eq!(rescoped("Vec<u8>", &["Vec"]), "::std::vec::Vec<u8>");
    }

    #[test]
    fn test_rescope_moves_relative_paths_up() {
        assert_eq!(rescoped("self::Label", &[]), "super::Label");
        assert_eq!(rescoped("super::Label", &[]), "super::super::Label");
        assert_eq!(rescoped("Vec<self::Label>", &[]), "Vec<super::Label>");
        assert_eq!(
            rescoped("<Message as Codec>::Output", &["Message"]),
            "<super::MessageasCodec>::Output"
        );
    }
}
