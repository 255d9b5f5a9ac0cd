// Procedural macro host for Listen code generation
// Runs the generator over an inline module and appends what it produces

use proc_macro::TokenStream;

mod listeners;

/// Generates dispatchers and event taxonomies for the traits of an inline
/// module.
///
/// Inside the module, `#[listener]` on a trait asks for a
/// `<Trait>Dispatcher`, `#[event_listener(events = "..", base = "..")]` asks
/// for an events module and base trait, and `#[param_name("..")]` renames a
/// method parameter in everything generated from it.
///
/// ```ignore
/// #[listen::listeners(removal = "all")]
/// mod ui {
///     #[listener]
///     #[event_listener]
///     pub trait ClickListener {
///         fn on_click(&self, x: i32, label: String);
///     }
/// }
/// ```
///
/// Options: `failure = "abort" | "isolate"`, `removal = "first" | "all"`,
/// `derives = "Debug, Clone"` (derives for event records).
#[proc_macro_attribute]
pub fn listeners(attr: TokenStream, item: TokenStream) -> TokenStream {
    listeners::listeners_impl(attr, item)
}
