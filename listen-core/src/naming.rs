// Naming rules for generated code

use crate::descriptor::{ParameterDescriptor, simple_name};

/// Emitted name of a parameter: the override when present, else the declared
/// identifier. Used for both the formal parameter and the event record field.
pub fn parameter_name(param: &ParameterDescriptor) -> &str {
    param.name_override.as_deref().unwrap_or(&param.ident)
}

/// Event record name for a method: the first character upper-cased.
///
/// Each `_`-separated segment is treated the same way and the underscores
/// dropped, so `onClick` and `on_click` both become `OnClick`. A raw
/// identifier loses its `r#` prefix first.
pub fn event_type_name(method: &str) -> String {
    method
        .strip_prefix("r#")
        .unwrap_or(method)
        .split('_')
        .filter(|segment| !segment.is_empty())
        .map(capitalize)
        .collect()
}

/// Module name for an events container, e.g. `ClickEvents` -> `click_events`.
///
/// An upper-case run counts as one word, so `HTTPEvents` -> `http_events`.
pub fn module_name(events_name: &str) -> String {
    let chars: Vec<char> = events_name.chars().collect();
    let mut out = String::with_capacity(events_name.len() + 4);
    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                let prev = chars[i - 1];
                let next_lower = chars.get(i + 1).is_some_and(|c| c.is_lowercase());
                if prev.is_lowercase()
                    || prev.is_ascii_digit()
                    || (prev.is_uppercase() && next_lower)
                {
                    out.push('_');
                }
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Generated dispatcher name: the interface's simple name plus `Dispatcher`.
pub fn dispatcher_name(interface: &str) -> String {
    format!("{}Dispatcher", simple_name(interface))
}

/// Default events container name when the directive does not give one.
pub fn default_events_name(interface: &str) -> String {
    format!("{}Events", simple_name(interface))
}

/// Default base trait name when the directive does not give one.
pub fn default_base_name(interface: &str) -> String {
    format!("{}Adapter", simple_name(interface))
}

fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_name_without_override() {
        let param = ParameterDescriptor::new("v", "i32");
        assert_eq!(parameter_name(&param), "v");
    }

    #[test]
    fn test_parameter_name_override_wins() {
        let param = ParameterDescriptor::new("v", "i32").renamed("value");
        assert_eq!(parameter_name(&param), "value");
    }

    #[test]
    fn test_event_type_name() {
        assert_eq!(event_type_name("onClick"), "OnClick");
        assert_eq!(event_type_name("on_click"), "OnClick");
        assert_eq!(event_type_name("closed"), "Closed");
        assert_eq!(event_type_name("on_key_up"), "OnKeyUp");
        assert_eq!(event_type_name("_private"), "Private");
    }

    #[test]
    fn test_event_type_name_of_raw_identifier() {
        assert_eq!(event_type_name("r#type"), "Type");
        assert_eq!(event_type_name("r#match_found"), "MatchFound");
    }

    #[test]
    fn test_module_name() {
        assert_eq!(module_name("ClickEvents"), "click_events");
        assert_eq!(module_name("Events"), "events");
        assert_eq!(module_name("already_snake"), "already_snake");
        assert_eq!(module_name("Http2Events"), "http2_events");
    }

    #[test]
    fn test_module_name_splits_upper_case_runs() {
        assert_eq!(module_name("CEvents"), "c_events");
        assert_eq!(module_name("HTTPEvents"), "http_events");
        assert_eq!(module_name("IOError"), "io_error");
        assert_eq!(module_name("HTTP"), "http");
    }

    #[test]
    fn test_generated_type_names() {
        assert_eq!(dispatcher_name("ui::ClickListener"), "ClickListenerDispatcher");
        assert_eq!(default_events_name("ClickListener"), "ClickListenerEvents");
        assert_eq!(default_base_name("ClickListener"), "ClickListenerAdapter");
    }
}
