//! Deterministic name derivation for routers, handlers and payload types.

const VIEW_SUFFIX: &str = "View";

/// `UniqueActionView` -> `unique_action_view`, `HTTPResponse` -> `http_response`.
pub fn to_snake_case(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    for (index, ch) in chars.iter().copied().enumerate() {
        if ch == '-' || ch == '_' || ch.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if ch.is_uppercase() && !current.is_empty() {
            let prev = chars[index - 1];
            let next_is_lower = chars.get(index + 1).is_some_and(|next| next.is_lowercase());
            let boundary = prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower);
            if boundary {
                words.push(std::mem::take(&mut current));
            }
        }
        current.extend(ch.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words.join("_")
}

/// `my_view` -> `MyView`. Existing capitals inside a word are kept.
pub fn to_pascal_case(value: &str) -> String {
    value
        .split(['_', '-'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

pub fn strip_view_suffix(class_name: &str) -> &str {
    match class_name.strip_suffix(VIEW_SUFFIX) {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => class_name,
    }
}

/// `UniqueActionView` -> `unique_action`
pub fn class_name_to_function(class_name: &str) -> String {
    to_snake_case(strip_view_suffix(class_name))
}

pub fn router_name(view: &str) -> String {
    format!("router_{}", class_name_to_function(view))
}

/// Name of the function a verb method becomes when its class is flattened.
pub fn route_function_name(verb: &str, view: &str) -> String {
    format!("{verb}_{}", class_name_to_function(view))
}

pub fn payload_input_name(context: &str, handler: &str) -> String {
    format!("PayloadInput{context}{}", to_pascal_case(handler))
}

pub fn payload_output_name(context: &str, handler: &str) -> String {
    format!("PayloadOutput{context}{}", to_pascal_case(handler))
}
