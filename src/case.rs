//! Case conversion between resource names (PascalCase directories) and route/table names (snake_case).

fn is_entity_name(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ' '))
}

/// Convert an identifier from PascalCase/camelCase to snake_case.
/// e.g. "OrderItem" -> "order_item", "Widget" -> "widget"
pub fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Normalize an entity (table/view) name to the class-naming convention.
/// e.g. "widget" -> "Widget", "order_item" -> "OrderItem", "orderItem" -> "OrderItem".
/// Returns None for names that cannot become a resource directory.
pub fn to_pascal_case(s: &str) -> Option<String> {
    let s = s.trim();
    if !is_entity_name(s) {
        return None;
    }
    let mut out = String::with_capacity(s.len());
    for segment in s.split(['_', '-', ' ']).filter(|seg| !seg.is_empty()) {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    Some(out)
}

/// The table an entity name refers to: trimmed, with word separators folded to `_`.
/// Letter case is kept as typed.
pub fn to_table_name(s: &str) -> String {
    s.trim().replace(['-', ' '], "_")
}
