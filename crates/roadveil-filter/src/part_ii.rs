//! Part II subtree redaction.
//!
//! The Part II extension of a BSM is an arbitrarily nested mix of objects
//! and arrays. Removal is structural: a configured member name is deleted
//! from every object that carries it, at any depth, no matter whether its
//! value is a scalar, array, or object. Arrays themselves are never touched;
//! the named members live only in objects.

use serde_json::Value;

/// Removes every occurrence of `member` anywhere under `value`.
///
/// Returns the number of members removed. Key order among the surviving
/// members is preserved.
pub fn remove_all_members(value: &mut Value, member: &str) -> usize {
    match value {
        Value::Object(map) => {
            let mut removed = usize::from(map.shift_remove(member).is_some());
            for child in map.values_mut() {
                removed += remove_all_members(child, member);
            }
            removed
        }
        Value::Array(items) => items
            .iter_mut()
            .map(|item| remove_all_members(item, member))
            .sum(),
        _ => 0,
    }
}

/// Returns true if `member` occurs anywhere under `value`.
///
/// Short-circuits on the first occurrence.
pub fn is_member_present(value: &Value, member: &str) -> bool {
    match value {
        Value::Object(map) => {
            map.contains_key(member)
                || map.values().any(|child| is_member_present(child, member))
        }
        Value::Array(items) => items.iter().any(|item| is_member_present(item, member)),
        _ => false,
    }
}
