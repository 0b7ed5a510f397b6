//! Representative labels for sections, used in spreadsheet file names.

use super::prefix::{first_prefix, majority_prefix, second_prefix, shared_prefix};

/// Label for sections without a dominant prefix
pub const MISC_NAME: &str = "misc";

/// Suffix marking a prefix that covers most but not all members
pub const PLUS_SUFFIX: &str = "-plus";

/// Derive the label of a section from its member table names.
///
/// Rules, first match wins:
/// 1. fewer than two members: `misc`
/// 2. one shared second-level prefix: that prefix
/// 3. a second-level prefix held by a majority: `PREFIX-plus`, or the bare
///    first-level prefix when every member also shares that
/// 4. one shared first-level prefix: that prefix
/// 5. a first-level prefix held by a majority: `PREFIX-plus`
/// 6. otherwise `misc`
///
/// A name with a single token is its own second-level prefix.
pub fn derive_main_name(names: &[&str]) -> String {
    if names.len() < 2 {
        return MISC_NAME.to_string();
    }
    if let Some(prefix) = shared_prefix(names, second_prefix) {
        return prefix.to_uppercase();
    }
    if let Some(prefix) = majority_prefix(names, second_prefix) {
        return match shared_prefix(names, first_prefix) {
            Some(first) => first.to_uppercase(),
            None => format!("{}{}", prefix.to_uppercase(), PLUS_SUFFIX),
        };
    }
    if let Some(prefix) = shared_prefix(names, first_prefix) {
        return prefix.to_uppercase();
    }
    if let Some(prefix) = majority_prefix(names, first_prefix) {
        return format!("{}{}", prefix.to_uppercase(), PLUS_SUFFIX);
    }
    MISC_NAME.to_string()
}
