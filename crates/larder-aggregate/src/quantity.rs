//! Default-mode quantity combination.

use larder_core::defaults::QUANTITY_SEPARATOR;

/// Combine multiple quantity strings into a single free-text quantity.
///
/// Blank entries are dropped; a single surviving quantity is kept verbatim;
/// multiple quantities are joined in source order with `" + "`. No numeric
/// or unit summation is attempted: combining `"1 cup"` and `"2 cups"`
/// yields `"1 cup + 2 cups"`, which is the documented behavior of default
/// mode, not a limitation to be fixed here.
pub fn combine_default(quantities: &[String]) -> String {
    let valid: Vec<&str> = quantities
        .iter()
        .map(|q| q.trim())
        .filter(|q| !q.is_empty())
        .collect();

    match valid.as_slice() {
        [] => String::new(),
        [single] => (*single).to_string(),
        many => many.join(QUANTITY_SEPARATOR),
    }
}
