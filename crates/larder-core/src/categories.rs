//! Ingredient categorization tables.
//!
//! Maps free-text ingredient names onto store categories via an ordered,
//! case-insensitive keyword scan. The table order is significant: the first
//! keyword contained in the ingredient name wins, so more specific entries
//! must appear before their generic prefixes (e.g. "green onion" before
//! "onion" is unnecessary because both map to Produce, but "tomato sauce"
//! must precede "tomato" to land in Canned & Jarred).

/// Fallback category for unrecognized ingredients.
pub const OTHER_CATEGORY: &str = "Other";

/// Ordered keyword → category table. First match wins.
pub const CATEGORY_KEYWORDS: &[(&str, &str)] = &[
    // Canned & Jarred (before the bare produce/pantry keywords they contain)
    ("tomato sauce", "Canned & Jarred"),
    ("tomato paste", "Canned & Jarred"),
    ("coconut milk", "Canned & Jarred"),
    ("broth", "Canned & Jarred"),
    ("stock", "Canned & Jarred"),
    // Produce
    ("onion", "Produce"),
    ("garlic", "Produce"),
    ("tomato", "Produce"),
    ("potato", "Produce"),
    ("carrot", "Produce"),
    ("celery", "Produce"),
    ("lettuce", "Produce"),
    ("spinach", "Produce"),
    ("kale", "Produce"),
    ("pepper", "Produce"),
    ("cucumber", "Produce"),
    ("broccoli", "Produce"),
    ("mushroom", "Produce"),
    ("zucchini", "Produce"),
    ("squash", "Produce"),
    ("lemon", "Produce"),
    ("lime", "Produce"),
    ("apple", "Produce"),
    ("banana", "Produce"),
    ("orange", "Produce"),
    ("avocado", "Produce"),
    ("herbs", "Produce"),
    ("cilantro", "Produce"),
    ("parsley", "Produce"),
    ("basil", "Produce"),
    ("thyme", "Produce"),
    ("rosemary", "Produce"),
    ("ginger", "Produce"),
    ("scallion", "Produce"),
    ("green onion", "Produce"),
    // Meat & Seafood
    ("chicken", "Meat & Seafood"),
    ("beef", "Meat & Seafood"),
    ("pork", "Meat & Seafood"),
    ("sausage", "Meat & Seafood"),
    ("bacon", "Meat & Seafood"),
    ("ham", "Meat & Seafood"),
    ("turkey", "Meat & Seafood"),
    ("lamb", "Meat & Seafood"),
    ("fish", "Meat & Seafood"),
    ("salmon", "Meat & Seafood"),
    ("shrimp", "Meat & Seafood"),
    ("tuna", "Meat & Seafood"),
    ("crab", "Meat & Seafood"),
    ("lobster", "Meat & Seafood"),
    // Dairy & Eggs
    ("sour cream", "Dairy & Eggs"),
    ("cottage cheese", "Dairy & Eggs"),
    ("milk", "Dairy & Eggs"),
    ("cream", "Dairy & Eggs"),
    ("butter", "Dairy & Eggs"),
    ("cheese", "Dairy & Eggs"),
    ("yogurt", "Dairy & Eggs"),
    ("egg", "Dairy & Eggs"),
    // Bakery & Bread
    ("bread", "Bakery"),
    ("tortilla", "Bakery"),
    ("bun", "Bakery"),
    ("roll", "Bakery"),
    ("pita", "Bakery"),
    ("naan", "Bakery"),
    // Grains & Pasta
    ("rice", "Grains & Pasta"),
    ("pasta", "Grains & Pasta"),
    ("noodle", "Grains & Pasta"),
    ("quinoa", "Grains & Pasta"),
    ("oat", "Grains & Pasta"),
    ("barley", "Grains & Pasta"),
    ("lentil", "Grains & Pasta"),
    ("bean", "Grains & Pasta"),
    // Pantry Staples
    ("olive oil", "Pantry"),
    ("vegetable oil", "Pantry"),
    ("maple syrup", "Pantry"),
    ("baking powder", "Pantry"),
    ("baking soda", "Pantry"),
    ("soy sauce", "Pantry"),
    ("flour", "Pantry"),
    ("sugar", "Pantry"),
    ("salt", "Pantry"),
    ("oil", "Pantry"),
    ("vinegar", "Pantry"),
    ("honey", "Pantry"),
    ("vanilla", "Pantry"),
    ("cornstarch", "Pantry"),
    // Spices
    ("chili powder", "Spices"),
    ("cumin", "Spices"),
    ("paprika", "Spices"),
    ("oregano", "Spices"),
    ("cinnamon", "Spices"),
    ("nutmeg", "Spices"),
    ("cayenne", "Spices"),
    ("curry", "Spices"),
    ("turmeric", "Spices"),
];

/// Category display/shopping-route order. Lower values come first in the
/// store walk; unknown categories sort with "Other" at the end.
pub const CATEGORY_ORDER: &[(&str, i32)] = &[
    ("Produce", 1),
    ("Meat & Seafood", 2),
    ("Dairy & Eggs", 3),
    ("Bakery", 4),
    ("Deli", 5),
    ("Grains & Pasta", 6),
    ("Canned & Jarred", 7),
    ("Frozen", 8),
    ("Pantry", 9),
    ("Spices", 10),
    ("Other", 99),
];

/// Determine the store category for an ingredient name.
///
/// Case-insensitive substring scan over [`CATEGORY_KEYWORDS`]; the first
/// matching keyword wins. Unrecognized names map to `"Other"`.
pub fn categorize(ingredient_name: &str) -> &'static str {
    let name_lower = ingredient_name.to_lowercase();
    for (keyword, category) in CATEGORY_KEYWORDS {
        if name_lower.contains(keyword) {
            return category;
        }
    }
    OTHER_CATEGORY
}

/// Display priority for a category (Produce=1 … Other=99).
///
/// Drives shopping-route ordering only; aggregation correctness does not
/// depend on it.
pub fn category_priority(category: &str) -> i32 {
    CATEGORY_ORDER
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, order)| *order)
        .unwrap_or(99)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_exact_keyword() {
        assert_eq!(categorize("onion"), "Produce");
        assert_eq!(categorize("chicken"), "Meat & Seafood");
        assert_eq!(categorize("flour"), "Pantry");
    }

    #[test]
    fn test_categorize_substring_and_case() {
        assert_eq!(categorize("Diced Yellow Onion"), "Produce");
        assert_eq!(categorize("ONION"), "Produce");
        assert_eq!(categorize("boneless chicken thighs"), "Meat & Seafood");
    }

    #[test]
    fn test_categorize_unknown_is_other() {
        assert_eq!(categorize("mystery ingredient"), "Other");
        assert_eq!(categorize(""), "Other");
    }

    #[test]
    fn test_categorize_first_match_wins() {
        // "tomato sauce" contains both "tomato sauce" and "tomato"; the
        // more specific entry is earlier in the table.
        assert_eq!(categorize("tomato sauce"), "Canned & Jarred");
        assert_eq!(categorize("roma tomato"), "Produce");
        assert_eq!(categorize("chicken broth"), "Canned & Jarred");
    }

    #[test]
    fn test_categorize_compound_dairy() {
        assert_eq!(categorize("sour cream"), "Dairy & Eggs");
        assert_eq!(categorize("heavy cream"), "Dairy & Eggs");
    }

    #[test]
    fn test_category_priority_table() {
        assert_eq!(category_priority("Produce"), 1);
        assert_eq!(category_priority("Spices"), 10);
        assert_eq!(category_priority("Other"), 99);
        assert_eq!(category_priority("Nonexistent"), 99);
    }

    #[test]
    fn test_priority_ordering_matches_store_walk() {
        assert!(category_priority("Produce") < category_priority("Dairy & Eggs"));
        assert!(category_priority("Pantry") < category_priority("Other"));
    }
}
