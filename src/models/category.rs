use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// The closed set of cake categories accepted by the shop.
///
/// Categories are serialized with their display names (e.g. "Birthday Cakes")
/// everywhere: form submissions, JSON responses, and the database column.
/// Unknown values are rejected at the boundary.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    ToSchema,
)]
pub enum Category {
    #[serde(rename = "Birthday Cakes")]
    #[strum(serialize = "Birthday Cakes")]
    BirthdayCakes,
    #[serde(rename = "Wedding Cakes")]
    #[strum(serialize = "Wedding Cakes")]
    WeddingCakes,
    #[serde(rename = "Custom Cakes")]
    #[strum(serialize = "Custom Cakes")]
    CustomCakes,
    #[serde(rename = "Cupcakes")]
    #[strum(serialize = "Cupcakes")]
    Cupcakes,
    #[serde(rename = "Eggless Cake")]
    #[strum(serialize = "Eggless Cake")]
    EgglessCake,
    #[serde(rename = "Chocolate Cakes")]
    #[strum(serialize = "Chocolate Cakes")]
    ChocolateCakes,
    #[serde(rename = "Fruit Cakes")]
    #[strum(serialize = "Fruit Cakes")]
    FruitCakes,
    #[serde(rename = "Cheesecakes")]
    #[strum(serialize = "Cheesecakes")]
    Cheesecakes,
}

impl Category {
    /// URL-safe form of the category name: lowercased, whitespace replaced
    /// with underscores. Used for default image filenames.
    pub fn slug(&self) -> String {
        self.to_string()
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
    }

    /// Resolve a slug (as produced by [`Category::slug`]) back to its category.
    pub fn from_slug(slug: &str) -> Option<Self> {
        use strum::IntoEnumIterator;
        Self::iter().find(|c| c.slug() == slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn display_names_round_trip_through_from_str() {
        for category in Category::iter() {
            let parsed = Category::from_str(&category.to_string()).unwrap();
            assert_eq!(parsed, category);
        }
    }

    #[test]
    fn slug_lowercases_and_underscores() {
        assert_eq!(Category::BirthdayCakes.slug(), "birthday_cakes");
        assert_eq!(Category::ChocolateCakes.slug(), "chocolate_cakes");
        assert_eq!(Category::Cupcakes.slug(), "cupcakes");
        assert_eq!(Category::EgglessCake.slug(), "eggless_cake");
    }

    #[test]
    fn slugs_resolve_back_to_categories() {
        for category in Category::iter() {
            assert_eq!(Category::from_slug(&category.slug()), Some(category));
        }
        assert_eq!(Category::from_slug("tiramisu"), None);
    }

    #[test]
    fn unknown_category_is_rejected() {
        assert!(Category::from_str("Ice Cream Cakes").is_err());
    }

    #[test]
    fn serde_uses_display_names() {
        let json = serde_json::to_string(&Category::WeddingCakes).unwrap();
        assert_eq!(json, "\"Wedding Cakes\"");
        let parsed: Category = serde_json::from_str("\"Fruit Cakes\"").unwrap();
        assert_eq!(parsed, Category::FruitCakes);
    }
}
