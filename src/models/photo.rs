use super::Category;

/// Storage prefix marking a default-image sentinel in the `photo_path` column.
///
/// The column keeps the `default_<slug>` encoding for compatibility with
/// existing data; in code the reference is always this tagged union, so
/// ownership checks are structural rather than string-based.
const DEFAULT_SENTINEL_PREFIX: &str = "default_";

/// Reference to the image shown for an order.
///
/// `Owned` names an uploaded file whose lifecycle is tied exclusively to one
/// order; `Default` points at the shared bundled image for a category, which
/// is never deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoRef {
    Owned(String),
    Default(Category),
}

impl PhotoRef {
    /// Decode the database representation. Returns `None` when the stored
    /// value is empty or names an unknown default sentinel.
    pub fn decode(photo_path: &str) -> Option<Self> {
        if photo_path.is_empty() {
            return None;
        }
        match photo_path.strip_prefix(DEFAULT_SENTINEL_PREFIX) {
            Some(slug) => Category::from_slug(slug).map(PhotoRef::Default),
            None => Some(PhotoRef::Owned(photo_path.to_string())),
        }
    }

    /// Encode for the `photo_path` column.
    pub fn encode(&self) -> String {
        match self {
            PhotoRef::Owned(name) => name.clone(),
            PhotoRef::Default(category) => {
                format!("{DEFAULT_SENTINEL_PREFIX}{}", category.slug())
            }
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, PhotoRef::Default(_))
    }

    /// Name of the owned uploaded file, if any.
    pub fn owned_file(&self) -> Option<&str> {
        match self {
            PhotoRef::Owned(name) => Some(name),
            PhotoRef::Default(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owned_reference_round_trips() {
        let photo = PhotoRef::Owned("1700000000-123456789.jpg".to_string());
        assert_eq!(PhotoRef::decode(&photo.encode()), Some(photo));
    }

    #[test]
    fn default_reference_round_trips() {
        let photo = PhotoRef::Default(Category::ChocolateCakes);
        assert_eq!(photo.encode(), "default_chocolate_cakes");
        assert_eq!(PhotoRef::decode("default_chocolate_cakes"), Some(photo));
    }

    #[test]
    fn empty_path_decodes_to_none() {
        assert_eq!(PhotoRef::decode(""), None);
    }

    #[test]
    fn unknown_sentinel_decodes_to_none() {
        assert_eq!(PhotoRef::decode("default_gingerbread"), None);
    }

    #[test]
    fn owned_file_only_set_for_uploads() {
        let owned = PhotoRef::Owned("a.png".to_string());
        assert_eq!(owned.owned_file(), Some("a.png"));
        assert!(!owned.is_default());

        let default = PhotoRef::Default(Category::Cupcakes);
        assert_eq!(default.owned_file(), None);
        assert!(default.is_default());
    }
}
