use uuid::timestamp::{context::ContextV7, Timestamp};
use uuid::Uuid;

/// Strategy for generating object keys
pub trait KeyStrategy: Send + Sync {
    /// Generate a fresh key for an object.
    ///
    /// The original client-supplied name contributes at most its extension,
    /// as a download-time convenience; it is never a trust signal.
    fn object_key(&self, original_name: &str) -> String;
}

/// Default key strategy: UUIDv7 plus the original extension.
///
/// UUIDv7 keys are time-ordered, so newer objects sort lexically after
/// older ones, and the 74 random bits make collisions negligible without
/// any cross-request coordination. A shared [`ContextV7`] keeps keys
/// generated within the same millisecond in generation order.
pub struct TimeOrderedKeyStrategy {
    context: ContextV7,
}

impl TimeOrderedKeyStrategy {
    pub fn new() -> Self {
        Self {
            context: ContextV7::new(),
        }
    }
}

impl Default for TimeOrderedKeyStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyStrategy for TimeOrderedKeyStrategy {
    fn object_key(&self, original_name: &str) -> String {
        let id = Uuid::new_v7(Timestamp::now(&self.context));
        match extension_of(original_name) {
            Some(ext) => format!("{}.{}", id, ext),
            None => id.to_string(),
        }
    }
}

/// Lowercased extension of a file name, if it has a usable one
pub fn extension_of(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn keys_keep_original_extension() {
        let keys = TimeOrderedKeyStrategy::new();
        assert!(keys.object_key("holiday.JPG").ends_with(".jpg"));
        assert!(!keys.object_key("no-extension").contains('.'));
        assert!(!keys.object_key(".bashrc").contains('.'));
    }

    #[test]
    fn extension_extraction() {
        assert_eq!(extension_of("a.png"), Some("png".to_string()));
        assert_eq!(extension_of("archive.tar.GZ"), Some("gz".to_string()));
        assert_eq!(extension_of("noext"), None);
        assert_eq!(extension_of("trailing."), None);
        assert_eq!(extension_of("weird.p@g"), None);
    }

    #[test]
    fn generated_keys_are_unique_and_time_ordered() {
        let keys = TimeOrderedKeyStrategy::new();
        let generated: Vec<String> = (0..100_000).map(|_| keys.object_key("photo.png")).collect();

        let distinct: HashSet<&String> = generated.iter().collect();
        assert_eq!(distinct.len(), generated.len());

        let mut sorted = generated.clone();
        sorted.sort();
        assert_eq!(sorted, generated);
    }
}
