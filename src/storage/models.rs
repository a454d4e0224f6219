use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored file record. One record exists per distinct content hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    /// Generated object store key, e.g. `uploads/<uuid>.png`
    pub stored_location: String,
    pub original_filename: String,
    pub content_type: String,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
    /// Lowercase hex SHA-256 of the stored bytes
    pub content_hash: String,
    pub reference_count: u64,
}

/// Filters applied when listing files. All set filters must match.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    /// Case-insensitive substring of the content type
    pub content_type_contains: Option<String>,
    /// Inclusive `(min, max)` byte size range. Bounds may be negative: a
    /// negative min admits everything from zero, a negative max admits nothing.
    pub size_range: Option<(i64, i64)>,
    /// Case-insensitive substring of the original filename
    pub search: Option<String>,
    pub min_size: Option<u64>,
    pub max_size: Option<u64>,
    pub uploaded_after: Option<DateTime<Utc>>,
}

impl ListFilter {
    pub fn matches(&self, file: &FileRecord) -> bool {
        if let Some(ref needle) = self.content_type_contains {
            if !contains_ignore_case(&file.content_type, needle) {
                return false;
            }
        }
        if let Some((min, max)) = self.size_range {
            let size = i64::try_from(file.size).unwrap_or(i64::MAX);
            if size < min || size > max {
                return false;
            }
        }
        if let Some(ref needle) = self.search {
            if !contains_ignore_case(&file.original_filename, needle) {
                return false;
            }
        }
        if self.min_size.is_some_and(|min| file.size < min) {
            return false;
        }
        if self.max_size.is_some_and(|max| file.size > max) {
            return false;
        }
        if self.uploaded_after.is_some_and(|after| file.uploaded_at < after) {
            return false;
        }
        true
    }
}

/// Parse a `"min,max"` size range. Returns `None` for anything malformed so
/// callers can ignore the filter instead of failing the request.
pub fn parse_size_range(value: &str) -> Option<(i64, i64)> {
    let (min, max) = value.split_once(',')?;
    let min = min.trim().parse().ok()?;
    let max = max.trim().parse().ok()?;
    Some((min, max))
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, content_type: &str, size: u64) -> FileRecord {
        FileRecord {
            id: "id".to_string(),
            stored_location: "uploads/id.bin".to_string(),
            original_filename: name.to_string(),
            content_type: content_type.to_string(),
            size,
            uploaded_at: Utc::now(),
            content_hash: "00".repeat(32),
            reference_count: 1,
        }
    }

    #[test]
    fn test_parse_size_range() {
        assert_eq!(parse_size_range("10,100"), Some((10, 100)));
        assert_eq!(parse_size_range(" 10 , 100 "), Some((10, 100)));
        assert_eq!(parse_size_range("abc"), None);
        assert_eq!(parse_size_range("10"), None);
        assert_eq!(parse_size_range("10,"), None);
        assert_eq!(parse_size_range("10,20,30"), None);
        assert_eq!(parse_size_range("1.5,20"), None);
    }

    #[test]
    fn test_negative_size_bounds() {
        assert_eq!(parse_size_range("-1,20"), Some((-1, 20)));

        let filter = ListFilter {
            size_range: parse_size_range("-1,20"),
            ..Default::default()
        };
        assert!(filter.matches(&record("a", "x", 0)));
        assert!(filter.matches(&record("a", "x", 20)));
        assert!(!filter.matches(&record("a", "x", 500)));

        let filter = ListFilter {
            size_range: parse_size_range("0,-5"),
            ..Default::default()
        };
        assert!(!filter.matches(&record("a", "x", 0)));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(ListFilter::default().matches(&record("a.txt", "text/plain", 5)));
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let filter = ListFilter {
            search: Some("REPORT".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&record("Q3-report.pdf", "application/pdf", 5)));
        assert!(!filter.matches(&record("notes.txt", "text/plain", 5)));
    }

    #[test]
    fn test_content_type_contains() {
        let filter = ListFilter {
            content_type_contains: Some("Image".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&record("a.png", "image/png", 5)));
        assert!(!filter.matches(&record("a.pdf", "application/pdf", 5)));
    }

    #[test]
    fn test_size_bounds_are_inclusive() {
        let filter = ListFilter {
            size_range: Some((10, 100)),
            ..Default::default()
        };
        assert!(filter.matches(&record("a", "x", 10)));
        assert!(filter.matches(&record("a", "x", 100)));
        assert!(!filter.matches(&record("a", "x", 9)));
        assert!(!filter.matches(&record("a", "x", 101)));

        let filter = ListFilter {
            min_size: Some(10),
            max_size: Some(20),
            ..Default::default()
        };
        assert!(filter.matches(&record("a", "x", 20)));
        assert!(!filter.matches(&record("a", "x", 21)));
    }

    #[test]
    fn test_filters_combine_with_and() {
        let filter = ListFilter {
            search: Some("report".to_string()),
            content_type_contains: Some("pdf".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&record("report.pdf", "application/pdf", 5)));
        assert!(!filter.matches(&record("report.txt", "text/plain", 5)));
    }
}
