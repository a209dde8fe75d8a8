//! Entry ordering within a feed page.

use feedbridge_core::error::DomainError;
use feedbridge_core::feed::Entry;

/// Extracts the version encoded in the trailing segment of an entry's
/// locator.
///
/// # Errors
///
/// Returns `DomainError::CorruptEventData` if the segment is not a
/// non-negative integer.
pub fn entry_version(entry: &Entry) -> Result<i64, DomainError> {
    let segment = entry.event_url.rsplit('/').next().unwrap_or_default();
    match segment.parse::<i64>() {
        Ok(version) if version >= 0 => Ok(version),
        Ok(version) => Err(DomainError::CorruptEventData(format!(
            "entry {} has negative version {version}",
            entry.event_url
        ))),
        Err(err) => Err(DomainError::CorruptEventData(format!(
            "entry {} has no numeric version suffix: {err}",
            entry.event_url
        ))),
    }
}

/// Returns the entries of one page sorted by ascending version.
///
/// # Errors
///
/// Returns `DomainError::CorruptEventData` if any locator lacks a numeric
/// version suffix. Nothing is sorted in that case.
pub fn sort_entries(entries: &[Entry]) -> Result<Vec<Entry>, DomainError> {
    let mut versioned = entries
        .iter()
        .map(|entry| entry_version(entry).map(|version| (version, entry.clone())))
        .collect::<Result<Vec<_>, _>>()?;
    versioned.sort_unstable_by_key(|(version, _)| *version);
    Ok(versioned.into_iter().map(|(_, entry)| entry).collect())
}

#[cfg(test)]
mod tests {
    use feedbridge_core::error::DomainError;
    use feedbridge_core::feed::Entry;

    use super::{entry_version, sort_entries};

    fn entry(version: &str) -> Entry {
        Entry::new(format!("http://127.0.0.1:2113/streams/order-1/{version}"))
    }

    #[test]
    fn test_entry_version_reads_trailing_segment() {
        assert_eq!(entry_version(&entry("0")).unwrap(), 0);
        assert_eq!(entry_version(&entry("42")).unwrap(), 42);
        assert_eq!(entry_version(&Entry::new("7")).unwrap(), 7);
    }

    #[test]
    fn test_sort_entries_orders_descending_page_ascending() {
        let page = vec![entry("4"), entry("3"), entry("2"), entry("1"), entry("0")];

        let sorted = sort_entries(&page).unwrap();

        let versions: Vec<i64> = sorted.iter().map(|e| entry_version(e).unwrap()).collect();
        assert_eq!(versions, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_sort_entries_compares_numerically() {
        let page = vec![entry("10"), entry("9"), entry("100"), entry("2")];

        let sorted = sort_entries(&page).unwrap();

        assert_eq!(sorted, vec![entry("2"), entry("9"), entry("10"), entry("100")]);
    }

    #[test]
    fn test_sort_entries_rejects_non_numeric_suffix() {
        let page = vec![entry("1"), entry("head"), entry("0")];

        let result = sort_entries(&page);

        match result {
            Err(DomainError::CorruptEventData(msg)) => {
                assert!(msg.contains("/streams/order-1/head"), "{msg}");
            }
            other => panic!("expected CorruptEventData, got {other:?}"),
        }
    }

    #[test]
    fn test_entry_version_rejects_trailing_slash_and_negative() {
        assert!(matches!(
            entry_version(&entry("3/")),
            Err(DomainError::CorruptEventData(_))
        ));
        assert!(matches!(
            entry_version(&entry("-1")),
            Err(DomainError::CorruptEventData(_))
        ));
    }

    #[test]
    fn test_sort_entries_of_empty_page_is_empty() {
        assert!(sort_entries(&[]).unwrap().is_empty());
    }
}
