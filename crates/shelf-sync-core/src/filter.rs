use shelf_sync_models::ShelfEntry;
use std::collections::HashSet;

/// Entries that survive the block lists, plus how many were dropped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredEntries {
    pub entries: Vec<ShelfEntry>,
    pub blocked: Vec<String>,
}

/// Drop blocked ids and repeated ids. The first occurrence of an id wins;
/// a blocked id is reported once however often it appears.
pub fn filter_entries(entries: Vec<ShelfEntry>, global: &[String], per_source: &[String]) -> FilteredEntries {
    let block: HashSet<&str> = global
        .iter()
        .chain(per_source)
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .collect();

    let mut seen = HashSet::new();
    let mut out = FilteredEntries::default();
    for entry in entries {
        if !seen.insert(entry.id.clone()) {
            continue;
        }
        if block.contains(entry.id.as_str()) {
            out.blocked.push(entry.id);
        } else {
            out.entries.push(entry);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(entries: &[ShelfEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_filter_duplicates_keeps_first() {
        let entries = vec![
            ShelfEntry::new("1").with_progress(10),
            ShelfEntry::new("2"),
            ShelfEntry::new("1").with_progress(90),
        ];
        let filtered = filter_entries(entries, &[], &[]);
        assert_eq!(ids(&filtered.entries), vec!["1", "2"]);
        assert_eq!(filtered.entries[0].progress, 10);
        assert!(filtered.blocked.is_empty());
    }

    #[test]
    fn test_global_and_source_block_lists() {
        let entries = vec![ShelfEntry::new("1"), ShelfEntry::new("2"), ShelfEntry::new("3"), ShelfEntry::new("3")];
        let filtered = filter_entries(entries, &["1".to_string()], &[" 3 ".to_string(), String::new()]);
        assert_eq!(ids(&filtered.entries), vec!["2"]);
        assert_eq!(filtered.blocked, vec!["1", "3"]);
    }
}
