use std::collections::HashMap;

use chrono::{ DateTime, Utc };

use crate::models::note::Note;

/// Bucket label for notes without a creation timestamp.
pub const UNDATED_KEY: &str = "Undated";

/// Notes bucketed by month, newest bucket first.
#[derive(Clone, Debug, Default)]
pub struct NoteGroups {
    /// Bucket labels in display order.
    pub keys: Vec<String>,
    pub groups: HashMap<String, Vec<Note>>,
}

fn month_key(date: &DateTime<Utc>) -> String {
    // "October 2025"
    date.format("%B %Y").to_string()
}

/// Buckets notes by the month they were created in. Notes inside each bucket
/// are sorted newest-first, and buckets are ordered newest-first by their
/// newest note. Undated notes land in a trailing bucket in input order.
pub fn group_notes_by_month(notes: &[Note]) -> NoteGroups {
    let mut groups: HashMap<String, Vec<Note>> = HashMap::new();

    for note in notes {
        let key = match &note.created_at {
            Some(created_at) => month_key(created_at),
            None => UNDATED_KEY.to_string(),
        };
        groups.entry(key).or_default().push(note.clone());
    }

    for bucket in groups.values_mut() {
        bucket.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }

    let mut keys: Vec<String> = groups.keys().cloned().collect();
    keys.sort_by(|a, b| {
        match (a.as_str() == UNDATED_KEY, b.as_str() == UNDATED_KEY) {
            (true, false) => std::cmp::Ordering::Greater,
            (false, true) => std::cmp::Ordering::Less,
            _ => {
                let newest = |key: &str| groups[key].first().and_then(|n| n.created_at);
                newest(b).cmp(&newest(a))
            }
        }
    });

    NoteGroups { keys, groups }
}

#[cfg(test)]
mod tests {
    use chrono::{ TimeZone, Utc };

    use super::*;

    fn note(id: &str, created_at: Option<(i32, u32, u32)>) -> Note {
        Note {
            id: Some(id.to_string()),
            title: None,
            content: format!("note {}", id),
            user_id: None,
            created_at: created_at.map(|(y, m, d)| Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()),
            updated_at: None,
            archived_at: None,
            note_attachments: Vec::new(),
        }
    }

    #[test]
    fn buckets_by_english_month_name() {
        let grouped = group_notes_by_month(&[note("a", Some((2025, 10, 3)))]);
        assert_eq!(grouped.keys, vec!["October 2025".to_string()]);
    }

    #[test]
    fn newest_month_first_and_newest_note_first_within_month() {
        let notes = vec![
            note("sep-early", Some((2025, 9, 1))),
            note("oct-late", Some((2025, 10, 20))),
            note("oct-early", Some((2025, 10, 2))),
            note("sep-late", Some((2025, 9, 15))),
        ];

        let grouped = group_notes_by_month(&notes);

        assert_eq!(grouped.keys, vec!["October 2025".to_string(), "September 2025".to_string()]);
        let october: Vec<_> = grouped.groups["October 2025"]
            .iter()
            .map(|n| n.id.clone().unwrap())
            .collect();
        assert_eq!(october, vec!["oct-late", "oct-early"]);
        let september: Vec<_> = grouped.groups["September 2025"]
            .iter()
            .map(|n| n.id.clone().unwrap())
            .collect();
        assert_eq!(september, vec!["sep-late", "sep-early"]);
    }

    #[test]
    fn undated_notes_trail_in_input_order() {
        let notes = vec![
            note("undated-1", None),
            note("dated", Some((2025, 1, 1))),
            note("undated-2", None),
        ];

        let grouped = group_notes_by_month(&notes);

        assert_eq!(grouped.keys.last().map(String::as_str), Some(UNDATED_KEY));
        let undated: Vec<_> = grouped.groups[UNDATED_KEY]
            .iter()
            .map(|n| n.id.clone().unwrap())
            .collect();
        assert_eq!(undated, vec!["undated-1", "undated-2"]);
    }

    #[test]
    fn same_month_across_years_stays_separate() {
        let notes = vec![
            note("old", Some((2024, 10, 5))),
            note("new", Some((2025, 10, 5))),
        ];

        let grouped = group_notes_by_month(&notes);

        assert_eq!(grouped.keys, vec!["October 2025".to_string(), "October 2024".to_string()]);
    }
}
