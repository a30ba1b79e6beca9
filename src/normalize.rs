use crate::model::Relationship;
use std::collections::HashSet;

/// Drop exact duplicates (same kind, target and field name), keeping the
/// first occurrence in place.
///
/// AST-derived and text-derived relationships are both fed through here;
/// neither source takes precedence over the other.
pub fn dedup_relationships<I>(relationships: I) -> Vec<Relationship>
where
    I: IntoIterator<Item = Relationship>,
{
    let mut seen = HashSet::new();
    relationships
        .into_iter()
        .filter(|rel| seen.insert(rel.clone()))
        .collect()
}
