use std::collections::BTreeSet;

/// Set of selected zone names. Iteration is in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    zones: BTreeSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, zone: &str) -> bool {
        self.zones.contains(zone)
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.zones.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.zones.iter().cloned().collect()
    }

    /// Returns `true` if the zone was not already selected.
    pub fn insert(&mut self, zone: impl Into<String>) -> bool {
        self.zones.insert(zone.into())
    }

    pub fn remove(&mut self, zone: &str) -> bool {
        self.zones.remove(zone)
    }

    /// Flips membership and returns the new state.
    pub fn toggle(&mut self, zone: &str) -> bool {
        if self.zones.remove(zone) {
            false
        } else {
            self.zones.insert(zone.to_string());
            true
        }
    }

    pub fn clear(&mut self) {
        self.zones.clear();
    }

    pub fn replace<I, S>(&mut self, zones: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.zones = zones.into_iter().map(Into::into).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_membership() {
        let mut selection = SelectionSet::new();
        assert!(selection.toggle("Harbor"));
        assert!(selection.contains("Harbor"));
        assert!(!selection.toggle("Harbor"));
        assert!(selection.is_empty());
    }

    #[test]
    fn uniqueness_and_replace() {
        let mut selection = SelectionSet::new();
        assert!(selection.insert("B"));
        assert!(!selection.insert("B"));
        selection.insert("A");
        assert_eq!(selection.to_vec(), vec!["A", "B"]);

        selection.replace(["C", "C", "D"]);
        assert_eq!(selection.iter().collect::<Vec<_>>(), vec!["C", "D"]);
        assert!(selection.remove("C"));
        selection.clear();
        assert_eq!(selection.len(), 0);
    }
}
