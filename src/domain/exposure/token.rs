//! Client-held assignment token

use std::collections::BTreeMap;

use crate::domain::experiment::{Combination, TestSetId};

/// Assignments a client carries between requests, keyed by test set.
///
/// A `None` entry is an explicit "no combination" assignment, written when the
/// client was excluded or its combination was cleared. The content is untrusted
/// and must be checked against the current test set before use.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentToken {
    entries: BTreeMap<TestSetId, Option<Vec<u8>>>,
}

impl AssignmentToken {
    /// Create an empty token
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`set`](Self::set)
    pub fn with_entry(mut self, test_set_id: TestSetId, indices: Option<Vec<u8>>) -> Self {
        self.set(test_set_id, indices);
        self
    }

    /// Get the entry for a test set.
    ///
    /// The outer option is the presence of the entry, the inner one whether it
    /// holds a combination.
    pub fn get(&self, test_set_id: &TestSetId) -> Option<Option<&[u8]>> {
        self.entries.get(test_set_id).map(|v| v.as_deref())
    }

    /// Insert or overwrite an entry
    pub fn set(&mut self, test_set_id: TestSetId, indices: Option<Vec<u8>>) {
        self.entries.insert(test_set_id, indices);
    }

    /// Iterate over entries in test set order
    pub fn entries(&self) -> impl Iterator<Item = (&TestSetId, Option<&[u8]>)> {
        self.entries.iter().map(|(k, v)| (k, v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Overlay `other` on top of this token
    pub fn merge(&mut self, other: &AssignmentToken) {
        for (id, indices) in &other.entries {
            self.entries.insert(id.clone(), indices.clone());
        }
    }
}

/// The token as received with a request plus what the evaluation wrote back
#[derive(Debug, Clone, Default)]
pub struct TokenJar {
    incoming: AssignmentToken,
    outgoing: AssignmentToken,
}

impl TokenJar {
    /// Wrap the token decoded from the request
    pub fn new(incoming: AssignmentToken) -> Self {
        Self {
            incoming,
            outgoing: AssignmentToken::new(),
        }
    }

    /// Get the combination the request carried for a test set
    pub fn read(&self, test_set_id: &TestSetId) -> Option<&[u8]> {
        self.incoming.get(test_set_id).flatten()
    }

    /// Persist a combination for a test set, or clear it with `None`
    pub fn write(&mut self, test_set_id: &TestSetId, combination: Option<&Combination>) {
        self.outgoing.set(
            test_set_id.clone(),
            combination.map(|c| c.indices().to_vec()),
        );
    }

    pub fn incoming(&self) -> &AssignmentToken {
        &self.incoming
    }

    /// Entries written during evaluation
    pub fn outgoing(&self) -> &AssignmentToken {
        &self.outgoing
    }

    /// Check if the evaluation wrote anything
    pub fn has_writes(&self) -> bool {
        !self.outgoing.is_empty()
    }

    /// Discard writes, used when an evaluation fails half way
    pub fn reset_writes(&mut self) {
        self.outgoing = AssignmentToken::new();
    }

    /// The token the client should hold after this request
    pub fn merged(&self) -> AssignmentToken {
        let mut token = self.incoming.clone();
        token.merge(&self.outgoing);
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: &str) -> TestSetId {
        TestSetId::new(value).unwrap()
    }

    #[test]
    fn test_token_entries() {
        let token = AssignmentToken::new()
            .with_entry(id("hero-test"), Some(vec![1, 0]))
            .with_entry(id("cta-test"), None);

        assert_eq!(token.get(&id("hero-test")), Some(Some(&[1u8, 0][..])));
        assert_eq!(token.get(&id("cta-test")), Some(None));
        assert_eq!(token.get(&id("other")), None);
        assert_eq!(token.len(), 2);
    }

    #[test]
    fn test_jar_reads_only_combinations() {
        let jar = TokenJar::new(
            AssignmentToken::new()
                .with_entry(id("hero-test"), Some(vec![2]))
                .with_entry(id("cta-test"), None),
        );

        assert_eq!(jar.read(&id("hero-test")), Some(&[2u8][..]));
        assert_eq!(jar.read(&id("cta-test")), None);
        assert!(!jar.has_writes());
    }

    #[test]
    fn test_jar_merges_writes_over_incoming() {
        let mut jar = TokenJar::new(
            AssignmentToken::new()
                .with_entry(id("hero-test"), Some(vec![2]))
                .with_entry(id("cta-test"), Some(vec![1])),
        );

        jar.write(&id("hero-test"), None);
        let combination = Combination::new(id("new-test"), vec![0, 1]);
        jar.write(&id("new-test"), Some(&combination));

        let merged = jar.merged();
        assert_eq!(merged.get(&id("hero-test")), Some(None));
        assert_eq!(merged.get(&id("cta-test")), Some(Some(&[1u8][..])));
        assert_eq!(merged.get(&id("new-test")), Some(Some(&[0u8, 1][..])));

        jar.reset_writes();
        assert!(!jar.has_writes());
    }
}
