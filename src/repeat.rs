//! Per-identity repeat bookkeeping for a profile

use std::collections::HashMap;

use crate::fingerprint::request_id;
use crate::profile::{ProfileEntry, RecordedRequest};

/// Repeat state for one request identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RepeatMapEntry {
    /// Number of profile entries sharing the identity
    pub expected_count: usize,
    /// Entries with this identity processed by setup so far
    pub invocations: usize,
}

impl RepeatMapEntry {
    /// Whether the identity is recorded more than once
    #[must_use]
    pub fn is_repeated(&self) -> bool {
        self.expected_count > 1
    }
}

/// Map of request identity to repeat state
#[derive(Debug, Clone, Default)]
pub struct RepeatMap {
    entries: HashMap<String, RepeatMapEntry>,
}

impl RepeatMap {
    /// Build the map in a single pass over the whole profile
    ///
    /// Every identity ends up with its total `expected_count` and zero
    /// invocations.
    #[must_use]
    pub fn build(profile: &[ProfileEntry]) -> Self {
        let mut entries: HashMap<String, RepeatMapEntry> = HashMap::new();

        for entry in profile {
            entries
                .entry(request_id(&entry.request))
                .or_default()
                .expected_count += 1;
        }

        Self { entries }
    }

    /// Build the map and walk the profile once more, invocation by invocation
    ///
    /// The second vector holds, for each profile entry in order, the state of
    /// its identity right after that entry was counted. The returned map is
    /// the state after the whole walk, so `invocations == expected_count`
    /// for every identity.
    #[must_use]
    pub fn build_sequence(profile: &[ProfileEntry]) -> (Self, Vec<RepeatMapEntry>) {
        let mut map = Self::build(profile);

        let states = profile
            .iter()
            .map(|entry| {
                let state = map.entries.entry(request_id(&entry.request)).or_default();
                state.invocations += 1;
                *state
            })
            .collect();

        (map, states)
    }

    /// Look up an identity
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&RepeatMapEntry> {
        self.entries.get(id)
    }

    /// Look up the identity of a recorded request
    #[must_use]
    pub fn get_for(&self, request: &RecordedRequest) -> Option<&RepeatMapEntry> {
        self.get(&request_id(request))
    }

    /// Count one setup pass over an entry and return the updated state
    ///
    /// Returns `None` for requests that were not part of the profile the
    /// map was built from.
    pub fn record_invocation(&mut self, request: &RecordedRequest) -> Option<RepeatMapEntry> {
        let entry = self.entries.get_mut(&request_id(request))?;
        entry.invocations += 1;
        Some(*entry)
    }

    /// Number of distinct identities
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no identities
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over identities and their state
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RepeatMapEntry)> {
        self.entries.iter().map(|(id, entry)| (id.as_str(), entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::RecordedResponse;

    fn entry(method: &str, url: &str, body: Option<&str>) -> ProfileEntry {
        let mut request = RecordedRequest::new(method, url);
        request.content = body.map(str::to_string);
        ProfileEntry::new(request, RecordedResponse::new(200, None))
    }

    #[test]
    fn test_build_counts() {
        let profile = vec![
            entry("POST", "/login", Some("a")),
            entry("GET", "/me", None),
            entry("POST", "/login", Some("b")),
        ];

        let map = RepeatMap::build(&profile);

        assert_eq!(map.len(), 2);
        let login = map.get_for(&profile[0].request).unwrap();
        assert_eq!(login.expected_count, 2);
        assert_eq!(login.invocations, 0);
        assert!(login.is_repeated());

        let me = map.get_for(&profile[1].request).unwrap();
        assert_eq!(me.expected_count, 1);
        assert!(!me.is_repeated());
    }

    #[test]
    fn test_all_invocations_start_at_zero() {
        let profile: Vec<_> = (0..5)
            .map(|i| entry("GET", &format!("/item/{}", i % 2), None))
            .collect();

        let map = RepeatMap::build(&profile);

        assert!(map.iter().all(|(_, e)| e.invocations == 0));
        let total: usize = map.iter().map(|(_, e)| e.expected_count).sum();
        assert_eq!(total, 5);
    }

    #[test]
    fn test_record_invocation() {
        let profile = vec![entry("POST", "/login", Some("a")), entry("POST", "/login", Some("b"))];
        let mut map = RepeatMap::build(&profile);

        let first = map.record_invocation(&profile[0].request).unwrap();
        assert_eq!(first.invocations, 1);

        let second = map.record_invocation(&profile[1].request).unwrap();
        assert_eq!(second.invocations, 2);
        assert_eq!(second.expected_count, 2);
    }

    #[test]
    fn test_record_unknown_request() {
        let mut map = RepeatMap::build(&[]);
        assert!(map.is_empty());
        assert!(map
            .record_invocation(&RecordedRequest::new("GET", "/nope"))
            .is_none());
    }

    #[test]
    fn test_build_sequence_counts_each_entry() {
        let profile = vec![
            entry("POST", "http://api.test/login", Some("a")),
            entry("GET", "http://api.test/me", None),
            entry("POST", "api.test/login", Some("b")),
        ];

        let (map, states) = RepeatMap::build_sequence(&profile);

        assert_eq!(
            states,
            vec![
                RepeatMapEntry { expected_count: 2, invocations: 1 },
                RepeatMapEntry { expected_count: 1, invocations: 1 },
                RepeatMapEntry { expected_count: 2, invocations: 2 },
            ]
        );
        assert!(map.iter().all(|(_, state)| state.invocations == state.expected_count));
    }
}
