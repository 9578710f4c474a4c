//! Proptest generators for property-based testing.

use proptest::prelude::*;

use tenure_core::{Grant, GroupId, SubjectId, DAY_MS};

use crate::fixtures::NOW;

/// Generate a subject id from a small pool, so collisions happen. The
/// first three are fixture members; the rest never resolve.
pub fn subject_id() -> impl Strategy<Value = SubjectId> {
    prop::sample::select(vec!["alice", "bob", "carol", "dave", "erin"]).prop_map(SubjectId::from)
}

/// Generate one of the fixture catalog's groups, or an unknown one.
pub fn group_id() -> impl Strategy<Value = GroupId> {
    prop_oneof![
        4 => Just(GroupId::from("gold")),
        4 => Just(GroupId::from("silver")),
        1 => Just(GroupId::from("retired")),
    ]
}

/// Expiry offsets from [`NOW`], from well past to well ahead.
pub fn offset_ms() -> impl Strategy<Value = i64> {
    prop_oneof![
        -(30 * DAY_MS)..=0i64,
        1i64..=DAY_MS,
        (DAY_MS + 1)..=(30 * DAY_MS),
    ]
}

/// Parameters for generating a grant relative to [`NOW`].
#[derive(Debug, Clone)]
pub struct GrantParams {
    pub subject_id: SubjectId,
    pub group_id: GroupId,
    pub offset_ms: i64,
    pub reminded: bool,
}

impl Arbitrary for GrantParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (subject_id(), group_id(), offset_ms(), any::<bool>())
            .prop_map(|(subject_id, group_id, offset_ms, reminded)| GrantParams {
                subject_id,
                group_id,
                offset_ms,
                reminded,
            })
            .boxed()
    }
}

/// Build the grant described by `params`.
pub fn grant_from_params(params: &GrantParams) -> Grant {
    Grant::restore(
        params.subject_id.clone(),
        params.group_id.clone(),
        NOW + params.offset_ms,
        params.reminded,
    )
}

/// A set of grants with distinct subjects.
pub fn grant_set(max: usize) -> impl Strategy<Value = Vec<Grant>> {
    prop::collection::vec(any::<GrantParams>(), 0..=max).prop_map(|params| {
        let mut seen = std::collections::HashSet::new();
        params
            .iter()
            .filter(|p| seen.insert(p.subject_id.clone()))
            .map(grant_from_params)
            .collect()
    })
}
