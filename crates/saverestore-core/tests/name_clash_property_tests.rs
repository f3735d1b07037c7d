use chrono::Utc;
use proptest::prelude::*;
use saverestore_core::model::{Node, NodeKind};
use saverestore_core::rules::does_name_clash;

fn kind_strategy() -> impl Strategy<Value = NodeKind> {
    prop_oneof![Just(NodeKind::Folder), Just(NodeKind::Configuration)]
}

fn sibling_strategy() -> impl Strategy<Value = Vec<Node>> {
    prop::collection::vec(("[a-c]{1,2}", kind_strategy()), 0..8).prop_map(|entries| {
        entries
            .into_iter()
            .enumerate()
            .map(|(i, (name, kind))| Node {
                id: i as i64 + 2,
                name,
                parent_id: Some(1),
                kind,
                last_modified: Utc::now(),
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn clash_iff_same_name_and_same_kind(
        name in "[a-c]{1,2}",
        kind in kind_strategy(),
        siblings in sibling_strategy(),
    ) {
        let expected = siblings.iter().any(|s| s.name == name && s.kind == kind);
        prop_assert_eq!(does_name_clash(&name, kind, &siblings), expected);
    }

    #[test]
    fn other_kind_never_affects_clash(
        name in "[a-c]{1,2}",
        kind in kind_strategy(),
        siblings in sibling_strategy(),
    ) {
        let same_kind_only: Vec<Node> =
            siblings.iter().filter(|s| s.kind == kind).cloned().collect();
        prop_assert_eq!(
            does_name_clash(&name, kind, &siblings),
            does_name_clash(&name, kind, &same_kind_only)
        );
    }

    #[test]
    fn empty_sibling_set_never_clashes(name in ".*", kind in kind_strategy()) {
        prop_assert!(!does_name_clash(&name, kind, &[]));
    }
}
