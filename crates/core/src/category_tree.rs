//! In-memory category hierarchy.
//!
//! The tree is rebuilt per request from `(id, parent_id)` edges loaded in
//! display order. Traversals are iterative and track visited ids, so a cycle
//! in stored data (which writes never produce) cannot loop forever.

use std::collections::{HashMap, HashSet};

use crate::types::DbId;

/// Id-indexed adjacency of the category hierarchy.
#[derive(Debug, Default, Clone)]
pub struct CategoryTree {
    parents: HashMap<DbId, Option<DbId>>,
    children: HashMap<DbId, Vec<DbId>>,
}

impl CategoryTree {
    /// Build from `(id, parent_id)` pairs. Child order follows input order,
    /// so callers pass rows sorted by `(display_order, name)`.
    pub fn new<I>(nodes: I) -> Self
    where
        I: IntoIterator<Item = (DbId, Option<DbId>)>,
    {
        let mut tree = CategoryTree::default();
        for (id, parent_id) in nodes {
            tree.parents.insert(id, parent_id);
            if let Some(parent_id) = parent_id {
                tree.children.entry(parent_id).or_default().push(id);
            }
        }
        tree
    }

    pub fn contains(&self, id: DbId) -> bool {
        self.parents.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Direct children of `id`, in display order.
    pub fn children(&self, id: DbId) -> &[DbId] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All descendants of `id` in depth-first pre-order, excluding `id`.
    ///
    /// Empty for a leaf or an unknown id.
    pub fn descendants(&self, id: DbId) -> Vec<DbId> {
        let mut out = Vec::new();
        let mut visited = HashSet::from([id]);
        let mut stack: Vec<DbId> = self.children(id).iter().rev().copied().collect();

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }

        out
    }

    /// Sum of `direct[id]` over `id` and all of its descendants. Ids missing
    /// from `direct` count as zero.
    pub fn subtree_total(&self, id: DbId, direct: &HashMap<DbId, i64>) -> i64 {
        let own = direct.get(&id).copied().unwrap_or(0);
        self.descendants(id)
            .iter()
            .map(|d| direct.get(d).copied().unwrap_or(0))
            .fold(own, |acc, n| acc + n)
    }

    /// [`subtree_total`](Self::subtree_total) for each of `ids`.
    pub fn subtree_totals(
        &self,
        ids: impl IntoIterator<Item = DbId>,
        direct: &HashMap<DbId, i64>,
    ) -> HashMap<DbId, i64> {
        ids.into_iter()
            .map(|id| (id, self.subtree_total(id, direct)))
            .collect()
    }

    /// Whether re-parenting `id` under `new_parent` would make `id` its own
    /// ancestor.
    pub fn would_create_cycle(&self, id: DbId, new_parent: DbId) -> bool {
        if id == new_parent {
            return true;
        }

        let mut visited = HashSet::new();
        let mut current = Some(new_parent);
        while let Some(node) = current {
            if node == id {
                return true;
            }
            if !visited.insert(node) {
                return false;
            }
            current = self.parents.get(&node).copied().flatten();
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 1
    /// ├── 2
    /// │   ├── 4
    /// │   └── 5
    /// └── 3
    /// 6
    fn sample() -> CategoryTree {
        CategoryTree::new([
            (1, None),
            (2, Some(1)),
            (3, Some(1)),
            (4, Some(2)),
            (5, Some(2)),
            (6, None),
        ])
    }

    #[test]
    fn descendants_are_pre_order() {
        assert_eq!(sample().descendants(1), vec![2, 4, 5, 3]);
        assert_eq!(sample().descendants(2), vec![4, 5]);
    }

    #[test]
    fn leaf_and_unknown_have_no_descendants() {
        let tree = sample();
        assert!(tree.descendants(4).is_empty());
        assert!(tree.descendants(6).is_empty());
        assert!(tree.descendants(99).is_empty());
    }

    #[test]
    fn cyclic_data_terminates() {
        let tree = CategoryTree::new([(1, Some(3)), (2, Some(1)), (3, Some(2))]);
        assert_eq!(tree.descendants(1), vec![2, 3]);
    }

    #[test]
    fn subtree_total_sums_descendants() {
        let tree = CategoryTree::new([(10, None), (11, Some(10))]);
        let direct = HashMap::from([(10, 2), (11, 3)]);
        assert_eq!(tree.subtree_total(10, &direct), 5);
        assert_eq!(tree.subtree_total(11, &direct), 3);
    }

    #[test]
    fn subtree_totals_treat_missing_as_zero() {
        let direct = HashMap::from([(4, 1), (3, 7)]);
        let totals = sample().subtree_totals([1, 2, 6], &direct);
        assert_eq!(totals[&1], 8);
        assert_eq!(totals[&2], 1);
        assert_eq!(totals[&6], 0);
    }

    #[test]
    fn reparent_under_descendant_is_a_cycle() {
        let tree = sample();
        assert!(tree.would_create_cycle(1, 4));
        assert!(tree.would_create_cycle(2, 2));
        assert!(!tree.would_create_cycle(3, 2));
        assert!(!tree.would_create_cycle(6, 1));
    }

    #[test]
    fn children_keep_input_order() {
        assert_eq!(sample().children(1), &[2, 3]);
        assert_eq!(sample().len(), 6);
    }
}
