//! Category hierarchy helpers. Callers load the whole (small) category table once.

use std::collections::{HashMap, HashSet, VecDeque};

use uuid::Uuid;

use super::types::Category;

/// Whether making `new_parent` the parent of `category_id` would close a loop.
///
/// Walks up from `new_parent`; reaching `category_id` means the move is a cycle. The walk is
/// bounded by the table size, and a chain that never terminates is reported as a cycle too.
pub fn would_create_cycle(categories: &[Category], category_id: Uuid, new_parent: Uuid) -> bool {
    let parents: HashMap<Uuid, Option<Uuid>> =
        categories.iter().map(|c| (c.id, c.parent_id)).collect();
    let mut cursor = Some(new_parent);
    let mut steps = 0;
    while let Some(id) = cursor {
        if id == category_id || steps > parents.len() {
            return true;
        }
        steps += 1;
        cursor = parents.get(&id).copied().flatten();
    }
    false
}

/// `root` followed by every category beneath it.
pub fn with_descendants(categories: &[Category], root: Uuid) -> Vec<Uuid> {
    let mut children: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for c in categories {
        if let Some(parent) = c.parent_id {
            children.entry(parent).or_default().push(c.id);
        }
    }
    let mut seen = HashSet::from([root]);
    let mut out = vec![root];
    let mut queue = VecDeque::from([root]);
    while let Some(id) = queue.pop_front() {
        for &child in children.get(&id).map(Vec::as_slice).unwrap_or_default() {
            if seen.insert(child) {
                out.push(child);
                queue.push_back(child);
            }
        }
    }
    out
}

#[derive(Debug, Clone)]
pub struct CategoryNode {
    pub category: Category,
    pub children: Vec<CategoryNode>,
}

/// Nest categories under their parents, ordered by `sort_order` then name.
/// Categories whose parent is missing are treated as roots.
pub fn build_tree(categories: &[Category]) -> Vec<CategoryNode> {
    let ids: HashSet<Uuid> = categories.iter().map(|c| c.id).collect();
    let mut sorted: Vec<&Category> = categories.iter().collect();
    sorted.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.name.cmp(&b.name)));

    let mut by_parent: HashMap<Option<Uuid>, Vec<&Category>> = HashMap::new();
    for c in sorted {
        let parent = c.parent_id.filter(|p| ids.contains(p) && *p != c.id);
        by_parent.entry(parent).or_default().push(c);
    }

    fn attach(
        parent: Option<Uuid>,
        by_parent: &HashMap<Option<Uuid>, Vec<&Category>>,
        visited: &mut HashSet<Uuid>,
    ) -> Vec<CategoryNode> {
        let Some(list) = by_parent.get(&parent) else {
            return Vec::new();
        };
        let mut nodes = Vec::with_capacity(list.len());
        for c in list {
            if visited.insert(c.id) {
                let children = attach(Some(c.id), by_parent, visited);
                nodes.push(CategoryNode {
                    category: (*c).clone(),
                    children,
                });
            }
        }
        nodes
    }

    let mut visited = HashSet::new();
    attach(None, &by_parent, &mut visited)
}
