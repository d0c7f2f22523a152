//! Page model and page-forest reconstruction.
//!
//! # Responsibility
//! - Define page read models for detail, list and search projections.
//! - Rebuild the parent/child forest from flat list rows.
//!
//! # Invariants
//! - A page whose parent is absent, or not among the listed pages, is a root.
//! - Sibling order follows input order (`created_at ASC, id ASC` from storage).

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Identifier of a page.
pub type PageId = i64;

/// Full page record, as shown when a page is opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    pub user_id: UserId,
    pub title: String,
    /// Free-text body.
    pub content: String,
    pub icon: Option<String>,
    pub cover: Option<String>,
    pub color: Option<String>,
    pub parent_id: Option<PageId>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Flat list row used to populate the page tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    pub id: PageId,
    pub title: String,
    pub parent_id: Option<PageId>,
}

/// Visual attributes of a page. `None` clears the attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageAppearance {
    pub icon: Option<String>,
    pub cover: Option<String>,
    pub color: Option<String>,
}

/// One node of the reconstructed page forest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageTreeNode {
    pub id: PageId,
    pub title: String,
    pub children: Vec<PageTreeNode>,
}

impl PageTreeNode {
    /// Counts this node and all of its descendants.
    pub fn subtree_size(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(PageTreeNode::subtree_size)
            .sum::<usize>()
    }
}

/// Builds the page forest from flat summaries.
///
/// Pages whose `parent_id` is `None` or refers to a page outside `pages`
/// become roots. Rows caught in a parent cycle (which the service layer
/// never writes) are promoted to roots instead of being dropped.
pub fn build_page_forest(pages: &[PageSummary]) -> Vec<PageTreeNode> {
    let known: HashSet<PageId> = pages.iter().map(|page| page.id).collect();
    let mut children_of: HashMap<PageId, Vec<&PageSummary>> = HashMap::new();
    let mut roots = Vec::new();

    for page in pages {
        match page.parent_id {
            Some(parent_id) if known.contains(&parent_id) && parent_id != page.id => {
                children_of.entry(parent_id).or_default().push(page);
            }
            _ => roots.push(page),
        }
    }

    let mut placed = HashSet::new();
    let mut forest: Vec<PageTreeNode> = roots
        .into_iter()
        .map(|page| attach_children(page, &children_of, &mut placed))
        .collect();

    for page in pages {
        if !placed.contains(&page.id) {
            forest.push(attach_children(page, &children_of, &mut placed));
        }
    }

    forest
}

fn attach_children(
    page: &PageSummary,
    children_of: &HashMap<PageId, Vec<&PageSummary>>,
    placed: &mut HashSet<PageId>,
) -> PageTreeNode {
    placed.insert(page.id);
    let children = children_of
        .get(&page.id)
        .map(|items| {
            items
                .iter()
                .filter(|child| !placed.contains(&child.id))
                .copied()
                .collect::<Vec<_>>()
        })
        .unwrap_or_default()
        .into_iter()
        .map(|child| attach_children(child, children_of, placed))
        .collect();

    PageTreeNode {
        id: page.id,
        title: page.title.clone(),
        children,
    }
}

#[cfg(test)]
mod tests {
    use super::{build_page_forest, PageSummary};

    fn summary(id: i64, parent_id: Option<i64>) -> PageSummary {
        PageSummary {
            id,
            title: format!("page {id}"),
            parent_id,
        }
    }

    #[test]
    fn orphaned_parent_reference_becomes_root() {
        let forest = build_page_forest(&[summary(1, None), summary(2, Some(99))]);
        assert_eq!(forest.len(), 2);
        assert_eq!(forest[1].id, 2);
    }

    #[test]
    fn nested_children_keep_input_order() {
        let forest = build_page_forest(&[
            summary(1, None),
            summary(2, Some(1)),
            summary(3, Some(1)),
            summary(4, Some(3)),
        ]);
        assert_eq!(forest.len(), 1);
        let root = &forest[0];
        assert_eq!(root.subtree_size(), 4);
        assert_eq!(root.children[0].id, 2);
        assert_eq!(root.children[1].id, 3);
        assert_eq!(root.children[1].children[0].id, 4);
    }

    #[test]
    fn cyclic_rows_are_not_lost() {
        let forest = build_page_forest(&[summary(1, Some(2)), summary(2, Some(1))]);
        let total: usize = forest.iter().map(|node| node.subtree_size()).sum();
        assert_eq!(total, 2);
    }
}
