//! Code tree reconstruction
//!
//! Categories point at their parent through `supercatid` and codes point at
//! their category through `catid`. [`CodeTree::build`] turns those flat rows
//! into a forest stored in an arena: nodes are addressed by index and carry
//! their parent index, so nothing in the tree owns anything cyclically.
//!
//! Categories are ordered by leaf-stripping: every round removes the
//! categories that no remaining category names as parent. The resulting
//! leaves-first order is kept on the tree for bottom-up aggregation. If a
//! round finds no leaf while categories remain, the parent references form a
//! cycle and the build fails.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::model::{Category, Code};
use crate::{Error, Result};

/// Identity of a tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EntityRef {
    Category(i64),
    Code(i64),
}

impl EntityRef {
    pub fn id(&self) -> i64 {
        match self {
            EntityRef::Category(id) | EntityRef::Code(id) => *id,
        }
    }

    pub fn is_category(&self) -> bool {
        matches!(self, EntityRef::Category(_))
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Category(id) => write!(f, "catid:{}", id),
            EntityRef::Code(id) => write!(f, "cid:{}", id),
        }
    }
}

/// One category or code placed in the tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    pub entity: EntityRef,
    pub name: String,
    /// Code display color (always `None` for categories)
    pub color: Option<String>,
    /// Arena index of the parent node
    pub parent: Option<usize>,
    /// Arena indices of sub-categories, then codes
    pub children: Vec<usize>,
    /// Distance from the root (roots have depth 0)
    pub depth: usize,
}

/// Forest of categories and codes
#[derive(Debug, Clone, PartialEq)]
pub struct CodeTree {
    nodes: Vec<TreeNode>,
    roots: Vec<usize>,
    index: HashMap<EntityRef, usize>,
    bottom_up: Vec<usize>,
}

impl CodeTree {
    /// Build the forest from flat category and code rows
    ///
    /// Roots are the top-level categories followed by unfiled codes, each in
    /// input order. A category whose parent is absent from `categories`, or a
    /// code whose category is absent, is promoted to a root.
    ///
    /// # Errors
    /// - [`Error::MalformedHierarchy`] if category parent references form a cycle
    /// - [`Error::InvalidInput`] on duplicate category or code identifiers
    pub fn build(categories: &[Category], codes: &[Code]) -> Result<Self> {
        let mut nodes = Vec::with_capacity(categories.len() + codes.len());
        let mut index = HashMap::with_capacity(categories.len() + codes.len());

        for category in categories {
            let entity = EntityRef::Category(category.id);
            if index.insert(entity, nodes.len()).is_some() {
                return Err(Error::InvalidInput(format!(
                    "duplicate category id {}",
                    category.id
                )));
            }
            nodes.push(TreeNode {
                entity,
                name: category.name.clone(),
                color: None,
                parent: None,
                children: Vec::new(),
                depth: 0,
            });
        }

        let parents: Vec<Option<usize>> = categories
            .iter()
            .map(|category| {
                let parent_id = category.parent_id?;
                let parent = index.get(&EntityRef::Category(parent_id)).copied();
                if parent.is_none() {
                    warn!(
                        category_id = category.id,
                        parent_id, "Category parent not found, treating as top level"
                    );
                }
                parent
            })
            .collect();

        let bottom_up = strip_leaves(categories, &parents)?;

        for (idx, parent) in parents.iter().enumerate() {
            nodes[idx].parent = *parent;
            if let Some(parent) = parent {
                nodes[*parent].children.push(idx);
            }
        }

        let mut roots: Vec<usize> = parents
            .iter()
            .enumerate()
            .filter(|(_, parent)| parent.is_none())
            .map(|(idx, _)| idx)
            .collect();

        for code in codes {
            let entity = EntityRef::Code(code.id);
            let idx = nodes.len();
            if index.insert(entity, idx).is_some() {
                return Err(Error::InvalidInput(format!("duplicate code id {}", code.id)));
            }

            let parent = code.category_id.and_then(|category_id| {
                let found = index.get(&EntityRef::Category(category_id)).copied();
                if found.is_none() {
                    warn!(
                        code_id = code.id,
                        category_id, "Code category not found, treating as top level"
                    );
                }
                found
            });

            nodes.push(TreeNode {
                entity,
                name: code.name.clone(),
                color: code.color.clone(),
                parent,
                children: Vec::new(),
                depth: 0,
            });

            match parent {
                Some(parent) => nodes[parent].children.push(idx),
                None => roots.push(idx),
            }
        }

        let mut stack: Vec<(usize, usize)> = roots.iter().map(|&root| (root, 0)).collect();
        while let Some((idx, depth)) = stack.pop() {
            nodes[idx].depth = depth;
            for &child in &nodes[idx].children {
                stack.push((child, depth + 1));
            }
        }

        debug!(
            categories = categories.len(),
            codes = codes.len(),
            roots = roots.len(),
            "Built code tree"
        );

        Ok(Self {
            nodes,
            roots,
            index,
            bottom_up,
        })
    }

    /// Arena indices of the top-level nodes
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub fn node(&self, idx: usize) -> Option<&TreeNode> {
        self.nodes.get(idx)
    }

    /// Arena index of a category or code
    pub fn position(&self, entity: EntityRef) -> Option<usize> {
        self.index.get(&entity).copied()
    }

    pub fn find(&self, entity: EntityRef) -> Option<&TreeNode> {
        self.position(entity).map(|idx| &self.nodes[idx])
    }

    pub fn children(&self, idx: usize) -> impl Iterator<Item = &TreeNode> {
        self.nodes
            .get(idx)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
            .iter()
            .map(move |&child| &self.nodes[child])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Category indices in leaf-stripping order: every category appears
    /// after all of its sub-categories
    pub fn bottom_up(&self) -> &[usize] {
        &self.bottom_up
    }

    /// Depth-first pre-order traversal (display order)
    pub fn walk(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();
        while let Some(idx) = stack.pop() {
            order.push(idx);
            stack.extend(self.nodes[idx].children.iter().rev());
        }
        order
    }

    /// Code ids in display order
    pub fn codes_in_order(&self) -> Vec<i64> {
        self.walk()
            .into_iter()
            .filter_map(|idx| match self.nodes[idx].entity {
                EntityRef::Code(id) => Some(id),
                EntityRef::Category(_) => None,
            })
            .collect()
    }

    /// All codes nested (transitively) under a category, in display order
    pub fn descendant_codes(&self, category_id: i64) -> Result<Vec<i64>> {
        let start = self
            .position(EntityRef::Category(category_id))
            .ok_or_else(|| Error::NotFound(format!("category {}", category_id)))?;

        let mut codes = Vec::new();
        let mut stack = vec![start];
        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx];
            if let EntityRef::Code(id) = node.entity {
                codes.push(id);
            }
            stack.extend(node.children.iter().rev());
        }
        Ok(codes)
    }
}

/// Order categories leaves-first, failing if the parent relation has a cycle
fn strip_leaves(categories: &[Category], parents: &[Option<usize>]) -> Result<Vec<usize>> {
    // Number of not-yet-stripped sub-categories per category
    let mut pending = vec![0usize; categories.len()];
    for parent in parents.iter().flatten() {
        pending[*parent] += 1;
    }

    let mut leaves: Vec<usize> = (0..categories.len()).filter(|&i| pending[i] == 0).collect();
    let mut order = Vec::with_capacity(categories.len());

    while !leaves.is_empty() {
        let mut next = Vec::new();
        for leaf in leaves {
            order.push(leaf);
            if let Some(parent) = parents[leaf] {
                pending[parent] -= 1;
                if pending[parent] == 0 {
                    next.push(parent);
                }
            }
        }
        leaves = next;
    }

    if order.len() < categories.len() {
        let mut stripped = vec![false; categories.len()];
        for &idx in &order {
            stripped[idx] = true;
        }
        let mut category_ids: Vec<i64> = categories
            .iter()
            .zip(stripped)
            .filter(|(_, stripped)| !stripped)
            .map(|(category, _)| category.id)
            .collect();
        category_ids.sort_unstable();
        return Err(Error::MalformedHierarchy { category_ids });
    }

    Ok(order)
}
