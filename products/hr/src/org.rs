//! In-memory organization tree built from `(id, parent_id, name)` rows.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use uuid::Uuid;

use crate::error::{HrError, HrResult};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrgNode {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
}

#[derive(Clone, Debug, Default)]
pub struct OrgTree {
    nodes: HashMap<Uuid, OrgNode>,
    children: HashMap<Uuid, Vec<Uuid>>,
    roots: Vec<Uuid>,
}

impl OrgTree {
    /// Nodes whose parent is unknown are treated as roots. Siblings are kept
    /// in name order.
    pub fn new(nodes: impl IntoIterator<Item = OrgNode>) -> Self {
        let nodes: HashMap<Uuid, OrgNode> = nodes.into_iter().map(|n| (n.id, n)).collect();
        let mut children: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        let mut roots = Vec::new();
        for node in nodes.values() {
            match node.parent_id.filter(|p| nodes.contains_key(p)) {
                Some(parent) => children.entry(parent).or_default().push(node.id),
                None => roots.push(node.id),
            }
        }
        let by_name = |ids: &mut Vec<Uuid>| {
            ids.sort_by(|a, b| nodes[a].name.cmp(&nodes[b].name).then(a.cmp(b)));
        };
        for ids in children.values_mut() {
            by_name(ids);
        }
        by_name(&mut roots);
        Self {
            nodes,
            children,
            roots,
        }
    }

    pub fn get(&self, id: Uuid) -> Option<&OrgNode> {
        self.nodes.get(&id)
    }

    pub fn roots(&self) -> Vec<&OrgNode> {
        self.roots.iter().map(|id| &self.nodes[id]).collect()
    }

    pub fn children(&self, id: Uuid) -> Vec<&OrgNode> {
        self.children
            .get(&id)
            .map(|ids| ids.iter().map(|c| &self.nodes[c]).collect())
            .unwrap_or_default()
    }

    /// Parent chain from the root down to (excluding) `id`.
    pub fn ancestors(&self, id: Uuid) -> Vec<&OrgNode> {
        let mut chain = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut cursor = self.nodes.get(&id).and_then(|n| n.parent_id);
        while let Some(parent) = cursor {
            if !seen.insert(parent) {
                break;
            }
            let Some(node) = self.nodes.get(&parent) else {
                break;
            };
            chain.push(node);
            cursor = node.parent_id;
        }
        chain.reverse();
        chain
    }

    pub fn ancestor_names(&self, id: Uuid) -> Vec<String> {
        self.ancestors(id).into_iter().map(|n| n.name.clone()).collect()
    }

    /// `Root > Division > Team`, ending with the node itself.
    pub fn full_path(&self, id: Uuid) -> Option<String> {
        let node = self.nodes.get(&id)?;
        let mut names = self.ancestor_names(id);
        names.push(node.name.clone());
        Some(names.join(" > "))
    }

    /// Every node below `id`, breadth first.
    pub fn descendants(&self, id: Uuid) -> Vec<Uuid> {
        let mut out = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut queue: VecDeque<Uuid> = self.children.get(&id).cloned().unwrap_or_default().into();
        while let Some(next) = queue.pop_front() {
            if !seen.insert(next) {
                continue;
            }
            out.push(next);
            if let Some(kids) = self.children.get(&next) {
                queue.extend(kids.iter().copied());
            }
        }
        out
    }

    /// `id` together with all of its descendants.
    pub fn subtree(&self, id: Uuid) -> Vec<Uuid> {
        let mut ids = vec![id];
        ids.extend(self.descendants(id));
        ids
    }

    /// Distinct members of every unit's subtree, given `(unit, member)`
    /// pairs. Units missing from the tree are ignored.
    pub fn subtree_head_counts(
        &self,
        members: impl IntoIterator<Item = (Uuid, Uuid)>,
    ) -> HashMap<Uuid, usize> {
        let mut direct: HashMap<Uuid, BTreeSet<Uuid>> = HashMap::new();
        for (unit, member) in members {
            direct.entry(unit).or_default().insert(member);
        }
        self.nodes
            .keys()
            .map(|&id| {
                let everyone: BTreeSet<Uuid> = self
                    .subtree(id)
                    .iter()
                    .filter_map(|unit| direct.get(unit))
                    .flatten()
                    .copied()
                    .collect();
                (id, everyone.len())
            })
            .collect()
    }

    /// Refuse to hang `id` under itself or anything below it.
    pub fn ensure_can_move(&self, id: Uuid, new_parent: Option<Uuid>) -> HrResult<()> {
        let Some(parent) = new_parent else {
            return Ok(());
        };
        if parent == id || self.descendants(id).contains(&parent) {
            return Err(HrError::TreeCycle(id));
        }
        Ok(())
    }
}

/// Depth of a node placed under a parent at `parent_level`; roots are level 1.
pub fn level_for_parent(parent_level: Option<i32>) -> i32 {
    parent_level.map_or(1, |level| level + 1)
}
