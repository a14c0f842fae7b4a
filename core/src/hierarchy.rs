//! Node hierarchy checks: loops, parent overrides, scene roots and skin ancestry

use gltf_audit_shared::{Issue, IssueCode};
use hashbrown::HashSet;

use crate::document::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    OnStack,
    Done,
}

/// Nodes found on a `children` cycle, ascending.
pub fn find_loops(doc: &Document) -> Vec<usize> {
    let count = doc.nodes.len();
    let mut state = vec![Visit::New; count];
    let mut in_loop = vec![false; count];

    for root in 0..count {
        if state[root] != Visit::New {
            continue;
        }
        // (node, index of the next child to visit)
        let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
        state[root] = Visit::OnStack;

        while let Some(top) = stack.last_mut() {
            let (node, next) = *top;
            let Some(&child) = doc.nodes[node].children.get(next) else {
                state[node] = Visit::Done;
                stack.pop();
                continue;
            };
            top.1 += 1;
            if child >= count {
                continue;
            }
            match state[child] {
                Visit::New => {
                    state[child] = Visit::OnStack;
                    stack.push((child, 0));
                }
                Visit::OnStack => {
                    if let Some(start) = stack.iter().position(|&(n, _)| n == child) {
                        for &(n, _) in &stack[start..] {
                            in_loop[n] = true;
                        }
                    }
                }
                Visit::Done => {}
            }
        }
    }

    (0..count).filter(|&n| in_loop[n]).collect()
}

/// First parent claiming each node, from `children` lists in index order.
fn first_parents(doc: &Document) -> Vec<Option<usize>> {
    let mut parents = vec![None; doc.nodes.len()];
    for (n, node) in doc.nodes.iter().enumerate() {
        for &child in &node.children {
            if let Some(slot) = parents.get_mut(child) {
                slot.get_or_insert(n);
            }
        }
    }
    parents
}

pub fn check_node_loops(doc: &Document, sink: &mut Vec<Issue>) {
    for node in find_loops(doc) {
        sink.push(Issue::new(
            IssueCode::NodeLoop,
            format!("/nodes/{node}"),
            "Node is a part of a node loop.",
        ));
    }
}

pub fn check_parent_overrides(doc: &Document, sink: &mut Vec<Issue>) {
    let mut parents: Vec<Option<usize>> = vec![None; doc.nodes.len()];
    for (n, node) in doc.nodes.iter().enumerate() {
        for (j, &child) in node.children.iter().enumerate() {
            let Some(slot) = parents.get_mut(child) else {
                continue;
            };
            match *slot {
                Some(parent) => sink.push(Issue::new(
                    IssueCode::NodeParentOverride,
                    format!("/nodes/{n}/children/{j}"),
                    format!("Value overrides parent of node {child} (already a child of node {parent})."),
                )),
                None => *slot = Some(n),
            }
        }
    }
}

pub fn check_scene_roots(doc: &Document, sink: &mut Vec<Issue>) {
    let parents = first_parents(doc);
    for (s, scene) in doc.scenes.iter().enumerate() {
        for (j, &node) in scene.nodes.iter().enumerate() {
            if let Some(Some(parent)) = parents.get(node) {
                sink.push(Issue::new(
                    IssueCode::SceneNonRootNode,
                    format!("/scenes/{s}/nodes/{j}"),
                    format!("Node {node} is not a root node (it is a child of node {parent})."),
                ));
            }
        }
    }
}

/// `node` plus every node it can be reached from through `children`.
fn ancestors(parents: &[Vec<usize>], node: usize) -> HashSet<usize> {
    let mut seen = HashSet::new();
    let mut queue = vec![node];
    while let Some(n) = queue.pop() {
        if seen.insert(n) {
            queue.extend(parents[n].iter().copied());
        }
    }
    seen
}

/// Every node reachable from `node` through `children`, excluding `node`
/// unless it lies on a loop.
fn descendants(doc: &Document, node: usize) -> HashSet<usize> {
    let count = doc.nodes.len();
    let mut seen = HashSet::new();
    let mut queue: Vec<usize> = doc.nodes[node].children.clone();
    while let Some(n) = queue.pop() {
        if n < count && seen.insert(n) {
            queue.extend(doc.nodes[n].children.iter().copied());
        }
    }
    seen
}

pub fn check_skins(doc: &Document, sink: &mut Vec<Issue>) {
    let count = doc.nodes.len();
    let mut parents = vec![Vec::new(); count];
    for (n, node) in doc.nodes.iter().enumerate() {
        for &child in &node.children {
            if child < count {
                parents[child].push(n);
            }
        }
    }

    for (s, skin) in doc.skins.iter().enumerate() {
        let joints: Vec<usize> = skin.joints.iter().copied().filter(|&j| j < count).collect();
        if joints.is_empty() {
            continue;
        }

        let mut common = ancestors(&parents, joints[0]);
        for &joint in &joints[1..] {
            let up = ancestors(&parents, joint);
            common.retain(|n| up.contains(n));
            if common.is_empty() {
                break;
            }
        }
        if common.is_empty() {
            sink.push(Issue::new(
                IssueCode::SkinNoCommonRoot,
                format!("/skins/{s}/joints"),
                "Joints do not have a common root.",
            ));
        }

        let Some(skeleton) = skin.skeleton.filter(|&n| n < count) else {
            continue;
        };
        if joints.contains(&skeleton) {
            continue;
        }
        let below = descendants(doc, skeleton);
        if !joints.iter().all(|j| below.contains(j)) {
            sink.push(Issue::new(
                IssueCode::SkinSkeletonInvalid,
                format!("/skins/{s}/skeleton"),
                format!("Skeleton node {skeleton} is not a common root of the skin's joints."),
            ));
        }
    }
}

/// Run every hierarchy check.
pub fn check_hierarchy(doc: &Document, sink: &mut Vec<Issue>) {
    tracing::debug!(nodes = doc.nodes.len(), skins = doc.skins.len(), "checking node hierarchy");
    check_parent_overrides(doc, sink);
    check_node_loops(doc, sink);
    check_scene_roots(doc, sink);
    check_skins(doc, sink);
}
