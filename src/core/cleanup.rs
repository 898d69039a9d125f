use crate::domain::model::{BranchEnd, BranchId, CompartmentId, NetworkLocation, Node, NodeKind};
use crate::domain::ports::NetworkGraph;
use std::collections::HashMap;

/// 節點上某分支端點的位置
#[derive(Debug, Clone, Copy)]
struct NodeHit {
    index: usize,
    branch: BranchId,
    end: BranchEnd,
}

/// 移除節點（或人孔）上多餘的位置。
///
/// 一般節點最多保留一個；人孔每個隔室最多保留一個，
/// 無法判斷隔室的位置一律保留。
pub fn cleanup_node_locations<N: NetworkGraph>(network: &N, locations: &mut Vec<NetworkLocation>) {
    let mut by_branch: HashMap<BranchId, Vec<usize>> = HashMap::new();
    for (index, location) in locations.iter().enumerate() {
        by_branch.entry(location.branch).or_default().push(index);
    }
    for indices in by_branch.values_mut() {
        indices.sort_by(|a, b| locations[*a].chainage.total_cmp(&locations[*b].chainage));
    }

    let mut removed = vec![false; locations.len()];
    let mut removed_count = 0;

    for node in network.nodes() {
        let hits = node_hits(network, node, locations, &by_branch);
        if hits.len() <= 1 {
            continue;
        }

        for hit in redundant_hits(network, node, &hits) {
            removed[hit.index] = true;
            removed_count += 1;
            if let Some(indices) = by_branch.get_mut(&hit.branch) {
                indices.retain(|&i| i != hit.index);
            }
        }
    }

    if removed_count > 0 {
        tracing::debug!("Removed {} redundant locations at nodes", removed_count);
        let mut flags = removed.into_iter();
        locations.retain(|_| !flags.next().unwrap_or(false));
    }
}

/// 收集位於節點端點上的位置：流入分支取最後一點，流出分支取第一點
fn node_hits<N: NetworkGraph>(
    network: &N,
    node: &Node,
    locations: &[NetworkLocation],
    by_branch: &HashMap<BranchId, Vec<usize>>,
) -> Vec<NodeHit> {
    let mut hits: Vec<NodeHit> = Vec::new();

    for (branch, end) in network.branch_ends_at_node(node.id) {
        let Some(indices) = by_branch.get(&branch.id) else {
            continue;
        };
        let candidate = match end {
            BranchEnd::Begin => indices.first(),
            BranchEnd::End => indices.last(),
        };
        let Some(&index) = candidate else {
            continue;
        };

        // 起訖同節點的分支可能被收集兩次
        if locations[index].is_at(branch, end) && !hits.iter().any(|h| h.index == index) {
            hits.push(NodeHit {
                index,
                branch: branch.id,
                end,
            });
        }
    }

    hits
}

fn redundant_hits<N: NetworkGraph>(network: &N, node: &Node, hits: &[NodeHit]) -> Vec<NodeHit> {
    match &node.kind {
        NodeKind::Plain => hits[1..].to_vec(),
        NodeKind::Manhole { compartments } if compartments.len() == 1 => hits[1..].to_vec(),
        NodeKind::Manhole { .. } => {
            let mut seen: Vec<CompartmentId> = Vec::new();
            let mut redundant = Vec::new();

            for hit in hits {
                match hit_compartment(network, node, hit) {
                    Some(compartment) if seen.contains(&compartment) => redundant.push(*hit),
                    Some(compartment) => seen.push(compartment),
                    None => tracing::debug!(
                        "Keeping location on {} at manhole '{}': compartment unresolved",
                        hit.branch,
                        node.name
                    ),
                }
            }
            redundant
        }
    }
}

/// 依位置被收集時所在的端點取得對應隔室；隔室不屬於此人孔時視為無法判斷
fn hit_compartment<N: NetworkGraph>(network: &N, node: &Node, hit: &NodeHit) -> Option<CompartmentId> {
    let branch = network.branch(hit.branch)?;
    let compartment = branch.compartment(hit.end)?;
    node.contains_compartment(compartment).then_some(compartment)
}
