use crate::domain::model::{
    chainages_equal, Branch, BranchEnd, BranchId, CompartmentId, NetworkLocation, NodeId,
};
use crate::domain::ports::NetworkGraph;
use std::collections::HashSet;

/// 依目前的位置集合推導節點與隔室的錨點。
///
/// `locations_for_branch` 必須回傳依 chainage 遞增排列的位置；
/// 被排除的分支（例如即將刪除者）視為不存在。
pub struct AnchorResolver<'a, N, F>
where
    N: NetworkGraph,
    F: Fn(BranchId) -> Vec<NetworkLocation>,
{
    network: &'a N,
    locations_for_branch: F,
    excluded: HashSet<BranchId>,
}

impl<'a, N, F> AnchorResolver<'a, N, F>
where
    N: NetworkGraph,
    F: Fn(BranchId) -> Vec<NetworkLocation>,
{
    pub fn new(network: &'a N, locations_for_branch: F) -> Self {
        Self {
            network,
            locations_for_branch,
            excluded: HashSet::new(),
        }
    }

    pub fn excluding(mut self, branches: impl IntoIterator<Item = BranchId>) -> Self {
        self.excluded.extend(branches);
        self
    }

    fn is_excluded(&self, branch: BranchId) -> bool {
        self.excluded.contains(&branch)
    }

    /// 流入該隔室的下水道連接（終點隔室為該隔室）
    pub fn connections_into(&self, compartment: CompartmentId) -> Vec<&'a Branch> {
        let Some(manhole) = self.network.manhole_of(compartment) else {
            return Vec::new();
        };
        self.network
            .incoming_branches(manhole.id)
            .into_iter()
            .filter(|b| !self.is_excluded(b.id) && b.target_compartment() == Some(compartment))
            .collect()
    }

    /// 自該隔室流出的下水道連接（起點隔室為該隔室）
    pub fn connections_out_of(&self, compartment: CompartmentId) -> Vec<&'a Branch> {
        let Some(manhole) = self.network.manhole_of(compartment) else {
            return Vec::new();
        };
        self.network
            .outgoing_branches(manhole.id)
            .into_iter()
            .filter(|b| !self.is_excluded(b.id) && b.source_compartment() == Some(compartment))
            .collect()
    }

    pub fn locations_for_compartment(&self, compartment: CompartmentId) -> Vec<NetworkLocation> {
        let incoming = self.connections_into(compartment).into_iter().filter_map(|c| {
            (self.locations_for_branch)(c.id)
                .into_iter()
                .find(|l| l.is_at_end(c))
        });
        let outgoing = self.connections_out_of(compartment).into_iter().filter_map(|c| {
            (self.locations_for_branch)(c.id)
                .into_iter()
                .rev()
                .find(|l| l.is_at_begin())
        });
        incoming.chain(outgoing).collect()
    }

    /// 位於節點上的位置：流入分支的最後一點在終點、流出分支的第一點在起點
    pub fn locations_at_node(&self, node: NodeId) -> Vec<NetworkLocation> {
        let mut result: Vec<NetworkLocation> = Vec::new();

        for (branch, end) in self.network.branch_ends_at_node(node) {
            if self.is_excluded(branch.id) {
                continue;
            }
            let locations = (self.locations_for_branch)(branch.id);
            let candidate = match end {
                BranchEnd::Begin => locations.first(),
                BranchEnd::End => locations.last(),
            };
            if let Some(location) = candidate {
                if location.is_at(branch, end) && !result.iter().any(|r| r.same_point(location)) {
                    result.push(*location);
                }
            }
        }

        result
    }

    /// 隔室沒有任何錨點時，回傳應補上的位置：
    /// 優先第一條流入連接的終點，其次第一條流出連接的起點
    pub fn missing_location_for_compartment(&self, compartment: CompartmentId) -> Option<NetworkLocation> {
        if !self.locations_for_compartment(compartment).is_empty() {
            return None;
        }

        if let Some(incoming) = self.connections_into(compartment).first() {
            return Some(NetworkLocation::at_end(incoming, BranchEnd::End));
        }

        self.connections_out_of(compartment)
            .first()
            .map(|outgoing| NetworkLocation::at_end(outgoing, BranchEnd::Begin))
    }

    /// 每條下水道連接都必須在起點與終點露出計算點，除非該端的隔室（或節點）已有錨點。
    /// 長度為 0 的連接不產生終點。同一次呼叫中每個隔室或節點最多產生一個錨點。
    pub fn missing_anchors(&self, connections: &[&Branch]) -> Vec<NetworkLocation> {
        let mut anchored_compartments: HashSet<CompartmentId> = HashSet::new();
        let mut anchored_nodes: HashSet<NodeId> = HashSet::new();
        let mut anchors = Vec::new();

        for connection in connections.iter().filter(|c| c.is_sewer_connection()) {
            for end in [BranchEnd::Begin, BranchEnd::End] {
                if end == BranchEnd::End && chainages_equal(connection.length, 0.0) {
                    continue;
                }

                let anchored = match connection.compartment(end) {
                    Some(compartment) => {
                        anchored_compartments.contains(&compartment)
                            || !self.locations_for_compartment(compartment).is_empty()
                    }
                    None => {
                        let node = connection.node(end);
                        anchored_nodes.contains(&node) || !self.locations_at_node(node).is_empty()
                    }
                };
                if anchored {
                    continue;
                }

                match connection.compartment(end) {
                    Some(compartment) => anchored_compartments.insert(compartment),
                    None => anchored_nodes.insert(connection.node(end)),
                };
                anchors.push(NetworkLocation::at_end(connection, end));
            }
        }

        anchors
    }
}
