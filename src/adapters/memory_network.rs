use crate::domain::model::{
    Branch, BranchEnd, BranchId, BranchKind, Compartment, CompartmentId, Node, NodeId, NodeKind,
};
use crate::domain::ports::NetworkGraph;
use crate::utils::error::{DiscretizationError, Result};
use crate::utils::validation::validate_branch_length;
use std::collections::HashMap;

/// 記憶體內的網路圖，提供最基本的編輯操作
#[derive(Debug, Clone, Default)]
pub struct InMemoryNetwork {
    branches: Vec<Branch>,
    nodes: Vec<Node>,
    branch_index: HashMap<BranchId, usize>,
    node_index: HashMap<NodeId, usize>,
    // 節點的流入／流出分支位置，依加入順序
    incoming: HashMap<NodeId, Vec<usize>>,
    outgoing: HashMap<NodeId, Vec<usize>>,
    compartment_owner: HashMap<CompartmentId, NodeId>,
    next_branch: usize,
    next_node: usize,
    next_compartment: usize,
}

impl InMemoryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, name: &str) -> NodeId {
        self.push_node(name, NodeKind::Plain)
    }

    pub fn add_manhole(&mut self, name: &str, compartment_names: &[&str]) -> (NodeId, Vec<CompartmentId>) {
        let compartments: Vec<Compartment> = compartment_names
            .iter()
            .map(|c| Compartment {
                id: self.allocate_compartment(),
                name: c.to_string(),
            })
            .collect();
        let ids: Vec<CompartmentId> = compartments.iter().map(|c| c.id).collect();
        let node = self.push_node(name, NodeKind::Manhole { compartments });
        for id in &ids {
            self.compartment_owner.insert(*id, node);
        }
        (node, ids)
    }

    /// 在既有人孔中新增隔室；一般節點不能有隔室
    pub fn add_compartment(&mut self, manhole: NodeId, name: &str) -> Result<CompartmentId> {
        let index = *self
            .node_index
            .get(&manhole)
            .ok_or(DiscretizationError::UnknownNode { node: manhole })?;

        if !self.nodes[index].is_manhole() {
            return Err(DiscretizationError::invalid_topology(format!(
                "node '{}' is not a manhole and cannot hold compartments",
                self.nodes[index].name
            )));
        }

        let id = self.allocate_compartment();
        if let NodeKind::Manhole { compartments } = &mut self.nodes[index].kind {
            compartments.push(Compartment {
                id,
                name: name.to_string(),
            });
        }
        self.compartment_owner.insert(id, manhole);
        Ok(id)
    }

    pub fn add_channel(&mut self, name: &str, source: NodeId, target: NodeId, length: f64) -> Result<BranchId> {
        self.push_branch(name, source, target, length, BranchKind::Channel)
    }

    pub fn add_sewer_connection(
        &mut self,
        name: &str,
        source: NodeId,
        target: NodeId,
        length: f64,
        source_compartment: Option<CompartmentId>,
        target_compartment: Option<CompartmentId>,
    ) -> Result<BranchId> {
        self.check_compartment(source, source_compartment)?;
        self.check_compartment(target, target_compartment)?;
        self.push_branch(
            name,
            source,
            target,
            length,
            BranchKind::SewerConnection {
                source_compartment,
                target_compartment,
            },
        )
    }

    pub fn remove_branch(&mut self, id: BranchId) -> Result<Branch> {
        let index = *self
            .branch_index
            .get(&id)
            .ok_or(DiscretizationError::UnknownBranch { branch: id })?;
        let removed = self.branches.remove(index);
        self.rebuild_branch_index();
        tracing::debug!("Removed branch '{}' ({})", removed.name, removed.id);
        Ok(removed)
    }

    /// 更換下水道連接某端的隔室，回傳原本的隔室
    pub fn switch_compartment(
        &mut self,
        connection: BranchId,
        end: BranchEnd,
        compartment: Option<CompartmentId>,
    ) -> Result<Option<CompartmentId>> {
        let index = *self
            .branch_index
            .get(&connection)
            .ok_or(DiscretizationError::UnknownBranch { branch: connection })?;
        let node = self.branches[index].node(end);
        self.check_compartment(node, compartment)?;

        match &mut self.branches[index].kind {
            BranchKind::Channel => Err(DiscretizationError::invalid_topology(format!(
                "{} is a channel and has no compartments",
                connection
            ))),
            BranchKind::SewerConnection {
                source_compartment,
                target_compartment,
            } => {
                let slot = match end {
                    BranchEnd::Begin => source_compartment,
                    BranchEnd::End => target_compartment,
                };
                Ok(std::mem::replace(slot, compartment))
            }
        }
    }

    fn check_compartment(&self, node: NodeId, compartment: Option<CompartmentId>) -> Result<()> {
        let node = self.node(node).ok_or(DiscretizationError::UnknownNode { node })?;
        match compartment {
            Some(c) if !node.contains_compartment(c) => Err(DiscretizationError::invalid_topology(
                format!("{} does not belong to node '{}'", c, node.name),
            )),
            _ => Ok(()),
        }
    }

    fn push_node(&mut self, name: &str, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        self.node_index.insert(id, self.nodes.len());
        self.nodes.push(Node {
            id,
            name: name.to_string(),
            kind,
        });
        id
    }

    fn push_branch(
        &mut self,
        name: &str,
        source: NodeId,
        target: NodeId,
        length: f64,
        kind: BranchKind,
    ) -> Result<BranchId> {
        for node in [source, target] {
            if !self.node_index.contains_key(&node) {
                return Err(DiscretizationError::UnknownNode { node });
            }
        }
        validate_branch_length(name, length)?;

        let id = BranchId(self.next_branch);
        self.next_branch += 1;
        let position = self.branches.len();
        self.branch_index.insert(id, position);
        self.outgoing.entry(source).or_default().push(position);
        self.incoming.entry(target).or_default().push(position);
        self.branches.push(Branch {
            id,
            name: name.to_string(),
            length,
            source,
            target,
            kind,
        });
        Ok(id)
    }

    fn allocate_compartment(&mut self) -> CompartmentId {
        let id = CompartmentId(self.next_compartment);
        self.next_compartment += 1;
        id
    }

    fn rebuild_branch_index(&mut self) {
        self.branch_index.clear();
        self.incoming.clear();
        self.outgoing.clear();
        for (position, branch) in self.branches.iter().enumerate() {
            self.branch_index.insert(branch.id, position);
            self.outgoing.entry(branch.source).or_default().push(position);
            self.incoming.entry(branch.target).or_default().push(position);
        }
    }

    fn branches_at(&self, index: &HashMap<NodeId, Vec<usize>>, node: NodeId) -> Vec<&Branch> {
        index
            .get(&node)
            .map(|positions| positions.iter().map(|&i| &self.branches[i]).collect())
            .unwrap_or_default()
    }
}

impl NetworkGraph for InMemoryNetwork {
    fn branches(&self) -> &[Branch] {
        &self.branches
    }

    fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    fn branch(&self, id: BranchId) -> Option<&Branch> {
        self.branch_index.get(&id).map(|&i| &self.branches[i])
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.node_index.get(&id).map(|&i| &self.nodes[i])
    }

    fn incoming_branches(&self, node: NodeId) -> Vec<&Branch> {
        self.branches_at(&self.incoming, node)
    }

    fn outgoing_branches(&self, node: NodeId) -> Vec<&Branch> {
        self.branches_at(&self.outgoing, node)
    }

    fn manhole_of(&self, compartment: CompartmentId) -> Option<&Node> {
        self.compartment_owner
            .get(&compartment)
            .and_then(|&node| self.node(node))
    }
}
