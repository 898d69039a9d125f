use crate::domain::model::{Branch, BranchEnd, BranchId, CompartmentId, Node, NodeId};

/// 網路圖的唯讀存取介面；圖本身及其編輯不屬於本 crate
pub trait NetworkGraph {
    /// 依加入順序排列的所有分支
    fn branches(&self) -> &[Branch];

    fn nodes(&self) -> &[Node];

    fn branch(&self, id: BranchId) -> Option<&Branch> {
        self.branches().iter().find(|b| b.id == id)
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes().iter().find(|n| n.id == id)
    }

    fn incoming_branches(&self, node: NodeId) -> Vec<&Branch> {
        self.branches().iter().filter(|b| b.target == node).collect()
    }

    fn outgoing_branches(&self, node: NodeId) -> Vec<&Branch> {
        self.branches().iter().filter(|b| b.source == node).collect()
    }

    /// 與節點相接的分支，並標示節點位於分支的哪一端（先流入、後流出）
    fn branch_ends_at_node(&self, node: NodeId) -> Vec<(&Branch, BranchEnd)> {
        let incoming = self
            .incoming_branches(node)
            .into_iter()
            .map(|b| (b, BranchEnd::End));
        let outgoing = self
            .outgoing_branches(node)
            .into_iter()
            .map(|b| (b, BranchEnd::Begin));
        incoming.chain(outgoing).collect()
    }

    fn sewer_connections(&self) -> Vec<&Branch> {
        self.branches()
            .iter()
            .filter(|b| b.is_sewer_connection())
            .collect()
    }

    /// 擁有該隔室的人孔
    fn manhole_of(&self, compartment: CompartmentId) -> Option<&Node> {
        self.nodes()
            .iter()
            .find(|n| n.contains_compartment(compartment))
    }
}
