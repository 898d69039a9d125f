use serde::{Deserialize, Serialize};
use std::fmt;

/// 計算點 chainage 比較的容許誤差，整個子系統共用
pub const CHAINAGE_TOLERANCE: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BranchId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompartmentId(pub usize);

impl fmt::Display for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "branch#{}", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

impl fmt::Display for CompartmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "compartment#{}", self.0)
    }
}

/// 分支的起點或終點
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchEnd {
    Begin,
    End,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BranchKind {
    Channel,
    SewerConnection {
        source_compartment: Option<CompartmentId>,
        target_compartment: Option<CompartmentId>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub id: BranchId,
    pub name: String,
    pub length: f64,
    pub source: NodeId,
    pub target: NodeId,
    pub kind: BranchKind,
}

impl Branch {
    pub fn is_channel(&self) -> bool {
        matches!(self.kind, BranchKind::Channel)
    }

    pub fn is_sewer_connection(&self) -> bool {
        matches!(self.kind, BranchKind::SewerConnection { .. })
    }

    pub fn node(&self, end: BranchEnd) -> NodeId {
        match end {
            BranchEnd::Begin => self.source,
            BranchEnd::End => self.target,
        }
    }

    /// 下水道連接在指定端點所接的隔室；渠道永遠回傳 `None`
    pub fn compartment(&self, end: BranchEnd) -> Option<CompartmentId> {
        match (&self.kind, end) {
            (BranchKind::Channel, _) => None,
            (
                BranchKind::SewerConnection {
                    source_compartment, ..
                },
                BranchEnd::Begin,
            ) => *source_compartment,
            (
                BranchKind::SewerConnection {
                    target_compartment, ..
                },
                BranchEnd::End,
            ) => *target_compartment,
        }
    }

    pub fn source_compartment(&self) -> Option<CompartmentId> {
        self.compartment(BranchEnd::Begin)
    }

    pub fn target_compartment(&self) -> Option<CompartmentId> {
        self.compartment(BranchEnd::End)
    }

    /// 指定端點的 chainage（起點 0，終點為分支長度）
    pub fn chainage_at(&self, end: BranchEnd) -> f64 {
        match end {
            BranchEnd::Begin => 0.0,
            BranchEnd::End => self.length,
        }
    }

    pub fn contains_chainage(&self, chainage: f64) -> bool {
        chainage.is_finite() && (0.0..=self.length).contains(&chainage)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Compartment {
    pub id: CompartmentId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Plain,
    Manhole { compartments: Vec<Compartment> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
}

impl Node {
    pub fn is_manhole(&self) -> bool {
        matches!(self.kind, NodeKind::Manhole { .. })
    }

    pub fn compartments(&self) -> &[Compartment] {
        match &self.kind {
            NodeKind::Plain => &[],
            NodeKind::Manhole { compartments } => compartments,
        }
    }

    pub fn contains_compartment(&self, compartment: CompartmentId) -> bool {
        self.compartments().iter().any(|c| c.id == compartment)
    }
}

/// 計算點：以 (分支, chainage) 識別
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkLocation {
    pub branch: BranchId,
    pub chainage: f64,
}

impl NetworkLocation {
    pub fn new(branch: BranchId, chainage: f64) -> Self {
        Self { branch, chainage }
    }

    pub fn at_end(branch: &Branch, end: BranchEnd) -> Self {
        Self::new(branch.id, branch.chainage_at(end))
    }

    /// 同一分支且 chainage 相差小於容許誤差即視為同一點
    pub fn same_point(&self, other: &NetworkLocation) -> bool {
        self.branch == other.branch && chainages_equal(self.chainage, other.chainage)
    }

    pub fn is_at_begin(&self) -> bool {
        chainages_equal(self.chainage, 0.0)
    }

    pub fn is_at_end(&self, branch: &Branch) -> bool {
        chainages_equal(self.chainage, branch.length)
    }

    pub fn is_at(&self, branch: &Branch, end: BranchEnd) -> bool {
        match end {
            BranchEnd::Begin => self.is_at_begin(),
            BranchEnd::End => self.is_at_end(branch),
        }
    }
}

impl fmt::Display for NetworkLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.branch, self.chainage)
    }
}

pub fn chainages_equal(a: f64, b: f64) -> bool {
    (a - b).abs() < CHAINAGE_TOLERANCE
}
