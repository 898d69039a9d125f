use crate::core::lookup::LocationLookup;
use crate::domain::model::{BranchId, NetworkLocation};
use std::collections::HashMap;

/// 已提交位置的索引，每次提交後標記為 dirty，下次查詢時重建
#[derive(Debug)]
pub struct LocationCache {
    dirty: bool,
    by_branch: HashMap<BranchId, Vec<usize>>,
    lookup: LocationLookup,
}

impl Default for LocationCache {
    fn default() -> Self {
        Self {
            dirty: true,
            by_branch: HashMap::new(),
            lookup: LocationLookup::new(),
        }
    }
}

impl LocationCache {
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// 若已失效則依提交中的位置重建
    pub fn refresh(&mut self, locations: &[NetworkLocation]) {
        if !self.dirty {
            return;
        }

        self.by_branch.clear();
        for (index, location) in locations.iter().enumerate() {
            self.by_branch.entry(location.branch).or_default().push(index);
        }
        for indices in self.by_branch.values_mut() {
            indices.sort_by(|a, b| locations[*a].chainage.total_cmp(&locations[*b].chainage));
        }
        self.lookup = LocationLookup::from_locations(locations);
        self.dirty = false;

        tracing::trace!(
            "Rebuilt location cache: {} locations on {} branches",
            locations.len(),
            self.by_branch.len()
        );
    }

    /// 分支上的位置索引，依 chainage 遞增
    pub fn branch_indices(&self, branch: BranchId) -> &[usize] {
        debug_assert!(!self.dirty, "location cache queried while dirty");
        self.by_branch.get(&branch).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn index_of(&self, location: &NetworkLocation) -> Option<usize> {
        debug_assert!(!self.dirty, "location cache queried while dirty");
        self.lookup.find(location)
    }
}
