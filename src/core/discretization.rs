use crate::core::anchors::AnchorResolver;
use crate::core::cache::LocationCache;
use crate::core::cleanup::cleanup_node_locations;
use crate::core::fixed_points::fixed_mask;
use crate::core::generation::{channel_chainages, validate_subdivision, GenerationOptions};
use crate::core::lookup::LocationLookup;
use crate::core::merge::merge_locations;
use crate::core::segments::{segments_between_locations, Segment, SegmentGeneration};
use crate::domain::model::{
    Branch, BranchEnd, BranchId, BranchKind, CompartmentId, NetworkLocation, NodeId,
};
use crate::domain::ports::NetworkGraph;
use crate::utils::error::{DiscretizationError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::ops::{Deref, DerefMut};

/// 計算網格：有序的計算點與平行的固定點遮罩。
///
/// 兩個陣列永遠一起替換；每個編排操作都先在區域變數中完成全部計算，
/// 最後一次提交，外部不會看到更新中的狀態。
#[derive(Debug)]
pub struct Discretization<N: NetworkGraph> {
    network: Option<N>,
    locations: Vec<NetworkLocation>,
    fixed: Vec<bool>,
    segment_generation: SegmentGeneration,
    segments: Vec<Segment>,
    cache: RefCell<LocationCache>,
}

/// 單次更新的附加條件
#[derive(Debug, Default)]
struct Edit {
    /// 即將刪除的分支：既有與候選位置都捨棄
    excluded: HashSet<BranchId>,
    /// 提交前要移除的既有位置
    removals: Vec<NetworkLocation>,
    /// 固定點來源；`None` 表示使用更新前的狀態
    fixed_source: Option<(Vec<NetworkLocation>, Vec<bool>)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    pub branch: BranchId,
    pub chainage: f64,
    pub fixed: bool,
}

/// 可序列化的網格快照，點的順序與固定旗標一對一對應
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DiscretizationSnapshot {
    pub points: Vec<GridPoint>,
}

impl<N: NetworkGraph> Default for Discretization<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: NetworkGraph> Discretization<N> {
    pub fn new() -> Self {
        Self {
            network: None,
            locations: Vec::new(),
            fixed: Vec::new(),
            segment_generation: SegmentGeneration::default(),
            segments: Vec::new(),
            cache: RefCell::new(LocationCache::default()),
        }
    }

    pub fn with_network(network: N) -> Self {
        let mut discretization = Self::new();
        discretization.network = Some(network);
        discretization
    }

    /// 連結網路；原有的位置全部清除
    pub fn attach_network(&mut self, network: N) {
        self.network = Some(network);
        self.reset();
    }

    pub fn detach_network(&mut self) -> Option<N> {
        let network = self.network.take();
        self.reset();
        network
    }

    pub fn network(&self) -> Option<&N> {
        self.network.as_ref()
    }

    /// 編輯網路後由呼叫端負責呼叫對應的修補操作
    /// （例如刪除分支前先呼叫 [`Self::replace_points_for_removed_branch`]）
    pub fn network_mut(&mut self) -> Option<&mut N> {
        self.network.as_mut()
    }

    pub fn locations(&self) -> &[NetworkLocation] {
        &self.locations
    }

    pub fn fixed_mask(&self) -> &[bool] {
        &self.fixed
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segment_generation(&self) -> SegmentGeneration {
        self.segment_generation
    }

    pub fn set_segment_generation(&mut self, method: SegmentGeneration) {
        self.segment_generation = method;
        if method == SegmentGeneration::None {
            self.segments.clear();
        }
        self.recompute_segments();
    }

    /// 清空位置與遮罩
    pub fn reset(&mut self) {
        self.commit(Vec::new(), Vec::new());
    }

    /// 分支上的位置，依 chainage 遞增
    pub fn locations_on_branch(&self, branch: BranchId) -> Vec<NetworkLocation> {
        let mut cache = self.cache.borrow_mut();
        cache.refresh(&self.locations);
        cache
            .branch_indices(branch)
            .iter()
            .map(|&i| self.locations[i])
            .collect()
    }

    pub fn locations_at_node(&self, node: NodeId) -> Vec<NetworkLocation> {
        self.resolver()
            .map(|r| r.locations_at_node(node))
            .unwrap_or_default()
    }

    pub fn locations_for_compartment(&self, compartment: CompartmentId) -> Vec<NetworkLocation> {
        self.resolver()
            .map(|r| r.locations_for_compartment(compartment))
            .unwrap_or_default()
    }

    pub fn missing_location_for_compartment(&self, compartment: CompartmentId) -> Option<NetworkLocation> {
        self.resolver()?.missing_location_for_compartment(compartment)
    }

    /// 分支某端點上的位置；下水道連接有隔室時以隔室錨點為準
    pub fn location_for_branch_node(&self, branch: BranchId, end: BranchEnd) -> Option<NetworkLocation> {
        let network = self.network.as_ref()?;
        let branch = network.branch(branch)?;
        let resolver = self.resolver()?;

        match branch.compartment(end) {
            Some(compartment) => resolver.locations_for_compartment(compartment).into_iter().next(),
            None => resolver.locations_at_node(branch.node(end)).into_iter().next(),
        }
    }

    pub fn is_fixed_point(&self, location: &NetworkLocation) -> bool {
        self.index_of(location).is_some_and(|i| self.fixed[i])
    }

    pub fn fixed_locations(&self) -> Vec<NetworkLocation> {
        self.locations
            .iter()
            .zip(&self.fixed)
            .filter(|(_, fixed)| **fixed)
            .map(|(location, _)| *location)
            .collect()
    }

    /// 切換固定點，回傳切換後的狀態
    pub fn toggle_fixed_point(&mut self, location: &NetworkLocation) -> Result<bool> {
        let index = self
            .index_of(location)
            .ok_or(DiscretizationError::LocationNotFound {
                branch: location.branch,
                chainage: location.chainage,
            })?;
        self.fixed[index] = !self.fixed[index];
        Ok(self.fixed[index])
    }

    /// 以新位置更新網格：合併、排序去重、清理節點、保留固定點後一次提交。
    /// 尚未連結網路時不做任何事。
    pub fn update_network_locations(
        &mut self,
        new_locations: impl IntoIterator<Item = NetworkLocation>,
        merge: bool,
    ) -> Result<()> {
        self.apply(new_locations.into_iter().collect(), merge, Edit::default())
    }

    /// 補上下水道連接缺少的起點／終點錨點
    pub fn add_missing_locations_for_sewer_connections(&mut self, connections: &[BranchId]) -> Result<()> {
        let Some(network) = self.network.as_ref() else {
            return Ok(());
        };

        let branches = sewer_connections(network, connections)?;
        let anchors = AnchorResolver::new(network, |b| self.locations_on_branch(b)).missing_anchors(&branches);
        if anchors.is_empty() {
            return Ok(());
        }

        tracing::debug!("Adding {} missing sewer connection anchors", anchors.len());
        self.update_network_locations(anchors, true)
    }

    /// 在分支刪除前呼叫：把節點上的計算點移到相鄰分支，或補上隔室錨點。
    /// 被刪除分支上的位置在同一次提交中一併移除。
    pub fn replace_points_for_removed_branch(&mut self, branches: &[BranchId]) -> Result<()> {
        let Some(network) = self.network.as_ref() else {
            return Ok(());
        };

        let removed: HashSet<BranchId> = branches.iter().copied().collect();
        let resolver =
            AnchorResolver::new(network, |b| self.locations_on_branch(b)).excluding(removed.iter().copied());
        let mut handled: HashSet<CompartmentId> = HashSet::new();
        let mut additions = Vec::new();

        for &id in branches {
            let branch = network
                .branch(id)
                .ok_or(DiscretizationError::UnknownBranch { branch: id })?;

            match &branch.kind {
                BranchKind::Channel => {
                    let on_branch = self.locations_on_branch(branch.id);
                    if on_branch.first().is_some_and(|l| l.is_at_begin()) {
                        additions.extend(replacement_at_node(network, branch.source, &removed));
                    }
                    if on_branch.last().is_some_and(|l| l.is_at_end(branch)) {
                        additions.extend(replacement_at_node(network, branch.target, &removed));
                    }
                }
                BranchKind::SewerConnection {
                    source_compartment,
                    target_compartment,
                } => {
                    for compartment in [*source_compartment, *target_compartment].into_iter().flatten() {
                        if handled.insert(compartment) {
                            additions.extend(resolver.missing_location_for_compartment(compartment));
                        }
                    }
                }
            }
        }

        drop(resolver);
        tracing::debug!(
            "Replacing points for {} removed branches with {} new locations",
            removed.len(),
            additions.len()
        );
        self.apply(
            additions,
            true,
            Edit {
                excluded: removed,
                ..Edit::default()
            },
        )
    }

    /// 下水道連接的端點隔室改變後呼叫：確保原隔室仍有錨點，
    /// 新隔室有錨點且只保留第一個
    pub fn handle_compartment_switch(
        &mut self,
        from: Option<CompartmentId>,
        to: Option<CompartmentId>,
    ) -> Result<()> {
        let Some(network) = self.network.as_ref() else {
            return Ok(());
        };

        for compartment in [from, to].into_iter().flatten() {
            if network.manhole_of(compartment).is_none() {
                return Err(DiscretizationError::UnknownCompartment { compartment });
            }
        }

        let resolver = AnchorResolver::new(network, |b| self.locations_on_branch(b));
        let mut additions = Vec::new();
        let mut removals = Vec::new();

        if let Some(from) = from {
            additions.extend(resolver.missing_location_for_compartment(from));
        }
        if let Some(to) = to {
            match resolver.missing_location_for_compartment(to) {
                Some(location) => additions.push(location),
                None => removals.extend(resolver.locations_for_compartment(to).into_iter().skip(1)),
            }
        }
        drop(resolver);

        if additions.is_empty() && removals.is_empty() {
            return Ok(());
        }

        tracing::debug!(
            "Compartment switch: adding {} and removing {} locations",
            additions.len(),
            removals.len()
        );
        self.apply(
            additions,
            true,
            Edit {
                removals,
                ..Edit::default()
            },
        )
    }

    /// 每條下水道連接的起點與（長度大於 0 時）終點
    pub fn generate_sewer_connection_locations(&self) -> Vec<NetworkLocation> {
        let Some(network) = self.network.as_ref() else {
            tracing::warn!("No network attached, cannot generate sewer connection locations");
            return Vec::new();
        };

        network
            .sewer_connections()
            .into_iter()
            .flat_map(|c| {
                let end = (c.length > 0.0).then(|| NetworkLocation::at_end(c, BranchEnd::End));
                std::iter::once(NetworkLocation::at_end(c, BranchEnd::Begin)).chain(end)
            })
            .collect()
    }

    /// 移除所有渠道位置，只保留下水道連接錨點
    pub fn clear_rural_locations(&mut self) -> Result<()> {
        if self.network.is_none() {
            return Ok(());
        }

        let anchors = self.generate_sewer_connection_locations();
        let mut guard = self.suspend_recomputation();
        guard.update_network_locations(anchors, false)?;
        tracing::info!("Cleared rural locations, {} sewer anchors remain", guard.len());
        Ok(())
    }

    /// 重新產生渠道的計算點；`channels` 為 `None` 時處理所有渠道
    pub fn generate_channel_locations(
        &mut self,
        channels: Option<&[BranchId]>,
        options: &GenerationOptions,
    ) -> Result<()> {
        let Some(network) = self.network.as_ref() else {
            tracing::warn!("No network attached, cannot generate grid");
            return Ok(());
        };
        options.validate()?;

        let selected: Vec<&Branch> = match channels {
            Some(ids) => ids
                .iter()
                .map(|&id| network.branch(id).ok_or(DiscretizationError::UnknownBranch { branch: id }))
                .collect::<Result<_>>()?,
            None => network.branches().iter().collect(),
        };

        let mut regenerated: HashSet<BranchId> = HashSet::new();
        let mut generated = Vec::new();

        for channel in selected.into_iter().filter(|b| b.is_channel()) {
            let existing = self.locations_on_branch(channel.id);
            if existing.len() > 1 && !options.overwrite_existing {
                continue;
            }
            regenerated.insert(channel.id);
            if options.erase_existing {
                continue;
            }

            validate_subdivision(&channel.name, channel.length, options.fixed_length)?;
            let fixed: Vec<f64> = existing
                .iter()
                .filter(|l| self.is_fixed_point(l))
                .map(|l| l.chainage)
                .collect();
            generated.extend(
                channel_chainages(channel.length, &fixed, options.fixed_length)
                    .into_iter()
                    .map(|c| NetworkLocation::new(channel.id, c)),
            );
        }

        if regenerated.is_empty() {
            return Ok(());
        }

        tracing::info!(
            "Generating grid for {} channels ({} new locations)",
            regenerated.len(),
            generated.len()
        );

        let mut candidates: Vec<NetworkLocation> = self
            .locations
            .iter()
            .copied()
            .filter(|l| !regenerated.contains(&l.branch))
            .collect();
        candidates.extend(generated);

        let mut guard = self.suspend_recomputation();
        guard.update_network_locations(candidates, false)
    }

    /// 移除分支上的全部位置
    pub fn clear_locations(&mut self, branch: BranchId) -> Result<()> {
        let Some(network) = self.network.as_ref() else {
            return Ok(());
        };
        if network.branch(branch).is_none() {
            return Err(DiscretizationError::UnknownBranch { branch });
        }

        self.apply(
            Vec::new(),
            true,
            Edit {
                excluded: HashSet::from([branch]),
                ..Edit::default()
            },
        )
    }

    /// 移除所在分支已不存在於網路中的位置
    pub fn remove_orphaned_locations(&mut self) -> Result<()> {
        self.apply(Vec::new(), true, Edit::default())
    }

    /// 暫停衍生片段的重新計算，guard 釋放時恢復並重新計算一次
    pub fn suspend_recomputation(&mut self) -> RecomputationGuard<'_, N> {
        let previous = std::mem::replace(&mut self.segment_generation, SegmentGeneration::None);
        RecomputationGuard {
            discretization: self,
            previous,
        }
    }

    pub fn snapshot(&self) -> DiscretizationSnapshot {
        DiscretizationSnapshot {
            points: self
                .locations
                .iter()
                .zip(&self.fixed)
                .map(|(location, fixed)| GridPoint {
                    branch: location.branch,
                    chainage: location.chainage,
                    fixed: *fixed,
                })
                .collect(),
        }
    }

    /// 以快照取代目前的網格，固定旗標取自快照
    pub fn restore(&mut self, snapshot: &DiscretizationSnapshot) -> Result<()> {
        let locations: Vec<NetworkLocation> = snapshot
            .points
            .iter()
            .map(|p| NetworkLocation::new(p.branch, p.chainage))
            .collect();
        let fixed = snapshot.points.iter().map(|p| p.fixed).collect();

        self.apply(
            locations.clone(),
            false,
            Edit {
                fixed_source: Some((locations, fixed)),
                ..Edit::default()
            },
        )
    }

    fn resolver(&self) -> Option<AnchorResolver<'_, N, impl Fn(BranchId) -> Vec<NetworkLocation> + '_>> {
        let network = self.network.as_ref()?;
        Some(AnchorResolver::new(network, move |branch| {
            self.locations_on_branch(branch)
        }))
    }

    fn index_of(&self, location: &NetworkLocation) -> Option<usize> {
        let mut cache = self.cache.borrow_mut();
        cache.refresh(&self.locations);
        cache.index_of(location)
    }

    fn apply(&mut self, candidates: Vec<NetworkLocation>, merge: bool, edit: Edit) -> Result<()> {
        let Some(network) = self.network.as_ref() else {
            tracing::debug!("No network attached, skipping location update");
            return Ok(());
        };

        let candidates = validate_candidates(network, candidates, &edit.excluded)?;

        let removals = LocationLookup::from_locations(&edit.removals);
        let existing: Vec<NetworkLocation> = self
            .locations
            .iter()
            .copied()
            .filter(|l| {
                network.branch(l.branch).is_some()
                    && !edit.excluded.contains(&l.branch)
                    && !removals.contains(l)
            })
            .collect();

        let mut working = merge_locations(network, &existing, candidates, merge);
        // 清理只看每條分支的首尾點，必須先把容差內的重複點合併
        sort_and_dedup(network, &mut working);
        cleanup_node_locations(network, &mut working);

        let (old_locations, old_mask) = match &edit.fixed_source {
            Some((locations, mask)) => (locations.as_slice(), mask.as_slice()),
            None => (self.locations.as_slice(), self.fixed.as_slice()),
        };
        let mask = fixed_mask(old_locations, old_mask, &working).unwrap_or_else(|| vec![false; working.len()]);

        self.commit(working, mask);
        Ok(())
    }

    fn commit(&mut self, locations: Vec<NetworkLocation>, fixed: Vec<bool>) {
        debug_assert_eq!(locations.len(), fixed.len());
        self.locations = locations;
        self.fixed = fixed;
        self.cache.get_mut().invalidate();
        self.recompute_segments();

        tracing::debug!(
            "Committed {} locations ({} fixed)",
            self.locations.len(),
            self.fixed.iter().filter(|f| **f).count()
        );
    }

    fn recompute_segments(&mut self) {
        if self.segment_generation == SegmentGeneration::BetweenLocations {
            self.segments = segments_between_locations(&self.locations);
        }
    }
}

/// 暫停片段重新計算的範圍；離開範圍（包含錯誤與 panic）時恢復
pub struct RecomputationGuard<'a, N: NetworkGraph> {
    discretization: &'a mut Discretization<N>,
    previous: SegmentGeneration,
}

impl<N: NetworkGraph> Deref for RecomputationGuard<'_, N> {
    type Target = Discretization<N>;

    fn deref(&self) -> &Self::Target {
        self.discretization
    }
}

impl<N: NetworkGraph> DerefMut for RecomputationGuard<'_, N> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.discretization
    }
}

impl<N: NetworkGraph> Drop for RecomputationGuard<'_, N> {
    fn drop(&mut self) {
        self.discretization.segment_generation = self.previous;
        self.discretization.recompute_segments();
    }
}

/// 未知分支為硬性錯誤；超出分支範圍的 chainage 直接捨棄
fn validate_candidates<N: NetworkGraph>(
    network: &N,
    candidates: Vec<NetworkLocation>,
    excluded: &HashSet<BranchId>,
) -> Result<Vec<NetworkLocation>> {
    let mut valid = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let branch = network
            .branch(candidate.branch)
            .ok_or(DiscretizationError::UnknownBranch {
                branch: candidate.branch,
            })?;

        if excluded.contains(&branch.id) {
            continue;
        }
        if !branch.contains_chainage(candidate.chainage) {
            tracing::debug!(
                "Dropping {} outside branch '{}' (length {})",
                candidate,
                branch.name,
                branch.length
            );
            continue;
        }
        valid.push(candidate);
    }
    Ok(valid)
}

fn sewer_connections<'a, N: NetworkGraph>(network: &'a N, ids: &[BranchId]) -> Result<Vec<&'a Branch>> {
    ids.iter()
        .map(|&id| {
            let branch = network
                .branch(id)
                .ok_or(DiscretizationError::UnknownBranch { branch: id })?;
            if !branch.is_sewer_connection() {
                return Err(DiscretizationError::invalid_topology(format!(
                    "'{}' is not a sewer connection",
                    branch.name
                )));
            }
            Ok(branch)
        })
        .collect()
}

/// 依分支加入順序與 chainage 排序，並移除同分支上容差內的重複點
fn sort_and_dedup<N: NetworkGraph>(network: &N, locations: &mut Vec<NetworkLocation>) {
    let order: HashMap<BranchId, usize> = network
        .branches()
        .iter()
        .enumerate()
        .map(|(i, b)| (b.id, i))
        .collect();

    locations.sort_by(|a, b| {
        let a_order = order.get(&a.branch).copied().unwrap_or(usize::MAX);
        let b_order = order.get(&b.branch).copied().unwrap_or(usize::MAX);
        a_order
            .cmp(&b_order)
            .then_with(|| a.branch.cmp(&b.branch))
            .then_with(|| a.chainage.total_cmp(&b.chainage))
    });
    locations.dedup_by(|a, b| a.same_point(b));
}

/// 節點上的替代位置：優先其他流出分支的起點，其次其他流入分支的終點
fn replacement_at_node<N: NetworkGraph>(
    network: &N,
    node: NodeId,
    removed: &HashSet<BranchId>,
) -> Option<NetworkLocation> {
    if let Some(outgoing) = network
        .outgoing_branches(node)
        .into_iter()
        .find(|b| !removed.contains(&b.id))
    {
        return Some(NetworkLocation::at_end(outgoing, BranchEnd::Begin));
    }

    network
        .incoming_branches(node)
        .into_iter()
        .find(|b| !removed.contains(&b.id))
        .map(|incoming| NetworkLocation::at_end(incoming, BranchEnd::End))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryNetwork;

    fn loc(branch: BranchId, chainage: f64) -> NetworkLocation {
        NetworkLocation::new(branch, chainage)
    }

    fn single_channel(length: f64) -> (Discretization<InMemoryNetwork>, BranchId) {
        let mut network = InMemoryNetwork::new();
        let a = network.add_node("A");
        let b = network.add_node("B");
        let branch = network.add_channel("AB", a, b, length).unwrap();
        (Discretization::with_network(network), branch)
    }

    #[test]
    fn test_update_without_network_is_noop() {
        let mut discretization: Discretization<InMemoryNetwork> = Discretization::new();
        discretization
            .update_network_locations(vec![loc(BranchId(0), 1.0)], true)
            .unwrap();
        assert!(discretization.is_empty());
    }

    #[test]
    fn test_unknown_branch_leaves_state_untouched() {
        let (mut discretization, branch) = single_channel(100.0);
        discretization
            .update_network_locations(vec![loc(branch, 0.0), loc(branch, 100.0)], false)
            .unwrap();

        let err = discretization
            .update_network_locations(vec![loc(branch, 50.0), loc(BranchId(99), 1.0)], true)
            .unwrap_err();
        assert!(matches!(err, DiscretizationError::UnknownBranch { .. }));
        assert_eq!(discretization.locations(), &[loc(branch, 0.0), loc(branch, 100.0)]);
    }

    #[test]
    fn test_out_of_range_candidates_are_dropped() {
        let (mut discretization, branch) = single_channel(100.0);
        discretization
            .update_network_locations(vec![loc(branch, -1.0), loc(branch, 30.0), loc(branch, 120.0)], false)
            .unwrap();
        assert_eq!(discretization.locations(), &[loc(branch, 30.0)]);
    }

    #[test]
    fn test_duplicate_candidates_collapse() {
        let (mut discretization, branch) = single_channel(100.0);
        discretization
            .update_network_locations(vec![loc(branch, 30.0), loc(branch, 30.0 + 1e-11)], false)
            .unwrap();
        assert_eq!(discretization.len(), 1);
        assert_eq!(discretization.fixed_mask().len(), 1);
    }

    #[test]
    fn test_toggle_fixed_point() {
        let (mut discretization, branch) = single_channel(100.0);
        discretization
            .update_network_locations(vec![loc(branch, 0.0), loc(branch, 50.0)], false)
            .unwrap();

        assert!(discretization.toggle_fixed_point(&loc(branch, 50.0)).unwrap());
        assert!(discretization.is_fixed_point(&loc(branch, 50.0)));
        assert_eq!(discretization.fixed_locations(), vec![loc(branch, 50.0)]);

        assert!(!discretization.toggle_fixed_point(&loc(branch, 50.0)).unwrap());
        assert!(discretization.toggle_fixed_point(&loc(branch, 75.0)).is_err());
    }

    #[test]
    fn test_toggle_fixed_point_on_very_long_channel() {
        let (mut discretization, branch) = single_channel(1e9);
        discretization
            .update_network_locations(vec![loc(branch, 0.0), loc(branch, 1e9)], false)
            .unwrap();

        assert!(discretization.toggle_fixed_point(&loc(branch, 1e9)).unwrap());
        assert_eq!(discretization.fixed_mask(), &[false, true]);
    }

    #[test]
    fn test_cache_follows_commits() {
        let (mut discretization, branch) = single_channel(100.0);
        discretization
            .update_network_locations(vec![loc(branch, 10.0)], false)
            .unwrap();
        assert_eq!(discretization.locations_on_branch(branch), vec![loc(branch, 10.0)]);

        discretization
            .update_network_locations(vec![loc(branch, 60.0), loc(branch, 20.0)], true)
            .unwrap();
        assert_eq!(
            discretization.locations_on_branch(branch),
            vec![loc(branch, 10.0), loc(branch, 20.0), loc(branch, 60.0)]
        );
    }

    #[test]
    fn test_segments_follow_commits_and_guard() {
        let (mut discretization, branch) = single_channel(100.0);
        {
            let mut guard = discretization.suspend_recomputation();
            guard
                .update_network_locations(vec![loc(branch, 0.0), loc(branch, 100.0)], false)
                .unwrap();
            assert_eq!(guard.segment_generation(), SegmentGeneration::None);
            assert!(guard.segments().is_empty());
        }

        assert_eq!(discretization.segment_generation(), SegmentGeneration::BetweenLocations);
        assert_eq!(discretization.segments().len(), 1);
        assert_eq!(discretization.segments()[0].length(), 100.0);

        discretization.set_segment_generation(SegmentGeneration::None);
        assert!(discretization.segments().is_empty());
    }

    #[test]
    fn test_attach_network_clears_locations() {
        let (mut discretization, branch) = single_channel(100.0);
        discretization
            .update_network_locations(vec![loc(branch, 0.0)], false)
            .unwrap();

        discretization.attach_network(InMemoryNetwork::new());
        assert!(discretization.is_empty());
        assert!(discretization.detach_network().is_some());
        assert!(discretization.network().is_none());
    }

    #[test]
    fn test_clear_locations_and_orphans() {
        let mut network = InMemoryNetwork::new();
        let a = network.add_node("A");
        let b = network.add_node("B");
        let c = network.add_node("C");
        let ab = network.add_channel("AB", a, b, 100.0).unwrap();
        let bc = network.add_channel("BC", b, c, 50.0).unwrap();
        let mut discretization = Discretization::with_network(network);

        discretization
            .update_network_locations(vec![loc(ab, 20.0), loc(bc, 20.0), loc(bc, 40.0)], false)
            .unwrap();

        discretization.clear_locations(ab).unwrap();
        assert_eq!(discretization.locations(), &[loc(bc, 20.0), loc(bc, 40.0)]);
        assert!(discretization.clear_locations(BranchId(42)).is_err());

        discretization.network_mut().unwrap().remove_branch(bc).unwrap();
        discretization.remove_orphaned_locations().unwrap();
        assert!(discretization.is_empty());
    }

    #[test]
    fn test_add_missing_rejects_channels() {
        let (mut discretization, branch) = single_channel(100.0);
        let err = discretization
            .add_missing_locations_for_sewer_connections(&[branch])
            .unwrap_err();
        assert!(err.is_structural());
    }
}
