use crate::domain::model::{chainages_equal, BranchId, NetworkLocation};
use crate::domain::ports::NetworkGraph;
use std::collections::HashMap;

/// 合併既有位置與候選位置。
///
/// `merge` 為 false 或既有集合為空時直接回傳候選集合；否則保留全部既有位置，
/// 並依分支過濾候選位置。結果尚未排序，排序由呼叫端在提交前統一處理。
pub fn merge_locations<N: NetworkGraph>(
    network: &N,
    existing: &[NetworkLocation],
    candidates: Vec<NetworkLocation>,
    merge: bool,
) -> Vec<NetworkLocation> {
    if !merge || existing.is_empty() {
        return candidates;
    }

    let mut existing_by_branch: HashMap<BranchId, Vec<f64>> = HashMap::new();
    for location in existing {
        existing_by_branch
            .entry(location.branch)
            .or_default()
            .push(location.chainage);
    }

    let mut result = existing.to_vec();
    for (branch_id, branch_candidates) in group_by_branch(candidates) {
        let Some(branch) = network.branch(branch_id) else {
            tracing::debug!("Skipping candidates on unknown {}", branch_id);
            continue;
        };

        match existing_by_branch.get_mut(&branch_id) {
            None => result.extend(branch_candidates),
            Some(chainages) => {
                chainages.sort_by(f64::total_cmp);
                let before = branch_candidates.len();
                let kept = filter_branch_candidates(chainages, branch_candidates, branch.length);
                if kept.len() < before {
                    tracing::trace!(
                        "Dropped {} duplicate or out-of-range candidates on '{}'",
                        before - kept.len(),
                        branch.name
                    );
                }
                result.extend(kept);
            }
        }
    }

    result
}

/// 依分支分組，保持分支首次出現的順序
fn group_by_branch(candidates: Vec<NetworkLocation>) -> Vec<(BranchId, Vec<NetworkLocation>)> {
    let mut groups: Vec<(BranchId, Vec<NetworkLocation>)> = Vec::new();
    let mut positions: HashMap<BranchId, usize> = HashMap::new();

    for candidate in candidates {
        match positions.get(&candidate.branch) {
            Some(&position) => groups[position].1.push(candidate),
            None => {
                positions.insert(candidate.branch, groups.len());
                groups.push((candidate.branch, vec![candidate]));
            }
        }
    }
    groups
}

/// 以單一游標走訪已排序的既有 chainage，過濾掉重複或超出分支長度的候選位置
pub fn filter_branch_candidates(
    existing_chainages: &[f64],
    mut candidates: Vec<NetworkLocation>,
    branch_length: f64,
) -> Vec<NetworkLocation> {
    if existing_chainages.is_empty() {
        return candidates;
    }

    candidates.sort_by(|a, b| a.chainage.total_cmp(&b.chainage));

    let last = existing_chainages.len() - 1;
    let mut cursor = 0;
    let mut kept = Vec::new();

    let mut i = 0;
    while i < candidates.len() {
        let candidate = candidates[i];
        let existing = existing_chainages[cursor];

        if chainages_equal(candidate.chainage, existing) || candidate.chainage > branch_length {
            i += 1;
            continue;
        }

        if candidate.chainage < existing {
            kept.push(candidate);
            i += 1;
            continue;
        }

        // 候選位置在目前既有點之後：前進游標並重新判斷同一候選
        if cursor < last {
            cursor += 1;
        } else {
            kept.push(candidate);
            i += 1;
        }
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryNetwork;

    fn loc(branch: BranchId, chainage: f64) -> NetworkLocation {
        NetworkLocation::new(branch, chainage)
    }

    fn chainages(locations: &[NetworkLocation]) -> Vec<f64> {
        locations.iter().map(|l| l.chainage).collect()
    }

    #[test]
    fn test_filter_fills_gaps_and_extends() {
        let b = BranchId(0);
        let kept = filter_branch_candidates(
            &[10.0, 50.0],
            vec![loc(b, 60.0), loc(b, 5.0), loc(b, 30.0), loc(b, 50.0)],
            100.0,
        );
        assert_eq!(chainages(&kept), vec![5.0, 30.0, 60.0]);
    }

    #[test]
    fn test_filter_drops_beyond_length() {
        let b = BranchId(0);
        let kept = filter_branch_candidates(&[0.0], vec![loc(b, 100.5), loc(b, 100.0)], 100.0);
        assert_eq!(chainages(&kept), vec![100.0]);
    }

    #[test]
    fn test_filter_near_duplicate_boundary() {
        let b = BranchId(0);
        let existing = [0.0, 50.0 + 5e-11];
        assert!(filter_branch_candidates(&existing, vec![loc(b, 50.0)], 100.0).is_empty());

        let existing = [0.0, 50.0 + 1e-8];
        assert_eq!(
            chainages(&filter_branch_candidates(&existing, vec![loc(b, 50.0)], 100.0)),
            vec![50.0]
        );
    }

    #[test]
    fn test_merge_keeps_existing_and_new_branches() {
        let mut network = InMemoryNetwork::new();
        let a = network.add_node("A");
        let b = network.add_node("B");
        let first = network.add_channel("first", a, b, 100.0).unwrap();
        let second = network.add_channel("second", b, a, 40.0).unwrap();

        let existing = vec![loc(first, 0.0), loc(first, 100.0)];
        let merged = merge_locations(
            &network,
            &existing,
            vec![loc(first, 50.0), loc(first, 100.0), loc(second, 20.0)],
            true,
        );

        assert_eq!(merged.len(), 4);
        assert!(merged.contains(&loc(first, 50.0)));
        assert!(merged.contains(&loc(second, 20.0)));
    }

    #[test]
    fn test_merge_disabled_returns_candidates() {
        let mut network = InMemoryNetwork::new();
        let a = network.add_node("A");
        let b = network.add_node("B");
        let branch = network.add_channel("ab", a, b, 100.0).unwrap();

        let merged = merge_locations(&network, &[loc(branch, 0.0)], vec![loc(branch, 25.0)], false);
        assert_eq!(merged, vec![loc(branch, 25.0)]);
    }
}
