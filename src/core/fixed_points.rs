use crate::core::lookup::LocationLookup;
use crate::domain::model::NetworkLocation;

/// 計算新位置集合的固定點遮罩。
///
/// `new_locations[i]` 只有在舊集合中以固定點身分存在時才標記為 true。
/// 舊集合沒有任何固定點時回傳 `None`，呼叫端視為全部 false。
pub fn fixed_mask(
    old_locations: &[NetworkLocation],
    old_mask: &[bool],
    new_locations: &[NetworkLocation],
) -> Option<Vec<bool>> {
    let fixed = old_locations
        .iter()
        .zip(old_mask)
        .filter(|(_, is_fixed)| **is_fixed)
        .map(|(location, _)| location);
    let lookup = LocationLookup::from_locations(fixed);

    if lookup.is_empty() {
        return None;
    }

    Some(new_locations.iter().map(|l| lookup.contains(l)).collect())
}
