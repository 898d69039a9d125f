use crate::domain::model::{chainages_equal, BranchId, NetworkLocation, CHAINAGE_TOLERANCE};
use std::collections::HashMap;

/// 以 (分支, chainage 分桶) 為鍵的容差查找表。
///
/// 桶寬等於容許誤差，因此兩個視為相同的點最多相差一個桶；
/// 查詢時檢查相鄰三個桶並以實際距離確認。
#[derive(Debug, Default, Clone)]
pub struct LocationLookup {
    buckets: HashMap<(BranchId, i64), Vec<(f64, usize)>>,
}

impl LocationLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_locations<'a>(locations: impl IntoIterator<Item = &'a NetworkLocation>) -> Self {
        let mut lookup = Self::new();
        for (index, location) in locations.into_iter().enumerate() {
            lookup.insert(location, index);
        }
        lookup
    }

    pub fn insert(&mut self, location: &NetworkLocation, index: usize) {
        self.buckets
            .entry((location.branch, bucket(location.chainage)))
            .or_default()
            .push((location.chainage, index));
    }

    /// 找出與 `location` 視為同一點的第一個索引
    pub fn find(&self, location: &NetworkLocation) -> Option<usize> {
        let key = bucket(location.chainage);
        (key.saturating_sub(1)..=key.saturating_add(1))
            .filter_map(|k| self.buckets.get(&(location.branch, k)))
            .flatten()
            .filter(|(chainage, _)| chainages_equal(*chainage, location.chainage))
            .map(|(_, index)| *index)
            .min()
    }

    pub fn contains(&self, location: &NetworkLocation) -> bool {
        self.find(location).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

fn bucket(chainage: f64) -> i64 {
    (chainage / CHAINAGE_TOLERANCE).floor() as i64
}
