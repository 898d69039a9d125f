use crate::domain::model::{BranchId, NetworkLocation};
use serde::{Deserialize, Serialize};

/// 提交後衍生片段的產生方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentGeneration {
    None,
    #[default]
    BetweenLocations,
}

/// 同一分支上兩個相鄰計算點之間的片段
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub branch: BranchId,
    pub start: f64,
    pub end: f64,
}

impl Segment {
    pub fn length(&self) -> f64 {
        self.end - self.start
    }
}

/// 由已排序（分支、chainage）的位置產生片段
pub fn segments_between_locations(locations: &[NetworkLocation]) -> Vec<Segment> {
    locations
        .windows(2)
        .filter(|pair| pair[0].branch == pair[1].branch)
        .map(|pair| Segment {
            branch: pair[0].branch,
            start: pair[0].chainage,
            end: pair[1].chainage,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_do_not_cross_branches() {
        let locations = vec![
            NetworkLocation::new(BranchId(0), 0.0),
            NetworkLocation::new(BranchId(0), 50.0),
            NetworkLocation::new(BranchId(0), 100.0),
            NetworkLocation::new(BranchId(1), 10.0),
        ];
        let segments = segments_between_locations(&locations);

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].start, 50.0);
        assert_eq!(segments[1].length(), 50.0);
    }
}
