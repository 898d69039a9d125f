use crate::domain::model::chainages_equal;
use crate::utils::error::{DiscretizationError, Result};
use crate::utils::validation::{validate_positive_length, Validate};
use serde::{Deserialize, Serialize};

/// 單一渠道細分後允許的最多計算點數
pub const MAX_POINTS_PER_CHANNEL: usize = 1_000_000;

/// 渠道計算網格產生選項
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// 已有多於一個位置的渠道也重新產生
    pub overwrite_existing: bool,
    /// 只清除渠道上的位置，不產生新位置
    pub erase_existing: bool,
    /// 以固定間距細分；`None` 時只產生端點與固定點
    pub fixed_length: Option<f64>,
}

impl Validate for GenerationOptions {
    fn validate(&self) -> Result<()> {
        if let Some(fixed_length) = self.fixed_length {
            validate_positive_length("generation.fixed_length", fixed_length)?;
        }
        Ok(())
    }
}

/// 以 `fixed_length` 細分長度為 `length` 的渠道時，點數不得超過上限
pub fn validate_subdivision(name: &str, length: f64, fixed_length: Option<f64>) -> Result<()> {
    let Some(fixed_length) = fixed_length else {
        return Ok(());
    };

    let points = (length / fixed_length).ceil();
    if points > MAX_POINTS_PER_CHANNEL as f64 {
        return Err(DiscretizationError::InvalidConfigValueError {
            field: "generation.fixed_length".to_string(),
            value: fixed_length.to_string(),
            reason: format!(
                "channel '{}' (length {}) would need {} points, limit is {}",
                name, length, points, MAX_POINTS_PER_CHANNEL
            ),
        });
    }
    Ok(())
}

/// 產生單一渠道的 chainage：起點、固定點、終點，並依固定間距細分
pub fn channel_chainages(length: f64, fixed_chainages: &[f64], fixed_length: Option<f64>) -> Vec<f64> {
    let mut chainages = vec![0.0];
    chainages.extend(fixed_chainages.iter().copied().filter(|c| (0.0..=length).contains(c)));
    chainages.push(length);
    sort_and_dedup(&mut chainages);

    if let Some(fixed_length) = fixed_length.filter(|l| *l > 0.0) {
        let mut extra = Vec::new();
        for pair in chainages.windows(2) {
            let segment_length = pair[1] - pair[0];
            if segment_length > fixed_length {
                let parts = (segment_length / fixed_length).ceil() as usize;
                let step = segment_length / parts as f64;
                extra.extend((1..parts).map(|j| pair[0] + j as f64 * step));
            }
        }
        chainages.extend(extra);
        sort_and_dedup(&mut chainages);
    }

    chainages
}

fn sort_and_dedup(chainages: &mut Vec<f64>) {
    chainages.sort_by(f64::total_cmp);
    chainages.dedup_by(|a, b| chainages_equal(*a, *b));
}
