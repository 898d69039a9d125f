use crate::core::{GenerationOptions, SegmentGeneration};
use crate::utils::error::{DiscretizationError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GridConfig {
    #[serde(default)]
    pub discretization: DiscretizationSection,
    #[serde(default)]
    pub generation: GenerationSection,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscretizationSection {
    #[serde(default)]
    pub segment_generation: SegmentGeneration,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationSection {
    pub overwrite_existing: Option<bool>,
    pub erase_existing: Option<bool>,
    pub fixed_length: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub json: bool,
}

impl GridConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(DiscretizationError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| DiscretizationError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GRID_FIXED_LENGTH})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| DiscretizationError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 取得渠道網格產生選項
    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            overwrite_existing: self.generation.overwrite_existing.unwrap_or(false),
            erase_existing: self.generation.erase_existing.unwrap_or(false),
            fixed_length: self.generation.fixed_length,
        }
    }

    pub fn segment_generation(&self) -> SegmentGeneration {
        self.discretization.segment_generation
    }
}

impl Validate for GridConfig {
    fn validate(&self) -> Result<()> {
        self.generation_options().validate()
    }
}
