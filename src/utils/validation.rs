use crate::utils::error::{DiscretizationError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_positive_length(field_name: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(DiscretizationError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value must be a finite number".to_string(),
        });
    }

    if value <= 0.0 {
        return Err(DiscretizationError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value must be greater than 0".to_string(),
        });
    }
    Ok(())
}

pub fn validate_branch_length(name: &str, length: f64) -> Result<()> {
    if !length.is_finite() || length < 0.0 {
        return Err(DiscretizationError::invalid_topology(format!(
            "branch '{}' has invalid length {}",
            name, length
        )));
    }
    Ok(())
}
