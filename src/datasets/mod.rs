//! Built-in dataset mappings. Each module describes one source layout
//! declaratively; the generic augmenter does the rest.

pub mod camera_traps;
pub mod intake_fish;

use crate::error::RefineError;
use crate::mapping::DatasetMapping;

pub fn names() -> &'static [&'static str] {
    &["intake-fish", "camera-traps"]
}

pub fn by_name(name: &str) -> Result<DatasetMapping, RefineError> {
    match name {
        "intake-fish" => Ok(intake_fish::mapping()),
        "camera-traps" => Ok(camera_traps::mapping()),
        other => Err(RefineError::UnknownDataset(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn all_registered_mappings_validate() {
        for name in names() {
            let mapping = by_name(name).unwrap();
            mapping.validate().unwrap();
        }
    }

    #[test]
    fn unknown_dataset_rejected() {
        assert_matches!(
            by_name("reef-sharks").unwrap_err(),
            RefineError::UnknownDataset(_)
        );
    }
}
