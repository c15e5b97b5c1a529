//! The built-in ticket training set.

use crate::network::INPUT_DIM;

/// Feature rows and labels for training.
#[derive(Debug, Clone)]
pub struct TrainingSet {
    pub xs: Vec<[f32; INPUT_DIM]>,
    pub ys: Vec<f32>,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }
}

/// The fixed four-row dataset the session model is trained on.
///
/// Features per row: complaint type code, chargeable flag, completion time
/// in days, region flag. Labels: 1 = high priority.
pub fn builtin_training_set() -> TrainingSet {
    TrainingSet {
        xs: vec![
            // installation, non-chargeable, 1 day, in-region
            [0.2, 0.0, 1.0, 0.5],
            // service, chargeable, 2 days, out-of-region
            [0.4, 1.0, 2.0, 0.3],
            // installation, non-chargeable, 1 day, out-of-region
            [0.1, 0.0, 1.0, 0.4],
            // escalation, chargeable, 3 days, in-region
            [0.5, 1.0, 3.0, 0.6],
        ],
        ys: vec![0.0, 1.0, 0.0, 1.0],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_set_has_four_balanced_rows() {
        let set = builtin_training_set();
        assert_eq!(set.len(), 4);
        assert_eq!(set.ys.iter().filter(|&&y| y == 1.0).count(), 2);
    }
}
