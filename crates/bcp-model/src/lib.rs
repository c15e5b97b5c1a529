//! Priority network and trainer for the BizCRM predictor.
//!
//! A deliberately small feed-forward network (4 inputs, two hidden layers,
//! one sigmoid output) trained on a fixed four-row ticket dataset with Adam
//! and binary cross-entropy. The network is an in-memory session artifact:
//! it is trained at engine startup and never persisted.

pub mod dataset;
pub mod network;
pub mod train;

pub use dataset::{builtin_training_set, TrainingSet};
pub use network::{PriorityNet, HIDDEN1, HIDDEN2, INPUT_DIM};
pub use train::{train, train_with_observer, EpochStats, TrainOptions, TrainReport};
