pub mod config;

// Collection
pub mod vectorizer;
pub mod sample_store;
pub mod session_manager;
pub mod capture_controller;
pub mod keystroke_capture;

// Training
pub mod dataset_loader;
pub mod feature_prep;
pub mod random_forest;
pub mod trainer;
pub mod model_store;
pub mod training_pipeline;
