// Data models for pose landmarks, capture, labeled samples, dataset tables and training

pub mod capture;
pub mod pose;
pub mod sample;
pub mod dataset;
pub mod training;
