// Collaborator seams: frame sources, pose estimation, console input, signals

pub mod capture;
pub mod console;
pub mod pose;
pub mod signal;
