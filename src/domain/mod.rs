// Domain layer: the common gist model and the backend port. No HTTP here.

pub mod language;
pub mod model;
pub mod ports;
