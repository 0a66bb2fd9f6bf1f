// Domain layer: request/response models and the completion-service port.

pub mod model;
pub mod ports;
