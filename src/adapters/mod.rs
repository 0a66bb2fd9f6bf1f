// Adapters layer: expose the framework-agnostic gateway over concrete transports.

#[cfg(feature = "cli")]
pub mod http;
