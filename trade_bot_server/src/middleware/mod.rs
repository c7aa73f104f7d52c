mod signature;

pub use signature::{verify_interaction, SignatureMiddlewareFactory, SignatureMiddlewareService};
