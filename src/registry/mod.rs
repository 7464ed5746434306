//! Chain- and version-keyed deployment lookup
//!
//! Pure data: where the protocol's auxiliary helper contracts live per
//! chain and protocol version.

pub mod deployments;

pub use deployments::{DeploymentEntry, DeploymentRegistry, HelperRole};
