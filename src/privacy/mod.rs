pub mod group;
pub mod public_key;
pub mod resolver;

pub use group::{deterministic_order, root_group, PrivacyGroup};
pub use public_key::PublicKey;
pub use resolver::PrivacyResolver;
