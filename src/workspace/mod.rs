/// On-disk contest state: configuration, manifests, fixtures and directory layout.
pub mod config;
pub mod fixture;
pub mod layout;
pub mod lookup;
pub mod manifest;

pub use config::{Config, config_dir};
pub use fixture::{TestCase, TestFile};
pub use layout::Problem;
pub use manifest::ProblemManifest;
