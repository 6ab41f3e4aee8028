pub mod artifact;
pub mod deployer;
pub mod error;
pub mod fixture;
pub mod network;
pub mod record;
pub mod shared;
