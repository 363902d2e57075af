// Remote catalog: release listing, descriptors and asset indexes.

pub mod client;
pub mod model;
