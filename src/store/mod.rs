// Local store: directory layout and cached metadata documents.

pub mod atomic;
pub mod descriptor_store;
pub mod layout;
