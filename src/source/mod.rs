// Remote transport abstraction: pluggable backends for documents and content.

pub mod http_source;
pub mod traits;
