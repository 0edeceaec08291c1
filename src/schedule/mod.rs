pub(crate) mod scheduler;
pub(crate) mod script;
pub(crate) mod strength;
pub(crate) mod timeline;
