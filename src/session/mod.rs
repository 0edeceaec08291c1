pub(crate) mod project;
pub(crate) mod reel_session;
