pub(crate) mod anchor;
