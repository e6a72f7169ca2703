pub(crate) mod blocks;
pub(crate) mod config;
pub(crate) mod drivers;
pub(crate) mod keys;
pub(crate) mod verify;
