use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

pub mod cache;
pub mod context;
pub mod macros;
pub mod tokens;
pub mod utils;

/// A JSON document kept under `~/.vendaplus/`.
pub trait Storable<T: Serialize + DeserializeOwned + Default + Clone = Self> {
    fn path() -> Result<PathBuf>;
}

/// Load and save for a [`Storable`], implemented with [`impl_store!`](crate::impl_store).
#[async_trait]
pub trait Store<T: Storable + Serialize + DeserializeOwned + Default + Clone = Self> {
    /// Reads the file, creating it from `Default` when missing.
    #[allow(clippy::new_ret_no_self)]
    async fn new() -> Result<T>;
    async fn save(&self) -> Result<T>;
}
