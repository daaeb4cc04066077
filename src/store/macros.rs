/// Implements [`Store`](crate::store::Store) as a JSON file at `Self::path()`.
/// A missing file is created from `Default`, saves replace the file atomically.
#[macro_export]
macro_rules! impl_store {
    ($($name:ty),+ $(,)?) => ($(
        #[async_trait::async_trait]
        impl $crate::store::Store for $name {
            async fn new() -> anyhow::Result<Self> {
                use anyhow::Context as _;

                let path = <Self as $crate::store::Storable>::path()?;

                let raw = match tokio::fs::read_to_string(&path).await {
                    Ok(raw) => raw,
                    Err(why) if why.kind() == std::io::ErrorKind::NotFound => {
                        return $crate::store::Store::save(&Self::default()).await;
                    }
                    Err(why) => {
                        return Err(why).with_context(|| format!("Failed to read {}", path.display()));
                    }
                };

                serde_json::from_str(&raw)
                    .with_context(|| format!("Failed to deserialize {}", path.display()))
            }

            async fn save(&self) -> anyhow::Result<Self> {
                use anyhow::Context as _;

                let path = <Self as $crate::store::Storable>::path()?;
                let raw = serde_json::to_vec(&self).context("Failed to serialize")?;

                $crate::store::utils::write_atomic(&path, &raw).await?;

                log::debug!("Saved store to {}", path.display());

                Ok(self.clone())
            }
        }
    )+)
}
