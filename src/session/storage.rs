use anyhow::Result;
use async_trait::async_trait;

use crate::store::tokens::Tokens;
use crate::store::Store;

/// Where the session manager persists its tokens.
#[async_trait]
pub trait TokenStorage: Send + Sync {
    async fn read(&self) -> Result<Tokens>;
    async fn write(&self, tokens: &Tokens) -> Result<()>;

    async fn clear(&self) -> Result<()> {
        self.write(&Tokens::default()).await
    }
}

/// The `session.json` store in the user's home directory, shared by every
/// running instance.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileStorage;

#[async_trait]
impl TokenStorage for FileStorage {
    async fn read(&self) -> Result<Tokens> {
        Tokens::new().await
    }

    async fn write(&self, tokens: &Tokens) -> Result<()> {
        tokens.save().await.map(|_| ())
    }
}
