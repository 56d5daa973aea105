//! On-disk token cache.
//!
//! Tokens are stored at `<root>/<org-context>[-<client-id>]/token.txt` and
//! reused until the file is 24 hours old. Writes go through a temporary
//! file and a rename so a concurrent reader never sees a half-written
//! token. There is no cross-process lock; two processes refreshing at the
//! same moment will both hit the token endpoint and the last rename wins.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::auth::TokenSource;
use crate::error::Result;

/// Default cache root, relative to the working directory.
pub const DEFAULT_CACHE_ROOT: &str = ".tokencache";

/// Age at which a cached token is considered stale.
pub const TOKEN_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

const TOKEN_FILE: &str = "token.txt";

/// Caches an auth token on disk, keyed by organization context.
///
/// # Example
///
/// ```no_run
/// use finitestate::{AuthClient, ClientConfig, TokenCache};
///
/// # async fn example() -> finitestate::Result<()> {
/// let config = ClientConfig::from_env()?;
/// let mut cache = TokenCache::new(&config.organization_context, Some(&config.client_id));
/// let token = cache.get_token(&AuthClient::new(&config)?).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TokenCache {
    /// Token held in memory and when it was written or read from disk.
    token: Option<(String, SystemTime)>,
    token_dir: PathBuf,
    token_file: PathBuf,
    max_age: Duration,
}

impl TokenCache {
    /// Create a cache under [`DEFAULT_CACHE_ROOT`].
    pub fn new(organization_context: &str, client_id: Option<&str>) -> Self {
        Self::with_root(DEFAULT_CACHE_ROOT, organization_context, client_id)
    }

    /// Create a cache under an explicit root directory.
    pub fn with_root(
        root: impl AsRef<Path>,
        organization_context: &str,
        client_id: Option<&str>,
    ) -> Self {
        let dir_name = match client_id {
            Some(id) if !id.is_empty() => format!("{organization_context}-{id}"),
            _ => organization_context.to_string(),
        };
        let token_dir = root.as_ref().join(dir_name);
        let token_file = token_dir.join(TOKEN_FILE);
        Self {
            token: None,
            token_dir,
            token_file,
            max_age: TOKEN_MAX_AGE,
        }
    }

    /// Override the staleness threshold.
    #[must_use]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Path of the cached token file.
    pub fn token_file(&self) -> &Path {
        &self.token_file
    }

    /// Return a usable token, consulting memory, then disk, then `source`.
    ///
    /// A token at least `max_age` old is deleted and replaced with a
    /// freshly fetched one. The in-memory copy ages by the cache file's
    /// mtime while the file exists, and by the time it was obtained
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the token source fails or the cache file cannot
    /// be read or written.
    #[tracing::instrument(skip(self, source), fields(path = %self.token_file.display()))]
    pub async fn get_token<S: TokenSource + ?Sized>(&mut self, source: &S) -> Result<String> {
        let file_age = self.cached_age().await?;

        if let Some((token, obtained)) = &self.token {
            let age = file_age.unwrap_or_else(|| age_of(*obtained));
            if age < self.max_age {
                return Ok(token.clone());
            }
            tracing::info!("In-memory token is {}h old, refreshing", age.as_secs() / 3600);
            self.invalidate_token().await?;
            return self.refresh(source).await;
        }

        match file_age {
            Some(age) if age < self.max_age => {
                tracing::info!("Using cached token ({}s old)", age.as_secs());
                let token = tokio::fs::read_to_string(&self.token_file).await?;
                let token = token.trim().to_string();
                let obtained = SystemTime::now()
                    .checked_sub(age)
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                self.token = Some((token.clone(), obtained));
                Ok(token)
            }
            Some(age) => {
                tracing::info!("Cached token is {}h old, refreshing", age.as_secs() / 3600);
                self.invalidate_token().await?;
                self.refresh(source).await
            }
            None => {
                tracing::info!("No cached token, requesting a new one");
                self.refresh(source).await
            }
        }
    }

    /// Forget the token in memory and delete the cache file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub async fn invalidate_token(&mut self) -> Result<()> {
        self.token = None;
        match tokio::fs::remove_file(&self.token_file).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Age of the cache file, or `None` if there is no file.
    async fn cached_age(&self) -> Result<Option<Duration>> {
        let metadata = match tokio::fs::metadata(&self.token_file).await {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(age_of(metadata.modified()?)))
    }

    async fn refresh<S: TokenSource + ?Sized>(&mut self, source: &S) -> Result<String> {
        let token = source.fetch_token().await?;
        self.write_atomically(&token).await?;
        self.token = Some((token.clone(), SystemTime::now()));
        Ok(token)
    }

    async fn write_atomically(&self, token: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.token_dir).await?;
        let tmp = self
            .token_dir
            .join(format!("{TOKEN_FILE}.{}.tmp", std::process::id()));
        tokio::fs::write(&tmp, token).await?;
        tokio::fs::rename(&tmp, &self.token_file).await?;
        Ok(())
    }
}

/// Time since `at`. A timestamp in the future counts as brand new.
fn age_of(at: SystemTime) -> Duration {
    SystemTime::now().duration_since(at).unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_without_client_id() {
        let cache = TokenCache::new("org-123", None);
        assert_eq!(
            cache.token_file(),
            Path::new(".tokencache/org-123/token.txt")
        );
    }

    #[test]
    fn test_path_with_client_id() {
        let cache = TokenCache::with_root("/tmp/cache", "org-123", Some("client-9"));
        assert_eq!(
            cache.token_file(),
            Path::new("/tmp/cache/org-123-client-9/token.txt")
        );
    }

    #[test]
    fn test_empty_client_id_is_ignored() {
        let cache = TokenCache::with_root("root", "org", Some(""));
        assert_eq!(cache.token_file(), Path::new("root/org/token.txt"));
    }
}
