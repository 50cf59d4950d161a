use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;
use url::Url;

/// Lifetime used when the server does not say how long an access cookie lives.
pub const DEFAULT_COOKIE_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone)]
struct HostCookie {
    value: String,
    expires_at: Instant,
}

/// Access cookies obtained by solving challenges, one per host.
///
/// A single mutex guards the whole map; every operation is a hash lookup and
/// runs far less often than the network calls around it.
#[derive(Debug, Default)]
pub struct HostChallengeCache {
    cookies: Mutex<HashMap<String, HostCookie>>,
}

impl HostChallengeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The live cookie for `host`, dropping it if it has expired.
    pub fn get(&self, host: &str) -> Option<String> {
        let key = host.to_ascii_lowercase();
        let mut cookies = self.cookies.lock().unwrap_or_else(PoisonError::into_inner);

        match cookies.get(&key) {
            Some(cookie) if cookie.expires_at > Instant::now() => Some(cookie.value.clone()),
            Some(_) => {
                debug!(host = %key, "access cookie expired");
                cookies.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Store `cookie` for `host`, replacing whatever was there.
    pub fn set(&self, host: &str, cookie: impl Into<String>, ttl: Duration) {
        let key = host.to_ascii_lowercase();
        let entry = HostCookie {
            value: cookie.into(),
            expires_at: Instant::now() + ttl,
        };
        self.cookies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, entry);
    }

    pub fn len(&self) -> usize {
        self.cookies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cache key for a URL: host plus explicit port, lowercased.
pub fn host_key(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_set_then_get() {
        let cache = HostChallengeCache::new();
        cache.set("example.com", "auth=1", DEFAULT_COOKIE_TTL);

        assert_eq!(cache.get("example.com").as_deref(), Some("auth=1"));
        assert_eq!(cache.get("other.com"), None);
    }

    #[test]
    fn test_set_replaces_existing_host() {
        let cache = HostChallengeCache::new();
        cache.set("example.com", "auth=old", DEFAULT_COOKIE_TTL);
        cache.set("EXAMPLE.com", "auth=new", DEFAULT_COOKIE_TTL);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("example.com").as_deref(), Some("auth=new"));
    }

    #[test]
    fn test_expired_cookie_is_evicted() {
        let cache = HostChallengeCache::new();
        cache.set("example.com", "auth=1", Duration::ZERO);

        assert_eq!(cache.get("example.com"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_sets_keep_one_entry_per_host() {
        let cache = Arc::new(HostChallengeCache::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for j in 0..100 {
                        cache.set("example.com", format!("auth={}-{}", i, j), DEFAULT_COOKIE_TTL);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 1);
        assert!(cache.get("example.com").is_some());
    }

    #[test]
    fn test_host_key_includes_explicit_port() {
        let url = Url::parse("http://127.0.0.1:8080/a").unwrap();
        assert_eq!(host_key(&url).as_deref(), Some("127.0.0.1:8080"));

        let url = Url::parse("https://Example.com/a").unwrap();
        assert_eq!(host_key(&url).as_deref(), Some("example.com"));
    }
}
