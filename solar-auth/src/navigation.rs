//! Browser-style navigation the auth flow depends on.

use std::sync::{Arc, Mutex};

use log::*;
use url::Url;

use crate::error::{navigation_error, Error, NavigationErrorKind};

/// Query parameter the identity provider returns the authorization code in.
pub const CODE_PARAM: &str = "code";

/// Access to the host's location and history.
pub trait Navigator: Send + Sync {
    /// The full URL the application is currently at.
    fn current_url(&self) -> Url;

    /// Replace the current history entry without reloading.
    fn replace_url(&self, url: Url);

    /// Leave the application for `url`. On a real browser control never comes back.
    fn redirect(&self, url: Url) -> Result<(), Error>;

    /// Title of the current document, if any.
    fn document_title(&self) -> Option<String>;
}

/// Value of the `code` query parameter, if present and not empty.
pub fn authorization_code(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == CODE_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|code| !code.is_empty())
}

/// Copy of `url` with every `name` parameter removed and the others kept in order.
pub fn without_query_param(url: &Url, name: &str) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != name)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut stripped = url.clone();
    if kept.is_empty() {
        stripped.set_query(None);
    } else {
        stripped.query_pairs_mut().clear().extend_pairs(kept);
    }
    stripped
}

/// Navigator keeping its location in memory.
///
/// Used by non-browser hosts and tests. Redirects are recorded instead of followed.
#[derive(Clone)]
pub struct MemoryNavigator {
    inner: Arc<Mutex<MemoryLocation>>,
}

struct MemoryLocation {
    current: Url,
    title: Option<String>,
    redirects: Vec<Url>,
}

impl MemoryNavigator {
    pub fn new(current: Url) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryLocation {
                current,
                title: None,
                redirects: Vec::new(),
            })),
        }
    }

    pub fn with_title(self, title: impl Into<String>) -> Self {
        self.lock().title = Some(title.into());
        self
    }

    /// Every URL passed to [`Navigator::redirect`], oldest first.
    pub fn redirects(&self) -> Vec<Url> {
        self.lock().redirects.clone()
    }

    pub fn last_redirect(&self) -> Option<Url> {
        self.lock().redirects.last().cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryLocation> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Navigator for MemoryNavigator {
    fn current_url(&self) -> Url {
        self.lock().current.clone()
    }

    fn replace_url(&self, url: Url) {
        debug!("Replacing location with {}", url);
        self.lock().current = url;
    }

    fn redirect(&self, url: Url) -> Result<(), Error> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(navigation_error(
                NavigationErrorKind::RedirectFailed,
                &format!("Refusing to redirect to a {} URL", url.scheme()),
            ));
        }
        info!("Redirecting to {}", url);
        self.lock().redirects.push(url);
        Ok(())
    }

    fn document_title(&self) -> Option<String> {
        self.lock().title.clone()
    }
}
