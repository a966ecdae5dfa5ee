//! Apps compiled into the `djboss` binary

pub mod echo;

use std::sync::Arc;

use crate::discovery::AppRegistry;
use crate::manage::{builtin_app, ManagementUtility};

/// Registry of every app the binary can load: the built-in app plus the sample apps.
pub fn installed(utility: Arc<dyn ManagementUtility>) -> AppRegistry {
    AppRegistry::new()
        .with(builtin_app(utility))
        .with(echo::app())
}
