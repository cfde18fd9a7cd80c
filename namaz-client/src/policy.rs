use namaz_shared::PermissionState;
use serde::{Deserialize, Serialize};

/// What to assume when a platform permission query fails.
///
/// Native platforms are optimistic: the OS may already have granted
/// notifications outside of our knowledge and a broken query must not lock
/// those users out. Browsers are conservative and assume denial.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackPolicy {
    #[serde(default = "granted")]
    pub native_on_error: PermissionState,
    #[serde(default = "denied")]
    pub browser_on_error: PermissionState,
}

fn granted() -> PermissionState {
    PermissionState::Granted
}

fn denied() -> PermissionState {
    PermissionState::Denied
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            native_on_error: granted(),
            browser_on_error: denied(),
        }
    }
}

impl FallbackPolicy {
    /// Treat every failed query as a denial.
    pub fn strict() -> Self {
        Self {
            native_on_error: denied(),
            browser_on_error: denied(),
        }
    }

    pub fn on_query_failure(&self, native: bool) -> PermissionState {
        if native {
            self.native_on_error
        } else {
            self.browser_on_error
        }
    }
}
