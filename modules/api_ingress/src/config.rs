use serde::{Deserialize, Serialize};

/// API ingress configuration (`modules.api_ingress`)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApiIngressConfig {
    /// Serve `/swagger/doc.json` and the viewer page.
    #[serde(default = "default_enable_docs")]
    pub enable_docs: bool,
    #[serde(default)]
    pub cors_enabled: bool,
}

impl Default for ApiIngressConfig {
    fn default() -> Self {
        Self {
            enable_docs: default_enable_docs(),
            cors_enabled: false,
        }
    }
}

fn default_enable_docs() -> bool {
    true
}
