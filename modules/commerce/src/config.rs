use serde::{Deserialize, Serialize};

/// Configuration for the commerce module.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommerceConfig {
    /// Registrations with an email ending in this domain become admins.
    #[serde(default = "default_admin_email_domain")]
    pub admin_email_domain: String,
    #[serde(default = "default_min_password_len")]
    pub min_password_len: usize,
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_jwt_expiry_hours")]
    pub jwt_expiry_hours: i64,
    #[serde(default)]
    pub stripe: StripeConfig,
}

/// Stripe connectivity. When `secret_key` is not a usable live/test key the
/// server falls back to the in-process mock provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StripeConfig {
    #[serde(default)]
    pub secret_key: String,
    #[serde(default)]
    pub publishable_key: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Bound on any single call to the provider, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CommerceConfig {
    fn default() -> Self {
        Self {
            admin_email_domain: default_admin_email_domain(),
            min_password_len: default_min_password_len(),
            jwt_secret: default_jwt_secret(),
            jwt_expiry_hours: default_jwt_expiry_hours(),
            stripe: StripeConfig::default(),
        }
    }
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            publishable_key: String::new(),
            currency: default_currency(),
            api_base: default_api_base(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_admin_email_domain() -> String {
    "@admin.com".to_string()
}

fn default_min_password_len() -> usize {
    6
}

fn default_jwt_secret() -> String {
    "dev-jwt-secret".to_string()
}

fn default_jwt_expiry_hours() -> i64 {
    24
}

fn default_currency() -> String {
    "jpy".to_string()
}

fn default_api_base() -> String {
    "https://api.stripe.com".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}
