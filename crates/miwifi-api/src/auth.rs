use secrecy::SecretString;

/// Router address used when none is configured.
pub const DEFAULT_HOST: &str = "192.168.31.1";

/// Factory admin account on MiWiFi firmware.
pub const DEFAULT_USERNAME: &str = "admin";

/// `logtype` discriminator sent with every login form.
///
/// `2` selects plaintext-password login; the router accepts the password
/// as-is over the (unverified) TLS channel.
pub const LOGIN_LOG_TYPE: &str = "2";

/// Credentials for authenticating with a router.
///
/// Immutable for the lifetime of a client.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// Credentials for the factory `admin` account.
    pub fn admin(password: impl Into<String>) -> Self {
        Self::new(DEFAULT_USERNAME, password)
    }
}
