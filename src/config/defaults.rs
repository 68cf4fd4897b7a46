//! Built-in default values
// (c) 2024 Ross Younger

use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
};

use lazy_static::lazy_static;

/// The OpenSSH client defaults, per `ssh_config(5)`.
///
/// Directives whose default is computed at runtime (e.g. `HostName`, `IPQoS`) are not listed.
const OPENSSH_DEFAULTS: &[(&str, &str)] = &[
    ("AddKeysToAgent", "no"),
    ("AddressFamily", "any"),
    ("BatchMode", "no"),
    ("CanonicalizeFallbackLocal", "yes"),
    ("CanonicalizeHostname", "no"),
    ("CanonicalizeMaxDots", "1"),
    ("ChallengeResponseAuthentication", "yes"),
    ("CheckHostIP", "yes"),
    ("Cipher", "3des"),
    ("Ciphers", "chacha20-poly1305@openssh.com,aes128-ctr,aes192-ctr,aes256-ctr,aes128-gcm@openssh.com,aes256-gcm@openssh.com,aes128-cbc,aes192-cbc,aes256-cbc"),
    ("ClearAllForwardings", "no"),
    ("Compression", "no"),
    ("CompressionLevel", "6"),
    ("ConnectionAttempts", "1"),
    ("ControlMaster", "no"),
    ("EnableSSHKeysign", "no"),
    ("EscapeChar", "~"),
    ("ExitOnForwardFailure", "no"),
    ("FingerprintHash", "sha256"),
    ("ForwardAgent", "no"),
    ("ForwardX11", "no"),
    ("ForwardX11Timeout", "20m"),
    ("ForwardX11Trusted", "no"),
    ("GatewayPorts", "no"),
    ("GlobalKnownHostsFile", "/etc/ssh/ssh_known_hosts /etc/ssh/ssh_known_hosts2"),
    ("GSSAPIAuthentication", "no"),
    ("GSSAPIDelegateCredentials", "no"),
    ("HashKnownHosts", "no"),
    ("HostbasedAuthentication", "no"),
    ("HostbasedKeyTypes", "ecdsa-sha2-nistp256-cert-v01@openssh.com,ecdsa-sha2-nistp384-cert-v01@openssh.com,ecdsa-sha2-nistp521-cert-v01@openssh.com,ssh-ed25519-cert-v01@openssh.com,ssh-rsa-cert-v01@openssh.com,ecdsa-sha2-nistp256,ecdsa-sha2-nistp384,ecdsa-sha2-nistp521,ssh-ed25519,ssh-rsa"),
    ("HostKeyAlgorithms", "ecdsa-sha2-nistp256-cert-v01@openssh.com,ecdsa-sha2-nistp384-cert-v01@openssh.com,ecdsa-sha2-nistp521-cert-v01@openssh.com,ssh-ed25519-cert-v01@openssh.com,ssh-rsa-cert-v01@openssh.com,ecdsa-sha2-nistp256,ecdsa-sha2-nistp384,ecdsa-sha2-nistp521,ssh-ed25519,ssh-rsa"),
    ("IdentitiesOnly", "no"),
    ("IdentityFile", "~/.ssh/identity"),
    ("KbdInteractiveAuthentication", "yes"),
    ("KexAlgorithms", "curve25519-sha256,curve25519-sha256@libssh.org,ecdh-sha2-nistp256,ecdh-sha2-nistp384,ecdh-sha2-nistp521,diffie-hellman-group-exchange-sha256,diffie-hellman-group-exchange-sha1,diffie-hellman-group14-sha1"),
    ("LogLevel", "INFO"),
    ("MACs", "umac-64-etm@openssh.com,umac-128-etm@openssh.com,hmac-sha2-256-etm@openssh.com,hmac-sha2-512-etm@openssh.com,hmac-sha1-etm@openssh.com,umac-64@openssh.com,umac-128@openssh.com,hmac-sha2-256,hmac-sha2-512,hmac-sha1"),
    ("NoHostAuthenticationForLocalhost", "no"),
    ("NumberOfPasswordPrompts", "3"),
    ("PasswordAuthentication", "yes"),
    ("PermitLocalCommand", "no"),
    ("Port", "22"),
    ("PreferredAuthentications", "gssapi-with-mic,hostbased,publickey,keyboard-interactive,password"),
    ("Protocol", "2"),
    ("ProxyUseFdpass", "no"),
    ("PubkeyAcceptedKeyTypes", "ecdsa-sha2-nistp256-cert-v01@openssh.com,ecdsa-sha2-nistp384-cert-v01@openssh.com,ecdsa-sha2-nistp521-cert-v01@openssh.com,ssh-ed25519-cert-v01@openssh.com,ssh-rsa-cert-v01@openssh.com,ecdsa-sha2-nistp256,ecdsa-sha2-nistp384,ecdsa-sha2-nistp521,ssh-ed25519,ssh-rsa"),
    ("PubkeyAuthentication", "yes"),
    ("RekeyLimit", "default none"),
    ("RhostsRSAAuthentication", "no"),
    ("RSAAuthentication", "yes"),
    ("ServerAliveCountMax", "3"),
    ("ServerAliveInterval", "0"),
    ("StreamLocalBindMask", "0177"),
    ("StreamLocalBindUnlink", "no"),
    ("StrictHostKeyChecking", "ask"),
    ("TCPKeepAlive", "yes"),
    ("Tunnel", "no"),
    ("TunnelDevice", "any:any"),
    ("UpdateHostKeys", "no"),
    ("UseKeychain", "no"),
    ("UsePrivilegedPort", "no"),
    ("UserKnownHostsFile", "~/.ssh/known_hosts ~/.ssh/known_hosts2"),
    ("VerifyHostKeyDNS", "no"),
    ("VisualHostKey", "no"),
    ("XAuthLocation", "/usr/X11R6/bin/xauth"),
];

/// A table of fallback values, keyed case-insensitively by directive name.
///
/// An empty value means "no value"; lookups treat it exactly like an absent entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DefaultTable {
    /// (Lowercase keys!)
    values: HashMap<String, String>,
}

impl DefaultTable {
    /// An empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A table holding the documented OpenSSH client defaults
    #[must_use]
    pub fn openssh() -> Self {
        let values = OPENSSH_DEFAULTS
            .iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), (*v).to_string()))
            .collect();
        Self { values }
    }

    /// Looks up the default for a directive, or `None`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Sets (or with an empty value, clears) the default for a directive
    pub fn set(&mut self, key: &str, value: &str) {
        let _ = self
            .values
            .insert(key.to_ascii_lowercase(), value.to_string());
    }
}

lazy_static! {
    static ref DEFAULTS: RwLock<DefaultTable> = RwLock::new(DefaultTable::openssh());
}

/// Returns the process-wide default value for a directive, or an empty string if there is none.
#[must_use]
pub fn default(key: &str) -> String {
    DEFAULTS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(key)
        .unwrap_or_default()
        .to_string()
}

/// Changes the process-wide default value for a directive.
///
/// **CAUTION:** This affects every lookup in the process that does not use its own [`DefaultTable`].
/// Callers that change defaults while lookups are running on other threads have to
/// coordinate that themselves; a lookup may observe either value.
pub fn set_default(key: &str, value: &str) {
    DEFAULTS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .set(key, value);
}
