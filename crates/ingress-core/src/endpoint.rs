use std::fmt;

use eyre::{bail, eyre, Result};

/// Address of the SFTP endpoint under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub const DEFAULT_PORT: u16 = 22;

    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parses `host`, `host:port`, or a bracketed IPv6 literal (`[::1]:2222`).
    /// The port defaults to 22 when omitted.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            bail!("endpoint is missing a host");
        }

        if raw.starts_with('[') {
            let closing = raw
                .find(']')
                .ok_or_else(|| eyre!("unterminated IPv6 address: {}", raw))?;
            let host = &raw[1..closing];
            if host.is_empty() {
                bail!("endpoint is missing a host");
            }
            let rest = &raw[closing + 1..];
            let port = if rest.is_empty() {
                Self::DEFAULT_PORT
            } else if let Some(port) = rest.strip_prefix(':') {
                parse_port(port)?
            } else {
                bail!("invalid endpoint {}", raw);
            };
            return Ok(Self::new(host, port));
        }

        // A bare IPv6 literal has several colons and no port.
        if raw.matches(':').count() > 1 {
            return Ok(Self::new(raw, Self::DEFAULT_PORT));
        }

        match raw.split_once(':') {
            Some((host, port)) => {
                if host.is_empty() {
                    bail!("endpoint is missing a host before the port");
                }
                Ok(Self::new(host, parse_port(port)?))
            }
            None => Ok(Self::new(raw, Self::DEFAULT_PORT)),
        }
    }

    /// `host:port` form for `TcpStream::connect`.
    pub fn socket_addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.socket_addr())
    }
}

fn parse_port(raw: &str) -> Result<u16> {
    if raw.is_empty() {
        return Ok(Endpoint::DEFAULT_PORT);
    }
    match raw.parse::<u16>() {
        Ok(0) | Err(_) => Err(eyre!("invalid port '{}'", raw)),
        Ok(port) => Ok(port),
    }
}

/// Username/password pair for password authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
