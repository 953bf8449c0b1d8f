//! SFTP connection provider backed by libssh2.

use std::fs::File;
use std::io::{self, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

use log::{debug, warn};
use ssh2::{Session, Sftp};

use crate::endpoint::{Credential, Endpoint};
use crate::errors::{ConnectionError, TransferError, TransferStage};
use crate::session::{SessionProvider, TransferSession};

const DISCONNECT_DESCRIPTION: &str = "ingress-bench session complete";
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(15);

/// Opens password-authenticated SFTP sessions. Host keys are not verified.
#[derive(Debug, Clone)]
pub struct SftpConnector {
    connect_timeout: Duration,
    handshake_timeout: Duration,
    io_timeout: Option<Duration>,
}

impl Default for SftpConnector {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            io_timeout: None,
        }
    }
}

impl SftpConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Bound on the SSH banner exchange, authentication and SFTP subsystem
    /// start. Always applied, whatever `io_timeout` says.
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Per-operation timeout applied once the session is up. `None` blocks
    /// forever.
    pub fn io_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.io_timeout = timeout;
        self
    }

    fn connect_tcp(&self, endpoint: &Endpoint) -> Result<TcpStream, ConnectionError> {
        let display = endpoint.to_string();
        let addrs: Vec<SocketAddr> = endpoint
            .socket_addr()
            .to_socket_addrs()
            .map_err(|source| ConnectionError::Connect {
                endpoint: display.clone(),
                source,
            })?
            .collect();

        let mut last_err = io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            "host resolved to no addresses",
        );
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(stream) => return Ok(stream),
                Err(err) => {
                    debug!("connect to {} failed: {}", addr, err);
                    last_err = err;
                }
            }
        }
        Err(ConnectionError::Connect {
            endpoint: display,
            source: last_err,
        })
    }
}

impl SessionProvider for SftpConnector {
    type Session = SftpSession;

    fn open(
        &self,
        endpoint: &Endpoint,
        credential: &Credential,
    ) -> Result<SftpSession, ConnectionError> {
        let tcp = self.connect_tcp(endpoint)?;
        let display = endpoint.to_string();

        let mut session = Session::new().map_err(|err| ConnectionError::Handshake {
            endpoint: display.clone(),
            message: err.to_string(),
        })?;
        let handshake_timeout = self.handshake_timeout.max(Duration::from_millis(1));
        session.set_timeout(timeout_millis(handshake_timeout));
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|err| ConnectionError::Handshake {
                endpoint: display.clone(),
                message: err.to_string(),
            })?;

        session
            .userauth_password(&credential.username, &credential.password)
            .map_err(|err| ConnectionError::Authentication {
                username: credential.username.clone(),
                message: err.to_string(),
            })?;
        if !session.authenticated() {
            return Err(ConnectionError::Authentication {
                username: credential.username.clone(),
                message: "server did not accept the password".to_string(),
            });
        }

        let sftp = session.sftp().map_err(|err| ConnectionError::Subsystem {
            message: err.to_string(),
        })?;

        // 0 disables the libssh2 timeout.
        session.set_timeout(self.io_timeout.map_or(0, timeout_millis));

        debug!("SFTP session open to {} as {}", display, credential.username);
        Ok(SftpSession {
            endpoint: display,
            inner: Some(Connected { session, sftp }),
        })
    }
}

fn timeout_millis(timeout: Duration) -> u32 {
    timeout.as_millis().min(u32::MAX as u128) as u32
}

struct Connected {
    session: Session,
    sftp: Sftp,
}

pub struct SftpSession {
    endpoint: String,
    inner: Option<Connected>,
}

impl SftpSession {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl TransferSession for SftpSession {
    fn upload(&mut self, local: &Path, remote_path: &str) -> Result<u64, TransferError> {
        let name = local
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| local.display().to_string());

        let Some(connected) = self.inner.as_ref() else {
            return Err(TransferError::new(
                name,
                TransferStage::CreateRemote,
                "session is closed",
            ));
        };

        let mut source = File::open(local)
            .map_err(|err| TransferError::from_io(&name, TransferStage::ReadLocal, &err))?;

        let mut remote = connected
            .sftp
            .create(Path::new(remote_path))
            .map_err(|err| {
                let err = io::Error::from(err);
                TransferError::from_io(&name, TransferStage::CreateRemote, &err)
            })?;

        let bytes = io::copy(&mut source, &mut remote)
            .map_err(|err| TransferError::from_io(&name, TransferStage::Write, &err))?;
        remote
            .flush()
            .map_err(|err| TransferError::from_io(&name, TransferStage::Write, &err))?;

        Ok(bytes)
    }

    fn close(&mut self) {
        let Some(Connected { session, sftp }) = self.inner.take() else {
            return;
        };
        drop(sftp);
        if let Err(err) = session.disconnect(None, DISCONNECT_DESCRIPTION, None) {
            warn!("disconnect from {} failed: {}", self.endpoint, err);
        }
        debug!("SFTP session to {} closed", self.endpoint);
    }

    fn is_open(&self) -> bool {
        self.inner.is_some()
    }
}

impl Drop for SftpSession {
    fn drop(&mut self) {
        self.close();
    }
}
