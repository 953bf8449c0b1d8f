//! Connection provider seam.
//!
//! A provider opens one authenticated session per batch run. Sessions are
//! either fully usable or `open` fails; there is no half-open state. Callers
//! hold sessions through [`SessionGuard`] so `close` runs on every exit path.

use std::ops::{Deref, DerefMut};
use std::path::Path;

use crate::endpoint::{Credential, Endpoint};
use crate::errors::{ConnectionError, TransferError};

/// An open session capable of uploading files.
pub trait TransferSession {
    /// Upload `local` to `remote_path`, returning the number of bytes written.
    fn upload(&mut self, local: &Path, remote_path: &str) -> Result<u64, TransferError>;

    /// Tear the session down. Must be idempotent.
    fn close(&mut self);

    fn is_open(&self) -> bool;
}

/// Opens sessions against an endpoint. No retries happen here; a failed open
/// is returned to the caller as-is.
pub trait SessionProvider {
    type Session: TransferSession;

    fn open(
        &self,
        endpoint: &Endpoint,
        credential: &Credential,
    ) -> Result<Self::Session, ConnectionError>;
}

impl<P: SessionProvider + ?Sized> SessionProvider for &P {
    type Session = P::Session;

    fn open(
        &self,
        endpoint: &Endpoint,
        credential: &Credential,
    ) -> Result<Self::Session, ConnectionError> {
        (**self).open(endpoint, credential)
    }
}

/// Owns a session and closes it when dropped.
pub struct SessionGuard<S: TransferSession> {
    session: S,
}

impl<S: TransferSession> SessionGuard<S> {
    pub fn new(session: S) -> Self {
        Self { session }
    }

    /// Close now instead of waiting for drop.
    pub fn close(mut self) {
        self.session.close();
    }
}

impl<S: TransferSession> Deref for SessionGuard<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.session
    }
}

impl<S: TransferSession> DerefMut for SessionGuard<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.session
    }
}

impl<S: TransferSession> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        self.session.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingSession {
        open: bool,
        closes: Rc<Cell<usize>>,
    }

    impl TransferSession for CountingSession {
        fn upload(&mut self, _local: &Path, _remote_path: &str) -> Result<u64, TransferError> {
            Ok(0)
        }

        fn close(&mut self) {
            self.open = false;
            self.closes.set(self.closes.get() + 1);
        }

        fn is_open(&self) -> bool {
            self.open
        }
    }

    #[test]
    fn guard_closes_on_drop() {
        let closes = Rc::new(Cell::new(0));
        {
            let guard = SessionGuard::new(CountingSession {
                open: true,
                closes: Rc::clone(&closes),
            });
            assert!(guard.is_open());
        }
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn guard_closes_on_unwind() {
        let closes = Rc::new(Cell::new(0));
        let counter = Rc::clone(&closes);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = SessionGuard::new(CountingSession {
                open: true,
                closes: counter,
            });
            panic!("upload blew up");
        }));
        assert!(result.is_err());
        assert_eq!(closes.get(), 1);
    }
}
