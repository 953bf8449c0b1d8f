#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use ingress_core::enumeration::FileFilter;
use ingress_core::errors::{ConnectionError, TransferError, TransferStage};
use ingress_core::{
    Credential, Endpoint, EngineObserver, EngineState, LoadTestConfig, NamingScheme, Pause, SessionProvider, TransferSession,
};

/// Shared view of everything the fake endpoint saw.
#[derive(Default)]
pub struct FakeLog {
    pub opens: Cell<u32>,
    pub closes: Cell<u32>,
    pub uploads: RefCell<Vec<(String, String)>>,
}

/// In-memory endpoint. Opens listed in `refuse_opens` (1-based) fail, and
/// uploads of files named in `failing_files` fail with `permission denied`.
pub struct FakeProvider {
    pub log: Rc<FakeLog>,
    pub refuse_opens: Vec<u32>,
    pub failing_files: HashSet<String>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self {
            log: Rc::new(FakeLog::default()),
            refuse_opens: Vec::new(),
            failing_files: HashSet::new(),
        }
    }

    pub fn refusing(mut self, opens: &[u32]) -> Self {
        self.refuse_opens = opens.to_vec();
        self
    }

    pub fn failing(mut self, files: &[&str]) -> Self {
        self.failing_files = files.iter().map(|f| f.to_string()).collect();
        self
    }
}

pub struct FakeSession {
    log: Rc<FakeLog>,
    failing_files: HashSet<String>,
    open: bool,
}

impl SessionProvider for FakeProvider {
    type Session = FakeSession;

    fn open(
        &self,
        _endpoint: &Endpoint,
        _credential: &Credential,
    ) -> Result<FakeSession, ConnectionError> {
        let call = self.log.opens.get() + 1;
        self.log.opens.set(call);
        if self.refuse_opens.contains(&call) {
            return Err(ConnectionError::Other("connection refused".into()));
        }
        Ok(FakeSession {
            log: Rc::clone(&self.log),
            failing_files: self.failing_files.clone(),
            open: true,
        })
    }
}

impl TransferSession for FakeSession {
    fn upload(&mut self, local: &Path, remote_path: &str) -> Result<u64, TransferError> {
        let name = local.file_name().unwrap().to_string_lossy().into_owned();
        if self.failing_files.contains(&name) {
            return Err(TransferError::new(
                name,
                TransferStage::CreateRemote,
                "permission denied",
            ));
        }
        let bytes = std::fs::metadata(local).map(|m| m.len()).unwrap_or(0);
        self.log
            .uploads
            .borrow_mut()
            .push((name, remote_path.to_string()));
        Ok(bytes)
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            self.log.closes.set(self.log.closes.get() + 1);
        }
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

#[derive(Default)]
pub struct RecordingPause {
    pub pauses: RefCell<Vec<Duration>>,
}

impl Pause for RecordingPause {
    fn pause(&self, duration: Duration) {
        self.pauses.borrow_mut().push(duration);
    }
}

/// Deletes `dir` on the first pause, as if the directory vanished between
/// batch sizes.
pub struct RemovingPause {
    pub dir: PathBuf,
    pub pauses: Cell<u32>,
}

impl RemovingPause {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            pauses: Cell::new(0),
        }
    }
}

impl Pause for RemovingPause {
    fn pause(&self, _duration: Duration) {
        if self.pauses.get() == 0 {
            std::fs::remove_dir_all(&self.dir).expect("remove local dir");
        }
        self.pauses.set(self.pauses.get() + 1);
    }
}

/// Records every state the engine enters.
#[derive(Default)]
pub struct StateLog {
    pub states: Vec<EngineState>,
}

impl EngineObserver for StateLog {
    fn state_changed(&mut self, state: EngineState) {
        self.states.push(state);
    }
}

pub fn local_dir_with(files: &[&str]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    for name in files {
        std::fs::write(dir.path().join(name), name.as_bytes()).expect("write fixture");
    }
    dir
}

pub fn config(local_dir: PathBuf, batch_sizes: &[u32]) -> LoadTestConfig {
    LoadTestConfig {
        endpoint: Endpoint::new("sftp.test", 22),
        credential: Credential::new("bronx", "pass"),
        local_dir,
        remote_dir: "/ingress".into(),
        interval: Duration::from_secs(7),
        batch_sizes: batch_sizes.to_vec(),
        naming: NamingScheme::Timestamp,
        filter: FileFilter::default(),
    }
}

/// Result lines only (`ok` / `not ok`), in order.
pub fn result_lines(report: &str) -> Vec<&str> {
    report
        .lines()
        .filter(|l| l.starts_with("ok ") || l.starts_with("not ok "))
        .collect()
}

pub fn ordinal_of(line: &str) -> u64 {
    let rest = line
        .strip_prefix("not ok ")
        .or_else(|| line.strip_prefix("ok "))
        .expect("result line");
    rest.split_whitespace()
        .next()
        .and_then(|n| n.parse().ok())
        .expect("ordinal")
}
