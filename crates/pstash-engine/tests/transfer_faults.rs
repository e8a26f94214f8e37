//! Injected failures at every acquisition point: each acquired handle must be
//! released exactly once and enumeration must stop at the failing entry.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use pstash_engine::{
    DirEntryRecord, LocalStore, PstoreTransfer, RecordStore, TransferError, TransferReport,
};
use pstash_test_support::{PstoreFixture, pattern};

#[derive(Debug, Default)]
struct Counters {
    opened: AtomicUsize,
    closed: AtomicUsize,
}

impl Counters {
    fn open(&self) {
        self.opened.fetch_add(1, Ordering::SeqCst);
    }

    fn snapshot(&self) -> (usize, usize) {
        (
            self.opened.load(Ordering::SeqCst),
            self.closed.load(Ordering::SeqCst),
        )
    }
}

struct Tracked<T> {
    inner: T,
    counters: Arc<Counters>,
}

impl<T> Tracked<T> {
    fn new(inner: T, counters: &Arc<Counters>) -> Self {
        counters.open();
        Self {
            inner,
            counters: Arc::clone(counters),
        }
    }
}

impl<T> Drop for Tracked<T> {
    fn drop(&mut self) {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
    }
}

impl<T: Read> Read for Tracked<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<T: Write> Write for Tracked<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<T: Iterator> Iterator for Tracked<T> {
    type Item = T::Item;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// Accepts at most `budget` bytes in total, then reports short writes.
struct BudgetWriter {
    inner: File,
    budget: Option<usize>,
}

impl Write for BudgetWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let take = self.budget.map_or(buf.len(), |budget| budget.min(buf.len()));
        self.inner.write_all(&buf[..take])?;
        if let Some(budget) = self.budget.as_mut() {
            *budget -= take;
        }
        Ok(take)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Returns one successful chunk, then fails when `fail` is set.
struct FlakyReader {
    inner: File,
    fail: bool,
    reads: usize,
}

impl Read for FlakyReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reads += 1;
        if self.fail && self.reads > 1 {
            return Err(io::Error::other("bad sector"));
        }
        self.inner.read(buf)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fault {
    Nothing,
    LogOpen,
    DirOpen,
    RecordOpen(&'static str),
    Read(&'static str),
    ShortWrite(usize),
    /// Yield `n` entries, then fail to read the next one.
    Enumeration(usize),
}

#[derive(Default)]
struct Tracker {
    log: Arc<Counters>,
    dir: Arc<Counters>,
    record: Arc<Counters>,
    attempted: Mutex<Vec<String>>,
}

impl Tracker {
    fn assert_released(&self) {
        let handles = [("log", &self.log), ("dir", &self.dir), ("record", &self.record)];
        for (label, counters) in handles {
            let (opened, closed) = counters.snapshot();
            assert_eq!(opened, closed, "{label} handles leaked");
            assert!(opened <= 1 || label == "record", "{label} opened more than once");
        }
    }

    fn attempted(&self) -> Vec<String> {
        self.attempted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Local store with sorted enumeration, handle tracking and one injected fault.
struct FaultyStore {
    fault: Fault,
    tracker: Arc<Tracker>,
}

impl FaultyStore {
    fn new(fault: Fault) -> (Self, Arc<Tracker>) {
        let tracker = Arc::new(Tracker::default());
        (
            Self {
                fault,
                tracker: Arc::clone(&tracker),
            },
            tracker,
        )
    }
}

fn denied() -> io::Error {
    io::Error::from(io::ErrorKind::PermissionDenied)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl RecordStore for FaultyStore {
    type Log = Tracked<BudgetWriter>;
    type Dir = Tracked<std::vec::IntoIter<io::Result<DirEntryRecord>>>;
    type Record = Tracked<FlakyReader>;

    fn open_log(&self, path: &Path) -> io::Result<Self::Log> {
        if self.fault == Fault::LogOpen {
            return Err(denied());
        }
        let budget = match self.fault {
            Fault::ShortWrite(budget) => Some(budget),
            _ => None,
        };
        let inner = LocalStore.open_log(path)?;
        Ok(Tracked::new(BudgetWriter { inner, budget }, &self.tracker.log))
    }

    fn open_dir(&self, path: &Path) -> io::Result<Self::Dir> {
        if self.fault == Fault::DirOpen {
            return Err(denied());
        }
        let mut entries = LocalStore.open_dir(path)?.collect::<io::Result<Vec<_>>>()?;
        entries.sort_by(|left, right| left.name.cmp(&right.name));
        let mut entries: Vec<io::Result<DirEntryRecord>> = entries.into_iter().map(Ok).collect();
        if let Fault::Enumeration(after) = self.fault {
            let at = after.min(entries.len());
            entries.insert(at, Err(io::Error::other("corrupted directory block")));
        }
        Ok(Tracked::new(entries.into_iter(), &self.tracker.dir))
    }

    fn open_record(&self, path: &Path) -> io::Result<Self::Record> {
        let name = file_name(path);
        self.tracker
            .attempted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(name.clone());
        // The visitor must have closed the previous record before opening this one.
        let (opened, closed) = self.tracker.record.snapshot();
        assert_eq!(opened, closed, "more than one record open at once");

        if matches!(self.fault, Fault::RecordOpen(target) if target == name) {
            return Err(denied());
        }
        let inner = LocalStore.open_record(path)?;
        let fail = matches!(self.fault, Fault::Read(target) if target == name);
        Ok(Tracked::new(
            FlakyReader {
                inner,
                fail,
                reads: 0,
            },
            &self.tracker.record,
        ))
    }
}

fn five_records(fixture: &PstoreFixture) -> anyhow::Result<Vec<Vec<u8>>> {
    let mut payloads = Vec::new();
    for (index, seed) in [b'a', b'b', b'c', b'd', b'e'].into_iter().enumerate() {
        let payload = pattern(seed, 3000 + index * 100);
        fixture.write_record(&format!("rec-{index}"), &payload)?;
        payloads.push(payload);
    }
    Ok(payloads)
}

fn run(
    fixture: &PstoreFixture,
    fault: Fault,
) -> (Result<TransferReport, TransferError>, Arc<Tracker>) {
    let (store, tracker) = FaultyStore::new(fault);
    let result = PstoreTransfer::with_store(fixture.paths(), store).run();
    (result, tracker)
}

#[test]
fn clean_run_releases_every_handle() -> anyhow::Result<()> {
    let fixture = PstoreFixture::new()?;
    let payloads = five_records(&fixture)?;
    fixture.create_subdir("nested")?;

    let (result, tracker) = run(&fixture, Fault::Nothing);
    let report = result?;
    assert_eq!(report.files_copied, 5);
    assert_eq!(report.entries_skipped, 1);
    assert_eq!(fixture.read_log()?, payloads.concat());
    tracker.assert_released();
    assert_eq!(tracker.record.snapshot(), (5, 5));
    Ok(())
}

#[test]
fn destination_open_failure_touches_nothing_else() -> anyhow::Result<()> {
    let fixture = PstoreFixture::new()?;
    five_records(&fixture)?;

    let (result, tracker) = run(&fixture, Fault::LogOpen);
    assert!(matches!(result, Err(TransferError::DestinationOpen { .. })));
    tracker.assert_released();
    assert_eq!(tracker.log.snapshot(), (0, 0));
    assert_eq!(tracker.dir.snapshot(), (0, 0));
    assert!(tracker.attempted().is_empty());
    Ok(())
}

#[test]
fn directory_open_failure_closes_log() -> anyhow::Result<()> {
    let fixture = PstoreFixture::new()?;
    five_records(&fixture)?;

    let (result, tracker) = run(&fixture, Fault::DirOpen);
    let Err(err) = result else {
        anyhow::bail!("expected directory open failure");
    };
    assert!(matches!(err, TransferError::SourceOpen { .. }));
    assert!(err.status_code() < 0);
    tracker.assert_released();
    assert_eq!(tracker.log.snapshot(), (1, 1));
    assert!(fixture.read_log()?.is_empty());
    Ok(())
}

#[test]
fn buffer_allocation_failure_closes_directory_and_log() -> anyhow::Result<()> {
    let fixture = PstoreFixture::new()?;
    five_records(&fixture)?;

    let (store, tracker) = FaultyStore::new(Fault::Nothing);
    let paths = fixture.paths().with_buffer_size(usize::MAX);
    let result = PstoreTransfer::with_store(paths, store).run();
    assert!(matches!(result, Err(TransferError::Allocation { .. })));
    tracker.assert_released();
    assert_eq!(tracker.log.snapshot(), (1, 1));
    assert_eq!(tracker.dir.snapshot(), (1, 1));
    assert!(tracker.attempted().is_empty());
    Ok(())
}

#[test]
fn entry_open_failure_keeps_prior_entries_and_skips_the_rest() -> anyhow::Result<()> {
    let fixture = PstoreFixture::new()?;
    let payloads = five_records(&fixture)?;

    let (result, tracker) = run(&fixture, Fault::RecordOpen("rec-2"));
    match result {
        Err(TransferError::Open { path, .. }) => {
            assert_eq!(path, fixture.source_dir().join("rec-2"));
        }
        other => anyhow::bail!("expected open failure, got {other:?}"),
    }
    tracker.assert_released();
    assert_eq!(tracker.attempted(), vec!["rec-0", "rec-1", "rec-2"]);
    assert_eq!(fixture.read_log()?, [&payloads[0][..], &payloads[1][..]].concat());
    Ok(())
}

#[test]
fn read_failure_stops_mid_entry() -> anyhow::Result<()> {
    let fixture = PstoreFixture::new()?;
    let payloads = five_records(&fixture)?;

    let (result, tracker) = run(&fixture, Fault::Read("rec-1"));
    assert!(matches!(result, Err(TransferError::Read { .. })));
    tracker.assert_released();
    assert_eq!(tracker.attempted(), vec!["rec-0", "rec-1"]);

    // rec-1 fits in one buffer, so its bytes land before the failing read.
    assert_eq!(fixture.read_log()?, [&payloads[0][..], &payloads[1][..]].concat());
    Ok(())
}

#[test]
fn short_write_aborts_enumeration() -> anyhow::Result<()> {
    let fixture = PstoreFixture::new()?;
    let payloads = five_records(&fixture)?;
    let budget = payloads[0].len() + 10;

    let (result, tracker) = run(&fixture, Fault::ShortWrite(budget));
    let Err(err) = result else {
        anyhow::bail!("expected short write");
    };
    assert!(matches!(err, TransferError::ShortWrite { written: 10, .. }));
    assert_eq!(err.status_code(), -5);
    tracker.assert_released();
    assert_eq!(tracker.attempted(), vec!["rec-0", "rec-1"]);
    assert_eq!(fixture.read_log()?.len(), budget);
    Ok(())
}

#[test]
fn enumeration_failure_stops_before_later_entries() -> anyhow::Result<()> {
    let fixture = PstoreFixture::new()?;
    let payloads = five_records(&fixture)?;

    let (result, tracker) = run(&fixture, Fault::Enumeration(2));
    let Err(err) = result else {
        anyhow::bail!("expected enumeration failure");
    };
    match &err {
        TransferError::Enumeration { path, .. } => assert_eq!(path, fixture.source_dir()),
        other => anyhow::bail!("expected enumeration failure, got {other:?}"),
    }
    assert_eq!(err.status_code(), -5);
    tracker.assert_released();
    assert_eq!(tracker.dir.snapshot(), (1, 1));
    assert_eq!(tracker.attempted(), vec!["rec-0", "rec-1"]);
    assert_eq!(fixture.read_log()?, [&payloads[0][..], &payloads[1][..]].concat());
    Ok(())
}
