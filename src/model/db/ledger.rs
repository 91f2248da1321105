use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecordsIntoIter, Terminator, Trim, WriterBuilder};

use crate::error::Result;
use crate::model::ballot::{BallotEntry, LEDGER_HEADER};

use super::BallotLedger;

/// The ballot ledger: a CSV file of `id,candidat` rows, one per cast vote.
///
/// The file is created with a header row on first append. Ledgers written
/// without a header are read just the same.
#[derive(Debug, Clone)]
pub struct CsvLedger {
    path: PathBuf,
}

impl CsvLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Has anything ever been written?
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Encode the bytes to append: the header for a fresh file, a line break if
    /// the previous write was torn, then the entry itself.
    fn encode(entry: &BallotEntry, fresh: bool, needs_newline: bool) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        if needs_newline {
            buf.push(b'\n');
        }
        {
            let mut writer = WriterBuilder::new()
                .has_headers(false)
                .terminator(Terminator::Any(b'\n'))
                .from_writer(&mut buf);
            if fresh {
                writer.write_record(LEDGER_HEADER)?;
            }
            writer.serialize(entry)?;
            writer.flush()?;
        }
        Ok(buf)
    }
}

/// Does the file end with a line break? Empty files count as terminated.
fn ends_with_newline(file: &mut File, len: u64) -> std::io::Result<bool> {
    if len == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0_u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

impl BallotLedger for CsvLedger {
    type Entries = LedgerEntries;

    fn entries(&self) -> Result<LedgerEntries> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("No ledger at {} yet", self.path.display());
                return Ok(LedgerEntries::empty());
            }
            Err(err) => return Err(err.into()),
        };
        let records = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(file)
            .into_records();
        Ok(LedgerEntries::new(records))
    }

    fn append(&mut self, entry: &BallotEntry) -> Result<()> {
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&self.path)?;
        let len = file.metadata()?.len();
        let needs_newline = !ends_with_newline(&mut file, len)?;
        if needs_newline {
            warn!(
                "Ledger {} ends in a torn record; starting a fresh line",
                self.path.display()
            );
        }

        // One write per record, so a crash leaves either the whole row or a
        // partial trailing row that readers skip.
        let buf = Self::encode(entry, len == 0, needs_newline)?;
        file.write_all(&buf)?;
        file.sync_data()?;
        Ok(())
    }
}

/// Lazy iterator over the ledger rows, in append order.
///
/// Rows with fewer than two fields (for example a record torn by a crash) are
/// skipped. A leading `id,candidat` header row is skipped.
pub struct LedgerEntries {
    records: Option<StringRecordsIntoIter<File>>,
    first: bool,
}

impl LedgerEntries {
    fn new(records: StringRecordsIntoIter<File>) -> Self {
        Self {
            records: Some(records),
            first: true,
        }
    }

    fn empty() -> Self {
        Self {
            records: None,
            first: false,
        }
    }
}

impl Iterator for LedgerEntries {
    type Item = Result<BallotEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let records = self.records.as_mut()?;
        loop {
            let record = match records.next()? {
                Ok(record) => record,
                Err(err) => return Some(Err(err.into())),
            };
            let first = std::mem::replace(&mut self.first, false);
            let (voter_id, candidate_id) = match (record.get(0), record.get(1)) {
                (Some(voter_id), Some(candidate_id)) => (voter_id, candidate_id),
                _ => {
                    let line = record.position().map(|p| p.line()).unwrap_or_default();
                    warn!("Skipping incomplete ledger row at line {line}");
                    continue;
                }
            };
            let entry = BallotEntry::new(voter_id, candidate_id);
            if first && entry.is_header() {
                continue;
            }
            return Some(Ok(entry));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn collect(ledger: &CsvLedger) -> Vec<BallotEntry> {
        ledger
            .entries()
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn missing_ledger_is_empty() {
        let dir = TempDir::new().unwrap();
        let ledger = CsvLedger::new(dir.path().join("votes.csv"));
        assert!(!ledger.exists());
        assert!(collect(&ledger).is_empty());
        assert!(!ledger.has_voted("7").unwrap());
    }

    #[test]
    fn append_then_read() {
        let dir = TempDir::new().unwrap();
        let mut ledger = CsvLedger::new(dir.path().join("votes.csv"));

        ledger.append(&BallotEntry::new("7", "c1")).unwrap();
        ledger.append(&BallotEntry::new("12", "c2")).unwrap();

        assert_eq!(
            fs::read_to_string(ledger.path()).unwrap(),
            "id,candidat\n7,c1\n12,c2\n"
        );
        let entries = collect(&ledger);
        assert_eq!(
            entries,
            vec![BallotEntry::new("7", "c1"), BallotEntry::new("12", "c2")]
        );
        // Restartable and stable without intervening writes.
        assert_eq!(collect(&ledger), entries);

        assert!(ledger.has_voted("7").unwrap());
        assert!(ledger.has_voted("12").unwrap());
        assert!(!ledger.has_voted("1").unwrap());
        assert!(!ledger.has_voted("id").unwrap());
    }

    #[test]
    fn headerless_ledger() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("votes.csv");
        fs::write(&path, "7,c1\n12,c2\n").unwrap();
        let ledger = CsvLedger::new(path);

        assert_eq!(
            collect(&ledger),
            vec![BallotEntry::new("7", "c1"), BallotEntry::new("12", "c2")]
        );
    }

    #[test]
    fn torn_record_does_not_swallow_next() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("votes.csv");
        // A crash left a partial row with no terminator.
        fs::write(&path, "id,candidat\n7,c1\n12").unwrap();
        let mut ledger = CsvLedger::new(path.clone());

        assert_eq!(collect(&ledger), vec![BallotEntry::new("7", "c1")]);

        ledger.append(&BallotEntry::new("21", "c2")).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "id,candidat\n7,c1\n12\n21,c2\n"
        );
        assert_eq!(
            collect(&ledger),
            vec![BallotEntry::new("7", "c1"), BallotEntry::new("21", "c2")]
        );
        assert!(!ledger.has_voted("12").unwrap());
    }

    #[test]
    fn torn_header_is_not_a_ballot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("votes.csv");
        // A crash during the very first append left half a header.
        fs::write(&path, "id,cand").unwrap();
        let mut ledger = CsvLedger::new(path.clone());

        assert!(collect(&ledger).is_empty());
        assert!(!ledger.has_voted("id").unwrap());

        ledger.append(&BallotEntry::example()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "id,cand\n7,c1\n");
        assert_eq!(collect(&ledger), vec![BallotEntry::example()]);
    }
}
