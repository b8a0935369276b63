//! Order ledger: durable append-and-rewrite log of orders.
//!
//! The backing file is the single shared mutable resource. Two layers of
//! exclusion protect it: a process-local `Mutex` serializes the id-scan +
//! append sequence (and any full-file rewrite) between threads, and an
//! advisory `fs2` lock on the file handle keeps other worker processes on a
//! shared filesystem from interleaving writes to the same path. `list` takes
//! neither lock; it reads through a fresh handle and may observe a
//! marginally stale snapshot, which is acceptable.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Local;
use fs2::FileExt;
use rust_decimal::Decimal;
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::catalog::{paginate, Paginated};
use crate::codec::{self, Header};
use crate::domain::{CustomerInfo, LineItem, Order, OrderStatus, PricedLine};
use crate::{Result, StorefrontError};

/// Order ids start above this floor; the first order ever is 100001.
const ORDER_ID_FLOOR: u64 = 100_000;

#[derive(Debug)]
pub struct OrderLedger {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl OrderLedger {
    /// Opens the ledger, creating a header-only file if none exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(StorefrontError::LedgerWrite)?;
            }
        }
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                let header = format!("{}\n", codec::ORDER_COLUMNS.join(","));
                file.write_all(header.as_bytes())
                    .map_err(StorefrontError::LedgerWrite)?;
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {}
            Err(err) => return Err(StorefrontError::LedgerWrite(err)),
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends a new order and returns its assigned id.
    ///
    /// Id assignment and the append happen inside one critical section, so
    /// concurrent callers can never be handed the same id. The encoded row
    /// is written with a single `write_all` under an exclusive advisory file
    /// lock: either the whole line lands or none of it.
    pub fn create(&self, customer: CustomerInfo, lines: &[PricedLine]) -> Result<u64> {
        let _guard = self.lock();

        let id = self.scan_max_id()? + 1;
        let total: Decimal = lines.iter().map(|line| line.line_total).sum();
        let order = Order {
            id,
            created_at: Local::now().format("%Y-%m-%d %H:%M").to_string(),
            customer,
            items: lines
                .iter()
                .map(|line| LineItem {
                    sku: line.product.sku.clone(),
                    qty: line.qty,
                })
                .collect(),
            total,
            status: OrderStatus::New,
        };
        let row = format!("{}\n", codec::encode_order(&order));

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(StorefrontError::LedgerWrite)?;
        file.lock_exclusive().map_err(StorefrontError::LedgerWrite)?;
        let written = file
            .write_all(row.as_bytes())
            .and_then(|()| file.flush());
        let unlocked = file.unlock();
        written.map_err(StorefrontError::LedgerWrite)?;
        unlocked.map_err(StorefrontError::LedgerWrite)?;

        info!(order_id = id, total = %total, "order appended");
        Ok(id)
    }

    /// All orders newest-first, optionally filtered by exact status.
    ///
    /// This is the one read path that reorders its result. It does not take
    /// the write lock; rows that fail to decode are skipped.
    pub fn list(
        &self,
        status: Option<OrderStatus>,
        page: usize,
        page_size: usize,
    ) -> Result<Paginated<Order>> {
        let mut orders = self.read_all()?;
        if let Some(status) = status {
            orders.retain(|order| order.status == status);
        }
        orders.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(paginate(orders, page, page_size))
    }

    /// Rewrites the status field of one order in place.
    ///
    /// Every other row is carried over byte-identical: the file is edited at
    /// the raw-line level, staged in a temp file on the same volume and
    /// swapped in with one atomic rename. If anything fails before the
    /// rename, the canonical path is untouched.
    pub fn update_status(&self, order_id: u64, new_status: OrderStatus) -> Result<()> {
        let _guard = self.lock();

        let content =
            fs::read_to_string(&self.path).map_err(StorefrontError::StoreUnavailable)?;
        let mut lines = content.lines();
        let header_line = lines
            .next()
            .ok_or_else(|| StorefrontError::Parse("orders file missing header".into()))?;
        let header = Header::parse(header_line)?;
        let status_idx = header
            .column_index("status")
            .ok_or_else(|| StorefrontError::Parse("orders file missing status column".into()))?;

        let mut found = false;
        let mut rewritten = String::with_capacity(content.len());
        rewritten.push_str(header_line);
        rewritten.push('\n');
        for line in lines {
            if !found && line_matches_id(line, order_id) {
                let mut cells = codec::split_row(line)?;
                while cells.len() <= status_idx {
                    cells.push(String::new());
                }
                cells[status_idx] = new_status.as_str().to_string();
                rewritten.push_str(&codec::join_row(&cells));
                found = true;
            } else {
                rewritten.push_str(line);
            }
            rewritten.push('\n');
        }
        if !found {
            return Err(StorefrontError::OrderNotFound(order_id));
        }

        self.replace_file(&rewritten)?;
        info!(order_id, status = new_status.as_str(), "order status updated");
        Ok(())
    }

    pub fn count(&self) -> Result<usize> {
        Ok(self.read_all()?.len())
    }

    pub fn count_by_status(&self, status: OrderStatus) -> Result<usize> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|order| order.status == status)
            .count())
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Highest assigned id on file, or the floor when no data rows exist.
    /// Must be called with the write lock held.
    fn scan_max_id(&self) -> Result<u64> {
        let file = File::open(&self.path).map_err(StorefrontError::StoreUnavailable)?;
        let mut max_id = ORDER_ID_FLOOR;
        for line in BufReader::new(file).lines().skip(1) {
            let line = line.map_err(StorefrontError::StoreUnavailable)?;
            // order_id is the first cell and never quoted.
            if let Some(id) = line
                .split(',')
                .next()
                .and_then(|cell| cell.trim().parse::<u64>().ok())
            {
                max_id = max_id.max(id);
            }
        }
        Ok(max_id)
    }

    fn read_all(&self) -> Result<Vec<Order>> {
        let file = File::open(&self.path).map_err(StorefrontError::StoreUnavailable)?;
        let mut lines = BufReader::new(file).lines();
        let header = match lines.next() {
            Some(line) => Header::parse(&line.map_err(StorefrontError::StoreUnavailable)?)?,
            None => return Ok(Vec::new()),
        };
        let mut orders = Vec::new();
        for (row_num, line) in lines.enumerate() {
            let line = line.map_err(StorefrontError::StoreUnavailable)?;
            if line.trim().is_empty() {
                continue;
            }
            match codec::decode_order(&header, &line) {
                Ok(order) => orders.push(order),
                Err(err) => {
                    warn!(row = row_num + 2, %err, "skipping malformed order row");
                }
            }
        }
        Ok(orders)
    }

    /// Stages the full file in a temp file next to the canonical path and
    /// swaps it in with a single rename.
    fn replace_file(&self, content: &str) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir).map_err(StorefrontError::LedgerWrite)?;
        tmp.as_file()
            .lock_exclusive()
            .map_err(StorefrontError::LedgerWrite)?;
        tmp.write_all(content.as_bytes())
            .map_err(StorefrontError::LedgerWrite)?;
        tmp.flush().map_err(StorefrontError::LedgerWrite)?;
        tmp.persist(&self.path)
            .map_err(|err| StorefrontError::LedgerWrite(err.error))?;
        Ok(())
    }
}

fn line_matches_id(line: &str, order_id: u64) -> bool {
    line.split(',')
        .next()
        .and_then(|cell| cell.trim().parse::<u64>().ok())
        == Some(order_id)
}
