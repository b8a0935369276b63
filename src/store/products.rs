//! Product store: in-memory cache over the products file.
//!
//! The cache is the read path for the whole storefront. It is built from the
//! backing file at startup and rebuilt on [`ProductStore::invalidate`] after
//! an admin upload; between reloads it is immutable. Reads take the shared
//! side of a `RwLock`; a reload builds a complete replacement catalog and
//! swaps it in under the exclusive side, so readers never observe a
//! half-built cache.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::codec::{self, Header};
use crate::domain::Product;
use crate::{Result, StorefrontError};

#[derive(Debug, Default)]
struct Catalog {
    /// Insertion order follows file row order, which keeps listing order
    /// deterministic across identical loads.
    products: IndexMap<String, Product>,
    categories: BTreeSet<String>,
}

#[derive(Debug)]
pub struct ProductStore {
    path: PathBuf,
    catalog: RwLock<Catalog>,
}

impl ProductStore {
    /// Opens the store and performs the initial eager load.
    ///
    /// A missing backing file is not an error; the store starts empty and a
    /// later `invalidate` (after the first admin upload) populates it.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self {
            path: path.into(),
            catalog: RwLock::new(Catalog::default()),
        };
        store.load()?;
        Ok(store)
    }

    /// Rebuilds the cache from the backing file and swaps it in.
    pub fn load(&self) -> Result<()> {
        let fresh = self.read_catalog()?;
        debug!(
            path = %self.path.display(),
            products = fresh.products.len(),
            categories = fresh.categories.len(),
            "product cache reloaded"
        );
        *self
            .catalog
            .write()
            .unwrap_or_else(PoisonError::into_inner) = fresh;
        Ok(())
    }

    /// Explicit cache invalidation; reload is synchronous and eager.
    pub fn invalidate(&self) -> Result<()> {
        self.load()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, sku: &str) -> Option<Product> {
        self.read().products.get(sku).cloned()
    }

    /// All active products in cache order.
    pub fn list_active(&self) -> Vec<Product> {
        self.read()
            .products
            .values()
            .filter(|p| p.is_active)
            .cloned()
            .collect()
    }

    /// Distinct non-empty categories across all loaded products, sorted.
    pub fn categories(&self) -> Vec<String> {
        self.read().categories.iter().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.read().products.len()
    }

    pub fn active_count(&self) -> usize {
        self.read().products.values().filter(|p| p.is_active).count()
    }

    /// First `limit` active products, for the landing page.
    pub fn featured(&self, limit: usize) -> Vec<Product> {
        self.read()
            .products
            .values()
            .filter(|p| p.is_active)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Resolves SKUs in the given order, skipping unknown ones.
    pub fn by_skus<S: AsRef<str>>(&self, skus: &[S]) -> Vec<Product> {
        let catalog = self.read();
        skus.iter()
            .filter_map(|sku| catalog.products.get(sku.as_ref()).cloned())
            .collect()
    }

    fn read(&self) -> RwLockReadGuard<'_, Catalog> {
        self.catalog.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Parses the whole backing file into a fresh catalog.
    ///
    /// Row-level parse failures are skipped, not fatal: one bad row must not
    /// take the catalog down. Only file-level I/O problems surface.
    fn read_catalog(&self) -> Result<Catalog> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Catalog::default());
            }
            Err(err) => return Err(StorefrontError::StoreUnavailable(err)),
        };

        let mut lines = BufReader::new(file).lines();
        let header = match lines.next() {
            Some(line) => Header::parse(&line.map_err(StorefrontError::StoreUnavailable)?)?,
            None => return Ok(Catalog::default()),
        };

        let mut catalog = Catalog::default();
        for (row_num, line) in lines.enumerate() {
            let line = line.map_err(StorefrontError::StoreUnavailable)?;
            if line.trim().is_empty() {
                continue;
            }
            match codec::decode_product(&header, &line) {
                Ok(product) => {
                    if !product.category.is_empty() {
                        catalog.categories.insert(product.category.clone());
                    }
                    catalog.products.insert(product.sku.clone(), product);
                }
                Err(err) => {
                    warn!(row = row_num + 2, %err, "skipping malformed product row");
                }
            }
        }
        Ok(catalog)
    }
}
