// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Directory-backed cache tier.

use std::{
    fmt, io,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, SystemTime},
};

use bytes::Bytes;
use parking_lot::Mutex;
use stratum_tier::{CacheEntry, CacheTier, Error, TierOperation};
use tokio::{
    fs,
    io::{AsyncReadExt, AsyncWriteExt},
    sync::OnceCell,
};

use crate::{
    builder::DiskTierBuilder,
    format::{self, CorruptEntry, HEADER_LEN, Header},
    index::{Index, IndexEntry, TEMP_EXTENSION, file_id, file_name, parse_file_name},
};

struct Inner {
    dir: PathBuf,
    max_size: Option<u64>,
    name: Option<String>,
    index: OnceCell<Mutex<Index>>,
    writer: tokio::sync::Mutex<()>,
    temp_counter: AtomicU64,
}

/// A durable cache tier storing one file per entry in a directory.
///
/// Files are named after the xxh3 hash of their key and carry the key, the write
/// timestamp and the per-entry TTL next to the value, so the directory can be
/// reopened by a later process. The in-process index is built lazily by scanning
/// the directory on first use.
///
/// Mutations are serialized per tier. A write goes to a temp file that is then
/// renamed over the entry file, so readers observe either the previous entry or the
/// new one, and an interrupted write leaves the previous entry in place. Once the
/// aggregate size exceeds the configured ceiling, the oldest-written entries are
/// deleted.
///
/// Every mutation commits on a Tokio task of its own. A caller that stops
/// waiting cannot split the file changes from the index update: a mutation that
/// has started always finishes.
///
/// Clones share the same directory state.
///
/// # Examples
///
/// ```no_run
/// use bytes::Bytes;
/// use stratum_disk::DiskTier;
/// use stratum_tier::{CacheEntry, CacheTier};
///
/// # async fn example() -> Result<(), stratum_tier::Error> {
/// let tier = DiskTier::builder("/var/cache/catalog/items").max_size(512 * 1024 * 1024).build();
///
/// let key = "item_default_42".to_string();
/// tier.insert(&key, CacheEntry::new(Bytes::from_static(b"{}"))).await?;
/// assert!(tier.get(&key).await?.is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct DiskTier {
    inner: Arc<Inner>,
}

impl fmt::Debug for DiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiskTier")
            .field("dir", &self.inner.dir)
            .field("name", &self.inner.name)
            .field("max_size", &self.inner.max_size)
            .field("loaded", &self.inner.index.initialized())
            .finish_non_exhaustive()
    }
}

impl DiskTier {
    /// Creates a builder for a tier stored in `dir`.
    ///
    /// The directory is created on first use.
    #[must_use]
    pub fn builder(dir: impl Into<PathBuf>) -> DiskTierBuilder {
        DiskTierBuilder::new(dir.into())
    }

    pub(crate) fn from_builder(builder: DiskTierBuilder) -> Self {
        Self {
            inner: Arc::new(Inner {
                dir: builder.dir,
                max_size: builder.max_size,
                name: builder.name,
                index: OnceCell::new(),
                writer: tokio::sync::Mutex::new(()),
                temp_counter: AtomicU64::new(0),
            }),
        }
    }

    /// Returns the directory holding this tier's files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.inner.dir
    }

    /// Returns the tier's name, if one was configured.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    fn entry_path(&self, id: u64) -> PathBuf {
        self.inner.dir.join(file_name(id))
    }

    fn temp_path(&self, id: u64) -> PathBuf {
        let counter = self.inner.temp_counter.fetch_add(1, Ordering::Relaxed);
        self.inner
            .dir
            .join(format!("{id:016x}.{}.{counter}.{TEMP_EXTENSION}", std::process::id()))
    }

    async fn index(&self, operation: TierOperation) -> Result<&Mutex<Index>, Error> {
        self.inner
            .index
            .get_or_try_init(|| scan(&self.inner.dir, self.name()))
            .await
            .map_err(|e| Error::from_message(operation, e))
            .inspect_err(|_| tracing::error!(dir = %self.inner.dir.display(), %operation, "cannot open cache directory"))
    }

    /// Runs `commit` on a task of its own and waits for it.
    async fn detached<T, F>(&self, operation: TierOperation, commit: impl FnOnce(Self) -> F) -> Result<T, Error>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, Error>> + Send + 'static,
    {
        tokio::spawn(commit(self.clone()))
            .await
            .map_err(|e| Error::from_message(operation, e))?
    }

    async fn commit_insert(&self, key: String, bytes: Vec<u8>, header: Header) -> Result<(), Error> {
        let index = self.index(TierOperation::Insert).await?;
        let id = file_id(&key);
        let _writer = self.inner.writer.lock().await;

        let temp = self.temp_path(id);
        if let Err(e) = write_file(&temp, &bytes).await {
            if let Err(cleanup) = remove_if_exists(&temp).await {
                tracing::debug!(path = %temp.display(), error = %cleanup, "temp file left behind");
            }
            return Err(Error::from_message(TierOperation::Insert, e));
        }
        fs::rename(&temp, self.entry_path(id))
            .await
            .map_err(|e| Error::from_message(TierOperation::Insert, e))?;

        let evicted = {
            let mut index = index.lock();
            index.record(id, IndexEntry::new(key, bytes.len() as u64, &header));
            self.inner.max_size.map(|max| index.eviction_candidates(max)).unwrap_or_default()
        };

        if !evicted.is_empty() {
            tracing::debug!(tier = self.name(), count = evicted.len(), "evicting oldest entries");
            self.remove_files(index, &evicted, TierOperation::Insert).await?;
        }
        Ok(())
    }

    async fn commit_invalidate(&self, key: String) -> Result<(), Error> {
        let index = self.index(TierOperation::Invalidate).await?;
        let id = file_id(&key);
        let _writer = self.inner.writer.lock().await;

        let owned_by_other_key = {
            let index = index.lock();
            index.get(id, &key).is_none() && index.contains(id)
        };
        if owned_by_other_key {
            return Ok(());
        }
        self.remove_files(index, &[id], TierOperation::Invalidate).await
    }

    async fn commit_clear(&self) -> Result<(), Error> {
        let index = self.index(TierOperation::Clear).await?;
        let _writer = self.inner.writer.lock().await;

        let mut dir = fs::read_dir(&self.inner.dir)
            .await
            .map_err(|e| Error::from_message(TierOperation::Clear, e))?;
        while let Some(dir_entry) = dir
            .next_entry()
            .await
            .map_err(|e| Error::from_message(TierOperation::Clear, e))?
        {
            let path = dir_entry.path();
            let name = path.file_name().and_then(|name| name.to_str()).unwrap_or_default();
            if parse_file_name(name).is_some() || name.ends_with(TEMP_EXTENSION) {
                remove_if_exists(&path)
                    .await
                    .map_err(|e| Error::from_message(TierOperation::Clear, e))?;
            }
        }

        index.lock().clear();
        Ok(())
    }

    async fn commit_purge(&self, now: SystemTime, ttl: Option<Duration>) -> Result<u64, Error> {
        let index = self.index(TierOperation::Purge).await?;
        let _writer = self.inner.writer.lock().await;

        let expired = index.lock().expired(now, ttl);
        self.remove_files(index, &expired, TierOperation::Purge).await?;
        Ok(expired.len() as u64)
    }

    /// Deletes the files of `ids`, dropping each from the index once its file is gone.
    async fn remove_files(&self, index: &Mutex<Index>, ids: &[u64], operation: TierOperation) -> Result<(), Error> {
        for &id in ids {
            remove_if_exists(&self.entry_path(id))
                .await
                .map_err(|e| Error::from_message(operation, e))?;
            index.lock().remove(id);
        }
        Ok(())
    }
}

impl CacheTier<String, Bytes> for DiskTier {
    async fn get(&self, key: &String) -> Result<Option<CacheEntry<Bytes>>, Error> {
        let index = self.index(TierOperation::Get).await?;
        let id = file_id(key);
        let Some(known) = index.lock().get(id, key).cloned() else {
            return Ok(None);
        };

        let bytes = match fs::read(self.entry_path(id)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let mut index = index.lock();
                if index.get(id, key) == Some(&known) {
                    index.remove(id);
                }
                return Ok(None);
            }
            Err(e) => return Err(Error::from_message(TierOperation::Get, e)),
        };

        let (stored_key, entry) = format::decode(Bytes::from(bytes)).map_err(|e| Error::from_message(TierOperation::Get, e))?;
        Ok((stored_key == *key).then_some(entry))
    }

    async fn insert(&self, key: &String, entry: CacheEntry<Bytes>) -> Result<(), Error> {
        let bytes = format::encode(key, &entry).map_err(|e| Error::from_message(TierOperation::Insert, e))?;
        let header = Header {
            cached_at: entry.cached_at(),
            ttl: entry.ttl(),
            key_len: key.len(),
        };
        let key = key.clone();

        self.detached(TierOperation::Insert, move |tier| async move { tier.commit_insert(key, bytes, header).await })
            .await
    }

    async fn invalidate(&self, key: &String) -> Result<(), Error> {
        let key = key.clone();
        self.detached(TierOperation::Invalidate, move |tier| async move { tier.commit_invalidate(key).await })
            .await
    }

    async fn clear(&self) -> Result<(), Error> {
        self.detached(TierOperation::Clear, |tier| async move { tier.commit_clear().await })
            .await
    }

    async fn purge_expired(&self, now: SystemTime, ttl: Option<Duration>) -> Result<u64, Error> {
        self.detached(TierOperation::Purge, move |tier| async move { tier.commit_purge(now, ttl).await })
            .await
    }

    fn len(&self) -> Option<u64> {
        self.inner.index.get().map(|index| index.lock().len())
    }

    fn weight(&self) -> Option<u64> {
        self.inner.index.get().map(|index| index.lock().size())
    }
}

async fn write_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

async fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path).await {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Loads the index of `dir`, creating the directory if needed.
///
/// Leftover temp files and entry files that cannot be read back are deleted.
async fn scan(dir: &Path, name: Option<&str>) -> io::Result<Mutex<Index>> {
    fs::create_dir_all(dir).await?;

    let mut scanned = Vec::new();
    let mut discarded = 0_usize;
    let mut read_dir = fs::read_dir(dir).await?;
    while let Some(dir_entry) = read_dir.next_entry().await? {
        let path = dir_entry.path();
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };

        if file_name.ends_with(TEMP_EXTENSION) {
            remove_if_exists(&path).await?;
            discarded += 1;
            continue;
        }
        let Some(id) = parse_file_name(file_name) else {
            continue;
        };

        match read_index_entry(&path, id).await {
            Ok(entry) => scanned.push((id, entry)),
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "discarding unreadable cache entry");
                remove_if_exists(&path).await?;
                discarded += 1;
            }
        }
    }

    tracing::debug!(tier = name, dir = %dir.display(), loaded = scanned.len(), discarded, "cache directory scanned");
    Ok(Mutex::new(Index::from_scan(scanned)))
}

async fn read_index_entry(path: &Path, id: u64) -> Result<IndexEntry, CorruptEntry> {
    let mut file = fs::File::open(path)
        .await
        .map_err(|e| CorruptEntry::caused_by("cannot open", e))?;
    let size = file
        .metadata()
        .await
        .map_err(|e| CorruptEntry::caused_by("cannot stat", e))?
        .len();

    let mut header = [0; HEADER_LEN];
    file.read_exact(&mut header)
        .await
        .map_err(|e| CorruptEntry::caused_by("truncated header", e))?;
    let header = Header::parse(&header)?;
    if (HEADER_LEN + header.key_len) as u64 > size {
        return Err(CorruptEntry::new("truncated key"));
    }

    let mut key = vec![0; header.key_len];
    file.read_exact(&mut key)
        .await
        .map_err(|e| CorruptEntry::caused_by("truncated key", e))?;
    let key = String::from_utf8(key).map_err(|e| CorruptEntry::caused_by("key is not UTF-8", e))?;
    if file_id(&key) != id {
        return Err(CorruptEntry::new("file name does not match key"));
    }

    Ok(IndexEntry::new(key, size, &header))
}
