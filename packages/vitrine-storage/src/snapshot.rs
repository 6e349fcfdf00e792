//! Read-only local replica of the corpus: id to gzip-compressed JSON document.

use std::{
	collections::HashMap,
	fs,
	io::{ErrorKind, Read, Write},
	path::{Path, PathBuf},
};

use flate2::{Compression, read::GzDecoder, write::GzEncoder};

use crate::{Error, Result};

const ENTRY_EXTENSION: &str = "json.gz";

pub trait SnapshotStore
where
	Self: Send + Sync,
{
	/// Compressed bytes stored under `id`, or `None` when the snapshot has no such entry.
	fn get(&self, id: &str) -> Result<Option<Vec<u8>>>;
}

/// Directory layout: one `<blake3(id)>.json.gz` file per document.
pub struct DirSnapshotStore {
	root: PathBuf,
}
impl DirSnapshotStore {
	pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
		let root = root.into();
		let meta = fs::metadata(&root).map_err(|err| Error::Io { path: root.clone(), source: err })?;

		if !meta.is_dir() {
			return Err(Error::InvalidArgument(format!(
				"snapshot path {} is not a directory",
				root.display()
			)));
		}

		Ok(Self { root })
	}

	pub fn root(&self) -> &Path {
		&self.root
	}
}
impl SnapshotStore for DirSnapshotStore {
	fn get(&self, id: &str) -> Result<Option<Vec<u8>>> {
		let path = entry_path(&self.root, id);

		match fs::read(&path) {
			Ok(raw) => Ok(Some(raw)),
			Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
			Err(err) => Err(Error::Io { path, source: err }),
		}
	}
}

/// Writes entries in the [`DirSnapshotStore`] layout.
pub struct SnapshotWriter {
	root: PathBuf,
}
impl SnapshotWriter {
	pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
		let root = root.into();

		fs::create_dir_all(&root).map_err(|err| Error::Io { path: root.clone(), source: err })?;

		Ok(Self { root })
	}

	/// Returns false when the entry exists and `overwrite` is not set.
	pub fn put(&self, id: &str, document: &serde_json::Value, overwrite: bool) -> Result<bool> {
		if id.trim().is_empty() {
			return Err(Error::InvalidArgument("snapshot entry id must be non-empty".to_string()));
		}

		let path = entry_path(&self.root, id);

		if !overwrite && path.exists() {
			return Ok(false);
		}

		let raw = serde_json::to_vec(document)?;
		let compressed = compress(&raw).map_err(|err| Error::Io { path: path.clone(), source: err })?;

		fs::write(&path, compressed).map_err(|err| Error::Io { path, source: err })?;

		Ok(true)
	}
}

/// In-memory store, used by tests and by callers that preload a snapshot.
#[derive(Default)]
pub struct MemorySnapshotStore {
	entries: HashMap<String, Vec<u8>>,
}
impl MemorySnapshotStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert_json(&mut self, id: &str, document: &serde_json::Value) -> Result<()> {
		let raw = serde_json::to_vec(document)?;
		let compressed = compress(&raw)
			.map_err(|err| Error::Io { path: PathBuf::from(id), source: err })?;

		self.entries.insert(id.to_string(), compressed);

		Ok(())
	}

	pub fn insert_raw(&mut self, id: &str, compressed: Vec<u8>) {
		self.entries.insert(id.to_string(), compressed);
	}
}
impl SnapshotStore for MemorySnapshotStore {
	fn get(&self, id: &str) -> Result<Option<Vec<u8>>> {
		Ok(self.entries.get(id).cloned())
	}
}

pub fn entry_path(root: &Path, id: &str) -> PathBuf {
	root.join(format!("{}.{ENTRY_EXTENSION}", blake3::hash(id.as_bytes()).to_hex()))
}

pub fn compress(raw: &[u8]) -> std::io::Result<Vec<u8>> {
	let mut encoder = GzEncoder::new(Vec::new(), Compression::default());

	encoder.write_all(raw)?;

	encoder.finish()
}

pub fn decompress(compressed: &[u8]) -> std::io::Result<Vec<u8>> {
	let mut decoder = GzDecoder::new(compressed);
	let mut out = Vec::new();

	decoder.read_to_end(&mut out)?;

	Ok(out)
}
