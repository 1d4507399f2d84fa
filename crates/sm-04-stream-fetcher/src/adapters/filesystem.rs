//! # Filesystem Bucket Source
//!
//! Serves a directory tree laid out exactly like the object store:
//! `{root}/{kind}/{node_id}/{period:020}.{sm|sig}`.

use async_trait::async_trait;
use shared_types::{ConsensusTimestamp, NodeId, StreamKind};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::entities::ObjectType;
use crate::domain::layout::{object_key, parse_object_name};
use crate::ports::outbound::{SourceError, StreamSource};

/// Directory-backed [`StreamSource`].
#[derive(Debug, Clone)]
pub struct FsBucketSource {
    root: PathBuf,
}

impl FsBucketSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_of(
        &self,
        kind: StreamKind,
        node_id: NodeId,
        period: ConsensusTimestamp,
        object: ObjectType,
    ) -> PathBuf {
        self.root.join(object_key(kind, node_id, period, object))
    }

    /// Publish an object. Written to a temporary name and renamed so readers
    /// never see a partial object.
    pub async fn put(
        &self,
        kind: StreamKind,
        node_id: NodeId,
        period: ConsensusTimestamp,
        object: ObjectType,
        bytes: &[u8],
    ) -> Result<(), SourceError> {
        let path = self.path_of(kind, node_id, period, object);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).await.map_err(io_error)?;
        }
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes).await.map_err(io_error)?;
        fs::rename(&tmp, &path).await.map_err(io_error)
    }
}

fn io_error(e: std::io::Error) -> SourceError {
    SourceError::Io(e.to_string())
}

#[async_trait]
impl StreamSource for FsBucketSource {
    async fn list_periods(
        &self,
        kind: StreamKind,
        node_id: NodeId,
        after: Option<ConsensusTimestamp>,
        limit: usize,
    ) -> Result<Vec<ConsensusTimestamp>, SourceError> {
        let dir = self.root.join(kind.as_str()).join(node_id.to_string());
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(e)),
        };

        let mut periods = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some((period, ObjectType::Signature)) = parse_object_name(name) {
                if after.map_or(true, |a| period > a) {
                    periods.push(period);
                }
            }
        }
        periods.sort_unstable();
        periods.truncate(limit);
        Ok(periods)
    }

    async fn get(
        &self,
        kind: StreamKind,
        period: ConsensusTimestamp,
        node_id: NodeId,
        object: ObjectType,
    ) -> Result<Option<Vec<u8>>, SourceError> {
        match fs::read(self.path_of(kind, node_id, period, object)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(e)),
        }
    }
}
