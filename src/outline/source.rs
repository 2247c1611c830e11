use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Result;
use async_trait::async_trait;
use futures::{stream, Stream, StreamExt};
use tokio::fs;
use tracing::{debug, error};

use super::node::RawOutlineNode;

/// How many outline documents are read concurrently.
const MAX_CONCURRENT_READS: usize = 4;

/// Interface for abstracting where parsed outline documents come from.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OutlineSource: Send + Sync {
    /// Reads and decodes a single outline document.
    async fn load_outline(&self, path: &Path) -> Result<RawOutlineNode>;
}

/// The main realization of [OutlineSource]. Documents are outline trees an org
/// parser has already written out as json.
pub struct JsonOutlineSource;

#[async_trait]
impl OutlineSource for JsonOutlineSource {
    async fn load_outline(&self, path: &Path) -> Result<RawOutlineNode> {
        debug!("Reading outline {path:?}");
        let text = fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// An outline document prepared for aggregation. `area` is the stem of the
/// file the document came from and doubles as its top-level grouping name.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedOutline {
    pub area: Arc<str>,
    pub root: RawOutlineNode,
}

pub fn area_name(path: &Path) -> Arc<str> {
    path.file_stem()
        .map(|v| v.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
        .into()
}

/// Reads the configured documents a few files at a time. Results come back in
/// the order `files` lists them no matter which read finishes first, because
/// report sections follow that order.
pub fn outline_stream<'a, S: OutlineSource>(
    source: &'a S,
    files: &'a [PathBuf],
) -> impl Stream<Item = (&'a Path, Result<RawOutlineNode>)> + 'a {
    stream::iter(files)
        .map(move |path| async move { (path.as_path(), source.load_outline(path).await) })
        .buffered(MAX_CONCURRENT_READS)
}

/// Loads all outline documents, skipping the ones that fail. A broken file
/// costs its own data, never the whole report.
pub async fn load_forest<S: OutlineSource>(source: &S, files: &[PathBuf]) -> Vec<LoadedOutline> {
    let results: Vec<_> = outline_stream(source, files).collect().await;

    let mut forest = Vec::with_capacity(results.len());
    for (path, outline) in results {
        match outline {
            Ok(root) => forest.push(LoadedOutline {
                area: area_name(path),
                root,
            }),
            Err(e) => error!("Failed to load outline {path:?} {e}"),
        }
    }
    forest
}
