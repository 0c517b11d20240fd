//! Scannable-code payloads.
//!
//! A batch's code encodes the absolute URL of its public report page,
//! `<public_url>/batch/<id>`. Turning that URL into an image is left to the
//! caller's renderer.

use url::Url;

use crate::batches::{Batch, BatchId};
use crate::error::{Error, Result};

/// Report page URL for batch `id`. Any query or fragment on `public_url` is dropped.
pub fn report_url(public_url: &Url, id: BatchId) -> Result<Url> {
    let mut url = public_url.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|_| Error::config(format!("public URL {} cannot have a path", public_url)))?
        .pop_if_empty()
        .push("batch")
        .push(&id.to_string());
    Ok(url)
}

/// A listed batch together with the payload of its code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTarget {
    pub batch: Batch,
    pub url: Url,
}

impl ScanTarget {
    /// Pair `batch` with its report URL under `public_url`
    pub fn new(public_url: &Url, batch: Batch) -> Result<Self> {
        let url = report_url(public_url, batch.id)?;
        Ok(Self { batch, url })
    }

    /// The string to encode in the code image
    pub fn payload(&self) -> &str {
        self.url.as_str()
    }
}
