//! Clip acquisition from the messaging platform's file API.

use tokio::io::AsyncWriteExt;
use tracing::debug;
use voicemark_foundation::PipelineError;

use crate::clip::VoiceClip;

/// Download a voice clip into a per-invocation temp file.
///
/// The platform's file-retrieval API hands out a plain HTTPS URL; the
/// body is streamed to disk as-is (OGG/Opus container) without being
/// buffered in memory. The returned clip owns the temp file and removes
/// it on drop.
pub async fn fetch_clip(client: &reqwest::Client, url: &str) -> Result<VoiceClip, PipelineError> {
    let mut response = client
        .get(url)
        .send()
        .await
        .map_err(|e| PipelineError::Fetch(format!("request to {url} failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(PipelineError::Fetch(format!(
            "{url} returned HTTP {status}"
        )));
    }

    let file = tempfile::Builder::new()
        .prefix("voicemark-clip-")
        .suffix(".ogg")
        .tempfile()
        .map_err(|e| PipelineError::Fetch(format!("temp file creation failed: {e}")))?;
    let mut out = tokio::fs::File::from_std(
        file.reopen()
            .map_err(|e| PipelineError::Fetch(format!("temp file open failed: {e}")))?,
    );

    let mut written = 0usize;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| PipelineError::Fetch(format!("reading body of {url} failed: {e}")))?
    {
        out.write_all(&chunk)
            .await
            .map_err(|e| PipelineError::Fetch(format!("temp file write failed: {e}")))?;
        written += chunk.len();
    }
    out.flush()
        .await
        .map_err(|e| PipelineError::Fetch(format!("temp file flush failed: {e}")))?;

    if written == 0 {
        return Err(PipelineError::Fetch(format!("{url} returned empty body")));
    }

    debug!(bytes = written, path = %file.path().display(), "clip downloaded");
    Ok(VoiceClip::owned(file.into_temp_path()))
}
