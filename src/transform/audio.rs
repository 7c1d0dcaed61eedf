//! WAV to OGG transcode via ffmpeg
//!
//! The content store rejects raw WAV uploads, so WAV files are rewrapped
//! into an OGG container with the lossless FLAC codec before upload.

use crate::error::{SyncError, SyncResult};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::error;

const FFMPEG_BIN: &str = "ffmpeg";
const WAV_TO_OGG_ARGS: [&str; 7] = ["-i", "pipe:0", "-c:a", "flac", "-f", "ogg", "pipe:1"];

/// Convert a WAV buffer to OGG/FLAC
pub async fn convert_wav_to_ogg(input: &[u8]) -> SyncResult<Vec<u8>> {
    convert_with(FFMPEG_BIN, input).await
}

async fn convert_with(binary: &str, input: &[u8]) -> SyncResult<Vec<u8>> {
    let mut child = Command::new(binary)
        .args(WAV_TO_OGG_ARGS)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| SyncError::command_failed(binary, e))?;

    // Feed stdin from a separate task so a filled stdout pipe cannot
    // deadlock against our write.
    let stdin = child.stdin.take();
    let payload = input.to_vec();
    let writer = tokio::spawn(async move {
        if let Some(mut stdin) = stdin {
            let _ = stdin.write_all(&payload).await;
            let _ = stdin.shutdown().await;
        }
    });

    let output = child
        .wait_with_output()
        .await
        .map_err(|e| SyncError::command_failed(binary, e))?;
    let _ = writer.await;

    if output.status.success() {
        return Ok(output.stdout);
    }

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    error!("ffmpeg stderr: {stderr}");
    Err(SyncError::FfmpegFailed {
        code: output.status.code().unwrap_or(-1),
        stderr,
    })
}
