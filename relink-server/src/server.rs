//! Unix-socket IPC transport.
//!
//! Wire format: 4-byte little-endian length prefix framing a MessagePack
//! payload. Each frame carries one `RelinkRequest`; frames are answered in
//! order with one `RelinkResponse` each.

use crate::backend::Backend;
use crate::router;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use relink_core::ipc::{RelinkRequest, RelinkResponse};
use std::path::Path;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::broadcast;
use tokio_util::codec::{FramedRead, FramedWrite, LengthDelimitedCodec};

fn le_codec() -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder().little_endian().new_codec()
}

pub async fn run_unix_server(
    socket_path: &str,
    backend: Backend,
    mut shutdown: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    if Path::new(socket_path).exists() {
        std::fs::remove_file(socket_path)?;
    }

    let listener = UnixListener::bind(socket_path)?;
    tracing::info!("IPC server listening on {}", socket_path);

    loop {
        tokio::select! {
            res = listener.accept() => {
                let (stream, _) = res?;
                let backend = backend.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, backend).await {
                        tracing::error!("IPC connection error: {}", e);
                    }
                });
            }
            _ = shutdown.recv() => {
                tracing::info!("Shutting down IPC server...");
                break;
            }
        }
    }

    if Path::new(socket_path).exists() {
        std::fs::remove_file(socket_path)?;
    }

    Ok(())
}

/// Serve one client connection until it closes or a frame fails.
/// A request that fails to decode gets an error response; the connection
/// stays open for further frames.
async fn handle_connection(stream: UnixStream, backend: Backend) -> anyhow::Result<()> {
    let (read, write) = stream.into_split();
    let mut frames_in = FramedRead::new(read, le_codec());
    let mut frames_out = FramedWrite::new(write, le_codec());

    while let Some(frame) = frames_in.next().await {
        let frame = frame?;
        let response = match rmp_serde::from_slice::<RelinkRequest>(&frame) {
            Ok(request) => router::handle_request(request, &backend).await,
            Err(e) => RelinkResponse::err(format!("Deserialization error: {}", e)),
        };

        let encoded = rmp_serde::to_vec_named(&response)?;
        frames_out.send(Bytes::from(encoded)).await?;
    }

    Ok(())
}
