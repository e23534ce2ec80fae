//! TCP remote control.
//!
//! One client at a time sends protocol lines (`set h`, `res h`). With
//! signal streaming on, the latest rendered block goes back to the client
//! as little-endian `f32` after every line and every idle second.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Context;
use tins_synth::{ControlBridge, SignalTap};

use crate::protocol::handle_line;

/// Idle time after which the listener streams a block anyway.
const READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Longest accepted command line, newline included. Anything longer is
/// discarded up to the next newline.
const MAX_LINE_LEN: usize = 256;

/// A bound, not yet running, remote listener.
pub struct RemoteListener {
    listener: TcpListener,
    bridge: ControlBridge,
    tap: Option<Arc<SignalTap>>,
}

impl RemoteListener {
    /// Bind `addr`. Failure is reported to the caller, which treats it as fatal.
    pub fn bind(
        addr: SocketAddr,
        bridge: ControlBridge,
        tap: Option<Arc<SignalTap>>,
    ) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr)
            .with_context(|| format!("cannot listen for remote control on {}", addr))?;
        Ok(Self {
            listener,
            bridge,
            tap,
        })
    }

    /// The address actually bound (useful with port 0).
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve clients on a background thread for the rest of the process.
    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        let addr = self.local_addr()?;
        tracing::info!(%addr, streaming = self.tap.is_some(), "remote control listening");
        thread::Builder::new()
            .name("tins-remote".into())
            .spawn(move || self.serve())
    }

    fn serve(self) {
        for incoming in self.listener.incoming() {
            match incoming {
                Ok(stream) => {
                    let peer = stream
                        .peer_addr()
                        .map_or_else(|_| "unknown".to_string(), |a| a.to_string());
                    tracing::info!(%peer, "remote client connected");
                    match serve_client(stream, &self.bridge, self.tap.as_deref()) {
                        Ok(()) => tracing::info!(%peer, "remote client disconnected"),
                        Err(err) => {
                            tracing::info!(%peer, error = %err, "remote client dropped");
                        }
                    }
                }
                Err(err) => tracing::warn!(error = %err, "remote accept failed"),
            }
        }
    }
}

/// Run one client session until EOF or an I/O error.
fn serve_client(
    stream: TcpStream,
    bridge: &ControlBridge,
    tap: Option<&SignalTap>,
) -> io::Result<()> {
    stream.set_read_timeout(Some(READ_TIMEOUT))?;
    let mut writer = stream.try_clone()?;
    let mut reader = BufReader::new(stream);
    let mut line = Vec::new();
    let mut snapshot = vec![0.0f32; tap.map_or(0, SignalTap::len)];
    let mut bytes = Vec::with_capacity(snapshot.len() * 4);
    let mut discarding = false;

    loop {
        // `line` stays shorter than MAX_LINE_LEN between reads.
        let limit = (MAX_LINE_LEN - line.len()) as u64;
        match (&mut reader).take(limit).read_until(b'\n', &mut line) {
            Ok(0) => return Ok(()),
            Ok(_) if line.ends_with(b"\n") => {
                if discarding {
                    discarding = false;
                } else {
                    let text = String::from_utf8_lossy(&line);
                    // `quit` has no meaning for a remote client.
                    handle_line(&text, bridge, "remote");
                }
                line.clear();
            }
            Ok(_) if line.len() >= MAX_LINE_LEN => {
                if !discarding {
                    tracing::warn!(max = MAX_LINE_LEN, "remote line too long, discarding it");
                }
                discarding = true;
                line.clear();
            }
            // EOF in the middle of a line.
            Ok(_) => {
                if !discarding {
                    handle_line(&String::from_utf8_lossy(&line), bridge, "remote");
                }
                return Ok(());
            }
            Err(err) if is_timeout(&err) => {}
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }

        if let Some(tap) = tap {
            let n = tap.snapshot(&mut snapshot);
            encode_block(&snapshot[..n], &mut bytes);
            writer.write_all(&bytes)?;
        }
    }
}

/// Read timeouts surface as either kind depending on the platform.
fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

/// Little-endian `f32` wire format of a streamed block.
fn encode_block(samples: &[f32], out: &mut Vec<u8>) {
    out.clear();
    for sample in samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }
}
