//! Length-framed message transport between garbler and evaluator: every
//! message is a canonical `bincode` encoding prefixed with its length as a
//! 4-byte big-endian integer, capped at [`crate::constants::MAX_MESSAGE_BYTES`]
//! so a corrupted prefix can't drive an unbounded allocation.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{LABEL_BYTES, MAX_MESSAGE_BYTES};
use crate::error::{ProtocolError, Result};
use crate::garbler::{GarbledCircuit, OutputDecodingTable};
use crate::ot::{OtReceiverHello, OtSenderHello, OtSenderPayload};

/// Every message exchanged over the wire between the two protocol roles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Message {
    /// First message from the garbler: the circuit's bit width and fixed-point
    /// scale, so both sides agree on how input files are interpreted.
    Handshake { n_bits: u32, scale: u32 },
    /// The garbler's own input wire labels, delivered directly since the
    /// garbler already knows its own bits.
    AliceInputLabels { labels: Vec<[u8; LABEL_BYTES]> },
    /// The garbled tables and output decoding table, sent once per session.
    GarbledCircuit {
        circuit: GarbledCircuit,
        decoding: OutputDecodingTable,
    },
    /// Oblivious-transfer round 1: the sender's per-wire DH public values.
    OtSenderHellos { hellos: Vec<OtSenderHello> },
    /// Oblivious-transfer round 1 reply: the receiver's per-wire DH public values.
    OtReceiverHellos { hellos: Vec<OtReceiverHello> },
    /// Oblivious-transfer round 2: the sender's per-wire masked label pairs.
    OtPayloads { payloads: Vec<OtSenderPayload> },
    /// The evaluator's decoded output bits, sent back so the garbler also
    /// learns the verdict.
    Outputs { bits: Vec<bool> },
}

/// A bidirectional channel carrying [`Message`] values. Implemented by
/// [`TcpTransport`] for real runs and by [`Pipe`] for in-process tests.
pub trait Transport {
    fn send(&mut self, message: &Message) -> Result<()>;
    fn receive(&mut self) -> Result<Message>;
}

fn encode(message: &Message) -> Result<Vec<u8>> {
    bincode::serde::encode_to_vec(message, bincode::config::standard())
        .map_err(|e| ProtocolError::Malformed(format!("failed to encode message: {e}")))
}

fn decode(bytes: &[u8]) -> Result<Message> {
    let (message, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())
        .map_err(|e| ProtocolError::Malformed(format!("failed to decode message: {e}")))?;
    Ok(message)
}

fn write_framed<W: Write>(writer: &mut W, payload: &[u8]) -> Result<()> {
    let len = u32::try_from(payload.len())
        .map_err(|_| ProtocolError::Malformed("message too large to frame".to_string()))?;
    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(payload)?;
    writer.flush()?;
    Ok(())
}

fn read_framed<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let mut len_bytes = [0u8; 4];
    reader.read_exact(&mut len_bytes)?;
    let len = u32::from_be_bytes(len_bytes);
    if len > MAX_MESSAGE_BYTES {
        return Err(ProtocolError::Malformed(format!(
            "declared message length {len} exceeds the {MAX_MESSAGE_BYTES}-byte cap"
        )));
    }
    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload)?;
    Ok(payload)
}

/// A TCP-backed [`Transport`], with read/write timeouts so a stalled peer
/// surfaces as [`ProtocolError::Timeout`] instead of hanging forever.
#[derive(Debug)]
pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    pub fn new(stream: TcpStream, message_timeout: Duration) -> std::io::Result<Self> {
        stream.set_read_timeout(Some(message_timeout))?;
        stream.set_write_timeout(Some(message_timeout))?;
        stream.set_nodelay(true)?;
        Ok(TcpTransport { stream })
    }
}

impl Transport for TcpTransport {
    fn send(&mut self, message: &Message) -> Result<()> {
        let payload = encode(message)?;
        write_framed(&mut self.stream, &payload)
    }

    fn receive(&mut self) -> Result<Message> {
        let payload = read_framed(&mut self.stream).map_err(|e| match e {
            ProtocolError::Transport(io_err)
                if matches!(
                    io_err.kind(),
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                ) =>
            {
                ProtocolError::Timeout
            }
            other => other,
        })?;
        decode(&payload)
    }
}

/// An in-memory, in-process [`Transport`] pair for tests: each side writes
/// into the other's queue directly, with no actual I/O.
#[derive(Debug, Default)]
pub struct Pipe {
    inbox: std::collections::VecDeque<Vec<u8>>,
    outbox: std::sync::mpsc::Sender<Vec<u8>>,
    peer_outbox: std::sync::mpsc::Receiver<Vec<u8>>,
}

impl Pipe {
    /// Builds a connected pair of in-memory transports.
    pub fn pair() -> (Pipe, Pipe) {
        let (tx_a, rx_a) = std::sync::mpsc::channel();
        let (tx_b, rx_b) = std::sync::mpsc::channel();
        (
            Pipe {
                inbox: std::collections::VecDeque::new(),
                outbox: tx_a,
                peer_outbox: rx_b,
            },
            Pipe {
                inbox: std::collections::VecDeque::new(),
                outbox: tx_b,
                peer_outbox: rx_a,
            },
        )
    }
}

impl Transport for Pipe {
    fn send(&mut self, message: &Message) -> Result<()> {
        let payload = encode(message)?;
        self.outbox
            .send(payload)
            .map_err(|_| ProtocolError::Malformed("peer pipe half dropped".to_string()))
    }

    fn receive(&mut self) -> Result<Message> {
        if let Some(payload) = self.inbox.pop_front() {
            return decode(&payload);
        }
        let payload = self
            .peer_outbox
            .recv()
            .map_err(|_| ProtocolError::Malformed("peer pipe half dropped".to_string()))?;
        decode(&payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipe_round_trips_a_message() {
        let (mut a, mut b) = Pipe::pair();
        let msg = Message::Handshake { n_bits: 32, scale: 10 };
        a.send(&msg).unwrap();
        let received = b.receive().unwrap();
        match received {
            Message::Handshake { n_bits, scale } => {
                assert_eq!(n_bits, 32);
                assert_eq!(scale, 10);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn framed_round_trip_over_a_byte_buffer() {
        let msg = Message::Outputs { bits: vec![true, false] };
        let payload = encode(&msg).unwrap();
        let mut buf = Vec::new();
        write_framed(&mut buf, &payload).unwrap();
        let mut cursor = std::io::Cursor::new(buf);
        let read_back = read_framed(&mut cursor).unwrap();
        assert_eq!(read_back, payload);
    }

    #[test]
    fn oversized_length_prefix_is_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(MAX_MESSAGE_BYTES + 1).to_be_bytes());
        let mut cursor = std::io::Cursor::new(buf);
        assert!(matches!(
            read_framed(&mut cursor),
            Err(ProtocolError::Malformed(_))
        ));
    }
}
