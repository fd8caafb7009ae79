//! Test-only helpers shared across this crate's end-to-end scenarios: full
//! garbler/evaluator round trips over both the in-memory pipe transport and
//! real loopback TCP, matched against the plaintext reference verdict.

use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use gc::circuit::Circuit;
use gc::comparator::build_signed_comparator;
use gc::error::ProtocolError;
use gc::protocol::{run_as_evaluator, run_as_garbler, Verdict};
use gc::transport::{Pipe, TcpTransport};

/// Runs a full garbler/evaluator session over an in-memory [`Pipe`] and
/// returns both sides' verdicts, so a caller can assert they agree.
pub fn run_over_pipe(
    alice: Vec<i64>,
    bob: Vec<i64>,
    n_bits: u32,
) -> Result<(Verdict, Verdict), ProtocolError> {
    let circuit = build_signed_comparator(n_bits);
    run_over_pipe_with_circuit(alice, bob, circuit)
}

/// Same as [`run_over_pipe`], but with a caller-supplied circuit — used by
/// tests that need to reuse one garbled circuit across assertions.
pub fn run_over_pipe_with_circuit(
    alice: Vec<i64>,
    bob: Vec<i64>,
    circuit: Circuit,
) -> Result<(Verdict, Verdict), ProtocolError> {
    let (mut garbler_side, mut evaluator_side) = Pipe::pair();
    let evaluator_circuit = circuit.clone();
    let evaluator_thread =
        thread::spawn(move || run_as_evaluator(&bob, &evaluator_circuit, &mut evaluator_side));
    let garbler_verdict = run_as_garbler(&alice, &circuit, &mut garbler_side)?;
    let evaluator_verdict = evaluator_thread
        .join()
        .expect("evaluator thread panicked")?;
    Ok((garbler_verdict, evaluator_verdict))
}

/// Runs a full garbler/evaluator session as two threads connected over real
/// loopback TCP, exercising [`TcpTransport`] framing instead of the in-memory
/// pipe test double.
pub fn run_over_tcp(
    alice: Vec<i64>,
    bob: Vec<i64>,
    n_bits: u32,
) -> Result<(Verdict, Verdict), ProtocolError> {
    let circuit = build_signed_comparator(n_bits);
    let listener = TcpListener::bind("127.0.0.1:0").expect("loopback bind must succeed");
    let addr = listener.local_addr().expect("bound listener has an address");

    let evaluator_circuit = circuit.clone();
    let evaluator_thread = thread::spawn(move || {
        let stream = TcpStream::connect(addr).expect("evaluator must reach the garbler");
        let mut transport =
            TcpTransport::new(stream, Duration::from_secs(5)).expect("transport setup");
        run_as_evaluator(&bob, &evaluator_circuit, &mut transport)
    });

    let (stream, _) = listener.accept().expect("evaluator must connect");
    let mut transport = TcpTransport::new(stream, Duration::from_secs(5)).expect("transport setup");
    let garbler_verdict = run_as_garbler(&alice, &circuit, &mut transport)?;
    let evaluator_verdict = evaluator_thread
        .join()
        .expect("evaluator thread panicked")?;
    Ok((garbler_verdict, evaluator_verdict))
}
