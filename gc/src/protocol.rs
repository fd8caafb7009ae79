//! Role-specific protocol flows and the shared session state machine.
//!
//! Both roles reduce their private set of signed numbers to its local
//! maximum before running the two-party secure comparison — the circuit
//! itself only ever compares one signed value per side.

use std::collections::HashMap;

use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use tracing::{debug, info};

use crate::circuit::Circuit;
use crate::error::{ProtocolError, Result};
use crate::evaluator;
use crate::garbler;
use crate::label::WireLabel;
use crate::ot::{OtReceiver, OtSender};
use crate::reference::to_signed_bits;
use crate::transport::{Message, Transport};

/// Which half of the protocol a party is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Garbler,
    Evaluator,
}

/// The session's turn-based state machine. Every fatal error moves the
/// session to `Aborted`; there is no retry, the protocol is single-shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fsm {
    Idle,
    Handshake,
    InputsExchanged,
    Evaluating,
    OutputsExchanged,
    Done,
    Aborted,
}

/// The two-bit comparison result both parties learn, and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    AliceMax,
    BobMax,
    Equal,
}

impl Verdict {
    fn to_bits(self) -> (bool, bool) {
        match self {
            Verdict::Equal => (false, false),
            Verdict::AliceMax => (true, false),
            Verdict::BobMax => (false, true),
        }
    }

    fn from_bits(is_gt: bool, is_lt: bool) -> Result<Self> {
        match (is_gt, is_lt) {
            (false, false) => Ok(Verdict::Equal),
            (true, false) => Ok(Verdict::AliceMax),
            (false, true) => Ok(Verdict::BobMax),
            (true, true) => Err(ProtocolError::Malformed(
                "comparator produced both is_gt and is_lt".to_string(),
            )),
        }
    }
}

/// Tracks the session's FSM position, moving to `Aborted` on any error a
/// caller reports through [`Session::abort`].
struct Session {
    fsm: Fsm,
}

impl Session {
    fn new() -> Self {
        Session { fsm: Fsm::Idle }
    }

    fn enter(&mut self, state: Fsm) {
        debug!(?state, "protocol state transition");
        self.fsm = state;
    }

    fn abort(&mut self) {
        self.fsm = Fsm::Aborted;
    }
}

fn fresh_rng() -> ChaCha12Rng {
    ChaCha12Rng::from_os_rng()
}

fn local_maximum(values: &[i64]) -> Result<i64> {
    values
        .iter()
        .copied()
        .max()
        .ok_or_else(|| ProtocolError::Malformed("input set is empty".to_string()))
}

fn expect<T>(message: Message, extract: impl FnOnce(Message) -> Option<T>) -> Result<T> {
    let description = format!("{message:?}");
    extract(message).ok_or_else(|| {
        ProtocolError::Malformed(format!("unexpected message during protocol run: {description}"))
    })
}

/// Runs the garbler's (Alice's) half of the protocol over `transport`,
/// garbling `circuit` fresh for this session and comparing the maximum of
/// `inputs` against whatever maximum the evaluator holds.
pub fn run_as_garbler(
    inputs: &[i64],
    circuit: &Circuit,
    transport: &mut impl Transport,
) -> Result<Verdict> {
    let mut session = Session::new();
    match run_as_garbler_inner(inputs, circuit, transport, &mut session) {
        Ok(verdict) => {
            session.enter(Fsm::Done);
            Ok(verdict)
        }
        Err(e) => {
            session.abort();
            Err(e)
        }
    }
}

fn run_as_garbler_inner(
    inputs: &[i64],
    circuit: &Circuit,
    transport: &mut impl Transport,
    session: &mut Session,
) -> Result<Verdict> {
    circuit.validate()?;
    let alice_max = local_maximum(inputs)?;
    let mut rng = fresh_rng();

    session.enter(Fsm::Handshake);
    transport.send(&Message::Handshake {
        n_bits: circuit.n_bits,
        scale: crate::constants::DEFAULT_SCALE,
    })?;

    info!(n_bits = circuit.n_bits, "garbling circuit");
    let (labels, garbled, decoding) = garbler::garble_circuit(circuit, &mut rng);
    transport.send(&Message::GarbledCircuit {
        circuit: garbled.clone(),
        decoding: decoding.clone(),
    })?;

    let alice_bits = to_signed_bits(alice_max, circuit.n_bits);
    let alice_labels: Vec<[u8; 16]> = circuit
        .alice_inputs
        .iter()
        .zip(alice_bits)
        .map(|(&wire, bit)| {
            *labels
                .label_for(wire, bit)
                .expect("alice input wire must have labels")
                .as_bytes()
        })
        .collect();
    transport.send(&Message::AliceInputLabels { labels: alice_labels })?;

    session.enter(Fsm::InputsExchanged);
    debug!("starting oblivious transfer for the evaluator's input wires");
    let mut senders = Vec::with_capacity(circuit.bob_inputs.len());
    let mut sender_hellos = Vec::with_capacity(circuit.bob_inputs.len());
    for _ in &circuit.bob_inputs {
        let (sender, hello) = OtSender::new(&mut rng);
        senders.push(sender);
        sender_hellos.push(hello);
    }
    transport.send(&Message::OtSenderHellos { hellos: sender_hellos })?;

    let receiver_hellos = expect(transport.receive()?, |m| match m {
        Message::OtReceiverHellos { hellos } => Some(hellos),
        _ => None,
    })?;
    if receiver_hellos.len() != circuit.bob_inputs.len() {
        return Err(ProtocolError::Malformed(
            "oblivious transfer reply count does not match Bob's input width".to_string(),
        ));
    }

    let mut payloads = Vec::with_capacity(circuit.bob_inputs.len());
    for ((sender, wire), receiver_hello) in senders.iter().zip(&circuit.bob_inputs).zip(&receiver_hellos) {
        let (l0, l1) = labels
            .both(*wire)
            .expect("bob input wire must have labels");
        payloads.push(sender.respond(receiver_hello, &l0, &l1)?);
    }
    transport.send(&Message::OtPayloads { payloads })?;

    session.enter(Fsm::Evaluating);
    let outputs = expect(transport.receive()?, |m| match m {
        Message::Outputs { bits } => Some(bits),
        _ => None,
    })?;
    session.enter(Fsm::OutputsExchanged);
    if outputs.len() != 2 {
        return Err(ProtocolError::Malformed(format!(
            "expected a 2-bit verdict, got {} bits",
            outputs.len()
        )));
    }
    Verdict::from_bits(outputs[0], outputs[1])
}

/// Runs the evaluator's (Bob's) half of the protocol over `transport`.
pub fn run_as_evaluator(
    inputs: &[i64],
    circuit: &Circuit,
    transport: &mut impl Transport,
) -> Result<Verdict> {
    let mut session = Session::new();
    match run_as_evaluator_inner(inputs, circuit, transport, &mut session) {
        Ok(verdict) => {
            session.enter(Fsm::Done);
            Ok(verdict)
        }
        Err(e) => {
            session.abort();
            Err(e)
        }
    }
}

fn run_as_evaluator_inner(
    inputs: &[i64],
    circuit: &Circuit,
    transport: &mut impl Transport,
    session: &mut Session,
) -> Result<Verdict> {
    circuit.validate()?;
    let bob_max = local_maximum(inputs)?;
    let mut rng = fresh_rng();

    session.enter(Fsm::Handshake);
    let (n_bits, _scale) = expect(transport.receive()?, |m| match m {
        Message::Handshake { n_bits, scale } => Some((n_bits, scale)),
        _ => None,
    })?;
    if n_bits != circuit.n_bits {
        return Err(ProtocolError::Malformed(format!(
            "peer's circuit is {n_bits}-bit, expected {}",
            circuit.n_bits
        )));
    }

    let (garbled, decoding) = expect(transport.receive()?, |m| match m {
        Message::GarbledCircuit { circuit, decoding } => Some((circuit, decoding)),
        _ => None,
    })?;

    let alice_label_bytes = expect(transport.receive()?, |m| match m {
        Message::AliceInputLabels { labels } => Some(labels),
        _ => None,
    })?;
    if alice_label_bytes.len() != circuit.alice_inputs.len() {
        return Err(ProtocolError::Malformed(
            "alice's input label count does not match her declared input width".to_string(),
        ));
    }
    let mut input_labels: HashMap<u32, WireLabel> = circuit
        .alice_inputs
        .iter()
        .zip(alice_label_bytes)
        .map(|(&wire, bytes)| (wire, WireLabel::new(bytes)))
        .collect();

    session.enter(Fsm::InputsExchanged);
    let bob_bits = to_signed_bits(bob_max, circuit.n_bits);

    let sender_hellos = expect(transport.receive()?, |m| match m {
        Message::OtSenderHellos { hellos } => Some(hellos),
        _ => None,
    })?;
    if sender_hellos.len() != circuit.bob_inputs.len() {
        return Err(ProtocolError::Malformed(
            "oblivious transfer sender-hello count does not match Bob's input width".to_string(),
        ));
    }

    let mut receivers = Vec::with_capacity(circuit.bob_inputs.len());
    let mut receiver_hellos = Vec::with_capacity(circuit.bob_inputs.len());
    for (sender_hello, &choice) in sender_hellos.iter().zip(&bob_bits) {
        let (receiver, hello) = OtReceiver::new(choice, sender_hello, &mut rng)?;
        receivers.push(receiver);
        receiver_hellos.push(hello);
    }
    transport.send(&Message::OtReceiverHellos { hellos: receiver_hellos })?;

    let payloads = expect(transport.receive()?, |m| match m {
        Message::OtPayloads { payloads } => Some(payloads),
        _ => None,
    })?;
    if payloads.len() != circuit.bob_inputs.len() {
        return Err(ProtocolError::Malformed(
            "oblivious transfer payload count does not match Bob's input width".to_string(),
        ));
    }

    for ((receiver, sender_hello), (payload, &wire)) in receivers
        .iter()
        .zip(&sender_hellos)
        .zip(payloads.iter().zip(&circuit.bob_inputs))
    {
        let label = receiver.finish(sender_hello, payload)?;
        input_labels.insert(wire, label);
    }

    session.enter(Fsm::Evaluating);
    let values = evaluator::evaluate_circuit(circuit, &garbled, &input_labels)?;
    let is_gt = decoding.decode(circuit.outputs[0], &values[&circuit.outputs[0]])?;
    let is_lt = decoding.decode(circuit.outputs[1], &values[&circuit.outputs[1]])?;
    let verdict = Verdict::from_bits(is_gt, is_lt)?;

    transport.send(&Message::Outputs { bits: vec![is_gt, is_lt] })?;
    session.enter(Fsm::OutputsExchanged);
    Ok(verdict)
}
