use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

use gc::comparator::build_signed_comparator;
use gc::constants::{DEFAULT_BIT_WIDTH, DEFAULT_MESSAGE_TIMEOUT_SECS};
use gc::input::parse_scaled_decimals;
use gc::protocol::{run_as_evaluator, run_as_garbler, Verdict};
use gc::reference::plain_verdict;
use gc::transport::{Pipe, TcpTransport};
use gc::ProtocolError;

/// Two-party garbled-circuit secure comparison of private signed-number maxima.
#[derive(Parser, Debug)]
#[command(name = "gc-cli")]
#[command(about = "Run the garbler or evaluator side of a private maximum comparison")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one party's side of the protocol.
    Run(RunArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Which party this process plays.
    #[arg(long, value_enum)]
    role: Role,

    /// Path to a comma-separated list of this party's private decimal values.
    /// With `--verify`, the file instead holds both parties' lists separated
    /// by a `;`, and the whole protocol runs locally with no networking.
    #[arg(long)]
    input: PathBuf,

    /// Address of the peer to connect to (role `bob`).
    #[arg(long)]
    peer: Option<String>,

    /// Address to listen on for the peer's connection (role `alice`).
    #[arg(long)]
    listen: Option<String>,

    /// Run both roles locally against each other and cross-check the
    /// result against the plaintext reference computation, instead of
    /// connecting to a real peer.
    #[arg(long)]
    verify: bool,

    /// Signed comparator bit width. Both parties must agree on this value.
    #[arg(long, default_value_t = DEFAULT_BIT_WIDTH)]
    bits: u32,

    /// Increase log verbosity (`-v` debug, `-vv` trace).
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Role {
    Alice,
    Bob,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("gc={level},gc_cli={level}")));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn describe(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::AliceMax => "alice holds the larger maximum",
        Verdict::BobMax => "bob holds the larger maximum",
        Verdict::Equal => "the two maxima are equal",
    }
}

fn run_verify(args: &RunArgs) -> Result<Verdict, ProtocolError> {
    let text = std::fs::read_to_string(&args.input)?;
    let (alice_text, bob_text) = text.split_once(';').ok_or_else(|| {
        ProtocolError::Malformed("--verify expects an input file of the form \"alice values;bob values\"".to_string())
    })?;
    let alice_values = parse_scaled_decimals(alice_text, args.bits)?;
    let bob_values = parse_scaled_decimals(bob_text, args.bits)?;

    let circuit = build_signed_comparator(args.bits);
    let (mut garbler_side, mut evaluator_side) = Pipe::pair();
    let evaluator_circuit = circuit.clone();
    let bob_values_for_thread = bob_values.clone();
    let evaluator_thread = std::thread::spawn(move || {
        run_as_evaluator(&bob_values_for_thread, &evaluator_circuit, &mut evaluator_side)
    });
    let garbler_verdict = run_as_garbler(&alice_values, &circuit, &mut garbler_side)?;
    let evaluator_verdict = evaluator_thread
        .join()
        .map_err(|_| ProtocolError::Malformed("evaluator thread panicked".to_string()))??;

    let expected = plain_verdict(&alice_values, &bob_values);
    if garbler_verdict != evaluator_verdict {
        return Err(ProtocolError::Malformed(
            "garbler and evaluator disagree on the verdict".to_string(),
        ));
    }
    if garbler_verdict != expected {
        return Err(ProtocolError::Malformed(format!(
            "garbled verdict does not match the plaintext reference (got {:?} wanted {:?})",
            garbler_verdict, expected
        )));
    }
    println!("verified: garbled run matches the plaintext reference");
    Ok(garbler_verdict)
}

fn run_networked(args: &RunArgs) -> Result<Verdict, ProtocolError> {
    let text = std::fs::read_to_string(&args.input)?;
    let values = parse_scaled_decimals(&text, args.bits)?;
    let circuit = build_signed_comparator(args.bits);
    let timeout = Duration::from_secs(DEFAULT_MESSAGE_TIMEOUT_SECS);

    match args.role {
        Role::Alice => {
            let listen = args.listen.as_ref().ok_or_else(|| {
                ProtocolError::Malformed("--listen is required for role alice".to_string())
            })?;
            let listener = TcpListener::bind(listen)?;
            tracing::info!(%listen, "waiting for the evaluator to connect");
            let (stream, peer_addr) = listener.accept()?;
            tracing::info!(%peer_addr, "evaluator connected");
            let mut transport = TcpTransport::new(stream, timeout)?;
            run_as_garbler(&values, &circuit, &mut transport)
        }
        Role::Bob => {
            let peer = args.peer.as_ref().ok_or_else(|| {
                ProtocolError::Malformed("--peer is required for role bob".to_string())
            })?;
            tracing::info!(%peer, "connecting to the garbler");
            let stream = TcpStream::connect(peer)?;
            let mut transport = TcpTransport::new(stream, timeout)?;
            run_as_evaluator(&values, &circuit, &mut transport)
        }
    }
}

fn run(args: &RunArgs) -> Result<Verdict, ProtocolError> {
    if args.verify {
        run_verify(args)
    } else {
        run_networked(args)
    }
}

fn main() -> std::process::ExitCode {
    let args = Args::parse();
    let Command::Run(run_args) = &args.command;
    init_tracing(run_args.verbose);

    match run(run_args) {
        Ok(verdict) => {
            println!("{}", describe(verdict));
            std::process::ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            std::process::ExitCode::from(e.exit_code() as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn verify_args(input: &std::path::Path, bits: u32) -> RunArgs {
        RunArgs {
            role: Role::Alice,
            input: input.to_path_buf(),
            peer: None,
            listen: None,
            verify: true,
            bits,
            verbose: 0,
        }
    }

    #[test]
    fn verify_mode_matches_plain_reference() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "-11,-9.7,5,10.1,857.4;-10,5,10.2,564,12558").unwrap();
        let verdict = run_verify(&verify_args(file.path(), 32)).unwrap();
        assert_eq!(verdict, Verdict::BobMax);
    }

    #[test]
    fn verify_mode_rejects_a_file_without_the_separator() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "1,2,3").unwrap();
        let err = run_verify(&verify_args(file.path(), 32)).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn verify_mode_rejects_out_of_range_input() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "12.8;0").unwrap();
        let err = run_verify(&verify_args(file.path(), 8)).unwrap_err();
        assert!(matches!(err, ProtocolError::InputOutOfRange { .. }));
    }

    #[test]
    fn networked_role_requires_its_matching_address_flag() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "1,2,3").unwrap();
        let mut args = verify_args(file.path(), 32);
        args.verify = false;
        let err = run(&args).unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed(_)));
    }
}
