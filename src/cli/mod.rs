// Demo binary command line: build a packet for a configured circuit and
// walk it hop by hop, printing what each relay sees.
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "sphinx-demo", about = "Exercises the Sphinx packet core over a configured circuit")]
pub struct Cli {
    /// Path to a circuit config YAML file.
    #[arg(short, long, default_value = "circuit.yaml")]
    pub config: String,

    /// Plaintext message to deliver through the circuit.
    #[arg(short, long, default_value = "hello sphinx!")]
    pub message: String,
}
