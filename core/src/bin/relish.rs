/// Relish command-line host
///
/// Evaluates expressions and source files, translates JSON, and prints parse
/// trees. Standard packages are read from the configured package path.
use relish_core::cli;

fn main() {
    if let Err(e) = cli::run_cli() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
