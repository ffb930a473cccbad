fn main() {
    if let Err(err) = tally_sync::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
