fn main() {
    if let Err(e) = medidesk_lib::run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
