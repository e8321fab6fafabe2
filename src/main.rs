fn main() {
    env_logger::init();

    if let Err(err) = pairmark::run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
