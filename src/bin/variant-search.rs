fn main() {
    if let Err(e) = variant_search::run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
