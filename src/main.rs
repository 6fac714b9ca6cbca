fn main() {
    if let Err(err) = qualitylens_lib::run() {
        log::error!("{err}");
        std::process::exit(1);
    }
}
