fn main() {
    if let Err(err) = run_prediction_lib::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
