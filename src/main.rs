fn main() {
    if let Err(err) = column_mapper::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
