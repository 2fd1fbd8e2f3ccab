fn main() {
    if let Err(code) = saber_cli::main_with_exit_code() {
        std::process::exit(code);
    }
}
