fn main() {
    std::process::exit(upd::run::run());
}
