//! `pstash` binary entrypoint.

fn main() {
    std::process::exit(pstash_cli::run());
}
