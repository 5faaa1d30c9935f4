use std::io;

fn main() {
    env_logger::init();
    let stdin = io::stdin();
    let stdout = io::stdout();
    if let Err(e) = corvid::protocol::run(stdin.lock(), stdout.lock()) {
        log::error!("UCI loop terminated with an I/O error: {e}");
        std::process::exit(1);
    }
}
