#[tokio::main]
async fn main() {
    if let Err(e) = pgcrud_cli::run(std::env::args_os()).await {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}
