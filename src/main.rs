#[tokio::main]
async fn main() {
    if let Err(e) = nestly::run_gateway().await {
        eprintln!("{:?}", e);
        std::process::exit(1);
    }
}
