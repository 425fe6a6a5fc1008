#[tokio::main]
async fn main() {
    if let Err(e) = nestly::run_auth_service().await {
        eprintln!("{:?}", e);
        std::process::exit(1);
    }
}
