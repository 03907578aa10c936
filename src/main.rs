#[tokio::main]
async fn main() {
    let code = match game_client::run_with_config().await {
        Ok(()) => 0,
        Err(_) => 1,
    };
    // Exit explicitly: the stdin reader can still be parked on a blocking read.
    std::process::exit(code);
}
