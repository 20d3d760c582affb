#[tokio::main]
async fn main() -> anyhow::Result<()> {
    auction_engine::start(std::env::args()).await
}
