#[tokio::main]
async fn main() {
    portal_uploader::run().await
}
