#[tokio::main]
async fn main() -> anyhow::Result<()> {
    bookkeeper_api::cli::run_with_sys_args().await
}
