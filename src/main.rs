#[tokio::main]
async fn main() -> anyhow::Result<()> {
    planner_lib::run().await
}
