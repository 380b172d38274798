use cucumber::World;
use cucumber_tests::features::NjangiWorld;

#[tokio::main]
async fn main() {
    NjangiWorld::cucumber().run_and_exit("src/features/ledger/").await;
}
