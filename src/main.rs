fn main() -> anyhow::Result<()> {
    clusterseed::cli::run()
}
