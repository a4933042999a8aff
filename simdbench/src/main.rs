fn main() -> anyhow::Result<()> {
    simdbench::run()
}
