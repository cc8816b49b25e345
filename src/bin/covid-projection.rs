fn main() -> anyhow::Result<()> {
    covid_projection::cli::main()
}
