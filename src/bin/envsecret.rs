fn main() -> color_eyre::Result<()> {
    envsecret::cli::main()
}
