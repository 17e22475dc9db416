fn main() -> anyhow::Result<()> {
    let code = grove_agent::run()?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
