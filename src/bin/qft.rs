use anyhow::Result;

fn main() -> Result<()> {
    qftlab::cli::run()
}
