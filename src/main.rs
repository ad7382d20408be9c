use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    neoai::cli::main()
}
